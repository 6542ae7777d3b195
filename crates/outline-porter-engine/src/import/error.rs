use thiserror::Error;

use crate::host::HostError;
use crate::io::IoError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ImportError {
    /// Whether the whole run has to stop, rather than just the current page.
    pub fn is_fatal(&self) -> bool {
        match self {
            ImportError::Host(e) => e.is_fatal(),
            ImportError::Io(_) => false,
        }
    }
}
