use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque numeric id the target block store assigns to a created block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source block id to the target id it was materialised as.
///
/// Lives for a whole import run so later batches resolve earlier blocks.
pub type UuidMap = HashMap<String, TargetId>;
