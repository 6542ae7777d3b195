use crate::models::{Block, Page, Properties, PropertyValue, SourceFile};

use super::line::{IndentStyle, LineKind, OutlineLineClassifier};

/// Knobs for the page parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub indent: IndentStyle,
}

/// Parses one file into one page using default options.
pub fn parse_file(file: &SourceFile) -> Page {
    parse_file_with(file, &ParseOptions::default())
}

/// Parses one file into one page.
///
/// Never fails: lines that fit nowhere are dropped and parsing carries on.
pub fn parse_file_with(file: &SourceFile, options: &ParseOptions) -> Page {
    let classifier = OutlineLineClassifier::new(options.indent);
    let mut builder = PageBuilder::new(file.page_name());

    for (line_no, line) in file.content().lines().enumerate() {
        builder.push(line_no + 1, classifier.classify(line));
    }

    builder.finish()
}

/// Indentation-tree construction over classified lines.
///
/// Open blocks live on a stack ordered by level. A block is attached to its
/// parent when it is closed, so the stack owns every block still being filled.
pub struct PageBuilder {
    name: String,
    properties: Properties,
    roots: Vec<Block>,
    open: Vec<Block>,
}

impl PageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Properties::new(),
            roots: vec![],
            open: vec![],
        }
    }

    pub fn push(&mut self, line_no: usize, line: LineKind<'_>) {
        match &line {
            LineKind::Blank => {}
            LineKind::BlockStart { level, content } => self.open_block(*level, content),
            LineKind::Property { key, value } => self.property(line_no, key, value, line.as_id()),
            LineKind::Other => {
                if self.open.is_empty() {
                    log::trace!("{}:{line_no}: ignoring text before first block", self.name);
                } else {
                    log::debug!("{}:{line_no}: dropping continuation line", self.name);
                }
            }
        }
    }

    pub fn finish(mut self) -> Page {
        // EOF flush
        self.close_until(0);
        Page {
            name: self.name,
            properties: self.properties,
            blocks: self.roots,
        }
    }

    fn open_block(&mut self, level: usize, content: &str) {
        // `>=`: a sibling at the same level closes the open one.
        self.close_until(level);
        self.open.push(Block::new(content, level));
    }

    /// Closes every open block whose level is `>= level`.
    fn close_until(&mut self, level: usize) {
        while self.open.last().is_some_and(|top| top.level >= level) {
            let Some(closed) = self.open.pop() else {
                break;
            };
            match self.open.last_mut() {
                Some(parent) => parent.children.push(closed),
                None => self.roots.push(closed),
            }
        }
    }

    fn property(&mut self, line_no: usize, key: &str, value: &str, id: Option<&str>) {
        let Some(current) = self.open.last_mut() else {
            self.properties
                .insert(key.to_string(), PropertyValue::parse(value));
            return;
        };

        if let Some(id) = id {
            if current.id.is_none() {
                current.id = Some(id.to_string());
            } else {
                log::debug!(
                    "{}:{line_no}: block already has an id, ignoring {id}",
                    self.name
                );
            }
            return;
        }

        current
            .properties
            .insert(key.to_string(), PropertyValue::parse(value));
    }
}
