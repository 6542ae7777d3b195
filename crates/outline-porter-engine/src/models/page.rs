use indexmap::IndexMap;
use serde::Serialize;

/// Declared `key:: value` pairs, kept in document order.
pub type Properties = IndexMap<String, PropertyValue>;

/// A property value with the obvious scalar types recognised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Interprets raw property text. Anything that is not a boolean or a
    /// number that prints back exactly as written stays text, so `0123`,
    /// `1.10` and over-long ids keep their digits.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if raw.starts_with(|c: char| c.is_ascii_digit() || c == '-')
            && let Ok(n) = raw.parse::<f64>()
            && n.is_finite()
            && n.to_string() == raw
        {
            return Self::Number(n);
        }
        Self::Text(raw.to_string())
    }
}

/// A node of a page's content tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Explicit cross-page identity from an `id::` line.
    pub id: Option<String>,
    /// Raw unparsed inline text of the block's marker line.
    pub content: String,
    pub properties: Properties,
    pub children: Vec<Block>,
    /// Indentation depth at parse time. Only used while building the tree.
    pub level: usize,
}

impl Block {
    pub fn new(content: impl Into<String>, level: usize) -> Self {
        Self {
            content: content.into(),
            level,
            ..Self::default()
        }
    }

    /// Visits this block and its descendants in pre-order.
    pub fn walk(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

/// One page per source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub name: String,
    /// File-level properties declared before the first block.
    pub properties: Properties,
    /// Top-level blocks only.
    pub blocks: Vec<Block>,
}

impl Page {
    /// Every block of the page in document (pre-)order.
    pub fn walk(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.blocks.iter().rev().collect(),
        }
    }

    pub fn block_count(&self) -> usize {
        self.walk().count()
    }
}

/// Iterative pre-order traversal; no recursion so nesting depth is unbounded.
pub struct PreOrder<'a> {
    stack: Vec<&'a Block>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.stack.pop()?;
        self.stack.extend(block.children.iter().rev());
        Some(block)
    }
}
