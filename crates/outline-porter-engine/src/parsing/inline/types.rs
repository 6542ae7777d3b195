use crate::parsing::span::Span;

/// A parsed inline node with byte spans into the block text.
///
/// Nodes are purely syntactic. Resolving ids, page names and asset paths
/// against the graph happens later, in the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    /// Plain text that isn't part of any special construct.
    Text(Span),
    /// A backtick code span. Raw zone: nothing inside is parsed.
    CodeSpan { full: Span, inner: Span },
    /// `{{embed ((id))}}`.
    BlockEmbed { full: Span, id: Span },
    /// `{{embed [[name]]}}`.
    PageEmbed { full: Span, name: Span },
    /// `((id))`.
    BlockRef { full: Span, id: Span },
    /// `[[name]]`, or `#[[name]]` when `tag` is set.
    PageLink { full: Span, name: Span, tag: bool },
    /// Bare `#name`.
    Tag { full: Span, name: Span },
    /// `[text](target)` or `![text](target){:attrs}`.
    Link {
        full: Span,
        text: Span,
        target: Span,
        image: bool,
        /// Body of a trailing `{:...}` block, without the braces.
        attrs: Option<Span>,
    },
}

impl InlineNode {
    /// Extracts the full span from any variant.
    pub fn span(&self) -> Span {
        match self {
            InlineNode::Text(sp) => *sp,
            InlineNode::CodeSpan { full, .. }
            | InlineNode::BlockEmbed { full, .. }
            | InlineNode::PageEmbed { full, .. }
            | InlineNode::BlockRef { full, .. }
            | InlineNode::PageLink { full, .. }
            | InlineNode::Tag { full, .. }
            | InlineNode::Link { full, .. } => *full,
        }
    }
}
