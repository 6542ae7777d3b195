//! Inline syntax transformer: a block's raw text into target content fragments.

use serde::Serialize;

use crate::assets::AssetPathMap;
use crate::graph::Graph;
use crate::models::{TargetId, UuidMap};
use crate::parsing::inline::kinds::{is_image_path, parse_dimensions};
use crate::parsing::inline::{InlineNode, parse_inline};
use crate::parsing::span::Span;

/// Default prefix marking a link target as a local asset.
pub const DEFAULT_ASSETS_PREFIX: &str = "../assets/";

/// A typed span of target-side rich text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t", rename_all = "kebab-case")]
pub enum Fragment {
    Text {
        v: String,
    },
    Code {
        v: String,
    },
    /// Text linking to a URL or an uploaded file.
    Link {
        v: String,
        href: String,
    },
    /// Reference to a page by name. The target creates missing pages itself.
    PageRef {
        v: String,
        tag: bool,
    },
    /// Reference to (or embed of) another block.
    BlockRef {
        /// The referenced block's raw text, or a placeholder if unresolved.
        v: String,
        /// Source id, kept for traceability.
        id: String,
        /// Target block, once it has been created.
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<TargetId>,
        embed: bool,
        resolved: bool,
    },
    Image {
        src: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
}

impl Fragment {
    pub fn text(v: impl Into<String>) -> Self {
        Fragment::Text { v: v.into() }
    }

    /// Whether this fragment points at a block not created yet.
    pub fn is_pending_ref(&self) -> bool {
        matches!(
            self,
            Fragment::BlockRef {
                target: None,
                resolved: true,
                ..
            }
        )
    }
}

/// Everything the transformer resolves against.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub graph: &'a Graph,
    pub assets: &'a AssetPathMap,
    pub targets: &'a UuidMap,
    pub assets_prefix: &'a str,
}

impl<'a> ResolveContext<'a> {
    pub fn new(graph: &'a Graph, assets: &'a AssetPathMap, targets: &'a UuidMap) -> Self {
        Self {
            graph,
            assets,
            targets,
            assets_prefix: DEFAULT_ASSETS_PREFIX,
        }
    }

    pub fn with_assets_prefix(mut self, prefix: &'a str) -> Self {
        self.assets_prefix = prefix;
        self
    }
}

/// Converts raw block text into fragments.
///
/// Never fails: unresolved ids and missing assets become placeholders.
/// Adjacent text runs are merged, so text without recognised syntax comes
/// back as exactly one text fragment.
pub fn to_fragments(raw: &str, ctx: &ResolveContext<'_>) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = vec![];
    for node in parse_inline(raw) {
        push_merged(&mut out, resolve_node(raw, &node, ctx));
    }
    out
}

fn push_merged(out: &mut Vec<Fragment>, fragment: Fragment) {
    if let Fragment::Text { v } = &fragment
        && let Some(Fragment::Text { v: last }) = out.last_mut()
    {
        last.push_str(v);
        return;
    }
    out.push(fragment);
}

fn resolve_node(raw: &str, node: &InlineNode, ctx: &ResolveContext<'_>) -> Fragment {
    let text = |span: Span| span.slice(raw).to_string();
    match node {
        InlineNode::Text(span) => Fragment::text(text(*span)),
        InlineNode::CodeSpan { inner, .. } => Fragment::Code { v: text(*inner) },
        InlineNode::BlockEmbed { id, .. } => resolve_block(id.slice(raw), true, ctx),
        InlineNode::BlockRef { id, .. } => resolve_block(id.slice(raw), false, ctx),
        InlineNode::PageEmbed { name, .. } => Fragment::PageRef {
            v: text(*name),
            tag: false,
        },
        InlineNode::PageLink { name, tag, .. } => Fragment::PageRef {
            v: text(*name),
            tag: *tag,
        },
        InlineNode::Tag { name, .. } => Fragment::PageRef {
            v: text(*name),
            tag: true,
        },
        InlineNode::Link {
            text: label,
            target,
            image,
            attrs,
            ..
        } => resolve_link(
            label.slice(raw),
            target.slice(raw),
            *image,
            attrs.as_ref().map(|a| a.slice(raw)),
            ctx,
        ),
    }
}

/// One level only: the referenced block's raw text is used as-is, never
/// expanded again, so reference cycles cannot recurse.
fn resolve_block(id: &str, embed: bool, ctx: &ResolveContext<'_>) -> Fragment {
    match ctx.graph.block(id) {
        Some(block) => Fragment::BlockRef {
            v: block.content.clone(),
            id: id.to_string(),
            target: ctx.targets.get(id).copied(),
            embed,
            resolved: true,
        },
        None => Fragment::BlockRef {
            v: format!("block not found: {id}"),
            id: id.to_string(),
            target: None,
            embed,
            resolved: false,
        },
    }
}

fn resolve_link(
    label: &str,
    target: &str,
    image: bool,
    attrs: Option<&str>,
    ctx: &ResolveContext<'_>,
) -> Fragment {
    let (width, height) = attrs.map(parse_dimensions).unwrap_or_default();

    let is_asset = target.starts_with(ctx.assets_prefix);
    let href = if is_asset {
        match ctx.assets.get(target) {
            Some(uploaded) => uploaded.clone(),
            None => return Fragment::text(format!("attachment not found: {target}")),
        }
    } else {
        target.to_string()
    };

    // Local files are shown as images by extension; remote ones by syntax.
    let as_image = if is_asset { is_image_path(target) } else { image };
    if as_image {
        return Fragment::Image {
            src: href,
            alt: label.to_string(),
            width,
            height,
        };
    }

    let v = if label.trim().is_empty() {
        file_name(target).to_string()
    } else {
        label.to_string()
    };
    Fragment::Link { v, href }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
