use crate::parsing::span::Span;

use super::{
    cursor::Cursor,
    kinds::{BlockRef, CodeSpan, Embed, MdLink, PageLink, Tag},
    types::InlineNode,
};

/// Parses a block's raw text into a sequence of [`InlineNode`]s.
///
/// A single left-to-right scan. At each position the recognisers are tried
/// in precedence order and the first match wins:
///
/// 1. code span (raw zone)
/// 2. `{{embed ((id))}}` / `{{embed [[name]]}}`
/// 3. `((id))`
/// 4. `[[name]]` / `#[[name]]`
/// 5. bare `#tag`
/// 6. `![alt](target)` / `[text](target)`
///
/// Only closed constructs match. An opener without its closer is plain text.
/// The returned nodes cover the entire input.
pub fn parse_inline(s: &str) -> Vec<InlineNode> {
    let mut cur = Cursor::new(s);
    let mut out = vec![];
    let mut text_start = cur.pos();

    fn flush_text(out: &mut Vec<InlineNode>, start: usize, end: usize) {
        if end > start {
            out.push(InlineNode::Text(Span { start, end }));
        }
    }

    while !cur.eof() {
        if let Some(node) = try_parse_construct(&mut cur) {
            let span = node.span();
            flush_text(&mut out, text_start, span.start);
            text_start = span.end;
            out.push(node);
            continue;
        }
        cur.bump();
    }

    flush_text(&mut out, text_start, cur.pos());
    out
}

fn try_parse_construct(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    try_parse_code_span(cur)
        .or_else(|| try_parse_embed(cur))
        .or_else(|| try_parse_block_ref(cur))
        .or_else(|| try_parse_page_link(cur))
        .or_else(|| try_parse_tag(cur))
        .or_else(|| try_parse_link(cur))
}

/// Consumes `open ... close` and returns the span between the delimiters.
///
/// The caller restores the cursor on `None`.
fn take_delimited(cur: &mut Cursor<'_>, open: &[u8], close: &[u8]) -> Option<Span> {
    if !cur.starts_with(open) {
        return None;
    }
    cur.bump_n(open.len());
    let inner_start = cur.pos();
    let inner_end = cur.seek(close)?;
    cur.bump_n(close.len());
    Some(Span::new(inner_start, inner_end))
}

/// Like [`take_delimited`], but the trimmed inner text must be non-empty.
fn take_named(cur: &mut Cursor<'_>, open: &[u8], close: &[u8]) -> Option<Span> {
    let inner = take_delimited(cur, open, close)?.trim(cur.s);
    (!inner.is_empty()).then_some(inner)
}

fn try_parse_code_span(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    if cur.peek() != Some(CodeSpan::TICK) {
        return None;
    }
    let saved = cur.clone();
    let start = cur.pos();
    let Some(inner) = take_delimited(cur, &[CodeSpan::TICK], &[CodeSpan::TICK]) else {
        *cur = saved;
        return None;
    };
    Some(InlineNode::CodeSpan {
        full: Span::new(start, cur.pos()),
        inner,
    })
}

fn try_parse_embed(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    if !cur.starts_with(Embed::OPEN) {
        return None;
    }
    let saved = cur.clone();
    let start = cur.pos();
    cur.bump_n(Embed::OPEN.len());
    cur.skip_blanks();

    let node = if cur.starts_with(BlockRef::OPEN) {
        take_named(cur, BlockRef::OPEN, BlockRef::CLOSE).map(|id| (id, true))
    } else if cur.starts_with(PageLink::OPEN) {
        take_named(cur, PageLink::OPEN, PageLink::CLOSE).map(|name| (name, false))
    } else {
        None
    };

    cur.skip_blanks();
    match node {
        Some((inner, is_block)) if cur.starts_with(Embed::CLOSE) => {
            cur.bump_n(Embed::CLOSE.len());
            let full = Span::new(start, cur.pos());
            Some(if is_block {
                InlineNode::BlockEmbed { full, id: inner }
            } else {
                InlineNode::PageEmbed { full, name: inner }
            })
        }
        _ => {
            *cur = saved;
            None
        }
    }
}

fn try_parse_block_ref(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    if !cur.starts_with(BlockRef::OPEN) {
        return None;
    }
    let saved = cur.clone();
    let start = cur.pos();
    let Some(id) = take_named(cur, BlockRef::OPEN, BlockRef::CLOSE) else {
        *cur = saved;
        return None;
    };
    Some(InlineNode::BlockRef {
        full: Span::new(start, cur.pos()),
        id,
    })
}

fn try_parse_page_link(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    let tag = cur.starts_with(PageLink::TAG_OPEN);
    if !tag && !cur.starts_with(PageLink::OPEN) {
        return None;
    }
    let saved = cur.clone();
    let start = cur.pos();
    if tag {
        cur.bump(); // #
    }
    let Some(name) = take_named(cur, PageLink::OPEN, PageLink::CLOSE) else {
        *cur = saved;
        return None;
    };
    Some(InlineNode::PageLink {
        full: Span::new(start, cur.pos()),
        name,
        tag,
    })
}

fn try_parse_tag(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    if cur.peek() != Some(Tag::HASH) || !Tag::may_follow(cur.prev_char()) {
        return None;
    }
    let start = cur.pos();
    let name_start = start + 1;
    let rest = cur.s.get(name_start..)?;
    let token_len = rest.find(Tag::ends_token).unwrap_or(rest.len());
    let token = rest[..token_len].trim_end_matches(Tag::TRAILING);
    if token.is_empty() {
        return None;
    }
    let name = Span::new(name_start, name_start + token.len());
    cur.bump_n(1 + token.len());
    Some(InlineNode::Tag {
        full: Span::new(start, name.end),
        name,
    })
}

fn try_parse_link(cur: &mut Cursor<'_>) -> Option<InlineNode> {
    let image = cur.peek() == Some(MdLink::IMAGE_BANG);
    let saved = cur.clone();
    let start = cur.pos();
    if image {
        cur.bump();
    }
    if cur.peek() != Some(MdLink::TEXT_OPEN) {
        *cur = saved;
        return None;
    }

    let node = parse_link_body(cur, start, image);
    if node.is_none() {
        *cur = saved;
    }
    node
}

fn parse_link_body(cur: &mut Cursor<'_>, start: usize, image: bool) -> Option<InlineNode> {
    let text = take_delimited(cur, &[MdLink::TEXT_OPEN], &[MdLink::TEXT_CLOSE])?;
    if cur.peek() != Some(MdLink::TARGET_OPEN) {
        return None;
    }
    cur.bump();

    // Balanced parentheses so `image (1).png` stays one target.
    let target_start = cur.pos();
    let mut depth = 0usize;
    loop {
        match cur.peek()? {
            MdLink::TARGET_OPEN => depth += 1,
            MdLink::TARGET_CLOSE if depth == 0 => break,
            MdLink::TARGET_CLOSE => depth -= 1,
            _ => {}
        }
        cur.bump();
    }
    let target = Span::new(target_start, cur.pos()).trim(cur.s);
    cur.bump(); // )
    if target.is_empty() {
        return None;
    }

    let mut attrs = None;
    if cur.starts_with(MdLink::ATTRS_OPEN) {
        let saved = cur.clone();
        cur.bump(); // {
        let body_start = cur.pos();
        match cur.seek(&[MdLink::ATTRS_CLOSE]) {
            Some(body_end) => {
                cur.bump();
                attrs = Some(Span::new(body_start, body_end));
            }
            None => *cur = saved,
        }
    }

    Some(InlineNode::Link {
        full: Span::new(start, cur.pos()),
        text,
        target,
        image,
        attrs,
    })
}
