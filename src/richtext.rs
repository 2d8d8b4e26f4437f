//! Rich-text conversion.
//!
//! Post bodies arrive as structured blocks (`paragraph`, `heading2`,
//! `list-item`, `image`, ...) whose text carries inline spans addressed by
//! character offsets. This module turns them into:
//!
//! - **plain text** ([`as_text`]) for word counting. Any markup that slipped
//!   into the text is stripped, so tags never count as words.
//! - **sanitized HTML** ([`as_html`]) for display. All text goes through
//!   maud's escaping, and hyperlinks are only emitted for safe schemes.
//!
//! Neither function can fail: a malformed block was already replaced by an
//! empty block at deserialization time (see [`crate::types`]), and spans with
//! out-of-range offsets are clamped.

use crate::types::{RichTextBlock, Span};
use maud::{Markup, PreEscaped, html};

/// Concatenate the text of every block, one block per line, markup removed.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| strip_tags(&block.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip HTML tags from a string.
///
/// Only `<` followed by a letter, `/` or `!` and closed by a later `>` starts
/// a tag. Any other angle bracket is ordinary text (`x < y`).
pub(crate) fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let starts_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        match after.find('>') {
            Some(close) if starts_tag => {
                // Keep adjacent words apart: "a<br>b" is two words.
                result.push(' ');
                rest = &after[close + 1..];
            }
            _ => {
                result.push('<');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn of(kind: &str) -> Option<Self> {
        match kind {
            "list-item" => Some(Self::Unordered),
            "o-list-item" => Some(Self::Ordered),
            _ => None,
        }
    }
}

/// Render blocks as sanitized HTML.
///
/// Consecutive list items of the same kind are grouped into one `<ul>` or
/// `<ol>`.
pub fn as_html(blocks: &[RichTextBlock]) -> Markup {
    let mut out = String::new();
    let mut index = 0;
    while index < blocks.len() {
        let block = &blocks[index];
        if let Some(list) = ListKind::of(&block.kind) {
            let run = blocks[index..]
                .iter()
                .take_while(|b| ListKind::of(&b.kind) == Some(list))
                .count();
            let items = &blocks[index..index + run];
            let markup = html! {
                @if list == ListKind::Ordered {
                    ol { @for item in items { li { (inline(item)) } } }
                } @else {
                    ul { @for item in items { li { (inline(item)) } } }
                }
            };
            out.push_str(&markup.into_string());
            index += run;
            continue;
        }
        out.push_str(&render_block(block).into_string());
        index += 1;
    }
    PreEscaped(out)
}

fn render_block(block: &RichTextBlock) -> Markup {
    match block.kind.as_str() {
        "heading1" => html! { h1 { (inline(block)) } },
        "heading2" => html! { h2 { (inline(block)) } },
        "heading3" => html! { h3 { (inline(block)) } },
        "heading4" => html! { h4 { (inline(block)) } },
        "heading5" => html! { h5 { (inline(block)) } },
        "heading6" => html! { h6 { (inline(block)) } },
        "preformatted" => html! { pre { (inline(block)) } },
        "image" => match block.url.as_deref().and_then(safe_href) {
            Some(src) => html! {
                p.block-img { img src=(src) alt=(block.alt.as_deref().unwrap_or("")); }
            },
            None => html! {},
        },
        _ if block.text.is_empty() => html! {},
        _ => html! { p { (inline(block)) } },
    }
}

/// Render a block's text with its spans applied.
///
/// The text is cut at every span boundary; each segment is wrapped in the
/// spans covering it. Overlapping spans therefore always produce
/// well-nested markup.
fn inline(block: &RichTextBlock) -> Markup {
    let chars: Vec<char> = block.text.chars().collect();
    let len = chars.len();
    let spans: Vec<&Span> = block
        .spans
        .iter()
        .filter(|s| s.start < s.end.min(len))
        .collect();

    let mut cuts = vec![0, len];
    for span in &spans {
        cuts.push(span.start);
        cuts.push(span.end.min(len));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut out = String::new();
    for pair in cuts.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let segment: String = chars[from..to].iter().collect();
        let active: Vec<&Span> = spans
            .iter()
            .copied()
            .filter(|s| s.start <= from && s.end.min(len) >= to)
            .collect();
        let mut markup = html! { (segment) }.into_string();
        for span in active.iter().rev() {
            markup = wrap(span, markup);
        }
        out.push_str(&markup);
    }
    PreEscaped(out)
}

fn wrap(span: &Span, inner: String) -> String {
    let inner = PreEscaped(inner);
    let markup = match span.kind.as_str() {
        "strong" => html! { strong { (inner) } },
        "em" => html! { em { (inner) } },
        "hyperlink" => {
            let href = span
                .data
                .as_ref()
                .and_then(|d| d.url.as_deref())
                .and_then(safe_href);
            match href {
                Some(href) => html! { a href=(href) target="_blank" rel="noopener" { (inner) } },
                None => html! { (inner) },
            }
        }
        "label" => {
            let label = span.data.as_ref().and_then(|d| d.label.as_deref());
            html! { span class=[label] { (inner) } }
        }
        _ => html! { (inner) },
    };
    markup.into_string()
}

/// Accept only URLs that cannot execute script when followed.
fn safe_href(url: &str) -> Option<&str> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    let allowed = ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
        || trimmed.starts_with('/')
        || trimmed.starts_with('#');
    allowed.then_some(trimmed)
}
