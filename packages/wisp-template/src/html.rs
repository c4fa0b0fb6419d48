//! The streaming HTML scanner (spec §4.9): a single regex-driven pass over
//! the template string, maintaining a cursor and a stack of unclosed start
//! tags, dispatching to a [`HtmlSink`] exactly the way the host framework's
//! `parseHTML` dispatches to its `options.start/end/chars/comment`.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::ParseError;
use crate::util::{can_be_left_open_tag, decode_attribute, is_non_phrasing_tag, is_plain_text_element, is_script_like};

static START_TAG_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([a-zA-Z_][-a-zA-Z0-9_.]*)").unwrap());
static START_TAG_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(/?)>").unwrap());
static END_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</([a-zA-Z_][-a-zA-Z0-9_.]*)[^>]*>").unwrap());
static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| RegexBuilder::new(r"^<!doctype[^>]*>").case_insensitive(true).build().unwrap());
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)^\s*((?:[^\s"'<>/=\[\]]|\[[^\]]*\])+)(?:\s*(=)\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});

/// Parser configuration (spec §6's template compiler options).
#[derive(Debug, Clone)]
pub struct HtmlParserOptions {
    /// Emit comment nodes at all (spec §4.9: `shouldKeepComment`).
    pub should_keep_comment: bool,
    /// Decode `&#10;`/`&#9;` in ordinary attribute values.
    pub should_decode_newlines: bool,
    /// Decode `&#10;`/`&#9;` specifically in `href` attribute values (some
    /// hosts only need the IE `href` workaround, not general attrs).
    pub should_decode_newlines_for_href: bool,
    /// Auto-close a dangling `<p>` before a non-phrasing tag and a
    /// left-open `li`/`option`-like tag on repeat (spec §4.9).
    pub expect_html: bool,
}

impl Default for HtmlParserOptions {
    fn default() -> Self {
        HtmlParserOptions {
            should_keep_comment: false,
            should_decode_newlines: false,
            should_decode_newlines_for_href: false,
            expect_html: true,
        }
    }
}

/// Receives scanner events, mirroring the host's `options.start/end/chars/
/// comment/warn` callback surface (spec §6).
pub trait HtmlSink {
    fn start(&mut self, tag: &str, attrs: &[(String, String)], unary: bool, start: usize, end: usize);
    fn end(&mut self, tag: &str, start: usize, end: usize);
    fn chars(&mut self, text: &str, start: usize, end: usize);
    fn comment(&mut self, text: &str, start: usize, end: usize);
    fn warn(&mut self, err: ParseError);
}

struct StackFrame {
    tag: String,
    start: usize,
}

/// Scans `html` from start to end, dispatching every recognized construct
/// to `sink`. Never panics or aborts early on malformed input — spec §7's
/// "parser recovers by consuming the remainder as text".
pub fn parse_html(html: &str, options: &HtmlParserOptions, sink: &mut dyn HtmlSink) {
    let mut index = 0usize;
    let mut stack: Vec<StackFrame> = Vec::new();
    let mut plain_text: Option<(String, usize)> = None;

    while index < html.len() {
        if let Some((tag, plain_start)) = plain_text.take() {
            index = scan_plain_text(html, index, plain_start, &tag, &mut stack, sink);
            continue;
        }

        let rest = &html[index..];

        if let Some(end_rel) = rest.strip_prefix("<!--").and_then(|after| after.find("-->")) {
            let content = &rest[4..4 + end_rel];
            if options.should_keep_comment {
                sink.comment(content, index + 4, index + 4 + end_rel);
            }
            index += 4 + end_rel + 3;
            continue;
        }

        if let Some(end_rel) = rest.strip_prefix("<![").and_then(|after| after.find("]>")) {
            index += 3 + end_rel + 2;
            continue;
        }

        if let Some(m) = DOCTYPE.find(rest) {
            index += m.end();
            continue;
        }

        if let Some(caps) = END_TAG.captures(rest) {
            if caps.get(0).unwrap().start() == 0 {
                let tag = caps[1].to_string();
                let whole_len = caps.get(0).unwrap().end();
                let start = index;
                let end = index + whole_len;
                index += whole_len;
                parse_end_tag(Some(&tag), start, end, &mut stack, sink);
                continue;
            }
        }

        if let Some(parsed) = try_parse_start_tag(rest) {
            let start = index;
            let end = index + parsed.len;
            index += parsed.len;
            let decoded_attrs: Vec<(String, String)> = parsed
                .attrs
                .iter()
                .map(|(name, value)| {
                    let decode_newlines = if name.eq_ignore_ascii_case("href") {
                        options.should_decode_newlines_for_href
                    } else {
                        options.should_decode_newlines
                    };
                    (name.clone(), decode_attribute(value, decode_newlines))
                })
                .collect();
            handle_start_tag(
                &parsed.tag,
                &decoded_attrs,
                parsed.unary,
                start,
                end,
                options,
                &mut stack,
                sink,
            );
            if is_plain_text_element(&parsed.tag) && !parsed.unary {
                plain_text = Some((parsed.tag.clone(), end));
            }
            continue;
        }

        // Generic text: scan forward for the next position that begins a
        // construct the dispatch above would actually recognize.
        let boundary = text_boundary(rest);
        if boundary == 0 {
            // No forward progress is possible (a lone unrecognized '<' at
            // position 0, with nothing in the rest of the string that
            // looks like a tag either) — emit the remainder as text per
            // spec §4.9's malformed-template termination rule and stop.
            sink.warn(ParseError::MalformedTemplate { offset: index });
            sink.chars(rest, index, html.len());
            index = html.len();
            continue;
        }
        let text = &rest[..boundary];
        sink.chars(text, index, index + boundary);
        index += boundary;
    }

    // EOF: close anything still open (a single call empties the stack).
    if !stack.is_empty() {
        parse_end_tag(None, index, index, &mut stack, sink);
    }
}

fn scan_plain_text(
    html: &str,
    index: usize,
    _plain_start: usize,
    tag: &str,
    stack: &mut Vec<StackFrame>,
    sink: &mut dyn HtmlSink,
) -> usize {
    let rest = &html[index..];
    let rest_lower = rest.to_ascii_lowercase();
    let needle = format!("</{}", tag.to_ascii_lowercase());

    if let Some(rel) = rest_lower.find(&needle) {
        if let Some(gt_rel) = rest[rel..].find('>') {
            let content = &rest[..rel];
            let text = if is_script_like(tag) {
                content.to_string()
            } else {
                strip_cdata_and_comments(content)
            };
            if !text.is_empty() {
                sink.chars(&text, index, index + rel);
            }
            let tag_end = index + rel + gt_rel + 1;
            parse_end_tag(Some(tag), index + rel, tag_end, stack, sink);
            return tag_end;
        }
    }

    sink.warn(ParseError::UnmatchedEndTag { tag: tag.to_string() });
    sink.chars(rest, index, html.len());
    html.len()
}

fn strip_cdata_and_comments(text: &str) -> String {
    static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
    static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());
    let once = CDATA.replace_all(text, "$1");
    COMMENT.replace_all(&once, "").into_owned()
}

struct ParsedStartTag {
    tag: String,
    attrs: Vec<(String, String)>,
    unary: bool,
    len: usize,
}

fn try_parse_start_tag(s: &str) -> Option<ParsedStartTag> {
    let open = START_TAG_OPEN.captures(s)?;
    let tag = open[1].to_string();
    let mut pos = open.get(0).unwrap().end();
    let mut attrs = Vec::new();

    loop {
        let tail = &s[pos..];
        if let Some(close) = START_TAG_CLOSE.captures(tail) {
            if close.get(0).unwrap().start() == 0 {
                let unary = !close[1].is_empty();
                pos += close.get(0).unwrap().end();
                return Some(ParsedStartTag { tag, attrs, unary, len: pos });
            }
        }
        if let Some(attr) = ATTRIBUTE.captures(tail) {
            if attr.get(0).unwrap().start() == 0 {
                let name = attr[1].to_string();
                let value = attr
                    .get(3)
                    .or_else(|| attr.get(4))
                    .or_else(|| attr.get(5))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                pos += attr.get(0).unwrap().end();
                attrs.push((name, value));
                continue;
            }
        }
        return None;
    }
}

/// Finds the earliest point in `rest` that a real construct (comment,
/// conditional comment, doctype, end tag, start tag) begins. A `<` that
/// doesn't lead anywhere recognizable is swallowed into the preceding text
/// run (spec §8 Scenario E: `"<div>a<b</div>"` keeps the stray `<b` as
/// part of the text).
fn text_boundary(rest: &str) -> usize {
    let mut search_from = 0usize;
    loop {
        match rest[search_from..].find('<') {
            None => return rest.len(),
            Some(rel) => {
                let pos = search_from + rel;
                if looks_like_recognized_construct(&rest[pos..]) {
                    return pos;
                }
                search_from = pos + 1;
                if search_from >= rest.len() {
                    return rest.len();
                }
            }
        }
    }
}

fn looks_like_recognized_construct(s: &str) -> bool {
    if let Some(after) = s.strip_prefix("<!--") {
        return after.contains("-->");
    }
    if let Some(after) = s.strip_prefix("<![") {
        return after.contains("]>");
    }
    if DOCTYPE.is_match(s) {
        return true;
    }
    if END_TAG.captures(s).map(|c| c.get(0).unwrap().start() == 0).unwrap_or(false) {
        return true;
    }
    try_parse_start_tag(s).is_some()
}

fn handle_start_tag(
    tag: &str,
    attrs: &[(String, String)],
    unary: bool,
    start: usize,
    end: usize,
    options: &HtmlParserOptions,
    stack: &mut Vec<StackFrame>,
    sink: &mut dyn HtmlSink,
) {
    if options.expect_html {
        if let Some(top) = stack.last() {
            if top.tag == "p" && is_non_phrasing_tag(tag) {
                parse_end_tag(Some("p"), start, start, stack, sink);
            }
        }
        if let Some(top) = stack.last() {
            if can_be_left_open_tag(tag) && top.tag == tag {
                let top_tag = top.tag.clone();
                parse_end_tag(Some(&top_tag), start, start, stack, sink);
            }
        }
    }

    if !unary {
        stack.push(StackFrame { tag: tag.to_string(), start });
    }
    sink.start(tag, attrs, unary, start, end);
}

/// Walks `stack` from the top looking for the frame matching `tag` (or, if
/// `tag` is `None`, the "close everything" EOF form), warning on every
/// intermediate frame it has to close along the way, then truncates the
/// stack. Falls back to the `br`/`p` synthesis spec §4.9 calls out when no
/// matching open tag exists at all.
fn parse_end_tag(tag: Option<&str>, start: usize, end: usize, stack: &mut Vec<StackFrame>, sink: &mut dyn HtmlSink) {
    let pos = match tag {
        Some(t) => {
            let lower = t.to_ascii_lowercase();
            stack.iter().rposition(|f| f.tag.eq_ignore_ascii_case(&lower))
        }
        None => {
            if stack.is_empty() {
                None
            } else {
                Some(0)
            }
        }
    };

    if let Some(pos) = pos {
        let top = stack.len();
        for i in (pos..top).rev() {
            if i > pos || tag.is_none() {
                sink.warn(ParseError::UnmatchedEndTag { tag: stack[i].tag.clone() });
            }
            sink.end(&stack[i].tag, start, end);
        }
        stack.truncate(pos);
    } else if let Some(t) = tag {
        let lower = t.to_ascii_lowercase();
        if lower == "br" {
            sink.start(t, &[], true, start, end);
        } else if lower == "p" {
            sink.start(t, &[], false, start, end);
            sink.end(t, start, end);
        }
    }
}
