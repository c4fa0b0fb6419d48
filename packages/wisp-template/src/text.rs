//! The text/interpolation parser (spec §4.10): scans a text slice for
//! `{{ expr }}`-style interpolation and builds both the `_s(expr)`-wrapped
//! expression string used by the (out-of-scope) code generator and the
//! structured `rawTokens` list consumers that want plain `(text, binding)`
//! pieces can use directly.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

/// One piece of the structured token list: either a literal text run or a
/// `{{ expr }}` binding (spec §4.10's `{'@binding': expr}` entries).
#[derive(Debug, Clone, PartialEq)]
pub enum RawToken {
    Text(String),
    Binding(String),
}

/// The result of parsing interpolation out of a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParseResult {
    /// `tokens.join('+')`: alternating JSON-quoted literals and
    /// `_s(expr)` calls, ready for the (out-of-scope) render-function
    /// generator to splice into a template literal.
    pub expression: String,
    /// The structured token list (spec §8 law 10: four entries for two
    /// interpolations, two of them `RawToken::Binding`).
    pub tokens: Vec<RawToken>,
}

static DEFAULT_DELIMITERS: (&str, &str) = ("{{", "}}");

static DELIMITER_REGEX_CACHE: Lazy<Mutex<HashMap<(String, String), Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn delimiter_regex(open: &str, close: &str) -> Regex {
    let key = (open.to_string(), close.to_string());
    let mut cache = DELIMITER_REGEX_CACHE.lock().unwrap();
    if let Some(re) = cache.get(&key) {
        return re.clone();
    }
    let pattern = format!(
        "{}((?:.|\\n)+?){}",
        regex::escape(open),
        regex::escape(close)
    );
    let re = Regex::new(&pattern).expect("delimiter regex must compile");
    cache.insert(key, re.clone());
    re
}

/// `parseText(text, delimiters?)` (spec §4.10). Returns `None` when `text`
/// contains no interpolation, matching the host API's `undefined` return.
pub fn parse_text(text: &str, delimiters: Option<(&str, &str)>) -> Option<TextParseResult> {
    let (open, close) = delimiters.unwrap_or(DEFAULT_DELIMITERS);
    let re = delimiter_regex(open, close);
    if !re.is_match(text) {
        return None;
    }

    let mut expression_parts = Vec::new();
    let mut tokens = Vec::new();
    let mut last_end = 0;

    for caps in re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let raw_expr = caps.get(1).unwrap().as_str().trim();

        let literal = &text[last_end..whole.start()];
        if !literal.is_empty() {
            expression_parts.push(json_quote(literal));
            tokens.push(RawToken::Text(literal.to_string()));
        }

        let expr = parse_filters(raw_expr);
        expression_parts.push(format!("_s({expr})"));
        tokens.push(RawToken::Binding(expr));

        last_end = whole.end();
    }

    let tail = &text[last_end..];
    if !tail.is_empty() {
        expression_parts.push(json_quote(tail));
        tokens.push(RawToken::Text(tail.to_string()));
    }

    Some(TextParseResult {
        expression: expression_parts.join("+"),
        tokens,
    })
}

/// JSON-quotes a literal text run the way the host's `JSON.stringify`
/// would, so it can be spliced directly into a generated expression string.
fn json_quote(s: &str) -> String {
    serde_json_like_quote(s)
}

fn serde_json_like_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Transforms `expr | filterA | filterB(arg)` into nested `_f("name")(...)`
/// calls (spec §4.10: "Interpolation expressions are further passed through
/// a filter parser (out-of-scope, treated as an opaque transformation)").
///
/// A direct port of the host framework's character-scanning `parseFilters`,
/// tracking string/template-literal/regex state so a `|` inside a string
/// literal or a logical-or `||` is never mistaken for a filter pipe.
pub fn parse_filters(exp: &str) -> String {
    let chars: Vec<char> = exp.chars().collect();
    let len = chars.len();

    let mut in_single = false;
    let mut in_double = false;
    let mut in_template = false;
    let mut in_regex = false;
    let mut curly = 0i32;
    let mut square = 0i32;
    let mut paren = 0i32;

    let mut last_filter_index = 0usize;
    let mut expression: Option<String> = None;
    let mut filters: Vec<String> = Vec::new();

    let mut i = 0usize;
    while i < len {
        let c = chars[i];
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };

        if in_single {
            if c == '\'' && prev != Some('\\') {
                in_single = false;
            }
        } else if in_double {
            if c == '"' && prev != Some('\\') {
                in_double = false;
            }
        } else if in_template {
            if c == '`' && prev != Some('\\') {
                in_template = false;
            }
        } else if in_regex {
            if c == '/' && prev != Some('\\') {
                in_regex = false;
            }
        } else if c == '|'
            && chars.get(i + 1) != Some(&'|')
            && prev != Some('|')
            && curly == 0
            && square == 0
            && paren == 0
        {
            if expression.is_none() {
                last_filter_index = i + 1;
                expression = Some(chars[..i].iter().collect::<String>().trim().to_string());
            } else {
                filters.push(chars[last_filter_index..i].iter().collect::<String>().trim().to_string());
                last_filter_index = i + 1;
            }
        } else {
            match c {
                '"' => in_double = true,
                '\'' => in_single = true,
                '`' => in_template = true,
                '(' => paren += 1,
                ')' => paren -= 1,
                '[' => square += 1,
                ']' => square -= 1,
                '{' => curly += 1,
                '}' => curly -= 1,
                '/' => {
                    let mut j = i;
                    let mut prev_non_space = None;
                    while j > 0 {
                        j -= 1;
                        if chars[j] != ' ' {
                            prev_non_space = Some(chars[j]);
                            break;
                        }
                    }
                    let valid_division_char = matches!(
                        prev_non_space,
                        Some(c) if c.is_alphanumeric() || matches!(c, ')' | '.' | '+' | '-' | '_' | '$' | ']')
                    );
                    if prev_non_space.is_none() || !valid_division_char {
                        in_regex = true;
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    let base = match expression {
        None => chars[..len].iter().collect::<String>().trim().to_string(),
        Some(expr) => {
            if last_filter_index != 0 {
                filters.push(chars[last_filter_index..len].iter().collect::<String>().trim().to_string());
            }
            expr
        }
    };

    filters
        .into_iter()
        .fold(base, |expr, filter| wrap_filter(&expr, &filter))
}

fn wrap_filter(exp: &str, filter: &str) -> String {
    match filter.find('(') {
        None => format!("_f(\"{filter}\")({exp})"),
        Some(i) => {
            let name = &filter[..i];
            let args = &filter[i + 1..];
            if args != ")" {
                format!("_f(\"{name}\")({exp},{args}")
            } else {
                format!("_f(\"{name}\")({exp}{args}")
            }
        }
    }
}
