//! Errors surfaced by the template scanner and text parser.
//!
//! Per spec §7 ("Malformed template ... Development-only warning via
//! `options.warn`; parser recovers by consuming the remainder as text"),
//! none of these ever abort a parse — they are constructed and handed to
//! the same `warn` callback the parser's public entry point already takes.

use thiserror::Error;

/// Conditions the HTML/text scanner can run into without aborting the parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `parseEndTag` walked past open start tags without finding `tag`
    /// (or hit EOF while tags remained open).
    #[error("tag <{tag}> has no matching end tag")]
    UnmatchedEndTag {
        /// The tag name that was never closed.
        tag: String,
    },
    /// A scan pass made no forward progress; the remainder of the template
    /// was emitted as a single text chunk and the loop terminated.
    #[error("malformed template, could not parse past byte offset {offset}")]
    MalformedTemplate {
        /// The cursor position the scanner got stuck at.
        offset: usize,
    },
    /// A dynamic-argument attribute (`:[expr]="..."`) had an unterminated
    /// or empty bracketed expression.
    #[error("invalid dynamic argument in attribute {attr:?}")]
    InvalidDynamicArgument {
        /// The raw attribute text that failed to parse.
        attr: String,
    },
}
