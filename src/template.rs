//! # Expression-Preserving Text Transform
//!
//! Template strings mix literal text with double-brace expressions that a
//! downstream renderer resolves against job data:
//!
//! ```text
//! "Order {{id}} for {{{customer_html}}} & co"
//!  ^^^^^^ ^^^^^^ ^^^^ ^^^^^^^^^^^^^^^^^^ ^^^^^
//!  lit    expr   lit  expr (raw)         lit
//! ```
//!
//! Compilers escape only the literal spans for their output format. The
//! expression spans pass through byte for byte, including whether they use
//! two braces (escaped substitution) or three (raw substitution).
//!
//! ```
//! use rprint_layout::template::{escape_template, Escaper};
//!
//! let out = escape_template("Hello {{name}} & co", Escaper::Html);
//! assert_eq!(out, "Hello {{name}} &amp; co");
//! ```

/// One span of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Plain text, to be escaped for the destination format.
    Literal(&'a str),
    /// A `{{…}}` or `{{{…}}}` expression, braces included.
    Expression(&'a str),
}

impl<'a> Span<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Span::Literal(s) | Span::Expression(s) => s,
        }
    }
}

/// Split `input` into literal and expression spans, in order.
///
/// An expression opens at `{{` (a third `{` is absorbed) and closes at the
/// next `}}` (a third `}` is absorbed). An opening without a closing is
/// literal text.
pub fn lex(input: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = input[cursor..].find("{{") {
        let open = cursor + offset;
        let mut body = open + 2;
        if input[body..].starts_with('{') {
            body += 1;
        }
        let Some(close_offset) = input[body..].find("}}") else {
            break;
        };
        let mut end = body + close_offset + 2;
        if input[end..].starts_with('}') {
            end += 1;
        }
        if open > literal_start {
            spans.push(Span::Literal(&input[literal_start..open]));
        }
        spans.push(Span::Expression(&input[open..end]));
        literal_start = end;
        cursor = end;
    }

    if literal_start < input.len() {
        spans.push(Span::Literal(&input[literal_start..]));
    }
    spans
}

/// Whether `input` contains at least one expression.
pub fn has_expression(input: &str) -> bool {
    lex(input).iter().any(|s| matches!(s, Span::Expression(_)))
}

/// Literal escaping rules per output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaper {
    /// Markup: `& < > " '` become entities.
    Html,
    /// ZPL field data read under `^FH\`: `\ ^ ~` become hex escapes.
    Zpl,
    /// ESC/POS: control characters other than newline are dropped so
    /// literal text cannot inject printer commands.
    EscPos,
    /// Plain text: carriage returns are dropped.
    Plain,
}

impl Escaper {
    /// Escape one literal span.
    pub fn escape_literal(self, s: &str, out: &mut String) {
        match self {
            Escaper::Html => {
                for ch in s.chars() {
                    match ch {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        '"' => out.push_str("&quot;"),
                        '\'' => out.push_str("&#39;"),
                        c => out.push(c),
                    }
                }
            }
            Escaper::Zpl => {
                for ch in s.chars() {
                    match ch {
                        '\\' => out.push_str("\\5C"),
                        '^' => out.push_str("\\5E"),
                        '~' => out.push_str("\\7E"),
                        c => out.push(c),
                    }
                }
            }
            Escaper::EscPos => {
                out.extend(s.chars().filter(|c| *c == '\n' || !c.is_control()));
            }
            Escaper::Plain => {
                out.extend(s.chars().filter(|c| *c != '\r'));
            }
        }
    }
}

/// Escape the literal spans of `input` and keep its expressions verbatim.
pub fn escape_template(input: &str, escaper: Escaper) -> String {
    let mut out = String::with_capacity(input.len());
    for span in lex(input) {
        match span {
            Span::Literal(s) => escaper.escape_literal(s, &mut out),
            Span::Expression(s) => out.push_str(s),
        }
    }
    out
}

/// Wrap an already-compiled fragment in a render-time conditional.
pub fn wrap_conditional(condition: &str, fragment: &str) -> String {
    format!("{{{{#if {}}}}}{}{{{{/if}}}}", condition.trim(), fragment)
}
