// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of bridge markup to Telegram MarkdownV2.
//!
//! Bridge markup knows three constructs: `**bold**`, `` `code` `` and
//! `[label](url)`. A backslash makes the next character literal. Anything
//! that does not close is rendered as plain text, so user-provided content
//! can never break the parse on Telegram's side.

/// Characters that must be escaped in MarkdownV2 outside code and links.
const SPECIAL_CHARS: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Span {
    Text(String),
    Bold(Vec<Span>),
    Code(String),
    Link { label: String, url: String },
}

/// Renders bridge markup as MarkdownV2.
pub fn to_markdown_v2(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len() * 2);
    render_v2(&parse(&chars, true), &mut out);
    out
}

/// Renders bridge markup as plain text, for the fallback path when Telegram
/// rejects the formatted version.
pub fn to_plain_text(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    render_plain(&parse(&chars, true), &mut out);
    out
}

/// Position of the next unescaped occurrence of `pattern` at or after `from`.
fn find_unescaped(chars: &[char], from: usize, pattern: &[char]) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i..].starts_with(pattern) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut iter = chars.iter();
    while let Some(&c) = iter.next() {
        if c == '\\' {
            match iter.next() {
                Some(&next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse(chars: &[char], allow_bold: bool) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    let flush = |text: &mut String, spans: &mut Vec<Span>| {
        if !text.is_empty() {
            spans.push(Span::Text(std::mem::take(text)));
        }
    };

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                match chars.get(i + 1) {
                    Some(&next) => text.push(next),
                    None => text.push('\\'),
                }
                i += 2;
            }
            '*' if allow_bold && chars.get(i + 1) == Some(&'*') => {
                match find_unescaped(chars, i + 2, &['*', '*']) {
                    Some(end) if end > i + 2 => {
                        flush(&mut text, &mut spans);
                        spans.push(Span::Bold(parse(&chars[i + 2..end], false)));
                        i = end + 2;
                    }
                    _ => {
                        text.push_str("**");
                        i += 2;
                    }
                }
            }
            '`' => match find_unescaped(chars, i + 1, &['`']) {
                Some(end) => {
                    flush(&mut text, &mut spans);
                    spans.push(Span::Code(unescape(&chars[i + 1..end])));
                    i = end + 1;
                }
                None => {
                    text.push('`');
                    i += 1;
                }
            },
            '[' => match parse_link(chars, i) {
                Some((label, url, next)) => {
                    flush(&mut text, &mut spans);
                    spans.push(Span::Link { label, url });
                    i = next;
                }
                None => {
                    text.push('[');
                    i += 1;
                }
            },
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    flush(&mut text, &mut spans);
    spans
}

/// Parses `[label](url)` starting at `start`; returns the label, the url and
/// the index after the closing parenthesis.
fn parse_link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let close = find_unescaped(chars, start + 1, &[']'])?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = find_unescaped(chars, close + 2, &[')'])?;
    let url = unescape(&chars[close + 2..end]);
    if url.trim().is_empty() {
        return None;
    }
    Some((unescape(&chars[start + 1..close]), url, end + 1))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn render_v2(spans: &[Span], out: &mut String) {
    for span in spans {
        match span {
            Span::Text(text) => escape_text(text, out),
            Span::Bold(inner) => {
                out.push('*');
                render_v2(inner, out);
                out.push('*');
            }
            Span::Code(code) => {
                out.push('`');
                for c in code.chars() {
                    if c == '`' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('`');
            }
            Span::Link { label, url } => {
                out.push('[');
                escape_text(label, out);
                out.push_str("](");
                for c in url.chars() {
                    if c == ')' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push(')');
            }
        }
    }
}

fn render_plain(spans: &[Span], out: &mut String) {
    for span in spans {
        match span {
            Span::Text(text) | Span::Code(text) => out.push_str(text),
            Span::Bold(inner) => render_plain(inner, out),
            Span::Link { label, url } if label == url || label.is_empty() => out.push_str(url),
            Span::Link { label, url } => {
                out.push_str(label);
                out.push_str(" (");
                out.push_str(url);
                out.push(')');
            }
        }
    }
}
