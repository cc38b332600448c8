//! Rich-text sanitizer
//!
//! Keeps a small allow-list of formatting tags, drops every attribute except a
//! safe `href` on links, removes script/style blocks and comments, and escapes
//! any other markup so it renders as text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

const ALLOWED_TAGS: &[&str] = &[
    "a",
    "abbr",
    "acronym",
    "b",
    "blockquote",
    "br",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "p",
    "strong",
    "ul",
];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")
            .expect("valid block pattern")
    })
}

fn tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9]*)([^<>]*)>").expect("valid tag pattern")
    })
}

fn href() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("valid href pattern")
    })
}

fn entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
            .expect("valid entity pattern")
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn safe_href(attrs: &str) -> Option<String> {
    let caps = href().captures(attrs)?;
    let value = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();

    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_lowercase();

    let scheme_end = normalized.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    if let Some(idx) = scheme_end {
        if normalized[idx..].starts_with(':') && !ALLOWED_SCHEMES.contains(&&normalized[..idx]) {
            return None;
        }
    }

    Some(value.to_string())
}

/// Escape `<`, `>` and any `&` that does not start a character reference
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(|c| matches!(c, '<' | '>' | '&')) {
        escaped.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match tail.as_bytes()[0] {
            b'<' => escaped.push_str("&lt;"),
            b'>' => escaped.push_str("&gt;"),
            _ if entity().is_match(tail) => escaped.push('&'),
            _ => escaped.push_str("&amp;"),
        }
        rest = &tail[1..];
    }

    escaped.push_str(rest);
    escaped
}

/// Rebuild an allowed tag without attributes, or escape the whole match
fn render_tag(caps: &Captures) -> String {
    let closing = &caps[1];
    let name = caps[2].to_lowercase();

    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return escape(&caps[0]);
    }

    if closing.is_empty() && name == "a" {
        if let Some(href) = safe_href(&caps[3]) {
            return format!("<a href=\"{}\">", escape(&href));
        }
    }

    format!("<{}{}>", closing, name)
}

/// Sanitize user supplied rich text
///
/// Only whole tags matched by the tag pattern may produce markup; every other
/// `<` or `>` in the input is escaped.
pub fn clean(html: &str) -> String {
    let source = blocks().replace_all(html, "");
    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for caps in tags().captures_iter(&source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        output.push_str(&escape_text(&source[last..whole.start()]));
        output.push_str(&render_tag(&caps));
        last = whole.end();
    }

    output.push_str(&escape_text(&source[last..]));
    output
}
