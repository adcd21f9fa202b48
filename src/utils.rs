//! Title normalization and delimited-field escaping helpers.

use crate::types::Title;

/// Normalize a page title: uppercase the first character and replace
/// underscores with spaces. Root-category matching and label derivation both
/// rely on titles being in this form.
pub fn normalize_title(title: &str) -> Title {
    let mut chars = title.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut normalized = String::with_capacity(title.len());
            normalized.extend(first.to_uppercase());
            normalized.push_str(&chars.as_str().replace('_', " "));
            normalized
        }
    }
}

/// Percent-escape the delimiters of the output row format so arbitrary titles
/// and label texts survive a round trip through the relation files.
pub fn escape_field(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            ',' => escaped.push_str("%2C"),
            '|' => escaped.push_str("%7C"),
            ':' => escaped.push_str("%3A"),
            ';' => escaped.push_str("%3B"),
            '\n' => escaped.push_str("%0A"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Reverse [`escape_field`]. Unknown escapes are kept verbatim.
pub fn unescape_field(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            unescaped.push(ch);
            continue;
        }
        let hex: String = chars.clone().take(2).collect();
        match hex.as_str() {
            "25" => unescaped.push('%'),
            "2C" => unescaped.push(','),
            "7C" => unescaped.push('|'),
            "3A" => unescaped.push(':'),
            "3B" => unescaped.push(';'),
            "0A" => unescaped.push('\n'),
            _ => {
                unescaped.push('%');
                continue;
            }
        }
        chars.next();
        chars.next();
    }
    unescaped
}
