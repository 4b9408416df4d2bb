//! Substring search over multiple columns.
//!
//! # Invariants
//! - Query text is split on whitespace; every term must match (AND).
//! - A term matches when any searched column contains it (OR).
//! - Matching is case-insensitive for ASCII; `%`, `_` and `\` in terms are
//!   matched literally.
//! - Blank queries produce no filter.

use rusqlite::types::Value;

const LIKE_ESCAPE: char = '\\';

/// Parameterized `WHERE` fragment plus its bind values, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFilter {
    pub clause: String,
    pub bind_values: Vec<Value>,
}

/// Builds a filter matching `text` against `columns`.
///
/// Returns `None` for blank text or an empty column list.
pub fn build_text_filter(text: &str, columns: &[&str]) -> Option<TextFilter> {
    if columns.is_empty() {
        return None;
    }

    let terms = search_terms(text);
    if terms.is_empty() {
        return None;
    }

    let mut groups = Vec::with_capacity(terms.len());
    let mut bind_values = Vec::with_capacity(terms.len() * columns.len());
    for term in &terms {
        let pattern = format!("%{}%", escape_like(term));
        let alternatives = columns
            .iter()
            .map(|column| format!("{column} LIKE ? ESCAPE '{LIKE_ESCAPE}'"))
            .collect::<Vec<_>>();
        for _ in columns {
            bind_values.push(Value::Text(pattern.clone()));
        }
        groups.push(format!("({})", alternatives.join(" OR ")));
    }

    Some(TextFilter {
        clause: groups.join(" AND "),
        bind_values,
    })
}

/// Splits query text into non-empty terms.
pub fn search_terms(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
