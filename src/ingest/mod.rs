// src/ingest/mod.rs
pub mod memory;
pub mod providers;
pub mod types;

/// Normalize post text: decode HTML entities, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_entities_and_collapses_ws() {
        let s = "  RT @rustlang:&nbsp;2024 edition &amp; async closures\n\n #rust  ";
        assert_eq!(normalize_text(s), "RT @rustlang: 2024 edition & async closures #rust");
    }
}
