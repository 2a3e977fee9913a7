//! Symbol-to-spoken-text mappings for TTS. Pure lookup, no platform
//! dependency (§4.M). Grounded on
//! `original_source/accessibility/internal/service/screen-reader/symbol-table.cpp`.

use std::collections::HashMap;
use std::sync::OnceLock;

fn table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (".", "dot"),
            (",", "comma"),
            ("!", "exclamation mark"),
            ("?", "question mark"),
            ("@", "at sign"),
            ("#", "hash"),
            ("$", "dollar sign"),
            ("%", "percent"),
            ("^", "caret"),
            ("&", "ampersand"),
            ("*", "asterisk"),
            ("(", "left parenthesis"),
            (")", "right parenthesis"),
            ("-", "hyphen"),
            ("_", "underscore"),
            ("+", "plus"),
            ("=", "equals"),
            ("{", "left brace"),
            ("}", "right brace"),
            ("[", "left bracket"),
            ("]", "right bracket"),
            ("|", "vertical bar"),
            ("\\", "backslash"),
            ("/", "slash"),
            (":", "colon"),
            (";", "semicolon"),
            ("\"", "quotation mark"),
            ("'", "apostrophe"),
            ("<", "less than"),
            (">", "greater than"),
            ("~", "tilde"),
            ("`", "grave accent"),
            ("\n", "new line"),
            ("\t", "tab"),
            (" ", "space"),
            ("\u{00A9}", "copyright"),
            ("\u{00AE}", "registered"),
            ("\u{2122}", "trademark"),
            ("\u{00B0}", "degree"),
            ("\u{00A3}", "pound sign"),
            ("\u{00A5}", "yen sign"),
            ("\u{20AC}", "euro sign"),
            ("\u{00A2}", "cent sign"),
            ("\u{00B1}", "plus minus"),
            ("\u{00D7}", "multiplication sign"),
            ("\u{00F7}", "division sign"),
            ("\u{221E}", "infinity"),
            ("\u{2260}", "not equal"),
            ("\u{2264}", "less than or equal"),
            ("\u{2265}", "greater than or equal"),
            ("\u{2026}", "ellipsis"),
            ("\u{2013}", "en dash"),
            ("\u{2014}", "em dash"),
            ("\u{2018}", "left single quotation mark"),
            ("\u{2019}", "right single quotation mark"),
            ("\u{201C}", "left double quotation mark"),
            ("\u{201D}", "right double quotation mark"),
        ])
    })
}

/// Looks up the spoken form of a symbol, or `None` if it has no entry.
pub fn lookup(symbol: &str) -> Option<&'static str> {
    table().get(symbol).copied()
}

/// Looks up the spoken form of a symbol, falling back to the symbol itself
/// when unrecognized (§4.M: total function with identity fallback).
pub fn spoken_form(symbol: &str) -> String {
    lookup(symbol).map(str::to_string).unwrap_or_else(|| symbol.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_resolve() {
        assert_eq!(lookup("."), Some("dot"));
        assert_eq!(lookup("@"), Some("at sign"));
        assert_eq!(lookup("\u{2026}"), Some("ellipsis"));
    }

    #[test]
    fn unknown_symbol_falls_back_to_identity() {
        assert_eq!(lookup("z"), None);
        assert_eq!(spoken_form("z"), "z");
        assert_eq!(spoken_form("#"), "hash");
    }
}
