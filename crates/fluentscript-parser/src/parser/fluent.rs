//! Fluent multi-word call-name resolution.
//!
//! FluentScript functions may be named with several words (`refill inventory`)
//! and called without punctuation between the words. The resolver takes the
//! window of consecutive identifier tokens at the call site and matches
//! progressively shorter concatenations against the known name tables:
//! longest candidate first, and for each candidate length the literal spaced
//! form, then the underscored form, then the external-function table. The
//! first match wins and reports how many tokens it consumed.
//!
//! Wildcard functions (`"create user by" *`) match by prefix; the remaining
//! trailing identifiers become the captured wildcard parts plus the
//! reconstructed spaced string.

use super::ParseContext;
use crate::ast::WildcardCapture;

/// Most identifier tokens considered for one fluent name.
pub const MAX_FLUENT_WINDOW: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct FluentMatch {
    /// The name to call, exactly as it is registered.
    pub name: String,
    /// How many identifier tokens of the window the match consumed.
    pub consumed: usize,
    pub wildcard: Option<WildcardCapture>,
}

/// Resolve a window of identifier words against the known callables.
pub fn resolve(window: &[String], ctx: &ParseContext) -> Option<FluentMatch> {
    for len in (1..=window.len()).rev() {
        let spaced = window[..len].join(" ");
        if ctx.functions.contains(&spaced) {
            return Some(FluentMatch { name: spaced, consumed: len, wildcard: None });
        }
        let underscored = window[..len].join("_");
        if ctx.functions.contains(&underscored) {
            return Some(FluentMatch { name: underscored, consumed: len, wildcard: None });
        }
        if ctx.external_functions.contains(&spaced) {
            return Some(FluentMatch { name: spaced, consumed: len, wildcard: None });
        }
        if ctx.external_functions.contains(&underscored) {
            return Some(FluentMatch { name: underscored, consumed: len, wildcard: None });
        }
    }

    for prefix in &ctx.wildcard_functions {
        let words: Vec<&str> = prefix.split(' ').collect();
        if window.len() >= words.len() && window[..words.len()].iter().map(String::as_str).eq(words.iter().copied())
        {
            let parts: Vec<String> = window[words.len()..].to_vec();
            let text = parts.join(" ");
            return Some(FluentMatch {
                name: prefix.clone(),
                consumed: window.len(),
                wildcard: Some(WildcardCapture { parts, text }),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext {
        let mut ctx = ParseContext::default();
        ctx.declare_function("refill inventory", false);
        ctx.declare_function("log_error", false);
        ctx.declare_function("create user by", true);
        ctx.external_functions.insert("send mail".to_string());
        ctx
    }

    fn words(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn longest_spaced_match_wins() {
        let m = resolve(&words(&["refill", "inventory"]), &ctx()).unwrap();
        assert_eq!(m.name, "refill inventory");
        assert_eq!(m.consumed, 2);
        assert!(m.wildcard.is_none());
    }

    #[test]
    fn underscored_form_is_tried_after_spaced() {
        let m = resolve(&words(&["log", "error"]), &ctx()).unwrap();
        assert_eq!(m.name, "log_error");
        assert_eq!(m.consumed, 2);
    }

    #[test]
    fn external_lookup_is_last() {
        let m = resolve(&words(&["send", "mail"]), &ctx()).unwrap();
        assert_eq!(m.name, "send mail");
    }

    #[test]
    fn wildcard_prefix_captures_trailing_words() {
        let m = resolve(&words(&["create", "user", "by", "name", "email"]), &ctx()).unwrap();
        assert_eq!(m.name, "create user by");
        assert_eq!(m.consumed, 5);
        let capture = m.wildcard.unwrap();
        assert_eq!(capture.parts, vec!["name", "email"]);
        assert_eq!(capture.text, "name email");
    }

    #[test]
    fn no_match_for_unknown_names() {
        assert!(resolve(&words(&["frob", "widget"]), &ctx()).is_none());
    }
}
