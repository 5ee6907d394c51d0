//! Lexical plugin registry and the standard plugin set.
//!
//! A lexical plugin registers either for a concrete trigger character (`#`
//! comments, `@marker` annotations) or as a wildcard, probed whenever the
//! default scanner is about to emit an identifier or number token. Within a
//! tier, registration order is preserved and is load-bearing: several wildcard
//! plugins compete for digit-led input (dates, times, phone numbers, versions)
//! and rely on increasingly specific `can_handle` probes.
//!
//! `can_handle` is a pure bounded peek over the remaining input; it must not
//! consume anything. Only `parse` consumes, through the [`Scanner`] it is
//! handed.

use super::{LexError, Scanner};
use crate::token::{Token, TokenKind, TokenValue};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

/// What causes a plugin to be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexTrigger {
    /// Probed when the next unconsumed character equals this one.
    Char(char),
    /// Probed when the default scanner produced an identifier or number.
    Wildcard,
}

/// A lexical extension.
pub trait LexicalPlugin {
    fn name(&self) -> &'static str;

    fn trigger(&self) -> LexTrigger;

    /// Grammar description for documentation/tooling. Not used for dispatch.
    fn grammar(&self) -> &'static str {
        ""
    }

    /// Example inputs for documentation/tooling.
    fn examples(&self) -> &'static [&'static str] {
        &[]
    }

    /// Pure lookahead test. `candidate` is the token the default scanner is
    /// about to emit (wildcard tier only); `rest` is the unconsumed input
    /// starting at that token.
    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool;

    /// Consume input and emit replacement tokens. Must leave the scanner
    /// exactly past the consumed text.
    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError>;
}

/// Registry of lexical plugins, two tiers, registration order preserved.
pub struct LexicalRegistry {
    concrete: Vec<(char, Rc<dyn LexicalPlugin>)>,
    wildcard: Vec<Rc<dyn LexicalPlugin>>,
}

impl LexicalRegistry {
    pub fn empty() -> Self {
        Self { concrete: Vec::new(), wildcard: Vec::new() }
    }

    /// The standard plugin set. Order matters within the wildcard tier.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Rc::new(CommentPlugin));
        registry.register(Rc::new(AnnotationPlugin));
        registry.register(Rc::new(DatePlugin));
        registry.register(Rc::new(TimePlugin));
        registry.register(Rc::new(PhonePlugin));
        registry.register(Rc::new(VersionPlugin));
        registry.register(Rc::new(EmailPlugin));
        registry.register(Rc::new(UriPlugin));
        registry
    }

    pub fn register(&mut self, plugin: Rc<dyn LexicalPlugin>) {
        match plugin.trigger() {
            LexTrigger::Char(c) => self.concrete.push((c, plugin)),
            LexTrigger::Wildcard => self.wildcard.push(plugin),
        }
    }

    /// Concrete-tier plugins for a trigger character, registration order.
    pub fn for_trigger(&self, c: char) -> Vec<Rc<dyn LexicalPlugin>> {
        self.concrete
            .iter()
            .filter(|(trigger, _)| *trigger == c)
            .map(|(_, p)| Rc::clone(p))
            .collect()
    }

    /// Wildcard-tier plugins, registration order.
    pub fn wildcard(&self) -> Vec<Rc<dyn LexicalPlugin>> {
        self.wildcard.iter().map(Rc::clone).collect()
    }
}

fn match_len(re: &Regex, rest: &str) -> Option<usize> {
    re.find(rest).map(|m| m.end())
}

// ---------------------------------------------------------------------------
// `#` line comments
// ---------------------------------------------------------------------------

struct CommentPlugin;

impl LexicalPlugin for CommentPlugin {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Char('#')
    }

    fn grammar(&self) -> &'static str {
        "# <text to end of line>"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["# refill threshold, see ops runbook"]
    }

    fn can_handle(&self, _candidate: Option<&Token>, rest: &str) -> bool {
        rest.starts_with('#')
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let rest = scanner.rest();
        let len = rest.find('\n').unwrap_or(rest.len());
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(
            TokenKind::Comment,
            TokenValue::Str(text[1..].trim().to_string()),
            text,
            span,
        )])
    }
}

// ---------------------------------------------------------------------------
// `@marker` annotations
// ---------------------------------------------------------------------------

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@[a-zA-Z_][a-zA-Z0-9_]*").unwrap());

struct AnnotationPlugin;

impl LexicalPlugin for AnnotationPlugin {
    fn name(&self) -> &'static str {
        "annotation"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Char('@')
    }

    fn grammar(&self) -> &'static str {
        "@<marker>"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["@deprecated", "@trace"]
    }

    fn can_handle(&self, _candidate: Option<&Token>, rest: &str) -> bool {
        ANNOTATION.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = match_len(&ANNOTATION, scanner.rest()).unwrap_or(1);
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(
            TokenKind::Annotation,
            TokenValue::Str(text[1..].to_string()),
            text,
            span,
        )])
    }
}

// ---------------------------------------------------------------------------
// Dates: 1/27/1978, 12/4/05
// ---------------------------------------------------------------------------

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})($|[^\d/])").unwrap());

struct DatePlugin;

impl LexicalPlugin for DatePlugin {
    fn name(&self) -> &'static str {
        "date"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "M/D/YYYY"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["1/27/1978", "12/4/05"]
    }

    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool {
        // `25 / 4` stays a division: the slashes must touch the digits.
        candidate.map_or(false, |t| t.kind == TokenKind::Number) && DATE.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let caps = DATE.captures(scanner.rest()).expect("probed before parse");
        let len = caps.get(3).unwrap().end();
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let mut year: i32 = caps[3].parse().unwrap_or(0);
        if caps[3].len() <= 2 {
            year += if year < 50 { 2000 } else { 1900 };
        }
        let (text, span) = scanner.take(len);
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(LexError::InvalidDate {
            text: text.to_string(),
            span,
        })?;
        Ok(vec![Token::new(TokenKind::Date, TokenValue::Date(date), text, span)])
    }
}

// ---------------------------------------------------------------------------
// Times: 14:30, 2:30:15pm
// ---------------------------------------------------------------------------

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(am|pm|AM|PM)?").unwrap());

struct TimePlugin;

impl LexicalPlugin for TimePlugin {
    fn name(&self) -> &'static str {
        "time"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "H:MM[:SS][am|pm]"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["14:30", "2:30:15pm"]
    }

    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool {
        candidate.map_or(false, |t| t.kind == TokenKind::Number) && TIME.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let caps = TIME.captures(scanner.rest()).expect("probed before parse");
        let len = caps.get(0).unwrap().end();
        let mut hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps[2].parse().unwrap_or(0);
        let second: u32 = caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        if let Some(meridiem) = caps.get(4) {
            let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
            if pm && hour < 12 {
                hour += 12;
            } else if !pm && hour == 12 {
                hour = 0;
            }
        }
        let (text, span) = scanner.take(len);
        let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or(LexError::InvalidTime {
            text: text.to_string(),
            span,
        })?;
        Ok(vec![Token::new(TokenKind::Time, TokenValue::Time(time), text, span)])
    }
}

// ---------------------------------------------------------------------------
// Phone numbers: 555-123-4567 (lexed as a string literal)
// ---------------------------------------------------------------------------

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}-\d{3}-\d{4}($|[^\d-])").unwrap());

struct PhonePlugin;

impl LexicalPlugin for PhonePlugin {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "NNN-NNN-NNNN"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["555-123-4567"]
    }

    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool {
        candidate.map_or(false, |t| t.kind == TokenKind::Number) && PHONE.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = 12; // NNN-NNN-NNNN
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(TokenKind::Str, TokenValue::Str(text.to_string()), text, span)])
    }
}

// ---------------------------------------------------------------------------
// Version literals: 1.2.3, 10.4.0.12 (lexed as a string literal)
// ---------------------------------------------------------------------------

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+(\.\d+)?").unwrap());

struct VersionPlugin;

impl LexicalPlugin for VersionPlugin {
    fn name(&self) -> &'static str {
        "version"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "major.minor.patch[.build]"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["1.2.3", "10.4.0.12"]
    }

    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool {
        candidate.map_or(false, |t| t.kind == TokenKind::Number) && VERSION.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = match_len(&VERSION, scanner.rest()).expect("probed before parse");
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(TokenKind::Str, TokenValue::Str(text.to_string()), text, span)])
    }
}

// ---------------------------------------------------------------------------
// Bareword e-mail addresses (lexed as a string literal)
// ---------------------------------------------------------------------------

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.+-]*@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+").unwrap());

struct EmailPlugin;

impl LexicalPlugin for EmailPlugin {
    fn name(&self) -> &'static str {
        "email"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "local@domain.tld"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["user02@abc.com"]
    }

    fn can_handle(&self, _candidate: Option<&Token>, rest: &str) -> bool {
        EMAIL.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = match_len(&EMAIL, scanner.rest()).expect("probed before parse");
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(TokenKind::Str, TokenValue::Str(text.to_string()), text, span)])
    }
}

// ---------------------------------------------------------------------------
// Bareword URIs (lexed as a string literal)
// ---------------------------------------------------------------------------

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9+.-]*://[^\s,;)\]}]+").unwrap());

struct UriPlugin;

impl LexicalPlugin for UriPlugin {
    fn name(&self) -> &'static str {
        "uri"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn grammar(&self) -> &'static str {
        "scheme://authority/path"
    }

    fn examples(&self) -> &'static [&'static str] {
        &["http://example.com/a?b=1"]
    }

    fn can_handle(&self, candidate: Option<&Token>, rest: &str) -> bool {
        candidate.map_or(false, |t| t.kind == TokenKind::Identifier) && URI.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = match_len(&URI, scanner.rest()).expect("probed before parse");
        let (text, span) = scanner.take(len);
        Ok(vec![Token::new(TokenKind::Str, TokenValue::Str(text.to_string()), text, span)])
    }
}
