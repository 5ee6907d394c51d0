//! The value conversion matrix.
//!
//! Conversions are explicit and total over the declared matrix: `convert`
//! returns `None` when no conversion exists (or when a parse-style
//! conversion fails on the given payload), and the caller decides whether
//! that is an error. Operators never call into this module; arithmetic and
//! comparison stay coercion-free.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::value::{format_number, Value, ValueKind};

/// Tokens accepted as a truthy string. Anything else converts to `false`.
const TRUE_TOKENS: &[&str] = &["yes", "true", "1", "ok", "on"];

/// A host-registered conversion entry.
type ConvertFn = fn(&Value) -> Option<Value>;

pub struct ConversionTable {
    custom: Vec<(ValueKind, ValueKind, ConvertFn)>,
}

impl ConversionTable {
    pub fn standard() -> Self {
        Self { custom: Vec::new() }
    }

    /// Register a host conversion. Custom entries are consulted before the
    /// builtin matrix, so a host can override a builtin pair.
    pub fn register(&mut self, from: ValueKind, to: ValueKind, convert: ConvertFn) {
        self.custom.push((from, to, convert));
    }

    /// Convert `value` to `target`. `None` means the matrix has no entry for
    /// this pair, or the payload does not parse.
    pub fn convert(&self, value: &Value, target: ValueKind) -> Option<Value> {
        if value.kind() == target {
            return Some(value.clone());
        }
        for (from, to, convert) in &self.custom {
            if *from == value.kind() && *to == target {
                return convert(value);
            }
        }
        builtin_convert(value, target)
    }

    /// Truthiness is conversion to Bool; values with no Bool conversion are
    /// falsy, except containers, which are truthy when non-empty.
    pub fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Function(_) | Value::Host(_) => true,
            _ => match self.convert(value, ValueKind::Bool) {
                Some(Value::Bool(b)) => b,
                _ => false,
            },
        }
    }
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn builtin_convert(value: &Value, target: ValueKind) -> Option<Value> {
    match (value, target) {
        // Everything scalar has a string rendering.
        (Value::Number(n), ValueKind::Str) => Some(Value::Str(format_number(*n))),
        (
            Value::Bool(_) | Value::Date(_) | Value::Time(_) | Value::Day(_) | Value::Unit(_),
            ValueKind::Str,
        ) => Some(Value::Str(value.to_string())),

        (Value::Bool(b), ValueKind::Number) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),
        (Value::Number(n), ValueKind::Bool) => Some(Value::Bool(*n > 0.0)),

        (Value::Str(s), ValueKind::Bool) => {
            let lowered = s.trim().to_lowercase();
            Some(Value::Bool(TRUE_TOKENS.contains(&lowered.as_str())))
        }
        (Value::Str(s), ValueKind::Number) => s.trim().parse::<f64>().ok().map(Value::Number),
        (Value::Str(s), ValueKind::Date) => parse_date(s.trim()).map(Value::Date),
        (Value::Str(s), ValueKind::Time) => parse_time(s.trim()).map(Value::Time),
        (Value::Str(s), ValueKind::Day) => parse_day(s.trim()).map(Value::Day),

        // A date carries a time of day; extracting it is lossless.
        (Value::Date(d), ValueKind::Time) => Some(Value::Time(d.time())),
        // A bare time becomes today at that time.
        (Value::Time(t), ValueKind::Date) => {
            Some(Value::Date(NaiveDateTime::new(Local::now().date_naive(), *t)))
        }
        (Value::Date(d), ValueKind::Day) => Some(Value::Day(chrono::Datelike::weekday(d))),

        // A unit collapses to its base quantity.
        (Value::Unit(u), ValueKind::Number) => Some(Value::Number(u.base)),

        (Value::Day(d), ValueKind::Number) => Some(Value::Number(Value::day_ordinal(*d))),
        (Value::Number(n), ValueKind::Day) => day_from_ordinal(*n).map(Value::Day),

        _ => None,
    }
}

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    for format in ["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    for format in ["%H:%M:%S", "%H:%M", "%I:%M%p", "%I:%M %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(text, format) {
            return Some(time);
        }
    }
    None
}

fn parse_day(text: &str) -> Option<Weekday> {
    match text.to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn day_from_ordinal(n: f64) -> Option<Weekday> {
    match n as i64 {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_bool_round_trip_from_bool() {
        let table = ConversionTable::standard();
        for b in [true, false] {
            let number = table.convert(&Value::Bool(b), ValueKind::Number).unwrap();
            let back = table.convert(&number, ValueKind::Bool).unwrap();
            assert_eq!(back, Value::Bool(b));
        }
    }

    #[test]
    fn string_bool_accepts_the_token_set_only() {
        let table = ConversionTable::standard();
        for token in ["yes", "true", "1", "ok", "on", "YES", " On "] {
            assert_eq!(
                table.convert(&Value::Str(token.into()), ValueKind::Bool),
                Some(Value::Bool(true)),
                "token {:?}",
                token
            );
        }
        assert_eq!(
            table.convert(&Value::Str("nope".into()), ValueKind::Bool),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn unparseable_string_number_is_none() {
        let table = ConversionTable::standard();
        assert_eq!(table.convert(&Value::Str("abc".into()), ValueKind::Number), None);
        assert_eq!(
            table.convert(&Value::Str(" 42.5 ".into()), ValueKind::Number),
            Some(Value::Number(42.5))
        );
    }

    #[test]
    fn date_time_extraction() {
        let table = ConversionTable::standard();
        let date = NaiveDate::from_ymd_opt(1978, 1, 27)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let time = table.convert(&Value::Date(date), ValueKind::Time).unwrap();
        assert_eq!(time, Value::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
    }

    #[test]
    fn custom_entry_overrides_builtin() {
        let mut table = ConversionTable::standard();
        table.register(ValueKind::Number, ValueKind::Bool, |_| Some(Value::Bool(true)));
        assert_eq!(
            table.convert(&Value::Number(-5.0), ValueKind::Bool),
            Some(Value::Bool(true))
        );
    }
}
