//! Lexer and lexical-plugin dispatch tests.

use chrono::{NaiveDate, NaiveTime};
use fluentscript_parser::{LexError, Lexer, Sym, Token, TokenKind, TokenValue};

fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = match lexer.next_token() {
            Ok(token) => token,
            Err(e) => panic!("lex error in {:?}: {}", source, e),
        };
        if token.is_eof() {
            break;
        }
        tokens.push(token);
    }
    tokens
}

#[test]
fn date_literal_wins_over_division() {
    let tokens = lex("1/27/1978");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Date);
    match &tokens[0].value {
        TokenValue::Date(d) => {
            assert_eq!(*d, NaiveDate::from_ymd_opt(1978, 1, 27).unwrap());
        }
        other => panic!("expected a date payload, got {:?}", other),
    }
}

#[test]
fn spaced_slashes_stay_division() {
    let tokens = lex("25 / 4");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert!(tokens[1].is_symbol(Sym::Slash));
    assert_eq!(tokens[2].kind, TokenKind::Number);
}

#[test]
fn two_digit_years_are_windowed() {
    match &lex("12/4/05")[0].value {
        TokenValue::Date(d) => assert_eq!(*d, NaiveDate::from_ymd_opt(2005, 12, 4).unwrap()),
        other => panic!("expected a date payload, got {:?}", other),
    }
    match &lex("12/4/75")[0].value {
        TokenValue::Date(d) => assert_eq!(*d, NaiveDate::from_ymd_opt(1975, 12, 4).unwrap()),
        other => panic!("expected a date payload, got {:?}", other),
    }
}

#[test]
fn time_with_meridiem() {
    let tokens = lex("2:30:15pm");
    assert_eq!(tokens.len(), 1);
    match &tokens[0].value {
        TokenValue::Time(t) => {
            assert_eq!(*t, NaiveTime::from_hms_opt(14, 30, 15).unwrap());
        }
        other => panic!("expected a time payload, got {:?}", other),
    }
}

#[test]
fn twenty_four_hour_time() {
    match &lex("14:30")[0].value {
        TokenValue::Time(t) => assert_eq!(*t, NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
        other => panic!("expected a time payload, got {:?}", other),
    }
}

#[test]
fn phone_numbers_lex_as_strings() {
    let tokens = lex("555-123-4567");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "555-123-4567");
}

#[test]
fn version_literals_lex_as_strings() {
    let tokens = lex("1.2.3");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "1.2.3");
}

#[test]
fn plain_decimal_stays_a_number() {
    let tokens = lex("3.14");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].number(), Some(3.14));
}

#[test]
fn bareword_email_and_uri_lex_as_strings() {
    let tokens = lex("user02@abc.com");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "user02@abc.com");

    let tokens = lex("http://example.com/a?b=1");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "http://example.com/a?b=1");
}

#[test]
fn comments_and_annotations_become_tokens() {
    let tokens = lex("# threshold note\n@trace x");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].kind, TokenKind::Comment);
    assert_eq!(tokens[1].kind, TokenKind::Annotation);
    assert_eq!(tokens[1].text, "@trace");
    assert!(tokens[2].is_word("x"));
}

#[test]
fn both_quote_styles_and_escapes() {
    let tokens = lex(r#""a\nb" 'c'"#);
    assert_eq!(tokens.len(), 2);
    match &tokens[0].value {
        TokenValue::Str(s) => assert_eq!(s, "a\nb"),
        other => panic!("expected a string payload, got {:?}", other),
    }
    match &tokens[1].value {
        TokenValue::Str(s) => assert_eq!(s, "c"),
        other => panic!("expected a string payload, got {:?}", other),
    }
}

#[test]
fn unterminated_string_is_an_error() {
    let mut lexer = Lexer::new("\"abc");
    match lexer.next_token() {
        Err(LexError::UnterminatedString { .. }) => {}
        other => panic!("expected an unterminated string error, got {:?}", other),
    }
}

#[test]
fn spans_track_lines_and_columns() {
    let tokens = lex("a\n  b");
    assert_eq!(tokens[0].span.line, 1);
    assert_eq!(tokens[0].span.column, 1);
    assert_eq!(tokens[1].span.line, 2);
    assert_eq!(tokens[1].span.column, 3);
}
