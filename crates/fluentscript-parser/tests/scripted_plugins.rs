//! Tests for the `plugin` meta-construct: grammar and token plugins
//! declared by the script itself, live for the rest of the parse.

use fluentscript_parser::ast::*;
use fluentscript_parser::{Parser, SyntaxError};

fn parse(source: &str) -> Script {
    match Parser::new(source).parse() {
        Ok(script) => script,
        Err(e) => panic!("parse error: {}", e),
    }
}

#[test]
fn expr_plugin_rewrites_to_an_extension_call() {
    let script = parse(
        r#"
        plugin "double it" {
            type: "expr",
            start_tokens: "double",
            grammar_parse: "double {expr}",
            parse: func(x) { return x * 2 }
        }
        value = double 21
        "#,
    );

    match &script.statements[0] {
        Statement::Plugin(decl) => {
            assert_eq!(decl.desc, "double it");
            assert_eq!(decl.kind, ScriptedPluginKind::Expr);
            assert_eq!(decl.start_tokens, vec!["double"]);
            assert_eq!(decl.callback.name, "__plugin0");
        }
        other => panic!("expected a plugin declaration, got {:?}", other),
    }

    match &script.statements[1] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Extension(ext) => {
                assert_eq!(ext.name, "__plugin0");
                assert_eq!(ext.args.len(), 1);
                match &ext.args[0] {
                    Expression::NumberLiteral(n) => assert_eq!(n.value, 21.0),
                    other => panic!("expected a number argument, got {:?}", other),
                }
            }
            other => panic!("expected an extension expression, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn multi_word_pattern_declines_on_a_missing_second_word() {
    // "double up" is claimed by the plugin; a bare "double" is still an
    // ordinary identifier, so assigning to it keeps working.
    let script = parse(
        r#"
        plugin "double up" {
            type: "expr",
            start_tokens: "double",
            grammar_parse: "double up {expr}",
            parse: func(x) { return x * 2 }
        }
        double = 4
        y = double up 3
        "#,
    );

    match &script.statements[1] {
        Statement::Assign(assign) => {
            assert!(matches!(assign.target, Expression::Identifier(_)));
            assert!(matches!(assign.value, Expression::NumberLiteral(_)));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
    match &script.statements[2] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Extension(ext) => assert_eq!(ext.args.len(), 1),
            other => panic!("expected an extension expression, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn token_plugin_affects_later_tokens_in_the_same_parse() {
    let script = parse(
        r#"
        plugin "sku literals" {
            type: "token",
            grammar_parse: "[A-Z]+-[0-9]+",
            parse: func(s) { return s }
        }
        x = KL-131
        "#,
    );

    match &script.statements[0] {
        Statement::Plugin(decl) => assert_eq!(decl.kind, ScriptedPluginKind::Token),
        other => panic!("expected a plugin declaration, got {:?}", other),
    }
    match &script.statements[1] {
        Statement::Assign(assign) => match &assign.value {
            Expression::StringLiteral(s) => assert_eq!(s.value, "KL-131"),
            other => panic!("expected a string literal, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn plugin_serials_increment_per_declaration() {
    let script = parse(
        r#"
        plugin "first" {
            type: "expr",
            start_tokens: "twice",
            grammar_parse: "twice {expr}",
            parse: func(x) { return x * 2 }
        }
        plugin "second" {
            type: "expr",
            start_tokens: "thrice",
            grammar_parse: "thrice {expr}",
            parse: func(x) { return x * 3 }
        }
        a = twice 1
        b = thrice 1
        "#,
    );

    let names: Vec<&str> = script
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Plugin(decl) => Some(decl.callback.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["__plugin0", "__plugin1"]);

    match &script.statements[3] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Extension(ext) => assert_eq!(ext.name, "__plugin1"),
            other => panic!("expected an extension expression, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn plugin_without_a_type_is_rejected() {
    let source = r#"
        plugin "broken" {
            parse: func() { return 1 }
        }
    "#;
    match Parser::new(source).parse() {
        Err(SyntaxError::Invalid { message, .. }) => {
            assert!(message.contains("missing 'type'"), "got message {:?}", message);
        }
        other => panic!("expected an invalid plugin error, got {:?}", other),
    }
}

#[test]
fn token_plugin_with_a_bad_regex_is_rejected() {
    let source = r#"
        plugin "broken" {
            type: "token",
            grammar_parse: "[unclosed",
            parse: func(s) { return s }
        }
    "#;
    match Parser::new(source).parse() {
        Err(SyntaxError::Invalid { message, .. }) => {
            assert!(message.contains("token plugin pattern"), "got message {:?}", message);
        }
        other => panic!("expected an invalid pattern error, got {:?}", other),
    }
}
