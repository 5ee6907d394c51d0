//! Parser tests: fluent call resolution, the default grammar, argument
//! rules, and suffix plugins.

use fluentscript_parser::ast::*;
use fluentscript_parser::{ParseContext, Parser, SyntaxError};

fn parse(source: &str) -> Script {
    match Parser::new(source).parse() {
        Ok(script) => script,
        Err(e) => panic!("parse error: {}", e),
    }
}

fn expression(statement: &Statement) -> &Expression {
    match statement {
        Statement::Expression(stmt) => &stmt.expression,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

#[test]
fn fluent_call_without_parentheses() {
    let script = parse(
        r#"
        func refill inventory(product, amount) {
            return amount
        }
        refill inventory 'KL-131', 200
        "#,
    );
    assert_eq!(script.statements.len(), 2);
    match expression(&script.statements[1]) {
        Expression::Call(call) => {
            assert_eq!(call.name, "refill inventory");
            assert!(call.target.is_none());
            assert!(call.wildcard.is_none());
            assert_eq!(call.args.len(), 2);
            match &call.args[0].value {
                Expression::StringLiteral(s) => assert_eq!(s.value, "KL-131"),
                other => panic!("expected a string argument, got {:?}", other),
            }
            match &call.args[1].value {
                Expression::NumberLiteral(n) => assert_eq!(n.value, 200.0),
                other => panic!("expected a number argument, got {:?}", other),
            }
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn longest_fluent_name_wins() {
    let script = parse(
        r#"
        func refill(x) { return x }
        func refill inventory(x) { return x }
        refill inventory 5
        "#,
    );
    match expression(&script.statements[2]) {
        Expression::Call(call) => assert_eq!(call.name, "refill inventory"),
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn underscored_call_resolves_spaced_declaration_and_back() {
    let script = parse(
        r#"
        func send_alert(msg) { return msg }
        send alert "disk full"
        "#,
    );
    match expression(&script.statements[1]) {
        Expression::Call(call) => {
            assert_eq!(call.name, "send_alert");
            assert_eq!(call.args.len(), 1);
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn wildcard_function_captures_trailing_words() {
    let script = parse(
        r#"
        func create user by*(text, parts, args) {
            return parts
        }
        create user by name email ("user02", "user02abc")
        "#,
    );
    match expression(&script.statements[1]) {
        Expression::Call(call) => {
            assert_eq!(call.name, "create user by");
            let capture = call.wildcard.as_ref().expect("wildcard capture");
            assert_eq!(capture.parts, vec!["name", "email"]);
            assert_eq!(capture.text, "name email");
            assert_eq!(call.args.len(), 2);
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn named_arguments_parse_with_names() {
    let script = parse(
        r#"
        func refill inventory(product, amount) { return amount }
        refill inventory (product: 'KL-131', amount: 200)
        "#,
    );
    match expression(&script.statements[1]) {
        Expression::Call(call) => {
            assert_eq!(call.args[0].name.as_deref(), Some("product"));
            assert_eq!(call.args[1].name.as_deref(), Some("amount"));
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn positional_after_named_is_rejected() {
    match Parser::new("f(a: 1, 2)").parse() {
        Err(SyntaxError::PositionalAfterNamed { .. }) => {}
        other => panic!("expected a positional-after-named error, got {:?}", other),
    }
}

#[test]
fn parameter_aliases_types_and_defaults() {
    let script = parse("func ship(qty as quantity: number = 1) { return qty }");
    match &script.statements[0] {
        Statement::Func(decl) => {
            let param = &decl.params[0];
            assert_eq!(param.name, "qty");
            assert_eq!(param.alias.as_deref(), Some("quantity"));
            assert_eq!(param.type_name.as_deref(), Some("number"));
            assert!(!param.required());
        }
        other => panic!("expected a function declaration, got {:?}", other),
    }
}

#[test]
fn unit_suffix_parses_when_unit_is_registered() {
    let mut ctx = ParseContext::default();
    ctx.unit_names.insert("inches".to_string());
    let script = match Parser::with_context("x = 5 inches", ctx).parse() {
        Ok(script) => script,
        Err(e) => panic!("parse error: {}", e),
    };
    match &script.statements[0] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Unit(unit) => assert_eq!(unit.unit, "inches"),
            other => panic!("expected a unit expression, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn percent_suffix_vs_modulo() {
    let script = parse("x = 40%");
    match &script.statements[0] {
        Statement::Assign(assign) => {
            assert!(matches!(assign.value, Expression::Percent(_)));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }

    let script = parse("x = 40 % 7");
    match &script.statements[0] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Binary(binary) => assert_eq!(binary.op, BinaryOp::Mod),
            other => panic!("expected a modulo, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn member_and_index_assignment_targets() {
    let script = parse("user.name = 'ana'; items[0] = 2");
    match &script.statements[0] {
        Statement::Assign(assign) => assert!(matches!(assign.target, Expression::Member(_))),
        other => panic!("expected an assignment, got {:?}", other),
    }
    match &script.statements[1] {
        Statement::Assign(assign) => assert!(matches!(assign.target, Expression::Index(_))),
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn date_and_time_literals_reach_the_ast() {
    let script = parse("d = 1/27/1978; t = 14:30");
    match &script.statements[0] {
        Statement::Assign(assign) => assert!(matches!(assign.value, Expression::DateLiteral(_))),
        other => panic!("expected an assignment, got {:?}", other),
    }
    match &script.statements[1] {
        Statement::Assign(assign) => assert!(matches!(assign.value, Expression::TimeLiteral(_))),
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn spaced_slashes_parse_as_division() {
    let script = parse("x = 25 / 4");
    match &script.statements[0] {
        Statement::Assign(assign) => match &assign.value {
            Expression::Binary(binary) => assert_eq!(binary.op, BinaryOp::Div),
            other => panic!("expected a division, got {:?}", other),
        },
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn else_if_chains_nest() {
    let script = parse(
        r#"
        if a > 1 {
            b = 1
        } else if a > 0 {
            b = 2
        } else {
            b = 3
        }
        "#,
    );
    match &script.statements[0] {
        Statement::If(outer) => {
            let else_block = outer.else_block.as_ref().expect("else block");
            assert!(matches!(else_block.statements[0], Statement::If(_)));
        }
        other => panic!("expected an if statement, got {:?}", other),
    }
}

#[test]
fn unknown_bare_statement_is_an_expression() {
    let script = parse("count + 1");
    assert!(matches!(
        expression(&script.statements[0]),
        Expression::Binary(_)
    ));
}

#[test]
fn deep_nesting_hits_the_depth_guard() {
    let source = format!("x = {}1{}", "(".repeat(100), ")".repeat(100));
    match Parser::new(&source).parse() {
        Err(SyntaxError::LimitExceeded { .. }) => {}
        other => panic!("expected a depth limit error, got {:?}", other),
    }
}
