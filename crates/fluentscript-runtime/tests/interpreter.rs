//! End-to-end interpreter tests: source in, value or diagnostic out.

use std::cell::Cell;
use std::rc::Rc;

use chrono::Weekday;
use fluentscript_runtime::external::{GetterFn, SetterFn};
use fluentscript_runtime::{
    EvalError, HostObject, HostType, Interpreter, LimitError, Limits, MemberHandle, RuntimeError,
    ScriptErrorKind, ScriptFail, TypeError, Value,
};

fn run(source: &str) -> Value {
    match Interpreter::new("test").run(source) {
        Ok(value) => value,
        Err(e) => panic!("{}", e),
    }
}

fn run_err(source: &str) -> EvalError {
    match Interpreter::new("test").run(source) {
        Ok(value) => panic!("expected an error, got {:?}", value),
        Err(e) => match e.kind {
            ScriptErrorKind::Eval(e) => e,
            other => panic!("expected an evaluation error, got {:?}", other),
        },
    }
}

#[test]
fn arithmetic_respects_precedence() {
    assert_eq!(run("2 + 3 * 4"), Value::Number(14.0));
    assert_eq!(run("25 / 4"), Value::Number(6.25));
}

#[test]
fn date_literals_survive_to_values() {
    assert_eq!(run("d = 1/27/1978\nd.year"), Value::Number(1978.0));
    assert_eq!(run("d = 1/27/1978\nd.weekday"), Value::Day(Weekday::Fri));
}

#[test]
fn fluent_call_runs_the_declared_function() {
    let source = r#"
        func refill inventory(product, amount) {
            return product + ":" + amount
        }
        refill inventory 'KL-131', 200
    "#;
    assert_eq!(run(source), Value::Str("KL-131:200".to_string()));
}

#[test]
fn wildcard_function_receives_the_capture_triple() {
    let source = r#"
        func create user by*(text, parts, args) {
            return [text, parts, args]
        }
        create user by name email ("u1", "u2")
    "#;
    assert_eq!(
        run(source),
        Value::Array(vec![
            Value::Str("name email".to_string()),
            Value::Array(vec![
                Value::Str("name".to_string()),
                Value::Str("email".to_string()),
            ]),
            Value::Array(vec![Value::Str("u1".to_string()), Value::Str("u2".to_string())]),
        ])
    );
}

#[test]
fn string_concatenation_is_a_declared_pair_not_a_blanket_coercion() {
    assert_eq!(run(r#""count: " + 3"#), Value::Str("count: 3".to_string()));
    assert_eq!(run(r#""done: " + true"#), Value::Str("done: true".to_string()));
    match run_err(r#"3 + "x""#) {
        EvalError::Type(TypeError::InvalidOperands { left, right, .. }) => {
            assert_eq!(left, "number");
            assert_eq!(right, "string");
        }
        other => panic!("expected invalid operands, got {:?}", other),
    }
}

#[test]
fn string_equality_is_exact_but_ordering_folds_case() {
    assert_eq!(run(r#""Apple" == "apple""#), Value::Bool(false));
    assert_eq!(run(r#""Apple" < "apple""#), Value::Bool(false));
    assert_eq!(run(r#""apple" <= "Apple""#), Value::Bool(true));
}

#[test]
fn unit_arithmetic_keeps_the_left_subgroup() {
    match run("5 feet + 12 inches") {
        Value::Unit(unit) => {
            assert_eq!(unit.value, 6.0);
            assert_eq!(unit.base, 72.0);
            assert_eq!(unit.subgroup, "foot");
        }
        other => panic!("expected a unit value, got {:?}", other),
    }
}

#[test]
fn zero_valued_unit_keeps_its_subgroup_scale() {
    match run("0 feet + 12 inches") {
        Value::Unit(unit) => {
            assert_eq!(unit.value, 1.0);
            assert_eq!(unit.base, 12.0);
            assert_eq!(unit.subgroup, "foot");
        }
        other => panic!("expected a unit value, got {:?}", other),
    }
}

#[test]
fn unit_groups_do_not_mix() {
    match run_err("5 feet + 3 pounds") {
        EvalError::Type(TypeError::UnitGroupMismatch { .. }) => {}
        other => panic!("expected a unit group mismatch, got {:?}", other),
    }
}

#[test]
fn conversion_members_surface_the_matrix() {
    assert_eq!(run(r#""yes".to_bool"#), Value::Bool(true));
    assert_eq!(run(r#""nope".to_bool"#), Value::Bool(false));
    assert_eq!(run(r#""42".to_number"#), Value::Number(42.0));
    assert_eq!(run("x = 5\nx.to_bool"), Value::Bool(true));
    assert_eq!(run("t = true\nt.to_number"), Value::Number(1.0));
    assert_eq!(run("x = 5\nx.to_string()"), Value::Str("5".to_string()));
    assert_eq!(run(r#""friday".to_day"#), Value::Day(Weekday::Fri));
}

#[test]
fn failed_conversion_is_a_type_error() {
    match run_err(r#""nope".to_number"#) {
        EvalError::Type(TypeError::InvalidConversion { from, to, .. }) => {
            assert_eq!(from, "string");
            assert_eq!(to, "number");
        }
        other => panic!("expected an invalid conversion, got {:?}", other),
    }
}

#[test]
fn intrinsic_members_are_pure() {
    assert_eq!(run(r#""hello".length"#), Value::Number(5.0));
    assert_eq!(
        run("items = [1, 2, 3]\nreversed = items.reverse()\n[items[0], reversed[0]]"),
        Value::Array(vec![Value::Number(1.0), Value::Number(3.0)])
    );
    assert_eq!(
        run("m = {b: 2, a: 1}\nm.keys"),
        Value::Array(vec![Value::Str("a".to_string()), Value::Str("b".to_string())])
    );
}

#[test]
fn external_function_shadows_the_intrinsic_member() {
    let mut interpreter = Interpreter::new("test");
    interpreter
        .externals_mut()
        .register_fn("string length", |_args| Ok(Value::Number(42.0)));
    assert_eq!(interpreter.run(r#""hi".length()"#).unwrap(), Value::Number(42.0));
}

#[test]
fn external_functions_are_callable_by_name() {
    let mut interpreter = Interpreter::new("test");
    interpreter.externals_mut().register_fn("add", |args| {
        let sum: f64 = args.iter().filter_map(Value::as_number).sum();
        Ok(Value::Number(sum))
    });
    assert_eq!(interpreter.run("add(1, 2, 3)").unwrap(), Value::Number(6.0));
}

#[test]
fn named_arguments_and_defaults() {
    let source = r#"
        func greet(name, punct = "!") {
            return "hi " + name + punct
        }
        greet(name: "ana")
    "#;
    assert_eq!(run(source), Value::Str("hi ana!".to_string()));
}

#[test]
fn parameter_aliases_bind_named_arguments() {
    let source = r#"
        func ship(qty as quantity) { return qty }
        ship(quantity: 3)
    "#;
    assert_eq!(run(source), Value::Number(3.0));
}

#[test]
fn constants_cannot_be_reassigned() {
    match run_err("const x = 1\nx = 2") {
        EvalError::Runtime(RuntimeError::ConstantReassigned { name, .. }) => {
            assert_eq!(name, "x");
        }
        other => panic!("expected a constant reassignment error, got {:?}", other),
    }
}

#[test]
fn fail_statement_aborts_with_its_message() {
    match run_err(r#"fail "out of stock""#) {
        EvalError::Fail(ScriptFail { message, .. }) => assert_eq!(message, "out of stock"),
        other => panic!("expected a script failure, got {:?}", other),
    }
}

#[test]
fn call_depth_limit_stops_runaway_recursion() {
    let limits = Limits { max_call_depth: 8, ..Limits::default() };
    let mut interpreter = Interpreter::with_limits("test", limits);
    let source = r#"
        func f(n) { return f(n + 1) }
        f(0)
    "#;
    match interpreter.run(source).unwrap_err().kind {
        ScriptErrorKind::Eval(EvalError::Limit(LimitError::CallDepth { limit, .. })) => {
            assert_eq!(limit, 8);
        }
        other => panic!("expected a call depth error, got {:?}", other),
    }
}

#[test]
fn string_length_limit_applies_to_concatenation() {
    let limits = Limits { max_string_len: 8, ..Limits::default() };
    let mut interpreter = Interpreter::with_limits("test", limits);
    match interpreter.run(r#""aaaaa" + "bbbbb""#).unwrap_err().kind {
        ScriptErrorKind::Eval(EvalError::Limit(LimitError::StringLength { limit, .. })) => {
            assert_eq!(limit, 8);
        }
        other => panic!("expected a string length error, got {:?}", other),
    }
}

#[test]
fn loops_honor_break_and_continue() {
    let source = r#"
        total = 0
        for i in [1, 2, 3, 4] {
            if i == 3 { continue }
            if i == 4 { break }
            total = total + i
        }
        total
    "#;
    assert_eq!(run(source), Value::Number(3.0));

    let source = r#"
        n = 0
        while n < 5 { n = n + 1 }
        n
    "#;
    assert_eq!(run(source), Value::Number(5.0));
}

#[test]
fn break_outside_a_loop_is_an_error() {
    match run_err("break") {
        EvalError::Runtime(RuntimeError::LoopFlowOutsideLoop { keyword, .. }) => {
            assert_eq!(keyword, "break");
        }
        other => panic!("expected a loop flow error, got {:?}", other),
    }
}

#[test]
fn modules_expose_their_bindings_as_a_namespace() {
    let source = r#"
        module geometry {
            pi = 3
            func area(r) { return r * r * pi }
        }
        [geometry.pi, geometry.area(2)]
    "#;
    assert_eq!(
        run(source),
        Value::Array(vec![Value::Number(3.0), Value::Number(12.0)])
    );
}

#[test]
fn closures_capture_a_snapshot_at_definition() {
    let source = r#"
        x = 1
        func get() { return x }
        x = 2
        get()
    "#;
    assert_eq!(run(source), Value::Number(1.0));
}

#[test]
fn direct_recursion_works() {
    let source = r#"
        func fact(n) {
            if n <= 1 { return 1 }
            return n * fact(n - 1)
        }
        fact(5)
    "#;
    assert_eq!(run(source), Value::Number(120.0));
}

#[test]
fn scripted_expr_plugin_runs_its_callback() {
    let source = r#"
        plugin "double it" {
            type: "expr",
            start_tokens: "double",
            grammar_parse: "double {expr}",
            parse: func(x) { return x * 2 }
        }
        double 21
    "#;
    assert_eq!(run(source), Value::Number(42.0));
}

#[test]
fn index_assignment_and_missing_map_keys() {
    assert_eq!(run("items = [1, 2, 3]\nitems[0] = 9\nitems[0]"), Value::Number(9.0));
    assert_eq!(run("m = {a: 1}\nm.b = 2\nm.b"), Value::Number(2.0));
    assert_eq!(run(r#"m = {a: 1}
m["zzz"]"#), Value::Null);
}

#[derive(Debug)]
struct Account {
    balance: Cell<f64>,
}

impl HostObject for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn get_member(self: Rc<Self>, name: &str) -> Option<MemberHandle> {
        match name {
            "balance" => {
                let get: GetterFn = {
                    let this = Rc::clone(&self);
                    Rc::new(move || Ok(Value::Number(this.balance.get())))
                };
                let set: SetterFn = {
                    let this = Rc::clone(&self);
                    Rc::new(move |value: Value| match value {
                        Value::Number(n) => {
                            this.balance.set(n);
                            Ok(())
                        }
                        other => Err(format!("expected a number, got {}", other.kind())),
                    })
                };
                Some(MemberHandle::property("Account", get, Some(set)))
            }
            "deposit" => {
                let this = Rc::clone(&self);
                Some(MemberHandle::method(
                    "Account",
                    Rc::new(move |args: &[Value]| {
                        let amount =
                            args.first().and_then(Value::as_number).ok_or("deposit needs a number")?;
                        this.balance.set(this.balance.get() + amount);
                        Ok(Value::Number(this.balance.get()))
                    }),
                ))
            }
            _ => None,
        }
    }

    fn member_names(&self) -> Vec<String> {
        vec!["balance".to_string(), "deposit".to_string()]
    }
}

fn account_interpreter() -> Interpreter {
    let mut interpreter = Interpreter::new("test");
    interpreter.externals_mut().register_fn("open account", |_args| {
        Ok(Value::Host(Rc::new(Account { balance: Cell::new(100.0) })))
    });
    interpreter
}

#[test]
fn host_object_members_read_write_and_invoke() {
    let source = r#"
        acct = open account()
        acct.deposit(25)
        acct.balance
    "#;
    assert_eq!(account_interpreter().run(source).unwrap(), Value::Number(125.0));

    let source = r#"
        acct = open account()
        acct.balance = 10
        acct.balance
    "#;
    assert_eq!(account_interpreter().run(source).unwrap(), Value::Number(10.0));
}

#[test]
fn host_member_lookup_retries_case_insensitively() {
    let source = r#"
        acct = open account()
        acct.Balance
    "#;
    assert_eq!(account_interpreter().run(source).unwrap(), Value::Number(100.0));
}

#[test]
fn host_member_writes_resolve_like_reads() {
    let source = r#"
        acct = open account()
        acct.Balance = 10
        acct.balance
    "#;
    assert_eq!(account_interpreter().run(source).unwrap(), Value::Number(10.0));
}

#[test]
fn host_setter_rejections_surface_as_external_errors() {
    let source = r#"
        acct = open account()
        acct.balance = "lots"
    "#;
    match account_interpreter().run(source).unwrap_err().kind {
        ScriptErrorKind::Eval(EvalError::Runtime(RuntimeError::External { message, .. })) => {
            assert!(message.contains("expected a number"), "got message {:?}", message);
        }
        other => panic!("expected an external error, got {:?}", other),
    }
}

struct MathType;

impl HostType for MathType {
    fn name(&self) -> &str {
        "Math"
    }

    fn static_member(&self, name: &str) -> Option<MemberHandle> {
        match name {
            "pi" => {
                let get: GetterFn = Rc::new(|| Ok(Value::Number(3.14159)));
                Some(MemberHandle::property("Math", get, None))
            }
            "max" => Some(MemberHandle::static_method(
                "Math",
                Rc::new(|args: &[Value]| {
                    args.iter()
                        .filter_map(Value::as_number)
                        .fold(None, |best: Option<f64>, n| Some(best.map_or(n, |b| b.max(n))))
                        .map(Value::Number)
                        .ok_or_else(|| "max needs at least one number".to_string())
                }),
            )),
            _ => None,
        }
    }
}

fn math_interpreter() -> Interpreter {
    let mut interpreter = Interpreter::new("test");
    interpreter.externals_mut().register_type(Rc::new(MathType));
    interpreter
}

#[test]
fn host_type_static_members_resolve_by_type_name() {
    assert_eq!(math_interpreter().run("Math.pi").unwrap(), Value::Number(3.14159));
    assert_eq!(math_interpreter().run("Math.max(2, 7, 4)").unwrap(), Value::Number(7.0));
}

#[test]
fn static_lookup_falls_back_to_the_capitalized_type_name() {
    assert_eq!(math_interpreter().run("math.pi").unwrap(), Value::Number(3.14159));
}

#[test]
fn scope_bindings_shadow_host_type_names() {
    let source = r#"
        Math = {pi: 9}
        Math.pi
    "#;
    assert_eq!(math_interpreter().run(source).unwrap(), Value::Number(9.0));
}
