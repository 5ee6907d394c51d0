//! The tree-walking evaluator.
//!
//! An [`Interpreter`] owns everything a script touches at runtime: the scope
//! stack, the external registry, the units and conversion tables, and the
//! resource limits. `run` parses with a context seeded from those tables
//! (external function names, unit spellings) and evaluates the script,
//! returning the value of its last expression statement.

use std::rc::Rc;

use fluentscript_parser::ast::{
    AssignStatement, Block, CallExpr, Expression, FunctionDecl, LogicalOp, Script, Statement,
};
use fluentscript_parser::{ParseContext, Parser, Span};

use crate::call::{resolve_arguments, ArgValue, BindError, ParamMetadata};
use crate::convert::ConversionTable;
use crate::error::{
    EvalError, LimitError, RuntimeError, ScriptError, ScriptFail, TypeError,
};
use crate::external::{ExternalFunction, ExternalRegistry, MemberKind};
use crate::limits::Limits;
use crate::member::{resolve_member, resolve_static_member, MemberBinding, ResolvedMember};
use crate::ops::{self, OpError};
use crate::scope::{AssignOutcome, ScopeStack, Symbol};
use crate::units::UnitsTable;
use crate::value::{ScriptFunction, UnitValue, Value, ValueKind};

/// Control flow signal threaded out of statement evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Break(Span),
    Continue(Span),
    Return(Value),
}

/// One lvalue step below the root identifier.
enum PathSeg {
    Member(String, Span),
    Index(Value, Span),
}

pub struct Interpreter {
    script_name: String,
    scopes: ScopeStack,
    limits: Limits,
    externals: ExternalRegistry,
    units: UnitsTable,
    conversions: ConversionTable,
    call_depth: usize,
}

impl Interpreter {
    pub fn new(script_name: impl Into<String>) -> Self {
        Self::with_limits(script_name, Limits::default())
    }

    pub fn with_limits(script_name: impl Into<String>, limits: Limits) -> Self {
        Self {
            script_name: script_name.into(),
            scopes: ScopeStack::new(),
            limits,
            externals: ExternalRegistry::new(),
            units: UnitsTable::standard(),
            conversions: ConversionTable::standard(),
            call_depth: 0,
        }
    }

    pub fn externals_mut(&mut self) -> &mut ExternalRegistry {
        &mut self.externals
    }

    pub fn conversions_mut(&mut self) -> &mut ConversionTable {
        &mut self.conversions
    }

    pub fn units(&self) -> &UnitsTable {
        &self.units
    }

    /// Parse with the context this interpreter's tables imply.
    pub fn parse(&self, source: &str) -> Result<Script, ScriptError> {
        let mut ctx = ParseContext::default();
        for name in self.externals.function_names() {
            ctx.external_functions.insert(name.to_string());
        }
        ctx.unit_names = self.units.names();
        Parser::with_context(source, ctx)
            .parse()
            .map_err(|e| ScriptError::new(self.script_name.clone(), e))
    }

    /// Parse and evaluate a script. The result is the value of the last
    /// expression statement, or `null`.
    pub fn run(&mut self, source: &str) -> Result<Value, ScriptError> {
        let script = self.parse(source)?;
        let name = self.script_name.clone();
        self.eval_script(&script).map_err(|e| ScriptError::new(name, e))
    }

    pub fn eval_script(&mut self, script: &Script) -> Result<Value, EvalError> {
        match self.eval_statements(&script.statements)? {
            Flow::Normal(value) | Flow::Return(value) => Ok(value),
            Flow::Break(span) => {
                Err(RuntimeError::LoopFlowOutsideLoop { keyword: "break", span }.into())
            }
            Flow::Continue(span) => {
                Err(RuntimeError::LoopFlowOutsideLoop { keyword: "continue", span }.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn eval_statements(&mut self, statements: &[Statement]) -> Result<Flow, EvalError> {
        let mut last = Value::Null;
        for statement in statements {
            match self.eval_stmt(statement)? {
                Flow::Normal(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn eval_block(&mut self, block: &Block) -> Result<Flow, EvalError> {
        self.push_scope(block.span)?;
        let result = self.eval_statements(&block.statements);
        self.scopes.pop();
        result
    }

    fn eval_stmt(&mut self, statement: &Statement) -> Result<Flow, EvalError> {
        match statement {
            Statement::Expression(stmt) => {
                let value = self.eval_expr(&stmt.expression)?;
                Ok(Flow::Normal(value))
            }

            Statement::Assign(stmt) => {
                self.eval_assign(stmt)?;
                Ok(Flow::Normal(Value::Null))
            }

            Statement::If(stmt) => {
                let condition = self.eval_expr(&stmt.condition)?;
                if self.conversions.truthy(&condition) {
                    self.eval_block(&stmt.then_block)
                } else if let Some(else_block) = &stmt.else_block {
                    self.eval_block(else_block)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }

            Statement::While(stmt) => {
                loop {
                    let condition = self.eval_expr(&stmt.condition)?;
                    if !self.conversions.truthy(&condition) {
                        break;
                    }
                    match self.eval_block(&stmt.body)? {
                        Flow::Break(_) => break,
                        Flow::Continue(_) | Flow::Normal(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }

            Statement::For(stmt) => {
                let iterable = self.eval_expr(&stmt.iterable)?;
                let items = self.iterate(&iterable, *stmt.iterable.span())?;
                for item in items {
                    self.push_scope(stmt.span)?;
                    self.scopes.declare(stmt.variable.clone(), Symbol::Variable(item));
                    let flow = self.eval_statements(&stmt.body.statements);
                    self.scopes.pop();
                    match flow? {
                        Flow::Break(_) => break,
                        Flow::Continue(_) | Flow::Normal(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }

            Statement::Func(decl) => {
                self.define_function(decl);
                Ok(Flow::Normal(Value::Null))
            }

            Statement::Const(stmt) => {
                let value = self.eval_expr(&stmt.value)?;
                self.scopes.declare(stmt.name.clone(), Symbol::Constant(value));
                Ok(Flow::Normal(Value::Null))
            }

            Statement::Module(stmt) => {
                self.push_scope(stmt.span)?;
                let result = self.eval_statements(&stmt.body.statements);
                let members = self.scopes.pop_captured();
                result?;
                self.scopes.declare(stmt.name.clone(), Symbol::Module(members));
                Ok(Flow::Normal(Value::Null))
            }

            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            Statement::Break(span) => Ok(Flow::Break(*span)),
            Statement::Continue(span) => Ok(Flow::Continue(*span)),

            Statement::Fail(stmt) => {
                let message = match &stmt.message {
                    Some(expr) => self.eval_expr(expr)?.to_string(),
                    None => "script failed".to_string(),
                };
                Err(ScriptFail { message, span: stmt.span }.into())
            }

            // Grammar registration happened at parse time; at runtime only
            // the callback needs defining.
            Statement::Plugin(decl) => {
                self.define_function(&decl.callback);
                Ok(Flow::Normal(Value::Null))
            }
        }
    }

    fn define_function(&mut self, decl: &Rc<FunctionDecl>) {
        let captured = self.scopes.capture();
        let func = Rc::new(ScriptFunction { decl: Rc::clone(decl), captured });
        self.scopes.declare(decl.name.clone(), Symbol::Variable(Value::Function(func)));
    }

    fn iterate(&self, value: &Value, span: Span) -> Result<Vec<Value>, EvalError> {
        match value {
            Value::Array(items) => Ok(items.clone()),
            Value::Map(entries) => {
                let mut keys: Vec<String> = entries.keys().cloned().collect();
                keys.sort();
                Ok(keys.into_iter().map(Value::Str).collect())
            }
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            other => Err(RuntimeError::NotIterable { kind: other.kind().name(), span }.into()),
        }
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn eval_assign(&mut self, stmt: &AssignStatement) -> Result<(), EvalError> {
        let value = self.eval_expr(&stmt.value)?;
        match &stmt.target {
            Expression::Identifier(ident) => {
                match self.scopes.assign(&ident.name, value) {
                    AssignOutcome::ConstantViolation => Err(RuntimeError::ConstantReassigned {
                        name: ident.name.clone(),
                        span: ident.span,
                    }
                    .into()),
                    _ => Ok(()),
                }
            }
            target @ (Expression::Member(_) | Expression::Index(_)) => {
                self.assign_path(target, value)
            }
            other => Err(RuntimeError::NotAssignable { span: *other.span() }.into()),
        }
    }

    /// Walk an lvalue expression down to its root identifier, evaluating
    /// index expressions along the way.
    fn lvalue_path(
        &mut self,
        target: &Expression,
    ) -> Result<(String, Span, Vec<PathSeg>), EvalError> {
        let mut segments = Vec::new();
        let mut cursor = target;
        loop {
            match cursor {
                Expression::Member(member) => {
                    segments.push(PathSeg::Member(member.name.clone(), member.span));
                    cursor = &member.target;
                }
                Expression::Index(index) => {
                    let key = self.eval_expr(&index.index)?;
                    segments.push(PathSeg::Index(key, index.span));
                    cursor = &index.target;
                }
                Expression::Identifier(ident) => {
                    segments.reverse();
                    return Ok((ident.name.clone(), ident.span, segments));
                }
                other => {
                    return Err(RuntimeError::NotAssignable { span: *other.span() }.into())
                }
            }
        }
    }

    fn assign_path(&mut self, target: &Expression, value: Value) -> Result<(), EvalError> {
        let (root, root_span, segments) = self.lvalue_path(target)?;
        let mut pending = Some(value);

        // An unbound root identifier can still name a host type; a static
        // member then takes the write.
        if self.scopes.lookup(&root).is_none() {
            if let [PathSeg::Member(name, span)] = segments.as_slice() {
                if let Some(resolved) = resolve_static_member(&self.externals, &root, name) {
                    let value = pending.take().unwrap_or(Value::Null);
                    return Self::write_member(&resolved, name, value, *span);
                }
            }
        }

        let symbol = self.scopes.lookup_mut(&root).ok_or(RuntimeError::UndefinedVariable {
            name: root.clone(),
            span: root_span,
        })?;
        let mut slot: &mut Value = match symbol {
            Symbol::Variable(slot) => slot,
            Symbol::Constant(_) | Symbol::Module(_) => {
                return Err(RuntimeError::ConstantReassigned { name: root, span: root_span }.into())
            }
        };

        let count = segments.len();
        for (at, segment) in segments.into_iter().enumerate() {
            let last = at + 1 == count;
            match segment {
                PathSeg::Member(name, span) => match slot {
                    Value::Map(entries) => {
                        if last {
                            entries.insert(name, pending.take().unwrap_or(Value::Null));
                            return Ok(());
                        }
                        slot = entries.get_mut(&name).ok_or(RuntimeError::MissingMember {
                            type_name: "map".to_string(),
                            member: name.clone(),
                            span,
                        })?;
                    }
                    Value::Host(_) => {
                        if !last {
                            return Err(RuntimeError::NotAssignable { span }.into());
                        }
                        // Writes resolve through the same descriptor as
                        // reads, including the case-insensitive retry.
                        let receiver = slot.clone();
                        let resolved = resolve_member(&self.externals, &receiver, &name)
                            .ok_or_else(|| RuntimeError::MissingMember {
                                type_name: receiver.kind().name().to_string(),
                                member: name.clone(),
                                span,
                            })?;
                        let value = pending.take().unwrap_or(Value::Null);
                        return Self::write_member(&resolved, &name, value, span);
                    }
                    Value::Null => {
                        return Err(RuntimeError::NullReceiver { member: name, span }.into())
                    }
                    other => {
                        return Err(RuntimeError::MemberNotSupported {
                            member: name,
                            type_name: other.kind().name().to_string(),
                            action: "assigned",
                            span,
                        }
                        .into())
                    }
                },
                PathSeg::Index(key, span) => match slot {
                    Value::Array(items) => {
                        let number = key.as_number().ok_or(RuntimeError::NotIndexable {
                            kind: "array",
                            index_kind: key.kind().name(),
                            span,
                        })?;
                        let index = number as i64;
                        if index < 0 || index as usize >= items.len() {
                            return Err(RuntimeError::IndexOutOfBounds {
                                index,
                                len: items.len(),
                                span,
                            }
                            .into());
                        }
                        if last {
                            items[index as usize] = pending.take().unwrap_or(Value::Null);
                            return Ok(());
                        }
                        slot = &mut items[index as usize];
                    }
                    Value::Map(entries) => {
                        let name = key.as_str().ok_or(RuntimeError::NotIndexable {
                            kind: "map",
                            index_kind: key.kind().name(),
                            span,
                        })?;
                        if last {
                            entries.insert(name.to_string(), pending.take().unwrap_or(Value::Null));
                            return Ok(());
                        }
                        slot = entries.get_mut(name).ok_or(RuntimeError::MissingMember {
                            type_name: "map".to_string(),
                            member: name.to_string(),
                            span,
                        })?;
                    }
                    other => {
                        return Err(RuntimeError::NotIndexable {
                            kind: other.kind().name(),
                            index_kind: key.kind().name(),
                            span,
                        }
                        .into())
                    }
                },
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn eval_expr(&mut self, expression: &Expression) -> Result<Value, EvalError> {
        match expression {
            Expression::NullLiteral(_) => Ok(Value::Null),
            Expression::BoolLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expression::NumberLiteral(lit) => Ok(Value::Number(lit.value)),
            Expression::StringLiteral(lit) => Ok(Value::Str(lit.value.clone())),
            Expression::DateLiteral(lit) => {
                // Date literals carry no time of day; midnight is always
                // representable.
                let midnight = lit.value.and_hms_opt(0, 0, 0).unwrap_or_default();
                Ok(Value::Date(midnight))
            }
            Expression::TimeLiteral(lit) => Ok(Value::Time(lit.value)),

            Expression::ArrayLiteral(lit) => {
                let mut items = Vec::with_capacity(lit.elements.len());
                for element in &lit.elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::Array(items))
            }

            Expression::MapLiteral(lit) => {
                let mut entries = rustc_hash::FxHashMap::default();
                for (key, value_expr) in &lit.entries {
                    let value = self.eval_expr(value_expr)?;
                    entries.insert(key.clone(), value);
                }
                Ok(Value::Map(entries))
            }

            Expression::Identifier(ident) => match self.scopes.lookup(&ident.name) {
                Some(symbol) => Ok(symbol.value()),
                None => Err(RuntimeError::UndefinedVariable {
                    name: ident.name.clone(),
                    span: ident.span,
                }
                .into()),
            },

            Expression::Binary(expr) => {
                let left = self.eval_expr(&expr.left)?;
                let right = self.eval_expr(&expr.right)?;
                ops::binary(expr.op, &left, &right, &self.limits)
                    .map_err(|e| op_error(e, expr.span))
            }

            Expression::Compare(expr) => {
                let left = self.eval_expr(&expr.left)?;
                let right = self.eval_expr(&expr.right)?;
                ops::compare(expr.op, &left, &right).map_err(|e| op_error(e, expr.span))
            }

            Expression::Logical(expr) => {
                let left = self.eval_expr(&expr.left)?;
                let left_truthy = self.conversions.truthy(&left);
                let result = match expr.op {
                    LogicalOp::And => {
                        left_truthy && {
                            let right = self.eval_expr(&expr.right)?;
                            self.conversions.truthy(&right)
                        }
                    }
                    LogicalOp::Or => {
                        left_truthy || {
                            let right = self.eval_expr(&expr.right)?;
                            self.conversions.truthy(&right)
                        }
                    }
                };
                Ok(Value::Bool(result))
            }

            Expression::Unary(expr) => {
                let operand = self.eval_expr(&expr.operand)?;
                let truthy = self.conversions.truthy(&operand);
                ops::unary(expr.op, &operand, truthy).map_err(|e| op_error(e, expr.span))
            }

            Expression::Member(expr) => {
                if let Some(value) = self.read_static_member(&expr.target, &expr.name, expr.span)? {
                    return Ok(value);
                }
                let receiver = self.eval_expr(&expr.target)?;
                self.read_member(&receiver, &expr.name, expr.span)
            }

            Expression::Index(expr) => {
                let receiver = self.eval_expr(&expr.target)?;
                let key = self.eval_expr(&expr.index)?;
                self.read_index(&receiver, &key, expr.span)
            }

            Expression::Call(call) => self.eval_call(call),

            Expression::Unit(expr) => {
                let resolved =
                    self.units.lookup(&expr.unit).ok_or_else(|| TypeError::UnknownUnit {
                        name: expr.unit.clone(),
                        span: expr.span,
                    })?;
                let value = self.eval_expr(&expr.value)?;
                let number = value.as_number().ok_or_else(|| TypeError::InvalidOperands {
                    op: expr.unit.clone(),
                    left: value.kind().name(),
                    right: "nothing",
                    span: expr.span,
                })?;
                Ok(Value::Unit(UnitValue {
                    value: number,
                    base: number * resolved.scale,
                    scale: resolved.scale,
                    group: resolved.group.to_string(),
                    subgroup: resolved.subgroup.to_string(),
                }))
            }

            Expression::Percent(expr) => {
                let value = self.eval_expr(&expr.value)?;
                let number = value.as_number().ok_or_else(|| TypeError::InvalidOperands {
                    op: "%".to_string(),
                    left: value.kind().name(),
                    right: "nothing",
                    span: expr.span,
                })?;
                Ok(Value::Number(number / 100.0))
            }

            Expression::Extension(expr) => {
                let mut args = Vec::with_capacity(expr.args.len());
                for arg in &expr.args {
                    let span = *arg.span();
                    let value = self.eval_expr(arg)?;
                    args.push(ArgValue::positional(value, span));
                }
                self.call_named(&expr.name, args, expr.span)
            }
        }
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    /// Receiver identifier with no binding in scope, naming a registered
    /// host type. Such a target resolves statically instead of evaluating.
    fn static_target<'a>(&self, target: &'a Expression) -> Option<&'a str> {
        match target {
            Expression::Identifier(ident) if self.scopes.lookup(&ident.name).is_none() => {
                Some(&ident.name)
            }
            _ => None,
        }
    }

    /// Read `Type.member` where `Type` names a registered host type.
    /// `Ok(None)` means the target is not a static one and evaluation should
    /// proceed normally.
    fn read_static_member(
        &mut self,
        target: &Expression,
        name: &str,
        span: Span,
    ) -> Result<Option<Value>, EvalError> {
        let resolved = match self.static_target(target) {
            Some(type_name) => resolve_static_member(&self.externals, type_name, name),
            None => None,
        };
        let resolved = match resolved {
            Some(resolved) => resolved,
            None => return Ok(None),
        };
        match resolved.kind {
            MemberKind::Property => {
                self.invoke_member(&resolved, &Value::Null, &[], name, span).map(Some)
            }
            MemberKind::Method => Err(RuntimeError::MemberNotSupported {
                member: name.to_string(),
                type_name: resolved.owner.clone(),
                action: "read",
                span,
            }
            .into()),
        }
    }

    /// Call `Type.member(args)` where `Type` names a registered host type.
    fn call_static_member(
        &mut self,
        call: &CallExpr,
        target: &Expression,
    ) -> Result<Option<Value>, EvalError> {
        let resolved = match self.static_target(target) {
            Some(type_name) => resolve_static_member(&self.externals, type_name, &call.name),
            None => None,
        };
        let resolved = match resolved {
            Some(resolved) => resolved,
            None => return Ok(None),
        };
        let args = self.eval_args(call)?;
        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            match arg.name {
                Some(name) => {
                    return Err(RuntimeError::UnknownParameter {
                        name,
                        function: call.name.clone(),
                        span: arg.span,
                    }
                    .into())
                }
                None => positional.push(arg.value),
            }
        }
        match resolved.kind {
            MemberKind::Method => self
                .invoke_member(&resolved, &Value::Null, &positional, &call.name, call.span)
                .map(Some),
            MemberKind::Property => Err(RuntimeError::MemberNotSupported {
                member: call.name.clone(),
                type_name: resolved.owner.clone(),
                action: "called",
                span: call.span,
            }
            .into()),
        }
    }

    fn read_member(&mut self, receiver: &Value, name: &str, span: Span) -> Result<Value, EvalError> {
        if receiver.is_null() {
            return Err(RuntimeError::NullReceiver { member: name.to_string(), span }.into());
        }

        // Map entries (including module namespaces) come before any member
        // machinery.
        if let Value::Map(entries) = receiver {
            if let Some(value) = entries.get(name) {
                return Ok(value.clone());
            }
        }

        // `to_*` members surface the conversion matrix.
        if let Some(target) = conversion_target(name) {
            return self.conversions.convert(receiver, target).ok_or_else(|| {
                TypeError::InvalidConversion {
                    from: receiver.kind().name(),
                    to: target.name(),
                    span,
                }
                .into()
            });
        }

        let resolved = resolve_member(&self.externals, receiver, name).ok_or_else(|| {
            RuntimeError::MissingMember {
                type_name: receiver.kind().name().to_string(),
                member: name.to_string(),
                span,
            }
        })?;

        match resolved.kind {
            MemberKind::Property => self.invoke_member(&resolved, receiver, &[], name, span),
            MemberKind::Method => Err(RuntimeError::MemberNotSupported {
                member: name.to_string(),
                type_name: receiver.kind().name().to_string(),
                action: "read",
                span,
            }
            .into()),
        }
    }

    fn invoke_member(
        &mut self,
        resolved: &ResolvedMember,
        receiver: &Value,
        args: &[Value],
        name: &str,
        span: Span,
    ) -> Result<Value, EvalError> {
        let external = |message: String| {
            EvalError::from(RuntimeError::External { name: name.to_string(), message, span })
        };
        match &resolved.binding {
            MemberBinding::Builtin(member) => (member.call)(receiver, args).map_err(external),
            MemberBinding::External(func) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend_from_slice(args);
                (func.func)(&full).map_err(external)
            }
            MemberBinding::Handle(handle) => match resolved.kind {
                MemberKind::Property => {
                    let get = handle.get.as_ref().ok_or(RuntimeError::MemberNotSupported {
                        member: name.to_string(),
                        type_name: resolved.owner.clone(),
                        action: "read",
                        span,
                    })?;
                    get().map_err(external)
                }
                MemberKind::Method => {
                    let invoke = handle.invoke.as_ref().ok_or(RuntimeError::MemberNotSupported {
                        member: name.to_string(),
                        type_name: resolved.owner.clone(),
                        action: "called",
                        span,
                    })?;
                    invoke(args).map_err(external)
                }
            },
        }
    }

    /// Write through a resolved member's setter slot. Only handle bindings
    /// can carry one; everything else rejects assignment.
    fn write_member(
        resolved: &ResolvedMember,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), EvalError> {
        let set = match &resolved.binding {
            MemberBinding::Handle(handle) => handle.set.clone(),
            MemberBinding::External(_) | MemberBinding::Builtin(_) => None,
        };
        let set = set.ok_or(RuntimeError::MemberNotSupported {
            member: name.to_string(),
            type_name: resolved.owner.clone(),
            action: "assigned",
            span,
        })?;
        set(value).map_err(|message| {
            RuntimeError::External { name: name.to_string(), message, span }.into()
        })
    }

    fn read_index(&self, receiver: &Value, key: &Value, span: Span) -> Result<Value, EvalError> {
        match receiver {
            Value::Array(items) => {
                let number = key.as_number().ok_or(RuntimeError::NotIndexable {
                    kind: "array",
                    index_kind: key.kind().name(),
                    span,
                })?;
                let index = number as i64;
                if index < 0 || index as usize >= items.len() {
                    return Err(RuntimeError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                        span,
                    }
                    .into());
                }
                Ok(items[index as usize].clone())
            }
            Value::Str(s) => {
                let number = key.as_number().ok_or(RuntimeError::NotIndexable {
                    kind: "string",
                    index_kind: key.kind().name(),
                    span,
                })?;
                let index = number as i64;
                match s.chars().nth(index.max(0) as usize) {
                    Some(c) if index >= 0 => Ok(Value::Str(c.to_string())),
                    _ => Err(RuntimeError::IndexOutOfBounds {
                        index,
                        len: s.chars().count(),
                        span,
                    }
                    .into()),
                }
            }
            Value::Map(entries) => {
                let name = key.as_str().ok_or(RuntimeError::NotIndexable {
                    kind: "map",
                    index_kind: key.kind().name(),
                    span,
                })?;
                // A missing key reads as null; writes create the entry.
                Ok(entries.get(name).cloned().unwrap_or(Value::Null))
            }
            other => Err(RuntimeError::NotIndexable {
                kind: other.kind().name(),
                index_kind: key.kind().name(),
                span,
            }
            .into()),
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn eval_args(&mut self, call: &CallExpr) -> Result<Vec<ArgValue>, EvalError> {
        if call.args.len() > self.limits.max_params {
            return Err(LimitError::ParameterCount {
                limit: self.limits.max_params,
                span: call.span,
            }
            .into());
        }
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            let value = self.eval_expr(&arg.value)?;
            args.push(ArgValue { name: arg.name.clone(), value, span: arg.span });
        }
        Ok(args)
    }

    fn eval_call(&mut self, call: &CallExpr) -> Result<Value, EvalError> {
        if let Some(target) = &call.target {
            if let Some(value) = self.call_static_member(call, target)? {
                return Ok(value);
            }
            let receiver = self.eval_expr(target)?;
            return self.eval_method_call(call, &receiver);
        }

        let mut args = self.eval_args(call)?;

        // Wildcard calls pass exactly three arguments: the matched trailing
        // text, its identifier parts, and the ordinary arguments as an array.
        if let Some(capture) = &call.wildcard {
            let normal: Vec<Value> = args.into_iter().map(|arg| arg.value).collect();
            let parts = capture.parts.iter().cloned().map(Value::Str).collect();
            args = vec![
                ArgValue::positional(Value::Str(capture.text.clone()), call.span),
                ArgValue::positional(Value::Array(parts), call.span),
                ArgValue::positional(Value::Array(normal), call.span),
            ];
        }

        self.call_named(&call.name, args, call.span)
    }

    fn eval_method_call(&mut self, call: &CallExpr, receiver: &Value) -> Result<Value, EvalError> {
        if receiver.is_null() {
            return Err(RuntimeError::NullReceiver {
                member: call.name.clone(),
                span: call.span,
            }
            .into());
        }

        // A map entry holding a function is callable as a method; this is
        // how module functions are invoked.
        if let Value::Map(entries) = receiver {
            if let Some(Value::Function(func)) = entries.get(&call.name) {
                let func = Rc::clone(func);
                let args = self.eval_args(call)?;
                return self.call_script(&func, args, call.span);
            }
        }

        let args = self.eval_args(call)?;
        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            match arg.name {
                Some(name) => {
                    return Err(RuntimeError::UnknownParameter {
                        name,
                        function: call.name.clone(),
                        span: arg.span,
                    }
                    .into())
                }
                None => positional.push(arg.value),
            }
        }

        if let Some(target) = conversion_target(&call.name) {
            return self.conversions.convert(receiver, target).ok_or_else(|| {
                TypeError::InvalidConversion {
                    from: receiver.kind().name(),
                    to: target.name(),
                    span: call.span,
                }
                .into()
            });
        }

        let resolved = resolve_member(&self.externals, receiver, &call.name).ok_or_else(|| {
            RuntimeError::MissingMember {
                type_name: receiver.kind().name().to_string(),
                member: call.name.clone(),
                span: call.span,
            }
        })?;

        match resolved.kind {
            MemberKind::Method => {
                self.invoke_member(&resolved, receiver, &positional, &call.name, call.span)
            }
            MemberKind::Property => Err(RuntimeError::MemberNotSupported {
                member: call.name.clone(),
                type_name: receiver.kind().name().to_string(),
                action: "called",
                span: call.span,
            }
            .into()),
        }
    }

    /// Dispatch a plain or fluent call by name: script functions first, then
    /// the external registry.
    fn call_named(
        &mut self,
        name: &str,
        args: Vec<ArgValue>,
        span: Span,
    ) -> Result<Value, EvalError> {
        if let Some(symbol) = self.scopes.lookup(name) {
            if let Value::Function(func) = symbol.value() {
                return self.call_script(&func, args, span);
            }
        }
        if let Some(external) = self.externals.function(name) {
            let external = Rc::clone(external);
            return self.call_external(&external, args, span);
        }
        Err(RuntimeError::UndefinedFunction { name: name.to_string(), span }.into())
    }

    fn call_external(
        &mut self,
        external: &ExternalFunction,
        args: Vec<ArgValue>,
        span: Span,
    ) -> Result<Value, EvalError> {
        let values: Vec<Value> = match &external.params {
            Some(meta) => self
                .bind_arguments(&external.name, meta, args, span)?
                .into_iter()
                .map(|slot| slot.unwrap_or(Value::Null))
                .collect(),
            None => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    if let Some(name) = arg.name {
                        return Err(RuntimeError::UnknownParameter {
                            name,
                            function: external.name.clone(),
                            span: arg.span,
                        }
                        .into());
                    }
                    values.push(arg.value);
                }
                values
            }
        };
        (external.func)(&values).map_err(|message| {
            RuntimeError::External { name: external.name.clone(), message, span }.into()
        })
    }

    fn bind_arguments(
        &self,
        function: &str,
        meta: &ParamMetadata,
        args: Vec<ArgValue>,
        span: Span,
    ) -> Result<Vec<Option<Value>>, EvalError> {
        resolve_arguments(meta, args).map_err(|e| match e {
            BindError::UnknownParameter { name, span } => EvalError::from(
                RuntimeError::UnknownParameter { name, function: function.to_string(), span },
            ),
            BindError::TooManyArguments { expected, got, span: arg_span } => {
                EvalError::from(RuntimeError::TooManyArguments {
                    function: function.to_string(),
                    expected,
                    got,
                    span: if arg_span == Span::default() { span } else { arg_span },
                })
            }
        })
    }

    fn call_script(
        &mut self,
        func: &Rc<ScriptFunction>,
        args: Vec<ArgValue>,
        span: Span,
    ) -> Result<Value, EvalError> {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(LimitError::CallDepth { limit: self.limits.max_call_depth, span }.into());
        }
        let meta = ParamMetadata::from_decl(&func.decl);
        let slots = self.bind_arguments(&func.decl.name, &meta, args, span)?;

        self.call_depth += 1;
        self.push_scope(span).inspect_err(|_| self.call_depth -= 1)?;
        let result = self.exec_function(func, slots);
        self.scopes.pop();
        self.call_depth -= 1;
        result
    }

    fn exec_function(
        &mut self,
        func: &Rc<ScriptFunction>,
        slots: Vec<Option<Value>>,
    ) -> Result<Value, EvalError> {
        for (name, value) in &func.captured {
            self.scopes.declare(name.clone(), Symbol::Variable(value.clone()));
        }
        // The function sees itself, so direct recursion works even though
        // the capture snapshot predates the declaration.
        self.scopes.declare(
            func.decl.name.clone(),
            Symbol::Variable(Value::Function(Rc::clone(func))),
        );

        for (param, slot) in func.decl.params.iter().zip(slots) {
            let value = match slot {
                Some(value) => value,
                // An unset optional parameter takes its default; an unset
                // required parameter stays null.
                None => match &param.default {
                    Some(default) => self.eval_expr(default)?,
                    None => Value::Null,
                },
            };
            self.scopes.declare(param.name.clone(), Symbol::Variable(value));
        }

        match self.eval_statements(&func.decl.body.statements)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Break(span) => {
                Err(RuntimeError::LoopFlowOutsideLoop { keyword: "break", span }.into())
            }
            Flow::Continue(span) => {
                Err(RuntimeError::LoopFlowOutsideLoop { keyword: "continue", span }.into())
            }
        }
    }

    fn push_scope(&mut self, span: Span) -> Result<(), EvalError> {
        if self.scopes.depth() >= self.limits.max_scope_depth {
            return Err(LimitError::ScopeDepth {
                limit: self.limits.max_scope_depth,
                span,
            }
            .into());
        }
        self.scopes.push();
        Ok(())
    }
}

fn conversion_target(name: &str) -> Option<ValueKind> {
    match name {
        "to_string" => Some(ValueKind::Str),
        "to_number" => Some(ValueKind::Number),
        "to_bool" => Some(ValueKind::Bool),
        "to_date" => Some(ValueKind::Date),
        "to_time" => Some(ValueKind::Time),
        "to_day" => Some(ValueKind::Day),
        _ => None,
    }
}

fn op_error(err: OpError, span: Span) -> EvalError {
    match err {
        OpError::InvalidOperands { op, left, right } => {
            TypeError::InvalidOperands { op, left, right, span }.into()
        }
        OpError::UnitGroupMismatch { left, right } => {
            TypeError::UnitGroupMismatch { left, right, span }.into()
        }
        OpError::StringLength { limit } => LimitError::StringLength { limit, span }.into(),
    }
}
