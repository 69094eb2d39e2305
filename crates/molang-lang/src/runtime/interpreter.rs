//! Tree-walking evaluator. Every node checks the pending return value first so
//! a `return` unwinds to the nearest function or host boundary without
//! evaluating anything else.

use crate::error::RuntimeError;
use crate::runtime::context::Context;
use crate::runtime::value::{Body, Dictionary, Function, Value};
use crate::syntax::ast::{BinaryOp, Expr, Operation, Script};

// ─── Places ───────────────────────────────────────────────────────────────────

/// An evaluated assignment target.
#[derive(Debug, Clone)]
pub enum Place {
    /// A dictionary slot. Writes land in the shared storage.
    Entry { dict: Dictionary, key: String },
    /// Anything else. Writes are dropped.
    Detached(Value),
}

impl Place {
    pub fn get(&self) -> Value {
        match self {
            Place::Entry { dict, key } => dict.get(key).unwrap_or_default(),
            Place::Detached(value) => value.clone(),
        }
    }

    pub fn set(&self, value: Value) {
        if let Place::Entry { dict, key } = self {
            dict.insert(key.clone(), value);
        }
    }
}

// ─── Scripts ──────────────────────────────────────────────────────────────────

impl Script {
    /// Host entry point. Runtime errors are logged and the value of the last
    /// statement that completed is returned. Control-flow flags are cleared
    /// afterwards so the context can be reused.
    pub fn eval(&self, ctx: &mut Context) -> Value {
        let value = self.eval_block(ctx);
        finish_host_eval(ctx);
        value
    }

    /// Like [`Script::eval`] but hands back the first runtime error of this
    /// script's own statements instead of logging it.
    pub fn try_eval(&self, ctx: &mut Context) -> Result<Value, RuntimeError> {
        ctx.start_scope();
        let mut last = Value::Null;
        let outcome = self.run_statements(ctx, &mut last);
        ctx.end_scope();
        finish_host_eval(ctx);
        outcome.map(|()| last)
    }

    /// Evaluates as a nested block: own temp scope, errors contained here.
    pub(crate) fn eval_block(&self, ctx: &mut Context) -> Value {
        ctx.start_scope();
        let mut last = Value::Null;
        if let Err(err) = self.run_statements(ctx, &mut last) {
            tracing::warn!(source = %self.source, error = %err, "molang evaluation failed");
        }
        ctx.end_scope();
        last
    }

    fn run_statements(&self, ctx: &mut Context, last: &mut Value) -> Result<(), RuntimeError> {
        for expr in &self.exprs {
            *last = eval_expr(expr, ctx)?;
            if let Some(returned) = ctx.return_value() {
                *last = returned.clone();
                break;
            }
            if ctx.break_flag() || ctx.continue_flag() {
                break;
            }
        }
        Ok(())
    }
}

fn finish_host_eval(ctx: &mut Context) {
    ctx.take_return_value();
    ctx.set_break_flag(false);
    ctx.set_continue_flag(false);
}

// ─── Functions ────────────────────────────────────────────────────────────────

impl Function {
    /// Binds arguments into a fresh temp scope (by parameter name and as
    /// `arg_0..arg_n`), runs the body and consumes any pending return.
    pub fn call(&self, ctx: &mut Context, args: &[Value]) -> Result<Value, RuntimeError> {
        ctx.start_scope();
        let temp = ctx.temp_dict();
        for (param, arg) in self.params.iter().zip(args) {
            temp.insert(param.clone(), arg.deep_copy());
        }
        for (i, arg) in args.iter().enumerate() {
            temp.insert(format!("arg_{i}"), arg.deep_copy());
        }

        let result = match &self.body {
            Body::Script(script) => Ok(script.eval_block(ctx)),
            Body::Native(native) => native(ctx, args),
        };

        ctx.take_return_value();
        ctx.end_scope();
        result
    }
}

// ─── Expressions ──────────────────────────────────────────────────────────────

pub fn eval_expr(expr: &Expr, ctx: &mut Context) -> Result<Value, RuntimeError> {
    if let Some(returned) = ctx.return_value() {
        return Ok(returned.clone());
    }
    match expr {
        Expr::Constant(value) => Ok(value.clone()),
        Expr::Parenthesized(inner) => eval_expr(inner, ctx),
        Expr::Block(script) => Ok(script.eval_block(ctx)),
        Expr::Operation(op) => eval_operation(op, ctx),
    }
}

/// Evaluates an operand slot. An unfilled slot reads as `Null`.
fn eval_operand(slot: &Option<Expr>, ctx: &mut Context) -> Result<Value, RuntimeError> {
    match slot {
        Some(expr) => eval_expr(expr, ctx),
        None => Ok(Value::Null),
    }
}

fn eval_operation(op: &Operation, ctx: &mut Context) -> Result<Value, RuntimeError> {
    match op {
        Operation::Global(name) => ctx.get_global(name),
        Operation::Break => {
            ctx.set_break_flag(true);
            Ok(Value::Null)
        }
        Operation::Continue => {
            ctx.set_continue_flag(true);
            Ok(Value::Null)
        }
        Operation::Return(value) => {
            let value = eval_expr(value, ctx)?;
            ctx.set_return_value(value);
            Ok(Value::Null)
        }
        Operation::Loop { count, body } => eval_loop(count, body, ctx),
        Operation::ForEach { slot, array, body } => eval_for_each(slot, array, body, ctx),

        Operation::Field { target, name } => {
            let target = eval_operand(target, ctx)?;
            target.field(ctx, name)
        }
        Operation::Index { target, index } => {
            let key = index_key(index, ctx)?;
            let target = eval_operand(target, ctx)?;
            target.field(ctx, &key)
        }
        Operation::Call { callee, args } => {
            let function = match eval_operand(callee, ctx)? {
                Value::Function(function) => function,
                other => return Ok(other),
            };
            let args = args.iter().map(|arg| eval_expr(arg, ctx)).collect::<Result<Vec<_>, _>>()?;
            function.call(ctx, &args)
        }
        Operation::Conditional { cond, then, otherwise } => {
            if eval_operand(cond, ctx)?.as_boolean(ctx)? {
                eval_expr(then, ctx)
            } else {
                eval_expr(otherwise, ctx)
            }
        }
        Operation::Not(operand) => {
            let value = eval_operand(operand, ctx)?;
            Ok(Value::Boolean(!value.as_boolean(ctx)?))
        }
        Operation::Binary { op, left, right } => eval_binary(*op, left, right, ctx),
    }
}

fn index_key(index: &Expr, ctx: &mut Context) -> Result<String, RuntimeError> {
    let index = eval_expr(index, ctx)?.as_number(ctx)? as i32;
    Ok(format!("[{index}]"))
}

// ─── Binary operators ─────────────────────────────────────────────────────────

fn eval_binary(
    op: BinaryOp,
    left: &Option<Expr>,
    right: &Option<Expr>,
    ctx: &mut Context,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::And => {
            if !eval_operand(left, ctx)?.as_boolean(ctx)? {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(eval_operand(right, ctx)?.as_boolean(ctx)?))
        }
        BinaryOp::Or => {
            if eval_operand(left, ctx)?.as_boolean(ctx)? {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(eval_operand(right, ctx)?.as_boolean(ctx)?))
        }
        BinaryOp::Coalesce => {
            let value = eval_operand(left, ctx)?;
            if value.is_null() { eval_operand(right, ctx) } else { Ok(value) }
        }
        BinaryOp::Assign => {
            let value = eval_operand(right, ctx)?;
            let place = eval_place(left, ctx)?;
            place.set(value.deep_copy());
            Ok(value)
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let l = eval_operand(left, ctx)?;
            let r = eval_operand(right, ctx)?;
            let equal = l.equals(ctx, &r)?;
            Ok(Value::Boolean(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        // Unary forms: the parser leaves the left slot empty.
        BinaryOp::Add | BinaryOp::Sub if left.is_none() => {
            let r = eval_operand(right, ctx)?.as_number(ctx)?;
            Ok(Value::Number(if op == BinaryOp::Sub { -r } else { r }))
        }
        _ => {
            let l = eval_operand(left, ctx)?.as_number(ctx)?;
            let r = eval_operand(right, ctx)?.as_number(ctx)?;
            Ok(match op {
                BinaryOp::Add => Value::Number(l + r),
                BinaryOp::Sub => Value::Number(l - r),
                BinaryOp::Mul => Value::Number(l * r),
                BinaryOp::Div => Value::Number(l / r),
                BinaryOp::Lt => Value::Boolean(l < r),
                BinaryOp::LtEq => Value::Boolean(l <= r),
                BinaryOp::Gt => Value::Boolean(l > r),
                BinaryOp::GtEq => Value::Boolean(l >= r),
                BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce | BinaryOp::Assign
                | BinaryOp::Eq | BinaryOp::NotEq => Value::Null,
            })
        }
    }
}

// ─── Assignment targets ───────────────────────────────────────────────────────

fn eval_place(slot: &Option<Expr>, ctx: &mut Context) -> Result<Place, RuntimeError> {
    match slot {
        Some(expr) => eval_place_expr(expr, ctx),
        None => Ok(Place::Detached(Value::Null)),
    }
}

pub fn eval_place_expr(expr: &Expr, ctx: &mut Context) -> Result<Place, RuntimeError> {
    if let Some(returned) = ctx.return_value() {
        return Ok(Place::Detached(returned.clone()));
    }
    let Expr::Operation(op) = expr else {
        if let Expr::Parenthesized(inner) = expr {
            return eval_place_expr(inner, ctx);
        }
        return Ok(Place::Detached(eval_expr(expr, ctx)?));
    };

    match op.as_ref() {
        Operation::Field { target, name } => {
            let target = eval_operand(target, ctx)?;
            place_in(target, name.clone(), ctx)
        }
        Operation::Index { target, index } => {
            let key = index_key(index, ctx)?;
            let target = eval_operand(target, ctx)?;
            place_in(target, key, ctx)
        }
        Operation::Conditional { cond, then, otherwise } => {
            if eval_operand(cond, ctx)?.as_boolean(ctx)? {
                eval_place_expr(then, ctx)
            } else {
                eval_place_expr(otherwise, ctx)
            }
        }
        Operation::Binary { op: BinaryOp::Coalesce, left, right } => {
            let place = eval_place(left, ctx)?;
            if place.get().is_null() { eval_place(right, ctx) } else { Ok(place) }
        }
        other => Ok(Place::Detached(eval_operation(other, ctx)?)),
    }
}

fn place_in(target: Value, key: String, ctx: &mut Context) -> Result<Place, RuntimeError> {
    match target {
        Value::Dictionary(dict) => {
            dict.get_or_insert_null(&key);
            Ok(Place::Entry { dict, key })
        }
        Value::Function(function) => {
            let resolved = function.call(ctx, &[])?;
            place_in(resolved, key, ctx)
        }
        other => Ok(Place::Detached(other.field(ctx, &key)?)),
    }
}

// ─── Loops ────────────────────────────────────────────────────────────────────

fn eval_loop(count: &Expr, body: &Expr, ctx: &mut Context) -> Result<Value, RuntimeError> {
    let requested = eval_expr(count, ctx)?.as_number(ctx)? as i64;
    let iterations = capped_iterations(requested, ctx);

    ctx.start_scope();
    ctx.set_break_flag(false);
    ctx.set_continue_flag(false);
    let outcome = run_iterations(iterations, body, ctx, |_| {});
    ctx.end_scope();
    ctx.set_break_flag(false);
    ctx.set_continue_flag(false);

    outcome.map(|()| Value::Null)
}

fn eval_for_each(slot: &Expr, array: &Expr, body: &Expr, ctx: &mut Context) -> Result<Value, RuntimeError> {
    let items = match eval_expr(array, ctx)? {
        Value::Array(items) => items,
        other => {
            return Err(RuntimeError::shape_error(format!(
                "for_each expects an array, got {}",
                other.type_name()
            )));
        }
    };
    let iterations = capped_iterations(items.len() as i64, ctx);

    ctx.start_scope();
    ctx.set_break_flag(false);
    ctx.set_continue_flag(false);
    // The slot lives in the loop scope so the body sees each binding.
    let outcome = match eval_place_expr(slot, ctx) {
        Ok(place) => run_iterations(iterations, body, ctx, |i| place.set(items[i].deep_copy())),
        Err(err) => Err(err),
    };
    ctx.end_scope();
    ctx.set_break_flag(false);
    ctx.set_continue_flag(false);

    outcome.map(|()| Value::Null)
}

fn run_iterations(
    iterations: usize,
    body: &Expr,
    ctx: &mut Context,
    mut before_each: impl FnMut(usize),
) -> Result<(), RuntimeError> {
    for i in 0..iterations {
        ctx.set_continue_flag(false);
        before_each(i);
        eval_expr(body, ctx)?;
        if ctx.break_flag() || ctx.return_flag() {
            break;
        }
    }
    Ok(())
}

fn capped_iterations(requested: i64, ctx: &Context) -> usize {
    let requested = requested.max(0);
    match ctx.config().loop_limit {
        Some(limit) if requested > i64::from(limit) => {
            tracing::debug!(requested, limit, "loop iterations capped");
            limit as usize
        }
        _ => requested as usize,
    }
}
