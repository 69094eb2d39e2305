//! Built-in globals installed into every [`Context`](crate::Context).
//!
//! `math` is always present. `query` is supplied by the host, usually through
//! [`query::QueryBuilder`].

use crate::error::RuntimeError;
use crate::runtime::context::Context;
use crate::runtime::value::Value;

pub mod math;
pub mod query;

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Argument `i` as a number. Missing arguments read as 0.
pub(crate) fn number(ctx: &mut Context, args: &[Value], i: usize) -> Result<f32, RuntimeError> {
    match args.get(i) {
        Some(v) => v.as_number(ctx),
        None => Ok(0.0),
    }
}

/// Argument `i` as a string. Missing arguments read as "".
pub(crate) fn string(ctx: &mut Context, args: &[Value], i: usize) -> Result<String, RuntimeError> {
    match args.get(i) {
        Some(v) => v.as_string(ctx),
        None => Ok(String::new()),
    }
}

pub(crate) fn flag(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}
