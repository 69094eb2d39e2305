//! The `math` global. Angles are in degrees.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, RngCore};

use super::number;
use crate::error::RuntimeError;
use crate::runtime::context::Context;
use crate::runtime::value::Value;

/// Random numbers for `math.random*` and `math.die_roll*`.
pub trait RandomSource: Send {
    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
    /// Uniform in `[low, high]`. Returns `low` when the range is empty.
    fn next_int(&mut self, low: i32, high: i32) -> i32;
}

impl<R: RngCore + Send> RandomSource for R {
    fn next_f32(&mut self) -> f32 {
        self.gen_range(0.0f32..1.0)
    }

    fn next_int(&mut self, low: i32, high: i32) -> i32 {
        if low >= high { low } else { self.gen_range(low..=high) }
    }
}

type Shared<R> = Arc<Mutex<R>>;

// ─── Builders ─────────────────────────────────────────────────────────────────

fn unary(name: &'static str, f: fn(f32) -> f32) -> (&'static str, Value) {
    let func = Value::native(&["value"], move |ctx, args| Ok(Value::Number(f(number(ctx, args, 0)?))));
    (name, func)
}

fn binary(name: &'static str, params: [&str; 2], f: fn(f32, f32) -> f32) -> (&'static str, Value) {
    let func = Value::native(&params, move |ctx, args| {
        let a = number(ctx, args, 0)?;
        let b = number(ctx, args, 1)?;
        Ok(Value::Number(f(a, b)))
    });
    (name, func)
}

fn ternary(name: &'static str, params: [&str; 3], f: fn(f32, f32, f32) -> f32) -> (&'static str, Value) {
    let func = Value::native(&params, move |ctx, args| {
        let a = number(ctx, args, 0)?;
        let b = number(ctx, args, 1)?;
        let c = number(ctx, args, 2)?;
        Ok(Value::Number(f(a, b, c)))
    });
    (name, func)
}

fn seeded<R: RandomSource + 'static>(
    name: &'static str,
    params: &[&str],
    random: &Shared<R>,
    f: fn(&mut dyn RandomSource, &mut Context, &[Value]) -> Result<f32, RuntimeError>,
) -> (&'static str, Value) {
    let random = Arc::clone(random);
    let func = Value::native(params, move |ctx, args| {
        // Arguments may run script functions, so coerce before locking.
        let args: Vec<Value> = args
            .iter()
            .map(|a| a.as_number(ctx).map(Value::Number))
            .collect::<Result<_, _>>()?;
        let mut rng = random.lock();
        Ok(Value::Number(f(&mut *rng, ctx, &args)?))
    });
    (name, func)
}

/// Builds the `math` object around the given random source.
pub fn build<R: RandomSource + 'static>(random: R) -> Value {
    let random: Shared<R> = Arc::new(Mutex::new(random));

    Value::object([
        unary("abs", f32::abs),
        unary("acos", |v| v.acos().to_degrees()),
        unary("asin", |v| v.asin().to_degrees()),
        unary("atan", |v| v.atan().to_degrees()),
        binary("atan2", ["y", "x"], |y, x| y.atan2(x).to_degrees()),
        unary("ceil", f32::ceil),
        ternary("clamp", ["value", "min", "max"], |v, min, max| v.min(max).max(min)),
        unary("cos", |v| v.to_radians().cos()),
        seeded("die_roll", &["num", "low", "high"], &random, die_roll),
        seeded("die_roll_integer", &["num", "low", "high"], &random, die_roll_integer),
        unary("exp", f32::exp),
        unary("floor", f32::floor),
        unary("hermite_blend", |t| 3.0 * t * t - 2.0 * t * t * t),
        ternary("lerp", ["start", "end", "0_to_1"], lerp),
        ternary("lerprotate", ["start", "end", "0_to_1"], |start, end, t| {
            start + min_angle(end - start) * t
        }),
        unary("ln", f32::ln),
        binary("max", ["A", "B"], f32::max),
        binary("min", ["A", "B"], f32::min),
        unary("min_angle", min_angle),
        binary("mod", ["value", "denominator"], floored_mod),
        ("pi", Value::native(&[], |_, _| Ok(Value::Number(std::f32::consts::PI)))),
        binary("pow", ["base", "exponent"], f32::powf),
        seeded("random", &["low", "high"], &random, |rng, _, args| {
            let (low, high) = (arg(args, 0), arg(args, 1));
            Ok(rng.next_f32() * (high - low) + low)
        }),
        seeded("random_integer", &["low", "high"], &random, |rng, _, args| {
            Ok(rng.next_int(arg(args, 0) as i32, arg(args, 1) as i32) as f32)
        }),
        unary("round", |v| (v + 0.5).floor()),
        unary("sin", |v| v.to_radians().sin()),
        unary("sqrt", f32::sqrt),
        unary("trunc", f32::trunc),
    ])
}

// ─── Implementations ──────────────────────────────────────────────────────────

fn arg(args: &[Value], i: usize) -> f32 {
    match args.get(i) {
        Some(Value::Number(n)) => *n,
        _ => 0.0,
    }
}

fn lerp(start: f32, end: f32, t: f32) -> f32 {
    end * t + start * (1.0 - t)
}

/// Wraps an angle into `[-180, 180)`.
fn min_angle(angle: f32) -> f32 {
    let turns = (angle + 180.0) / 360.0;
    (turns - turns.floor()) * 360.0 - 180.0
}

/// Modulo with the sign of the denominator.
fn floored_mod(value: f32, denominator: f32) -> f32 {
    let q = value / denominator;
    (q - q.floor()) * denominator
}

fn roll_count(ctx: &Context, num: f32) -> u32 {
    let count = num.max(0.0) as u32;
    match ctx.config().loop_limit {
        Some(limit) => count.min(limit),
        None => count,
    }
}

fn die_roll(rng: &mut dyn RandomSource, ctx: &mut Context, args: &[Value]) -> Result<f32, RuntimeError> {
    let (low, high) = (arg(args, 1), arg(args, 2));
    let total = (0..roll_count(ctx, arg(args, 0)))
        .map(|_| rng.next_f32() * (high - low) + low)
        .sum();
    Ok(total)
}

fn die_roll_integer(rng: &mut dyn RandomSource, ctx: &mut Context, args: &[Value]) -> Result<f32, RuntimeError> {
    let (low, high) = (arg(args, 1) as i32, arg(args, 2) as i32);
    let total: i64 = (0..roll_count(ctx, arg(args, 0)))
        .map(|_| i64::from(rng.next_int(low, high)))
        .sum();
    Ok(total as f32)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
