//! The `query` global. Hosts assemble it with [`QueryBuilder`], layering their
//! own fields over the host-independent standard set.

use std::collections::HashMap;
use std::sync::Arc;

use super::{flag, number, string};
use crate::error::RuntimeError;
use crate::runtime::animation::{AnimationInfo, xyz};
use crate::runtime::context::Context;
use crate::runtime::value::Value;

/// Frame time reported when no animation is being evaluated.
const DEFAULT_FRAME_TIME: f32 = 1.0 / 20.0;

/// Tolerance for `query.approx_eq`.
const APPROX_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: HashMap<String, Value>,
}

impl QueryBuilder {
    /// An empty query object.
    pub fn new() -> Self { Self::default() }

    /// Pre-registers the comparison, logging and animation queries.
    pub fn standard() -> Self {
        Self::new()
            .function("all", &[], |ctx, args| all(ctx, args).map(flag))
            .function("any", &[], |ctx, args| any(ctx, args).map(flag))
            .function("approx_eq", &[], |ctx, args| approx_eq(ctx, args).map(flag))
            .function("count", &[], |_, args| Ok(Value::Number(count(args))))
            .function("in_range", &["value", "min", "max"], |ctx, args| {
                let value = number(ctx, args, 0)?;
                let (min, max) = (number(ctx, args, 1)?, number(ctx, args, 2)?);
                Ok(flag(value >= min && value <= max))
            })
            .function("log", &[], log)
            .function("debug_output", &[], log)
            .animation("anim_time", |info| Value::Number(info.map_or(0.0, |i| i.anim_time)))
            .animation("life_time", |info| Value::Number(info.map_or(0.0, |i| i.global_time)))
            .animation("key_frame_lerp_time", |info| {
                Value::Number(info.map_or(0.0, |i| i.keyframe_lerp_time))
            })
            .animation("delta_time", frame_time)
            .animation("average_frame_time", frame_time)
            .animation("last_frame_time", frame_time)
            .animation("maximum_frame_time", frame_time)
            .animation("minimum_frame_time", frame_time)
            .animation("all_animations_finished", |info| {
                Value::Boolean(info.is_some_and(|i| i.all_animations_finished))
            })
            .animation("any_animation_finished", |info| {
                Value::Boolean(info.is_some_and(|i| i.any_animation_finished))
            })
            .bone("bone_orientation_trs", |info, bone| {
                info.map(|i| i.bone_trs(bone)).unwrap_or_default().to_value()
            })
            .bone("bone_origin", |info, bone| xyz(info.map_or([0.0; 3], |i| i.bone_origin(bone))))
            .bone("bone_rotation", |info, bone| xyz(info.map_or([0.0; 3], |i| i.bone_rotation(bone))))
            .function("get_default_bone_pivot", &["bone", "axis"], |ctx, args| {
                let bone = string(ctx, args, 0)?;
                let axis = number(ctx, args, 1)? as i32;
                let origin = ctx.animation_info().map_or([0.0; 3], |i| i.bone_origin(&bone));
                let component = match axis {
                    ..=0 => origin[0],
                    1 => origin[1],
                    _ => origin[2],
                };
                Ok(Value::Number(component))
            })
            .function("bone_aabb", &["bone"], |_, _| {
                Ok(Value::object([("min", xyz([-1.0; 3])), ("max", xyz([1.0; 3]))]))
            })
    }

    /// Registers a host function under `name`.
    pub fn function(
        mut self,
        name: &str,
        params: &[&str],
        f: impl Fn(&mut Context, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(name.to_string(), Value::native(params, f));
        self
    }

    /// Registers a constant field.
    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn number(self, name: &str, n: f32) -> Self { self.value(name, n) }

    pub fn boolean(self, name: &str, b: bool) -> Self { self.value(name, b) }

    pub fn string(self, name: &str, s: &str) -> Self { self.value(name, s) }

    /// `query.get_name` answers with this identifier.
    pub fn name(self, id: impl Into<String>) -> Self {
        let id: String = id.into();
        self.function("get_name", &[], move |_, _| Ok(Value::String(id.clone())))
    }

    /// `query.position(axis)` answers with one component: 0 → x, 1 → y,
    /// 2 → z, anything else 0.
    pub fn position(self, position: [f32; 3]) -> Self {
        self.function("position", &["axis"], move |ctx, args| {
            let axis = number(ctx, args, 0)? as i32;
            let component = match axis {
                0..=2 => position[axis as usize],
                _ => 0.0,
            };
            Ok(Value::Number(component))
        })
    }

    pub fn build(self) -> Value {
        Value::Object(Arc::new(self.fields))
    }

    fn animation(self, name: &str, f: fn(Option<&AnimationInfo>) -> Value) -> Self {
        self.function(name, &[], move |ctx, _| Ok(f(ctx.animation_info())))
    }

    fn bone(self, name: &str, f: fn(Option<&AnimationInfo>, &str) -> Value) -> Self {
        self.function(name, &["bone"], move |ctx, args| {
            let bone = string(ctx, args, 0)?;
            Ok(f(ctx.animation_info(), &bone))
        })
    }
}

// ─── Standard queries ─────────────────────────────────────────────────────────

/// Every argument after the first equals the first.
fn all(ctx: &mut Context, args: &[Value]) -> Result<bool, RuntimeError> {
    let Some((first, rest)) = args.split_first() else { return Ok(true) };
    for arg in rest {
        if !arg.equals(ctx, first)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Some argument after the first equals the first.
fn any(ctx: &mut Context, args: &[Value]) -> Result<bool, RuntimeError> {
    let Some((first, rest)) = args.split_first() else { return Ok(false) };
    for arg in rest {
        if arg.equals(ctx, first)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn approx_eq(ctx: &mut Context, args: &[Value]) -> Result<bool, RuntimeError> {
    let Some((first, rest)) = args.split_first() else { return Ok(true) };
    let first = first.as_number(ctx)?;
    for arg in rest {
        if (arg.as_number(ctx)? - first).abs() >= APPROX_EPSILON {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Arrays count their elements, everything else counts once.
fn count(args: &[Value]) -> f32 {
    args.iter()
        .map(|arg| match arg {
            Value::Array(items) => items.len(),
            _ => 1,
        })
        .sum::<usize>() as f32
}

fn log(ctx: &mut Context, args: &[Value]) -> Result<Value, RuntimeError> {
    let parts = args.iter().map(|arg| arg.as_string(ctx)).collect::<Result<Vec<_>, _>>()?;
    tracing::info!(target: "molang::query", "{}", parts.join(" "));
    Ok(Value::Null)
}

fn frame_time(info: Option<&AnimationInfo>) -> Value {
    Value::Number(info.map_or(DEFAULT_FRAME_TIME, |i| i.delta_time))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
