use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RuntimeError;
use crate::runtime::context::Context;
use crate::syntax::ast::Script;

/// Host function signature. Receives the evaluated call arguments.
pub type NativeFn = dyn Fn(&mut Context, &[Value]) -> Result<Value, RuntimeError> + Send + Sync;

// ─── Value ────────────────────────────────────────────────────────────────────

/// Every Molang value. `clone()` is a handle copy: a cloned `Dictionary` still
/// points at the same storage. Use [`Value::deep_copy`] for value semantics.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Number(f32),
    Boolean(bool),
    String(String),
    Array(Vec<Value>),
    /// Read-only record. Field reads hand out copies.
    Object(Arc<HashMap<String, Value>>),
    /// Mutable, auto-vivifying record (`temp`, `variable`, `context`).
    Dictionary(Dictionary),
    Function(Function),
}

impl Value {
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Arc::new(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn native(
        params: &[&str],
        f: impl Fn(&mut Context, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        Value::Function(Function::native(params, f))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Dictionary(_) => "dictionary",
            Value::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Structural copy. Dictionaries get fresh storage; functions stay shared
    /// because they are immutable.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_copy).collect()),
            Value::Object(fields) => Value::Object(Arc::new(
                fields.iter().map(|(k, v)| (k.clone(), v.deep_copy())).collect(),
            )),
            Value::Dictionary(dict) => Value::Dictionary(dict.deep_copy()),
            other => other.clone(),
        }
    }

    // ─── Coercions ───────────────────────────────────────────────────────────

    pub fn as_number(&self, ctx: &mut Context) -> Result<f32, RuntimeError> {
        Ok(match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => if *b { 1.0 } else { 0.0 },
            Value::String(s) => parse_number(s),
            Value::Array(_) | Value::Object(_) | Value::Dictionary(_) | Value::Null => 0.0,
            Value::Function(f) => return f.call(ctx, &[])?.as_number(ctx),
        })
    }

    pub fn as_boolean(&self, ctx: &mut Context) -> Result<bool, RuntimeError> {
        Ok(match self {
            Value::Number(n) => *n != 0.0,
            Value::Boolean(b) => *b,
            Value::String(s) => !(s.contains("false") || s.contains('0')),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) | Value::Dictionary(_) => true,
            Value::Null => false,
            Value::Function(f) => return f.call(ctx, &[])?.as_boolean(ctx),
        })
    }

    pub fn as_string(&self, ctx: &mut Context) -> Result<String, RuntimeError> {
        Ok(match self {
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) | Value::Dictionary(_) | Value::Null => String::new(),
            Value::Function(f) => return f.call(ctx, &[])?.as_string(ctx),
        })
    }

    // ─── Fields ──────────────────────────────────────────────────────────────

    /// Reads `name` from this value. Arrays only answer to `[i]` keys, and a
    /// dictionary read creates a `Null` entry when the key is missing. Objects
    /// are read-only, so their fields come back as copies.
    pub fn field(&self, ctx: &mut Context, name: &str) -> Result<Value, RuntimeError> {
        match self {
            Value::Array(items) => Ok(array_element(items, name).cloned().unwrap_or_default()),
            Value::Object(fields) => Ok(fields.get(name).map(Value::deep_copy).unwrap_or_default()),
            Value::Dictionary(dict) => Ok(dict.get_or_insert_null(name)),
            Value::Function(f) => f.call(ctx, &[])?.field(ctx, name),
            Value::Number(_) | Value::Boolean(_) | Value::String(_) | Value::Null => Err(
                RuntimeError::type_error(format!("{} has no field `{name}`", self.type_name())),
            ),
        }
    }

    // ─── Equality ────────────────────────────────────────────────────────────

    /// Molang `==`. Dispatches on the left operand; scalars compare against the
    /// right side coerced to their own kind.
    pub fn equals(&self, ctx: &mut Context, other: &Value) -> Result<bool, RuntimeError> {
        if let Value::Function(f) = self {
            let resolved = f.call(ctx, &[])?;
            return resolved.equals(ctx, other);
        }
        if let Value::Function(f) = other {
            let resolved = f.call(ctx, &[])?;
            return self.equals(ctx, &resolved);
        }

        match self {
            Value::Number(n) => Ok(*n == other.as_number(ctx)?),
            Value::Boolean(b) => Ok(*b == other.as_boolean(ctx)?),
            Value::String(s) => Ok(*s == other.as_string(ctx)?),
            Value::Null => Ok(other.is_null()),
            Value::Array(items) => {
                let Value::Array(other_items) = other else { return Ok(false) };
                if items.len() != other_items.len() {
                    return Ok(false);
                }
                for (a, b) in items.iter().zip(other_items) {
                    if !a.equals(ctx, b)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Object(_) | Value::Dictionary(_) => {
                // Snapshots keep dictionary locks out of nested comparisons.
                let (Some(mine), Some(theirs)) = (self.record_entries(), other.record_entries()) else {
                    return Ok(false);
                };
                if mine.len() != theirs.len() {
                    return Ok(false);
                }
                let theirs: HashMap<String, Value> = theirs.into_iter().collect();
                for (key, value) in &mine {
                    let Some(other_value) = theirs.get(key) else { return Ok(false) };
                    if !value.equals(ctx, other_value)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Function(_) => Ok(false),
        }
    }

    fn record_entries(&self) -> Option<Vec<(String, Value)>> {
        match self {
            Value::Object(fields) => Some(fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Value::Dictionary(dict) => Some(dict.entries()),
            _ => None,
        }
    }
}

/// `[i]` lookup with clamping: negative indices read slot 0, overlong ones wrap.
fn array_element<'a>(items: &'a [Value], key: &str) -> Option<&'a Value> {
    let index: i64 = key.strip_prefix('[')?.strip_suffix(']')?.trim().parse().ok()?;
    if items.is_empty() {
        return None;
    }
    let len = items.len() as i64;
    let index = if index < 0 { 0 } else if index >= len { index % len } else { index };
    items.get(index as usize)
}

/// Formats like Java's `Float.toString`: always a fractional part, and
/// scientific notation outside `[1e-3, 1e7)`.
/// Lenient numeric parse for string coercion. Accepts a trailing float or
/// double suffix; anything unparseable reads as 0.
fn parse_number(text: &str) -> f32 {
    let text = text.trim();
    let text = text.strip_suffix(['f', 'F', 'd', 'D']).unwrap_or(text);
    text.parse().unwrap_or(0.0)
}

pub fn format_number(n: f32) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
    }
    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = format!("{n}");
        return if text.contains('.') { text } else { format!("{text}.0") };
    }
    let text = format!("{n:E}");
    match text.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => format!("{mantissa}.0E{exponent}"),
        _ => text,
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self { Value::Number(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Boolean(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self { Value::Array(items) }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self { Value::Dictionary(dict) }
}

/// Human-readable rendering for hosts and logs. Unlike `as_string`, records
/// and arrays print their contents. Keys are sorted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(_) | Value::Dictionary(_) => {
                let mut entries = self.record_entries().unwrap_or_default();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Function(func) => write!(f, "<function({})>", func.params.join(", ")),
        }
    }
}

// ─── Dictionary ───────────────────────────────────────────────────────────────

/// Shared handle to mutable record storage. The lock is only taken for single
/// map operations, never across evaluation.
#[derive(Clone, Default)]
pub struct Dictionary(Arc<Mutex<HashMap<String, Value>>>);

impl Dictionary {
    pub fn new() -> Self { Self::default() }

    pub fn from_map(map: HashMap<String, Value>) -> Self {
        Self(Arc::new(Mutex::new(map)))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.lock().get(key).cloned()
    }

    /// Returns the stored value, inserting `Null` first if the key is new.
    pub fn get_or_insert_null(&self, key: &str) -> Value {
        self.0.lock().entry(key.to_string()).or_default().clone()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.0.lock().insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.lock().contains_key(key)
    }

    pub fn len(&self) -> usize { self.0.lock().len() }

    pub fn is_empty(&self) -> bool { self.0.lock().is_empty() }

    /// Snapshot of every entry as handle copies.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn deep_copy(&self) -> Dictionary {
        let copied = self.entries().into_iter().map(|(k, v)| (k, v.deep_copy())).collect();
        Dictionary::from_map(copied)
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &Dictionary) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = self.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        f.debug_map().entries(entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

// ─── Function ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Body {
    Script(Arc<Script>),
    Native(Arc<NativeFn>),
}

/// Callable value: named parameters plus either a compiled script or a host closure.
#[derive(Clone)]
pub struct Function {
    pub params: Arc<[String]>,
    pub body: Body,
}

impl Function {
    pub fn script(params: &[&str], script: Arc<Script>) -> Self {
        Self { params: params.iter().map(|p| p.to_string()).collect(), body: Body::Script(script) }
    }

    pub fn native(
        params: &[&str],
        f: impl Fn(&mut Context, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        Self { params: params.iter().map(|p| p.to_string()).collect(), body: Body::Native(Arc::new(f)) }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            Body::Script(_) => "script",
            Body::Native(_) => "native",
        };
        f.debug_struct("Function").field("params", &self.params).field("body", &kind).finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
