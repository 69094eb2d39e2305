use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::RuntimeError;
use crate::namespaces::math::{self, RandomSource};
use crate::runtime::animation::AnimationInfo;
use crate::runtime::value::{Dictionary, Value};

/// Embedder limits applied during evaluation.
#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    /// Upper bound on iterations of a single `loop` / `for_each`.
    pub loop_limit: Option<u32>,
}

/// Evaluation state: shared globals, the scoped `temp` dictionary,
/// control-flow flags and the animation-info stack.
///
/// `temp` is snapshotted on [`Context::start_scope`] and restored on
/// [`Context::end_scope`], so writes inside a block never leak out of it.
pub struct Context {
    globals: Arc<RwLock<HashMap<String, Value>>>,
    aliases: Arc<HashMap<String, String>>,
    temp: Dictionary,
    scopes: Vec<Dictionary>,
    break_flag: bool,
    continue_flag: bool,
    return_value: Option<Value>,
    animation_infos: Vec<AnimationInfo>,
    config: ContextConfig,
}

impl Context {
    pub fn new(query: Value, random: impl RandomSource + 'static) -> Self {
        Self::with_config(query, random, ContextConfig::default())
    }

    pub fn with_config(query: Value, random: impl RandomSource + 'static, config: ContextConfig) -> Self {
        let mut globals = HashMap::new();
        globals.insert("math".to_string(), math::build(random));
        globals.insert("query".to_string(), query);
        globals.insert("variable".to_string(), Value::Dictionary(Dictionary::new()));

        let aliases = [("c", "context"), ("q", "query"), ("t", "temp"), ("v", "variable")]
            .into_iter()
            .map(|(alias, name)| (alias.to_string(), name.to_string()))
            .collect();

        Self {
            globals: Arc::new(RwLock::new(globals)),
            aliases: Arc::new(aliases),
            temp: Dictionary::new(),
            scopes: Vec::new(),
            break_flag: false,
            continue_flag: false,
            return_value: None,
            animation_infos: Vec::new(),
            config,
        }
    }

    /// A sibling context sharing globals and aliases, with fresh temp storage,
    /// no open scopes and cleared flags. The animation stack is copied.
    pub fn copy(&self) -> Self {
        Self {
            globals: Arc::clone(&self.globals),
            aliases: Arc::clone(&self.aliases),
            temp: Dictionary::new(),
            scopes: Vec::new(),
            break_flag: false,
            continue_flag: false,
            return_value: None,
            animation_infos: self.animation_infos.clone(),
            config: self.config.clone(),
        }
    }

    pub fn config(&self) -> &ContextConfig { &self.config }

    // ─── Scopes ───────────────────────────────────────────────────────────────

    pub fn start_scope(&mut self) {
        let snapshot = self.temp.deep_copy();
        let outer = std::mem::replace(&mut self.temp, snapshot);
        self.scopes.push(outer);
        tracing::trace!(depth = self.scopes.len(), "start scope");
    }

    /// Restores the `temp` saved by the matching `start_scope`. A no-op when
    /// no scope is open.
    pub fn end_scope(&mut self) {
        if let Some(outer) = self.scopes.pop() {
            self.temp = outer;
            tracing::trace!(depth = self.scopes.len(), "end scope");
        }
    }

    pub fn scope_depth(&self) -> usize { self.scopes.len() }

    // ─── Globals ──────────────────────────────────────────────────────────────

    /// Looks up `name` directly, then through the alias table. `temp` and `t`
    /// always resolve to the live temp dictionary.
    pub fn get_global(&self, name: &str) -> Result<Value, RuntimeError> {
        if name == "temp" || name == "t" {
            return Ok(Value::Dictionary(self.temp.clone()));
        }
        let globals = self.globals.read();
        if let Some(value) = globals.get(name) {
            return Ok(value.clone());
        }
        self.aliases
            .get(name)
            .and_then(|target| globals.get(target))
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_global(name))
    }

    pub fn set_global(&self, name: impl Into<String>, value: Value) {
        self.globals.write().insert(name.into(), value);
    }

    pub fn temp_dict(&self) -> Dictionary { self.temp.clone() }

    pub fn variable_dict(&self) -> Option<Value> {
        self.globals.read().get("variable").cloned()
    }

    pub fn set_variable_dict(&self, dict: Value) {
        self.set_global("variable", dict);
    }

    pub fn set_context_dict(&self, dict: Value) {
        self.set_global("context", dict);
    }

    // ─── Control flow ─────────────────────────────────────────────────────────

    pub fn break_flag(&self) -> bool { self.break_flag }

    pub fn set_break_flag(&mut self, value: bool) { self.break_flag = value; }

    pub fn continue_flag(&self) -> bool { self.continue_flag }

    pub fn set_continue_flag(&mut self, value: bool) { self.continue_flag = value; }

    pub fn return_flag(&self) -> bool { self.return_value.is_some() }

    pub fn return_value(&self) -> Option<&Value> { self.return_value.as_ref() }

    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = Some(value);
    }

    /// Clears the return flag, handing back the pending value (or `Null`).
    pub fn take_return_value(&mut self) -> Value {
        self.return_value.take().unwrap_or_default()
    }

    // ─── Animation info ───────────────────────────────────────────────────────

    pub fn animation_info(&self) -> Option<&AnimationInfo> {
        self.animation_infos.last()
    }

    /// Pushes a copy of the current top (or a default entry) and returns it
    /// for the caller to fill in.
    pub fn push_animation_info(&mut self) -> &mut AnimationInfo {
        let info = self.animation_infos.last().cloned().unwrap_or_default();
        self.animation_infos.push(info);
        let top = self.animation_infos.len() - 1;
        &mut self.animation_infos[top]
    }

    pub fn pop_animation_info(&mut self) -> Option<AnimationInfo> {
        self.animation_infos.pop()
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        use rand::SeedableRng;
        let query = crate::namespaces::query::QueryBuilder::standard().build();
        Self::new(query, rand::rngs::StdRng::seed_from_u64(7))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
