pub mod error;
pub mod namespaces;
pub mod runtime;
pub mod syntax;

pub use error::{ErrorCode, RuntimeError, SyntaxError};
pub use namespaces::math::RandomSource;
pub use namespaces::query::QueryBuilder;
pub use runtime::animation::{AnimationInfo, BoneTransform, Skeleton};
pub use runtime::context::{Context, ContextConfig};
pub use runtime::value::{Dictionary, Function, Value};
pub use syntax::ast::Script;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Parse Molang source into a reusable [`Script`].
pub fn parse(source: &str) -> Result<Script, SyntaxError> {
    tracing::debug!(len = source.len(), "parsing molang");
    syntax::parser::Parser::new(source).parse()
}

/// Parse and evaluate in one step. Runtime errors are contained by the script
/// and logged; only syntax errors reach the caller.
pub fn eval(source: &str, ctx: &mut Context) -> Result<Value, SyntaxError> {
    Ok(parse(source)?.eval(ctx))
}
