use std::sync::Arc;

use crate::runtime::value::Value;

// ─── Script ──────────────────────────────────────────────────────────────────

/// An ordered list of expressions from one `{ ... }` block or a file root,
/// together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct Script {
    pub exprs: Vec<Expr>,
    pub source: Arc<str>,
}

impl Script {
    pub fn new(exprs: Vec<Expr>, source: impl Into<Arc<str>>) -> Self {
        Self { exprs, source: source.into() }
    }
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Constant(Value),
    Operation(Box<Operation>),
    /// `( expr )`
    Parenthesized(Box<Expr>),
    /// Nested `{ ... }` block.
    Block(Arc<Script>),
}

impl Expr {
    pub fn constant(value: Value) -> Self { Expr::Constant(value) }

    pub fn op(op: Operation) -> Self { Expr::Operation(Box::new(op)) }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Expr::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_operation_mut(&mut self) -> Option<&mut Operation> {
        match self {
            Expr::Operation(op) => Some(op),
            _ => None,
        }
    }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Binary operators. All of them take a left and a right operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    Add,
    Sub,
    Mul,
    Div,
    Coalesce,
    Assign,
}

impl BinaryOp {
    pub fn priority(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 13,
            BinaryOp::Add | BinaryOp::Sub => 12,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 10,
            BinaryOp::Eq | BinaryOp::NotEq => 9,
            BinaryOp::And => 5,
            BinaryOp::Or => 4,
            BinaryOp::Coalesce => 3,
            BinaryOp::Assign => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Coalesce => "??",
            BinaryOp::Assign => "=",
        }
    }
}

/// Which operand slots the parser still has to fill for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Complete,
    Left,
    Right,
    LeftRight,
}

/// Operand slots are `Option` because the token collector produces operations
/// before their neighbours are known; priority resolution fills them in.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Named root such as `math`, `v`, `temp`.
    Global(String),
    Break,
    Continue,
    Return(Expr),
    Loop { count: Expr, body: Expr },
    ForEach { slot: Expr, array: Expr, body: Expr },

    /// `target.name`
    Field { target: Option<Expr>, name: String },
    /// `target[index]`
    Index { target: Option<Expr>, index: Expr },
    /// `callee(args...)`
    Call { callee: Option<Expr>, args: Vec<Expr> },
    /// `cond ? then : otherwise`
    Conditional { cond: Option<Expr>, then: Expr, otherwise: Expr },

    /// `!operand`
    Not(Option<Expr>),

    Binary { op: BinaryOp, left: Option<Expr>, right: Option<Expr> },
}

impl Operation {
    pub fn binary(op: BinaryOp) -> Self {
        Operation::Binary { op, left: None, right: None }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Operation::Global(_)
            | Operation::Break
            | Operation::Continue
            | Operation::Return(_)
            | Operation::Loop { .. }
            | Operation::ForEach { .. } => 16,
            Operation::Field { .. } | Operation::Index { .. } | Operation::Call { .. } => 15,
            Operation::Not(_) => 14,
            Operation::Conditional { .. } => 3,
            Operation::Binary { op, .. } => op.priority(),
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operation::Global(_)
            | Operation::Break
            | Operation::Continue
            | Operation::Return(_)
            | Operation::Loop { .. }
            | Operation::ForEach { .. } => Arity::Complete,
            Operation::Field { .. }
            | Operation::Index { .. }
            | Operation::Call { .. }
            | Operation::Conditional { .. } => Arity::Left,
            Operation::Not(_) => Arity::Right,
            Operation::Binary { .. } => Arity::LeftRight,
        }
    }

    /// Mutable access to the left slot of left-only and left-right operations.
    pub fn left_slot(&mut self) -> Option<&mut Option<Expr>> {
        match self {
            Operation::Field { target, .. } | Operation::Index { target, .. } => Some(target),
            Operation::Call { callee, .. } => Some(callee),
            Operation::Conditional { cond, .. } => Some(cond),
            Operation::Binary { left, .. } => Some(left),
            _ => None,
        }
    }

    /// Mutable access to the right slot of right-only and left-right operations.
    pub fn right_slot(&mut self) -> Option<&mut Option<Expr>> {
        match self {
            Operation::Not(operand) => Some(operand),
            Operation::Binary { right, .. } => Some(right),
            _ => None,
        }
    }

    /// A binary operation still waiting for its right operand.
    pub fn is_open_binary(&self) -> bool {
        matches!(self, Operation::Binary { right: None, .. })
    }

    /// Whether a `(` directly after this token starts an argument list.
    pub fn is_callable_position(&self) -> bool {
        matches!(
            self,
            Operation::Field { .. }
                | Operation::Index { .. }
                | Operation::Call { .. }
                | Operation::Conditional { .. }
                | Operation::Global(_)
        )
    }
}
