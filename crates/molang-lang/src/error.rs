/// Error codes prefixed by phase: P = parser, R = runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Parser
    P001, // unknown leading character
    P002, // unresolved operand or leftover tokens
    P003, // malformed number literal
    P004, // malformed loop / for_each

    // Runtime
    R001, // field access on a value without fields
    R002, // undefined global
    R003, // for_each over a non-array
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::R001 => "R001",
            Self::R002 => "R002",
            Self::R003 => "R003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal parse failure. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{code}] {line}:{column}: {message}")]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::R001, message)
    }

    pub fn undefined_global(name: &str) -> Self {
        Self::new(ErrorCode::R002, format!("no global with the name `{name}`"))
    }

    pub fn shape_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::R003, message)
    }
}
