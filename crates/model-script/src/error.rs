use kernel_host::KernelError;

/// Position in model source (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Errors from building a model out of procedural source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    #[error("syntax error at {pos}: {message}")]
    Syntax { pos: Position, message: String },

    #[error("unknown function `{name}` at {pos}")]
    UnknownFunction { pos: Position, name: String },

    #[error("unbound name `{name}` at {pos}")]
    UnboundName { pos: Position, name: String },

    #[error("`{name}` expects {expected} argument(s), got {got} (at {pos})")]
    Arity {
        pos: Position,
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("`{name}` argument {index} must be a {expected} (at {pos})")]
    ArgumentType {
        pos: Position,
        name: String,
        index: usize,
        expected: &'static str,
    },

    #[error("model did not produce a solid")]
    NoSolid,

    #[error(transparent)]
    Kernel(#[from] KernelError),
}
