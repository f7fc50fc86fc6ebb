use lago_lang::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error, PartialEq)]
pub enum CompileErrorKind {
    #[error("unknown variable `{0}`")]
    UnknownVariable(SmolStr),
    #[error("unknown function `{0}`")]
    UnknownFunction(SmolStr),
    #[error("`{0}` is already declared in this scope")]
    DuplicateLocal(SmolStr),
    #[error("function `{0}` is already defined")]
    FunctionRedefined(SmolStr),
    #[error("`{name}` takes {expected} argument(s), but {got} were given")]
    ArityMismatch {
        name: SmolStr,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Error, PartialEq)]
#[error("{kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
    pub column: u32,
    pub len: usize,
}

impl Diagnostic for CompileError {
    fn message(&self) -> String {
        self.kind.to_string()
    }

    fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn len(&self) -> usize {
        self.len
    }
}
