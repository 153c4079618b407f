// Code generation errors

use slc_diagnostics::{codes, Diagnostic};
use thiserror::Error;

pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors that stop code generation
///
/// The first fatal error aborts emission; a failing run never produces
/// partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("invalid semantic `{semantic}` for parameter `{param}` within {stage} stage")]
    InvalidSemantic {
        semantic: String,
        param: String,
        stage: String,
    },

    #[error("{0}")]
    BindingConflict(String),

    #[error("code generator reached an unhandled node: {0}")]
    Unreachable(String),

    #[error("failed to load prelude: {0}")]
    PreludeLoad(String),
}

impl CodegenError {
    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::InvalidSemantic { .. } => codes::INVALID_SEMANTIC,
            CodegenError::BindingConflict(_) => codes::BINDING_CONFLICT,
            CodegenError::Unreachable(_) => codes::CODEGEN_UNREACHABLE,
            CodegenError::PreludeLoad(_) => codes::PRELUDE_LOAD,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::fatal(self.code(), self.to_string())
    }
}
