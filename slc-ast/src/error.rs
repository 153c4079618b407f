// Error types for AST construction and template specialization

use slc_diagnostics::{codes, Diagnostic};
use thiserror::Error;

/// Result type for AST builder operations
pub type AstResult<T> = Result<T, AstError>;

/// Errors raised while building a module
///
/// These indicate bugs in the calling host (reserved names, malformed
/// specializations), so builders return them immediately instead of trying to
/// recover.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AstError {
    #[error("`{0}` is a reserved word, which should not be used")]
    LexicalCollision(String),

    #[error("`{0}` is already declared")]
    DuplicateDeclaration(String),

    #[error("{0}: a concrete type is required here")]
    NullTypeBinding(String),

    #[error("argument {index} does not satisfy concept `{concept}`")]
    ConceptMismatch { index: usize, concept: String },

    #[error("expected {expected} template arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("return type specializer produced no type for `{0}`")]
    NullReturnType(String),

    #[error("qualifier violation: {0}")]
    QualifierViolation(String),

    #[error("vector type with element `{element}` and count {count} does not exist")]
    UnknownVectorType { element: String, count: u32 },

    #[error("matrix type with element `{element}` and size {n}x{n} does not exist")]
    UnknownMatrixType { element: String, n: u32 },

    #[error("unknown intrinsic `{name}`")]
    UnknownIntrinsic { name: String, suggestions: Vec<String> },

    #[error("structure field `{field}` may not have resource type `{ty}`")]
    ResourceField { field: String, ty: String },
}

impl AstError {
    pub fn code(&self) -> &'static str {
        match self {
            AstError::LexicalCollision(_) => codes::LEXICAL_COLLISION,
            AstError::DuplicateDeclaration(_) => codes::DUPLICATE_DECLARATION,
            AstError::NullTypeBinding(_) => codes::NULL_TYPE_BINDING,
            AstError::ConceptMismatch { .. } => codes::CONCEPT_MISMATCH,
            AstError::ArityMismatch { .. } => codes::ARITY_MISMATCH,
            AstError::NullReturnType(_) => codes::NULL_RETURN_TYPE,
            AstError::QualifierViolation(_) => codes::QUALIFIER_VIOLATION,
            AstError::UnknownVectorType { .. } | AstError::UnknownMatrixType { .. } => {
                codes::UNKNOWN_NAMED_TYPE
            }
            AstError::UnknownIntrinsic { .. } => codes::UNKNOWN_INTRINSIC,
            AstError::ResourceField { .. } => codes::INVALID_FIELD_TYPE,
        }
    }

    /// Render as a diagnostic, attaching "did you mean" hints where available
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::fatal(self.code(), self.to_string());
        match self {
            AstError::UnknownIntrinsic { suggestions, .. } if !suggestions.is_empty() => {
                diag.with_help(format!("did you mean `{}`?", suggestions.join("`, `")))
            }
            _ => diag,
        }
    }
}
