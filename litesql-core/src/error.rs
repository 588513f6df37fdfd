use crate::NodeKind;
use thiserror::Error;

/// Failures raised by LiteSql itself.
///
/// They travel inside [`crate::Error`] like every other failure. Match on them with
/// `error.downcast_ref::<LiteSqlError>()`.
#[derive(Debug, Error)]
pub enum LiteSqlError {
    /// The expression tree contains a shape that has no SQL translation.
    #[error("Cannot compile {kind} expression: {reason}")]
    Compile { kind: NodeKind, reason: String },
    /// A template did not receive a value for each of its placeholders.
    #[error("Parameter count mismatch: {0}")]
    ParameterCount(String),
    /// Values were provided to a template that cannot bind them.
    #[error("Raw template violation: {0}")]
    RawTemplateViolation(String),
    /// Invalid paging arguments.
    #[error("Invalid page request: {0}")]
    PageSize(String),
    /// Begin/commit/rollback called in the wrong state.
    #[error("Transaction state error: {0}")]
    TransactionState(&'static str),
    /// The dialect identity is not present in the registry.
    #[error("Dialect `{0}` is not registered")]
    ProviderUnregistered(String),
}

impl LiteSqlError {
    pub fn compile(kind: NodeKind, reason: impl Into<String>) -> Self {
        LiteSqlError::Compile {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_compile(&self) -> bool {
        matches!(self, LiteSqlError::Compile { .. })
    }

    pub fn is_parameter_count(&self) -> bool {
        matches!(self, LiteSqlError::ParameterCount(..))
    }

    pub fn is_raw_template_violation(&self) -> bool {
        matches!(self, LiteSqlError::RawTemplateViolation(..))
    }

    pub fn is_page_size(&self) -> bool {
        matches!(self, LiteSqlError::PageSize(..))
    }

    pub fn is_transaction_state(&self) -> bool {
        matches!(self, LiteSqlError::TransactionState(..))
    }

    pub fn is_provider_unregistered(&self) -> bool {
        matches!(self, LiteSqlError::ProviderUnregistered(..))
    }
}

/// Classify an error produced anywhere in the crate.
pub fn lite_sql_error(error: &crate::Error) -> Option<&LiteSqlError> {
    error.downcast_ref::<LiteSqlError>()
}
