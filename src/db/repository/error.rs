//! Error types for repository operations.
//!
//! Every error carries a structured [`ErrorContext`] so failures surface
//! the operation, entity, and id involved without string parsing.

use std::fmt;

/// Convenience alias returned by every repository method.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context attached to every [`RepositoryError`].
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the failed operation ("apply_plan", "append_event", ...).
    pub operation: Option<String>,
    /// Kind of entity involved ("visit", "researcher", ...).
    pub entity: Option<String>,
    /// Id of the entity, rendered as a string.
    pub entity_id: Option<String>,
    /// Free-form extra detail.
    pub details: Option<String>,
    /// Whether retrying the same call may succeed.
    pub retryable: bool,
}

impl ErrorContext {
    /// Start a context naming the failed operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Flag the error as worth retrying.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("operation", self.operation.as_deref()),
            ("entity", self.entity.as_deref()),
            ("id", self.entity_id.as_deref()),
            ("details", self.details.as_deref()),
        ];
        write!(f, "[")?;
        let mut first = true;
        for (name, value) in fields {
            if let Some(value) = value {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", name, value)?;
                first = false;
            }
        }
        if self.retryable {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "retryable=true")?;
        }
        write!(f, "]")
    }
}

/// Errors produced by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },

    /// Data validation failed before or after a storage operation.
    #[error("Data validation error: {message} {context}")]
    ValidationError {
        message: String,
        context: ErrorContext,
    },

    /// A multi-step mutation could not be applied atomically.
    #[error("Transaction error: {message} {context}")]
    TransactionError {
        message: String,
        context: ErrorContext,
    },

    /// Internal/unexpected errors.
    #[error("Internal error: {message} {context}")]
    InternalError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::not_found_with_context(message, ErrorContext::default())
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_context(message, ErrorContext::default())
    }

    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ValidationError {
            message: message.into(),
            context,
        }
    }

    /// Atomic mutation failures leave the store unchanged, so they are
    /// always marked retryable.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::internal_with_context(message, ErrorContext::default())
    }

    pub fn internal_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InternalError {
            message: message.into(),
            context,
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::InternalError { context, .. } => context,
        }
    }

    /// Stamp the operation name onto the context, overwriting any prior one.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        match &mut self {
            Self::NotFound { context, .. }
            | Self::ValidationError { context, .. }
            | Self::TransactionError { context, .. }
            | Self::InternalError { context, .. } => {
                context.operation = Some(operation.into());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let context = ErrorContext::new("apply_plan")
            .with_entity("visit")
            .with_entity_id(17);
        let err = RepositoryError::not_found_with_context("visit missing", context);
        let rendered = err.to_string();
        assert!(rendered.contains("operation=apply_plan"));
        assert!(rendered.contains("entity=visit"));
        assert!(rendered.contains("id=17"));
    }

    #[test]
    fn test_transaction_errors_are_retryable() {
        assert!(RepositoryError::transaction("write failed").is_retryable());
        assert!(!RepositoryError::not_found("gone").is_retryable());
    }

    #[test]
    fn test_with_operation_overwrites() {
        let err = RepositoryError::validation("bad range").with_operation("create_pattern");
        assert_eq!(err.context().operation.as_deref(), Some("create_pattern"));
    }
}
