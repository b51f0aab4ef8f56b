//! Error types for gatehouse
//!
//! Errors carry structured context (resource kind, provider, operation) so the
//! orchestrator can log them usefully and decide whether to retry. Per-policy
//! misconfiguration is never an `Error`: it is reported through the policy's
//! own status conditions instead.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for gatehouse operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for a resource or configuration value
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Resource (namespace/name or config section) with the invalid value
        resource: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.connectionLimit.closeDelay")
        field: Option<String>,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Configuration loading error
    #[error("configuration error: {message}")]
    Config {
        /// Description of what failed
        message: String,
    },

    /// The configured backing-store provider has no infrastructure implementation
    #[error("unsupported provider type {provider}")]
    UnsupportedProvider {
        /// Provider type named in the configuration
        provider: String,
    },

    /// Operation is not supported by this client
    #[error("{operation} is not supported: {message}")]
    Unsupported {
        /// Operation that was attempted (e.g., "watch")
        operation: String,
        /// Why it is unsupported
        message: String,
    },

    /// Object substitution or copy-back between schema generations failed
    #[error("conversion error for {kind}: {message}")]
    Conversion {
        /// Object kind being converted
        kind: String,
        /// Description of the mismatch
        message: String,
    },

    /// Infrastructure manager error
    #[error("infrastructure error [{component}]: {message}")]
    Infrastructure {
        /// Component being managed (proxy, ratelimit)
        component: String,
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "store", "runner")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with resource context and field path
    pub fn validation_for_field(
        resource: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an unsupported-provider error
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create a conversion error for an object kind
    pub fn conversion(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Conversion {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create an infrastructure error for a managed component
    pub fn infrastructure(component: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Infrastructure {
            component: component.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Configuration, validation, and contract errors require a fix and are not
    /// retried. Infrastructure and transient Kubernetes errors are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Validation { .. } => false,
            Error::Serialization { .. } => false,
            Error::Config { .. } => false,
            Error::UnsupportedProvider { .. } => false,
            Error::Unsupported { .. } => false,
            Error::Conversion { .. } => false,
            Error::Infrastructure { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Returns true if this is a Kubernetes 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube { source: kube::Error::Api(ae) } if ae.code == 404)
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Internal { context, .. } => Some(context),
            Error::Infrastructure { component, .. } => Some(component),
            _ => None,
        }
    }
}
