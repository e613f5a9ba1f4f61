//! Error types for vaultres operations.

use thiserror::Error;

/// Result type alias using [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while managing resources.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Object was not found on the server.
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource id or API path does not have the expected shape.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// Offending path
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Attribute value failed validation or has the wrong type.
    #[error("invalid value for {attribute}: {reason}")]
    InvalidAttribute {
        /// Attribute name
        attribute: String,
        /// What was wrong with it
        reason: String,
    },

    /// Configuration names an attribute the schema does not declare.
    #[error("unsupported attribute: {0}")]
    UnknownAttribute(String),

    /// A required attribute was not configured.
    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    /// Operation is not supported by this resource.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Server answered with a non-success status.
    #[error("Error making API request. Code: {status}. Errors: {}", .errors.join(", "))]
    Api {
        /// HTTP status code
        status: u16,
        /// Messages from the `errors` array of the response body
        errors: Vec<String>,
    },

    /// A response field did not decode to the expected type.
    #[error("expected {field} {value} to be a number, isn't")]
    Decode {
        /// Response field name
        field: String,
        /// Raw value as returned by the server
        value: String,
    },

    /// Resource operation failed with context.
    #[error("{resource}: {operation} {id}: {source}")]
    ResourceOperation {
        /// Resource type name
        resource: String,
        /// Operation name (create, read, delete, etc.)
        operation: String,
        /// Resource id or API path
        id: String,
        /// Underlying error
        #[source]
        source: Box<ProviderError>,
    },

    /// HTTP transport error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Creates a resource operation error with context.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultres::ProviderError;
    ///
    /// let err = ProviderError::NotFound("auth/approle/role/web".to_string());
    /// let wrapped = ProviderError::resource_op(
    ///     "vault_approle_auth_backend_role",
    ///     "read",
    ///     "auth/approle/role/web",
    ///     err,
    /// );
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "vault_approle_auth_backend_role: read auth/approle/role/web: not found: auth/approle/role/web"
    /// );
    /// ```
    pub fn resource_op(
        resource: impl Into<String>,
        operation: impl Into<String>,
        id: impl Into<String>,
        err: ProviderError,
    ) -> Self {
        Self::ResourceOperation {
            resource: resource.into(),
            operation: operation.into(),
            id: id.into(),
            source: Box::new(err),
        }
    }

    /// Shorthand for [`ProviderError::InvalidAttribute`].
    pub fn invalid(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error means the object is absent on the server.
    ///
    /// Looks through [`ProviderError::ResourceOperation`] wrappers. A 404
    /// from the API counts as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { status, .. } => *status == 404,
            Self::ResourceOperation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}
