use thiserror::Error;

/// Result type for fakeforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fakeforge operations
///
/// Every resolution failure is local to one target: the batch runner reports it
/// against that target and moves on to the next one.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Syntax errors when parsing Go source
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// The symbol provider could not load a namespace
    #[error("Failed to load package {path}: {message}")]
    NamespaceLoadFailed { path: String, message: String },

    /// The requested declaration does not exist in the namespace
    #[error("Cannot find {name} in package {namespace}")]
    TargetNotFound { name: String, namespace: String },

    /// The declaration exists but is neither an interface nor a function type
    #[error("{name} is a {kind}; only interfaces and function types can be faked")]
    UnsupportedTargetKind { name: String, kind: String },

    /// An embedded interface member could not be resolved to an interface
    #[error("Cannot resolve embedded member {member} of {target}")]
    UnresolvableEmbedding { target: String, member: String },

    /// A parameter or return type has no valid rendering
    #[error("Cannot render a type in method {method}{signature}: {reason}")]
    UnresolvableType {
        method: String,
        signature: String,
        reason: String,
    },

    /// The renderer met a type shape it does not support
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a parse error
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates a namespace load error
    pub fn namespace_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NamespaceLoadFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a target-not-found error
    pub fn target_not_found(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::TargetNotFound {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Creates an unsupported-target-kind error
    pub fn unsupported_target_kind(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedTargetKind {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Creates an unresolvable-embedding error
    pub fn unresolvable_embedding(target: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnresolvableEmbedding {
            target: target.into(),
            member: member.into(),
        }
    }

    /// Creates an unresolvable-type error for one method
    pub fn unresolvable_type(
        method: impl Into<String>,
        signature: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableType {
            method: method.into(),
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported type error
    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Short machine-readable category used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::Parse { .. } => "parse",
            Self::NamespaceLoadFailed { .. } => "namespace_load_failed",
            Self::TargetNotFound { .. } => "target_not_found",
            Self::UnsupportedTargetKind { .. } => "unsupported_target_kind",
            Self::UnresolvableEmbedding { .. } => "unresolvable_embedding",
            Self::UnresolvableType { .. } => "unresolvable_type",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::InvalidInput(_) => "invalid_input",
            Self::WithContext { .. } => "with_context",
            Self::Other(_) => "other",
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_not_found_message() {
        let err = Error::target_not_found("Reader", "example.com/io");
        assert_eq!(
            err.to_string(),
            "Cannot find Reader in package example.com/io"
        );
        assert_eq!(err.kind(), "target_not_found");
    }

    #[test]
    fn test_unresolvable_type_carries_signature() {
        let err = Error::UnresolvableType {
            method: "Do".to_string(),
            signature: "(x struct{})".to_string(),
            reason: "unsupported".to_string(),
        };
        assert!(err.to_string().contains("Do(x struct{})"));
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = io.context("reading go.mod").unwrap_err();
        assert_eq!(err.to_string(), "reading go.mod: missing");
    }
}
