//! Error types for the mapfp-rs library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! distinguishes configuration problems (raised before any molecule is
//! touched), input validation problems (raised before any fingerprint is
//! computed), and failures inside the batch workers.

use std::io;

use thiserror::Error;

/// Main result type for mapfp operations.
pub type Result<T> = std::result::Result<T, MapFpError>;

/// Error type for all mapfp operations.
#[derive(Error, Debug)]
pub enum MapFpError {
    /// I/O related errors (config files, input lists, output files)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Line notation parsing errors
    #[error("Parse error in {notation}: {message}")]
    Parse {
        /// Notation being parsed (e.g. "SMILES")
        notation: String,
        /// Error description
        message: String,
        /// Offending input text
        input: Option<String>,
        /// Byte offset of the failure (if available)
        position: Option<usize>,
    },

    /// Molecular graph construction errors
    #[error("Graph error: {message}")]
    Graph {
        /// Error description
        message: String,
        /// Atom or bond that caused the error
        element: Option<String>,
    },

    /// Batch pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
        /// Number of molecules processed before the error
        processed_count: Option<usize>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
        /// Expected value or format
        expected: Option<String>,
        /// Actual value received
        actual: Option<String>,
    },

    /// Worker pool and threading errors
    #[error("Concurrency error: {message}")]
    Concurrency {
        /// Error description
        message: String,
        /// Worker identifier
        thread_id: Option<String>,
    },
}

impl MapFpError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new SMILES parse error
    pub fn smiles(message: impl Into<String>) -> Self {
        Self::Parse {
            notation: "SMILES".to_string(),
            message: message.into(),
            input: None,
            position: None,
        }
    }

    /// Create a new SMILES parse error pointing at a byte offset
    pub fn smiles_at(message: impl Into<String>, input: impl Into<String>, position: usize) -> Self {
        Self::Parse {
            notation: "SMILES".to_string(),
            message: message.into(),
            input: Some(input.into()),
            position: Some(position),
        }
    }

    /// Create a new graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
            element: None,
        }
    }

    /// Create a new graph error naming the offending element
    pub fn graph_element(message: impl Into<String>, element: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
            element: Some(element.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
            processed_count: None,
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a validation error for a single element of the input batch
    pub fn invalid_input(index: usize, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(format!("inputs[{index}]")),
            expected: Some("molecule or parseable SMILES".to_string()),
            actual: None,
        }
    }

    /// Create a new concurrency error
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::Concurrency {
            message: message.into(),
            thread_id: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Io { message, .. } | Self::Pipeline { message, .. } => {
                *message = format!("{}: {}", context.into(), message);
            }
            _ => {}
        }
        self
    }

    /// True for errors raised while checking configuration values.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// True for errors raised while checking the input batch.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<io::Error> for MapFpError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for MapFpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for MapFpError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MapFpError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
