//! Shared error type
//!
//! Structured errors carrying an error id, the originating component and
//! operation, for the configuration and storage failures every iReport
//! crate can hit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type IReportResult<T> = Result<T, IReportError>;

/// Extra information attached to an error for logs and operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID, surfaced in logs so a 5xx can be traced without leaking details
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// Component where the error originated
    pub component: String,
    pub operation: Option<String>,
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type shared across the workspace
#[derive(Error, Debug)]
pub enum IReportError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IReportError {
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            IReportError::Config { context, .. } | IReportError::Storage { context, .. } => {
                Some(context)
            }
            IReportError::Io(_) | IReportError::Serialization(_) => None,
        }
    }

    /// Log the error with an appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            IReportError::Config { .. } => {
                let hints = self
                    .context()
                    .map(|c| c.recovery_suggestions.join("; "))
                    .unwrap_or_default();
                error!(error_id = ?error_id, error = %self, hints = %hints, "Configuration error");
            }
            IReportError::Io(_) => {
                warn!(error = %self, "I/O error");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::IReportError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file and IREPORT__* environment"),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::IReportError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::IReportError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}
