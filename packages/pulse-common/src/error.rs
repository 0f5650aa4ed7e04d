//! Common error types
//!
//! Shared error handling across pulse packages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common error type for pulse operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PulseError {
    /// Instrumentation channel errors (a channel failed to wire up)
    ChannelError {
        message: String,
        channel: Option<String>,
    },
    /// Metrics store / repository errors
    StoreError {
        message: String,
        metric: Option<String>,
    },
    /// Notification dispatch errors
    NotificationError {
        message: String,
        target: Option<String>,
    },
    /// Configuration errors
    ConfigError {
        message: String,
        field: Option<String>,
    },
    /// SLA lifecycle errors (invalid transitions, unknown identifiers)
    LifecycleError {
        message: String,
        sla_id: Option<String>,
    },
    /// Generic errors
    Generic { message: String },
}

impl PulseError {
    /// Create a new channel error
    pub fn channel<S: Into<String>>(message: S) -> Self {
        Self::ChannelError {
            message: message.into(),
            channel: None,
        }
    }

    /// Create a new channel error naming the channel
    pub fn channel_named<S: Into<String>, C: Into<String>>(message: S, channel: C) -> Self {
        Self::ChannelError {
            message: message.into(),
            channel: Some(channel.into()),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::StoreError {
            message: message.into(),
            metric: None,
        }
    }

    /// Create a new store error with the metric being queried
    pub fn store_with_metric<S: Into<String>, M: Into<String>>(message: S, metric: M) -> Self {
        Self::StoreError {
            message: message.into(),
            metric: Some(metric.into()),
        }
    }

    /// Create a new notification error
    pub fn notification<S: Into<String>>(message: S) -> Self {
        Self::NotificationError {
            message: message.into(),
            target: None,
        }
    }

    /// Create a new notification error with the target that failed
    pub fn notification_with_target<S: Into<String>, T: Into<String>>(
        message: S,
        target: T,
    ) -> Self {
        Self::NotificationError {
            message: message.into(),
            target: Some(target.into()),
        }
    }

    /// Create a new config error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new config error with field
    pub fn config_with_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::ConfigError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new lifecycle error
    pub fn lifecycle<S: Into<String>>(message: S) -> Self {
        Self::LifecycleError {
            message: message.into(),
            sla_id: None,
        }
    }

    /// Create a new lifecycle error naming the SLA
    pub fn lifecycle_for<S: Into<String>, I: Into<String>>(message: S, sla_id: I) -> Self {
        Self::LifecycleError {
            message: message.into(),
            sla_id: Some(sla_id.into()),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        match self {
            Self::ChannelError { message, .. } => message,
            Self::StoreError { message, .. } => message,
            Self::NotificationError { message, .. } => message,
            Self::ConfigError { message, .. } => message,
            Self::LifecycleError { message, .. } => message,
            Self::Generic { message } => message,
        }
    }
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelError { message, channel } => {
                write!(f, "Channel error: {}", message)?;
                if let Some(channel) = channel {
                    write!(f, " (channel: {})", channel)?;
                }
                Ok(())
            }
            Self::StoreError { message, metric } => {
                write!(f, "Store error: {}", message)?;
                if let Some(metric) = metric {
                    write!(f, " (metric: {})", metric)?;
                }
                Ok(())
            }
            Self::NotificationError { message, target } => {
                write!(f, "Notification error: {}", message)?;
                if let Some(target) = target {
                    write!(f, " (target: {})", target)?;
                }
                Ok(())
            }
            Self::ConfigError { message, field } => {
                write!(f, "Config error: {}", message)?;
                if let Some(field) = field {
                    write!(f, " (field: {})", field)?;
                }
                Ok(())
            }
            Self::LifecycleError { message, sla_id } => {
                write!(f, "Lifecycle error: {}", message)?;
                if let Some(sla_id) = sla_id {
                    write!(f, " (sla: {})", sla_id)?;
                }
                Ok(())
            }
            Self::Generic { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for PulseError {}

/// Result type using PulseError
pub type PulseResult<T> = Result<T, PulseError>;

/// Convert from anyhow::Error to PulseError
impl From<anyhow::Error> for PulseError {
    fn from(err: anyhow::Error) -> Self {
        Self::generic(err.to_string())
    }
}

/// Convert from std::io::Error to PulseError
impl From<std::io::Error> for PulseError {
    fn from(err: std::io::Error) -> Self {
        Self::generic(err.to_string())
    }
}
