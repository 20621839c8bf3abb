use thiserror::Error;

use crate::pptx::PptxError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Pptx(#[from] PptxError),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("notification failure: {0}")]
    Notification(String),
    #[error("search failure: {0}")]
    Search(String),
    #[error("agent invocation throttled")]
    Throttled,
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("no action handler for function `{0}`")]
    UnknownFunction(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("throttled: {message}")]
    Throttled { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// User-safe notice for surfacing a collaborator failure without
    /// leaking internals. Failures are non-fatal: no state survives a
    /// failed attempt, so a retry is always safe.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => {
                "A backing service is temporarily unavailable. Please retry shortly."
            }
            Self::Throttled { .. } => {
                "The agent is under heavy load right now. Wait a minute and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Throttled { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Storage(message)
            | ApplicationError::Notification(message)
            | ApplicationError::Search(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Throttled => Self::Throttled {
                message: "agent invocation throttled".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Pptx(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Serialization(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::UnknownFunction(function) => Self::Internal {
                message: format!("no action handler for function `{function}`"),
                correlation_id: "unassigned".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, InterfaceError};

    #[test]
    fn storage_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Storage("bucket unreachable".to_owned()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::ServiceUnavailable { ref correlation_id, .. } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "A backing service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn throttled_error_carries_the_retry_notice() {
        let interface = ApplicationError::Throttled.into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Throttled { .. }));
        assert_eq!(
            interface.user_message(),
            "The agent is under heavy load right now. Wait a minute and try again."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing bucket".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
