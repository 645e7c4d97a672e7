/*!
Error taxonomy for command dispatch.

  - ValidationError : malformed / missing user input (400)
  - ServiceError    : downstream failures, mapped through one status table
  - CommandError    : everything a command boundary can observe
  - WiringError     : setup defects (a capability nobody provided)

Only `CommandError::status` / `CommandError::public_message` cross the
invocation boundary. Internal error text is logged, never returned.
*/

use thiserror::Error;

use crate::command::manifest::ManifestError;

/// Input validation failure. Display text is user-visible verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing Required options: {}", format_missing(.0))]
    MissingRequired(Vec<String>),

    #[error("Invalid value for --{option}: expected {expected}")]
    InvalidValue {
        option: String,
        expected: String,
    },
}

impl ValidationError {
    pub fn invalid(option: impl Into<String>, expected: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            option: option.into(),
            expected: expected.into(),
        }
    }
}

fn format_missing(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("--{n}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Failure reported by a collaborator service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("throttled")]
    Throttled,

    #[error("timed out")]
    Timeout,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// The one mapping table from downstream failure to envelope status.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Forbidden(_) => 403,
            ServiceError::Throttled => 429,
            ServiceError::Timeout => 504,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Message safe to show a caller. Never includes wrapped error text.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::NotFound(what) => format!("Resource not found: {what}"),
            ServiceError::Forbidden(what) => format!("Authorization failed for {what}"),
            ServiceError::Throttled => "The service is throttling requests; retry later".into(),
            ServiceError::Timeout => "The service did not respond in time".into(),
            ServiceError::Unavailable(_) => "The service is unavailable".into(),
            ServiceError::Internal(_) => {
                "An unexpected error occurred while executing the command".into()
            }
        }
    }
}

/// Everything a command invocation can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("command '{0}' is not implemented")]
    Unimplemented(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl CommandError {
    pub fn status(&self) -> u16 {
        match self {
            CommandError::Validation(_) => 400,
            CommandError::Service(e) => e.status(),
            CommandError::Unimplemented(_) => 501,
            CommandError::UnknownCommand(_) => 404,
            CommandError::Cancelled => 499,
            CommandError::Manifest(_) => 500,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            CommandError::Validation(e) => e.to_string(),
            CommandError::Service(e) => e.public_message(),
            CommandError::Unimplemented(name) => format!("Command '{name}' is not implemented"),
            CommandError::UnknownCommand(name) => format!("Unknown command: {name}"),
            CommandError::Cancelled => "Request was cancelled".into(),
            CommandError::Manifest(ManifestError::Unregistered { type_name, .. }) => {
                format!("Result type '{type_name}' cannot be serialized")
            }
            CommandError::Manifest(ManifestError::Serialize { type_name, .. }) => {
                format!("Failed to serialize result '{type_name}'")
            }
        }
    }
}

/// Setup defects. These abort startup instead of reaching a caller.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("no service registered for capability {0}")]
    Unregistered(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_single() {
        let e = ValidationError::MissingRequired(vec!["data-sets".into()]);
        assert_eq!(e.to_string(), "Missing Required options: --data-sets");
    }

    #[test]
    fn missing_required_multiple_in_order() {
        let e = ValidationError::MissingRequired(vec![
            "subscription".into(),
            "workspace".into(),
            "metric-names".into(),
        ]);
        assert_eq!(
            e.to_string(),
            "Missing Required options: --subscription --workspace --metric-names"
        );
    }

    #[test]
    fn invalid_value_names_option() {
        let e = ValidationError::invalid("app-id", "a GUID");
        assert_eq!(e.to_string(), "Invalid value for --app-id: expected a GUID");
    }

    #[test]
    fn status_table() {
        assert_eq!(ServiceError::NotFound("x".into()).status(), 404);
        assert_eq!(ServiceError::Forbidden("x".into()).status(), 403);
        assert_eq!(ServiceError::Throttled.status(), 429);
        assert_eq!(ServiceError::Timeout.status(), 504);
        assert_eq!(ServiceError::Unavailable("x".into()).status(), 503);
        assert_eq!(
            ServiceError::Internal(anyhow::anyhow!("boom")).status(),
            500
        );
        assert_eq!(CommandError::Unimplemented("a b".into()).status(), 501);
        assert_eq!(CommandError::Cancelled.status(), 499);
    }

    #[test]
    fn internal_text_never_in_public_message() {
        let e = CommandError::from(ServiceError::Internal(anyhow::anyhow!(
            "socket reset by peer at 10.0.0.4:443"
        )));
        assert!(!e.public_message().contains("10.0.0.4"));

        let e = CommandError::from(ServiceError::Unavailable("dns failure xyz".into()));
        assert!(!e.public_message().contains("xyz"));
    }
}
