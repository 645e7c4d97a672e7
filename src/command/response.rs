//! Uniform `{status, message, result}` envelope returned by every command.

use serde::{Deserialize, Serialize};

use crate::command::error::CommandError;

pub const SUCCESS_STATUS: u16 = 200;
pub const SUCCESS_MESSAGE: &str = "Success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl Default for CommandResponse {
    fn default() -> Self {
        Self {
            status: SUCCESS_STATUS,
            message: SUCCESS_MESSAGE.to_string(),
            result: None,
        }
    }
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Overwrite the envelope with a failure. Any partial result is dropped.
    pub fn set_error(&mut self, err: &CommandError) {
        self.status = err.status();
        self.message = err.public_message();
        self.result = None;
    }
}
