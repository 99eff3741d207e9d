//! Request deserialization for the dispatch loop.
//!
//! A request is one JSON object: `{"version": 1?, "type": ..., "params": {...}}`.
//! Parameters are kept as a raw map until the command is known, then
//! deserialized into the typed struct for that command.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr};

use crate::store::TemplateKind;

use super::errors::DispatchError;
use super::response::PROTOCOL_VERSION;

/// Parsed command request from a client.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    /// Protocol version declared by the client.
    #[serde(default)]
    pub version: Option<u32>,
    /// Command name.
    #[serde(rename = "type")]
    pub command: String,
    /// Command parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Commands the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    CreateMacro,
    UpdateMacro,
    RunMacro,
    ValidateMacroCode,
    SetView,
    GetReport,
}

impl CommandKind {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl CommandRequest {
    /// Parses one frame into a request.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed before
    /// parsing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedRequest` if the frame is empty or is
    /// not a JSON object with a string `type`.
    pub fn parse(frame: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = frame.trim_ascii();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request"));
        }
        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }

    /// Checks the version and resolves the command.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVersion` or `UnknownCommand`.
    pub fn validate(&self) -> Result<CommandKind, DispatchError> {
        if let Some(version) = self.version
            && version != PROTOCOL_VERSION
        {
            return Err(DispatchError::UnsupportedVersion { version });
        }
        self.command
            .trim()
            .parse()
            .map_err(|_| DispatchError::unknown_command(self.command.trim()))
    }

    /// Deserializes the params into the struct for this command.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` describing the first problem serde found.
    pub fn params<P: DeserializeOwned>(&self) -> Result<P, DispatchError> {
        P::deserialize(Value::Object(self.params.clone()))
            .map_err(|error| DispatchError::invalid_params(error.to_string()))
    }
}

fn default_true() -> bool {
    true
}

/// Params of `create_macro`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMacroParams {
    pub macro_name: String,
    #[serde(default)]
    pub template_type: TemplateKind,
}

/// Params of `update_macro`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMacroParams {
    pub macro_name: String,
    pub code: String,
    #[serde(default = "default_true")]
    pub normalize: bool,
}

/// Params of `run_macro`. Exactly one of `macro_path` and `macro_name`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunMacroParams {
    #[serde(default)]
    pub macro_path: Option<String>,
    #[serde(default)]
    pub macro_name: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub document: Option<String>,
}

/// Params of `validate_macro_code`. Exactly one of `macro_name` and `code`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateMacroParams {
    #[serde(default)]
    pub macro_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default = "default_true")]
    pub run_check: bool,
}

/// Params of `set_view`. `view_type` may be sent as a string or a number.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetViewParams {
    pub view_type: Value,
}

impl SetViewParams {
    /// The view code as text.
    pub fn code(&self) -> Result<String, DispatchError> {
        match &self.view_type {
            Value::String(code) => Ok(code.trim().to_owned()),
            Value::Number(number) => Ok(number.to_string()),
            other => Err(DispatchError::invalid_params(format!(
                "view_type must be a string or number, got {other}"
            ))),
        }
    }
}

/// Params of `get_report`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetReportParams {
    #[serde(default)]
    pub clear: bool,
}
