//! Command dispatch and execution
//!
//! The executor resolves a parsed command's handler name against a closed
//! enumeration of handler kinds and normalizes every outcome — success, stub
//! result, unimplemented handler, handler failure — into a uniform
//! [`ExecutionResult`]. It never fails at the outer level.

use serde::Serialize;
use serde_json::{Value, json};

use crate::commands::parser::{CommandParser, ParsedCommand};
use crate::{Error, Result};

/// The closed set of command handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Open an application or website
    OpenApplication,
    /// Perform a web search
    WebSearch,
    /// Shut down or restart the system
    SystemControl,
    /// Create a file, folder, or project
    CreateItem,
    /// Connect or disconnect WiFi
    ControlWifi,
    /// Set a timer or reminder
    SetTimer,
    /// Find files by name pattern
    FindFiles,
}

impl HandlerKind {
    /// Resolve a handler name from the command table
    ///
    /// `create_project` is a historical alias for `create_item`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open_application" => Some(Self::OpenApplication),
            "web_search" => Some(Self::WebSearch),
            "system_control" => Some(Self::SystemControl),
            "create_item" | "create_project" => Some(Self::CreateItem),
            "control_wifi" => Some(Self::ControlWifi),
            "set_timer" => Some(Self::SetTimer),
            "find_files" => Some(Self::FindFiles),
            _ => None,
        }
    }

    /// Canonical name of this handler
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenApplication => "open_application",
            Self::WebSearch => "web_search",
            Self::SystemControl => "system_control",
            Self::CreateItem => "create_item",
            Self::ControlWifi => "control_wifi",
            Self::SetTimer => "set_timer",
            Self::FindFiles => "find_files",
        }
    }
}

/// Uniform outcome of executing one transcription
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Whether a handler ran to completion
    pub success: bool,

    /// The parse result this outcome is based on
    pub command_data: ParsedCommand,

    /// Human-readable status line
    pub message: String,

    /// The handler's return record, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failure description, on handler failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failure(command_data: ParsedCommand, message: String) -> Self {
        Self {
            success: false,
            command_data,
            message,
            result: None,
            error: None,
        }
    }
}

/// Dispatches parsed commands to their handlers
pub struct CommandExecutor {
    parser: CommandParser,
}

impl CommandExecutor {
    /// Create an executor around a parser
    #[must_use]
    pub const fn new(parser: CommandParser) -> Self {
        Self { parser }
    }

    /// Parse and execute one transcription
    ///
    /// Total: unrecognized commands, unimplemented handlers, and handler
    /// failures all come back as failed results, never as errors.
    pub fn execute(&mut self, transcription: &str) -> ExecutionResult {
        let cmd_data = self.parser.parse(transcription);

        if cmd_data.is_unknown() {
            return ExecutionResult::failure(cmd_data, "Command not recognized".to_string());
        }

        let Some(func_name) = cmd_data.function.clone() else {
            tracing::warn!(command = %cmd_data.command, "parsed command has no handler function");
            return ExecutionResult::failure(
                cmd_data,
                "Function unknown not implemented".to_string(),
            );
        };

        let Some(handler) = HandlerKind::from_name(&func_name) else {
            return ExecutionResult::failure(
                cmd_data,
                format!("Function {func_name} not implemented"),
            );
        };

        match Self::dispatch(handler, &cmd_data) {
            Ok(result) => ExecutionResult {
                success: true,
                message: format!("Executed {} command", cmd_data.command),
                command_data: cmd_data,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                tracing::warn!(command = %cmd_data.command, error = %e, "handler failed");
                ExecutionResult {
                    success: false,
                    message: format!("Error executing {} command", cmd_data.command),
                    command_data: cmd_data,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Invoke the handler for a resolved kind
    fn dispatch(handler: HandlerKind, cmd_data: &ParsedCommand) -> Result<Value> {
        match handler {
            HandlerKind::OpenApplication => Self::open_application(cmd_data),
            HandlerKind::WebSearch => Ok(Self::web_search(cmd_data)),
            HandlerKind::SystemControl => Ok(Self::system_control(cmd_data)),
            HandlerKind::CreateItem => Ok(Self::create_item(cmd_data)),
            HandlerKind::ControlWifi => Ok(Self::control_wifi(cmd_data)),
            HandlerKind::SetTimer => Self::set_timer(cmd_data),
            HandlerKind::FindFiles => Ok(Self::find_files(cmd_data)),
        }
    }

    /// Open an application or website (stub)
    fn open_application(cmd_data: &ParsedCommand) -> Result<Value> {
        let target = cmd_data.target.clone().unwrap_or_default();
        tracing::info!(target = %target, "opening application");

        if target.contains("github") {
            // Best-effort browser open; log-only until real OS wiring lands
            tracing::info!(url = %format!("https://{target}"), "would open browser");
        }

        Ok(json!({ "target": target, "status": "opened" }))
    }

    /// Perform a web search (stub)
    fn web_search(cmd_data: &ParsedCommand) -> Value {
        let query = cmd_data.param(0).unwrap_or_default();
        tracing::info!(query = %query, "searching the web");
        json!({ "query": query, "status": "searched" })
    }

    /// Shut down or restart the system (stub)
    fn system_control(cmd_data: &ParsedCommand) -> Value {
        let action = if cmd_data.raw_text.contains("shut") {
            "shutdown"
        } else {
            "restart"
        };
        tracing::info!(action, "initiating system control");
        json!({ "action": action, "status": "initiated" })
    }

    /// Create a file, folder, or project — not yet implemented
    fn create_item(cmd_data: &ParsedCommand) -> Value {
        tracing::warn!(
            item_type = cmd_data.item_type.as_deref().unwrap_or(""),
            "create_item is not implemented"
        );
        json!({ "status": "not_implemented" })
    }

    /// Connect or disconnect WiFi (stub)
    fn control_wifi(cmd_data: &ParsedCommand) -> Value {
        let action = if cmd_data.raw_text.contains("connect") || cmd_data.raw_text.contains("on") {
            "connect"
        } else {
            "disconnect"
        };
        tracing::info!(action, "controlling wifi");
        json!({ "action": action, "status": "completed" })
    }

    /// Set a timer (stub)
    ///
    /// A non-numeric duration is a handler failure, surfaced in the result.
    fn set_timer(cmd_data: &ParsedCommand) -> Result<Value> {
        let raw_duration = cmd_data.param(0).unwrap_or("0");
        let duration: i64 = raw_duration
            .parse()
            .map_err(|_| Error::Handler(format!("invalid timer duration: {raw_duration:?}")))?;
        let unit = cmd_data.param(1).unwrap_or("minute");

        tracing::info!(duration, unit, "setting timer");
        Ok(json!({ "duration": duration, "unit": unit, "status": "set" }))
    }

    /// Find files by pattern — not yet implemented
    fn find_files(cmd_data: &ParsedCommand) -> Value {
        tracing::warn!(
            pattern = cmd_data.file_pattern.as_deref().unwrap_or(""),
            "find_files is not implemented"
        );
        json!({ "status": "not_implemented" })
    }

    /// The wrapped parser
    #[must_use]
    pub const fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Mutable access to the wrapped parser (for `add_command`)
    pub const fn parser_mut(&mut self) -> &mut CommandParser {
        &mut self.parser
    }
}
