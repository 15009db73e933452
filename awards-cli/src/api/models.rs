//! Wire format of the document script service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RemoteError;

/// Body of a script execution request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest<'a> {
    pub function: &'a str,
    pub parameters: &'a [Value],
    /// Run the most recently saved script instead of the deployed version
    pub dev_mode: bool,
}

/// Successful execution payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub result: Option<Value>,
}

/// One frame of a script stack trace
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub line_number: Option<i64>,
}

impl std::fmt::Display for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.line_number.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
            self.function.as_deref().unwrap_or("<anonymous>")
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptErrorDetail {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
    /// Absent when the script failed before it started executing
    #[serde(default)]
    pub script_stack_trace_elements: Vec<StackFrame>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<ScriptErrorDetail>,
}

/// Execution response: either `{response: {result}}`, a bare `{result}`, or
/// `{error: {details: [...]}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptResponse {
    #[serde(default)]
    pub response: Option<ExecutionResult>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ScriptErrorBody>,
}

impl ScriptResponse {
    /// The script's return value; `None` when it returned nothing
    pub fn into_result(self, function: &str) -> Result<Option<Value>, RemoteError> {
        if let Some(error) = self.error {
            let detail = error.details.into_iter().next().unwrap_or_default();
            return Err(RemoteError::Script {
                function: function.to_string(),
                message: detail
                    .error_message
                    .or(error.message)
                    .unwrap_or_else(|| "unknown script error".to_string()),
                error_type: detail.error_type,
                stack: detail.script_stack_trace_elements,
            });
        }

        let result = self
            .response
            .and_then(|r| r.result)
            .or(self.result)
            .filter(|v| !v.is_null());
        Ok(result)
    }
}
