//! Remote call failures

use super::models::StackFrame;

/// Why a document service call failed
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Connection, TLS or request construction failure
    Transport { function: String, message: String },
    /// The call exceeded the configured timeout
    Timeout { function: String, seconds: u64 },
    /// Non-success HTTP status
    Http {
        function: String,
        status: u16,
        body: String,
    },
    /// The script itself raised an error
    Script {
        function: String,
        message: String,
        error_type: Option<String>,
        stack: Vec<StackFrame>,
    },
    /// Response body was not a valid execution response
    Decode { function: String, message: String },
}

impl RemoteError {
    pub fn function(&self) -> &str {
        match self {
            RemoteError::Transport { function, .. }
            | RemoteError::Timeout { function, .. }
            | RemoteError::Http { function, .. }
            | RemoteError::Script { function, .. }
            | RemoteError::Decode { function, .. } => function,
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Transport { function, message } => {
                write!(f, "{}: request failed: {}", function, message)
            }
            RemoteError::Timeout { function, seconds } => {
                write!(f, "{}: no response after {}s", function, seconds)
            }
            RemoteError::Http {
                function,
                status,
                body,
            } => {
                write!(f, "{}: HTTP {}", function, status)?;
                if !body.is_empty() {
                    write!(f, ": {}", body)?;
                }
                Ok(())
            }
            RemoteError::Script {
                function,
                message,
                error_type,
                stack,
            } => {
                write!(f, "{}: script error", function)?;
                if let Some(kind) = error_type {
                    write!(f, " ({})", kind)?;
                }
                write!(f, ": {}", message)?;
                if !stack.is_empty() {
                    write!(f, "\nScript stacktrace:")?;
                    for frame in stack {
                        write!(f, "\n\t{}", frame)?;
                    }
                }
                Ok(())
            }
            RemoteError::Decode { function, message } => {
                write!(f, "{}: unreadable response: {}", function, message)
            }
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_lists_stack() {
        let error = RemoteError::Script {
            function: "deleteAwardStudentRows".to_string(),
            message: "Range not found".to_string(),
            error_type: None,
            stack: vec![StackFrame {
                function: Some("deleteAwardStudentRows".to_string()),
                line_number: Some(88),
            }],
        };
        let text = error.to_string();
        assert!(text.starts_with("deleteAwardStudentRows: script error: Range not found"));
        assert!(text.contains("\t88: deleteAwardStudentRows"));
        assert_eq!(error.function(), "deleteAwardStudentRows");
    }

    #[test]
    fn test_http_error_without_body() {
        let error = RemoteError::Http {
            function: "readDataTable".to_string(),
            status: 403,
            body: String::new(),
        };
        assert_eq!(error.to_string(), "readDataTable: HTTP 403");
    }
}
