use std::fmt;
use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use mcpspec::McpSpecError;
use mcpspec_mcp::FetchError;

const EX_OK: u8 = 0;
const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_UNAVAILABLE: u8 = 69;
const EX_SOFTWARE: u8 = 70;
const EX_OSERR: u8 = 71;
const EX_PROTOCOL: u8 = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok,
    Usage,
    Data,
    Unavailable,
    Io,
    Protocol,
    Software,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Ok => EX_OK,
            ExitStatus::Usage => EX_USAGE,
            ExitStatus::Data => EX_DATAERR,
            ExitStatus::Unavailable => EX_UNAVAILABLE,
            ExitStatus::Io => EX_OSERR,
            ExitStatus::Protocol => EX_PROTOCOL,
            ExitStatus::Software => EX_SOFTWARE,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    message: String,
    status: ExitStatus,
}

impl CliError {
    pub fn new(message: impl Into<String>, status: ExitStatus) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status.code())
    }

    pub fn print(&self) {
        if !self.message.is_empty() {
            eprintln!("{}", self.message);
        }
    }
}

impl From<McpSpecError> for CliError {
    fn from(err: McpSpecError) -> Self {
        let status = match &err {
            McpSpecError::Document(_) => ExitStatus::Data,
            McpSpecError::Serialization(_) => ExitStatus::Software,
            McpSpecError::Io(_) => ExitStatus::Io,
        };
        CliError::new(err.to_string(), status)
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        let status = match &err {
            FetchError::InvalidEndpoint { .. } | FetchError::InvalidHeader { .. } => {
                ExitStatus::Usage
            }
            FetchError::Connect(_) | FetchError::Transport(_) | FetchError::Status { .. } => {
                ExitStatus::Unavailable
            }
            FetchError::ListTools(_) | FetchError::MissingServerInfo | FetchError::Decode(_) => {
                ExitStatus::Protocol
            }
            FetchError::HttpClient(_) | FetchError::Encode(_) => ExitStatus::Software,
        };
        CliError::new(err.to_string(), status)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> Self {
        let status = match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitStatus::Ok,
            _ => ExitStatus::Usage,
        };
        if status == ExitStatus::Ok {
            let _ = err.print();
            CliError::new(String::new(), status)
        } else {
            CliError::new(err.to_string(), status)
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(err.to_string(), ExitStatus::Io)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_errors_map_to_data_status() {
        let err = CliError::from(McpSpecError::Document("bad shape".into()));
        assert_eq!(err.status(), ExitStatus::Data);
        assert_eq!(err.status().code(), 65);
    }

    #[test]
    fn fetch_errors_map_by_stage() {
        let usage = CliError::from(FetchError::InvalidEndpoint {
            url: "nope".into(),
            reason: "relative URL without a base".into(),
        });
        assert_eq!(usage.status(), ExitStatus::Usage);

        let connect = CliError::from(FetchError::Connect("connection refused".into()));
        assert_eq!(connect.status().code(), 69);

        let protocol = CliError::from(FetchError::MissingServerInfo);
        assert_eq!(protocol.status().code(), 76);

        let decode = CliError::from(FetchError::Decode("expected value".into()));
        assert_eq!(decode.status(), ExitStatus::Protocol);

        let status = CliError::from(FetchError::Status {
            status: mcpspec_mcp::StatusCode::UNAUTHORIZED,
        });
        assert_eq!(status.status(), ExitStatus::Unavailable);
        assert!(status.to_string().contains("401"));
    }
}
