//! Host message and event types for tabcwd.
//!
//! The host (terminal front-end) sends [`HostMessage`] lines describing tab
//! lifecycle and shell output; the resolver answers with [`HostEvent`] lines.
//! Both sides share these types so the schema cannot drift.

use serde::{Deserialize, Serialize};

pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024; // 1MB

/// Discriminator the host store expects on a CWD update.
pub const SESSION_SET_CWD: &str = "SESSION_SET_CWD";

const MAX_UID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outbound state-change event delivered to the host dispatcher.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum HostEvent {
    #[serde(rename = "SESSION_SET_CWD")]
    SessionSetCwd { cwd: String },
}

impl HostEvent {
    pub fn set_cwd(cwd: impl Into<String>) -> Self {
        HostEvent::SessionSetCwd { cwd: cwd.into() }
    }

    pub fn to_json_line(&self) -> Result<String, ErrorInfo> {
        serde_json::to_string(self).map_err(|err| {
            ErrorInfo::new(
                "serialize_failed",
                format!("failed to encode event: {}", err),
            )
        })
    }
}

/// Inbound message from the host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// A tab was created with a shell process.
    TabOpen {
        uid: String,
        pid: u32,
        #[serde(default)]
        shell: Option<String>,
    },
    /// A tab was closed; its state is discarded.
    TabClose { uid: String },
    /// A tab became the focused one. Triggers a resolution.
    TabFocus {
        uid: String,
        #[serde(default)]
        pid: Option<u32>,
        #[serde(default)]
        shell: Option<String>,
    },
    /// A chunk of shell output for a tab. Triggers a resolution.
    SessionData {
        uid: String,
        pid: u32,
        data: String,
        #[serde(default)]
        shell: Option<String>,
        #[serde(default)]
        focused_uid: Option<String>,
    },
}

impl HostMessage {
    pub fn uid(&self) -> &str {
        match self {
            HostMessage::TabOpen { uid, .. }
            | HostMessage::TabClose { uid }
            | HostMessage::TabFocus { uid, .. }
            | HostMessage::SessionData { uid, .. } => uid,
        }
    }

    pub fn validate(&self) -> Result<(), ErrorInfo> {
        require_uid(self.uid())?;
        match self {
            HostMessage::TabOpen { pid, .. } | HostMessage::SessionData { pid, .. } => {
                require_pid(Some(*pid))?;
            }
            HostMessage::TabFocus { pid, .. } => {
                if pid.is_some() {
                    require_pid(*pid)?;
                }
            }
            HostMessage::TabClose { .. } => {}
        }
        if let HostMessage::SessionData {
            focused_uid: Some(focused),
            ..
        } = self
        {
            require_uid(focused)?;
        }
        Ok(())
    }
}

/// Parses and validates one JSON line from the host.
pub fn parse_message(line: &str) -> Result<HostMessage, ErrorInfo> {
    if line.len() > MAX_MESSAGE_BYTES {
        return Err(ErrorInfo::new(
            "message_too_large",
            format!("message exceeds {} bytes", MAX_MESSAGE_BYTES),
        ));
    }
    let message: HostMessage = serde_json::from_str(line).map_err(|err| {
        ErrorInfo::new(
            "invalid_message",
            format!("message is invalid JSON: {}", err),
        )
    })?;
    message.validate()?;
    Ok(message)
}

fn require_uid(uid: &str) -> Result<(), ErrorInfo> {
    if uid.trim().is_empty() {
        return Err(ErrorInfo::new("invalid_uid", "uid is required"));
    }
    if uid.len() > MAX_UID_LEN {
        return Err(ErrorInfo::new(
            "invalid_uid",
            "uid must be 128 characters or fewer",
        ));
    }
    Ok(())
}

fn require_pid(pid: Option<u32>) -> Result<(), ErrorInfo> {
    match pid {
        Some(0) | None => Err(ErrorInfo::new("invalid_pid", "pid is required")),
        Some(_) => Ok(()),
    }
}
