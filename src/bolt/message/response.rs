//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client.

use super::tag;
use crate::bolt::packstream::{PackStreamError, PackStreamMap, PackStreamStructure, PackStreamValue};

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - Operation completed successfully
    Success(SuccessMessage),
    /// RECORD - Query result record
    Record(Vec<PackStreamValue>),
    /// FAILURE - Operation failed
    Failure(FailureMessage),
    /// IGNORED - Request skipped because an earlier one failed
    Ignored,
}

impl BoltResponse {
    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Parse from PackStream structure.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let PackStreamStructure { tag, mut fields } = s;
        match tag {
            tag::SUCCESS => Ok(BoltResponse::Success(SuccessMessage {
                metadata: take_map(&mut fields, "SUCCESS")?,
            })),
            tag::RECORD => match fields.pop() {
                Some(PackStreamValue::List(values)) if fields.is_empty() => {
                    Ok(BoltResponse::Record(values))
                }
                _ => Err(PackStreamError::InvalidStructure(
                    "RECORD must carry one list".to_string(),
                )),
            },
            tag::FAILURE => {
                let metadata = take_map(&mut fields, "FAILURE")?;
                Ok(BoltResponse::Failure(FailureMessage::from_metadata(&metadata)))
            }
            tag::IGNORED => Ok(BoltResponse::Ignored),
            _ => Err(PackStreamError::InvalidStructure(format!(
                "Unknown response message tag: 0x{:02X}",
                tag
            ))),
        }
    }
}

fn take_map(fields: &mut Vec<PackStreamValue>, what: &str) -> Result<PackStreamMap, PackStreamError> {
    match fields.pop() {
        None => Ok(PackStreamMap::new()),
        Some(PackStreamValue::Map(map)) if fields.is_empty() => Ok(map),
        _ => Err(PackStreamError::InvalidStructure(format!(
            "{} must carry one metadata map",
            what
        ))),
    }
}

/// SUCCESS message - Operation completed successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: PackStreamMap,
}

impl SuccessMessage {
    /// Get server agent.
    pub fn server(&self) -> Option<&str> {
        self.metadata.get("server").and_then(|v| v.as_str())
    }

    /// Get connection ID.
    pub fn connection_id(&self) -> Option<&str> {
        self.metadata.get("connection_id").and_then(|v| v.as_str())
    }

    /// Get field names from RUN success.
    pub fn fields(&self) -> Vec<String> {
        self.metadata
            .get("fields")
            .and_then(|v| v.as_list())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if there are more results.
    pub fn has_more(&self) -> bool {
        self.metadata
            .get("has_more")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// FAILURE message - Operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Server error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl FailureMessage {
    fn from_metadata(metadata: &PackStreamMap) -> Self {
        let text = |key: &str, default: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            code: text("code", "Unknown"),
            message: text("message", "unknown server error"),
        }
    }

    /// Whether the server classified the failure as an authentication problem.
    pub fn is_security_error(&self) -> bool {
        self.code.contains(".Security.") || self.code.contains("Authentication")
    }
}
