use chrono::{DateTime, Utc};
use serde::Serialize;

/// One whitespace-delimited run of bytes read from the radio link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk(Vec<u8>);

impl RawChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RawChunk {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

/// Instruction decoded from a judge remote frame (or raised by the UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeCommand {
    /// Relative step, used by the display's "+1" control.
    IncrementBy(u32),
    /// Counter value carried by a radio frame.
    SetAbsolute(u32),
    StartTimer,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Athlete {
    pub id: String,
    pub name: String,
}

impl Athlete {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A finished set on its way to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub athlete_id: String,
    pub competition: u32,
    pub result: u32,
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub submission: Submission,
    pub response: String,
    pub submitted_at: DateTime<Utc>,
}
