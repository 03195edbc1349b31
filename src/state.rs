//! UI-agnostic conversation types
//!
//! The transcript is a plain ordered list of turns. Nothing in here knows
//! about the terminal or the network.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Local>,
}

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>, created_at: DateTime<Local>) -> Self {
        Self {
            speaker,
            text: text.into(),
            created_at,
        }
    }

    /// Local wall-clock time, e.g. `14:03:27`
    pub fn time_label(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_speaker_serializes_lowercase() {
        let json = serde_json::to_string(&Speaker::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_time_label() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 4, 7).unwrap();
        let turn = Turn::new(Speaker::User, "hi", at);
        assert_eq!(turn.time_label(), "09:04:07");
    }
}
