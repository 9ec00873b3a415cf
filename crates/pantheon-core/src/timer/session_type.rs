use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category the server files a session under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiCategory {
    Focus,
    Break,
}

impl ApiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiCategory::Focus => "focus",
            ApiCategory::Break => "break",
        }
    }
}

/// The phase the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Focus,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    /// Default phase length in seconds.
    pub fn default_duration_secs(&self) -> u32 {
        match self {
            SessionType::Focus => 25 * 60,
            SessionType::ShortBreak => 5 * 60,
            SessionType::LongBreak => 15 * 60,
        }
    }

    pub fn api_category(&self) -> ApiCategory {
        match self {
            SessionType::Focus => ApiCategory::Focus,
            SessionType::ShortBreak | SessionType::LongBreak => ApiCategory::Break,
        }
    }

    pub fn is_break(&self) -> bool {
        self.api_category() == ApiCategory::Break
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionType::Focus => "Focus",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "focus" => Ok(SessionType::Focus),
            "short_break" | "short" => Ok(SessionType::ShortBreak),
            "long_break" | "long" => Ok(SessionType::LongBreak),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}
