use serde::{Deserialize, Serialize};

/// How the user felt after a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Tired,
    Exhausted,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Exhausted => "exhausted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "great" => Some(Mood::Great),
            "good" => Some(Mood::Good),
            "neutral" => Some(Mood::Neutral),
            "tired" => Some(Mood::Tired),
            "exhausted" => Some(Mood::Exhausted),
            _ => None,
        }
    }
}
