use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RoomError;

/// Supported execution languages and their fixed judge-service ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Java,
    Python,
    Javascript,
}

impl Language {
    /// Numeric language id understood by the judge execution service
    pub fn judge_id(&self) -> u32 {
        match self {
            Language::C => 50,
            Language::Cpp => 54,
            Language::Java => 62,
            Language::Javascript => 63,
            Language::Python => 71,
        }
    }

    /// Comment-style prompt appended to editor boilerplate
    pub fn comment_prompt(&self) -> &'static str {
        match self {
            Language::Python => "# Write your solution here",
            _ => "// Write your solution here",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::C,
            Language::Cpp,
            Language::Java,
            Language::Python,
            Language::Javascript,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
            Language::Javascript => "javascript",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Language {
    type Err = RoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::Javascript),
            other => Err(RoomError::UnknownLanguage(other.to_string())),
        }
    }
}
