use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::judge::Language;

/// Question difficulty. Ordering of a room's question list is ascending
/// difficulty, stable for ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Per-question countdown duration in whole seconds
    pub fn duration_secs(&self) -> u32 {
        match self {
            Difficulty::Easy => 20 * 60,
            Difficulty::Medium => 40 * 60,
            Difficulty::Hard => 90 * 60,
        }
    }

    /// Base score awarded for a full solve
    pub fn base_score(&self) -> u32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 200,
            Difficulty::Hard => 400,
        }
    }

    /// Time limit in minutes used by the scoring time-bonus factor
    pub fn time_limit_minutes(&self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 40,
            Difficulty::Hard => 90,
        }
    }

    /// Sort key for room ordering
    pub fn order(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

/// One (input, expected output) pair. `passed` is absent until the first
/// evaluation run and wholly overwritten on each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    #[serde(rename = "expectedOutput")]
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    pub function_name: String,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A coding challenge as pushed by the question source. Immutable for the
/// session's duration once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", deserialize_with = "deserialize_question_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(rename = "exampleInput", default, skip_serializing_if = "Option::is_none")]
    pub example_input: Option<Value>,
    #[serde(rename = "exampleOutput", default, skip_serializing_if = "Option::is_none")]
    pub example_output: Option<Value>,
    #[serde(rename = "testCases", default)]
    pub test_cases: Vec<TestCase>,
    #[serde(rename = "functionMetadata", default, skip_serializing_if = "Option::is_none")]
    pub function_metadata: Option<FunctionMetadata>,
}

impl Question {
    /// Editor starting code for this question: the function signature (if
    /// the question source supplied one) followed by a per-language prompt.
    pub fn boilerplate(&self, language: Language) -> String {
        let prompt = language.comment_prompt();
        match self
            .function_metadata
            .as_ref()
            .and_then(|m| m.signature.as_deref())
        {
            Some(signature) if !signature.is_empty() => format!("{}\n{}", signature, prompt),
            _ => prompt.to_string(),
        }
    }

    /// Declared return type, used by the output-splitting heuristic
    pub fn return_type(&self) -> Option<&str> {
        self.function_metadata.as_ref().map(|m| m.return_type.as_str())
    }

    /// Example block shown alongside the description
    pub fn example_text(&self) -> String {
        let input = self
            .example_input
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".to_string());
        let output = self
            .example_output
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".to_string());
        format!("Input: {}\nOutput: {}", input, output)
    }
}

/// Question ids arrive either as a plain string or as an extended-JSON
/// object `{"$oid": "..."}` depending on the question source.
fn deserialize_question_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Object(map) => map
            .get("$oid")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| de::Error::custom("question id object missing $oid")),
        other => Err(de::Error::custom(format!(
            "unsupported question id type: {}",
            other
        ))),
    }
}

/// Sorts a received question list into room order: ascending difficulty,
/// stable for ties.
pub fn sort_by_difficulty(questions: &mut [Question]) {
    questions.sort_by_key(|q| q.difficulty.order());
}
