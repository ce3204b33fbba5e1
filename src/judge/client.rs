use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::JudgeConfig;
use crate::room::question::Question;

use super::evaluator;
use super::languages::Language;

/// Judge status id for a run that executed without error
const STATUS_ACCEPTED: u32 = 3;

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    source_code: &'a str,
    language_id: u32,
    #[serde(rename = "questionId")]
    question_id: &'a str,
    stdin: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct JudgeResponse {
    #[serde(default)]
    pub status: Option<JudgeStatus>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JudgeStatus {
    pub id: u32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of one execution run, as consumed by the session controller.
/// Every non-`Accepted` variant marks all test cases failed; `Unreachable`
/// is a transport failure, distinguished from judge-reported failures in
/// logging and never counted as a wrong answer.
#[derive(Debug, Clone)]
pub enum RunVerdict {
    Accepted { passed: Vec<bool> },
    CompileError(String),
    RuntimeError(String),
    Rejected(String),
    Unreachable(String),
}

impl RunVerdict {
    pub fn is_judge_reported_failure(&self) -> bool {
        matches!(
            self,
            RunVerdict::CompileError(_) | RunVerdict::RuntimeError(_) | RunVerdict::Rejected(_)
        )
    }
}

/// HTTP adapter for the external judge execution service
pub struct JudgeClient {
    http: reqwest::Client,
    compile_url: String,
    health_url: String,
    timeout: Duration,
}

impl JudgeClient {
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            compile_url: config.compile_url(),
            health_url: config.health_url(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Checks the judge service's health endpoint
    pub async fn health(&self) -> bool {
        match self.http.get(&self.health_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Judge health check failed");
                false
            }
        }
    }

    /// Sends source code for execution and maps the response into a
    /// per-test-case verdict for the given question
    pub async fn run(
        &self,
        source_code: &str,
        language: Language,
        question: &Question,
    ) -> RunVerdict {
        let request = RunRequest {
            source_code,
            language_id: language.judge_id(),
            question_id: &question.id,
            stdin: "",
        };

        let response = self
            .http
            .post(&self.compile_url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp.json::<JudgeResponse>().await,
            Ok(resp) => {
                let status = resp.status();
                tracing::warn!(status = %status, question_id = %question.id, "Judge returned HTTP error");
                return RunVerdict::Unreachable(format!("judge returned HTTP {}", status));
            }
            Err(e) => {
                tracing::warn!(error = %e, question_id = %question.id, "Judge request failed");
                return RunVerdict::Unreachable(e.to_string());
            }
        };

        match response {
            Ok(body) => interpret_response(&body, question),
            Err(e) => {
                tracing::warn!(error = %e, question_id = %question.id, "Judge response was not valid JSON");
                RunVerdict::Unreachable(e.to_string())
            }
        }
    }
}

/// Maps a judge response body into a verdict. Status id 3 means the code
/// ran; its stdout is split and compared per test case. Any other status
/// is categorized as compile error, runtime error, or a generic judge
/// rejection, in that precedence order.
pub fn interpret_response(response: &JudgeResponse, question: &Question) -> RunVerdict {
    let accepted = response
        .status
        .as_ref()
        .map(|s| s.id == STATUS_ACCEPTED)
        .unwrap_or(false);

    if accepted {
        let stdout = response.stdout.as_deref().unwrap_or("");
        let passed =
            evaluator::evaluate_stdout(stdout, question.return_type(), &question.test_cases);
        return RunVerdict::Accepted { passed };
    }

    if let Some(diag) = response.compile_output.as_deref().filter(|s| !s.is_empty()) {
        return RunVerdict::CompileError(diag.to_string());
    }
    if let Some(diag) = response.stderr.as_deref().filter(|s| !s.is_empty()) {
        return RunVerdict::RuntimeError(diag.to_string());
    }
    let description = response
        .status
        .as_ref()
        .and_then(|s| s.description.clone())
        .unwrap_or_else(|| "Code execution failed".to_string());
    RunVerdict::Rejected(description)
}
