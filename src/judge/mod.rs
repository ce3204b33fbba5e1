pub mod client;
pub mod evaluator;
pub mod languages;

pub use client::{interpret_response, JudgeClient, JudgeResponse, JudgeStatus, RunVerdict};
pub use languages::Language;
