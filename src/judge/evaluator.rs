use serde_json::Value;

use crate::room::question::TestCase;

/// Normalizes raw judge stdout: strips carriage returns, collapses runs
/// of whitespace to a single space, and trims. Idempotent.
pub fn normalize_output(output: &str) -> String {
    let no_cr = output.replace('\r', "");
    no_cr.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stricter normalization for structural (array/object) outputs: removes
/// all whitespace and newlines so pretty-printed and compact
/// representations compare equal.
pub fn normalize_structural(output: &str) -> String {
    output.chars().filter(|c| !c.is_whitespace()).collect()
}

/// True when a declared return type suggests collection or linked-node
/// output printed in bracketed form.
fn is_collection_return(return_type: Option<&str>) -> bool {
    match return_type {
        Some(rt) => rt.contains("vector") || rt.contains("ListNode"),
        None => false,
    }
}

/// Splits a judge's combined stdout into one token per test case.
///
/// For collection-like return types, only whitespace-delimited tokens
/// containing an opening bracket are kept (bracketed list output
/// heuristic); otherwise the output is whitespace-split with empty
/// tokens discarded. The heuristic is the documented fallback for judge
/// services without a per-test-case delimiter.
pub fn split_outputs(stdout: &str, return_type: Option<&str>) -> Vec<String> {
    let normalized = normalize_output(stdout);
    if is_collection_return(return_type) {
        normalized
            .split_whitespace()
            .filter(|token| token.contains('['))
            .map(|token| token.to_string())
            .collect()
    } else {
        normalized
            .split_whitespace()
            .map(|token| token.to_string())
            .collect()
    }
}

/// Positional comparison of output tokens against expected outputs: token
/// i is compared, after structural normalization, with the JSON-stringified
/// expected output of test case i. Missing tokens compare against the
/// empty string and fail. This is a string comparison, not a deep equal.
pub fn evaluate(tokens: &[String], test_cases: &[TestCase]) -> Vec<bool> {
    test_cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let actual = tokens.get(i).map(String::as_str).unwrap_or("");
            let expected = stringify(&case.expected_output);
            normalize_structural(actual) == normalize_structural(&expected)
        })
        .collect()
}

/// Evaluates a full judge stdout against a question's test cases
pub fn evaluate_stdout(
    stdout: &str,
    return_type: Option<&str>,
    test_cases: &[TestCase],
) -> Vec<bool> {
    let tokens = split_outputs(stdout, return_type);
    evaluate(&tokens, test_cases)
}

fn stringify(value: &Value) -> String {
    value.to_string()
}
