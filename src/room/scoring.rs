use super::question::Difficulty;

/// Deterministic score for one submitted question.
///
/// The score is the difficulty base, scaled by test-case completion, a
/// time-bonus factor that decays to 0.5 at the difficulty's time limit,
/// and a 10%-per-wrong-attempt penalty floored at zero. The result is
/// advisory on the client; the gateway recomputes the authoritative value
/// from the same submitted tuple.
pub fn score(
    difficulty: Difficulty,
    passed_test_cases: u32,
    total_test_cases: u32,
    wrong_attempts: u32,
    elapsed_minutes: u32,
) -> u32 {
    let base = difficulty.base_score() as f64;

    let completion = if total_test_cases == 0 {
        0.0
    } else {
        passed_test_cases as f64 / total_test_cases as f64
    };

    let time_limit = difficulty.time_limit_minutes() as f64;
    let time_ratio = (elapsed_minutes as f64 / time_limit).min(1.0);
    let time_bonus = 1.0 - time_ratio * 0.5;

    let attempt_penalty = (1.0 - wrong_attempts as f64 * 0.1).max(0.0);

    let final_score = (base * completion * time_bonus * attempt_penalty).round();
    final_score.max(0.0) as u32
}
