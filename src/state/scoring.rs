//! Point computation for answer submissions.

/// Base points granted for any correct answer, before the speed bonus.
const BASE_POINTS: u32 = 100;
/// Bonus points per second left on the clock when the answer arrived.
const POINTS_PER_REMAINING_SECOND: u32 = 2;

/// Score a single answer submission.
///
/// Incorrect answers are worth nothing. Correct answers earn the base plus
/// twice the number of whole seconds remaining when the answer was given.
/// `elapsed_seconds` is client-reported and therefore clamped to
/// `[0, time_limit_seconds]` before the bonus is computed.
pub fn score_answer(is_correct: bool, elapsed_seconds: u32, time_limit_seconds: u32) -> u32 {
    if !is_correct {
        return 0;
    }

    let elapsed = elapsed_seconds.min(time_limit_seconds);
    BASE_POINTS + (time_limit_seconds - elapsed) * POINTS_PER_REMAINING_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_answers_score_zero() {
        assert_eq!(score_answer(false, 0, 30), 0);
        assert_eq!(score_answer(false, 30, 30), 0);
    }

    #[test]
    fn fast_correct_answer_earns_speed_bonus() {
        // 5 seconds into a 30 second question: 100 + 25 * 2.
        assert_eq!(score_answer(true, 5, 30), 150);
    }

    #[test]
    fn answer_at_the_deadline_earns_base_points_only() {
        assert_eq!(score_answer(true, 30, 30), 100);
    }

    #[test]
    fn reported_time_beyond_the_limit_is_clamped() {
        assert_eq!(score_answer(true, 90, 30), 100);
    }

    #[test]
    fn scoring_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(score_answer(true, 12, 20), 100 + 8 * 2);
        }
    }
}
