//! Feedback scoring: the one piece of arithmetic applied to a stored lyric.
//!
//! Every like/dislike nudges the satisfaction score by one step and the weight
//! by `WEIGHT_STEP`, saturating at the column bounds. Neutral feedback leaves
//! both untouched. Callers read the current values fresh before each update.

use crate::models::feedback::FeedbackType;
use crate::models::lyric::{SCORE_MAX, SCORE_MIN, WEIGHT_MAX, WEIGHT_MIN};

pub const SCORE_STEP: i32 = 1;
pub const WEIGHT_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricStanding {
    pub satisfaction_score: i32,
    pub weight: f64,
}

impl LyricStanding {
    pub fn new(satisfaction_score: i32, weight: f64) -> Self {
        Self {
            satisfaction_score,
            weight,
        }
    }

    /// Applies one feedback event. Pure; the store persists the result.
    pub fn adjust(self, feedback: FeedbackType) -> Self {
        match feedback {
            FeedbackType::Like => Self {
                satisfaction_score: (self.satisfaction_score + SCORE_STEP).min(SCORE_MAX),
                weight: (self.weight + WEIGHT_STEP).min(WEIGHT_MAX),
            },
            FeedbackType::Dislike => Self {
                satisfaction_score: (self.satisfaction_score - SCORE_STEP).max(SCORE_MIN),
                weight: (self.weight - WEIGHT_STEP).max(WEIGHT_MIN),
            },
            FeedbackType::Neutral => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> LyricStanding {
        LyricStanding::new(0, 1.0)
    }

    #[test]
    fn test_single_like() {
        let s = fresh().adjust(FeedbackType::Like);
        assert_eq!(s.satisfaction_score, 1);
        assert!((s.weight - 1.05).abs() < 1e-9, "weight was {}", s.weight);
    }

    #[test]
    fn test_single_dislike() {
        let s = fresh().adjust(FeedbackType::Dislike);
        assert_eq!(s.satisfaction_score, -1);
        assert!((s.weight - 0.95).abs() < 1e-9, "weight was {}", s.weight);
    }

    #[test]
    fn test_neutral_is_identity() {
        let s = LyricStanding::new(4, 1.3);
        assert_eq!(s.adjust(FeedbackType::Neutral), s);
    }

    #[test]
    fn test_likes_saturate_at_upper_bounds() {
        let mut s = fresh();
        for _ in 0..200 {
            s = s.adjust(FeedbackType::Like);
            assert!(s.satisfaction_score <= SCORE_MAX);
            assert!(s.weight <= WEIGHT_MAX);
        }
        assert_eq!(s.satisfaction_score, SCORE_MAX);
        assert_eq!(s.weight, WEIGHT_MAX);
    }

    #[test]
    fn test_dislikes_saturate_at_lower_bounds() {
        let mut s = fresh();
        for _ in 0..200 {
            s = s.adjust(FeedbackType::Dislike);
            assert!(s.satisfaction_score >= SCORE_MIN);
            assert!(s.weight >= WEIGHT_MIN);
        }
        assert_eq!(s.satisfaction_score, SCORE_MIN);
        assert_eq!(s.weight, WEIGHT_MIN);
    }

    #[test]
    fn test_dislike_after_saturated_like_moves_down() {
        let mut s = LyricStanding::new(SCORE_MAX, WEIGHT_MAX);
        s = s.adjust(FeedbackType::Like).adjust(FeedbackType::Dislike);
        assert_eq!(s.satisfaction_score, SCORE_MAX - 1);
        assert!((s.weight - (WEIGHT_MAX - WEIGHT_STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_sequence_stays_in_range() {
        let pattern = [
            FeedbackType::Like,
            FeedbackType::Like,
            FeedbackType::Dislike,
            FeedbackType::Neutral,
            FeedbackType::Like,
        ];
        let mut s = fresh();
        for feedback in pattern.iter().cycle().take(500) {
            s = s.adjust(*feedback);
            assert!((SCORE_MIN..=SCORE_MAX).contains(&s.satisfaction_score));
            assert!((WEIGHT_MIN..=WEIGHT_MAX).contains(&s.weight));
        }
    }
}
