//! # Skill Assessment Engine
//!
//! Scores the teacher skill assessment and derives the three-tier skill
//! level that unlocks session hosting.
//!
//! The question bank is compiled into the binary; the correct option
//! indices never leave this module. Scoring is pure integer arithmetic:
//! `correct * 100 / QUESTION_COUNT`, truncating.

use crate::access::{AccessGate, Capability};
use crate::primitives::{ADVANCED_THRESHOLD, INTERMEDIATE_THRESHOLD, QUESTION_COUNT};
use crate::records::RecordStore;
use crate::types::{EdnovaError, SkillLevel, SkillTestResult, Timestamp, User};

// =============================================================================
// QUESTION BANK
// =============================================================================

/// One multiple-choice question. The correct index is private; callers see
/// the prompt and options only.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    /// The question text.
    pub prompt: &'static str,
    /// Four answer options, exactly one correct.
    pub options: [&'static str; 4],
    correct: usize,
}

static QUESTION_BANK: [Question; QUESTION_COUNT] = [
    Question {
        prompt: "What is the most effective way to begin a teaching session?",
        options: [
            "Jump straight into the material",
            "Set clear objectives and expectations",
            "Ask students to read the material silently",
            "Start with an unrelated ice-breaker",
        ],
        correct: 1,
    },
    Question {
        prompt: "How do you handle students with different learning paces?",
        options: [
            "Focus on the fastest learners",
            "Focus on the slowest learners",
            "Maintain the average pace",
            "Provide differentiated instruction and support",
        ],
        correct: 3,
    },
    Question {
        prompt: "What is the best way to check student understanding?",
        options: [
            "Give a final test",
            "Ask 'Does everyone understand?'",
            "Use formative assessment throughout the session",
            "Wait for students to ask questions",
        ],
        correct: 2,
    },
    Question {
        prompt: "How do you maintain student engagement in an online session?",
        options: [
            "Lecture continuously",
            "Use interactive elements and encourage participation",
            "Show lots of videos",
            "Give frequent breaks",
        ],
        correct: 1,
    },
    Question {
        prompt: "What is the most effective feedback method?",
        options: [
            "General praise or criticism",
            "No feedback to avoid discouragement",
            "Specific, constructive feedback with actionable suggestions",
            "Peer feedback only",
        ],
        correct: 2,
    },
    Question {
        prompt: "How do you handle a student who is struggling with the material?",
        options: [
            "Suggest they find an easier subject",
            "Repeat the same explanation louder",
            "Break down the concept into smaller, manageable parts",
            "Move on to keep the session on schedule",
        ],
        correct: 2,
    },
    Question {
        prompt: "What is the best approach to lesson planning?",
        options: [
            "Improvise based on student reactions",
            "Follow the textbook exactly",
            "Plan with clear objectives, activities, and assessments",
            "Focus only on covering all material",
        ],
        correct: 2,
    },
    Question {
        prompt: "How do you create an inclusive learning environment?",
        options: [
            "Treat everyone exactly the same",
            "Let students figure it out themselves",
            "Acknowledge and accommodate diverse learning needs and backgrounds",
            "Group students by ability",
        ],
        correct: 2,
    },
];

// =============================================================================
// ASSESSMENT ENGINE
// =============================================================================

/// The skill assessment engine.
pub struct Assessment;

impl Assessment {
    /// The full question bank in presentation order.
    #[must_use]
    pub fn questions() -> &'static [Question; QUESTION_COUNT] {
        &QUESTION_BANK
    }

    /// Score a complete answer sheet as a 0 to 100 percentage.
    ///
    /// `answers[i]` is the chosen option index for question `i`. A sheet
    /// with the wrong number of answers is rejected before scoring; an
    /// out-of-range option index simply scores that question as wrong.
    pub fn score(answers: &[usize]) -> Result<u8, EdnovaError> {
        if answers.len() != QUESTION_COUNT {
            return Err(EdnovaError::Incomplete {
                answered: answers.len(),
                expected: QUESTION_COUNT,
            });
        }
        let correct = QUESTION_BANK
            .iter()
            .zip(answers)
            .filter(|&(q, &a)| q.correct == a)
            .count();
        // QUESTION_COUNT is 8 so this stays well inside u8 range.
        Ok((correct * 100 / QUESTION_COUNT) as u8)
    }

    /// Map a percentage score onto the three-tier ladder.
    #[must_use]
    pub fn classify(score: u8) -> SkillLevel {
        if score >= ADVANCED_THRESHOLD {
            SkillLevel::Advanced
        } else if score >= INTERMEDIATE_THRESHOLD {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Basic
        }
    }

    /// Score a submission, record the result, and set the user's level.
    ///
    /// Teachers only. Every submission is retained; retakes overwrite the
    /// user's level with the newest result, better or worse. Any score
    /// yields a level, so one completed assessment permanently unlocks
    /// hosting.
    pub fn submit(
        store: &mut impl RecordStore,
        user: &User,
        answers: &[usize],
        now: Timestamp,
    ) -> Result<SkillTestResult, EdnovaError> {
        AccessGate::require(Some(user), None, Capability::TakeAssessment)?;
        let score = Self::score(answers)?;
        let level = Self::classify(score);
        let result = SkillTestResult::new(user.id, score, level, now);
        store.insert_skill_result(&result)?;
        store.set_skill_level(user.id, level)?;
        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{MemoryStore, RecordStore};
    use crate::types::{Role, UserId};

    const NOW: Timestamp = Timestamp::from_unix(1_700_000_000);

    fn all_correct() -> Vec<usize> {
        QUESTION_BANK.iter().map(|q| q.correct).collect()
    }

    #[test]
    fn perfect_sheet_scores_hundred() {
        assert_eq!(Assessment::score(&all_correct()).unwrap(), 100);
    }

    #[test]
    fn truncating_percentages() {
        // 1/8 -> 12, 3/8 -> 37, 5/8 -> 62, 7/8 -> 87.
        let mut answers = vec![usize::MAX; QUESTION_COUNT];
        let key = all_correct();
        let expected = [0, 12, 25, 37, 50, 62, 75, 87, 100];
        for n in 0..=QUESTION_COUNT {
            if n > 0 {
                answers[n - 1] = key[n - 1];
            }
            assert_eq!(Assessment::score(&answers).unwrap(), expected[n]);
        }
    }

    #[test]
    fn incomplete_sheet_is_rejected() {
        let err = Assessment::score(&[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            EdnovaError::Incomplete {
                answered: 3,
                expected: QUESTION_COUNT
            }
        ));
        assert!(matches!(
            Assessment::score(&[]).unwrap_err(),
            EdnovaError::Incomplete { answered: 0, .. }
        ));
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(Assessment::classify(0), SkillLevel::Basic);
        assert_eq!(Assessment::classify(49), SkillLevel::Basic);
        assert_eq!(Assessment::classify(50), SkillLevel::Intermediate);
        assert_eq!(Assessment::classify(79), SkillLevel::Intermediate);
        assert_eq!(Assessment::classify(80), SkillLevel::Advanced);
        assert_eq!(Assessment::classify(100), SkillLevel::Advanced);
    }

    #[test]
    fn submit_records_result_and_unlocks_hosting() {
        let mut store = MemoryStore::new();
        let user = User::new(UserId::from_u128(1), "pat", Role::Teacher);
        store.insert_user(&user).unwrap();
        assert!(store.user(user.id).unwrap().unwrap().skill_level.is_none());

        let result = Assessment::submit(&mut store, &user, &all_correct(), NOW).unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.level, SkillLevel::Advanced);
        assert_eq!(
            store.user(user.id).unwrap().unwrap().skill_level,
            Some(SkillLevel::Advanced)
        );
    }

    #[test]
    fn retake_overwrites_level_and_keeps_history() {
        let mut store = MemoryStore::new();
        let user = User::new(UserId::from_u128(1), "pat", Role::Teacher);
        store.insert_user(&user).unwrap();

        Assessment::submit(&mut store, &user, &all_correct(), NOW).unwrap();
        // A worse retake still lowers the level.
        let wrong = vec![usize::MAX; QUESTION_COUNT];
        let retake = Assessment::submit(&mut store, &user, &wrong, NOW.plus_seconds(60)).unwrap();
        assert_eq!(retake.level, SkillLevel::Basic);
        assert_eq!(
            store.user(user.id).unwrap().unwrap().skill_level,
            Some(SkillLevel::Basic)
        );
        assert_eq!(store.skill_results_for_user(user.id).unwrap().len(), 2);
    }

    #[test]
    fn students_cannot_take_the_assessment() {
        let mut store = MemoryStore::new();
        let user = User::new(UserId::from_u128(1), "sam", Role::Student);
        store.insert_user(&user).unwrap();
        let err = Assessment::submit(&mut store, &user, &all_correct(), NOW).unwrap_err();
        assert!(matches!(err, EdnovaError::Capability(_)));
    }
}
