//! # Protocol Constants
//!
//! Hardcoded runtime constants for the EdNova CORE.
//!
//! EdNova starts with zero data but fixed rules. These constants are
//! compiled into the binary and are immutable at runtime; every validation
//! and admission decision in the core derives from them.

/// The join window in seconds.
///
/// A participant may enter the conference room once
/// `scheduled_time - now <= JOIN_WINDOW_SECS`. The boundary is inclusive:
/// exactly fifteen minutes early is admitted. There is no upper bound on
/// lateness while the session remains scheduled.
pub const JOIN_WINDOW_SECS: i64 = 15 * 60;

/// Lowest accepted feedback rating.
pub const RATING_MIN: u8 = 1;

/// Highest accepted feedback rating.
pub const RATING_MAX: u8 = 5;

/// Shortest bookable session in minutes.
pub const MIN_DURATION_MINUTES: u32 = 15;

/// Longest bookable session in minutes (8 hours).
pub const MAX_DURATION_MINUTES: u32 = 480;

/// Number of questions in the skill assessment bank.
///
/// A submission must answer every question; partial submissions are
/// rejected before scoring.
pub const QUESTION_COUNT: usize = 8;

/// Score at or above which a teacher is classified Advanced.
pub const ADVANCED_THRESHOLD: u8 = 80;

/// Score at or above which a teacher is classified Intermediate.
pub const INTERMEDIATE_THRESHOLD: u8 = 50;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for session titles.
///
/// Titles longer than this will be rejected at creation.
/// This prevents memory exhaustion from malicious or malformed input.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for session descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 4096;

/// Maximum length for a single session note.
///
/// Notes longer than this (16KB) will be rejected by the recorder.
pub const MAX_NOTE_LENGTH: usize = 16384;

/// Maximum length for a feedback comment.
pub const MAX_COMMENT_LENGTH: usize = 2048;

/// Maximum length for a display name.
pub const MAX_NAME_LENGTH: usize = 120;

// =============================================================================
// ROOM REFERENCE FORMAT
// =============================================================================

/// Conference provider base URL for generated room references.
pub const ROOM_BASE_URL: &str = "https://meet.jit.si";

/// Prefix namespacing EdNova rooms on the shared provider.
pub const ROOM_PREFIX: &str = "ednova-";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_window_is_fifteen_minutes() {
        assert_eq!(JOIN_WINDOW_SECS, 900);
    }

    #[test]
    fn rating_bounds_are_sane() {
        assert!(RATING_MIN < RATING_MAX);
        assert_eq!(RATING_MIN, 1);
        assert_eq!(RATING_MAX, 5);
    }

    #[test]
    fn classification_thresholds_are_ordered() {
        assert!(INTERMEDIATE_THRESHOLD < ADVANCED_THRESHOLD);
    }
}
