//! Environment-driven configuration for the coordinator.

use std::path::PathBuf;
use std::time::Duration;

/// Points awarded by the vote evaluator. Constants are configuration,
/// not literals at the call sites.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    /// Informed player, correct honest guess
    pub informed_correct: i32,
    /// Extra for a supplied deceiver guess that resolves to a deceiver
    pub informed_deceiver_bonus: i32,
    /// Honest player, informed guessed wrong
    pub honest_evaded: i32,
    /// Each deceiver, informed guessed wrong
    pub deceiver_misdirect: i32,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            informed_correct: 2,
            informed_deceiver_bonus: 1,
            honest_evaded: 3,
            deceiver_misdirect: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Listen port for the HTTP/WebSocket server
    pub port: u16,
    /// How long the honest player has before the reveal is forced
    pub forced_reveal: Duration,
    /// Delay before an ended round rolls into the next one
    pub auto_advance: Duration,
    /// How long closed-room tombstones are retained
    pub closed_room_ttl: Duration,
    /// Interval of the tombstone garbage-collection sweep
    pub sweep_interval: Duration,
    /// Memoization/debounce window for the room list snapshot
    pub room_list_debounce: Duration,
    /// Content root of the question asset collaborator
    pub question_root: PathBuf,
    pub scores: ScoreTable,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            port: 4650,
            forced_reveal: Duration::from_secs(30),
            auto_advance: Duration::from_secs(5),
            closed_room_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(180),
            room_list_debounce: Duration::from_secs(1),
            question_root: PathBuf::from("questions"),
            scores: ScoreTable::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Load config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let score_defaults = defaults.scores.clone();

        Self {
            port: env_parse("HOODWINK_PORT", defaults.port),
            forced_reveal: env_secs("HOODWINK_FORCED_REVEAL_SECS", defaults.forced_reveal),
            auto_advance: env_secs("HOODWINK_AUTO_ADVANCE_SECS", defaults.auto_advance),
            closed_room_ttl: env_secs("HOODWINK_CLOSED_ROOM_TTL_SECS", defaults.closed_room_ttl),
            sweep_interval: env_secs("HOODWINK_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            room_list_debounce: env_secs(
                "HOODWINK_ROOM_LIST_DEBOUNCE_SECS",
                defaults.room_list_debounce,
            ),
            question_root: std::env::var("HOODWINK_QUESTION_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.question_root),
            scores: ScoreTable {
                informed_correct: env_parse(
                    "HOODWINK_SCORE_INFORMED_CORRECT",
                    score_defaults.informed_correct,
                ),
                informed_deceiver_bonus: env_parse(
                    "HOODWINK_SCORE_DECEIVER_BONUS",
                    score_defaults.informed_deceiver_bonus,
                ),
                honest_evaded: env_parse(
                    "HOODWINK_SCORE_HONEST_EVADED",
                    score_defaults.honest_evaded,
                ),
                deceiver_misdirect: env_parse(
                    "HOODWINK_SCORE_DECEIVER_MISDIRECT",
                    score_defaults.deceiver_misdirect,
                ),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(name, default.as_secs()))
}
