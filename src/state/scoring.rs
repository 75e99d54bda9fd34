//! Pure vote evaluation: score deltas and game-over detection.
//!
//! Award constants come from [`ScoreTable`] so deployments can tune
//! them without touching this logic.

use crate::config::ScoreTable;
use crate::types::*;
use std::collections::HashMap;

/// Evaluate the informed player's guess against the current roles.
/// Deltas are returned, not applied; the caller owns the mutation.
pub fn evaluate_vote(
    players: &[Player],
    informed_connection_id: &str,
    honest_guess_id: &str,
    deceiver_guess_id: Option<&str>,
    settings: &RoomSettings,
    current_round_index: u32,
    table: &ScoreTable,
) -> VoteOutcome {
    let honest = players.iter().find(|p| p.role == Some(Role::Honest));
    let honest_guess_correct = honest
        .map(|h| h.connection_id == honest_guess_id)
        .unwrap_or(false);

    // A deceiver guess is correct only when it resolves to an actual deceiver
    let deceiver_guess_correct = deceiver_guess_id.map(|guess| {
        players
            .iter()
            .any(|p| p.connection_id == guess && p.role == Some(Role::Deceiver))
    });

    let mut score_deltas: HashMap<ConnectionId, i32> = HashMap::new();
    if honest_guess_correct {
        let mut award = table.informed_correct;
        if deceiver_guess_correct == Some(true) {
            award += table.informed_deceiver_bonus;
        }
        score_deltas.insert(informed_connection_id.to_string(), award);
    } else {
        if let Some(honest) = honest {
            score_deltas.insert(honest.connection_id.clone(), table.honest_evaded);
        }
        for deceiver in players.iter().filter(|p| p.role == Some(Role::Deceiver)) {
            score_deltas.insert(deceiver.connection_id.clone(), table.deceiver_misdirect);
        }
    }

    let reached_goal = players.iter().any(|p| {
        let delta = score_deltas.get(&p.connection_id).copied().unwrap_or(0);
        p.score + delta >= settings.points_to_win
    });
    let was_last_round = current_round_index + 1 >= settings.total_rounds;

    VoteOutcome {
        informed_connection_id: informed_connection_id.to_string(),
        honest_guess_id: honest_guess_id.to_string(),
        deceiver_guess_id: deceiver_guess_id.map(str::to_string),
        honest_guess_correct,
        deceiver_guess_correct,
        score_deltas,
        is_game_over: reached_goal || was_last_round,
    }
}

/// Highest score wins; ties break toward the earlier seat
pub fn winning_player(players: &[Player]) -> Option<&Player> {
    players.iter().fold(None, |best, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ScoreTable {
        ScoreTable::default()
    }

    fn settings(points_to_win: i32, total_rounds: u32) -> RoomSettings {
        RoomSettings {
            points_to_win,
            total_rounds,
            ..RoomSettings::default()
        }
    }

    /// informed at seat 0, honest at seat 1, deceivers at 2+
    fn cast(count: usize) -> Vec<Player> {
        (0..count)
            .map(|i| {
                let mut p = Player::new(format!("c{}", i), format!("P{}", i));
                p.role = Some(match i {
                    0 => Role::Informed,
                    1 => Role::Honest,
                    _ => Role::Deceiver,
                });
                p
            })
            .collect()
    }

    #[test]
    fn correct_guess_awards_informed() {
        let players = cast(4);
        let outcome = evaluate_vote(&players, "c0", "c1", None, &settings(10, 5), 0, &table());

        assert!(outcome.honest_guess_correct);
        assert_eq!(outcome.deceiver_guess_correct, None);
        assert_eq!(outcome.score_deltas.get("c0"), Some(&2));
        assert_eq!(outcome.score_deltas.len(), 1);
        assert!(!outcome.is_game_over);
    }

    #[test]
    fn correct_deceiver_guess_adds_bonus() {
        let players = cast(4);
        let outcome = evaluate_vote(
            &players,
            "c0",
            "c1",
            Some("c2"),
            &settings(10, 5),
            0,
            &table(),
        );

        assert_eq!(outcome.deceiver_guess_correct, Some(true));
        assert_eq!(outcome.score_deltas.get("c0"), Some(&3));
    }

    #[test]
    fn deceiver_guess_naming_honest_earns_no_bonus() {
        let players = cast(4);
        let outcome = evaluate_vote(
            &players,
            "c0",
            "c1",
            Some("c1"),
            &settings(10, 5),
            0,
            &table(),
        );

        assert_eq!(outcome.deceiver_guess_correct, Some(false));
        assert_eq!(outcome.score_deltas.get("c0"), Some(&2));
    }

    #[test]
    fn missed_guess_rewards_honest_and_deceivers() {
        let players = cast(5);
        let outcome = evaluate_vote(&players, "c0", "c3", None, &settings(10, 5), 0, &table());

        assert!(!outcome.honest_guess_correct);
        assert_eq!(outcome.score_deltas.get("c0"), None);
        assert_eq!(outcome.score_deltas.get("c1"), Some(&3));
        assert_eq!(outcome.score_deltas.get("c2"), Some(&1));
        assert_eq!(outcome.score_deltas.get("c3"), Some(&1));
        assert_eq!(outcome.score_deltas.get("c4"), Some(&1));
    }

    #[test]
    fn game_over_when_any_player_reaches_goal() {
        let mut players = cast(4);
        // The honest player sits at 8 points; evading pushes them to 11
        players[1].score = 8;
        let outcome = evaluate_vote(&players, "c0", "c2", None, &settings(10, 99), 0, &table());

        assert!(outcome.is_game_over);
    }

    #[test]
    fn game_over_on_last_round() {
        let players = cast(3);
        let outcome = evaluate_vote(&players, "c0", "c1", None, &settings(100, 3), 2, &table());
        assert!(outcome.is_game_over);

        let outcome = evaluate_vote(&players, "c0", "c1", None, &settings(100, 3), 1, &table());
        assert!(!outcome.is_game_over);
    }

    #[test]
    fn winner_is_max_score_even_if_not_the_scorer() {
        let mut players = cast(4);
        players[2].score = 12;
        players[1].score = 11;

        let winner = winning_player(&players).unwrap();
        assert_eq!(winner.connection_id, "c2");
    }

    #[test]
    fn winner_ties_break_toward_earlier_seat() {
        let mut players = cast(4);
        players[1].score = 7;
        players[3].score = 7;

        let winner = winning_player(&players).unwrap();
        assert_eq!(winner.connection_id, "c1");
    }

    #[test]
    fn no_winner_in_empty_room() {
        assert!(winning_player(&[]).is_none());
    }

    #[test]
    fn custom_table_constants_are_respected() {
        let players = cast(3);
        let custom = ScoreTable {
            informed_correct: 5,
            informed_deceiver_bonus: 2,
            honest_evaded: 7,
            deceiver_misdirect: 4,
        };
        let outcome = evaluate_vote(&players, "c0", "c1", None, &settings(100, 9), 0, &custom);
        assert_eq!(outcome.score_deltas.get("c0"), Some(&5));

        let outcome = evaluate_vote(&players, "c0", "c2", None, &settings(100, 9), 0, &custom);
        assert_eq!(outcome.score_deltas.get("c1"), Some(&7));
        assert_eq!(outcome.score_deltas.get("c2"), Some(&4));
    }
}
