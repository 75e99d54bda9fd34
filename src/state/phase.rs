//! Per-room game phase state machine.
//!
//! Message-driven transitions and timer callbacks both funnel through
//! the methods here; every mutation happens under the rooms-map write
//! lock and re-validates phase, so a stale timer can never corrupt a
//! room that has already moved on.

use super::scoring::{evaluate_vote, winning_player};
use super::{AppState, TimerPurpose};
use crate::error::{CoordinatorError, CoordinatorResult, QuestionError};
use crate::protocol::{RoomView, ServerMessage};
use crate::types::*;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

impl AppState {
    /// waiting -> playing. Creator only, needs at least 3 players.
    pub async fn start_game(
        self: &Arc<Self>,
        room_id: &str,
        connection_id: &str,
    ) -> CoordinatorResult<()> {
        let question = self.pick_question().await?;

        let messages = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };
            if !room.is_creator(connection_id) {
                return Err(CoordinatorError::InvalidRoleAction(
                    "only the host can start the game".to_string(),
                ));
            }
            if room.phase != RoomPhase::Waiting {
                return Err(CoordinatorError::InvalidRoleAction(
                    "the game has already started".to_string(),
                ));
            }
            if room.players.len() < 3 {
                return Err(CoordinatorError::InvalidRoleAction(
                    "at least 3 players are needed to start".to_string(),
                ));
            }

            begin_round(room, question);
            round_start_messages(room, false)
        };

        self.send_each(messages).await;
        self.invalidate_room_list().await;
        self.arm_timer(room_id, TimerPurpose::ForcedReveal, self.config.forced_reveal)
            .await;
        tracing::info!("Game started in room {}", room_id);
        Ok(())
    }

    /// The reveal sub-transition. `connection_id` is `None` when the
    /// forced-reveal timer fires on the honest player's behalf. Only the
    /// first reveal per round has effect.
    pub async fn reveal_answer(
        self: &Arc<Self>,
        room_id: &str,
        connection_id: Option<&str>,
    ) -> CoordinatorResult<()> {
        let (messages, view_seconds) = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };
            if room.phase != RoomPhase::Playing {
                return Err(CoordinatorError::InvalidRoleAction(
                    "no round is in progress".to_string(),
                ));
            }
            if let Some(conn) = connection_id {
                let player = room.player_by_connection(conn).ok_or_else(|| {
                    CoordinatorError::InvalidRoleAction("you are not in this room".to_string())
                })?;
                if player.role != Some(Role::Honest) {
                    return Err(CoordinatorError::InvalidRoleAction(
                        "only the honest player can reveal the answer".to_string(),
                    ));
                }
            }
            if room.players.iter().any(|p| p.has_revealed_answer) {
                // Already revealed this round; button and timer may race
                return Ok(());
            }

            let view_seconds = room.settings.answer_view_seconds;
            let ends_at = (chrono::Utc::now() + chrono::Duration::seconds(view_seconds as i64))
                .to_rfc3339();
            room.answer_reveal = Some(AnswerReveal {
                showing: true,
                ends_at: ends_at.clone(),
            });
            let answer_ref = room.current_question.as_ref().map(|q| q.answer_ref.clone());
            if let Some(honest) = room
                .players
                .iter_mut()
                .find(|p| p.role == Some(Role::Honest))
            {
                honest.has_revealed_answer = true;
            }

            let view = RoomView::from(&*room);
            let messages: Vec<(ConnectionId, ServerMessage)> = room
                .players
                .iter()
                .map(|p| {
                    let for_honest = p.role == Some(Role::Honest);
                    (
                        p.connection_id.clone(),
                        ServerMessage::AnswerReveal {
                            room: view.clone(),
                            showing: true,
                            ends_at: Some(ends_at.clone()),
                            answer_ref: if for_honest { answer_ref.clone() } else { None },
                        },
                    )
                })
                .collect();
            (messages, view_seconds)
        };

        self.cancel_timer(room_id, TimerPurpose::ForcedReveal).await;
        self.send_each(messages).await;
        self.arm_timer(
            room_id,
            TimerPurpose::HideAnswer,
            Duration::from_secs(view_seconds),
        )
        .await;
        Ok(())
    }

    /// playing -> voting. Informed player only, after the reveal has
    /// happened and the window has closed again.
    pub async fn start_voting(&self, room_id: &str, connection_id: &str) -> CoordinatorResult<()> {
        let (view, members) = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };
            if room.phase != RoomPhase::Playing {
                return Err(CoordinatorError::InvalidRoleAction(
                    "voting can only start during a round".to_string(),
                ));
            }
            let player = room.player_by_connection(connection_id).ok_or_else(|| {
                CoordinatorError::InvalidRoleAction("you are not in this room".to_string())
            })?;
            if player.role != Some(Role::Informed) {
                return Err(CoordinatorError::InvalidRoleAction(
                    "only the informed player can start voting".to_string(),
                ));
            }
            if !room.players.iter().any(|p| p.has_revealed_answer) {
                return Err(CoordinatorError::InvalidRoleAction(
                    "the answer has not been revealed yet".to_string(),
                ));
            }
            if room.reveal_showing() {
                return Err(CoordinatorError::InvalidRoleAction(
                    "the answer is still showing".to_string(),
                ));
            }

            room.phase = RoomPhase::Voting;
            let members: Vec<ConnectionId> = room
                .players
                .iter()
                .map(|p| p.connection_id.clone())
                .collect();
            (RoomView::from(&*room), members)
        };

        self.cancel_timer(room_id, TimerPurpose::ForcedReveal).await;
        self.send_all(&members, ServerMessage::VotingStarted { room: view })
            .await;
        self.invalidate_room_list().await;
        Ok(())
    }

    /// voting -> ended | completed, driven by the informed player's guess
    pub async fn submit_vote(
        self: &Arc<Self>,
        room_id: &str,
        connection_id: &str,
        honest_guess_id: String,
        deceiver_guess_id: Option<String>,
    ) -> CoordinatorResult<()> {
        let (view, members, outcome) = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                drop(rooms);
                return Err(self.missing_room_error(room_id).await);
            };
            if room.phase != RoomPhase::Voting {
                return Err(CoordinatorError::InvalidRoleAction(
                    "voting is not open".to_string(),
                ));
            }
            let player = room.player_by_connection(connection_id).ok_or_else(|| {
                CoordinatorError::InvalidRoleAction("you are not in this room".to_string())
            })?;
            if player.role != Some(Role::Informed) {
                return Err(CoordinatorError::InvalidRoleAction(
                    "only the informed player can vote".to_string(),
                ));
            }

            let outcome = evaluate_vote(
                &room.players,
                connection_id,
                &honest_guess_id,
                deceiver_guess_id.as_deref(),
                &room.settings,
                room.current_round_index,
                &self.config.scores,
            );

            for player in room.players.iter_mut() {
                if let Some(delta) = outcome.score_deltas.get(&player.connection_id) {
                    player.score += delta;
                }
            }
            room.vote_outcome = Some(outcome.clone());
            if outcome.is_game_over {
                room.winner = winning_player(&room.players).cloned();
                room.phase = RoomPhase::Completed;
                tracing::info!(
                    "Game over in room {}, winner: {:?}",
                    room_id,
                    room.winner.as_ref().map(|w| w.display_name.clone())
                );
            } else {
                room.phase = RoomPhase::Ended;
            }

            let members: Vec<ConnectionId> = room
                .players
                .iter()
                .map(|p| p.connection_id.clone())
                .collect();
            (RoomView::from(&*room), members, outcome)
        };

        let game_over = outcome.is_game_over;
        self.send_all(&members, ServerMessage::VoteResult { room: view, outcome })
            .await;
        self.invalidate_room_list().await;
        if !game_over {
            self.arm_timer(room_id, TimerPurpose::AutoAdvance, self.config.auto_advance)
                .await;
        }
        Ok(())
    }

    /// ended -> playing. `requested_by` is `None` for the auto-advance
    /// timer; a manual request needs the creator. Whichever arrives
    /// first wins, the loser is a no-op because phase has left `ended`.
    pub async fn advance_round(
        self: &Arc<Self>,
        room_id: &str,
        requested_by: Option<&str>,
    ) -> CoordinatorResult<()> {
        {
            let rooms = self.rooms.read().await;
            let Some(room) = rooms.get(room_id) else {
                drop(rooms);
                return match requested_by {
                    Some(_) => Err(self.missing_room_error(room_id).await),
                    None => Ok(()),
                };
            };
            if let Some(conn) = requested_by {
                if !room.is_creator(conn) {
                    return Err(CoordinatorError::InvalidRoleAction(
                        "only the host can start the next round".to_string(),
                    ));
                }
            }
            if room.phase != RoomPhase::Ended {
                return Ok(());
            }
        }

        let question = self.pick_question().await?;

        let messages = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                return Ok(());
            };
            // Re-check after the await: the timer may have beaten us
            if room.phase != RoomPhase::Ended {
                return Ok(());
            }

            room.current_round_index += 1;
            room.current_informed_slot =
                (room.current_informed_slot + 1) % room.players.len();
            begin_round(room, question);
            round_start_messages(room, true)
        };

        self.cancel_timer(room_id, TimerPurpose::AutoAdvance).await;
        self.send_each(messages).await;
        self.invalidate_room_list().await;
        self.arm_timer(room_id, TimerPurpose::ForcedReveal, self.config.forced_reveal)
            .await;
        tracing::info!("Room {} rotated into the next round", room_id);
        Ok(())
    }

    async fn pick_question(&self) -> CoordinatorResult<Question> {
        let mut available = self.questions.available().await?;
        if available.is_empty() {
            return Err(QuestionError::Empty("question provider".to_string()).into());
        }
        let index = rand::rng().random_range(0..available.len());
        Ok(available.swap_remove(index))
    }

    pub(super) async fn forced_reveal_fired(self: &Arc<Self>, room_id: &str) {
        if let Err(err) = self.reveal_answer(room_id, None).await {
            tracing::debug!("Forced reveal skipped for room {}: {}", room_id, err);
        }
    }

    pub(super) async fn hide_answer_fired(self: &Arc<Self>, room_id: &str) {
        let messages = {
            let mut rooms = self.rooms.write().await;
            let Some(room) = rooms.get_mut(room_id) else {
                return;
            };
            if !room.reveal_showing() {
                return;
            }
            if let Some(reveal) = room.answer_reveal.as_mut() {
                reveal.showing = false;
            }

            let view = RoomView::from(&*room);
            room.players
                .iter()
                .map(|p| {
                    (
                        p.connection_id.clone(),
                        ServerMessage::AnswerReveal {
                            room: view.clone(),
                            showing: false,
                            ends_at: None,
                            answer_ref: None,
                        },
                    )
                })
                .collect::<Vec<_>>()
        };
        self.send_each(messages).await;
    }

    pub(super) async fn auto_advance_fired(self: &Arc<Self>, room_id: &str) {
        if let Err(err) = self.advance_round(room_id, None).await {
            tracing::debug!("Auto-advance skipped for room {}: {}", room_id, err);
        }
    }
}

/// Reset per-round state and deal roles for a fresh round
fn begin_round(room: &mut Room, question: Question) {
    room.phase = RoomPhase::Playing;
    room.current_question = Some(question);
    room.answer_reveal = None;
    room.vote_outcome = None;

    let informed_seat = room.current_informed_slot % room.players.len();
    let honest_seat = pick_honest_seat(room.players.len(), informed_seat);
    for (seat, player) in room.players.iter_mut().enumerate() {
        player.has_revealed_answer = false;
        player.role = Some(if seat == informed_seat {
            Role::Informed
        } else if seat == honest_seat {
            Role::Honest
        } else {
            Role::Deceiver
        });
    }
}

/// Uniform over the non-informed seats; rejection sampling terminates
/// in O(1) expected tries for 3+ players
fn pick_honest_seat(player_count: usize, informed_seat: usize) -> usize {
    let mut rng = rand::rng();
    loop {
        let seat = rng.random_range(0..player_count);
        if seat != informed_seat {
            return seat;
        }
    }
}

/// Personalized round-start frames: each player learns only their own role
fn round_start_messages(room: &Room, rotation: bool) -> Vec<(ConnectionId, ServerMessage)> {
    let view = RoomView::from(room);
    room.players
        .iter()
        .filter_map(|p| {
            let role = p.role?;
            let msg = if rotation {
                ServerMessage::NextGameStarted {
                    room: view.clone(),
                    role,
                }
            } else {
                ServerMessage::GameStarted {
                    room: view.clone(),
                    role,
                }
            };
            Some((p.connection_id.clone(), msg))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    async fn role_counts(state: &Arc<AppState>, room_id: &str) -> (usize, usize, usize) {
        let rooms = state.rooms.read().await;
        let room = rooms.get(room_id).unwrap();
        let informed = room
            .players
            .iter()
            .filter(|p| p.role == Some(Role::Informed))
            .count();
        let honest = room
            .players
            .iter()
            .filter(|p| p.role == Some(Role::Honest))
            .count();
        let deceivers = room
            .players
            .iter()
            .filter(|p| p.role == Some(Role::Deceiver))
            .count();
        (informed, honest, deceivers)
    }

    async fn honest_connection(state: &Arc<AppState>, room_id: &str) -> ConnectionId {
        let rooms = state.rooms.read().await;
        let room = rooms.get(room_id).unwrap();
        room.player_with_role(Role::Honest)
            .unwrap()
            .connection_id
            .clone()
    }

    async fn informed_connection(state: &Arc<AppState>, room_id: &str) -> ConnectionId {
        let rooms = state.rooms.read().await;
        let room = rooms.get(room_id).unwrap();
        room.player_with_role(Role::Informed)
            .unwrap()
            .connection_id
            .clone()
    }

    /// Drive the room from freshly-started to open-for-voting
    async fn reveal_and_close_window(state: &Arc<AppState>, room_id: &str) {
        let honest = honest_connection(state, room_id).await;
        state.reveal_answer(room_id, Some(&honest)).await.unwrap();
        state.hide_answer_fired(room_id).await;
    }

    #[tokio::test]
    async fn start_game_assigns_one_informed_one_honest() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol", "Dave"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        assert_eq!(role_counts(&state, &room_id).await, (1, 1, 2));

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert_eq!(room.phase, RoomPhase::Playing);
        assert!(room.current_question.is_some());
        // Round 0: informed is the creator's seat
        assert_eq!(room.players[0].role, Some(Role::Informed));
        assert!(room.players.iter().all(|p| !p.has_revealed_answer));
        drop(rooms);

        assert!(state.timer_armed(&room_id, TimerPurpose::ForcedReveal).await);
    }

    #[tokio::test]
    async fn start_game_requires_creator_and_three_players() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;

        let result = state.start_game(&room_id, "c1").await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        let small = test_state();
        let small_id = seeded_room(&small, &["Alice", "Bob"]).await;
        let result = small.start_game(&small_id, "c0").await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));
    }

    #[tokio::test]
    async fn start_game_twice_is_rejected() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        let result = state.start_game(&room_id, "c0").await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));
    }

    #[tokio::test]
    async fn reveal_is_honest_only_and_idempotent() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        let informed = informed_connection(&state, &room_id).await;
        let result = state.reveal_answer(&room_id, Some(&informed)).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        let honest = honest_connection(&state, &room_id).await;
        state.reveal_answer(&room_id, Some(&honest)).await.unwrap();
        {
            let rooms = state.rooms.read().await;
            let room = rooms.get(&room_id).unwrap();
            assert!(room.reveal_showing());
            assert!(room.player_with_role(Role::Honest).unwrap().has_revealed_answer);
        }
        assert!(!state.timer_armed(&room_id, TimerPurpose::ForcedReveal).await);
        assert!(state.timer_armed(&room_id, TimerPurpose::HideAnswer).await);

        // Second press changes nothing
        state.reveal_answer(&room_id, Some(&honest)).await.unwrap();
        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert!(room.player_with_role(Role::Honest).unwrap().has_revealed_answer);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_reveal_fires_when_honest_player_stalls() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        tokio::time::sleep(state.config.forced_reveal + Duration::from_secs(1)).await;

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert!(room.player_with_role(Role::Honest).unwrap().has_revealed_answer);
        assert!(room.reveal_showing());
    }

    #[tokio::test(start_paused = true)]
    async fn hide_timer_closes_the_window() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        let honest = honest_connection(&state, &room_id).await;
        state.reveal_answer(&room_id, Some(&honest)).await.unwrap();

        let view_seconds = {
            let rooms = state.rooms.read().await;
            rooms.get(&room_id).unwrap().settings.answer_view_seconds
        };
        tokio::time::sleep(Duration::from_secs(view_seconds + 1)).await;

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert!(!room.reveal_showing());
        assert!(
            room.player_with_role(Role::Honest).unwrap().has_revealed_answer,
            "hiding must not clear the reveal flag"
        );
    }

    #[tokio::test]
    async fn voting_requires_reveal_and_closed_window() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        let informed = informed_connection(&state, &room_id).await;
        let honest = honest_connection(&state, &room_id).await;

        let result = state.start_voting(&room_id, &informed).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        state.reveal_answer(&room_id, Some(&honest)).await.unwrap();
        let result = state.start_voting(&room_id, &informed).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        state.hide_answer_fired(&room_id).await;
        let result = state.start_voting(&room_id, &honest).await;
        assert!(
            matches!(result, Err(CoordinatorError::InvalidRoleAction(_))),
            "only the informed player may open voting"
        );

        state.start_voting(&room_id, &informed).await.unwrap();
        let rooms = state.rooms.read().await;
        assert_eq!(rooms.get(&room_id).unwrap().phase, RoomPhase::Voting);
    }

    #[tokio::test]
    async fn correct_vote_awards_informed_and_ends_round() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol", "Dave"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        reveal_and_close_window(&state, &room_id).await;

        let informed = informed_connection(&state, &room_id).await;
        let honest = honest_connection(&state, &room_id).await;
        state.start_voting(&room_id, &informed).await.unwrap();
        state
            .submit_vote(&room_id, &informed, honest.clone(), None)
            .await
            .unwrap();

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert_eq!(room.phase, RoomPhase::Ended);
        let outcome = room.vote_outcome.as_ref().unwrap();
        assert!(outcome.honest_guess_correct);
        assert!(!outcome.is_game_over);
        let informed_player = room.player_by_connection(&informed).unwrap();
        assert_eq!(
            informed_player.score,
            state.config.scores.informed_correct
        );
        drop(rooms);

        assert!(state.timer_armed(&room_id, TimerPurpose::AutoAdvance).await);
    }

    #[tokio::test]
    async fn wrong_vote_awards_honest_and_deceivers() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol", "Dave"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        reveal_and_close_window(&state, &room_id).await;

        let informed = informed_connection(&state, &room_id).await;
        let honest = honest_connection(&state, &room_id).await;
        let deceiver = {
            let rooms = state.rooms.read().await;
            rooms
                .get(&room_id)
                .unwrap()
                .player_with_role(Role::Deceiver)
                .unwrap()
                .connection_id
                .clone()
        };

        state.start_voting(&room_id, &informed).await.unwrap();
        state
            .submit_vote(&room_id, &informed, deceiver, None)
            .await
            .unwrap();

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        let outcome = room.vote_outcome.as_ref().unwrap();
        assert!(!outcome.honest_guess_correct);
        assert_eq!(
            room.player_by_connection(&honest).unwrap().score,
            state.config.scores.honest_evaded
        );
        for deceiver in room
            .players
            .iter()
            .filter(|p| p.role == Some(Role::Deceiver))
        {
            assert_eq!(deceiver.score, state.config.scores.deceiver_misdirect);
        }
        assert_eq!(room.player_by_connection(&informed).unwrap().score, 0);
    }

    #[tokio::test]
    async fn vote_from_non_informed_never_mutates() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        reveal_and_close_window(&state, &room_id).await;
        let informed = informed_connection(&state, &room_id).await;
        let honest = honest_connection(&state, &room_id).await;
        state.start_voting(&room_id, &informed).await.unwrap();

        let result = state
            .submit_vote(&room_id, &honest, honest.clone(), None)
            .await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert_eq!(room.phase, RoomPhase::Voting);
        assert!(room.vote_outcome.is_none());
        assert!(room.players.iter().all(|p| p.score == 0));
    }

    #[tokio::test]
    async fn informed_slot_rotates_in_seat_order() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();

        for round in 0..6u32 {
            {
                let rooms = state.rooms.read().await;
                let room = rooms.get(&room_id).unwrap();
                let expected_seat = (round as usize) % room.players.len();
                assert_eq!(room.current_informed_slot, expected_seat);
                assert_eq!(room.players[expected_seat].role, Some(Role::Informed));
                let honest_seat = room
                    .players
                    .iter()
                    .position(|p| p.role == Some(Role::Honest))
                    .unwrap();
                assert_ne!(honest_seat, expected_seat);
            }
            // Force the round to its end and rotate manually
            {
                let mut rooms = state.rooms.write().await;
                rooms.get_mut(&room_id).unwrap().phase = RoomPhase::Ended;
            }
            state.advance_round(&room_id, Some("c0")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn manual_advance_is_idempotent_with_timer() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        {
            let mut rooms = state.rooms.write().await;
            rooms.get_mut(&room_id).unwrap().phase = RoomPhase::Ended;
        }

        state.advance_round(&room_id, Some("c0")).await.unwrap();
        let index_after_first = {
            let rooms = state.rooms.read().await;
            rooms.get(&room_id).unwrap().current_round_index
        };

        // The losing trigger finds phase != ended and does nothing
        state.advance_round(&room_id, None).await.unwrap();
        state.advance_round(&room_id, Some("c0")).await.unwrap();

        let rooms = state.rooms.read().await;
        let room = rooms.get(&room_id).unwrap();
        assert_eq!(room.current_round_index, index_after_first);
        assert_eq!(room.phase, RoomPhase::Playing);
    }

    #[tokio::test]
    async fn advance_requires_creator_when_manual() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        {
            let mut rooms = state.rooms.write().await;
            rooms.get_mut(&room_id).unwrap().phase = RoomPhase::Ended;
        }

        let result = state.advance_round(&room_id, Some("c1")).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));
    }

    #[tokio::test]
    async fn completed_room_issues_no_further_transitions() {
        let state = test_state();
        let room_id = seeded_room(&state, &["Alice", "Bob", "Carol"]).await;
        state.start_game(&room_id, "c0").await.unwrap();
        {
            let mut rooms = state.rooms.write().await;
            rooms.get_mut(&room_id).unwrap().phase = RoomPhase::Completed;
        }

        // Timer-style advance is a silent no-op, reveal is rejected
        state.advance_round(&room_id, None).await.unwrap();
        let result = state.reveal_answer(&room_id, None).await;
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoleAction(_))
        ));

        let rooms = state.rooms.read().await;
        assert_eq!(rooms.get(&room_id).unwrap().phase, RoomPhase::Completed);
    }
}
