//! In-memory state of a single quiz session: roster, question list, answer
//! ledger, and the cached leaderboard order.

use std::collections::HashMap;
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::machine::SessionPhase;
use crate::state::scoring::score_answer;

/// Number of characters in a session code.
const CODE_LENGTH: usize = 6;

/// Six-character `[A-Z0-9]` identifier of a quiz session.
///
/// Codes are case-normalized to uppercase on entry so `abc123` and `ABC123`
/// address the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode(String);

/// Error returned when a raw string does not form a valid session code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session codes are {CODE_LENGTH} characters from A-Z and 0-9")]
pub struct InvalidSessionCode;

impl SessionCode {
    /// Normalize and validate a raw code supplied by a client.
    pub fn parse(raw: &str) -> Result<Self, InvalidSessionCode> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() != CODE_LENGTH
            || !normalized
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(InvalidSessionCode);
        }
        Ok(Self(normalized))
    }

    /// The normalized code text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a participant holds inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Privileged participant driving content loading and round progression.
    Host,
    /// Scored participant submitting answers.
    Player,
}

/// A connected participant and their running score.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Synthetic identity, stable across reconnects of the same display name.
    pub id: Uuid,
    /// Identity of the WebSocket connection currently bound to this entry.
    pub connection_id: Uuid,
    /// Name chosen at join time; unique within the session.
    pub display_name: String,
    /// Host or player.
    pub role: Role,
    /// Cumulative score; only ever increases.
    pub score: u32,
}

/// One quiz question, immutable once loaded into a session.
#[derive(Debug, Clone)]
pub struct Question {
    /// Question text shown to participants.
    pub text: String,
    /// Ordered answer options; at least two.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option_index: usize,
    /// Countdown length for this question, in seconds.
    pub time_limit_seconds: u32,
}

/// A participant's single-shot answer for the current question.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRecord {
    /// Option the participant selected.
    pub selected_option_index: usize,
    /// Client-reported seconds between question display and submission.
    pub elapsed_seconds: u32,
}

/// Per-participant outcome of a finished round.
#[derive(Debug, Clone)]
pub struct RoundResult {
    /// Name of the answering participant.
    pub display_name: String,
    /// Option the participant selected.
    pub selected_option_index: usize,
    /// Correct option for the question, revealed with the results.
    pub correct_option_index: usize,
    /// Whether the selection matched the correct option.
    pub is_correct: bool,
    /// Points granted for this answer.
    pub points_awarded: u32,
    /// Participant's cumulative score after the award.
    pub total_score: u32,
}

/// Rejections for an answer submission that leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// No question is currently accepting answers.
    #[error("no question is currently open for answers")]
    NoOpenQuestion,
    /// The participant already answered the current question.
    #[error("answer for the current question was already recorded")]
    AlreadyAnswered,
    /// The submitting connection is not bound to a roster entry.
    #[error("connection is not a participant of this session")]
    UnknownParticipant,
}

/// The per-session state machine instance.
///
/// All mutation goes through the methods below so the roster uniqueness,
/// answer-ledger immutability, and leaderboard invariants hold at every
/// broadcast point.
#[derive(Debug)]
pub struct GameSession {
    /// Code this session is registered under.
    pub code: SessionCode,
    /// Creation timestamp for auditing and the inspection endpoint.
    pub created_at: SystemTime,
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Participants keyed by stable id, in join order.
    pub participants: IndexMap<Uuid, Participant>,
    /// Loaded question list; empty until the host loads content.
    pub questions: Vec<Question>,
    /// Progress pointer into `questions`.
    pub current_question_index: usize,
    /// Index of the question currently displayed, if any.
    pub active_question: Option<usize>,
    /// Answer ledger for the active question, keyed by participant id.
    pub answers: HashMap<Uuid, AnswerRecord>,
    /// Player ids ordered by descending score; refreshed on every change.
    pub leaderboard: Vec<Uuid>,
    /// Seconds remaining on the live countdown, kept fresh for resync.
    pub time_left: u32,
    /// When the host last started the game.
    pub started_at: Option<SystemTime>,
}

impl GameSession {
    /// Fresh session in `Waiting` with an empty roster and no content.
    pub fn new(code: SessionCode) -> Self {
        Self {
            code,
            created_at: SystemTime::now(),
            phase: SessionPhase::Waiting,
            participants: IndexMap::new(),
            questions: Vec::new(),
            current_question_index: 0,
            active_question: None,
            answers: HashMap::new(),
            leaderboard: Vec::new(),
            time_left: 0,
            started_at: None,
        }
    }

    /// Upsert a participant under the display-name uniqueness rule.
    ///
    /// A rejoin with a name already on the roster keeps that entry's stable
    /// id, score, and roster position, and rebinds it to the new connection.
    /// Returns the participant's stable id.
    pub fn join(&mut self, display_name: &str, role: Role, connection_id: Uuid) -> Uuid {
        let existing = self
            .participants
            .values_mut()
            .find(|p| p.display_name == display_name);

        let id = match existing {
            Some(participant) => {
                participant.connection_id = connection_id;
                participant.role = role;
                participant.id
            }
            None => {
                let id = Uuid::new_v4();
                self.participants.insert(
                    id,
                    Participant {
                        id,
                        connection_id,
                        display_name: display_name.to_owned(),
                        role,
                        score: 0,
                    },
                );
                id
            }
        };

        self.recompute_leaderboard();
        id
    }

    /// Remove the participant bound to `connection_id`, preserving roster
    /// order of the remaining entries. Returns the removed entry.
    pub fn remove_by_connection(&mut self, connection_id: Uuid) -> Option<Participant> {
        let id = self
            .participants
            .values()
            .find(|p| p.connection_id == connection_id)?
            .id;
        let removed = self.participants.shift_remove(&id);
        self.recompute_leaderboard();
        removed
    }

    /// Look up the participant bound to a connection.
    pub fn participant_by_connection(&self, connection_id: Uuid) -> Option<&Participant> {
        self.participants
            .values()
            .find(|p| p.connection_id == connection_id)
    }

    /// Connected host entries, in join order.
    pub fn hosts(&self) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(|p| matches!(p.role, Role::Host))
    }

    /// Replace the question list and rewind progress to the first question.
    ///
    /// Scores survive a reload; only round-scoped state is discarded.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.current_question_index = 0;
        self.active_question = None;
        self.answers.clear();
        self.time_left = 0;
    }

    /// Reset round-scoped state for a (re)start and stamp the start time.
    pub fn reset_for_start(&mut self) {
        self.current_question_index = 0;
        self.active_question = None;
        self.answers.clear();
        self.time_left = 0;
        self.started_at = Some(SystemTime::now());
    }

    /// Open question `index` for answers: publish it as active, clear the
    /// answer ledger, and arm the countdown value.
    pub fn begin_question(&mut self, index: usize) -> Option<&Question> {
        let question = self.questions.get(index)?;
        let time_limit = question.time_limit_seconds;
        self.current_question_index = index;
        self.active_question = Some(index);
        self.answers.clear();
        self.time_left = time_limit;
        self.questions.get(index)
    }

    /// The question currently displayed to participants, if any.
    pub fn active_question(&self) -> Option<&Question> {
        self.active_question.and_then(|i| self.questions.get(i))
    }

    /// Total number of loaded questions.
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Record a single-shot answer for the active question and apply its
    /// score immediately.
    ///
    /// Later submissions by the same participant for the same question are
    /// rejected, never merged. Returns the points awarded.
    pub fn record_answer(
        &mut self,
        participant_id: Uuid,
        selected_option_index: usize,
        elapsed_seconds: u32,
    ) -> Result<u32, SubmitError> {
        let question = self.active_question().ok_or(SubmitError::NoOpenQuestion)?;
        if self.answers.contains_key(&participant_id) {
            return Err(SubmitError::AlreadyAnswered);
        }

        let is_correct = selected_option_index == question.correct_option_index;
        let awarded = score_answer(is_correct, elapsed_seconds, question.time_limit_seconds);

        let participant = self
            .participants
            .get_mut(&participant_id)
            .ok_or(SubmitError::UnknownParticipant)?;
        participant.score += awarded;

        self.answers.insert(
            participant_id,
            AnswerRecord {
                selected_option_index,
                elapsed_seconds,
            },
        );
        self.recompute_leaderboard();

        Ok(awarded)
    }

    /// Build the outcome list for the active question, in roster order.
    ///
    /// Participants without an answer record are absent; a round nobody
    /// answered yields an empty list.
    pub fn round_results(&self) -> Vec<RoundResult> {
        let Some(question) = self.active_question() else {
            return Vec::new();
        };

        self.participants
            .values()
            .filter_map(|participant| {
                let answer = self.answers.get(&participant.id)?;
                let is_correct = answer.selected_option_index == question.correct_option_index;
                Some(RoundResult {
                    display_name: participant.display_name.clone(),
                    selected_option_index: answer.selected_option_index,
                    correct_option_index: question.correct_option_index,
                    is_correct,
                    points_awarded: score_answer(
                        is_correct,
                        answer.elapsed_seconds,
                        question.time_limit_seconds,
                    ),
                    total_score: participant.score,
                })
            })
            .collect()
    }

    /// Refresh the cached leaderboard order: players only, descending score,
    /// ties kept in join order (stable sort over the insertion-ordered
    /// roster).
    pub fn recompute_leaderboard(&mut self) {
        let mut players: Vec<&Participant> = self
            .participants
            .values()
            .filter(|p| matches!(p.role, Role::Player))
            .collect();
        players.sort_by_key(|p| std::cmp::Reverse(p.score));
        self.leaderboard = players.into_iter().map(|p| p.id).collect();
    }

    /// Resolve the cached leaderboard order into participant entries.
    pub fn leaderboard_entries(&self) -> Vec<&Participant> {
        self.leaderboard
            .iter()
            .filter_map(|id| self.participants.get(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> SessionCode {
        SessionCode::parse("AB12CD").unwrap()
    }

    fn question(limit: u32) -> Question {
        Question {
            text: "capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into()],
            correct_option_index: 0,
            time_limit_seconds: limit,
        }
    }

    #[test]
    fn codes_are_normalized_to_uppercase() {
        assert_eq!(SessionCode::parse("ab12cd").unwrap().as_str(), "AB12CD");
        assert_eq!(SessionCode::parse(" AB12CD ").unwrap().as_str(), "AB12CD");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for raw in ["", "ABC12", "ABC1234", "AB 12C", "AB-12C"] {
            assert!(SessionCode::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn rejoin_by_name_keeps_identity_and_score() {
        let mut session = GameSession::new(code());
        let first_conn = Uuid::new_v4();
        let id = session.join("ada", Role::Player, first_conn);

        session.questions = vec![question(30)];
        session.begin_question(0);
        session.record_answer(id, 0, 5).unwrap();
        assert_eq!(session.participants[&id].score, 150);

        let second_conn = Uuid::new_v4();
        let rejoined = session.join("ada", Role::Player, second_conn);

        assert_eq!(rejoined, id);
        assert_eq!(session.participants.len(), 1);
        assert_eq!(session.participants[&id].connection_id, second_conn);
        assert_eq!(session.participants[&id].score, 150);
    }

    #[test]
    fn duplicate_answers_are_dropped_not_merged() {
        let mut session = GameSession::new(code());
        let id = session.join("ada", Role::Player, Uuid::new_v4());
        session.questions = vec![question(30)];
        session.begin_question(0);

        assert_eq!(session.record_answer(id, 0, 5).unwrap(), 150);
        assert_eq!(
            session.record_answer(id, 1, 1),
            Err(SubmitError::AlreadyAnswered)
        );

        // First record stands untouched.
        assert_eq!(session.answers[&id].selected_option_index, 0);
        assert_eq!(session.participants[&id].score, 150);
    }

    #[test]
    fn answers_need_an_open_question() {
        let mut session = GameSession::new(code());
        let id = session.join("ada", Role::Player, Uuid::new_v4());
        assert_eq!(
            session.record_answer(id, 0, 5),
            Err(SubmitError::NoOpenQuestion)
        );
    }

    #[test]
    fn leaderboard_excludes_host_and_keeps_stable_ties() {
        let mut session = GameSession::new(code());
        session.join("teacher", Role::Host, Uuid::new_v4());
        let a = session.join("ada", Role::Player, Uuid::new_v4());
        let b = session.join("bob", Role::Player, Uuid::new_v4());
        let c = session.join("cyd", Role::Player, Uuid::new_v4());

        session.questions = vec![question(30)];
        session.begin_question(0);
        // bob scores, ada and cyd stay tied at zero.
        session.record_answer(b, 0, 10).unwrap();

        let names: Vec<&str> = session
            .leaderboard_entries()
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(names, ["bob", "ada", "cyd"]);
        assert_eq!(session.leaderboard, vec![b, a, c]);
    }

    #[test]
    fn round_results_are_empty_without_answers() {
        let mut session = GameSession::new(code());
        session.join("ada", Role::Player, Uuid::new_v4());
        session.questions = vec![question(30)];
        session.begin_question(0);
        assert!(session.round_results().is_empty());
    }

    #[test]
    fn round_results_reveal_the_correct_option() {
        let mut session = GameSession::new(code());
        let ada = session.join("ada", Role::Player, Uuid::new_v4());
        let bob = session.join("bob", Role::Player, Uuid::new_v4());
        session.questions = vec![question(20)];
        session.begin_question(0);

        session.record_answer(ada, 0, 4).unwrap();
        session.record_answer(bob, 1, 2).unwrap();

        let results = session.round_results();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_correct);
        assert_eq!(results[0].points_awarded, 100 + 16 * 2);
        assert!(!results[1].is_correct);
        assert_eq!(results[1].points_awarded, 0);
        assert_eq!(results[1].correct_option_index, 0);
    }

    #[test]
    fn beginning_a_question_clears_the_ledger_and_arms_the_clock() {
        let mut session = GameSession::new(code());
        let id = session.join("ada", Role::Player, Uuid::new_v4());
        session.questions = vec![question(30), question(15)];

        session.begin_question(0);
        session.record_answer(id, 0, 5).unwrap();
        assert_eq!(session.answers.len(), 1);

        session.begin_question(1);
        assert!(session.answers.is_empty());
        assert_eq!(session.time_left, 15);
        assert_eq!(session.current_question_index, 1);
    }

    #[test]
    fn disconnect_discards_history() {
        let mut session = GameSession::new(code());
        let conn = Uuid::new_v4();
        let id = session.join("ada", Role::Player, conn);
        session.questions = vec![question(30)];
        session.begin_question(0);
        session.record_answer(id, 0, 5).unwrap();

        let removed = session.remove_by_connection(conn).unwrap();
        assert_eq!(removed.score, 150);
        assert!(session.participants.is_empty());
        assert!(session.leaderboard.is_empty());
    }
}
