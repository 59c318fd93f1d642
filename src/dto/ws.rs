//! The WebSocket command/event protocol.
//!
//! Both directions are `type`-tagged JSON objects with camelCase payload
//! fields, e.g. `{"type":"join","code":"AB12CD","displayName":"ada",
//! "role":"player"}`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::session::{
    FinalScore, ParticipantSummary, QuestionInput, QuestionPublic, RoundResultSummary,
    StateSnapshot,
};
use crate::state::machine::SessionPhase;
use crate::state::session::Role;

/// Commands accepted from connected clients. The session code is required
/// on every command; validation happens before any session state is
/// touched.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Enter (or create) the session under `code`.
    Join {
        /// Session code to join.
        code: String,
        /// Display name, unique within the session.
        display_name: String,
        /// Claimed role, supplied by the external auth layer.
        role: Role,
    },
    /// Replace the session's question list. Host only, `waiting` only.
    LoadQuestions {
        /// Session code.
        code: String,
        /// Validated ordered question list.
        questions: Vec<QuestionInput>,
    },
    /// Start (or restart) the game. Host only.
    Start {
        /// Session code.
        code: String,
    },
    /// End the game immediately. Host only.
    End {
        /// Session code.
        code: String,
    },
    /// Submit a single-shot answer for the current question.
    SubmitAnswer {
        /// Session code.
        code: String,
        /// Selected option index.
        selected_option_index: usize,
        /// Client-reported seconds since the question was displayed.
        elapsed_seconds: u32,
    },
    /// Ask for the current roster.
    RequestRoster {
        /// Session code.
        code: String,
    },
    /// Ask for a full state snapshot (resynchronization).
    RequestState {
        /// Session code.
        code: String,
    },
    /// Unrecognized command type; answered with an error event.
    #[serde(other)]
    Unknown,
}

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full state snapshot: the join response and the resync payload.
    StateSnapshot(StateSnapshot),
    /// Roster changed (join or disconnect).
    RosterUpdated {
        /// Participants in join order.
        participants: Vec<ParticipantSummary>,
        /// Phase at the time of the change.
        state: SessionPhase,
    },
    /// Host-only notification that a player joined.
    HostNotifyJoin {
        /// The participant that just joined.
        new_participant: ParticipantSummary,
        /// Roster after the join.
        full_roster: Vec<ParticipantSummary>,
        /// Phase at the time of the join.
        state: SessionPhase,
    },
    /// The host started the game.
    GameStarted {
        /// Number of questions in the run.
        total_questions: usize,
    },
    /// A question went live.
    QuestionDisplayed {
        /// Question content, correct option withheld.
        question: QuestionPublic,
        /// 1-based question number.
        question_number: usize,
        /// Total question count.
        total_questions: usize,
    },
    /// One-second countdown update for the live question.
    TimerTick {
        /// Seconds remaining.
        time_left: u32,
    },
    /// The live question closed; per-participant outcomes attached.
    QuestionEnded {
        /// Outcomes for every participant that answered; may be empty.
        results: Vec<RoundResultSummary>,
    },
    /// Leaderboard recomputed after a scoring event.
    LeaderboardUpdated {
        /// Players ordered by descending score.
        leaderboard: Vec<ParticipantSummary>,
    },
    /// The game reached its end, naturally or by host command.
    GameEnded {
        /// Final leaderboard (players only).
        leaderboard: Vec<ParticipantSummary>,
        /// Score summary for every participant, host included.
        final_scores: Vec<FinalScore>,
    },
    /// A command was rejected; local to the offending connection.
    Error {
        /// Human-readable description.
        message: String,
        /// Machine-readable kind (`invalidInput`, `noPermission`, ...).
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_deserialize_from_camel_case_tags() {
        let raw = r#"{"type":"join","code":"ab12cd","displayName":"ada","role":"player"}"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        match cmd {
            ClientCommand::Join {
                code,
                display_name,
                role,
            } => {
                assert_eq!(code, "ab12cd");
                assert_eq!(display_name, "ada");
                assert!(matches!(role, Role::Player));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let raw = r#"{"type":"submitAnswer","code":"AB12CD","selectedOptionIndex":2,"elapsedSeconds":7}"#;
        assert!(matches!(
            serde_json::from_str::<ClientCommand>(raw).unwrap(),
            ClientCommand::SubmitAnswer {
                selected_option_index: 2,
                elapsed_seconds: 7,
                ..
            }
        ));
    }

    #[test]
    fn unknown_command_types_map_to_unknown() {
        let raw = r#"{"type":"teleport","code":"AB12CD"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientCommand>(raw).unwrap(),
            ClientCommand::Unknown
        ));
    }

    #[test]
    fn events_serialize_with_camel_case_tags() {
        let message = ServerMessage::TimerTick { time_left: 12 };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "timerTick");
        assert_eq!(json["timeLeft"], 12);

        let message = ServerMessage::Error {
            message: "nope".into(),
            code: "noPermission".into(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "noPermission");
    }
}
