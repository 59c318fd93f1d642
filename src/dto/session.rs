//! Projections of session state exposed to clients.
//!
//! Questions pushed to participants go through [`QuestionPublic`], which
//! omits the correct option index; the index is only revealed inside the
//! round results once a question has ended.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::format_system_time;
use crate::state::machine::SessionPhase;
use crate::state::session::{GameSession, Participant, Question, Role, RoundResult};

/// Incoming question definition supplied by the host's load command.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Question text shown to participants.
    pub text: String,
    /// Ordered answer options; at least two.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option_index: usize,
    /// Countdown length for this question, in seconds.
    pub time_limit_seconds: u32,
}

/// Public projection of a participant exposed in rosters and leaderboards.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    /// Stable participant identity.
    pub id: Uuid,
    /// Display name chosen at join time.
    pub display_name: String,
    /// Host or player.
    pub role: Role,
    /// Cumulative score.
    pub score: u32,
}

/// Question content as pushed to participants while a round is live.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPublic {
    /// Question text.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Countdown length for this question, in seconds.
    pub time_limit_seconds: u32,
}

/// One participant's outcome in a finished round.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundResultSummary {
    /// Name of the answering participant.
    pub display_name: String,
    /// Option the participant selected.
    pub selected_option_index: usize,
    /// Correct option, revealed with the results.
    pub correct_option_index: usize,
    /// Whether the selection was correct.
    pub is_correct: bool,
    /// Points granted for this answer.
    pub points_awarded: u32,
    /// Cumulative score after the award.
    pub total_score: u32,
}

/// Final score line for the game-ended summary, host included.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    /// Display name of the participant.
    pub display_name: String,
    /// Role label so clients can render the host distinctly.
    pub role: Role,
    /// Final cumulative score.
    pub score: u32,
}

/// Full consistent snapshot of a session, used both as the join/resync
/// payload and by the inspection endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Current lifecycle phase.
    pub state: SessionPhase,
    /// Question currently displayed, if a round is live.
    pub current_question: Option<QuestionPublic>,
    /// 1-based number of the current question.
    pub question_number: usize,
    /// Total number of loaded questions.
    pub total_questions: usize,
    /// Seconds remaining on the live countdown, zero outside a round.
    pub time_left: u32,
    /// Participants in join order.
    pub roster: Vec<ParticipantSummary>,
    /// Players ordered by descending score.
    pub leaderboard: Vec<ParticipantSummary>,
}

/// Response body of the out-of-band session inspection endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    /// Session code.
    pub code: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last game start, if any.
    pub started_at: Option<String>,
    /// Current full state of the session.
    pub snapshot: StateSnapshot,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            display_name: participant.display_name.clone(),
            role: participant.role,
            score: participant.score,
        }
    }
}

impl From<&Question> for QuestionPublic {
    fn from(question: &Question) -> Self {
        Self {
            text: question.text.clone(),
            options: question.options.clone(),
            time_limit_seconds: question.time_limit_seconds,
        }
    }
}

impl From<&RoundResult> for RoundResultSummary {
    fn from(result: &RoundResult) -> Self {
        Self {
            display_name: result.display_name.clone(),
            selected_option_index: result.selected_option_index,
            correct_option_index: result.correct_option_index,
            is_correct: result.is_correct,
            points_awarded: result.points_awarded,
            total_score: result.total_score,
        }
    }
}

impl From<&Participant> for FinalScore {
    fn from(participant: &Participant) -> Self {
        Self {
            display_name: participant.display_name.clone(),
            role: participant.role,
            score: participant.score,
        }
    }
}

impl From<&GameSession> for StateSnapshot {
    fn from(session: &GameSession) -> Self {
        Self {
            state: session.phase,
            current_question: session.active_question().map(QuestionPublic::from),
            question_number: session.current_question_index + 1,
            total_questions: session.total_questions(),
            time_left: session.time_left,
            roster: roster_summaries(session),
            leaderboard: leaderboard_summaries(session),
        }
    }
}

impl From<&GameSession> for SessionDetails {
    fn from(session: &GameSession) -> Self {
        Self {
            code: session.code.to_string(),
            created_at: format_system_time(session.created_at),
            started_at: session.started_at.map(format_system_time),
            snapshot: session.into(),
        }
    }
}

/// Roster in join order, projected for the wire.
pub fn roster_summaries(session: &GameSession) -> Vec<ParticipantSummary> {
    session
        .participants
        .values()
        .map(ParticipantSummary::from)
        .collect()
}

/// Cached leaderboard order, projected for the wire.
pub fn leaderboard_summaries(session: &GameSession) -> Vec<ParticipantSummary> {
    session
        .leaderboard_entries()
        .into_iter()
        .map(ParticipantSummary::from)
        .collect()
}
