use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle phases a quiz session moves through.
///
/// Progression is strictly forward with a single loop-back edge
/// ([`ShowingResults`](SessionPhase::ShowingResults) back into
/// [`Playing`](SessionPhase::Playing) for the next question) and one
/// absorbing terminal phase ([`Ended`](SessionPhase::Ended)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Roster assembly; quiz content can be loaded and the host can start.
    Waiting,
    /// A question round is live (or about to go live after the start grace).
    Playing,
    /// Round results are on screen before the next question begins.
    ShowingResults,
    /// Final scores published; the session only answers state queries.
    Ended,
}

/// Events that drive phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Host replaced the question list while the session was idle.
    QuizLoaded,
    /// Host started (or restarted) the game.
    GameStarted,
    /// The countdown for the current question expired.
    QuestionEnded,
    /// The results dwell elapsed and the next question begins.
    NextQuestion,
    /// The question list was exhausted or the host ended the game.
    GameFinished,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

impl SessionPhase {
    /// Compute the phase reached by applying `event`, validating the edge.
    pub fn apply(self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self, event) {
            (SessionPhase::Waiting, SessionEvent::QuizLoaded) => SessionPhase::Waiting,
            (SessionPhase::Waiting, SessionEvent::GameStarted) => SessionPhase::Playing,
            // A restart while results are on screen cancels the pending
            // scheduler run and begins again from question one.
            (SessionPhase::ShowingResults, SessionEvent::GameStarted) => SessionPhase::Playing,
            (SessionPhase::Playing, SessionEvent::QuestionEnded) => SessionPhase::ShowingResults,
            (SessionPhase::ShowingResults, SessionEvent::NextQuestion) => SessionPhase::Playing,
            (
                SessionPhase::Waiting | SessionPhase::Playing | SessionPhase::ShowingResults,
                SessionEvent::GameFinished,
            ) => SessionPhase::Ended,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Whether this phase accepts no further events.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Ended)
    }
}
