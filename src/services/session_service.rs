//! Transport-free command handlers for the game session engine.
//!
//! Each handler validates authority and phase preconditions, mutates the
//! session under its caller-held lock, and returns the outbound events to
//! deliver instead of broadcasting inline. This keeps the whole state
//! machine testable without a WebSocket in sight; the actual fan-out lives
//! in [`crate::services::websocket_service::dispatch`].

use uuid::Uuid;

use crate::dto::session::{
    FinalScore, QuestionInput, leaderboard_summaries, roster_summaries,
};
use crate::dto::ws::ServerMessage;
use crate::error::ServiceError;
use crate::state::machine::{SessionEvent, SessionPhase};
use crate::state::session::{GameSession, Question, Role};

/// Who an outbound event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only the connection that issued the triggering command.
    Requester,
    /// Every connection bound to the session.
    Session,
    /// Host connections only.
    Hosts,
}

/// One event produced by a command handler, paired with its audience.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Audience of the event.
    pub to: Recipient,
    /// The event payload.
    pub message: ServerMessage,
}

impl Outbound {
    /// Address an event to the requesting connection.
    pub fn to_requester(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Requester,
            message,
        }
    }

    /// Address an event to every connection in the session.
    pub fn to_session(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Session,
            message,
        }
    }

    /// Address an event to the session's host connections.
    pub fn to_hosts(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Hosts,
            message,
        }
    }
}

/// Check that `connection_id` is bound to this session with the host role.
///
/// The check is explicit and local to the session: no global map of
/// connection roles exists, so authority cannot leak across sessions.
pub fn authorize_host(session: &GameSession, connection_id: Uuid) -> Result<(), ServiceError> {
    match session.participant_by_connection(connection_id) {
        Some(participant) if matches!(participant.role, Role::Host) => Ok(()),
        Some(_) => Err(ServiceError::NoPermission(
            "command requires the host role".into(),
        )),
        None => Err(ServiceError::NoPermission(
            "connection is not a participant of this session".into(),
        )),
    }
}

/// Handle `join`: upsert the participant and emit the snapshot, roster
/// broadcast, and (for players) the host-only join notification.
///
/// The snapshot sent to the joiner is the same payload `requestState`
/// produces, so reconnects resynchronize through the identical path.
pub fn handle_join(
    session: &mut GameSession,
    connection_id: Uuid,
    display_name: &str,
    role: Role,
) -> Vec<Outbound> {
    let id = session.join(display_name, role, connection_id);

    let mut events = vec![
        Outbound::to_requester(snapshot_message(session)),
        Outbound::to_session(roster_message(session)),
    ];

    if matches!(role, Role::Player) {
        if let Some(participant) = session.participants.get(&id) {
            events.push(Outbound::to_hosts(ServerMessage::HostNotifyJoin {
                new_participant: participant.into(),
                full_roster: roster_summaries(session),
                state: session.phase,
            }));
        }
    }

    events
}

/// Handle `loadQuestions` (host-only): replace the question list while the
/// session is idle in `waiting`.
pub fn handle_load_questions(
    session: &mut GameSession,
    connection_id: Uuid,
    questions: Vec<QuestionInput>,
) -> Result<Vec<Outbound>, ServiceError> {
    authorize_host(session, connection_id)?;

    match session.phase {
        SessionPhase::Playing | SessionPhase::ShowingResults => {
            return Err(ServiceError::InvalidState(
                "cannot load questions while a game is in progress".into(),
            ));
        }
        SessionPhase::Ended => {
            return Err(ServiceError::InvalidState("session has ended".into()));
        }
        SessionPhase::Waiting => {}
    }

    let questions = validate_questions(questions)?;
    session.phase = session.phase.apply(SessionEvent::QuizLoaded)?;
    session.load_questions(questions);

    Ok(Vec::new())
}

/// Handle `start` (host-only): arm a fresh run from question one.
///
/// The caller is responsible for arming the question scheduler once the
/// returned events have been dispatched.
pub fn handle_start(
    session: &mut GameSession,
    connection_id: Uuid,
) -> Result<Vec<Outbound>, ServiceError> {
    authorize_host(session, connection_id)?;

    if session.phase == SessionPhase::Playing {
        return Err(ServiceError::InvalidState(
            "game is already in progress".into(),
        ));
    }
    if session.questions.is_empty() {
        return Err(ServiceError::InvalidState(
            "no questions have been loaded".into(),
        ));
    }

    session.phase = session.phase.apply(SessionEvent::GameStarted)?;
    session.reset_for_start();
    session.recompute_leaderboard();

    Ok(vec![Outbound::to_session(ServerMessage::GameStarted {
        total_questions: session.total_questions(),
    })])
}

/// Handle `end` (host-only): finish the game immediately.
///
/// The caller cancels the armed scheduler task after dispatch; any timer
/// callback racing this command observes the terminal phase and exits.
pub fn handle_end(
    session: &mut GameSession,
    connection_id: Uuid,
) -> Result<Vec<Outbound>, ServiceError> {
    authorize_host(session, connection_id)?;

    session.phase = session.phase.apply(SessionEvent::GameFinished)?;
    session.time_left = 0;

    Ok(vec![Outbound::to_session(game_ended_message(session))])
}

/// Handle `submitAnswer`: record a single-shot answer for the live
/// question, apply its score immediately, and broadcast the refreshed
/// leaderboard.
pub fn handle_submit_answer(
    session: &mut GameSession,
    connection_id: Uuid,
    selected_option_index: usize,
    elapsed_seconds: u32,
) -> Result<Vec<Outbound>, ServiceError> {
    let participant_id = session
        .participant_by_connection(connection_id)
        .ok_or_else(|| {
            ServiceError::InvalidState("connection is not a participant of this session".into())
        })?
        .id;

    if session.phase != SessionPhase::Playing {
        return Err(ServiceError::InvalidState(
            "answers are only accepted while a question is live".into(),
        ));
    }

    session.record_answer(participant_id, selected_option_index, elapsed_seconds)?;

    Ok(vec![Outbound::to_session(
        ServerMessage::LeaderboardUpdated {
            leaderboard: leaderboard_summaries(session),
        },
    )])
}

/// Handle `requestRoster`: answer the requester with the current roster.
pub fn handle_request_roster(session: &GameSession) -> Vec<Outbound> {
    vec![Outbound::to_requester(roster_message(session))]
}

/// Handle `requestState`: answer the requester with a full snapshot built
/// under the single lock acquisition the caller holds. Idempotent.
pub fn handle_request_state(session: &GameSession) -> Vec<Outbound> {
    vec![Outbound::to_requester(snapshot_message(session))]
}

/// Handle a connection loss: drop the bound participant (their history is
/// discarded; only a rejoin under the same name restores the score) and
/// tell the remaining connections.
pub fn handle_disconnect(session: &mut GameSession, connection_id: Uuid) -> Vec<Outbound> {
    match session.remove_by_connection(connection_id) {
        Some(_) => vec![Outbound::to_session(roster_message(session))],
        None => Vec::new(),
    }
}

/// Full state snapshot event for the given session.
pub fn snapshot_message(session: &GameSession) -> ServerMessage {
    ServerMessage::StateSnapshot(session.into())
}

/// Roster broadcast event for the given session.
pub fn roster_message(session: &GameSession) -> ServerMessage {
    ServerMessage::RosterUpdated {
        participants: roster_summaries(session),
        state: session.phase,
    }
}

/// `questionDisplayed` event for the session's active question.
pub fn question_displayed_message(session: &GameSession) -> Option<ServerMessage> {
    let question = session.active_question()?;
    Some(ServerMessage::QuestionDisplayed {
        question: question.into(),
        question_number: session.current_question_index + 1,
        total_questions: session.total_questions(),
    })
}

/// `questionEnded` event carrying the outcomes of the closed round.
pub fn question_ended_message(session: &GameSession) -> ServerMessage {
    ServerMessage::QuestionEnded {
        results: session.round_results().iter().map(Into::into).collect(),
    }
}

/// `gameEnded` event with the final leaderboard and the per-participant
/// score summary, host included.
pub fn game_ended_message(session: &GameSession) -> ServerMessage {
    ServerMessage::GameEnded {
        leaderboard: leaderboard_summaries(session),
        final_scores: session.participants.values().map(FinalScore::from).collect(),
    }
}

fn validate_questions(inputs: Vec<QuestionInput>) -> Result<Vec<Question>, ServiceError> {
    if inputs.is_empty() {
        return Err(ServiceError::InvalidInput(
            "question list must not be empty".into(),
        ));
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let number = index + 1;
            if input.text.trim().is_empty() {
                return Err(ServiceError::InvalidInput(format!(
                    "question {number} has no text"
                )));
            }
            if input.options.len() < 2 {
                return Err(ServiceError::InvalidInput(format!(
                    "question {number} needs at least two options"
                )));
            }
            if input.correct_option_index >= input.options.len() {
                return Err(ServiceError::InvalidInput(format!(
                    "question {number} marks a correct option that does not exist"
                )));
            }
            if input.time_limit_seconds == 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "question {number} must allow at least one second"
                )));
            }

            Ok(Question {
                text: input.text,
                options: input.options,
                correct_option_index: input.correct_option_index,
                time_limit_seconds: input.time_limit_seconds,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::SessionCode;

    fn session() -> GameSession {
        GameSession::new(SessionCode::parse("AB12CD").unwrap())
    }

    fn question_inputs() -> Vec<QuestionInput> {
        vec![QuestionInput {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into()],
            correct_option_index: 1,
            time_limit_seconds: 10,
        }]
    }

    #[test]
    fn host_authority_is_scoped_to_the_binding_connection() {
        let mut session = session();
        let host_conn = Uuid::new_v4();
        let player_conn = Uuid::new_v4();
        session.join("teacher", Role::Host, host_conn);
        session.join("ada", Role::Player, player_conn);

        assert!(authorize_host(&session, host_conn).is_ok());
        assert!(matches!(
            authorize_host(&session, player_conn),
            Err(ServiceError::NoPermission(_))
        ));
        assert!(matches!(
            authorize_host(&session, Uuid::new_v4()),
            Err(ServiceError::NoPermission(_))
        ));
    }

    #[test]
    fn start_requires_loaded_questions() {
        let mut session = session();
        let host_conn = Uuid::new_v4();
        session.join("teacher", Role::Host, host_conn);

        let err = handle_start(&mut session, host_conn).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(session.phase, SessionPhase::Waiting);
    }

    #[test]
    fn load_rejects_out_of_range_correct_index() {
        let mut session = session();
        let host_conn = Uuid::new_v4();
        session.join("teacher", Role::Host, host_conn);

        let mut inputs = question_inputs();
        inputs[0].correct_option_index = 5;
        let err = handle_load_questions(&mut session, host_conn, inputs).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(session.questions.is_empty());
    }

    #[test]
    fn join_emits_snapshot_roster_and_host_notification() {
        let mut session = session();
        session.join("teacher", Role::Host, Uuid::new_v4());

        let events = handle_join(&mut session, Uuid::new_v4(), "ada", Role::Player);
        let recipients: Vec<Recipient> = events.iter().map(|e| e.to).collect();
        assert_eq!(
            recipients,
            [Recipient::Requester, Recipient::Session, Recipient::Hosts]
        );
        assert!(matches!(
            events[0].message,
            ServerMessage::StateSnapshot(_)
        ));
        assert!(matches!(
            events[2].message,
            ServerMessage::HostNotifyJoin { .. }
        ));
    }

    #[test]
    fn host_join_skips_the_host_notification() {
        let mut session = session();
        let events = handle_join(&mut session, Uuid::new_v4(), "teacher", Role::Host);
        assert_eq!(events.len(), 2);
    }
}
