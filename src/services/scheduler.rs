//! The question scheduler: one cancellable task per session driving the
//! grace delay, the per-question countdown, and the inter-question dwell.
//!
//! Every callback re-acquires the session lock and re-checks the phase
//! before touching anything, so a host `end` or restart that lands between
//! two timer firings simply makes the stale run exit on its next wakeup.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::dto::ws::ServerMessage;
use crate::services::session_service::{
    Outbound, game_ended_message, question_displayed_message, question_ended_message,
};
use crate::services::websocket_service::dispatch;
use crate::state::SharedState;
use crate::state::machine::{SessionEvent, SessionPhase};
use crate::state::session::GameSession;
use crate::state::store::SessionHandle;

/// Interval between countdown broadcasts.
const TICK: Duration = Duration::from_secs(1);

/// Arm the question scheduler for a freshly started game.
///
/// Any run still armed for this session (a restart while results were on
/// screen) is aborted first; one session never has two live runners.
pub fn arm(state: SharedState, handle: Arc<SessionHandle>) {
    let task = tokio::spawn(run(state, handle.clone()));
    handle.arm_runner(task);
}

/// Drive the full question cycle until the list is exhausted or the run is
/// cancelled.
async fn run(state: SharedState, handle: Arc<SessionHandle>) {
    sleep(state.config().start_grace()).await;

    let mut index = 0;
    loop {
        // Open question `index`, or finish once the list is exhausted.
        let time_limit = {
            let mut session = handle.lock().await;
            if session.phase != SessionPhase::Playing {
                debug!(code = %session.code, "run cancelled before question start");
                return;
            }
            if session.begin_question(index).is_none() {
                finish(&state, &mut session);
                return;
            }
            let Some(message) = question_displayed_message(&session) else {
                return;
            };
            dispatch(&state, &session, None, vec![Outbound::to_session(message)]);
            // `begin_question` armed `time_left` with the question's limit.
            session.time_left
        };

        // Countdown with one broadcast per second, kept in lockstep with
        // the session's `time_left` so resync snapshots stay accurate.
        for remaining in (0..time_limit).rev() {
            sleep(TICK).await;
            let mut session = handle.lock().await;
            if !round_is_live(&session, index) {
                return;
            }
            session.time_left = remaining;
            dispatch(
                &state,
                &session,
                None,
                vec![Outbound::to_session(ServerMessage::TimerTick {
                    time_left: remaining,
                })],
            );
        }

        // Countdown expired: score, publish results, show them.
        {
            let mut session = handle.lock().await;
            if !round_is_live(&session, index) {
                return;
            }
            match session.phase.apply(SessionEvent::QuestionEnded) {
                Ok(next) => session.phase = next,
                Err(err) => {
                    warn!(code = %session.code, error = %err, "unexpected phase at question end");
                    return;
                }
            }
            dispatch(
                &state,
                &session,
                None,
                vec![Outbound::to_session(question_ended_message(&session))],
            );
        }

        sleep(state.config().results_delay()).await;

        // Results dwell over: advance to the next question or finish.
        {
            let mut session = handle.lock().await;
            if session.phase != SessionPhase::ShowingResults {
                debug!(code = %session.code, "run cancelled during results dwell");
                return;
            }
            if index + 1 >= session.total_questions() {
                finish(&state, &mut session);
                return;
            }
            match session.phase.apply(SessionEvent::NextQuestion) {
                Ok(next) => session.phase = next,
                Err(err) => {
                    warn!(code = %session.code, error = %err, "unexpected phase advancing question");
                    return;
                }
            }
        }

        index += 1;
    }
}

/// Whether the countdown for question `index` is still the live one.
fn round_is_live(session: &GameSession, index: usize) -> bool {
    session.phase == SessionPhase::Playing && session.active_question == Some(index)
}

/// Transition to `ended` and publish the final scores.
fn finish(state: &SharedState, session: &mut GameSession) {
    match session.phase.apply(SessionEvent::GameFinished) {
        Ok(next) => session.phase = next,
        Err(err) => {
            warn!(code = %session.code, error = %err, "unexpected phase at game end");
            return;
        }
    }
    session.time_left = 0;
    dispatch(
        state,
        session,
        None,
        vec![Outbound::to_session(game_ended_message(session))],
    );
}
