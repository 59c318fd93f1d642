use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::session::SessionDetails, error::AppError, state::SharedState,
    state::session::SessionCode,
};

#[utoipa::path(
    get,
    path = "/sessions/{code}",
    tag = "session",
    params(("code" = String, Path, description = "Six-character session code")),
    responses(
        (status = 200, description = "Current session state", body = SessionDetails),
        (status = 404, description = "Unknown session code")
    )
)]
/// Expose a session's full current state for out-of-band inspection.
pub async fn session_state(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<SessionDetails>, AppError> {
    let code = SessionCode::parse(&code).map_err(|err| AppError::BadRequest(err.to_string()))?;
    let handle = state
        .sessions()
        .get(&code)
        .ok_or_else(|| AppError::NotFound(format!("session `{code}` not found")))?;

    let session = handle.lock().await;
    Ok(Json(SessionDetails::from(&*session)))
}

/// Configure the session inspection subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/sessions/{code}", get(session_state))
}
