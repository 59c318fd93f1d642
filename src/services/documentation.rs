use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz session backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::session_state,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::SessionDetails,
            crate::dto::session::StateSnapshot,
            crate::dto::session::QuestionInput,
            crate::dto::ws::ClientCommand,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Out-of-band session inspection"),
        (name = "ws", description = "WebSocket command/event protocol"),
    )
)]
pub struct ApiDoc;
