//! Service layer: the session engine, the question scheduler, and the
//! surrounding transport/observability plumbing.

pub mod documentation;
pub mod health_service;
pub mod scheduler;
pub mod session_service;
pub mod websocket_service;
