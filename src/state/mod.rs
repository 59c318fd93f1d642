//! Shared application state: the session store, the connection registry,
//! and the runtime configuration.

pub mod machine;
pub mod scoring;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::state::store::SessionStore;

/// Cheaply cloneable handle on the central application state.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push outbound frames to one connected client.
pub struct ClientConnection {
    /// Connection identity; changes every time a client reconnects.
    pub id: Uuid,
    /// Sender feeding the connection's dedicated writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state storing live sessions and open connections.
pub struct AppState {
    config: AppConfig,
    sessions: SessionStore,
    connections: DashMap<Uuid, ClientConnection>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply into every handler and scheduler task.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            sessions: SessionStore::new(),
            connections: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of live sessions keyed by code.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registry of open WebSocket connections keyed by connection id.
    pub fn connections(&self) -> &DashMap<Uuid, ClientConnection> {
        &self.connections
    }

    /// Register a freshly opened connection.
    pub fn register_connection(&self, connection: ClientConnection) {
        self.connections.insert(connection.id, connection);
    }

    /// Drop a closed connection from the registry.
    pub fn remove_connection(&self, connection_id: Uuid) {
        self.connections.remove(&connection_id);
    }
}
