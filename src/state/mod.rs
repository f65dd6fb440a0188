pub mod game;
pub mod room;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::snapshot_store::SnapshotStore,
    error::ServiceError,
    services::auth_service::ControlAuthorizer,
    state::room::Room,
};

/// Cheaply clonable handle onto the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the room registry, the storage slot, and the
/// degraded-mode flag.
///
/// Rooms are created lazily and never reaped; a room with no subscribers and
/// no state is a few hundred bytes of registry entry.
pub struct AppState {
    config: AppConfig,
    authorizer: Arc<dyn ControlAuthorizer>,
    store: RwLock<Option<Arc<dyn SnapshotStore>>>,
    rooms: DashMap<String, Arc<Room>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, authorizer: Arc<dyn ControlAuthorizer>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            authorizer,
            store: RwLock::new(None),
            rooms: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Authorization collaborator for control connections.
    pub fn authorizer(&self) -> &Arc<dyn ControlAuthorizer> {
        &self.authorizer
    }

    /// Obtain a handle to the current snapshot store, if one is installed.
    pub async fn snapshot_store(&self) -> Option<Arc<dyn SnapshotStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Snapshot store or a degraded-mode error for paths that require it.
    pub async fn require_snapshot_store(&self) -> Result<Arc<dyn SnapshotStore>, ServiceError> {
        self.snapshot_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a snapshot store implementation and leave degraded mode.
    pub async fn set_snapshot_store(&self, store: Arc<dyn SnapshotStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current snapshot store and enter degraded mode.
    pub async fn clear_snapshot_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Look up an already-registered room.
    pub fn room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.get(room_id).map(|entry| Arc::clone(&entry))
    }

    /// Look up a room, registering an uninitialized one when absent.
    pub fn room_entry(&self, room_id: &str) -> Arc<Room> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id))
            .clone()
    }
}
