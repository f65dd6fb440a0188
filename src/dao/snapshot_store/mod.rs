#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::{models::GameStateEntity, storage::StorageResult};

/// Abstraction over the durable snapshot store for room game states.
///
/// The contract is deliberately narrow: overwrite the latest snapshot for a
/// room and read it back. There are no multi-room transactional guarantees,
/// and the in-memory broadcast path never waits on this layer.
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the persisted snapshot for `room_id`.
    fn save_state(
        &self,
        room_id: String,
        state: GameStateEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch the latest persisted snapshot for `room_id`, if any.
    fn find_state(
        &self,
        room_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;

    /// Cheap liveness probe used by the supervisor and the health route.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Attempt to re-establish the backend connection after a failed probe.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
