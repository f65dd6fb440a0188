use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::MongoStateDocument,
};
use crate::dao::{models::GameStateEntity, snapshot_store::SnapshotStore, storage::StorageResult};

const STATE_COLLECTION_NAME: &str = "game_states";

/// Snapshot store persisting one document per room in MongoDB.
#[derive(Clone)]
pub struct MongoSnapshotStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoSnapshotStore {
    /// Establish the initial connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoStateDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoStateDocument>(STATE_COLLECTION_NAME)
    }

    async fn save_state(&self, room_id: String, state: GameStateEntity) -> MongoResult<()> {
        let document: MongoStateDocument = (room_id.clone(), state).into();
        let collection = self.collection().await;
        collection
            .replace_one(doc! {"_id": &document.room_id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveState { room_id, source })?;
        Ok(())
    }

    async fn find_state(&self, room_id: String) -> MongoResult<Option<GameStateEntity>> {
        let collection = self.collection().await;
        let document = collection
            .find_one(doc! {"_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::LoadState { room_id, source })?;
        Ok(document.map(Into::into))
    }
}

impl SnapshotStore for MongoSnapshotStore {
    fn save_state(
        &self,
        room_id: String,
        state: GameStateEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_state(room_id, state).await.map_err(Into::into) })
    }

    fn find_state(
        &self,
        room_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_state(room_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
