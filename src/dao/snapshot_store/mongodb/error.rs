use thiserror::Error;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Typed failures raised by the MongoDB snapshot store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The configured connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// A required environment variable is absent.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The driver client could not be constructed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial connectivity ping never succeeded.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver-level cause of the last attempt.
        #[source]
        source: mongodb::error::Error,
    },
    /// A routine health ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Writing a room snapshot failed.
    #[error("failed to save game state for room `{room_id}`")]
    SaveState {
        /// Room whose snapshot could not be written.
        room_id: String,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Reading a room snapshot failed.
    #[error("failed to load game state for room `{room_id}`")]
    LoadState {
        /// Room whose snapshot could not be read.
        room_id: String,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
}
