use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis connection error: {0}")]
    ConnectionError(String),

    #[error("redis command failed: {0}")]
    CommandError(#[from] redis::RedisError),

    #[error("cache serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("connection pool error: {0}")]
    PoolError(String),
}

impl From<bb8::RunError<redis::RedisError>> for CacheError {
    fn from(err: bb8::RunError<redis::RedisError>) -> Self {
        match err {
            bb8::RunError::User(e) => CacheError::CommandError(e),
            bb8::RunError::TimedOut => CacheError::PoolError("timed out waiting for a connection".to_string()),
        }
    }
}
