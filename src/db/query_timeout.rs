// Database query timeout protection
use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct QueryTimeout {
    limit: Duration,
}

impl Default for QueryTimeout {
    fn default() -> Self {
        QueryTimeout::new(QueryTimeout::DEFAULT_TIMEOUT)
    }
}

impl QueryTimeout {
    /// Default timeout for listing queries (5 seconds)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(limit: Duration) -> Self {
        QueryTimeout { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Execute a query with a timeout so a slow statement cannot hold the request
    pub async fn run<F, T>(&self, query_fn: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.limit, query_fn).await {
            Ok(result) => result.map_err(QueryError::from),
            Err(_) => {
                tracing::warn!("query exceeded {:?}", self.limit);
                Err(QueryError::TimedOut(self.limit))
            }
        }
    }
}
