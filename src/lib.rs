pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod models;
pub mod service;

use std::{sync::Arc, time::Duration};

use config::Config;
use db::{db::DBClient, query_timeout::QueryTimeout};
use service::property_service::PropertyService;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub property_service: Arc<PropertyService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);
        let timeout = QueryTimeout::new(Duration::from_secs(config.query_timeout_secs));
        let property_service = Arc::new(PropertyService::new(db_client_arc.clone(), timeout));

        Self {
            env: config,
            db_client: db_client_arc,
            property_service,
        }
    }

    /// Opens the database pool and wires the services on top of it.
    pub async fn init(config: Config) -> Result<Self, sqlx::Error> {
        let db_client = DBClient::connect(&config).await?;
        Ok(AppState::new(db_client, config))
    }

    pub async fn shutdown(&self) {
        self.db_client.close().await;
    }
}
