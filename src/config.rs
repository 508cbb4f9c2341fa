use anyhow::{bail, Context};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub query_timeout_secs: u64,
}

impl Config {
    pub fn init() -> anyhow::Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `init` reads the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;
        if max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be a positive integer");
        }

        let query_timeout_secs = lookup("QUERY_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u64>()
            .context("QUERY_TIMEOUT_SECS must be a whole number of seconds")?;
        if query_timeout_secs == 0 {
            bail!("QUERY_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            database_url,
            max_connections,
            query_timeout_secs,
        })
    }
}
