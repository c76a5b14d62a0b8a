use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use std::time::Duration;
use tracing::info;

use super::MongoConfig;
use super::config::DEFAULT_DATABASE;
use crate::common::{RetryConfig, retry, retry_with_backoff};

/// Error type for MongoDB connection setup
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    /// The connection string or client options were rejected; retrying cannot help.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Send a `ping` to the admin database
pub(crate) async fn ping(client: &Client) -> Result<(), mongodb::error::Error> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
}

/// Connect using a MongoConfig and verify the deployment answers a ping
///
/// # Example
/// ```ignore
/// use database::mongodb::{MongoConfig, connect_from_config};
///
/// let config = MongoConfig::new("mongodb://localhost:27017/shop");
/// let client = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &MongoConfig) -> Result<Client, MongoError> {
    let client = build_client(config).await?;
    verify(&client).await?;

    info!("Successfully connected to MongoDB");
    Ok(client)
}

/// Parse the connection string and build a (lazily connecting) client
async fn build_client(config: &MongoConfig) -> Result<Client, MongoError> {
    info!("Attempting to connect to MongoDB at {}", config.redacted_url());

    let mut options = ClientOptions::parse(&config.url).await?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    Ok(Client::with_options(options)?)
}

async fn verify(client: &Client) -> Result<(), MongoError> {
    ping(client)
        .await
        .map_err(|e| MongoError::ConnectionFailed(e.to_string()))
}

/// Connect from config, retrying with exponential backoff on failure
///
/// Only meant for process startup, where the database may still be coming up.
/// A malformed connection string fails at once; only the ping is retried.
///
/// # Example
/// ```ignore
/// use database::mongodb::connect_from_config_with_retry;
/// use database::common::RetryConfig;
///
/// let retry_config = RetryConfig::new().with_max_retries(5);
/// let client = connect_from_config_with_retry(&config, Some(retry_config)).await?;
/// ```
pub async fn connect_from_config_with_retry(
    config: &MongoConfig,
    retry_config: Option<RetryConfig>,
) -> Result<Client, MongoError> {
    let client = build_client(config).await?;

    match retry_config {
        Some(policy) => retry_with_backoff(|| verify(&client), policy).await?,
        None => retry(|| verify(&client)).await?,
    }

    info!("Successfully connected to MongoDB");
    Ok(client)
}

/// Pick the database to use for a connected client
///
/// Order: explicit `MongoConfig::database`, then the default database named
/// in the connection string, then [`DEFAULT_DATABASE`].
pub fn database(client: &Client, config: &MongoConfig) -> Database {
    match config.database.as_deref() {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Client construction is lazy, so these run without a server.

    #[tokio::test]
    async fn test_database_prefers_explicit_name() {
        let config = MongoConfig::new("mongodb://localhost:27017/from_url").with_database("shop");
        let client = Client::with_uri_str(config.url()).await.unwrap();
        assert_eq!(database(&client, &config).name(), "shop");
    }

    #[tokio::test]
    async fn test_database_falls_back_to_connection_string() {
        let config = MongoConfig::new("mongodb://localhost:27017/from_url");
        let client = Client::with_uri_str(config.url()).await.unwrap();
        assert_eq!(database(&client, &config).name(), "from_url");
    }

    #[tokio::test]
    async fn test_database_defaults_to_products() {
        let config = MongoConfig::new("mongodb://localhost:27017");
        let client = Client::with_uri_str(config.url()).await.unwrap();
        assert_eq!(database(&client, &config).name(), DEFAULT_DATABASE);
    }

    #[tokio::test]
    async fn test_malformed_url_is_not_retried() {
        let config = MongoConfig::new("not-a-mongodb-url");
        let policy = RetryConfig::new()
            .with_max_retries(5)
            .with_initial_delay(60_000)
            .without_jitter();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            connect_from_config_with_retry(&config, Some(policy)),
        )
        .await
        .expect("malformed url should fail without backing off");

        assert!(matches!(result, Err(MongoError::Mongo(_))));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_connect_from_config() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let result = connect_from_config(&MongoConfig::new(url)).await;
        assert!(result.is_ok());
    }
}
