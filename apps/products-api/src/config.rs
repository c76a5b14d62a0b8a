//! Configuration for Products API

use core_config::{AppInfo, FromEnv, app_info, env_parse_or, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_products::UpdateMode;

pub use core_config::Environment;

/// Selects how `PUT`/`PATCH` bodies are applied: `merge` (default) or `replace`
pub const UPDATE_MODE_VAR: &str = "PRODUCTS_UPDATE_MODE";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub update_mode: UpdateMode,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let app = app_info!();
        let mongodb = MongoConfig::from_env()?.with_app_name(app.name);
        let server = ServerConfig::from_env()?;
        let update_mode = env_parse_or(UPDATE_MODE_VAR, UpdateMode::default())?;

        Ok(Self {
            app,
            mongodb,
            server,
            environment,
            update_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017/shop")),
                ("MONGO_URL", None),
                (UPDATE_MODE_VAR, None),
                ("PORT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.update_mode, UpdateMode::Merge);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.mongodb.url(), "mongodb://localhost:27017/shop");
                assert_eq!(config.app.name, "products_api");
            },
        );
    }

    #[test]
    fn test_replace_mode_from_env() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                (UPDATE_MODE_VAR, Some("replace")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.update_mode, UpdateMode::Replace);
            },
        );
    }

    #[test]
    fn test_unknown_update_mode_is_an_error() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                (UPDATE_MODE_VAR, Some("upsert")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains(UPDATE_MODE_VAR));
            },
        );
    }

    #[test]
    fn test_missing_connection_string_is_an_error() {
        temp_env::with_vars_unset(["MONGODB_URL", "MONGO_URL"], || {
            assert!(Config::from_env().is_err());
        });
    }
}
