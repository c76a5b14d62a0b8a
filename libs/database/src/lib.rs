//! Database connectors and utilities
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::new("mongodb://localhost:27017/shop");
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = mongodb::database(&client, &config);
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;
