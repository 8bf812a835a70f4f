//! Environment-backed configuration, read once at startup.

use anyhow::Context;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub templates_dir: PathBuf,
    pub max_db_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 8080,
        };
        let templates_dir = std::env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/email-templates"));
        let max_db_connections = match std::env::var("MAX_DB_CONNECTIONS") {
            Ok(raw) => raw.parse().context("MAX_DB_CONNECTIONS must be a number")?,
            Err(_) => 10,
        };
        Ok(Self {
            database_url,
            port,
            templates_dir,
            max_db_connections,
        })
    }
}
