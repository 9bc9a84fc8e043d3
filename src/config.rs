//! Process configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the server binary.
#[derive(Clone)]
pub struct Config {
    /// Path to the SQLite database file. Defaults to `review-roster.db`.
    pub database_path: PathBuf,
    /// Address the HTTP server binds to. Port via `PORT`, default 8080.
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("review-roster.db"));

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        Ok(Self {
            database_path,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        })
    }
}
