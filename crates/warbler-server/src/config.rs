use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

const SESSION_TTL_MAX_DAYS: i64 = 3650;

/// Server settings, read from `WARBLER_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_ttl_days: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = get("WARBLER_DB_PATH").unwrap_or_else(|| "warbler.db".into());
        let host = get("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = get("WARBLER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;
        let session_ttl_days = get("WARBLER_SESSION_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("WARBLER_SESSION_TTL_DAYS must be a whole number of days")?;
        if !(1..=SESSION_TTL_MAX_DAYS).contains(&session_ttl_days) {
            anyhow::bail!(
                "WARBLER_SESSION_TTL_DAYS must be between 1 and {SESSION_TTL_MAX_DAYS}, got {session_ttl_days}"
            );
        }
        let cookie_secure = match get("WARBLER_COOKIE_SECURE").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => anyhow::bail!("WARBLER_COOKIE_SECURE: expected true/false, got {other:?}"),
        };

        Ok(Self {
            db_path: db_path.into(),
            host,
            port,
            session_ttl_days,
            cookie_secure,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
