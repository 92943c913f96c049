use anyhow::{bail, Context};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub draft_dir: PathBuf,
    pub static_dir: PathBuf,
    pub autosave_every: Duration,
    /// browser sessions unused for this long are dropped
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let autosave_secs: u64 = try_load("AUTOSAVE_SECS", "30")?;
        if autosave_secs == 0 {
            bail!("AUTOSAVE_SECS must be greater than zero");
        }
        let idle_mins: u64 = try_load("SESSION_IDLE_MINS", "120")?;
        if idle_mins == 0 {
            bail!("SESSION_IDLE_MINS must be greater than zero");
        }

        Ok(Self {
            port: try_load("PORT", "8080")?,
            backend_url: try_load::<String>("BACKEND_URL", "http://127.0.0.1:8000")?
                .trim_end_matches('/')
                .to_string(),
            draft_dir: try_load("DRAFT_DIR", "./data/drafts")?,
            static_dir: try_load("STATIC_DIR", "./static")?,
            autosave_every: Duration::from_secs(autosave_secs),
            session_idle: Duration::from_secs(idle_mins * 60),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw:?}"))
}
