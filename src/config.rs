use std::time::Duration;

use crate::bus::BusKind;

/// Runtime configuration, read once from the environment at startup.
pub struct Config {
    pub bind: String,
    pub db_path: String,
    pub shared_secret: Option<String>,
    pub presenter_password_hash: Option<String>,
    pub presenter_password: Option<String>,
    pub bus: BusKind,
    pub heartbeat: Duration,
    pub poll_floor: Duration,
    pub poll_ceil: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let bus = match std::env::var("LIVE_BUS").as_deref() {
            Ok("polling") => BusKind::Polling,
            Ok("broadcast") | Err(_) => BusKind::Broadcast,
            Ok(other) => {
                log::warn!("Unknown LIVE_BUS '{other}', using broadcast");
                BusKind::Broadcast
            }
        };

        let shared_secret = std::env::var("LIVE_SHARED_SECRET").ok().filter(|s| !s.is_empty());
        if shared_secret.is_none() {
            log::info!("No LIVE_SHARED_SECRET set; only issued tokens grant advance");
        }

        let presenter_password_hash = std::env::var("PRESENTER_PASSWORD_HASH").ok();
        let presenter_password = std::env::var("PRESENTER_PASSWORD").ok();
        if presenter_password_hash.is_none() && presenter_password.is_none() {
            log::warn!("No presenter password configured; /login will reject everything");
        }

        Self {
            bind: std::env::var("LIVE_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            db_path: std::env::var("LIVE_DB").unwrap_or_else(|_| "data/live.db".to_string()),
            shared_secret,
            presenter_password_hash,
            presenter_password,
            bus,
            heartbeat: Duration::from_secs(env_u64("LIVE_HEARTBEAT_SECS", 15)),
            poll_floor: Duration::from_millis(env_u64("LIVE_POLL_FLOOR_MS", 500)),
            poll_ceil: Duration::from_millis(env_u64("LIVE_POLL_CEIL_MS", 8000)),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => match val.parse() {
            Ok(n) => n,
            Err(_) => {
                log::warn!("Invalid {key}='{val}', using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}
