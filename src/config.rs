// ⚙️ Configuration - environment-driven settings for the CLI and server

use std::env;
use std::path::PathBuf;

use crate::activity_log::DEFAULT_PAGE_SIZE;

pub const DEFAULT_DB_PATH: &str = "school_records.db";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SCHOOL_RECORDS_DB`
    pub db_path: PathBuf,
    /// `SCHOOL_RECORDS_ADDR`
    pub addr: String,
    /// `SCHOOL_RECORDS_STATIC_DIR`: built frontend served at `/`
    pub static_dir: Option<PathBuf>,
    /// `SCHOOL_RECORDS_LOG_PAGE_SIZE`
    pub log_page_size: usize,
    /// `SCHOOL_RECORDS_ADMIN_PASSWORD`: only used when seeding a new profile
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            addr: DEFAULT_ADDR.to_string(),
            static_dir: None,
            log_page_size: DEFAULT_PAGE_SIZE,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        AppConfig {
            db_path: non_empty("SCHOOL_RECORDS_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            addr: non_empty("SCHOOL_RECORDS_ADDR").unwrap_or(defaults.addr),
            static_dir: non_empty("SCHOOL_RECORDS_STATIC_DIR").map(PathBuf::from),
            log_page_size: env_usize(&lookup, "SCHOOL_RECORDS_LOG_PAGE_SIZE", defaults.log_page_size),
            admin_password: non_empty("SCHOOL_RECORDS_ADMIN_PASSWORD")
                .unwrap_or(defaults.admin_password),
        }
    }
}

fn env_usize(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: usize) -> usize {
    lookup(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
