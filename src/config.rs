use std::path::{Path, PathBuf};

/// Runtime configuration, resolved once at startup from environment
/// variables. Owned by `main` and handed to the components it builds;
/// nothing here lives in global state.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Mixed into the student-id digest.
    pub secret_key: String,
    pub database_path: PathBuf,
    pub blob_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self {
            host: env_or("BACKEND_HOST", "0.0.0.0"),
            port: std::env::var("BACKEND_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            secret_key: env_or("SECRET_KEY", "default_local_secret_key"),
            database_path: PathBuf::from(env_or("DATABASE_PATH", "data/students.db")),
            blob_dir: PathBuf::from(env_or("BLOB_DIR", "data/blobs")),
            assets_dir: std::env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
