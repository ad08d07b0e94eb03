use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_SESSION_IDLE_MINUTES: i64 = 120;
const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding courses.json, exams.json and feedback_history.json.
    pub data_dir: PathBuf,
    pub generator_url: String,
    pub generator_api_key: Option<String>,
    pub annotate_pdf_pages: bool,
    pub feedback_require_single_course: bool,
    pub max_upload_bytes: usize,
    pub session_idle_minutes: i64,
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            generator_url: require_env("GENERATOR_URL")?,
            generator_api_key: std::env::var("GENERATOR_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            annotate_pdf_pages: flag_env("ANNOTATE_PDF_PAGES", true)?,
            feedback_require_single_course: flag_env("FEEDBACK_REQUIRE_SINGLE_COURSE", false)?,
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            session_idle_minutes: match std::env::var("SESSION_IDLE_MINUTES") {
                Ok(v) => v
                    .parse::<i64>()
                    .context("SESSION_IDLE_MINUTES must be a number of minutes")?,
                Err(_) => DEFAULT_SESSION_IDLE_MINUTES,
            },
            max_sessions: match std::env::var("MAX_SESSIONS") {
                Ok(v) => v.parse::<usize>().context("MAX_SESSIONS must be a count")?,
                Err(_) => DEFAULT_MAX_SESSIONS,
            },
        })
    }

    pub fn courses_path(&self) -> PathBuf {
        self.data_dir.join("courses.json")
    }

    pub fn exams_path(&self) -> PathBuf {
        self.data_dir.join("exams.json")
    }

    pub fn feedback_path(&self) -> PathBuf {
        self.data_dir.join("feedback_history.json")
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn flag_env(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => {
            parse_flag(&raw).with_context(|| format!("{key} must be a boolean, got '{raw}'"))
        }
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}
