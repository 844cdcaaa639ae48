use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::trial::DEFAULT_MAX_CASE_CHARS;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODELS: &str = "gemini-1.5-flash,gemini-1.5-pro,gemini-2.0-flash-exp";

/// Which completion service backs the courtroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    Ollama,
}

impl BackendKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown BACKEND \"{other}\" (expected \"gemini\" or \"ollama\")"),
        }
    }
}

/// Full application configuration.
/// Every field comes from the process environment, falling back to `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,

    // Gemini
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    /// Tried in order until one succeeds.
    pub gemini_models: Vec<String>,

    // Ollama
    pub ollama_url: String,
    pub ollama_model: String,

    /// Per-request timeout for a single completion call.
    pub agent_timeout_s: u64,
    /// Cap on case facts injected into each prompt.
    pub max_case_chars: usize,

    // Web
    pub web_bind: String,
    pub web_port: u16,
}

fn parse_dotenv() -> HashMap<String, String> {
    let Ok(contents) = std::fs::read_to_string(".env") else {
        return HashMap::new();
    };
    parse_dotenv_str(&contents)
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments. Surrounding
/// single or double quotes on the value are dropped.
pub fn parse_dotenv_str(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
                .unwrap_or(v);
            map.insert(k.trim().to_string(), v.to_string());
        }
    }
    map
}

/// Split a comma-separated model list, dropping blanks and duplicates while
/// keeping the first-seen order.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for m in raw.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        if !models.iter().any(|seen| seen == m) {
            models.push(m.to_string());
        }
    }
    models
}

fn get(key: &str, dotenv: &HashMap<String, String>) -> Option<String> {
    std::env::var(key).ok().or_else(|| dotenv.get(key).cloned())
}

fn get_str(key: &str, dotenv: &HashMap<String, String>, default: &str) -> String {
    get(key, dotenv).unwrap_or_else(|| default.to_string())
}

fn get_u64(key: &str, dotenv: &HashMap<String, String>, default: u64) -> u64 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_usize(key: &str, dotenv: &HashMap<String, String>, default: usize) -> usize {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_u16(key: &str, dotenv: &HashMap<String, String>, default: u16) -> u16 {
    get(key, dotenv)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_dotenv(&parse_dotenv())
    }

    /// Build config from `dotenv`, with real environment variables taking
    /// precedence over its entries.
    pub fn from_dotenv(dotenv: &HashMap<String, String>) -> Result<Self> {
        let backend = BackendKind::parse(&get_str("BACKEND", dotenv, "gemini"))?;

        let mut gemini_models = parse_model_list(&get_str("GEMINI_MODELS", dotenv, DEFAULT_GEMINI_MODELS));
        if gemini_models.is_empty() {
            gemini_models = parse_model_list(DEFAULT_GEMINI_MODELS);
        }

        Ok(Config {
            backend,
            gemini_api_key: get_str("GEMINI_API_KEY", dotenv, ""),
            gemini_base_url: get_str("GEMINI_BASE_URL", dotenv, DEFAULT_GEMINI_BASE_URL),
            gemini_models,
            ollama_url: get_str("OLLAMA_URL", dotenv, "http://127.0.0.1:11434"),
            ollama_model: get_str("OLLAMA_MODEL", dotenv, "llama3.1"),
            agent_timeout_s: get_u64("AGENT_TIMEOUT_S", dotenv, 120),
            max_case_chars: get_usize("MAX_CASE_CHARS", dotenv, DEFAULT_MAX_CASE_CHARS),
            web_bind: get_str("WEB_BIND", dotenv, "127.0.0.1"),
            web_port: get_u16("WEB_PORT", dotenv, 5000),
        })
    }
}
