use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default bound on predicate-list nesting before a subtree fails closed.
pub const DEFAULT_MAX_RULE_DEPTH: usize = 10;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub scan: ScanConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `THREATLENS_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("THREATLENS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            scan: ScanConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  rules:    dir={}", self.scan.rules_dir.display());
        tracing::info!("  diagram:  path={}", self.scan.diagram_path.display());
        tracing::info!(
            "  analyzer: max_depth={}, threads={}",
            self.scan.max_rule_depth,
            self.scan.threads
        );
    }
}

// ── Scan ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory scanned recursively for rule and threat YAML documents.
    pub rules_dir: PathBuf,
    pub diagram_path: PathBuf,
    pub max_rule_depth: usize,
    /// Rayon pool size; 0 runs rules sequentially on the calling thread.
    pub threads: usize,
}

impl ScanConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            rules_dir: PathBuf::from(profiled_env_or(p, "RULES_DIR", "data/rules")),
            diagram_path: PathBuf::from(profiled_env_or(
                p,
                "DIAGRAM_PATH",
                "data/diagrams/diagram.json",
            )),
            max_rule_depth: profiled_env_usize(p, "MAX_RULE_DEPTH", DEFAULT_MAX_RULE_DEPTH),
            threads: profiled_env_usize(p, "SCAN_THREADS", 0),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("data/rules"),
            diagram_path: PathBuf::from("data/diagrams/diagram.json"),
            max_rule_depth: DEFAULT_MAX_RULE_DEPTH,
            threads: 0,
        }
    }
}
