//! Observability: tracing init and the launch audit log.
//!
//! Uses [`ObservabilityConfig`] for ENVLAUNCH_QUIET, ENVLAUNCH_LOG_LEVEL,
//! ENVLAUNCH_LOG_JSON and ENVLAUNCH_AUDIT_LOG. `RUST_LOG` overrides the level.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

static AUDIT_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Initialize tracing. Call once at process startup.
///
/// Logs go to stderr so they never mix with the child's stdout.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = filter_directive(cfg);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    };
}

fn filter_directive(cfg: &ObservabilityConfig) -> String {
    if cfg.quiet {
        "envlaunch=warn".to_string()
    } else {
        cfg.log_level.clone()
    }
}

fn get_audit_path() -> Option<String> {
    {
        let guard = AUDIT_PATH.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = ObservabilityConfig::from_env().audit_log.clone()?;
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = AUDIT_PATH.lock().ok()?;
        *guard = Some(path.clone());
    }
    Some(path)
}

fn append_jsonl(path: &Path, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn audit(record: serde_json::Value) {
    if let Some(path) = get_audit_path() {
        append_jsonl(Path::new(&path), &record);
    }
}

/// Audit: activation_completed
pub fn audit_activation_completed(env_name: &str, prefix: &Path, backend: &str) {
    audit(json!({
        "ts": now(),
        "event": "activation_completed",
        "env": env_name,
        "prefix": prefix.to_string_lossy(),
        "backend": backend,
    }));
}

/// Audit: launch_started
pub fn audit_launch_started(env_name: &str, program: &Path, target: &Path) {
    audit(json!({
        "ts": now(),
        "event": "launch_started",
        "env": env_name,
        "program": program.to_string_lossy(),
        "target": target.to_string_lossy(),
    }));
}

/// Audit: launch_completed (child ran)
pub fn audit_launch_completed(env_name: &str, target: &Path, exit_code: i32, duration_ms: u64) {
    audit(json!({
        "ts": now(),
        "event": "launch_completed",
        "env": env_name,
        "target": target.to_string_lossy(),
        "exit_code": exit_code,
        "duration_ms": duration_ms,
    }));
}

/// Audit: launch_failed (child never ran)
pub fn audit_launch_failed(env_name: &str, kind: &str, message: &str, exit_code: i32) {
    audit(json!({
        "ts": now(),
        "event": "launch_failed",
        "env": env_name,
        "kind": kind,
        "message": message,
        "exit_code": exit_code,
    }));
}
