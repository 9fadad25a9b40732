//! Environment variable loading.
//!
//! Keeps the primary → alias fallback chain in one place. Every reader has a
//! `lookup_*` form taking an explicit lookup function so callers (and tests)
//! can resolve against something other than the process environment.

use std::env;
use std::path::Path;

/// Lookup function used to read a single variable.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads from the process environment.
pub fn process_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Load `.env` from the current directory (existing variables win).
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Ok(dir) = env::current_dir() {
            load_dotenv_from_dir(&dir);
        }
    });
}

/// Load `.env` from `dir` into the process environment without overriding
/// variables that are already set. Must run before any thread is spawned.
pub fn load_dotenv_from_dir(dir: &Path) {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var_os(&key).is_none() {
            set_env_var(&key, &value);
        }
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped; one
/// level of matching quotes is stripped.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            out.push((key.to_string(), value.to_string()));
        }
    }
    out
}

/// Read primary key or the first alias that is set; blank counts as unset.
pub fn lookup_optional(lookup: Lookup<'_>, primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .find_map(|k| lookup(k))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Like [`lookup_optional`] with a default.
pub fn lookup_or<F>(lookup: Lookup<'_>, primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    lookup_optional(lookup, primary, aliases).unwrap_or_else(default)
}

/// Boolean variable: 0/false/no/off is false, anything else set is true.
pub fn lookup_bool(lookup: Lookup<'_>, primary: &str, aliases: &[&str], default: bool) -> bool {
    match lookup_optional(lookup, primary, aliases) {
        Some(s) => !matches!(
            s.to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

// All process-environment writes go through here. Call only during startup,
// before any thread exists.

/// Set a single process environment variable.
#[allow(unsafe_code)]
pub fn set_env_var(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}
