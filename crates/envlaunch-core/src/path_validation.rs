//! Input validation for environment names and paths.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Characters conda refuses in environment names.
fn env_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s/\\:#]+$").expect("env name regex is valid"))
}

/// Check that `name` is usable as a named environment identifier.
pub fn validate_env_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("environment name is empty".to_string());
    }
    if !env_name_pattern().is_match(name) {
        return Err(format!(
            "invalid environment name '{}': whitespace, '/', '\\', ':' and '#' are not allowed",
            name
        ));
    }
    Ok(())
}

/// Whether `name` should be treated as a prefix path rather than a name.
pub fn looks_like_path(name: &str) -> bool {
    name.contains('/') || name.contains('\\') || (name.starts_with('.') && name.len() > 1)
}

/// Anchor a relative path at `base`.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_env_name() {
        assert!(validate_env_name("base").is_ok());
        assert!(validate_env_name("ncs-to-mat_3.11").is_ok());
        assert!(validate_env_name("").is_err());
        assert!(validate_env_name("my env").is_err());
        assert!(validate_env_name("a:b").is_err());
        assert!(validate_env_name("a#b").is_err());
    }

    #[test]
    fn test_looks_like_path() {
        assert!(looks_like_path("/opt/conda/envs/gui"));
        assert!(looks_like_path("./envs/gui"));
        assert!(looks_like_path(r"C:\envs\gui"));
        assert!(!looks_like_path("gui"));
        assert!(!looks_like_path("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolutize() {
        let base = Path::new("/work");
        assert_eq!(absolutize(Path::new("a.py"), base), PathBuf::from("/work/a.py"));
        assert_eq!(absolutize(Path::new("/x/a.py"), base), PathBuf::from("/x/a.py"));
    }
}
