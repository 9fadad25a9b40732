//! Static activation: compute what `conda activate` would export.
//!
//! Nothing is executed. Hooks under `etc/conda/activate.d` are not run;
//! use script activation when an environment depends on them.

use std::path::{Path, PathBuf};

use envlaunch_core::config::env_keys::conda;
use envlaunch_core::LaunchError;

use super::{ActivatedEnvironment, ActivationBackend};
use crate::env::prefix::prefix_bin_dirs;
use crate::env::{EnvBlock, EnvironmentPrefix, EnvironmentRoot};

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticActivation;

impl ActivationBackend for StaticActivation {
    fn name(&self) -> &'static str {
        "static"
    }

    fn activate(
        &self,
        root: &EnvironmentRoot,
        prefix: &EnvironmentPrefix,
        base: &EnvBlock,
    ) -> Result<ActivatedEnvironment, LaunchError> {
        let block = activated_block(root, prefix, base)?;
        Ok(ActivatedEnvironment {
            prefix: prefix.clone(),
            backend: self.name(),
            block,
        })
    }
}

/// Build the activated block.
///
/// A previously active prefix (`CONDA_PREFIX` in `base`) is deactivated
/// first: its PATH entries are dropped and it is pushed to
/// `CONDA_PREFIX_<old shlvl>`, as non-stacked `conda activate` does.
/// Activating the prefix that is already active keeps `CONDA_SHLVL`.
pub fn activated_block(
    root: &EnvironmentRoot,
    prefix: &EnvironmentPrefix,
    base: &EnvBlock,
) -> Result<EnvBlock, LaunchError> {
    let mut block = base.clone();

    let old_prefix = base.get(conda::CONDA_PREFIX).map(PathBuf::from);
    let old_shlvl: u32 = base
        .get_str(conda::CONDA_SHLVL)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0);

    let new_dirs = prefix.bin_dirs();
    let stale: Vec<PathBuf> = old_prefix
        .as_deref()
        .map(prefix_bin_dirs)
        .unwrap_or_default();
    let path = build_path(&base.path_entries(), &new_dirs, &stale, &root.condabin());
    block
        .set_path_entries(&path)
        .map_err(|e| LaunchError::activation(&root.path, format!("cannot build PATH: {}", e)))?;

    let new_shlvl = match old_prefix {
        // reactivating the active prefix does not stack
        Some(ref old) if old == &prefix.path => old_shlvl.max(1),
        Some(ref old) if old_shlvl > 0 => {
            block.set(format!("CONDA_PREFIX_{}", old_shlvl), old.as_os_str());
            old_shlvl + 1
        }
        _ => 1,
    };

    let display_name = display_name(prefix);
    block.set(conda::CONDA_PREFIX, prefix.path.as_os_str());
    block.set(conda::CONDA_DEFAULT_ENV, display_name.as_str());
    block.set(conda::CONDA_SHLVL, new_shlvl.to_string());
    block.set(conda::CONDA_PROMPT_MODIFIER, format!("({}) ", display_name));
    block.set(conda::CONDA_EXE, root.conda_exe().as_os_str());
    block.set(conda::CONDA_PYTHON_EXE, root.python_exe().as_os_str());
    Ok(block)
}

/// New PATH: prefix dirs first, then the old entries minus the stale prefix
/// dirs and duplicates, with `condabin` kept present.
fn build_path(current: &[PathBuf], new_dirs: &[PathBuf], stale: &[PathBuf], condabin: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = new_dirs.to_vec();
    for entry in current {
        if stale.contains(entry) || out.contains(entry) {
            continue;
        }
        out.push(entry.clone());
    }
    if !out.iter().any(|p| p == condabin) {
        out.insert(new_dirs.len(), condabin.to_path_buf());
    }
    out
}

fn display_name(prefix: &EnvironmentPrefix) -> String {
    if prefix.is_base {
        "base".to_string()
    } else {
        prefix.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::prefix::CONDA_META;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, EnvironmentRoot, EnvironmentPrefix) {
        let tmp = tempfile::tempdir().unwrap();
        let root_dir = tmp.path().join("anaconda3");
        fs::create_dir_all(root_dir.join(CONDA_META)).unwrap();
        fs::create_dir_all(root_dir.join("etc/profile.d")).unwrap();
        fs::write(root_dir.join("etc/profile.d/conda.sh"), "").unwrap();
        fs::create_dir_all(root_dir.join("Scripts")).unwrap();
        fs::write(root_dir.join("Scripts/activate.bat"), "").unwrap();
        fs::create_dir_all(root_dir.join("envs/neuro").join(CONDA_META)).unwrap();
        let root = EnvironmentRoot::open(&root_dir).unwrap();
        let prefix = crate::env::resolve_prefix(&root, "neuro", &[]).unwrap();
        (tmp, root, prefix)
    }

    fn base_with_path(entries: &[PathBuf]) -> EnvBlock {
        let mut base = EnvBlock::from_pairs([("HOME", "/home/u")]);
        base.set_path_entries(entries).unwrap();
        base
    }

    #[test]
    fn test_prefix_bin_first_on_path() {
        let (_tmp, root, prefix) = fixture();
        let base = base_with_path(&[PathBuf::from("/usr/bin"), PathBuf::from("/bin")]);
        let activated = StaticActivation.activate(&root, &prefix, &base).unwrap();

        let path = activated.block.path_entries();
        assert_eq!(path[0], prefix.bin_dirs()[0]);
        assert!(path.contains(&root.condabin()));
        assert!(path.ends_with(&[PathBuf::from("/usr/bin"), PathBuf::from("/bin")]));
        assert_eq!(
            activated.block.get_str("CONDA_DEFAULT_ENV").as_deref(),
            Some("neuro")
        );
        assert_eq!(activated.block.get_str("CONDA_SHLVL").as_deref(), Some("1"));
        assert_eq!(
            activated.block.get_str("CONDA_PROMPT_MODIFIER").as_deref(),
            Some("(neuro) ")
        );
        assert_eq!(activated.block.get_str("HOME").as_deref(), Some("/home/u"));
        assert_eq!(activated.backend, "static");
    }

    #[test]
    fn test_previous_prefix_is_deactivated() {
        let (_tmp, root, prefix) = fixture();
        let old_bins = prefix_bin_dirs(&root.path);
        let mut entries = old_bins.clone();
        entries.push(PathBuf::from("/usr/bin"));
        let mut base = base_with_path(&entries);
        base.set("CONDA_PREFIX", root.path.as_os_str());
        base.set("CONDA_SHLVL", "1");

        let block = activated_block(&root, &prefix, &base).unwrap();
        let path = block.path_entries();
        for old in &old_bins {
            assert!(!path.contains(old), "stale entry {} kept", old.display());
        }
        assert_eq!(block.get_str("CONDA_SHLVL").as_deref(), Some("2"));
        assert_eq!(
            block.get("CONDA_PREFIX_1").map(PathBuf::from),
            Some(root.path.clone())
        );
        assert_eq!(block.get("CONDA_PREFIX").map(PathBuf::from), Some(prefix.path));
    }

    #[test]
    fn test_reactivating_active_prefix_does_not_stack() {
        let (_tmp, root, prefix) = fixture();
        let mut entries = prefix.bin_dirs();
        entries.push(PathBuf::from("/usr/bin"));
        let mut base = base_with_path(&entries);
        base.set("CONDA_PREFIX", prefix.path.as_os_str());
        base.set("CONDA_SHLVL", "1");

        let block = activated_block(&root, &prefix, &base).unwrap();
        assert_eq!(block.get_str("CONDA_SHLVL").as_deref(), Some("1"));
        assert!(!block.contains("CONDA_PREFIX_1"));
        let path = block.path_entries();
        assert_eq!(path[0], prefix.bin_dirs()[0]);
        assert_eq!(
            path.iter().filter(|p| **p == prefix.bin_dirs()[0]).count(),
            1
        );
    }

    #[test]
    fn test_activation_is_deterministic() {
        let (_tmp, root, prefix) = fixture();
        let base = base_with_path(&[PathBuf::from("/usr/bin")]);
        let first = activated_block(&root, &prefix, &base).unwrap();
        let second = activated_block(&root, &prefix, &base).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_path_keeps_existing_condabin_position() {
        let condabin = PathBuf::from("/c/condabin");
        let current = vec![PathBuf::from("/usr/bin"), condabin.clone()];
        let out = build_path(&current, &[PathBuf::from("/e/bin")], &[], &condabin);
        assert_eq!(
            out,
            vec![PathBuf::from("/e/bin"), PathBuf::from("/usr/bin"), condabin]
        );
    }
}
