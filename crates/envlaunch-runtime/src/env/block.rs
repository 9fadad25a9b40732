//! Environment block handed to child processes.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::common::PATH_VAR;

/// An owned snapshot of environment variables.
///
/// Built from the launcher's own environment, modified by activation, then
/// passed to the child as its complete environment. On Windows keys compare
/// case-insensitively, so `Path` and `PATH` are the same variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvBlock {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvBlock {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars_os())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let mut block = Self::default();
        for (k, v) in pairs {
            block.set(k, v);
        }
        block
    }

    fn find_key(&self, key: &OsStr) -> Option<&OsString> {
        if cfg!(windows) {
            let wanted = key.to_string_lossy().to_uppercase();
            self.vars
                .keys()
                .find(|k| k.to_string_lossy().to_uppercase() == wanted)
        } else {
            self.vars.get_key_value(key).map(|(k, _)| k)
        }
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = self.find_key(key.as_ref())?;
        self.vars.get(key).map(OsString::as_os_str)
    }

    /// Value as UTF-8 text (lossy).
    pub fn get_str(&self, key: impl AsRef<OsStr>) -> Option<String> {
        self.get(key).map(|v| v.to_string_lossy().into_owned())
    }

    /// Set `key`, reusing the existing spelling of the key if present.
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        let key = key.into();
        let key = self.find_key(&key).cloned().unwrap_or(key);
        self.vars.insert(key, value.into());
    }

    pub fn remove(&mut self, key: impl AsRef<OsStr>) -> Option<OsString> {
        let key = self.find_key(key.as_ref())?.clone();
        self.vars.remove(&key)
    }

    pub fn contains(&self, key: impl AsRef<OsStr>) -> bool {
        self.find_key(key.as_ref()).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Entries of `PATH`, in order.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        self.get(PATH_VAR)
            .map(|p| std::env::split_paths(p).collect())
            .unwrap_or_default()
    }

    /// Replace `PATH` with `entries`.
    pub fn set_path_entries(&mut self, entries: &[PathBuf]) -> Result<(), std::env::JoinPathsError> {
        let joined = std::env::join_paths(entries)?;
        self.set(PATH_VAR, joined);
        Ok(())
    }

    /// Variables that differ from `base`: `(key, Some(new))` for added or
    /// changed, `(key, None)` for removed.
    pub fn diff(&self, base: &EnvBlock) -> Vec<(String, Option<String>)> {
        let mut out = Vec::new();
        for (k, v) in self.iter() {
            if base.get(k) != Some(v) {
                out.push((
                    k.to_string_lossy().into_owned(),
                    Some(v.to_string_lossy().into_owned()),
                ));
            }
        }
        for (k, _) in base.iter() {
            if !self.contains(k) {
                out.push((k.to_string_lossy().into_owned(), None));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut block = EnvBlock::from_pairs([("A", "1")]);
        block.set("B", "2");
        assert_eq!(block.get_str("A").as_deref(), Some("1"));
        assert_eq!(block.len(), 2);
        assert_eq!(block.remove("A"), Some(OsString::from("1")));
        assert!(!block.contains("A"));
    }

    #[test]
    fn test_path_entries_roundtrip_order() {
        let mut block = EnvBlock::default();
        let entries = vec![PathBuf::from("/a/bin"), PathBuf::from("/usr/bin")];
        block.set_path_entries(&entries).unwrap();
        assert_eq!(block.path_entries(), entries);
    }

    #[test]
    fn test_diff_reports_changes() {
        let base = EnvBlock::from_pairs([("KEEP", "1"), ("CHANGE", "old"), ("DROP", "x")]);
        let mut next = base.clone();
        next.set("CHANGE", "new");
        next.set("ADD", "y");
        next.remove("DROP");
        assert_eq!(
            next.diff(&base),
            vec![
                ("ADD".to_string(), Some("y".to_string())),
                ("CHANGE".to_string(), Some("new".to_string())),
                ("DROP".to_string(), None),
            ]
        );
    }
}
