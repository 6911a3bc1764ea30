//! Rule file persistence.
//!
//! The whole file is rewritten on every mutation so it always mirrors the
//! in-memory list.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Result, Rule, RuleError, RuleList};

/// Outcome of [`RuleStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The rule file existed and was read.
    Loaded { rules: usize, skipped: usize },
    /// No rule file was present; the store starts empty and the caller is
    /// expected to create the file.
    Initialized,
}

/// Owns the rule list for the lifetime of the process.
#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    list: RuleList,
}

impl RuleStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<(Self, LoadStatus)> {
        let path = path.into();
        let (list, status) = match fs::read_to_string(&path) {
            Ok(text) => {
                let (list, skipped) = RuleList::parse(&text);
                let status = LoadStatus::Loaded {
                    rules: list.len(),
                    skipped,
                };
                (list, status)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                (RuleList::new(), LoadStatus::Initialized)
            }
            Err(source) => return Err(RuleError::Persistence { path, source }),
        };

        log::info!("[Rules] loaded {:?} from {}", status, path.display());
        Ok((Self { path, list }, status))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rules(&self) -> &RuleList {
        &self.list
    }

    /// Appends a rule and rewrites the file. On a write failure the
    /// in-memory list is restored.
    pub fn append(&mut self, rule: Rule) -> Result<()> {
        self.list.push(rule);
        if let Err(err) = self.save() {
            self.list.rules.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Removes the first rule equal to `rule`. Returns `false` when no such
    /// rule exists, in which case nothing is written.
    pub fn remove(&mut self, rule: &Rule) -> Result<bool> {
        let Some(position) = self.list.rules.iter().position(|r| r == rule) else {
            return Ok(false);
        };
        let removed = self.list.rules.remove(position);
        if let Err(err) = self.save() {
            self.list.rules.insert(position, removed);
            return Err(err);
        }
        Ok(true)
    }

    /// Rewrites the rule file from the current list.
    pub fn save(&self) -> Result<()> {
        let persist = |source: std::io::Error| RuleError::Persistence {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(persist)?;
        }
        let staging = self.path.with_extension("rules.tmp");
        fs::write(&staging, self.list.render()).map_err(persist)?;
        fs::rename(&staging, &self.path).map_err(persist)?;

        log::debug!("[Rules] wrote {} rules to {}", self.list.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageSet;

    fn rule(pattern: &str, pages: &[u32]) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            pages: PageSet::new(pages.iter().copied()).unwrap(),
            reference: format!("{}.pdf", pattern),
        }
    }

    #[test]
    fn test_missing_store_is_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boilerstrip.rules");

        let (store, status) = RuleStore::load(&path).unwrap();
        assert_eq!(status, LoadStatus::Initialized);
        assert!(store.rules().is_empty());
        assert!(!path.exists());

        store.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_save_then_reload_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boilerstrip.rules");

        let (mut store, _) = RuleStore::load(&path).unwrap();
        store.append(rule("invoice", &[2])).unwrap();
        store.append(rule("contract", &[1, 3, 4])).unwrap();
        store.append(rule("inv", &[5])).unwrap();

        let (reloaded, status) = RuleStore::load(&path).unwrap();
        assert_eq!(status, LoadStatus::Loaded { rules: 3, skipped: 0 });
        assert_eq!(reloaded.rules(), store.rules());

        // Saving an unchanged list rewrites identical content.
        let before = fs::read_to_string(&path).unwrap();
        reloaded.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boilerstrip.rules");

        let (mut store, _) = RuleStore::load(&path).unwrap();
        store.append(rule("a", &[1])).unwrap();
        store.append(rule("b", &[2])).unwrap();

        assert!(store.remove(&rule("a", &[1])).unwrap());
        assert!(!store.remove(&rule("zzz", &[1])).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "b -> 2 -> b.pdf\n");
    }

    #[test]
    fn test_load_tolerates_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boilerstrip.rules");
        fs::write(&path, "a -> 1 -> a.pdf\nnot a rule\nb -> 1,,x -> b.pdf\n").unwrap();

        let (store, status) = RuleStore::load(&path).unwrap();
        assert_eq!(status, LoadStatus::Loaded { rules: 1, skipped: 2 });
        assert_eq!(store.rules().rules, vec![rule("a", &[1])]);
    }

    #[test]
    fn test_failed_write_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        // The store path is a directory, so the final rename fails.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let mut store = RuleStore {
            path: path.clone(),
            list: RuleList::new(),
        };
        let err = store.append(rule("a", &[1])).unwrap_err();
        assert!(matches!(err, RuleError::Persistence { .. }));
        assert!(store.rules().is_empty());
    }
}
