//! Rule store lifecycle and rule registration.

use std::fs;
use std::path::{Path, PathBuf};

use boilerstrip_audit::AuditLog;
use boilerstrip_rules::{LoadStatus, Rule, RuleDraft, RuleStore};

use crate::{ensure_dir, CoreError, Result};

/// Loads the rule store, creating an empty rule file (and noting it in the
/// audit log) when none exists.
pub fn open_rule_store(path: impl Into<PathBuf>, audit: &AuditLog) -> Result<RuleStore> {
    let (store, status) = RuleStore::load(path)?;
    match status {
        LoadStatus::Initialized => {
            audit.append("rule file not found")?;
            store.save()?;
            audit.append("created a new rule file")?;
        }
        LoadStatus::Loaded { skipped, .. } if skipped > 0 => {
            log::warn!(
                "[Rules] {} malformed lines ignored in {}",
                skipped,
                store.path().display()
            );
        }
        LoadStatus::Loaded { .. } => {}
    }
    Ok(store)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Validates `draft`, copies its reference document into `reference_dir`
/// (replacing any copy of the same name), then persists the rule.
///
/// Nothing is copied or stored when validation fails.
pub fn register_rule(
    store: &mut RuleStore,
    draft: &RuleDraft,
    reference_dir: &Path,
    audit: &AuditLog,
) -> Result<Rule> {
    let rule = draft
        .validate()
        .map_err(boilerstrip_rules::RuleError::from)?;

    ensure_dir(reference_dir)?;
    let target = reference_dir.join(&rule.reference);
    if !same_file(&draft.reference, &target) {
        fs::copy(&draft.reference, &target).map_err(|e| CoreError::io(&target, e))?;
        log::info!(
            "[Rules] reference {} copied to {}",
            draft.reference.display(),
            target.display()
        );
    }

    store.append(rule.clone())?;
    audit.append(format!("rule '{}' added", rule.pattern))?;
    Ok(rule)
}

/// Removes the rule at zero-based `position`. Returns `None` when there is
/// no such rule.
pub fn remove_rule(
    store: &mut RuleStore,
    position: usize,
    audit: &AuditLog,
) -> Result<Option<Rule>> {
    let Some(rule) = store.rules().get(position).cloned() else {
        return Ok(None);
    };
    if !store.remove(&rule)? {
        return Ok(None);
    }
    audit.append(format!("rule '{}' removed", rule.pattern))?;
    Ok(Some(rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boilerstrip_audit::{DateRange, LogEntry};
    use boilerstrip_rules::{RuleError, ValidationError};
    use chrono::NaiveDateTime;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        audit: AuditLog,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let audit = AuditLog::open(root.join("audit.log")).unwrap();
        Fixture {
            _dir: dir,
            root,
            audit,
        }
    }

    fn messages(audit: &AuditLog) -> Vec<String> {
        let all = DateRange::new(NaiveDateTime::MIN, NaiveDateTime::MAX);
        audit
            .query(&all)
            .unwrap()
            .text
            .lines()
            .filter_map(LogEntry::parse_line)
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_missing_store_is_created_and_logged() {
        let fx = fixture();
        let path = fx.root.join("rules").join("boilerstrip.rules");

        let store = open_rule_store(&path, &fx.audit).unwrap();
        assert!(store.rules().is_empty());
        assert!(path.is_file());
        assert_eq!(
            messages(&fx.audit),
            vec!["rule file not found", "created a new rule file"]
        );

        open_rule_store(&path, &fx.audit).unwrap();
        assert_eq!(messages(&fx.audit).len(), 2);
    }

    #[test]
    fn test_register_copies_reference_and_persists() {
        let fx = fixture();
        let original = fx.root.join("elsewhere").join("ref.pdf");
        fs::create_dir_all(original.parent().unwrap()).unwrap();
        fs::write(&original, b"reference").unwrap();
        let reference_dir = fx.root.join("Reference");

        let mut store = open_rule_store(fx.root.join("r.rules"), &fx.audit).unwrap();
        let draft = RuleDraft::new("invoice", " 2, 1,2 ", &original);
        let rule = register_rule(&mut store, &draft, &reference_dir, &fx.audit).unwrap();

        assert_eq!(rule.reference, "ref.pdf");
        assert_eq!(rule.pages.pages(), &[1, 2]);
        assert_eq!(fs::read(reference_dir.join("ref.pdf")).unwrap(), b"reference");

        let (reloaded, _) = RuleStore::load(fx.root.join("r.rules")).unwrap();
        assert_eq!(reloaded.rules().get(0), Some(&rule));
        assert_eq!(messages(&fx.audit).last().unwrap(), "rule 'invoice' added");
    }

    #[test]
    fn test_reference_already_in_place_is_kept() {
        let fx = fixture();
        let reference_dir = fx.root.join("Reference");
        fs::create_dir_all(&reference_dir).unwrap();
        let in_place = reference_dir.join("ref.pdf");
        fs::write(&in_place, b"reference").unwrap();

        let mut store = open_rule_store(fx.root.join("r.rules"), &fx.audit).unwrap();
        let draft = RuleDraft::new("invoice", "1", &in_place);
        register_rule(&mut store, &draft, &reference_dir, &fx.audit).unwrap();

        assert_eq!(fs::read(&in_place).unwrap(), b"reference");
    }

    #[test]
    fn test_malformed_pages_store_nothing() {
        let fx = fixture();
        let original = fx.root.join("ref.pdf");
        fs::write(&original, b"reference").unwrap();
        let reference_dir = fx.root.join("Reference");
        let rules_path = fx.root.join("r.rules");

        let mut store = open_rule_store(&rules_path, &fx.audit).unwrap();
        let before = fs::read_to_string(&rules_path).unwrap();
        let draft = RuleDraft::new("invoice", "1,,a", &original);
        let err = register_rule(&mut store, &draft, &reference_dir, &fx.audit).unwrap_err();

        assert!(matches!(
            err,
            CoreError::Rules(RuleError::Validation(
                ValidationError::IllegalPageCharacters(_)
            ))
        ));
        assert!(store.rules().is_empty());
        assert_eq!(fs::read_to_string(&rules_path).unwrap(), before);
        assert!(!reference_dir.join("ref.pdf").exists());
    }

    #[test]
    fn test_remove_by_position() {
        let fx = fixture();
        let original = fx.root.join("ref.pdf");
        fs::write(&original, b"reference").unwrap();
        let reference_dir = fx.root.join("Reference");

        let mut store = open_rule_store(fx.root.join("r.rules"), &fx.audit).unwrap();
        for pattern in ["first", "second"] {
            let draft = RuleDraft::new(pattern, "1", &original);
            register_rule(&mut store, &draft, &reference_dir, &fx.audit).unwrap();
        }

        assert!(remove_rule(&mut store, 5, &fx.audit).unwrap().is_none());
        let removed = remove_rule(&mut store, 0, &fx.audit).unwrap().unwrap();
        assert_eq!(removed.pattern, "first");
        assert_eq!(store.rules().len(), 1);
        assert_eq!(store.rules().get(0).unwrap().pattern, "second");
        assert_eq!(messages(&fx.audit).last().unwrap(), "rule 'first' removed");
    }
}
