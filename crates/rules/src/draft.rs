//! Validation of user-entered rules.

use std::path::PathBuf;

use crate::{PageSet, Rule, ValidationError, FIELD_SEPARATOR};

/// Raw rule input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RuleDraft {
    pub pattern: String,
    pub pages: String,
    /// Full path of the reference document to register.
    pub reference: PathBuf,
}

impl RuleDraft {
    pub fn new(
        pattern: impl Into<String>,
        pages: impl Into<String>,
        reference: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            pages: pages.into(),
            reference: reference.into(),
        }
    }

    /// Checks the draft and produces the rule to store.
    ///
    /// The rule refers to the reference by file name only.
    pub fn validate(&self) -> Result<Rule, ValidationError> {
        let pattern = self.pattern.trim();
        if pattern.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        if pattern.contains(FIELD_SEPARATOR) {
            return Err(ValidationError::ReservedSeparator(FIELD_SEPARATOR.to_string()));
        }

        if !self.reference.is_file() {
            return Err(ValidationError::MissingReference(self.reference.clone()));
        }
        let reference = self
            .reference
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ValidationError::MissingReference(self.reference.clone()))?;
        if reference.contains(FIELD_SEPARATOR) {
            return Err(ValidationError::ReservedSeparator(FIELD_SEPARATOR.to_string()));
        }

        let pages = PageSet::parse(&self.pages)?;

        Ok(Rule {
            pattern: pattern.to_string(),
            pages,
            reference,
        })
    }
}
