//! Page-blanking rules: schema, validation and persistence.
//!
//! A rule pairs a file-name pattern with the pages that must match a
//! reference document before those pages are blanked. Rules are kept in an
//! ordered list; the first rule whose pattern occurs in a file name wins.

mod draft;
mod store;

pub use draft::RuleDraft;
pub use store::{LoadStatus, RuleStore};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Field separator of the persisted rule line.
pub const FIELD_SEPARATOR: &str = "->";

static PAGE_INPUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[,\s\d]+$").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").unwrap());

pub type Result<T> = std::result::Result<T, RuleError>;

/// Rejected rule input. Nothing is stored when one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file name pattern must not be empty")]
    EmptyPattern,
    #[error("'{0}' is reserved as the rule field separator")]
    ReservedSeparator(String),
    #[error("reference document not found: {}", .0.display())]
    MissingReference(PathBuf),
    #[error("pages may only contain digits, commas and whitespace: {0:?}")]
    IllegalPageCharacters(String),
    #[error("invalid page number: {0:?}")]
    InvalidPageNumber(String),
    #[error("page list must not be empty")]
    EmptyPageList,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to persist rules to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-empty, strictly ascending set of 1-based page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct PageSet(Vec<u32>);

impl PageSet {
    /// Builds a set from arbitrary page numbers; duplicates are dropped and
    /// the result is sorted. Returns `None` for an empty input or page `0`.
    pub fn new(pages: impl IntoIterator<Item = u32>) -> Option<Self> {
        let mut pages: Vec<u32> = pages.into_iter().collect();
        if pages.is_empty() || pages.contains(&0) {
            return None;
        }
        pages.sort_unstable();
        pages.dedup();
        Some(Self(pages))
    }

    /// Parses user page input such as `"3, 1,,2 ,3"`.
    ///
    /// Whitespace is stripped and runs of commas collapse to one before the
    /// tokens are read. Repeated pages are removed rather than rejected.
    pub fn parse(input: &str) -> std::result::Result<Self, ValidationError> {
        if input.trim().is_empty() {
            return Err(ValidationError::EmptyPageList);
        }
        if !PAGE_INPUT.is_match(input) {
            return Err(ValidationError::IllegalPageCharacters(input.to_string()));
        }

        let normalized = SPACES.replace_all(input, "");
        let normalized = COMMAS.replace_all(&normalized, ",");

        let mut pages = Vec::new();
        for token in normalized.split(',') {
            match token.parse::<u32>() {
                Ok(page) if page > 0 => pages.push(page),
                _ => return Err(ValidationError::InvalidPageNumber(token.to_string())),
            }
        }

        Self::new(pages).ok_or(ValidationError::EmptyPageList)
    }

    pub fn pages(&self) -> &[u32] {
        &self.0
    }

    /// Zero-based page indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|page| (*page - 1) as usize)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, page) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", page)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<u32>> for PageSet {
    type Error = ValidationError;

    fn try_from(pages: Vec<u32>) -> std::result::Result<Self, Self::Error> {
        Self::new(pages).ok_or(ValidationError::EmptyPageList)
    }
}

impl From<PageSet> for Vec<u32> {
    fn from(set: PageSet) -> Self {
        set.0
    }
}

/// A single matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Case-sensitive substring tested against the file name.
    pub pattern: String,
    /// Pages that must match the reference.
    pub pages: PageSet,
    /// File name of the reference document inside the reference folder.
    pub reference: String,
}

impl Rule {
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.contains(&self.pattern)
    }

    /// Parses one persisted line.
    ///
    /// Lines that do not split into exactly three non-empty fields, or whose
    /// page list is unreadable, yield `None` and are skipped by the loader.
    pub fn parse_line(line: &str) -> Option<Rule> {
        let parts: Vec<&str> = line
            .split(FIELD_SEPARATOR)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() != 3 {
            return None;
        }

        let pattern = parts[0].trim();
        let reference = parts[2].trim();
        if pattern.is_empty() || reference.is_empty() {
            return None;
        }
        let pages = PageSet::parse(parts[1].trim()).ok()?;

        Some(Rule {
            pattern: pattern.to_string(),
            pages,
            reference: reference.to_string(),
        })
    }

    /// Persisted line form: `pattern -> pages -> reference`.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.pattern, FIELD_SEPARATOR, self.pages, FIELD_SEPARATOR, self.reference
        )
    }
}

/// Ordered rules; position is precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleList {
    pub rules: Vec<Rule>,
}

impl RuleList {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Parses the persisted text, returning the list and the number of
    /// non-blank lines that were skipped as malformed.
    pub fn parse(text: &str) -> (Self, usize) {
        let mut list = Self::new();
        let mut skipped = 0;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match Rule::parse_line(line) {
                Some(rule) => list.rules.push(rule),
                None => {
                    log::debug!("[Rules] skipping malformed line: {:?}", line);
                    skipped += 1;
                }
            }
        }
        (list, skipped)
    }

    /// Full persisted text, one rule per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&rule.to_line());
            out.push('\n');
        }
        out
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Removes the first rule equal to `rule`.
    pub fn remove(&mut self, rule: &Rule) -> Option<Rule> {
        let position = self.rules.iter().position(|r| r == rule)?;
        Some(self.rules.remove(position))
    }

    /// The rule that applies to `file_name`: the first one, in list order,
    /// whose pattern occurs in it. Later rules are never consulted.
    pub fn first_match(&self, file_name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(file_name))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, pages: &[u32], reference: &str) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            pages: PageSet::new(pages.iter().copied()).unwrap(),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn test_page_set_normalizes_input() {
        let set = PageSet::parse(" 5, 2,,, 2 ,1 ").unwrap();
        assert_eq!(set.pages(), &[1, 2, 5]);
        assert_eq!(set.to_string(), "1,2,5");
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![0, 1, 4]);
    }

    #[test]
    fn test_page_set_rejects_bad_input() {
        assert_eq!(
            PageSet::parse("1,,a"),
            Err(ValidationError::IllegalPageCharacters("1,,a".to_string()))
        );
        assert_eq!(
            PageSet::parse("1,0"),
            Err(ValidationError::InvalidPageNumber("0".to_string()))
        );
        assert_eq!(
            PageSet::parse(",3"),
            Err(ValidationError::InvalidPageNumber(String::new()))
        );
        assert_eq!(PageSet::parse("   "), Err(ValidationError::EmptyPageList));
        assert!(matches!(
            PageSet::parse("99999999999"),
            Err(ValidationError::InvalidPageNumber(_))
        ));
    }

    #[test]
    fn test_parse_line_trims_fields() {
        let parsed = Rule::parse_line("  invoice ->  2,4 -> ref.pdf ").unwrap();
        assert_eq!(parsed, rule("invoice", &[2, 4], "ref.pdf"));
    }

    #[test]
    fn test_parse_line_skips_malformed() {
        // Anything that is not exactly three fields is dropped, not an error.
        assert!(Rule::parse_line("invoice -> 2").is_none());
        assert!(Rule::parse_line("a -> 1 -> b -> c").is_none());
        assert!(Rule::parse_line("invoice ->-> ref.pdf").is_none());
        assert!(Rule::parse_line("invoice -> x -> ref.pdf").is_none());
        assert!(Rule::parse_line("   -> 1 -> ref.pdf").is_none());
    }

    #[test]
    fn test_rule_list_parse_counts_skipped() {
        let text = "a -> 1 -> r1.pdf\n\ngarbage\nb -> 2,3 -> r2.pdf\n";
        let (list, skipped) = RuleList::parse(text);
        assert_eq!(list.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(list.render(), "a -> 1 -> r1.pdf\nb -> 2,3 -> r2.pdf\n");
    }

    #[test]
    fn test_first_match_wins() {
        let mut list = RuleList::new();
        list.push(rule("invoice", &[1], "a.pdf"));
        list.push(rule("invoice_00", &[2], "b.pdf"));

        let selected = list.first_match("invoice_0001.pdf").unwrap();
        assert_eq!(selected.reference, "a.pdf");
        assert!(list.first_match("receipt.pdf").is_none());
        // Case-sensitive substring test.
        assert!(list.first_match("INVOICE.pdf").is_none());
    }

    #[test]
    fn test_remove_by_identity() {
        let mut list = RuleList::new();
        let first = rule("a", &[1], "r.pdf");
        let second = rule("b", &[1], "r.pdf");
        list.push(first.clone());
        list.push(second.clone());

        assert_eq!(list.remove(&first), Some(first.clone()));
        assert_eq!(list.remove(&first), None);
        assert_eq!(list.rules, vec![second]);
    }
}
