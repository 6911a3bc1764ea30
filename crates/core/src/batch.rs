//! One pass over the source folder.
//!
//! Each candidate goes `Unmatched -> Evaluating -> Converted | Rejected |
//! Errored`. A failure on one file is logged and the run moves on; only a
//! failed audit write stops the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use boilerstrip_audit::{self as audit, AuditLog};
use boilerstrip_pdf::{blank_out_pages, DocumentEditor};
use boilerstrip_render::PageRenderer;
use boilerstrip_rules::{Rule, RuleList};
use boilerstrip_verify::{verify_pages, CompareOptions, Verdict};
use serde::Serialize;

use crate::discovery::{collect, CandidateFile, DiscoveryWarning};
use crate::{ensure_dir, Result};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Folder holding the reference documents named by rules.
    pub reference_dir: PathBuf,
    pub options: CompareOptions,
}

/// Final state of one candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FileOutcome {
    /// No rule matched the file name.
    Unmatched,
    /// Pages were blanked and the file moved to the destination.
    Converted,
    /// `page` (1-based) differs from the reference; the file was left alone.
    Rejected { page: u32 },
    Errored { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub warnings: Vec<DiscoveryWarning>,
    /// Set when the run stopped early on request.
    pub cancelled: bool,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn converted(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Converted))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Rejected { .. }))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Errored { .. }))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unmatched))
    }
}

/// Cooperative stop flag, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Compares the rule's pages and blanks them when they all match.
fn evaluate<R: PageRenderer, E: DocumentEditor>(
    renderer: &R,
    editor: &E,
    file: &CandidateFile,
    rule: &Rule,
    reference_dir: &Path,
    options: &CompareOptions,
) -> std::result::Result<FileOutcome, String> {
    let reference = reference_dir.join(&rule.reference);
    let verdict = verify_pages(
        renderer,
        &file.source,
        &reference,
        rule.pages.indices(),
        options,
    )
    .map_err(|e| e.to_string())?;

    match verdict {
        Verdict::Equivalent => {
            let indices: Vec<usize> = rule.pages.indices().collect();
            blank_out_pages(editor, &file.source, &indices, &file.destination)
                .map_err(|e| e.to_string())?;
            Ok(FileOutcome::Converted)
        }
        Verdict::Differs { index } => Ok(FileOutcome::Rejected {
            page: u32::try_from(index + 1).unwrap_or(u32::MAX),
        }),
    }
}

/// Runs one batch: discovers candidates, applies the first matching rule to
/// each, and records every processed file in the audit log.
///
/// The source, destination, and reference folders are created if missing.
pub fn run_batch<R: PageRenderer, E: DocumentEditor>(
    renderer: &R,
    editor: &E,
    rules: &RuleList,
    audit_log: &AuditLog,
    config: &BatchConfig,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    for dir in [&config.source, &config.destination, &config.reference_dir] {
        ensure_dir(dir)?;
    }

    let discovery = collect(&config.source, &config.destination)?;
    audit_log.append(format!("found {} files", discovery.files.len()))?;

    let mut report = BatchReport {
        warnings: discovery.warnings,
        ..Default::default()
    };

    for file in discovery.files {
        if cancel.is_cancelled() {
            log::info!("[Batch] cancelled after {} files", report.files.len());
            report.cancelled = true;
            break;
        }

        let name = file.file_name();
        let outcome = match rules.first_match(&name) {
            None => {
                log::debug!("[Batch] {} matches no rule", name);
                FileOutcome::Unmatched
            }
            Some(rule) => {
                log::info!("[Batch] {} matched rule '{}'", name, rule.pattern);
                let evaluated = evaluate(
                    renderer,
                    editor,
                    &file,
                    rule,
                    &config.reference_dir,
                    &config.options,
                );
                match evaluated {
                    Ok(FileOutcome::Converted) => {
                        audit_log.append(audit::converted(&name))?;
                        FileOutcome::Converted
                    }
                    Ok(outcome) => {
                        audit_log.append(audit::rejected(&name))?;
                        outcome
                    }
                    Err(message) => {
                        log::warn!("[Batch] {} failed: {}", name, message);
                        audit_log.append(format!("error processing {}: {}", name, message))?;
                        FileOutcome::Errored { message }
                    }
                }
            }
        };

        report.files.push(FileReport {
            source: file.source,
            destination: file.destination,
            outcome,
        });
    }

    log::info!(
        "[Batch] done: {} converted, {} rejected, {} errored, {} unmatched",
        report.converted(),
        report.rejected(),
        report.errored(),
        report.unmatched()
    );
    Ok(report)
}
