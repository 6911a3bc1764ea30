use anyhow::{Context, Result};
use std::path::Path;
use std::thread;

use boilerstrip_core::{open_rule_store, run_batch, BatchConfig, CancelToken, FileOutcome};
use boilerstrip_pdf::LopdfEditor;
use boilerstrip_render::PdfiumRenderer;

use crate::cli::RunArgs;

pub fn handle(args: RunArgs, config_path: &Path) -> Result<()> {
    let (mut config, audit) = super::open(config_path)?;
    if let Some(source) = args.source {
        config.source_folder = source;
    }
    if let Some(destination) = args.destination {
        config.destination_folder = destination;
    }
    if let Some(reference) = args.reference {
        config.reference_folder = reference;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(dpi) = args.dpi {
        config.dpi = dpi;
    }
    config.validate()?;

    let store = open_rule_store(&config.rules_file, &audit)?;
    let renderer = match &config.pdfium_library {
        Some(library) => PdfiumRenderer::bind_at(library),
        None => PdfiumRenderer::bind(),
    }
    .context("pdfium library not available")?;
    let batch = BatchConfig {
        source: config.source_folder.clone(),
        destination: config.destination_folder.clone(),
        reference_dir: config.reference_folder.clone(),
        options: config.compare_options(),
    };

    let feed = audit.subscribe();
    let printer = (!args.json).then(|| {
        thread::spawn(move || {
            for entry in feed {
                println!("{}", entry.to_line());
            }
        })
    });

    let result = run_batch(
        &renderer,
        &LopdfEditor,
        store.rules(),
        &audit,
        &batch,
        &CancelToken::new(),
    );
    // Closes the feed so the printer drains and exits.
    drop(audit);
    if let Some(printer) = printer {
        let _ = printer.join();
    }
    let report = result?;

    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.files)?);
        return Ok(());
    }

    for file in &report.files {
        if let FileOutcome::Errored { message } = &file.outcome {
            eprintln!("✗ {}: {}", file.source.display(), message);
        }
    }
    println!(
        "{} converted, {} rejected, {} errored, {} unmatched",
        report.converted(),
        report.rejected(),
        report.errored(),
        report.unmatched()
    );
    Ok(())
}
