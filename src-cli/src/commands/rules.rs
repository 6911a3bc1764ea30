use anyhow::{Context, Result};
use std::path::Path;

use boilerstrip_core::{open_rule_store, register_rule, remove_rule};
use boilerstrip_rules::RuleDraft;

use crate::cli::RuleCommands;

pub fn handle(cmd: RuleCommands, config_path: &Path) -> Result<()> {
    let (config, audit) = super::open(config_path)?;
    let mut store = open_rule_store(&config.rules_file, &audit)?;

    match cmd {
        RuleCommands::List => {
            if store.rules().is_empty() {
                println!("No rules in {}", store.path().display());
                return Ok(());
            }
            for (i, rule) in store.rules().iter().enumerate() {
                println!("{:>3}. {}", i + 1, rule.to_line());
            }
            Ok(())
        }
        RuleCommands::Add {
            pattern,
            pages,
            reference,
        } => {
            let draft = RuleDraft::new(pattern, pages, reference);
            let rule = register_rule(&mut store, &draft, &config.reference_folder, &audit)
                .context("rule not added")?;
            println!("✓ Added rule {}: {}", store.rules().len(), rule.to_line());
            Ok(())
        }
        RuleCommands::Remove { position } => {
            let removed = match position.checked_sub(1) {
                Some(index) => remove_rule(&mut store, index, &audit)?,
                None => None,
            };
            match removed {
                Some(rule) => {
                    println!("✓ Removed rule: {}", rule.to_line());
                    Ok(())
                }
                None => anyhow::bail!(
                    "no rule at position {} ({} rules)",
                    position,
                    store.rules().len()
                ),
            }
        }
    }
}
