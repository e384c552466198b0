use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use maintstock_infra::{FileKeyValueStore, LedgerRepository, StorageConfig};

mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    maintstock_observability::init();

    let config = StorageConfig::from_env();
    let store = FileKeyValueStore::open(&config.data_dir)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;
    let repo = LedgerRepository::new(store, config.keys.clone());

    let mut ledger = repo
        .open(
            Arc::new(config.clock()),
            config.ledger.clone(),
            config.seed_sample,
        )
        .context("failed to load inventory")?;

    let mut stdout = std::io::stdout().lock();
    let outcome = commands::run(cli.command, &mut ledger, &repo, &mut stdout)?;

    if outcome.mutated {
        repo.persist(&ledger).context("failed to save inventory")?;
        tracing::info!("inventory saved");
    }
    Ok(())
}
