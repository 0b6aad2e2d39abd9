// src/main.rs
use anyhow::Result;
use clap::Parser;
use tracing::info;

use rts_core::config::{self, Cli, Mode};
use rts_core::{edf, logging, rmrcs};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let needs_prompt = cli.needs_interactive_prompt();
    let mut cfg = cli.resolve();

    if needs_prompt {
        cfg.mode = config::prompt_interactive_choice()?;
    }

    info!(mode = ?cfg.mode, "rts_core starting");

    match cfg.mode {
        Mode::Edf => edf::run_live_demo(&cfg).await?,
        Mode::Rmrcs => rmrcs::run_offline(&cfg)?,
    }

    Ok(())
}
