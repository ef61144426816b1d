//! `simulate` command: one offline day, logged tick by tick.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::models::Config;
use crate::domain::ports::TextGenerator;
use crate::infrastructure::llm::{GeminiClient, RetryPolicy};
use crate::services::{EncounterService, Simulation};

#[derive(Debug, Default, Args)]
pub struct SimulateArgs {
    /// Override how many random encounters the day gets.
    #[arg(long)]
    pub events: Option<usize>,
}

pub async fn execute(args: SimulateArgs, mut config: Config) -> Result<()> {
    if let Some(events) = args.events {
        config.simulation.random_events = events;
    }

    let retry = RetryPolicy::new(
        config.retry.max_retries,
        config.retry.initial_backoff_ms,
        config.retry.max_backoff_ms,
    );
    let gemini: Arc<dyn TextGenerator> = Arc::new(
        GeminiClient::new(config.llm.gemini.clone(), retry)
            .context("failed to build Gemini client")?,
    );

    let agent_names: Vec<String> = config
        .simulation
        .personas
        .iter()
        .map(|p| p.name.clone())
        .collect();
    let encounters = EncounterService::new(
        gemini.clone(),
        agent_names,
        config.simulation.locations.clone(),
    );

    let mut simulation = Simulation::new(config.simulation, gemini, encounters);
    simulation.run_day().await
}
