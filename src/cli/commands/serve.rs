//! `serve` command: background planning jobs plus the HTTP server.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::adapters::http::{StateHttpConfig, StateHttpServer};
use crate::domain::models::Config;
use crate::domain::ports::{SpeechSynthesizer, TextGenerator};
use crate::infrastructure::llm::{DeepSeekClient, GeminiClient, RetryPolicy};
use crate::infrastructure::tts::ElevenLabsSynthesizer;
use crate::services::{
    EncounterService, Planner, PoemService, RendezvousCache, SharedCache, Simulation,
    TriggerService,
};

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Override the configured bind host.
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured port.
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let retry = RetryPolicy::new(
        config.retry.max_retries,
        config.retry.initial_backoff_ms,
        config.retry.max_backoff_ms,
    );

    let gemini: Arc<dyn TextGenerator> = Arc::new(
        GeminiClient::new(config.llm.gemini.clone(), retry.clone())
            .context("failed to build Gemini client")?,
    );
    let deepseek: Arc<dyn TextGenerator> = Arc::new(
        DeepSeekClient::new(config.llm.deepseek.clone(), retry)
            .context("failed to build DeepSeek client")?,
    );

    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = if config.tts.enabled {
        match ElevenLabsSynthesizer::new(config.tts.clone()) {
            Ok(synth) => Some(Arc::new(synth)),
            Err(err) => {
                warn!(error = %err, "speech synthesis unavailable, poems stay silent");
                None
            }
        }
    } else {
        None
    };

    let cache: SharedCache = Arc::new(RendezvousCache::new());
    let trigger = Arc::new(TriggerService::new(
        gemini.clone(),
        config.simulation.special_conditions.clone(),
    ));
    let poems = Arc::new(PoemService::new(
        deepseek,
        synthesizer,
        config.llm.deepseek.poem_theme.clone(),
    ));
    let planner = Planner::new(
        gemini.clone(),
        cache.clone(),
        trigger,
        poems.clone(),
        config.simulation.locations.clone(),
    );

    // One background planning job per inhabitant. A failed job leaves its
    // keys unpublished; consumers keep answering "pending".
    for persona in config.simulation.personas.clone() {
        let planner = planner.clone();
        tokio::spawn(async move {
            if let Err(err) = planner.run_for_agent(&persona).await {
                warn!(agent = %persona.name, error = %err, "planning job failed");
            }
        });
    }
    info!(agents = config.simulation.personas.len(), "planning jobs started");

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
    let simulation = Simulation::new(config.simulation.clone(), gemini, encounters);

    let server = StateHttpServer::new(
        StateHttpConfig::from(&config.server),
        cache,
        simulation,
        poems,
    );
    server
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|err| anyhow!(err))?;
    Ok(())
}
