mod cli;
mod config;
mod logging;
mod script;
mod watch;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cuewatch_core::{PollPhase, DEFAULT_JOB_ERROR};
use cuewatch_engine::{JobPoller, ReqwestStatusSource};
use cuewatch_logging::{cw_info, cw_warn, level_for_verbosity};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    logging::initialize(args.log, level_for_verbosity(args.verbose));

    // Script errors surface before any network work.
    let steps = match &args.script {
        Some(path) => Some(script::parse(&script::read(path)?)?),
        None => None,
    };

    let config = config::load(&args.config).with_overrides(args.base_url.clone(), args.voice_off);
    let source = ReqwestStatusSource::new(config.api_settings())
        .with_context(|| format!("invalid backend url {:?}", config.api.base_url))?;
    let poller = JobPoller::new(Arc::new(source)).with_schedule(config.poll_schedule());

    cw_info!("Watching analysis {} at {}", args.job_id, config.api.base_url);
    let state = watch::run(&poller, &args.job_id).await?;

    match state.phase() {
        PollPhase::Complete => {}
        PollPhase::Failed => {
            let message = state
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| DEFAULT_JOB_ERROR.to_string());
            anyhow::bail!("analysis {} failed: {}", args.job_id, message);
        }
        phase => {
            cw_info!("Stopped watching {} in phase {:?}", args.job_id, phase);
            return Ok(());
        }
    }

    let Some(steps) = steps else {
        return Ok(());
    };
    let Some(index) = state.cue_index() else {
        cw_warn!("Analysis {} has no detail to replay", args.job_id);
        return Ok(());
    };
    if index.is_empty() {
        println!("no tips to replay");
        return Ok(());
    }

    for cue in script::replay(index, config.voice_over, &steps) {
        println!(
            "{:>8.2}s  tip {}  {}  [{}]",
            cue.at, cue.cue, cue.text, cue.audio_url
        );
    }
    Ok(())
}
