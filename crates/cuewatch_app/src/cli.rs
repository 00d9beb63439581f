use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::logging::LogDestination;

#[derive(Parser, Debug, Clone)]
#[command(name = "cuewatch", version)]
#[command(about = "Watch a coaching analysis job and replay its voice-over cues")]
pub(crate) struct CliArgs {
    /// Analysis job id to watch
    pub job_id: String,

    /// RON config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Backend base url, overriding the config file
    #[arg(long)]
    pub base_url: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Playback script to replay against the finished job's cues ("-" for stdin)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Start with voice-over disabled
    #[arg(long)]
    pub voice_off: bool,
}
