use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "signa-replay",
    about = "Replay a recorded prediction trace through the sign recognition engine"
)]
pub struct CliArgs {
    /// JSON-lines trace of frames and control actions
    #[arg(long)]
    pub trace: PathBuf,

    /// Recognition settings file (JSON); defaults apply when omitted
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Run frames through the frame bus and recognition listener instead of feeding the session directly
    #[arg(long)]
    pub pipeline: bool,

    /// With --pipeline, wait between frames as long as the recorded timestamps say
    #[arg(long, requires = "pipeline")]
    pub realtime: bool,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    pub debug: bool,
}
