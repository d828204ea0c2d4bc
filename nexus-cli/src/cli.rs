use clap::{Parser, Subcommand, ValueEnum};
use nexus_types::ActionKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Nexus - admission control and model cascade for the chat service",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Send one chat message through admission and the model cascade")]
    Ask {
        #[arg(help = "Message text")]
        message: String,

        #[arg(short, long, default_value = "cli", help = "Actor id used for rate limits")]
        actor: String,

        #[arg(long, help = "File whose contents are used as document context")]
        context_file: Option<PathBuf>,

        #[arg(long = "document", help = "Title of an attached document (repeatable)")]
        documents: Vec<String>,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Run admission checks for an actor without generating")]
    Admit {
        #[arg(help = "Actor id")]
        actor: String,

        #[arg(short, long, value_enum, default_value_t = KindArg::Generate)]
        kind: KindArg,

        #[arg(short = 'n', long, default_value_t = 1, help = "Number of requests to simulate")]
        count: u32,
    },

    #[command(about = "Show service availability and in-flight requests")]
    Status {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List the model cascade in priority order")]
    Models,

    #[command(about = "Show the effective configuration")]
    Config,

    #[command(about = "Clear the all-models-exhausted flag")]
    ResetExhaustion,

    #[command(about = "Print Prometheus metrics after a status probe")]
    Metrics,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Generate,
    Upload,
    SessionMutation,
    ReadOnly,
}

impl From<KindArg> for ActionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Generate => ActionKind::Generate,
            KindArg::Upload => ActionKind::Upload,
            KindArg::SessionMutation => ActionKind::SessionMutation,
            KindArg::ReadOnly => ActionKind::ReadOnly,
        }
    }
}
