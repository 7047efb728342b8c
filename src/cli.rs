use clap::Parser;
use std::path::PathBuf;

/// Pin requirements to a preferred package index and lock them with hashes
#[derive(Parser, Debug)]
#[command(name = "reqpin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input requirements file
    pub input_file: PathBuf,

    /// Write the locked requirements to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Preferred package index URL
    #[arg(short, long)]
    pub preferred_index: Option<String>,

    /// Fallback package index URL [default: https://pypi.org/simple]
    #[arg(short, long)]
    pub default_index: Option<String>,

    /// Lock compiler executable [default: pip-compile]
    #[arg(long)]
    pub compiler: Option<String>,

    /// HTTP timeout in seconds for index checks
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the index-annotated requirements without running the compiler
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Install the tracing subscriber on stderr
    pub fn init_logging(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}
