use clap::Parser;
use reqpin::cli::Cli;
use reqpin::config::Config;
use reqpin::index::HttpProber;
use reqpin::lock::PipCompile;
use reqpin::pipeline::{self, Options};
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let options = Options::resolve(cli, &config);

    let timeout = cli.timeout.map(Duration::from_secs).or(config.timeout());
    let prober = HttpProber::new(timeout);
    let program = cli
        .compiler
        .clone()
        .unwrap_or_else(|| config.compiler.program.clone());
    let compiler = PipCompile::new(program, config.compiler.args.clone());

    match pipeline::run(&options, &prober, &compiler) {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            for line_error in e.line_errors() {
                eprintln!("Error: {}", line_error);
            }
            Err(e.into())
        }
    }
}
