use clap::Parser;
use claude_code_updater::cli::CleanupCli;
use claude_code_updater::commands;

fn main() {
    let cli = CleanupCli::parse();

    let default_filter = if cli.verbose {
        "claude_code_updater=debug"
    } else {
        "claude_code_updater=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(commands::cleanup::execute(&cli));
}
