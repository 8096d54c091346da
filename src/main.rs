use claude_code_updater::cli::LaunchArgs;
use claude_code_updater::{commands, ui};

fn main() {
    // Diagnostics stay off stdout; the delegated tool owns it
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("claude_code_updater=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    ui::route_to_stderr();

    let args = LaunchArgs::from_args(std::env::args_os().skip(1));

    let exit_code = match commands::launch::execute(args) {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            ui::error(format!("{err:#}"));
            1
        }
    };

    std::process::exit(exit_code);
}
