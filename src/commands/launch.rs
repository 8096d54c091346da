use anyhow::Result;

use crate::cli::LaunchArgs;
use crate::config::Config;
use crate::delegate::{DelegateResolver, ProcessDelegate};
use crate::launcher::{LaunchOptions, LaunchOutcome, Launcher};
use crate::npm::Npm;
use crate::tool::ManagedToolReference;
use crate::ui;
use crate::updater::NpmUpdater;
use crate::util::paths;

pub fn execute(args: LaunchArgs) -> Result<LaunchOutcome> {
    let config = load_config().with_env_overrides();
    let tool = ManagedToolReference::claude_code();
    let npm = Npm::new();

    let updater = NpmUpdater::new(
        tool.clone(),
        npm.clone(),
        config.registry.clone(),
        config.check_timeout(),
    );
    let resolver = DelegateResolver::new(&npm);
    let delegate = ProcessDelegate::new(tool.clone());

    let options = LaunchOptions {
        check_for_updates: config.auto_update && !args.skip_update,
        args: args.forwarded,
    };

    let outcome = Launcher::new(&tool, &updater, &resolver, &delegate).run(&options)?;
    tracing::debug!(exit_code = outcome.exit_code, "delegated process finished");
    Ok(outcome)
}

/// A broken settings file must never keep Claude Code from starting
fn load_config() -> Config {
    let home = match paths::home_dir() {
        Ok(home) => home,
        Err(err) => {
            tracing::debug!(error = %err, "no home directory, using default settings");
            return Config::default();
        }
    };

    match Config::load(&paths::config_file(&home)) {
        Ok(config) => config,
        Err(err) => {
            ui::warn(format!("{err:#}, using default settings"));
            Config::default()
        }
    }
}
