use anyhow::Result;

use crate::cleanup::{
    Cleanup, CleanupContext, CleanupOptions, CleanupReport, UserDataPolicy, MANUAL_INSTRUCTIONS,
};
use crate::cli::CleanupCli;
use crate::npm::Npm;
use crate::tool::ManagedToolReference;
use crate::ui;

/// Run the cleanup and return the process exit code
pub fn execute(cli: &CleanupCli) -> i32 {
    ui::status("Cleanup", "Removing Claude Code Updater");
    report(run(cli))
}

fn run(cli: &CleanupCli) -> Result<CleanupReport> {
    let context = CleanupContext::detect()?;
    tracing::debug!(home = ?context.home, platform = context.platform.as_str(), "cleanup context");

    let npm = Npm::new();
    let tool = ManagedToolReference::claude_code();
    let options = CleanupOptions {
        user_data: UserDataPolicy::from_flags(cli.clean, cli.force),
        verbose: cli.verbose,
    };

    let cleanup = Cleanup::new(&context, &npm, &tool)?;
    Ok(cleanup.run(&options, |path| {
        ui::confirm(format!("Remove user data at {}?", path.display()))
    }))
}

fn report(result: Result<CleanupReport>) -> i32 {
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            ui::error(format!("Cleanup failed: {err:#}"));
            print_manual_instructions();
            return 1;
        }
    };

    ui::status("Verifying", "cleanup");
    for check in &report.verification.results {
        let line = format!("{}: {}", check.target_name, check.message);
        if check.clean {
            ui::success("Clean", line);
        } else {
            ui::failure("Remaining", line);
        }
    }

    if report.all_clean() {
        ui::success("Finished", "Claude Code Updater has been completely removed");
        ui::info("Restart your terminal for the changes to take effect");
        0
    } else {
        ui::warn("Some items could not be removed automatically");
        print_manual_instructions();
        1
    }
}

fn print_manual_instructions() {
    ui::status("Manual", "cleanup instructions");
    ui::detail(MANUAL_INSTRUCTIONS);
}
