//! New-version check command.

use tokio::runtime::Runtime;

use crate::config::UpdateConfig;
use crate::update::{UpdateChecker, Version};

/// Ask the download site for a newer release
pub fn cmd_check_updates(rt: &Runtime, config: &UpdateConfig) -> anyhow::Result<()> {
    if !config.check_updates {
        println!("Update checks are disabled in the config file.");
        return Ok(());
    }

    let checker = UpdateChecker::new(config);
    let current = Version::current();
    println!(
        "Checking {} channel for {} (current {})",
        checker.channel().as_str(),
        checker.os(),
        current
    );

    match rt.block_on(checker.check_for_updates(current))? {
        Some(version) => {
            println!("Version {} is available.", version);
            if let Some(url) = checker.installer_url(version) {
                println!("Installer: {}", url);
            }
        }
        None => println!("You are running the latest version."),
    }
    Ok(())
}
