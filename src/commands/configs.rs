use anyhow::Context;
use console::style;
use xray_manager::app;
use xray_manager::supervisor::{ConfigCatalog, SupervisorOptions};
use xray_manager::user_config::UserConfig;

use crate::args::ConfigCommands;

pub(crate) fn cmd_configs(command: ConfigCommands) -> anyhow::Result<()> {
    let layout = app::layout_from_env().context("Failed to prepare the support directory")?;
    let catalog = ConfigCatalog::new(layout.configs_dir());
    let settings_path = layout.settings_file();

    match command {
        ConfigCommands::List => {
            let selected = UserConfig::load(&settings_path)
                .context("Failed to read settings")?
                .selected_config
                .unwrap_or_else(|| SupervisorOptions::default().default_config);
            let names = catalog.list().context("Failed to list configs")?;
            if names.is_empty() {
                println!(
                    "No configs in {}. Create one with `xray-manager configs example`.",
                    style(catalog.dir().display()).dim()
                );
            }
            for name in names {
                if name == selected {
                    println!("{} {}", style("*").green(), style(&name).cyan());
                } else {
                    println!("  {}", name);
                }
            }
        }
        ConfigCommands::Select { name } => {
            if !catalog.contains(&name) {
                anyhow::bail!("Config not found: {}", name);
            }
            UserConfig {
                selected_config: Some(name.clone()),
            }
            .save(&settings_path)
            .context("Failed to save the selection")?;
            println!("{} Selected {}", style("✓").green(), style(&name).cyan());
        }
        ConfigCommands::Example => {
            let name = catalog
                .generate_example()
                .context("Failed to write an example config")?;
            println!(
                "{} Wrote {}",
                style("✓").green(),
                style(catalog.path(&name).display()).cyan()
            );
        }
    }

    Ok(())
}
