use anyhow::Context;
use console::style;
use tokio::sync::mpsc;
use xray_manager::{ServiceState, XrayManager};

use super::{report_failure, spawn_install_reporter};

pub(crate) async fn cmd_run(config: Option<String>, skip_update: bool) -> anyhow::Result<()> {
    let manager = XrayManager::from_env()
        .await
        .context("Failed to initialise the Xray supervisor")?;
    tracing::debug!(recovery = ?manager.supervisor().recovery(), "Startup reconciliation done");

    if skip_update {
        if !manager.use_existing_installation() {
            anyhow::bail!(
                "Xray is not installed; run without --skip-update or use `xray-manager update`"
            );
        }
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = spawn_install_reporter(rx);
        let result = manager.ensure_installed(&tx).await;
        drop(tx);
        reporter.await.ok();
        match result {
            Err(e) if manager.is_ready() => {
                report_failure("Update failed, continuing with installed binary", &e);
            }
            other => {
                other.context("Failed to install Xray")?;
            }
        }
    }

    let config_name = match config {
        Some(name) => name,
        None => manager.status().await.active_config,
    };
    if !manager.supervisor().configs().contains(&config_name) {
        anyhow::bail!(
            "Config not found: {}. Add it to {} or create one with `xray-manager configs example`",
            config_name,
            manager.layout().configs_dir().display()
        );
    }

    manager
        .start(Some(config_name.as_str()))
        .await
        .context("Failed to start Xray")?;
    let status = manager.status().await;
    println!(
        "{} Xray running with {} (pid {})",
        style("▶").green(),
        style(&status.active_config).cyan(),
        status.pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
    );
    if let Some(log) = &status.current_log {
        println!("  log: {}", style(manager.layout().logs_dir().join(log).display()).dim());
    }

    let mut updates = manager.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C");
            println!("{} Stopping Xray...", style("■").yellow());
            manager.stop().await.context("Failed to stop Xray")?;
        }
        _ = updates.wait_for(|s| s.state == ServiceState::Stopped) => {
            println!("{} Xray exited on its own", style("!").yellow());
        }
    }

    Ok(())
}
