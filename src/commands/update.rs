use anyhow::Context;
use tokio::sync::mpsc;
use xray_manager::app;
use xray_manager::Installer;

use super::spawn_install_reporter;

pub(crate) async fn cmd_update() -> anyhow::Result<()> {
    let layout = app::layout_from_env().context("Failed to prepare the support directory")?;
    let source = app::release_source_from_env().context("Failed to set up the release index")?;
    let installer = Installer::new(layout, source);

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = spawn_install_reporter(rx);
    let result = installer.check_and_install(&tx).await;
    drop(tx);
    reporter.await.ok();

    let outcome = result.context("Update failed")?;
    tracing::debug!(outcome = ?outcome, "Update check finished");
    Ok(())
}
