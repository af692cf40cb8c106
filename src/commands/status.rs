use anyhow::Context;
use console::style;
use xray_manager::app;
use xray_manager::supervisor::{LogDirectory, PidRecordFile, SupervisorOptions};
use xray_manager::user_config::UserConfig;

/// Report on-disk state without touching a daemon another instance may own.
pub(crate) fn cmd_status() -> anyhow::Result<()> {
    let layout = app::layout_from_env().context("Failed to prepare the support directory")?;
    let version = std::fs::read_to_string(layout.version_file())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let binary = layout.binary_path();
    let selected = UserConfig::load(&layout.settings_file())
        .context("Failed to read settings")?
        .selected_config
        .unwrap_or_else(|| SupervisorOptions::default().default_config);
    let daemon = PidRecordFile::new(layout.pid_file())
        .read()
        .context("Failed to read the pid record")?
        .filter(|record| record.matches_live_process());
    let latest_log = LogDirectory::new(layout.logs_dir())
        .latest()
        .context("Failed to list run logs")?;

    println!("{}", style("Xray manager").bold());
    println!("  {:<12} {}", "home", style(layout.root().display()).dim());
    match (&version, binary.exists()) {
        (Some(version), true) => println!("  {:<12} {}", "version", style(version).cyan()),
        (None, true) => println!("  {:<12} {}", "version", style("unknown").yellow()),
        (_, false) => println!("  {:<12} {}", "version", style("not installed").red()),
    }
    println!("  {:<12} {}", "binary", style(binary.display()).dim());
    println!("  {:<12} {}", "config", style(&selected).cyan());
    match daemon {
        Some(record) => println!(
            "  {:<12} {} (pid {})",
            "daemon",
            style("running").green(),
            record.pid
        ),
        None => println!("  {:<12} {}", "daemon", style("stopped").dim()),
    }
    if let Some(log) = latest_log {
        println!("  {:<12} {}", "latest log", style(log).dim());
    }

    Ok(())
}
