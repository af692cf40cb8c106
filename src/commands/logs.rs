use anyhow::Context;
use console::style;
use xray_manager::app;
use xray_manager::supervisor::LogDirectory;

use crate::args::LogCommands;

pub(crate) fn cmd_logs(command: LogCommands) -> anyhow::Result<()> {
    let layout = app::layout_from_env().context("Failed to prepare the support directory")?;
    run_logs(&LogDirectory::new(layout.logs_dir()), command)
}

fn run_logs(logs: &LogDirectory, command: LogCommands) -> anyhow::Result<()> {
    match command {
        LogCommands::List => {
            let names = logs.list().context("Failed to list run logs")?;
            if names.is_empty() {
                println!("No run logs yet.");
            }
            for name in names {
                println!("{}", name);
            }
        }
        LogCommands::Show { name, lines } => {
            let latest = logs.latest().context("Failed to list run logs")?;
            let Some(name) = name.or(latest) else {
                println!("No run logs yet.");
                return Ok(());
            };
            tracing::trace!(log = %name, lines = lines, "Showing log tail");
            println!("{}", style(logs.path(&name).display()).dim());
            let tail = logs
                .tail(&name, lines)
                .with_context(|| format!("Failed to read log {}", name))?;
            for line in tail {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn show_errors_name_the_log() {
        let dir = TempDir::new().unwrap();
        let logs = LogDirectory::new(dir.path());

        let err = run_logs(
            &logs,
            LogCommands::Show {
                name: Some("../settings.toml".to_string()),
                lines: 10,
            },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Failed to read log ../settings.toml");
        assert!(err.chain().count() > 1);
    }

    #[test]
    fn show_without_logs_is_ok() {
        let dir = TempDir::new().unwrap();
        let logs = LogDirectory::new(dir.path());

        run_logs(&logs, LogCommands::Show { name: None, lines: 10 }).unwrap();
        run_logs(&logs, LogCommands::List).unwrap();
    }
}
