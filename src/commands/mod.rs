pub(crate) mod completions;
pub(crate) mod configs;
pub(crate) mod logs;
pub(crate) mod run;
pub(crate) mod status;
pub(crate) mod update;

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use xray_manager::{InstallEvent, ManagerError};

fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render install events on a spinner until the final `Finished` event.
pub(crate) fn spawn_install_reporter(
    mut events: mpsc::UnboundedReceiver<InstallEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = create_progress_bar("Checking for Xray updates...");
        while let Some(event) = events.recv().await {
            match event {
                InstallEvent::Progress(message) => pb.set_message(message),
                InstallEvent::Finished { success: true, message } => {
                    pb.finish_and_clear();
                    println!("{} {}", style("✓").green(), message);
                }
                InstallEvent::Finished { success: false, message } => {
                    pb.finish_and_clear();
                    println!("{} {}", style("✗").red(), message);
                }
            }
        }
        if !pb.is_finished() {
            pb.finish_and_clear();
        }
    })
}

/// Alert on failures the user has to act on; anything else only goes to the log.
///
/// Returns whether the user was alerted.
pub(crate) fn report_failure(context: &str, e: &ManagerError) -> bool {
    if e.is_user_facing() {
        eprintln!("{} {}: {}", style("✗").red(), context, e);
        true
    } else {
        tracing::warn!(error = %e, "{}", context);
        false
    }
}
