use clap::CommandFactory;
use xray_manager::completions::{self, CompletionShell};

use crate::args::Cli;

pub(crate) fn cmd_completions(shell: Option<CompletionShell>) -> anyhow::Result<()> {
    let shell = shell
        .or_else(completions::detect_shell)
        .ok_or_else(|| anyhow::anyhow!("Could not detect shell; pass one explicitly"))?;

    let name = Cli::command().get_name().to_string();
    completions::generate_completions::<Cli>(shell, &name, &mut std::io::stdout());
    Ok(())
}
