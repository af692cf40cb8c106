//! Shell completion generation.

use std::io::Write;

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell};

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Write completions for `C` to `out`.
pub fn generate_completions<C: CommandFactory>(
    shell: CompletionShell,
    bin_name: &str,
    out: &mut dyn Write,
) {
    let mut cmd = C::command();
    let shell_type: Shell = shell.into();
    generate(shell_type, &mut cmd, bin_name, out);
}

/// Detect the current shell from environment.
pub fn detect_shell() -> Option<CompletionShell> {
    std::env::var("SHELL").ok().and_then(|s| shell_from_path(&s))
}

fn shell_from_path(s: &str) -> Option<CompletionShell> {
    if s.contains("zsh") {
        Some(CompletionShell::Zsh)
    } else if s.contains("bash") {
        Some(CompletionShell::Bash)
    } else if s.contains("fish") {
        Some(CompletionShell::Fish)
    } else if s.contains("pwsh") || s.contains("powershell") {
        Some(CompletionShell::PowerShell)
    } else if s.contains("elvish") {
        Some(CompletionShell::Elvish)
    } else {
        None
    }
}
