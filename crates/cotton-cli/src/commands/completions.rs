use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
        }
    }
}

/// File name each shell looks for in its completion directory
pub const fn script_file_name(shell: CompletionShell) -> &'static str {
    match shell {
        CompletionShell::Bash => "cotton.bash",
        CompletionShell::Zsh => "_cotton",
        CompletionShell::Fish => "cotton.fish",
    }
}

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let script = render_completions(shell);

    let Some(output_path) = output_path else {
        io::stdout().lock().write_all(&script)?;
        return Ok(());
    };

    let path = script_path(shell, output_path);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &script)?;
    tracing::debug!(?shell, path = %path.display(), "Wrote completion script");
    println!("{}", path.display());
    Ok(())
}

/// Completion script for `shell`, named after the binary
pub fn render_completions(shell: CompletionShell) -> Vec<u8> {
    let mut command = Cli::command();
    let binary = command.get_name().to_string();
    let mut script = Vec::new();
    generate(Shell::from(shell), &mut command, binary, &mut script);
    script
}

/// An existing directory receives the shell's conventional file name
pub fn script_path(shell: CompletionShell, output_path: &Path) -> PathBuf {
    if output_path.is_dir() {
        output_path.join(script_file_name(shell))
    } else {
        output_path.to_path_buf()
    }
}
