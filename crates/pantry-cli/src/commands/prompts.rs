use std::io::{self, BufRead, IsTerminal, Write};

use pantry_core::sync::PromptKind;
use pantry_core::SyncCoordinator;

use crate::error::CliError;

/// Ask a y/N question on the terminal. `preset` answers without asking.
///
/// Without a terminal and without a preset the answer is no.
pub fn ask_yes_no(question: &str, preset: Option<bool>) -> Result<bool, CliError> {
    if let Some(answer) = preset {
        return Ok(answer);
    }

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        eprintln!("{question} [y/N] (no terminal, answering no)");
        return Ok(false);
    }

    let mut stdout = io::stdout();
    write!(stdout, "{question} [y/N] ")?;
    stdout.flush()?;

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(parse_answer(&line))
}

pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn prompt_question(kind: PromptKind, local_count: usize) -> String {
    match kind {
        PromptKind::UploadLocalData => format!(
            "This device has {local_count} item(s). Merge them into your cloud inventory?"
        ),
        PromptKind::DeleteLocalData => format!(
            "Remove the {local_count} item(s) stored on this device? Your cloud copy is kept."
        ),
    }
}

/// Ask about the coordinator's pending prompt, if any, and act on the answer.
pub async fn resolve_pending_prompt(
    coordinator: &SyncCoordinator,
    local_count: usize,
    preset: Option<bool>,
) -> Result<(), CliError> {
    let Some(kind) = coordinator.pending_prompt() else {
        return Ok(());
    };

    if ask_yes_no(&prompt_question(kind, local_count), preset)? {
        coordinator.confirm_pending_prompt().await.into_result()?;
        match kind {
            PromptKind::UploadLocalData => println!("Local items merged with the cloud"),
            PromptKind::DeleteLocalData => println!("Local items removed"),
        }
    } else {
        coordinator.cancel_pending_prompt();
        match kind {
            PromptKind::UploadLocalData => {
                println!("Local items kept on this device only; run `pantry sync` to upload later");
            }
            PromptKind::DeleteLocalData => println!("Local items kept"),
        }
    }
    Ok(())
}
