// ABOUTME: Interactive confirmation and delete-option prompts.
// ABOUTME: Generic over reader and writer so the parsing is testable without a terminal.

use scon::engine::DeleteOption;
use scon::error::{Error, Result};
use std::io::{self, BufRead, Write};

/// Ask a yes/no question on the terminal. Anything but y/yes declines.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stderr(), question)
}

/// Ask which delete mode to use. `None` means the user cancelled.
pub fn choose_delete_option(name: &str) -> Result<Option<DeleteOption>> {
    let stdin = io::stdin();
    choose_delete_option_with(&mut stdin.lock(), &mut io::stderr(), name)
}

fn confirm_with(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn choose_delete_option_with(
    input: &mut impl BufRead,
    out: &mut impl Write,
    name: &str,
) -> Result<Option<DeleteOption>> {
    writeln!(out, "How should '{name}' be deleted?")?;
    for (idx, option) in DeleteOption::ALL.iter().enumerate() {
        writeln!(out, "  {}) {option}", idx + 1)?;
    }
    writeln!(out, "  4) cancel")?;
    write!(out, "Choice [1-4]: ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    match answer {
        "1" => Ok(Some(DeleteOption::EntryOnly)),
        "2" => Ok(Some(DeleteOption::AllSnapshots)),
        "3" => Ok(Some(DeleteOption::KeepLatestSnapshot)),
        "4" | "" => Ok(None),
        other => other.parse().map(Some).map_err(|_| {
            Error::InvalidOption(format!("'{other}' is not a choice between 1 and 4"))
        }),
    }
}
