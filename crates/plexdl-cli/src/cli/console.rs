//! Interactive console: preview gate, yes/no prompts and the end-of-run summary.

use plexdl_core::coordinator::{Confirm, DownloadOutcome, Progress, RunSummary, SetupStep};
use plexdl_core::naming::NamedItem;
use std::io::{self, BufRead, Write};

/// Prints the numbered preview and waits for Enter. `n`/`no` or a closed stdin declines.
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, items: &[NamedItem]) -> bool {
        println!();
        println!("Files to be downloaded:");
        print!("{}", preview_lines(items));
        println!();
        print!("Press Enter to continue with downloading (or type 'no' to cancel)...");
        gate_accepts(read_answer().as_deref())
    }
}

/// Prints `label...` when a setup step starts and ` done`/` failed` when it ends.
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn started(&self, step: SetupStep<'_>) {
        print!("{}...", step_label(step));
        let _ = io::stdout().flush();
    }

    fn finished(&self, _step: SetupStep<'_>, ok: bool) {
        println!("{}", outcome_suffix(ok));
    }
}

fn step_label(step: SetupStep<'_>) -> String {
    match step {
        SetupStep::SwitchAccount(user) => format!("Switching to managed account {}", user),
        SetupStep::LoadCollection(name) => format!("Fetching playlist {}", name),
    }
}

pub fn outcome_suffix(ok: bool) -> &'static str {
    if ok {
        " done"
    } else {
        " failed"
    }
}

/// Asks `question` and returns true only for `y`/`yes`.
pub fn ask_yes_no(question: &str) -> bool {
    print!("{} (yes/no): ", question);
    is_yes(read_answer().as_deref())
}

pub fn print_summary(summary: &RunSummary) {
    let failures = summary.failures();
    if !failures.is_empty() {
        println!();
        println!("Failed downloads:");
        for outcome in failures {
            if let DownloadOutcome::Failure { title, reason } = outcome {
                println!("  {}: {}", title, reason);
            }
        }
    }
    println!();
    println!(
        "{}: {} of {} downloaded to {} ({} failed)",
        summary.collection,
        summary.succeeded,
        summary.total(),
        summary.directory.display(),
        summary.failed
    );
}

fn preview_lines(items: &[NamedItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}\n", i + 1, item))
        .collect()
}

/// `None` means stdin is closed.
fn read_answer() -> Option<String> {
    let _ = io::stdout().flush();
    read_line_from(&mut io::stdin().lock())
}

fn read_line_from<R: BufRead>(input: &mut R) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn gate_accepts(answer: Option<&str>) -> bool {
    match answer {
        None => false,
        Some(a) => !matches!(a.to_ascii_lowercase().as_str(), "n" | "no"),
    }
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(str::to_ascii_lowercase).as_deref(),
        Some("y") | Some("yes")
    )
}
