//! Colored terminal rendering of sync instructions and reports.

use std::time::Duration;

use calsync_core::remote::ApplyReport;
use calsync_core::sync::{DiffKind, SyncInstructions};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        colorize(*self, &self.to_string())
    }
}

fn colorize(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Insert => text.green().to_string(),
        DiffKind::Update => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
        DiffKind::Rejected => text.magenta().to_string(),
    }
}

impl Render for ApplyReport {
    fn render(&self) -> String {
        if self.failed > 0 {
            self.to_string().red().to_string()
        } else {
            self.to_string()
        }
    }
}

pub fn heading(target_name: &str) -> String {
    format!("📅 {}", target_name.bold())
}

/// Spins on stderr while the sources and the target are fetched. Hidden
/// when stderr is not a terminal.
pub fn fetch_spinner(target_name: &str, sources: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", ""])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(format!(
        "{} {}",
        heading(target_name),
        format!("(reading {} {})", sources, pluralize("calendar", sources)).dimmed()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Above this many changes the compact view shows counts per kind.
const COMPACT_THRESHOLD: usize = 5;

/// One line per instruction, or counts per kind when `compact` and there
/// are many. Deletes only carry a target id.
pub fn render_instructions(instructions: &SyncInstructions, compact: bool) -> String {
    if instructions.is_empty() && instructions.rejected.is_empty() {
        return "   No changes".dimmed().to_string();
    }

    let (insert, update, delete) = instructions.counts();
    let total = insert + update + delete + instructions.rejected.len();

    let mut lines = Vec::new();
    if compact && total > COMPACT_THRESHOLD {
        for (kind, noun) in [
            (DiffKind::Insert, "new"),
            (DiffKind::Update, "changed"),
            (DiffKind::Delete, "removed"),
            (DiffKind::Rejected, "rejected"),
        ] {
            let count = instructions.count(kind);
            if count > 0 {
                let label = format!("({} {} {})", count, noun, pluralize("event", count));
                lines.push(format!("   {} {}", kind.render(), colorize(kind, &label)));
            }
        }
        return lines.join("\n");
    }

    for data in &instructions.insert {
        lines.push(format!("   {} {}", DiffKind::Insert.render(), data));
    }
    for update in &instructions.update {
        lines.push(format!(
            "   {} {} {}",
            DiffKind::Update.render(),
            update.event_data,
            format!("[{}]", update.target_id).dimmed()
        ));
    }
    for id in &instructions.delete {
        lines.push(format!("   {} {}", DiffKind::Delete.render(), id.dimmed()));
    }
    for rejected in &instructions.rejected {
        lines.push(format!("   {} {}", DiffKind::Rejected.render(), rejected));
    }
    lines.join("\n")
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
