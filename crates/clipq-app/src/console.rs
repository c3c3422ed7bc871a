use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};
use std::io::{self, IsTerminal, Write};
use unicode_width::UnicodeWidthChar;

/// Live queue listing in the daemon's console.
pub struct ConsoleView {
    enabled: bool,
}

impl ConsoleView {
    /// Draws only when asked to and stdout is an interactive terminal.
    pub fn new(requested: bool) -> Self {
        ConsoleView {
            enabled: requested && io::stdout().is_terminal(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Redraw the whole view.
    pub fn draw(&self, status: &str, entries: &[String]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let lines = compose(status, entries, cols as usize, rows as usize);

        let mut stdout = io::stdout().lock();
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in lines {
            writeln!(stdout, "{}", line)?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Lay out the view for a `cols` x `rows` terminal: status, rule, entries.
pub fn compose(status: &str, entries: &[String], cols: usize, rows: usize) -> Vec<String> {
    let mut lines = vec![fit_line(status, cols), "-".repeat(cols)];
    if entries.is_empty() {
        lines.push(fit_line("(queue is empty)", cols));
        return lines;
    }

    // Keep a spare row so the cursor line does not scroll the view.
    let room = rows.saturating_sub(lines.len() + 1).max(1);
    if entries.len() <= room {
        lines.extend(entries.iter().map(|e| fit_line(e, cols)));
    } else {
        let shown = room - 1;
        lines.extend(entries[..shown].iter().map(|e| fit_line(e, cols)));
        let more = format!("... and {} more", entries.len() - shown);
        lines.push(fit_line(&more, cols));
    }
    lines
}

/// Cut `text` to at most `cols` terminal columns.
pub fn fit_line(text: &str, cols: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > cols {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}
