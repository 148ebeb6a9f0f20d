use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use infodesk_core::{ChatView, Indicator};
use std::io::{self, Write};
use std::time::Duration;

use crate::output::{answer_header, render_markdown};

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Terminal rendering of a streamed answer with spinners for the indicators.
///
/// The answer is written one complete line at a time so each line can go through the
/// markdown renderer; the unterminated tail is written by [`TerminalView::finish_answer`].
pub struct TerminalView<W: Write> {
    out: W,
    progress: MultiProgress,
    spinners: Vec<(Indicator, ProgressBar)>,
    printed: usize,
    streaming: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            progress: MultiProgress::new(),
            spinners: Vec::new(),
            printed: 0,
            streaming: false,
        }
    }

    fn hide_spinners(&mut self) {
        for (_, bar) in &self.spinners {
            bar.finish_and_clear();
        }
    }

    fn write_line(&mut self, line: &str) {
        let rendered = if line.trim().is_empty() {
            String::new()
        } else {
            render_markdown(line).trim_matches('\n').to_string()
        };
        let _ = writeln!(self.out, "{}", rendered);
    }

    /// Ends the current answer; must be called once the orchestrator returns
    pub fn finish_answer(&mut self, answer: Option<&str>) {
        if let Some(tail) = answer.and_then(|a| a.get(self.printed..)) {
            if !tail.is_empty() {
                self.start_answer();
                self.write_line(tail);
            }
        }
        let _ = self.out.flush();
        self.printed = 0;
        self.streaming = false;
    }

    fn start_answer(&mut self) {
        if !self.streaming {
            // Spinners would redraw over the answer text
            self.hide_spinners();
            let _ = writeln!(self.out, "{}", answer_header());
            self.streaming = true;
        }
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn show_indicator(&mut self, indicator: Indicator) {
        let message = match indicator {
            Indicator::Thinking => "MIGEPROF AI is thinking...",
            Indicator::ProcessingDocuments => "Processing documents...",
        };
        let bar = self.progress.add(spinner(message));
        self.spinners.push((indicator, bar));
    }

    fn clear_indicator(&mut self, indicator: Indicator) {
        if let Some(pos) = self.spinners.iter().position(|(i, _)| *i == indicator) {
            let (_, bar) = self.spinners.remove(pos);
            bar.finish_and_clear();
            self.progress.remove(&bar);
        }
    }

    fn render_partial(&mut self, answer: &str) {
        self.start_answer();
        // Answers only ever grow, so only the unseen complete lines need writing
        let Some(unseen) = answer.get(self.printed..) else {
            return;
        };
        let Some(last_newline) = unseen.rfind('\n') else {
            return;
        };
        for line in unseen[..last_newline].split('\n') {
            self.write_line(line);
        }
        self.printed += last_newline + 1;
        let _ = self.out.flush();
    }
}
