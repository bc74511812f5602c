//! Per-column decision log.
//!
//! Each processed column produces one line:
//!
//! ```text
//! <1-based position> <keep|trim> <category label> <gappyness>
//! ```
//!
//! The sink is injected into the trimming run rather than going through the
//! global `log` facade, so the engine holds no process-wide state.

use std::io::{self, Write};

use super::site::SiteCategory;

/// Outcome of the decision for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Trim,
}

impl Decision {
    pub fn from_keep(keep: bool) -> Self {
        if keep {
            Decision::Keep
        } else {
            Decision::Trim
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            Decision::Keep => "keep",
            Decision::Trim => "trim",
        }
    }
}

/// Receiver of decision log lines.
pub trait DecisionLog {
    /// Records the decision taken for the column at `position` (0-based).
    fn record(
        &mut self,
        position: usize,
        decision: Decision,
        category: SiteCategory,
        gappyness: f64,
    ) -> io::Result<()>;
}

/// Formats a decision log line (without trailing newline).
pub fn format_line(position: usize, decision: Decision, category: SiteCategory, gappyness: f64) -> String {
    format!("{} {} {} {:?}", position + 1, decision.word(), category.label(), gappyness)
}

/// Writes decision lines to any [`Write`] implementation.
pub struct WriterLog<W: Write> {
    writer: W,
}

impl<W: Write> WriterLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> DecisionLog for WriterLog<W> {
    fn record(
        &mut self,
        position: usize,
        decision: Decision,
        category: SiteCategory,
        gappyness: f64,
    ) -> io::Result<()> {
        writeln!(self.writer, "{}", format_line(position, decision, category, gappyness))
    }
}

/// In-memory sink, mostly useful for tests.
impl DecisionLog for Vec<String> {
    fn record(
        &mut self,
        position: usize,
        decision: Decision,
        category: SiteCategory,
        gappyness: f64,
    ) -> io::Result<()> {
        self.push(format_line(position, decision, category, gappyness));
        Ok(())
    }
}

/// Best-effort front for an optional [`DecisionLog`].
///
/// The first failed write is reported as a warning and disables the sink for
/// the rest of the run. Trimming is never interrupted by the log.
pub struct Recorder<'a> {
    sink: Option<&'a mut dyn DecisionLog>,
    warning: Option<String>,
}

impl<'a> Recorder<'a> {
    pub fn new(sink: Option<&'a mut dyn DecisionLog>) -> Self {
        Self { sink, warning: None }
    }

    /// A recorder that drops every line.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn record(&mut self, position: usize, decision: Decision, category: SiteCategory, gappyness: f64) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(err) = sink.record(position, decision, category, gappyness) {
            let message = format!(
                "Decision log disabled after failing to write column {}: {}",
                position + 1,
                err
            );
            log::warn!("{}", message);
            self.warning = Some(message);
            self.sink = None;
        }
    }

    /// Warning raised by a failed write, if any.
    pub fn into_warning(self) -> Option<String> {
        self.warning
    }
}
