//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so the provisioning workflow can emit progress events and relay
//! remote output without depending on any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
/// - `output()` prints `"      {line}"` dimmed
///
/// Everything is suppressed when `ctx.quiet`. In JSON mode the reporter
/// writes to stderr so stdout carries only the JSON document.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    to_stderr: bool,
}

impl<'a> TerminalReporter<'a> {
    /// Create a reporter that prints to stdout.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            to_stderr: false,
        }
    }

    /// Create a reporter that prints to stderr.
    #[must_use]
    pub fn stderr(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            to_stderr: true,
        }
    }

    fn emit(&self, line: &str) {
        if self.ctx.quiet {
            return;
        }
        if self.to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.emit(&format!("  {} {message}", "→".style(self.ctx.styles.step)));
    }

    fn success(&self, message: &str) {
        self.emit(&format!("  {} {message}", "✓".style(self.ctx.styles.success)));
    }

    fn warn(&self, message: &str) {
        self.emit(&format!("  {} {message}", "!".style(self.ctx.styles.warning)));
    }

    fn output(&self, line: &str) {
        self.emit(&format!("      {}", line.style(self.ctx.styles.dim)));
    }
}
