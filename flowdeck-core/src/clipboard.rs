//! Clipboard copy with a terminal fallback and transient feedback

use std::io::Write;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::error::{DeckError, Result};

/// How long "Copied!" stays visible
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Somewhere text can be copied to
pub trait ClipboardBackend {
    fn name(&self) -> &'static str;
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// OSC 52 "set selection" sequence written to the terminal.
///
/// Works over SSH and in terminals without a system clipboard API; the
/// terminal decides whether to honour it.
pub struct Osc52<W: Write> {
    out: W,
}

impl<W: Write> Osc52<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
    }
}

impl<W: Write> ClipboardBackend for Osc52<W> {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(Self::sequence(text).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| DeckError::clipboard(format!("terminal write failed: {}", e)))
    }
}

/// Try `primary`, then `fallback`; returns the name of the backend that worked
pub fn copy_with_fallback(
    primary: &mut dyn ClipboardBackend,
    fallback: &mut dyn ClipboardBackend,
    text: &str,
) -> Result<&'static str> {
    match primary.set_text(text) {
        Ok(()) => {
            debug!(backend = primary.name(), bytes = text.len(), "copied");
            Ok(primary.name())
        }
        Err(primary_err) => {
            warn!(backend = primary.name(), error = %primary_err, "clipboard failed, falling back");
            fallback.set_text(text).map_err(|fallback_err| {
                DeckError::clipboard(format!(
                    "{} failed ({}); {} failed ({})",
                    primary.name(),
                    primary_err,
                    fallback.name(),
                    fallback_err
                ))
            })?;
            debug!(backend = fallback.name(), bytes = text.len(), "copied");
            Ok(fallback.name())
        }
    }
}

/// Copy-button state: shows success for [`COPY_FEEDBACK`] after a copy
#[derive(Debug, Clone, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn mark(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_FEEDBACK)
            .unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.copied_at = None;
    }
}
