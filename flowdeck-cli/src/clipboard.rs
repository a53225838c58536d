//! System clipboard backend plus the terminal fallback

use std::io;

use flowdeck_core::clipboard::{copy_with_fallback, ClipboardBackend, Osc52};
use flowdeck_core::{DeckError, Result};

/// The OS clipboard via cli-clipboard
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        cli_clipboard::set_contents(text.to_string())
            .map_err(|e| DeckError::clipboard(e.to_string()))
    }
}

/// Copy `text`, falling back to an OSC 52 sequence on stdout
pub fn copy(text: &str) -> Result<&'static str> {
    let mut fallback = Osc52::new(io::stdout());
    copy_with_fallback(&mut SystemClipboard, &mut fallback, text)
}
