//! Inline display for terminal sessions.

use std::io::{self, Write};

use log::info;

use qollage::{InlineViewer, QollageError, Rendering, config::ImageFormat};

/// Prints textual renderings (markup or SVG images) to standard output.
///
/// Binary images are not printed; the viewer only logs where they went.
#[derive(Debug, Default)]
pub struct TerminalViewer;

impl InlineViewer for TerminalViewer {
    fn display(&self, rendering: &Rendering) -> Result<(), QollageError> {
        if let Some(image) = rendering.image() {
            if image.format() != ImageFormat::Svg {
                info!(
                    format:% = image.format(),
                    path:? = rendering.written_to();
                    "Binary image cannot be shown in the terminal"
                );
                return Ok(());
            }
        }

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(rendering.artifact())
            .and_then(|()| stdout.flush())
            .map_err(|err| QollageError::io_failure("<stdout>", err))
    }
}
