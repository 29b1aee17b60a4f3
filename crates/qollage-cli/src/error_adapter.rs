//! Error adapter for converting CLI errors to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every error maps
//! to a stable diagnostic code such as `qollage::unsupported_operation`.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use qollage::QollageError;

use crate::{config::ConfigError, error::CliError, input::InputError};

/// Adapter giving a [`CliError`] a diagnostic code and help text.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.0 {
            // Transparent variants already display their inner message.
            CliError::Render(QollageError::IoFailure { source, .. }) => Some(source),
            CliError::Config(ConfigError::Read { source, .. }) => Some(source),
            CliError::Input(InputError::Read { source, .. }) => Some(source),
            _ => None,
        }
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(error_code(self.0)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Render(QollageError::UnsupportedOperation { .. }) => {
                "set `best_effort = true` in the [render] section to draw it as a labelled block"
            }
            CliError::Render(QollageError::InvalidRegisterReference { .. }) => {
                "declare enough qubits or registers before referencing them"
            }
            CliError::Render(QollageError::RenderTimeout { .. }) => {
                "raise `timeout_secs` in the [render] section"
            }
            CliError::Render(QollageError::RenderBackendFailure { .. }) => {
                "check that the Typst CLI is installed, or use --markup-only"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Stable diagnostic code of `err`.
pub fn error_code(err: &CliError) -> &'static str {
    match err {
        CliError::Config(_) => "qollage::config",
        CliError::Input(_) => "qollage::input",
        CliError::Render(err) => match err {
            QollageError::UnsupportedOperation { .. } => "qollage::unsupported_operation",
            QollageError::InvalidRegisterReference { .. } => "qollage::invalid_register_reference",
            QollageError::RenderTimeout { .. } => "qollage::render_timeout",
            QollageError::RenderBackendFailure { .. } => "qollage::render_backend_failure",
            QollageError::IoFailure { .. } => "qollage::io",
            QollageError::Config(_) => "qollage::config",
            QollageError::Layout(_) => "qollage::layout",
            QollageError::Export(_) => "qollage::export",
        },
    }
}
