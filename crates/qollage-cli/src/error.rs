//! Errors surfaced by the CLI.

use thiserror::Error;

use qollage::QollageError;

use crate::{config::ConfigError, input::InputError};

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Render(#[from] QollageError),
}
