//! CLI logic for the Qollage circuit diagram tool.
//!
//! This module contains the core CLI logic: it loads configuration, reads a
//! circuit file, and runs the Qollage pipeline on it.

pub mod error_adapter;
pub mod input;

mod args;
mod config;
mod error;
mod viewer;

pub use args::{Args, DialectArg};
pub use error::CliError;
pub use viewer::TerminalViewer;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::info;

use qollage::{DiagramBuilder, DrawOptions, config::AppConfig, output::DEFAULT_FILE_STEM};

/// Run the Qollage CLI application
///
/// This function processes the input circuit through the Qollage pipeline
/// and writes the resulting image (or markup) to the output file.
///
/// # Errors
///
/// Returns `CliError` for:
/// - Configuration loading errors
/// - Unreadable or malformed circuit files
/// - Classification, layout and rendering errors
/// - Output write errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(input_path = args.input; "Processing circuit");

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(dialect) = args.dialect {
        app_config.render_mut().set_dialect(dialect.into());
    }

    let circuit = input::load_circuit(Path::new(&args.input))?;

    let render_as_image = !args.markup_only;
    let output = output_path(args, &app_config, render_as_image);
    let options = DrawOptions::new()
        .with_render_as_image(render_as_image)
        .with_output_path(&output)
        .with_display_inline(args.display);

    let mut builder = DiagramBuilder::new(app_config);
    if args.display {
        builder = builder.with_viewer(Arc::new(TerminalViewer));
    }
    let rendering = builder.draw(&circuit, &options)?;

    info!(
        output_file:? = rendering.written_to().unwrap_or(&output),
        bytes = rendering.artifact().len();
        "Diagram exported successfully"
    );

    Ok(())
}

/// The explicit output path, or `circuit.<ext>` for the artifact being produced.
fn output_path(args: &Args, config: &AppConfig, render_as_image: bool) -> PathBuf {
    if let Some(output) = &args.output {
        return PathBuf::from(output);
    }
    let extension = if render_as_image {
        config.render().format().extension()
    } else {
        config.render().dialect().extension()
    };
    PathBuf::from(format!("{DEFAULT_FILE_STEM}.{extension}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use qollage::config::Dialect;

    use super::*;

    #[test]
    fn test_default_output_follows_artifact() {
        let mut config = AppConfig::default();
        let args = Args::try_parse_from(["qollage", "bell.toml"]).unwrap();
        assert_eq!(output_path(&args, &config, true), PathBuf::from("circuit.png"));
        assert_eq!(output_path(&args, &config, false), PathBuf::from("circuit.typ"));

        config.render_mut().set_dialect(Dialect::Svg);
        assert_eq!(output_path(&args, &config, false), PathBuf::from("circuit.svg"));
    }

    #[test]
    fn test_explicit_output_wins() {
        let args = Args::try_parse_from(["qollage", "bell.toml", "-o", "bell.pdf"]).unwrap();
        assert_eq!(
            output_path(&args, &AppConfig::default(), true),
            PathBuf::from("bell.pdf")
        );
    }
}
