//! Command-line argument definitions for the Qollage CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the markup dialect, and logging verbosity.

use clap::{Parser, ValueEnum};

use qollage::config::Dialect;

/// Command-line arguments for the Qollage circuit diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input circuit file (TOML)
    #[arg(help = "Path to the input circuit file")]
    pub input: String,

    /// Path to the output file or directory. Defaults to `circuit.<ext>` for
    /// the produced artifact; a directory or a name without an extension is
    /// completed the same way.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Stop after producing markup instead of rasterizing it
    #[arg(long)]
    pub markup_only: bool,

    /// Markup dialect, overriding the configuration file
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Print the rendering to standard output when it is textual
    #[arg(long)]
    pub display: bool,
}

/// Markup dialects selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Typst,
    Svg,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Typst => Dialect::Typst,
            DialectArg::Svg => Dialect::Svg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "qollage",
            "bell.toml",
            "-o",
            "bell.svg",
            "--markup-only",
            "--dialect",
            "svg",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.input, "bell.toml");
        assert_eq!(args.output.as_deref(), Some("bell.svg"));
        assert!(args.markup_only);
        assert_eq!(args.dialect, Some(DialectArg::Svg));
        assert_eq!(args.log_level, "debug");
        assert!(!args.display);
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["qollage", "bell.toml"]).unwrap();
        assert_eq!(args.output, None);
        assert_eq!(args.config, None);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.dialect, None);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(Args::try_parse_from(["qollage", "bell.toml", "--dialect", "latex"]).is_err());
    }
}
