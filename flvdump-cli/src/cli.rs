use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use flv::{DecoderConfig, PrevTagSizeMode, UnknownTagPolicy};

/// Output format of the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned label/value text
    #[default]
    Text,
    /// One pretty-printed JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Parse the information of a FLV file", long_about = None)]
pub struct Args {
    /// Input file path
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file path, `-` for stdout
    #[arg(short, long, default_value = "out.flv.txt")]
    pub output: PathBuf,

    /// Parse script tags in detail
    #[arg(short, long)]
    pub script: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Stop at the first PreviousTagSize mismatch
    #[arg(long)]
    pub strict: bool,

    /// Skip tags of unknown type instead of stopping
    #[arg(long)]
    pub skip_unknown: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn decoder_config(&self) -> DecoderConfig {
        let prev_tag_size = if self.strict {
            PrevTagSizeMode::Strict
        } else {
            PrevTagSizeMode::Warn
        };
        let unknown_tag = if self.skip_unknown {
            UnknownTagPolicy::Skip
        } else {
            UnknownTagPolicy::Abort
        };

        DecoderConfig::new()
            .with_prev_tag_size_mode(prev_tag_size)
            .with_unknown_tag_policy(unknown_tag)
            .with_script_detail(self.script)
    }

    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["flvdump", "in.flv"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out.flv.txt"));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.writes_to_stdout());

        let config = args.decoder_config();
        assert_eq!(config.prev_tag_size, PrevTagSizeMode::Warn);
        assert_eq!(config.unknown_tag, UnknownTagPolicy::Abort);
        assert!(!config.script_detail);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "flvdump",
            "in.flv",
            "-o",
            "-",
            "-s",
            "--format",
            "json",
            "--strict",
            "--skip-unknown",
        ])
        .unwrap();
        assert!(args.writes_to_stdout());
        assert_eq!(args.format, OutputFormat::Json);

        let config = args.decoder_config();
        assert_eq!(config.prev_tag_size, PrevTagSizeMode::Strict);
        assert_eq!(config.unknown_tag, UnknownTagPolicy::Skip);
        assert!(config.script_detail);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["flvdump", "in.flv", "-v", "-q"]).is_err());
    }
}
