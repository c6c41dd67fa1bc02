//! Library target for the `flvdump` package.
//!
//! The primary deliverable of this package is the `flvdump` CLI binary
//! (`src/main.rs`); the dump pipeline lives here so it can be tested.

pub mod cli;
pub mod error;
pub mod output;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flv::DecoderConfig;
use tracing::{debug, info};

use crate::cli::OutputFormat;
use crate::error::{AppError, Result};
use crate::output::Emitter;

/// Resolve and validate the input and output paths.
///
/// Returns the absolute output path, or `None` when dumping to stdout.
pub fn check_paths(input: &Path, output: &Path, to_stdout: bool) -> Result<Option<PathBuf>> {
    let input = std::path::absolute(input)?;
    if !input.is_file() {
        return Err(AppError::MissingInput(input));
    }

    if to_stdout {
        return Ok(None);
    }

    let output = std::path::absolute(output)?;
    if let Some(dir) = output.parent() {
        if !dir.exists() {
            return Err(AppError::MissingOutputDir(dir.to_path_buf()));
        }
    }

    Ok(Some(output))
}

/// Decode `input` and feed every block to `emitter`.
///
/// Blocks decoded before a fatal error are still emitted and flushed.
pub fn dump(input: &Path, config: DecoderConfig, emitter: &mut dyn Emitter) -> Result<()> {
    let result = dump_blocks(input, config, emitter);
    let flushed = emitter.finish();
    result.and(flushed)
}

fn dump_blocks(input: &Path, config: DecoderConfig, emitter: &mut dyn Emitter) -> Result<()> {
    let (header, mut decoder) = flv::decode_file(input, config)?;
    emitter.header(&header.to_records())?;

    for tag in decoder.by_ref() {
        emitter.tag(&tag?.to_records())?;
    }

    let stats = decoder.stats();
    info!(
        tags = stats.tags,
        audio = stats.audio_tags,
        video = stats.video_tags,
        script = stats.script_tags,
        mismatches = stats.size_mismatches,
        "decoded {}",
        input.display()
    );
    Ok(())
}

/// Dump `input` to `output` (a file path, or stdout when `None`).
pub fn run(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    config: DecoderConfig,
) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            debug!(path = %path.display(), "creating output file");
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut emitter = output::emitter(format, writer);
    dump(input, config, emitter.as_mut())
}
