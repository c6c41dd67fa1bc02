use std::process;

use anyhow::Context;
use clap::Parser;
use flvdump::{check_paths, cli::Args, run};
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = execute(&args) {
        eprintln!("ERROR: {e:#}");
        process::exit(1);
    }
}

fn execute(args: &Args) -> anyhow::Result<()> {
    let output = check_paths(&args.input, &args.output, args.writes_to_stdout())?;

    run(
        &args.input,
        output.as_deref(),
        args.format,
        args.decoder_config(),
    )
    .with_context(|| format!("Failed to dump {}", args.input.display()))?;

    match output {
        Some(path) => {
            println!("Succeed!");
            println!("Output file path is {}", path.display());
        }
        None => eprintln!("Succeed!"),
    }
    Ok(())
}

/// Logs go to stderr so they never interleave with a dump written to stdout.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
