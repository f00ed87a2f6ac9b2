//! Command-line entry point: `nodegen generate [-p PACKAGE] [-o OUTPUT] [-d] <PATH>`.
#![allow(clippy::multiple_crate_versions)]

use facet::Facet;
use nodegen::{Generator, GeneratorOptions};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: nodegen generate|gen [-p PACKAGE] [-o OUTPUT] [-d] <PATH>";

/// Arguments of the `generate` command.
#[derive(Debug, Facet)]
struct GenerateArgs {
    /// Path to a `node-types.json` file.
    #[facet(positional)]
    path: String,

    /// Package of the generated file.
    #[facet(named, short = 'p', default)]
    package: Option<String>,

    /// Write the generated source here instead of stdout.
    #[facet(named, short = 'o', default)]
    output: Option<String>,

    /// Add explanatory comments and debug logging.
    #[facet(named, short = 'd', default)]
    debug: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    if command != "generate" && command != "gen" {
        eprintln!("unknown command '{command}'\n{USAGE}");
        return ExitCode::FAILURE;
    }

    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    let args: GenerateArgs = match facet_args::from_slice(&rest) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "nodegen=debug" } else { "nodegen=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &GenerateArgs) -> Result<(), String> {
    let json = std::fs::read_to_string(&args.path)
        .map_err(|e| format!("failed to read {}: {e}", args.path))?;

    let generator = Generator::new(GeneratorOptions {
        package_name: args.package.clone(),
        debug: args.debug,
        ..GeneratorOptions::default()
    });
    let source = generator
        .generate(&json)
        .map_err(|e| format!("{}: {e}", args.path))?;

    match &args.output {
        Some(output) => std::fs::write(output, source)
            .map_err(|e| format!("failed to write {output}: {e}"))?,
        None => print!("{source}"),
    }
    Ok(())
}
