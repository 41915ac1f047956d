//! qref command-line tools.
//!
//! Provides the `qref` binary with subcommands for working with qref
//! programs stored as JSON or YAML:
//!
//! - `verify` checks a program's topology.
//! - `schema` prints the JSON schema of the document format.
//! - `fmt` re-emits a program in canonical form.
//! - `render` draws a program as a Graphviz DOT graph.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use qref_check::{verify_topology_with, VerifyOptions};
use qref_core::{
    generate_program_schema, load_program_like, to_dot, CoreError, Format, Program, ProgramLike,
};

/// qref program verification and tools.
#[derive(Parser)]
#[command(name = "qref", about = "qref program verification and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Verify the topology of a program.
    Verify {
        /// Path to a JSON or YAML program file.
        file: PathBuf,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Verify sibling subtrees in parallel.
        #[arg(long)]
        parallel: bool,
    },

    /// Print the JSON schema of the program format.
    Schema {
        /// Schema version.
        #[arg(short, long, default_value = "v1")]
        version: String,
    },

    /// Re-emit a program in canonical form.
    Fmt {
        /// Path to a JSON or YAML program file.
        file: PathBuf,

        /// Output format: json or yaml (default: same as input).
        #[arg(short, long)]
        to: Option<String>,
    },

    /// Render a program as a Graphviz DOT graph.
    Render {
        /// Path to a JSON or YAML program file.
        file: PathBuf,

        /// Write the graph to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Verify {
            file,
            json,
            parallel,
        } => run_verify(&file, json, parallel),
        Commands::Schema { version } => run_schema(&version),
        Commands::Fmt { file, to } => run_fmt(&file, to.as_deref()),
        Commands::Render { file, output } => run_render(&file, output.as_deref()),
    };
    process::exit(exit_code);
}

/// Exit code for a failed load: 3 for I/O errors, 2 for anything malformed.
fn load_error_code(path: &Path, err: &CoreError) -> i32 {
    match err {
        CoreError::Io(e) => {
            eprintln!("Error: failed to read '{}': {}", path.display(), e);
            3
        }
        e => {
            eprintln!("Error: malformed program '{}': {}", path.display(), e);
            2
        }
    }
}

/// Execute the verify subcommand.
///
/// Returns exit code: 0 = valid, 1 = topology problems,
/// 2 = malformed program, 3 = I/O error.
fn run_verify(path: &Path, json: bool, parallel: bool) -> i32 {
    let input = match load_program_like(path) {
        Ok(input) => input,
        Err(e) => return load_error_code(path, &e),
    };

    tracing::info!("verifying {}", path.display());
    let result = match verify_topology_with(input, &VerifyOptions { parallel }) {
        Ok(result) => result,
        Err(e) => return load_error_code(path, &e),
    };

    if json {
        let out = serde_json::json!({
            "valid": result.is_valid(),
            "problems": result.messages(),
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: failed to serialize result: {}", e);
                return 2;
            }
        }
    } else if result.is_valid() {
        println!("{}: topology is valid", path.display());
    } else {
        println!("{}: {} topology problem(s):", path.display(), result.problems.len());
        for message in result.messages() {
            println!("  - {}", message);
        }
    }

    if result.is_valid() {
        0
    } else {
        1
    }
}

/// Execute the schema subcommand.
fn run_schema(version: &str) -> i32 {
    let schema = match generate_program_schema(version) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match serde_json::to_string_pretty(&schema) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize schema: {}", e);
            1
        }
    }
}

/// Execute the fmt subcommand.
///
/// Returns exit code: 0 = success, 1 = bad arguments,
/// 2 = malformed program, 3 = I/O error.
fn run_fmt(path: &Path, to: Option<&str>) -> i32 {
    let format = match to {
        None => Format::detect(path),
        Some(s) => match parse_format(s) {
            Ok(format) => format,
            Err(msg) => {
                eprintln!("Error: {}", msg);
                return 1;
            }
        },
    };

    let routine = match load_program_like(path).and_then(ProgramLike::into_routine) {
        Ok(routine) => routine.into_owned(),
        Err(e) => return load_error_code(path, &e),
    };

    match format.to_string(&Program::new(routine)) {
        Ok(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize program: {}", e);
            2
        }
    }
}

/// Execute the render subcommand.
///
/// Returns exit code: 0 = success, 2 = malformed program, 3 = I/O error.
fn run_render(path: &Path, output: Option<&Path>) -> i32 {
    let routine = match load_program_like(path).and_then(ProgramLike::into_routine) {
        Ok(routine) => routine,
        Err(e) => return load_error_code(path, &e),
    };

    let dot = to_dot(&routine);
    match output {
        None => {
            print!("{}", dot);
            0
        }
        Some(out) => match std::fs::write(out, dot) {
            Ok(()) => {
                tracing::info!("wrote {}", out.display());
                0
            }
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", out.display(), e);
                3
            }
        },
    }
}

/// Parse an output format name.
fn parse_format(s: &str) -> Result<Format, String> {
    match s {
        "json" | "JSON" => Ok(Format::Json),
        "yaml" | "yml" | "YAML" => Ok(Format::Yaml),
        _ => Err(format!("invalid format '{}', expected json or yaml", s)),
    }
}
