//! MIPS Teaching Compiler Driver
//!
//! Reads the typed syntax tree as JSON, runs the backend pipeline and writes
//! the assembly file, or executes the result in the simulator.

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use mipc_backend::{compile, CompileOptions, CompileOutput};
use mipc_common::CompilerError;
use mipc_frontend::Program;
use mipc_sim::SimError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "mipc")]
#[command(about = "MIPS Teaching Compiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log phase decisions (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a syntax tree to assembly
    Compile {
        /// Input syntax tree (JSON)
        input: PathBuf,

        /// Output assembly file (default: input with .s extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the IR optimizer
        #[arg(long)]
        no_opt: bool,

        /// Print the IR before and after optimization
        #[arg(long)]
        print_ir: bool,

        /// Save the IR dumps to this file
        #[arg(long, value_name = "FILE")]
        save_ir: Option<PathBuf>,

        /// Print every function's symbol table
        #[arg(long)]
        print_symbols: bool,

        /// Print optimizer and register allocation counters
        #[arg(long)]
        stats: bool,

        /// Leave comments out of the assembly
        #[arg(long)]
        no_comments: bool,
    },

    /// Compile and execute in the simulator
    Run {
        /// Input syntax tree (JSON)
        input: PathBuf,

        /// Skip the IR optimizer
        #[arg(long)]
        no_opt: bool,
    },
}

#[derive(Debug, Error)]
enum DriverError {
    #[error(transparent)]
    Compile(#[from] CompilerError),

    #[error("runtime error: {0}")]
    Runtime(#[from] SimError),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            no_opt,
            print_ir,
            save_ir,
            print_symbols,
            stats,
            no_comments,
        } => {
            let options = CompileOptions {
                optimize: !no_opt,
                emit_comments: !no_comments,
            };
            let report = Report {
                print_ir,
                save_ir,
                print_symbols,
                stats,
            };
            compile_file(&input, output.as_deref(), &options, &report)
        }
        Commands::Run { input, no_opt } => run_file(&input, !no_opt).map(|out| print!("{}", out)),
    };

    if let Err(err) = result {
        match &err {
            DriverError::Compile(e) => eprintln!("{}", e.diagnostic()),
            DriverError::Runtime(_) => eprintln!("error: {}", err),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Extra output requested on the command line
#[derive(Debug, Default)]
struct Report {
    print_ir: bool,
    save_ir: Option<PathBuf>,
    print_symbols: bool,
    stats: bool,
}

fn load(input: &Path) -> Result<Program, CompilerError> {
    let text = fs::read_to_string(input).map_err(|e| CompilerError::Io {
        message: format!("cannot read {}: {}", input.display(), e),
    })?;
    Program::from_json(&text)
}

fn ir_dumps(output: &CompileOutput) -> String {
    let mut text = format!("# IR\n{}", output.ir.dump());
    if let Some(optimized) = &output.optimized {
        text.push_str(&format!("\n# Optimized IR\n{}", optimized.dump()));
    }
    text
}

fn compile_file(
    input: &Path,
    output_path: Option<&Path>,
    options: &CompileOptions,
    report: &Report,
) -> Result<(), DriverError> {
    info!("compiling {}", input.display());
    let program = load(input)?;
    let output = compile(&program, options)?;

    if report.print_ir {
        print!("{}", ir_dumps(&output));
    }
    if let Some(path) = &report.save_ir {
        write(path, &ir_dumps(&output))?;
        println!("IR saved to: {}", path.display());
    }
    if report.print_symbols {
        print!("{}", output.session.functions.dump());
    }
    if report.stats {
        if let Some(stats) = &output.opt_stats {
            println!(
                "optimizer: {} folded, {} simplified, {} propagated, {} declarations removed, {} temporaries removed",
                stats.folded, stats.simplified, stats.propagated, stats.declarations_removed, stats.temporaries_removed
            );
        }
        let alloc = &output.alloc_stats;
        println!(
            "registers: {} cache hits, {} misses, {} spills, {} pool exhaustions",
            alloc.cache_hits, alloc.cache_misses, alloc.spills, alloc.pool_exhaustions
        );
    }

    let path = output_path.map(Path::to_path_buf).unwrap_or_else(|| input.with_extension("s"));
    write(&path, &output.text)?;
    println!("Assembly written to: {}", path.display());
    Ok(())
}

fn write(path: &Path, text: &str) -> Result<(), CompilerError> {
    fs::write(path, text).map_err(|e| CompilerError::Io {
        message: format!("cannot write {}: {}", path.display(), e),
    })
}

/// Compile and simulate; returns what the program printed
fn run_file(input: &Path, optimize: bool) -> Result<String, DriverError> {
    let program = load(input)?;
    let options = CompileOptions {
        optimize,
        ..CompileOptions::default()
    };
    let output = compile(&program, &options)?;
    Ok(mipc_sim::run(&output.asm)?)
}
