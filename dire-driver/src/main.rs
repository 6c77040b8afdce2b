//! Direct IR Emitter Driver
//!
//! Main entry point: selects a demonstration program by name, emits it
//! into a fresh module, prints or writes the textual IR, and optionally
//! executes `main` on the reference evaluator.

use clap::{Parser, Subcommand};
use dire_emit::programs::{emit_program, PROGRAM_NAMES};
use dire_emit::{host_triple, EmitContext};
use dire_ir::{verify_module, Machine, RunValue};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dire")]
#[command(about = "Direct IR Emitter")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit a demonstration program and print its textual IR
    Emit {
        /// Which program to emit
        #[arg(short, long, default_value = "loop-for")]
        program: String,

        /// Output file for the textual IR
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also dump the module as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Emit a demonstration program and execute its main function
    Run {
        /// Which program to run
        #[arg(short, long, default_value = "loop-for")]
        program: String,
    },

    /// List the available demonstration programs
    List,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Emit {
            program,
            output,
            json,
        } => {
            if let Err(e) = emit_command(&program, output.as_deref(), json.as_deref()) {
                eprintln!("Error emitting `{}`: {}", program, e);
                std::process::exit(1);
            }
        }
        Commands::Run { program } => {
            if let Err(e) = run_command(&program) {
                eprintln!("Error running `{}`: {}", program, e);
                std::process::exit(1);
            }
        }
        Commands::List => {
            for name in PROGRAM_NAMES {
                println!("{}", name);
            }
        }
    }
}

fn build(program: &str) -> Result<EmitContext, Box<dyn std::error::Error>> {
    let mut ctx = EmitContext::new(program);
    ctx.set_target_triple(&host_triple());
    emit_program(&mut ctx, program)?;
    verify_module(ctx.module())?;
    Ok(ctx)
}

fn emit_command(
    program: &str,
    output: Option<&std::path::Path>,
    json: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = build(program)?;

    print!("{}", ctx.ir_text());

    if let Some(path) = output {
        ctx.write_to_file(path)?;
        println!("; IR written to: {}", path.display());
    }
    if let Some(path) = json {
        fs::write(path, serde_json::to_string_pretty(ctx.module())?)?;
        println!("; JSON written to: {}", path.display());
    }
    Ok(())
}

fn run_command(program: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = build(program)?;
    let module = ctx.into_module();

    let mut machine = Machine::new(&module)?;
    let result = machine.run("main", &[])?;

    if !machine.output.is_empty() {
        print!("{}", machine.output);
    }
    match result {
        Some(RunValue::Int(v)) => println!("main returned {}", v),
        Some(RunValue::Float(v)) => println!("main returned {}", v),
        Some(RunValue::Ptr(v)) => println!("main returned pointer {:#x}", v),
        None => println!("main returned void"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_program_emits_and_verifies() {
        for name in PROGRAM_NAMES {
            let result = build(name);
            assert!(result.is_ok(), "program `{}` failed to emit", name);
        }
    }

    #[test]
    fn test_unknown_program() {
        assert!(build("no-such-program").is_err());
    }

    #[test]
    fn test_emit_command_writes_output() {
        let path = std::env::temp_dir().join("dire_emit_test.ir");
        emit_command("locals", Some(&path), None).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("define i32 @main()"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_run_command_executes() {
        assert!(run_command("sum").is_ok());
    }
}
