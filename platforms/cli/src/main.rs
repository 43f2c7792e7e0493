mod bundle;
mod runner;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tur_tape::{TapeCore, TuringMachine, TuringMachineError, MAX_EXECUTION_STEPS};

use crate::bundle::Bundle;
use crate::runner::run_testcases;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The program bundle (JSON) to execute
    #[clap(short, long)]
    program: PathBuf,

    /// Replaces the bundle's tape, e.g. "1, 0, *1*"
    #[clap(short, long)]
    tape: Option<String>,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Run the bundle's testcases instead of the bundle's own tape
    #[clap(long)]
    testcases: bool,

    /// Maximum number of steps before giving up
    #[clap(short, long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// Print the final machine as JSON
    #[clap(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let bundle = match Bundle::load(&cli.program) {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.testcases {
        testcases(&bundle, &cli)
    } else {
        execute(&bundle, &cli)
    };

    result.unwrap_or_else(|e| {
        eprintln!("{}", e);
        ExitCode::FAILURE
    })
}

/// Reports analyzer findings without stopping the run.
fn check_program(machine: &TuringMachine) {
    if let Err(e) = machine.validate() {
        warn!(machine = machine.name(), "{}", e);
    }
}

fn testcases(bundle: &Bundle, cli: &Cli) -> Result<ExitCode, TuringMachineError> {
    check_program(&bundle.machine(cli.max_steps)?);
    let reports = run_testcases(bundle, cli.max_steps)?;

    for report in &reports {
        if report.passed() {
            println!("PASS {} ({} steps)", report.name, report.steps);
        } else {
            println!("FAIL {} ({:?} after {} steps)", report.name, report.halt, report.steps);
            for failure in &report.failures {
                println!("     {}", failure);
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    println!("\n{} passed, {} failed", reports.len() - failed, failed);

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn execute(bundle: &Bundle, cli: &Cli) -> Result<ExitCode, TuringMachineError> {
    let mut machine = bundle.machine(cli.max_steps)?;

    if let Some(text) = &cli.tape {
        let mut tape = machine.tape().clone();
        tape.from_human_string(text)?;
        machine.set_tape(tape);
    }
    check_program(&machine);

    if cli.debug {
        let print_state = |machine: &TuringMachine| {
            println!(
                "Step: {}, State: {}, Tape: [{}]",
                machine.step(),
                machine.state(),
                machine.tape().to_human_string()
            );
        };

        print_state(&machine);
        while machine.step() < cli.max_steps && machine.forth(1).is_some() {
            print_state(&machine);
        }
        println!("\nFinal tape:");
    } else {
        machine.run();
    }

    println!("{}", machine.tape().to_human_string());

    let halt = if machine.final_state_reached() {
        "final state"
    } else if machine.undefined_instruction() {
        "undefined instruction"
    } else {
        "iteration limit"
    };
    eprintln!("Halted on {} in state {} after {} steps", halt, machine.state(), machine.step());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&machine.to_json())?);
    }

    Ok(if machine.final_state_reached() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
