use std::fs;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use metal_eval::{Flow, Replay, Vm};
use metal_types::{MetalError, SourceFile};

mod repl;
mod report;

use report::Reporter;

const DEFAULT_BOOTSTRAP: &str = "metaL.ini";

/// metal runs metaL scripts against a live homoiconic object graph.
///
/// The bootstrap file is replayed first, then every FILE in order. With no
/// files, or with --interactive, an interactive session follows.
#[derive(Parser, Debug)]
#[command(name = "metal", version, about, long_about = None)]
struct Args {
    /// Bootstrap script replayed before anything else. A missing default
    /// `metaL.ini` is skipped.
    #[arg(short, long, value_name = "PATH")]
    bootstrap: Option<PathBuf>,

    /// Open an interactive session after the files have run.
    #[arg(short, long)]
    interactive: bool,

    /// Print diagnostics as JSON objects, one per line.
    #[arg(long)]
    json: bool,

    /// Scripts replayed in order after the bootstrap.
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let reporter = Reporter::new(args.json);
    let mut vm = Vm::new();

    let bootstrap = match &args.bootstrap {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(DEFAULT_BOOTSTRAP)).filter(|p| p.exists()),
    };

    for path in bootstrap.iter().chain(&args.files) {
        match replay_file(&mut vm, path, &reporter) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return ExitCode::SUCCESS,
            Err(()) => return ExitCode::FAILURE,
        }
    }

    if args.interactive || args.files.is_empty() {
        let stdin = io::stdin();
        if let Err(e) = repl::start(&mut vm, stdin.lock(), &mut stdout().lock(), &reporter) {
            eprintln!("metal: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Replay one script in batch mode. Any diagnostic fails the run.
fn replay_file(vm: &mut Vm, path: &Path, reporter: &Reporter) -> Result<Flow, ()> {
    let name = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| {
        reporter.error(&MetalError::unreadable(&name, format!("cannot read '{name}': {e}")));
    })?;
    let outcome = vm.execute(&SourceFile::new(name, text), Replay::Batch);
    for dump in vm.drain_output() {
        println!("{dump}");
    }
    for err in &outcome.errors {
        reporter.error(err);
    }
    if outcome.is_ok() {
        Ok(outcome.flow)
    } else {
        Err(())
    }
}
