mod cli;
mod domain;
mod infra;

use crate::cli::CliInvocation;
use crate::infra::resolve_sessions_file;
use std::io::{self, Write};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    ResolveFile(#[from] crate::infra::ResolveSessionsFileError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    init_tracing();

    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            drop(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Command { file, command } => {
            let sessions_file = resolve_sessions_file(file.as_deref())?;
            tracing::debug!(path = %sessions_file.display(), "using sessions file");
            crate::cli::run(command, &sessions_file)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - record and browse study sessions\n\nUSAGE:\n  {name} [--file PATH] [list] [--json]    List sessions ordered by date (with store index)\n  {name} [--file PATH] add --subject S --duration N [--date YYYY-MM-DD] [--notes T]\n  {name} [--file PATH] edit INDEX [--subject S] [--duration N] [--date YYYY-MM-DD] [--notes T]\n  {name} [--file PATH] day YYYY-MM-DD     Show sessions on one date\n  {name} --help | --version\n\nFLAGS:\n  --file, -f PATH    Sessions file (default: sessions.csv in the current directory)\n  --subject, -s S    Subject (required, non-empty)\n  --duration, -m N   Duration in minutes (must be greater than 0)\n  --date, -d D       Date as YYYY-MM-DD (add defaults to today, UTC)\n  --notes, -n T      Free-form notes\n  --json             list: output JSON\n\nOUTPUT:\n  list: index<TAB>date<TAB>duration<TAB>subject<TAB>notes  (totals on stderr)\n\nENV:\n  STUDY_PLANNER_FILE   Sessions file when --file is not given\n  RUST_LOG             Log filter (default: warn)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
