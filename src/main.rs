//! cacao: validate inputs and launch the coverage workflow.
//! Entry point only; see `cli`, `validate` and `dispatch`.

use std::process::ExitCode;

use cacao::cli::Cli;
use cacao::error::LaunchError;
use cacao::util::logging::Reporter;

fn main() -> ExitCode {
    let cli = <Cli as clap::Parser>::parse();
    let log = Reporter::from_env();
    match cli.run(&log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let LaunchError::ToolFailed { output, .. } = &e {
                println!("{}", output.trim_end());
            }
            log.fail(&e);
            ExitCode::from(e.exit_code())
        }
    }
}
