//! CLI definition and top-level flow: validate, build, run.

use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::dispatch::{self, Execution, Invocation};
use crate::error::LaunchError;
use crate::model::{self, InvocationRequest, ResolvedPaths, ToolParams};
use crate::util::logging::Reporter;
use crate::validate;

#[derive(Parser, Debug)]
#[command(
    name = "cacao",
    version,
    about = "cacao - assessment of sequencing coverage at pathogenic and actionable loci in cancer"
)]
pub struct Cli {
    #[command(flatten)]
    pub request: InvocationRequest,

    /// Validate inputs and print the planned command as JSON without running it
    #[arg(long = "dry_run")]
    pub dry_run: bool,
}

/// What `--dry_run` prints.
#[derive(Debug, Serialize)]
pub struct Plan<'a> {
    pub cacao_version: &'static str,
    pub execution: Execution,
    pub paths: &'a ResolvedPaths,
    pub program: &'a Path,
    pub args: &'a [String],
    pub command_line: String,
}

impl<'a> Plan<'a> {
    pub fn new(paths: &'a ResolvedPaths, inv: &'a Invocation) -> Self {
        Self {
            cacao_version: model::CACAO_VERSION,
            execution: inv.execution,
            paths,
            program: &inv.program,
            args: &inv.args,
            command_line: inv.command_line(),
        }
    }
}

impl Cli {
    pub fn execution(&self) -> Execution {
        if self.request.no_docker {
            Execution::Direct
        } else {
            Execution::Docker
        }
    }

    pub fn run(self, log: &Reporter) -> Result<(), LaunchError> {
        let t0 = Instant::now();
        log.info("Start");

        let paths = validate::verify_inputs(&self.request, log)?;
        let params = ToolParams::from(&self.request);
        let execution = self.execution();

        if self.dry_run {
            let inv = match execution {
                Execution::Docker => dispatch::build_container(
                    &dispatch::program_or_name(execution),
                    &model::image_reference(),
                    &paths,
                    &params,
                ),
                Execution::Direct => {
                    dispatch::build_direct(&dispatch::program_or_name(execution), &paths, &params)
                }
            };
            let json = serde_json::to_string_pretty(&Plan::new(&paths, &inv))
                .map_err(|e| LaunchError::Environment(e.into()))?;
            println!("{json}");
            return Ok(());
        }

        let inv = dispatch::prepare(execution, &paths, &params, log)?;
        log.info("Running cacao workflow - assessment of coverage at actionable and pathogenic loci");
        let output = dispatch::execute(&inv, log)?;
        let output = output.trim_end();
        if !output.is_empty() {
            println!("{output}");
        }

        let elapsed = std::time::Duration::from_secs(t0.elapsed().as_secs());
        log.info(format!("Finished in {}", humantime::format_duration(elapsed)));
        Ok(())
    }
}
