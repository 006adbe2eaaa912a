//! Building and running the cacao.py command line, either inside the
//! container image or straight from the host.

use itertools::Itertools;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::error::LaunchError;
use crate::model::{
    self, ResolvedPaths, ToolParams, CONTAINER_ENTRYPOINT, CONTAINER_REF_FASTA, CONTAINER_TARGET,
    CONTAINER_TRACKS, CONTAINER_WORKDIR, DIRECT_ENTRYPOINT, NA,
};
use crate::util::logging::Reporter;
use crate::util::tools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Docker,
    Direct,
}

/// One program and its argv, ready to spawn.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub execution: Execution,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    /// Shell-quoted rendering, for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(shell_quote(&self.program.to_string_lossy()))
            .chain(self.args.iter().map(|a| shell_quote(a)))
            .join(" ")
    }

    /// Host sources of `-v=<host>:<container>` clauses, in order.
    pub fn mounts(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter_map(|a| a.strip_prefix("-v="))
            .collect()
    }
}

/// Quote `s` for `sh` if it contains anything beyond a conservative safe set.
pub fn shell_quote(s: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !s.is_empty() && s.chars().all(safe) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

fn host(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn mount(host: &str, container: &str) -> String {
    format!("-v={host}:{container}")
}

/// cacao.py argv shared by both modes: the four alignment/target slots are
/// supplied by the caller, everything else comes from the bundle and params.
fn tool_args(
    alignment: String,
    target: String,
    track_dir: String,
    output_dir: String,
    paths: &ResolvedPaths,
    params: &ToolParams,
) -> Vec<String> {
    let mut args = vec![
        alignment,
        target,
        paths.alignment.basename.clone(),
        paths.target_basename().to_string(),
        track_dir,
        output_dir,
    ];
    args.extend(params.positional());
    args
}

/// `docker run` with the inputs bind-mounted at fixed locations; cacao.py only
/// ever sees in-container paths.
pub fn build_container(docker: &Path, image: &str, paths: &ResolvedPaths, params: &ToolParams) -> Invocation {
    let aln_in = paths.format.container_path();

    let mut inner = vec![CONTAINER_ENTRYPOINT.to_string()];
    inner.extend(tool_args(
        aln_in.to_string(),
        CONTAINER_TARGET.to_string(),
        CONTAINER_TRACKS.to_string(),
        CONTAINER_WORKDIR.to_string(),
        paths,
        params,
    ));
    if paths.reference.is_some() {
        inner.push("--ref-fasta".into());
        inner.push(CONTAINER_REF_FASTA.into());
    }
    let inner = inner.iter().map(|a| shell_quote(a)).join(" ");

    let reference = paths
        .reference
        .as_ref()
        .map_or_else(|| NA.to_string(), |r| host(&r.path()));

    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        format!("-w={CONTAINER_WORKDIR}"),
        mount(&host(&paths.track_dir), CONTAINER_TRACKS),
        mount(&host(&paths.output_dir), CONTAINER_WORKDIR),
        mount(&host(&paths.alignment.path()), aln_in),
        mount(&host(&paths.alignment_index()), paths.format.container_index_path()),
        mount(&reference, CONTAINER_REF_FASTA),
    ];
    if let Some(t) = &paths.target {
        args.push(mount(&host(&t.path()), CONTAINER_TARGET));
    }
    args.push(image.to_string());
    args.extend(["sh".to_string(), "-c".to_string(), inner]);

    Invocation {
        execution: Execution::Docker,
        program: docker.to_path_buf(),
        args,
    }
}

/// cacao.py straight from the host, with host-absolute paths.
pub fn build_direct(tool: &Path, paths: &ResolvedPaths, params: &ToolParams) -> Invocation {
    let target = paths
        .target
        .as_ref()
        .map_or_else(|| NA.to_string(), |t| host(&t.path()));
    let mut args = tool_args(
        host(&paths.alignment.path()),
        target,
        host(&paths.track_dir),
        host(&paths.output_dir),
        paths,
        params,
    );
    args.push("--no-docker".into());
    if let Some(r) = &paths.reference {
        args.push("--ref-fasta".into());
        args.push(host(&r.path()));
    }
    Invocation {
        execution: Execution::Direct,
        program: tool.to_path_buf(),
        args,
    }
}

/// Pick the program for `execution`, falling back to its bare name when it
/// cannot be resolved (only used for dry runs).
pub fn program_or_name(execution: Execution) -> PathBuf {
    let resolved = match execution {
        Execution::Docker => tools::resolve_docker(),
        Execution::Direct => tools::resolve_cacao(),
    };
    resolved.unwrap_or_else(|_| {
        PathBuf::from(match execution {
            Execution::Docker => "docker",
            Execution::Direct => DIRECT_ENTRYPOINT,
        })
    })
}

/// Resolve the executables, check the image when running in the container,
/// and build the invocation.
pub fn prepare(
    execution: Execution,
    paths: &ResolvedPaths,
    params: &ToolParams,
    log: &Reporter,
) -> Result<Invocation, LaunchError> {
    match execution {
        Execution::Docker => {
            let docker = tools::resolve_docker()?;
            let image = model::image_reference();
            log.debug(format!("Using docker at {}", docker.display()));
            if !tools::image_present(&docker, &image)? {
                return Err(LaunchError::MissingImage { image });
            }
            Ok(build_container(&docker, &image, paths, params))
        }
        Execution::Direct => {
            let tool = tools::resolve_cacao()?;
            log.debug(format!("Using {} at {}", DIRECT_ENTRYPOINT, tool.display()));
            Ok(build_direct(&tool, paths, params))
        }
    }
}

/// Read `reader` to EOF. On a read error the child is killed and reaped
/// before the error is returned.
fn drain(reader: &mut impl Read, child: &mut Child) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e);
    }
    Ok(buf)
}

/// Run the invocation to completion with stdout and stderr merged into one
/// pipe. Returns the captured text; a non-zero exit is an error carrying it.
pub fn execute(inv: &Invocation, log: &Reporter) -> Result<String, LaunchError> {
    let program = inv.program.display().to_string();
    let io_err = |source: std::io::Error| LaunchError::Io {
        program: program.clone(),
        source,
    };
    log.debug(format!("Command: {}", inv.command_line()));

    let (mut reader, writer) = std::io::pipe().map_err(io_err)?;
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdout(writer.try_clone().map_err(io_err)?)
        .stderr(writer);
    let mut child = cmd.spawn().map_err(io_err)?;
    // Our copies of the write end must go, or the read below never sees EOF.
    drop(cmd);

    let buf = drain(&mut reader, &mut child).map_err(io_err)?;
    let status = child.wait().map_err(io_err)?;
    let output = String::from_utf8_lossy(&buf).into_owned();

    if status.success() {
        Ok(output)
    } else {
        Err(LaunchError::ToolFailed {
            program,
            status,
            output,
        })
    }
}
