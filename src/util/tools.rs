use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DOCKER_ENV: &str = "CACAO_DOCKER";
pub const TOOL_ENV: &str = "CACAO_BIN";

/// Resolve an executable. Priority: environment variable > PATH search.
pub fn resolve_bin(env_var: &str, name: &str) -> Result<PathBuf> {
    match std::env::var_os(env_var) {
        Some(v) => resolve_override(Path::new(&v), name, env_var),
        None => which::which(name)
            .with_context(|| format!("{name} not found in PATH (install it or set {env_var})")),
    }
}

/// A value with a directory part is taken as a path; a bare command name is
/// searched on PATH.
fn resolve_override(p: &Path, name: &str, env_var: &str) -> Result<PathBuf> {
    if p.components().count() == 1 && !p.has_root() {
        return which::which(p)
            .with_context(|| format!("{name}: {} (from {env_var}) not found in PATH", p.display()));
    }
    if p.exists() {
        Ok(p.to_path_buf())
    } else {
        Err(anyhow!("{name} not found at {} (from {env_var})", p.display()))
    }
}

pub fn resolve_docker() -> Result<PathBuf> {
    resolve_bin(DOCKER_ENV, "docker")
}

pub fn resolve_cacao() -> Result<PathBuf> {
    resolve_bin(TOOL_ENV, crate::model::DIRECT_ENTRYPOINT)
}

/// Whether `docker images -q <image>` lists anything.
pub fn image_present(docker: &Path, image: &str) -> Result<bool> {
    let out = Command::new(docker)
        .args(["images", "-q", image])
        .output()
        .with_context(|| format!("spawn {} images -q {image}", docker.display()))?;
    if !out.status.success() {
        return Err(anyhow!(
            "{} images exited with {}: {}",
            docker.display(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_errors_name_the_tool() {
        let err = resolve_bin("CACAO_TEST_UNSET_VAR", "definitely-not-a-real-tool-xyz").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("definitely-not-a-real-tool-xyz"), "{msg}");
        assert!(msg.contains("CACAO_TEST_UNSET_VAR"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn override_accepts_bare_command_name() {
        let p = resolve_override(Path::new("sh"), "docker", DOCKER_ENV).unwrap();
        assert!(p.is_absolute() && p.ends_with("sh"), "{}", p.display());

        let err = resolve_override(Path::new("no-such-cmd-xyz"), "docker", DOCKER_ENV).unwrap_err();
        assert!(err.to_string().contains("CACAO_DOCKER"));
    }

    #[test]
    fn override_path_must_exist() {
        let err = resolve_override(Path::new("/definitely/not/here/docker"), "docker", DOCKER_ENV).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/docker"));

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("cacao.py");
        std::fs::write(&tool, "").unwrap();
        assert_eq!(resolve_override(&tool, "cacao.py", TOOL_ENV).unwrap(), tool);
    }

    #[cfg(unix)]
    #[test]
    fn image_check_reads_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let listed = dir.path().join("docker-listed");
        std::fs::write(&listed, "#!/bin/sh\necho 0123456789ab\n").unwrap();
        std::fs::set_permissions(&listed, std::fs::Permissions::from_mode(0o755)).unwrap();

        let empty = dir.path().join("docker-empty");
        std::fs::write(&empty, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&empty, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(image_present(&listed, "sigven/cacao:0.3.1").unwrap());
        assert!(!image_present(&empty, "sigven/cacao:0.3.1").unwrap());
    }
}
