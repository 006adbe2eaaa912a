//! Input validation: every user-supplied path and threshold string is checked
//! before anything is spawned. The first failing check is reported.

use regex::Regex;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::error::LaunchError;
use crate::model::{AlignmentFormat, HostFile, InvocationRequest, ResolvedPaths};
use crate::util::logging::Reporter;

fn callability_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0:[0-9]+:[0-9]+$").expect("valid regex"))
}

/// `0:<uint>:<uint>`
pub fn check_callability(name: &'static str, value: &str) -> Result<(), LaunchError> {
    if callability_re().is_match(value) {
        Ok(())
    } else {
        Err(LaunchError::BadCallability {
            name,
            value: value.to_string(),
        })
    }
}

/// Lexical clean-up: drops `.` and trailing slashes, folds `..` into its parent.
/// Symlinks are not consulted.
fn normalize(p: &Path) -> PathBuf {
    p.components().fold(PathBuf::new(), |mut acc, c| {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(acc.components().next_back(), Some(Component::Normal(_))) {
                    acc.pop();
                } else if !acc.has_root() {
                    acc.push(c);
                }
            }
            _ => acc.push(c),
        }
        acc
    })
}

fn absolute(p: &Path) -> Result<PathBuf, LaunchError> {
    std::path::absolute(p)
        .map(|abs| normalize(&abs))
        .map_err(|source| LaunchError::Resolve {
            path: p.to_path_buf(),
            source,
        })
}

fn host_file(p: &Path) -> Result<HostFile, LaunchError> {
    let abs = absolute(p)?;
    let basename = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = abs.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(HostFile { dir, basename })
}

/// `<path><suffix>`, i.e. `s1.bam` -> `s1.bam.bai`.
fn with_appended(p: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = p.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Check the request against the filesystem and resolve it to absolute paths.
///
/// Nothing is read or written; only existence and file-name suffixes are
/// inspected.
pub fn verify_inputs(req: &InvocationRequest, log: &Reporter) -> Result<ResolvedPaths, LaunchError> {
    log.info("Validating input files and command-line parameters");

    check_callability("callability_levels_germline", &req.callability_levels_germline)?;
    check_callability("callability_levels_somatic", &req.callability_levels_somatic)?;

    let output_dir = absolute(&req.output_dir)?;
    if !output_dir.is_dir() {
        return Err(LaunchError::MissingOutputDir(output_dir));
    }

    let track_dir = absolute(&req.track_dir)?;
    if !track_dir.is_dir() {
        return Err(LaunchError::MissingTrackDir(track_dir));
    }

    let target = match &req.query_target {
        Some(bed) => {
            if !bed.to_string_lossy().ends_with(".bed") {
                return Err(LaunchError::TargetSuffix(bed.clone()));
            }
            if !bed.exists() {
                return Err(LaunchError::MissingTarget(bed.clone()));
            }
            Some(host_file(bed)?)
        }
        None => None,
    };

    let report = output_dir.join(req.report_name());
    if report.exists() {
        if !req.force_overwrite {
            return Err(LaunchError::ReportExists(report));
        }
        log.warn(format!("Overwriting existing report {}", report.display()));
    }

    let aln = &req.query_aln;
    let format = AlignmentFormat::from_path(aln).ok_or_else(|| LaunchError::AlignmentSuffix(aln.clone()))?;
    if !aln.exists() {
        return Err(LaunchError::MissingAlignment(aln.clone()));
    }

    let index = with_appended(aln, format.index_suffix());
    match format {
        AlignmentFormat::Bam => {
            if !index.exists() {
                return Err(LaunchError::MissingBamIndex(index));
            }
        }
        AlignmentFormat::Cram => {
            if !index.exists() {
                return Err(LaunchError::MissingCramIndex(index));
            }
            if req.ref_fasta.is_none() {
                return Err(LaunchError::ReferenceRequired(aln.clone()));
            }
        }
    }

    let reference = match &req.ref_fasta {
        Some(fa) => {
            if !fa.exists() {
                return Err(LaunchError::MissingReference(fa.clone()));
            }
            Some(host_file(fa)?)
        }
        None => None,
    };

    let alignment = host_file(aln)?;
    let alignment_index_basename = format!("{}{}", alignment.basename, format.index_suffix());

    if req.is_rna {
        log.info("Alignment flagged as RNA-seq (--is_rna)");
    }

    Ok(ResolvedPaths {
        track_dir,
        output_dir,
        report,
        alignment,
        format,
        alignment_index_basename,
        target,
        reference,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{GenomeAssembly, InvocationRequest, Mode};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// tmp/{tracks/, out/, sample.bam, sample.bam.bai}
    pub fn layout() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("tracks")).unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("sample.bam"), b"").unwrap();
        fs::write(dir.path().join("sample.bam.bai"), b"").unwrap();
        dir
    }

    pub fn request(root: &Path) -> InvocationRequest {
        InvocationRequest {
            query_aln: root.join("sample.bam"),
            track_dir: root.join("tracks"),
            output_dir: root.join("out"),
            genome_assembly: GenomeAssembly::Grch38,
            mode: Mode::Somatic,
            sample_id: "S1".into(),
            mapq: 0,
            threads: 0,
            callability_levels_germline: "0:10:100".into(),
            callability_levels_somatic: "0:30:200".into(),
            query_target: None,
            ref_fasta: None,
            is_rna: false,
            force_overwrite: false,
            no_docker: false,
        }
    }
}
