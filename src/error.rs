//! Failure taxonomy for the launcher and its mapping onto exit codes.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or inconsistent command-line input
    Argument,
    /// Host is missing something the run needs
    Environment,
    /// cacao.py itself failed
    Subprocess,
}

impl ErrorClass {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorClass::Argument => 2,
            ErrorClass::Environment => 3,
            ErrorClass::Subprocess => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Wrong formatting of argument '{name}' ({value}): it should be a string of three integers separated by ':', starting with 0 (NO_COVERAGE) (see --help)")]
    BadCallability { name: &'static str, value: String },

    #[error("Output directory ({}) does not exist", .0.display())]
    MissingOutputDir(PathBuf),

    #[error("Track directory with actionable/pathogenic loci ({}) does not exist", .0.display())]
    MissingTrackDir(PathBuf),

    #[error("Query target file ({}) should have a .bed suffix (BED format)", .0.display())]
    TargetSuffix(PathBuf),

    #[error("Query target file ({}) does not exist", .0.display())]
    MissingTarget(PathBuf),

    #[error("Output files (e.g. {}) already exist - please specify different sample_id or add option --force_overwrite", .0.display())]
    ReportExists(PathBuf),

    #[error("Query alignment file ({}) should have a .bam or .cram suffix (BAM/CRAM)", .0.display())]
    AlignmentSuffix(PathBuf),

    #[error("Query alignment file ({}) does not exist", .0.display())]
    MissingAlignment(PathBuf),

    #[error("BAM index file ({}) does not exist", .0.display())]
    MissingBamIndex(PathBuf),

    #[error("CRAM index file ({}) does not exist", .0.display())]
    MissingCramIndex(PathBuf),

    #[error("CRAM input ({}) requires a reference fasta (--ref_fasta)", .0.display())]
    ReferenceRequired(PathBuf),

    #[error("Reference fasta ({}) does not exist", .0.display())]
    MissingReference(PathBuf),

    #[error("Cannot resolve path {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Docker image {image} does not exist, pull image from Dockerhub (docker pull {image})")]
    MissingImage { image: String },

    #[error("{0:#}")]
    Environment(#[from] anyhow::Error),

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

impl LaunchError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LaunchError::MissingImage { .. }
            | LaunchError::Resolve { .. }
            | LaunchError::Environment(_)
            | LaunchError::Io { .. } => ErrorClass::Environment,
            LaunchError::ToolFailed { .. } => ErrorClass::Subprocess,
            _ => ErrorClass::Argument,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.class().exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_have_distinct_codes() {
        let arg = LaunchError::MissingOutputDir(PathBuf::from("/nope"));
        let env = LaunchError::MissingImage {
            image: "sigven/cacao:0.3.1".into(),
        };
        let io = LaunchError::Io {
            program: "docker".into(),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(arg.class(), ErrorClass::Argument);
        assert_eq!(env.class(), ErrorClass::Environment);
        assert_eq!(io.class(), ErrorClass::Environment);
        assert_eq!(arg.exit_code(), 2);
        assert_eq!(env.exit_code(), 3);
        assert_ne!(ErrorClass::Subprocess.exit_code(), 0);
    }

    #[test]
    fn missing_image_message_has_pull_hint() {
        let e = LaunchError::MissingImage {
            image: "sigven/cacao:0.3.1".into(),
        };
        assert!(e.to_string().contains("docker pull sigven/cacao:0.3.1"));
    }

    #[test]
    fn anyhow_errors_fold_into_environment() {
        let e: LaunchError = anyhow::anyhow!("docker not found").into();
        assert_eq!(e.class(), ErrorClass::Environment);
        assert_eq!(e.to_string(), "docker not found");
    }
}
