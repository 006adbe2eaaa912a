use clap::{Args, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Launcher version; the container image tag must match it.
pub const CACAO_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const IMAGE_NAME: &str = "sigven/cacao";

/// Placeholder handed to cacao.py for inputs that were not supplied.
pub const NA: &str = "NA";

pub const DEFAULT_CALLABILITY_GERMLINE: &str = "0:10:100";
pub const DEFAULT_CALLABILITY_SOMATIC: &str = "0:30:200";
pub const REPORT_SUFFIX: &str = "coverage_cacao.html";

// In-container layout
pub const CONTAINER_WORKDIR: &str = "/workdir/output";
pub const CONTAINER_TRACKS: &str = "/workdir/tracks";
pub const CONTAINER_TARGET: &str = "/workdir/query_target.bed";
pub const CONTAINER_REF_FASTA: &str = "/workdir/ref.fa";
pub const CONTAINER_ENTRYPOINT: &str = "/cacao.py";
pub const DIRECT_ENTRYPOINT: &str = "cacao.py";

pub fn image_reference() -> String {
    format!("{IMAGE_NAME}:{CACAO_VERSION}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GenomeAssembly {
    Grch37,
    Grch38,
}

impl fmt::Display for GenomeAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GenomeAssembly::Grch37 => "grch37",
            GenomeAssembly::Grch38 => "grch38",
        })
    }
}

/// Choice of loci and clinical context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Cancer predisposition loci
    Hereditary,
    /// Tumor sequencing loci
    Somatic,
    Any,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Hereditary => "hereditary",
            Mode::Somatic => "somatic",
            Mode::Any => "any",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentFormat {
    Bam,
    Cram,
}

impl AlignmentFormat {
    /// Format implied by the file name suffix, if any.
    pub fn from_path(p: &Path) -> Option<Self> {
        let s = p.to_string_lossy();
        if s.ends_with(".bam") {
            Some(AlignmentFormat::Bam)
        } else if s.ends_with(".cram") {
            Some(AlignmentFormat::Cram)
        } else {
            None
        }
    }

    pub fn index_suffix(self) -> &'static str {
        match self {
            AlignmentFormat::Bam => ".bai",
            AlignmentFormat::Cram => ".crai",
        }
    }

    /// Where the alignment is mounted inside the container.
    pub fn container_path(self) -> &'static str {
        match self {
            AlignmentFormat::Bam => "/workdir/query.bam",
            AlignmentFormat::Cram => "/workdir/query.cram",
        }
    }

    pub fn container_index_path(self) -> &'static str {
        match self {
            AlignmentFormat::Bam => "/workdir/query.bam.bai",
            AlignmentFormat::Cram => "/workdir/query.cram.crai",
        }
    }
}

/// Everything the user asked for, exactly as given on the command line.
#[derive(Args, Debug, Clone)]
pub struct InvocationRequest {
    /// Query alignment file (BAM/CRAM)
    #[arg(long = "query_aln", value_name = "QUERY_ALIGNMENT")]
    pub query_aln: PathBuf,

    /// Directory with BED tracks of pathogenic/actionable cancer loci for grch37/grch38
    #[arg(long = "track_dir", value_name = "TRACK_DIR")]
    pub track_dir: PathBuf,

    /// Output directory
    #[arg(long = "output_dir", value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Human genome assembly build
    #[arg(long = "genome_assembly", value_enum)]
    pub genome_assembly: GenomeAssembly,

    /// Choice of loci and clinical cancer context (cancer predisposition/tumor sequencing)
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Sample identifier - prefix for output files
    #[arg(long = "sample_id", value_name = "SAMPLE_ID")]
    pub sample_id: String,

    /// Mapping quality threshold
    #[arg(long, default_value_t = 0)]
    pub mapq: u32,

    /// Number of mosdepth BAM decompression threads (use 4 or fewer)
    #[arg(long, default_value_t = 0)]
    pub threads: u32,

    /// Colon-separated thresholds for NO_COVERAGE (0), LOW_COVERAGE, CALLABLE and HIGH_COVERAGE. Initial value must be 0.
    #[arg(long = "callability_levels_germline", default_value = DEFAULT_CALLABILITY_GERMLINE)]
    pub callability_levels_germline: String,

    /// Same as --callability_levels_germline, for the somatic loci
    #[arg(long = "callability_levels_somatic", default_value = DEFAULT_CALLABILITY_SOMATIC)]
    pub callability_levels_somatic: String,

    /// BED file with genome target regions subject to sequencing
    #[arg(long = "query_target", value_name = "BED")]
    pub query_target: Option<PathBuf>,

    /// Reference genome FASTA (required for CRAM input)
    #[arg(long = "ref_fasta", value_name = "FASTA")]
    pub ref_fasta: Option<PathBuf>,

    /// Alignment comes from RNA-seq rather than DNA sequencing
    #[arg(long = "is_rna")]
    pub is_rna: bool,

    /// Overwrite existing result files instead of failing
    #[arg(long = "force_overwrite")]
    pub force_overwrite: bool,

    /// Run cacao.py from PATH instead of inside the container
    #[arg(long = "no-docker")]
    pub no_docker: bool,
}

impl InvocationRequest {
    /// `<sample_id>_<assembly>_coverage_cacao.html`
    pub fn report_name(&self) -> String {
        format!("{}_{}_{}", self.sample_id, self.genome_assembly, REPORT_SUFFIX)
    }
}

/// A file on the host, split the way it is mounted and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostFile {
    pub dir: PathBuf,
    pub basename: String,
}

impl HostFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.basename)
    }
}

/// Validated, absolute view of the request's paths.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPaths {
    pub track_dir: PathBuf,
    pub output_dir: PathBuf,
    pub report: PathBuf,
    pub alignment: HostFile,
    pub format: AlignmentFormat,
    pub alignment_index_basename: String,
    pub target: Option<HostFile>,
    pub reference: Option<HostFile>,
}

impl ResolvedPaths {
    pub fn alignment_index(&self) -> PathBuf {
        self.alignment.dir.join(&self.alignment_index_basename)
    }

    pub fn target_basename(&self) -> &str {
        self.target.as_ref().map_or(NA, |t| t.basename.as_str())
    }
}

/// Scalar settings forwarded verbatim to cacao.py.
#[derive(Debug, Clone)]
pub struct ToolParams {
    pub genome_assembly: GenomeAssembly,
    pub mode: Mode,
    pub sample_id: String,
    pub mapq: u32,
    pub threads: u32,
    pub callability_levels_germline: String,
    pub callability_levels_somatic: String,
}

impl From<&InvocationRequest> for ToolParams {
    fn from(r: &InvocationRequest) -> Self {
        Self {
            genome_assembly: r.genome_assembly,
            mode: r.mode,
            sample_id: r.sample_id.clone(),
            mapq: r.mapq,
            threads: r.threads,
            callability_levels_germline: r.callability_levels_germline.clone(),
            callability_levels_somatic: r.callability_levels_somatic.clone(),
        }
    }
}

impl ToolParams {
    /// assembly, mode, sample id, mapq, threads, germline and somatic levels.
    pub fn positional(&self) -> Vec<String> {
        vec![
            self.genome_assembly.to_string(),
            self.mode.to_string(),
            self.sample_id.clone(),
            self.mapq.to_string(),
            self.threads.to_string(),
            self.callability_levels_germline.clone(),
            self.callability_levels_somatic.clone(),
        ]
    }
}
