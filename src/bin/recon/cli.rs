#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "recon", about = "Perform non-Cartesian CG-SENSE reconstruction with l2 regularization")]
pub struct Cli {

    /// Basename of the k-space trajectory (.cfl/.hdr pair)
    pub trajectory: PathBuf,

    /// Basename of the raw multi-coil k-space data
    pub rawdata: PathBuf,

    /// Basename of the coil sensitivity maps
    pub sens: PathBuf,

    /// Basename for the reconstructed image
    pub output: PathBuf,

    /// Maximum number of CG iterations
    #[clap(short = 'i', long)]
    pub iterations: Option<usize>,

    /// l2 regularization parameter
    #[clap(short = 'r', long)]
    pub l2: Option<f32>,

    /// Stop early once the relative residual drops below this value
    #[clap(short = 't', long)]
    pub tolerance: Option<f32>,

    /// TOML file with reconstruction settings; flags take precedence
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
