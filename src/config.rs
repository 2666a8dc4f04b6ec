use std::path::{Path, PathBuf};

use clap::ValueEnum;

pub const DEFAULT_GROUND_TRUTH_DIR: &str = "/opt/ml/input/data/ground_truth";
pub const DEFAULT_INPUT_DIR: &str = "/input";
pub const DEFAULT_OUTPUT_DIR: &str = "/output";

pub const CLEAN_SUBDIR: &str = "clean";
pub const HAZY_SOCKET_SLUG: &str = "hazy-cardiac-ultrasound";
pub const DEHAZED_SOCKET_SLUG: &str = "dehazed-cardiac-ultrasound";
pub const INPUTS_MANIFEST: &str = "inputs.json";
pub const OUTPUT_FILE_NAME: &str = "output.mha";

/// Compute device handed to the feature extractor. Chosen by configuration,
/// never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

/// Filesystem layout of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalPaths {
    pub predictions: PathBuf,
    pub hazy: PathBuf,
    pub masks: PathBuf,
    pub ground_truth: PathBuf,
    pub out_dir: PathBuf,
}

/// Filesystem layout of the inference container.
#[derive(Debug, Clone)]
pub struct ContainerPaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ContainerPaths {
    pub fn manifest(&self) -> PathBuf {
        self.input.join(INPUTS_MANIFEST)
    }

    pub fn socket_input_dir(&self, slug: &str) -> PathBuf {
        self.input.join("images").join(slug)
    }

    pub fn socket_output_dir(&self, slug: &str) -> PathBuf {
        self.output.join("images").join(slug)
    }
}

impl Default for ContainerPaths {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

pub fn output_file_for(output_dir: &Path, input_file: &Path) -> PathBuf {
    let name = input_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    output_dir.join(name).join(OUTPUT_FILE_NAME)
}
