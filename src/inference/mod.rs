use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{
    ContainerPaths, DEHAZED_SOCKET_SLUG, Device, HAZY_SOCKET_SLUG, output_file_for,
};
use crate::input::frame::{Frame, load_frame, write_frame_mha};
use crate::input::manifest::{SocketValue, load_manifest};
use crate::input::{InputError, VOLUME_EXTENSIONS, list_files};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no handler for interface {0:?}")]
    UnsupportedInterface(Vec<String>),
}

/// The model seam: maps a hazy frame to a dehazed one of the same layout.
pub trait Dehazer {
    fn name(&self) -> &'static str;
    fn dehaze(&self, frame: &Frame) -> Frame;
}

/// Placeholder model that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDehazer;

impl Dehazer for IdentityDehazer {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn dehaze(&self, frame: &Frame) -> Frame {
        frame.clone()
    }
}

pub type Handler = fn(&ContainerPaths, &dyn Dehazer) -> Result<usize, InferenceError>;

/// Sorted socket slugs of the manifest.
pub fn interface_key(values: &[SocketValue]) -> Vec<String> {
    let mut slugs: Vec<String> = values.iter().map(|v| v.interface.slug.clone()).collect();
    slugs.sort();
    slugs
}

pub fn lookup_handler(key: &[String]) -> Result<Handler, InferenceError> {
    match key {
        [slug] if slug == HAZY_SOCKET_SLUG => Ok(interface_0_handler),
        _ => Err(InferenceError::UnsupportedInterface(key.to_vec())),
    }
}

pub fn run(paths: &ContainerPaths, dehazer: &dyn Dehazer, device: Device) -> Result<usize, InferenceError> {
    tracing::info!("inference device: {}", device.as_str());
    let manifest = load_manifest(&paths.manifest())?;
    for socket in &manifest {
        tracing::debug!(
            "socket {} ({})",
            socket.interface.slug,
            socket.interface.kind.as_deref().unwrap_or("unknown kind")
        );
    }
    let key = interface_key(&manifest);
    tracing::info!("interface key: {:?}", key);
    let handler = lookup_handler(&key)?;
    handler(paths, dehazer)
}

/// Input files of the hazy socket, sorted so outputs keep input order.
pub fn list_volume_inputs(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    list_files(dir, VOLUME_EXTENSIONS)
}

pub fn interface_0_handler(paths: &ContainerPaths, dehazer: &dyn Dehazer) -> Result<usize, InferenceError> {
    let input_dir = paths.socket_input_dir(HAZY_SOCKET_SLUG);
    let output_dir = paths.socket_output_dir(DEHAZED_SOCKET_SLUG);
    fs::create_dir_all(&output_dir)?;

    let inputs = list_volume_inputs(&input_dir)?;
    tracing::info!(
        "{} input images in {} (model: {})",
        inputs.len(),
        input_dir.display(),
        dehazer.name()
    );

    for path in &inputs {
        let frame = load_frame(path)?;
        let (h, w, c) = frame.dim();
        tracing::info!("{} -> [{}, {}, {}]", path.display(), h, w, c);
        let result = dehazer.dehaze(&frame);
        write_prediction(&output_dir, path, &result)?;
    }
    Ok(inputs.len())
}

/// Writes `<output_dir>/<input file name>/output.mha`, zlib-compressed.
pub fn write_prediction(output_dir: &Path, input_file: &Path, frame: &Frame) -> Result<PathBuf, InferenceError> {
    let target = output_file_for(output_dir, input_file);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    write_frame_mha(&target, frame, true)?;
    Ok(target)
}

#[cfg(test)]
#[path = "../../tests/src_inline/inference/tests.rs"]
mod tests;
