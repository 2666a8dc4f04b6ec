use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::input::InputError;

#[derive(Debug, Clone, Deserialize)]
pub struct SocketInterface {
    pub slug: String,
    #[serde(default)]
    pub kind: Option<String>,
}

/// One entry of the platform-generated `inputs.json`. Only the interface
/// selects a handler; the remaining fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketValue {
    pub interface: SocketInterface,
}

pub fn load_manifest(path: &Path) -> Result<Vec<SocketValue>, InputError> {
    if !path.is_file() {
        return Err(InputError::MissingInput(format!(
            "inputs manifest not found: {}",
            path.display()
        )));
    }
    let text = fs::read_to_string(path)?;
    parse_manifest(&text)
}

pub fn parse_manifest(text: &str) -> Result<Vec<SocketValue>, InputError> {
    Ok(serde_json::from_str(text)?)
}
