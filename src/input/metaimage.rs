use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::input::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    UChar,
    Char,
    UShort,
    Short,
    UInt,
    Int,
    Float,
    Double,
}

impl ElementType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "MET_UCHAR" => Some(Self::UChar),
            "MET_CHAR" => Some(Self::Char),
            "MET_USHORT" => Some(Self::UShort),
            "MET_SHORT" => Some(Self::Short),
            "MET_UINT" => Some(Self::UInt),
            "MET_INT" => Some(Self::Int),
            "MET_FLOAT" => Some(Self::Float),
            "MET_DOUBLE" => Some(Self::Double),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UChar => "MET_UCHAR",
            Self::Char => "MET_CHAR",
            Self::UShort => "MET_USHORT",
            Self::Short => "MET_SHORT",
            Self::UInt => "MET_UINT",
            Self::Int => "MET_INT",
            Self::Float => "MET_FLOAT",
            Self::Double => "MET_DOUBLE",
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::UChar | Self::Char => 1,
            Self::UShort | Self::Short => 2,
            Self::UInt | Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Smallest type that stores every value losslessly.
    pub fn narrowest_for(values: &[f32]) -> Self {
        let integral = values.iter().all(|v| v.fract() == 0.0);
        if !integral {
            return Self::Float;
        }
        let (mut lo, mut hi) = (0f32, 0f32);
        for &v in values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo >= 0.0 && hi <= u8::MAX as f32 {
            Self::UChar
        } else if lo >= 0.0 && hi <= u16::MAX as f32 {
            Self::UShort
        } else if lo >= i16::MIN as f32 && hi <= i16::MAX as f32 {
            Self::Short
        } else {
            Self::Float
        }
    }
}

/// Decoded MetaImage. `dims` is in array order (slowest axis first), i.e. the
/// reverse of the header's `DimSize`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaImage {
    pub dims: Vec<usize>,
    pub channels: usize,
    pub element_type: ElementType,
    pub data: Vec<f32>,
}

impl MetaImage {
    /// `None` when the shape overflows `usize`.
    pub fn n_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(self.channels, |acc, &d| acc.checked_mul(d))
    }
}

#[derive(Debug, Default)]
struct Header {
    ndims: Option<usize>,
    dim_size: Option<Vec<usize>>,
    element_type: Option<ElementType>,
    channels: usize,
    msb: bool,
    compressed: bool,
    compressed_size: Option<usize>,
    data_file: Option<String>,
}

pub fn read_metaimage(path: &Path) -> Result<MetaImage, InputError> {
    let bytes = fs::read(path)?;
    decode_metaimage(&bytes)
}

pub fn decode_metaimage(bytes: &[u8]) -> Result<MetaImage, InputError> {
    let (header, data_start) = parse_header(bytes)?;

    match header.data_file.as_deref() {
        Some("LOCAL") => {}
        Some(other) => {
            return Err(InputError::InvalidInput(format!(
                "unsupported ElementDataFile {other}; only LOCAL is supported"
            )));
        }
        None => return Err(InputError::Parse("missing ElementDataFile".to_string())),
    }

    let dim_size = header
        .dim_size
        .ok_or_else(|| InputError::Parse("missing DimSize".to_string()))?;
    if let Some(ndims) = header.ndims {
        if ndims != dim_size.len() {
            return Err(InputError::Parse(format!(
                "NDims = {ndims} but DimSize has {} entries",
                dim_size.len()
            )));
        }
    }
    let element_type = header
        .element_type
        .ok_or_else(|| InputError::Parse("missing or unsupported ElementType".to_string()))?;
    let channels = header.channels.max(1);

    let mut dims = dim_size;
    dims.reverse();
    let n_bytes = byte_count(&dims, channels, element_type)?;

    let payload = &bytes[data_start..];
    let inflated;
    let raw: &[u8] = if header.compressed {
        let stream = match header.compressed_size {
            Some(size) if size <= payload.len() => &payload[..size],
            _ => payload,
        };
        // never inflate past the declared size
        let mut out = Vec::new();
        ZlibDecoder::new(stream)
            .take(n_bytes as u64)
            .read_to_end(&mut out)?;
        inflated = out;
        &inflated
    } else {
        payload
    };

    if raw.len() < n_bytes {
        return Err(InputError::InvalidInput(format!(
            "element data too short: expected {n_bytes} bytes, found {}",
            raw.len()
        )));
    }

    let data = decode_elements(&raw[..n_bytes], element_type, header.msb);
    Ok(MetaImage {
        dims,
        channels,
        element_type,
        data,
    })
}

/// Payload size in bytes; overflow means a malformed header.
fn byte_count(dims: &[usize], channels: usize, element_type: ElementType) -> Result<usize, InputError> {
    dims.iter()
        .try_fold(channels, |acc, &d| acc.checked_mul(d))
        .and_then(|n| n.checked_mul(element_type.size()))
        .ok_or_else(|| {
            InputError::InvalidInput(format!(
                "DimSize {dims:?} x {channels} channels overflows the addressable size"
            ))
        })
}

fn parse_header(bytes: &[u8]) -> Result<(Header, usize), InputError> {
    let mut header = Header::default();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i)
            .unwrap_or(bytes.len());
        let line = std::str::from_utf8(&bytes[pos..end])
            .map_err(|_| InputError::Parse("non UTF-8 header line".to_string()))?
            .trim();
        pos = (end + 1).min(bytes.len());
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(InputError::Parse(format!("malformed header line: {line}")));
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "NDims" => header.ndims = Some(parse_usize(key, value)?),
            "DimSize" => {
                let dims = value
                    .split_whitespace()
                    .map(|v| parse_usize(key, v))
                    .collect::<Result<Vec<_>, _>>()?;
                header.dim_size = Some(dims);
            }
            "ElementType" => header.element_type = ElementType::parse(value),
            "ElementNumberOfChannels" => header.channels = parse_usize(key, value)?,
            "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                header.msb = parse_bool(value);
            }
            "CompressedData" => header.compressed = parse_bool(value),
            "CompressedDataSize" => header.compressed_size = Some(parse_usize(key, value)?),
            "ElementDataFile" => {
                header.data_file = Some(value.to_string());
                return Ok((header, pos));
            }
            _ => {}
        }
    }
    Err(InputError::Parse(
        "header ended before ElementDataFile".to_string(),
    ))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, InputError> {
    value
        .parse::<usize>()
        .map_err(|_| InputError::Parse(format!("invalid {key} value: {value}")))
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn decode_elements(raw: &[u8], element_type: ElementType, msb: bool) -> Vec<f32> {
    let size = element_type.size();
    let mut out = Vec::with_capacity(raw.len() / size);
    for chunk in raw.chunks_exact(size) {
        let v = match element_type {
            ElementType::UChar => chunk[0] as f32,
            ElementType::Char => chunk[0] as i8 as f32,
            ElementType::UShort => {
                let b = [chunk[0], chunk[1]];
                (if msb { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) }) as f32
            }
            ElementType::Short => {
                let b = [chunk[0], chunk[1]];
                (if msb { i16::from_be_bytes(b) } else { i16::from_le_bytes(b) }) as f32
            }
            ElementType::UInt => {
                let b = [chunk[0], chunk[1], chunk[2], chunk[3]];
                (if msb { u32::from_be_bytes(b) } else { u32::from_le_bytes(b) }) as f32
            }
            ElementType::Int => {
                let b = [chunk[0], chunk[1], chunk[2], chunk[3]];
                (if msb { i32::from_be_bytes(b) } else { i32::from_le_bytes(b) }) as f32
            }
            ElementType::Float => {
                let b = [chunk[0], chunk[1], chunk[2], chunk[3]];
                if msb { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) }
            }
            ElementType::Double => {
                let mut b = [0u8; 8];
                b.copy_from_slice(chunk);
                (if msb { f64::from_be_bytes(b) } else { f64::from_le_bytes(b) }) as f32
            }
        };
        out.push(v);
    }
    out
}

fn encode_elements(values: &[f32], element_type: ElementType) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * element_type.size());
    for &v in values {
        match element_type {
            ElementType::UChar => out.push(v as u8),
            ElementType::Char => out.push(v as i8 as u8),
            ElementType::UShort => out.extend_from_slice(&(v as u16).to_le_bytes()),
            ElementType::Short => out.extend_from_slice(&(v as i16).to_le_bytes()),
            ElementType::UInt => out.extend_from_slice(&(v as u32).to_le_bytes()),
            ElementType::Int => out.extend_from_slice(&(v as i32).to_le_bytes()),
            ElementType::Float => out.extend_from_slice(&v.to_le_bytes()),
            ElementType::Double => out.extend_from_slice(&(v as f64).to_le_bytes()),
        }
    }
    out
}

pub fn encode_metaimage(image: &MetaImage, compress: bool) -> Result<Vec<u8>, InputError> {
    if image.n_elements() != Some(image.data.len()) {
        return Err(InputError::InvalidInput(format!(
            "data has {} elements but dims {:?} x {} channels disagree",
            image.data.len(),
            image.dims,
            image.channels
        )));
    }
    let raw = encode_elements(&image.data, image.element_type);
    let payload = if compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        encoder.finish()?
    } else {
        raw
    };

    let ndims = image.dims.len();
    let dim_size = image
        .dims
        .iter()
        .rev()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let ones = vec!["1"; ndims].join(" ");
    let zeros = vec!["0"; ndims].join(" ");
    let mut identity = Vec::with_capacity(ndims * ndims);
    for r in 0..ndims {
        for c in 0..ndims {
            identity.push(if r == c { "1" } else { "0" });
        }
    }

    let mut header = String::new();
    header.push_str("ObjectType = Image\n");
    header.push_str(&format!("NDims = {ndims}\n"));
    header.push_str("BinaryData = True\n");
    header.push_str("BinaryDataByteOrderMSB = False\n");
    if compress {
        header.push_str("CompressedData = True\n");
        header.push_str(&format!("CompressedDataSize = {}\n", payload.len()));
    } else {
        header.push_str("CompressedData = False\n");
    }
    header.push_str(&format!("TransformMatrix = {}\n", identity.join(" ")));
    header.push_str(&format!("Offset = {zeros}\n"));
    header.push_str(&format!("CenterOfRotation = {zeros}\n"));
    header.push_str(&format!("ElementSpacing = {ones}\n"));
    header.push_str(&format!("DimSize = {dim_size}\n"));
    if image.channels > 1 {
        header.push_str(&format!("ElementNumberOfChannels = {}\n", image.channels));
    }
    header.push_str(&format!("ElementType = {}\n", image.element_type.name()));
    header.push_str("ElementDataFile = LOCAL\n");

    let mut out = header.into_bytes();
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn write_metaimage(path: &Path, image: &MetaImage, compress: bool) -> Result<(), InputError> {
    let bytes = encode_metaimage(image, compress)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/metaimage.rs"]
mod tests;
