use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DatasetIoError;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGNMENT: usize = 64;

/// The element data of an npy array.
#[derive(Debug, Clone, PartialEq)]
pub enum NpyData {
    /// Little endian 64-bit floats, `<f8`.
    F64(Vec<f64>),
    /// Unsigned bytes, `|u1`.
    U8(Vec<u8>),
}

impl NpyData {
    fn descr(&self) -> &'static str {
        match self {
            NpyData::F64(_) => "<f8",
            NpyData::U8(_) => "|u1",
        }
    }

    fn len(&self) -> usize {
        match self {
            NpyData::F64(v) => v.len(),
            NpyData::U8(v) => v.len(),
        }
    }
}

/// A C-ordered n-dimensional array as stored in an `.npy` file.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    /// The array shape.
    pub shape: Vec<usize>,
    /// The flattened elements.
    pub data: NpyData,
}

impl NpyArray {
    /// Create a float array, checking the element count against the shape.
    pub fn from_f64(shape: &[usize], data: Vec<f64>) -> Result<Self, DatasetIoError> {
        Self::new(shape, NpyData::F64(data))
    }

    /// Create a byte array, checking the element count against the shape.
    pub fn from_u8(shape: &[usize], data: Vec<u8>) -> Result<Self, DatasetIoError> {
        Self::new(shape, NpyData::U8(data))
    }

    fn new(shape: &[usize], data: NpyData) -> Result<Self, DatasetIoError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(DatasetIoError::NpyError(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// The float elements, if this is a `<f8` array.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            NpyData::F64(v) => Some(v),
            NpyData::U8(_) => None,
        }
    }

    /// The byte elements, if this is a `|u1` array.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            NpyData::U8(v) => Some(v),
            NpyData::F64(_) => None,
        }
    }

    /// Serialize the array as an npy version 1.0 file.
    pub fn to_npy_bytes(&self) -> Vec<u8> {
        let shape = match self.shape.as_slice() {
            [n] => format!("({n},)"),
            dims => format!(
                "({})",
                dims.iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
            self.data.descr(),
            shape
        );
        // magic + version + header length + header + newline is a multiple of 64
        let preamble = NPY_MAGIC.len() + 2 + 2;
        let padding = NPY_ALIGNMENT - (preamble + header.len() + 1) % NPY_ALIGNMENT;
        header.push_str(&" ".repeat(padding % NPY_ALIGNMENT));
        header.push('\n');

        let mut out = Vec::with_capacity(preamble + header.len() + self.data.len() * 8);
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        match &self.data {
            NpyData::F64(values) => {
                for v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            NpyData::U8(values) => out.extend_from_slice(values),
        }
        out
    }

    /// Parse an npy file holding a C-ordered `<f8` or `|u1` array.
    pub fn from_npy_bytes(bytes: &[u8]) -> Result<Self, DatasetIoError> {
        let err = |msg: &str| DatasetIoError::NpyError(msg.to_string());

        if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
            return Err(err("missing magic string"));
        }
        let (header_len, header_start) = match bytes[6] {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 if bytes.len() >= 12 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            _ => return Err(err("unsupported version")),
        };
        let data_start = header_start + header_len;
        let header = bytes
            .get(header_start..data_start)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| err("truncated header"))?;

        if header.contains("'fortran_order': True") {
            return Err(err("fortran order is not supported"));
        }
        let descr = header_field(header, "'descr':")
            .map(|v| v.trim_matches(|c| c == '\'' || c == ' '))
            .ok_or_else(|| err("missing descr"))?;
        let shape = parse_shape(header).ok_or_else(|| err("missing shape"))?;

        let payload = &bytes[data_start..];
        let data = match descr {
            "<f8" => {
                if payload.len() % 8 != 0 {
                    return Err(err("float payload is not a multiple of 8 bytes"));
                }
                NpyData::F64(
                    payload
                        .chunks_exact(8)
                        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                        .collect(),
                )
            }
            "|u1" | "<u1" => NpyData::U8(payload.to_vec()),
            other => return Err(DatasetIoError::NpyError(format!("unsupported dtype {other}"))),
        };

        Self::new(&shape, data)
    }
}

fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let start = header.find(key)? + key.len();
    let rest = &header[start..];
    let end = rest.find(',')?;
    Some(&rest[..end])
}

fn parse_shape(header: &str) -> Option<Vec<usize>> {
    let start = header.find("'shape':")?;
    let rest = &header[start..];
    let open = rest.find('(')?;
    let close = rest.find(')')?;
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Writes named arrays into a deflate-compressed `.npz` archive.
pub struct NpzWriter {
    zip: ZipWriter<BufWriter<File>>,
    options: SimpleFileOptions,
}

impl NpzWriter {
    /// Create the archive file.
    pub fn create(file_path: impl AsRef<Path>) -> Result<Self, DatasetIoError> {
        let file = BufWriter::new(File::create(file_path)?);
        Ok(Self {
            zip: ZipWriter::new(file),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        })
    }

    /// Add an array stored as `<name>.npy`.
    pub fn add_array(&mut self, name: &str, array: &NpyArray) -> Result<(), DatasetIoError> {
        self.zip.start_file(format!("{name}.npy"), self.options)?;
        self.zip.write_all(&array.to_npy_bytes())?;
        Ok(())
    }

    /// Write the central directory and close the archive.
    pub fn finish(self) -> Result<(), DatasetIoError> {
        let mut file = self.zip.finish()?;
        file.flush()?;
        Ok(())
    }
}

/// Read every array of an `.npz` archive, keyed by name without the `.npy` suffix.
pub fn read_npz(file_path: impl AsRef<Path>) -> Result<BTreeMap<String, NpyArray>, DatasetIoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(DatasetIoError::FileDoesNotExist(file_path.to_path_buf()));
    }
    let mut archive = ZipArchive::new(File::open(file_path)?)?;

    let mut arrays = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().trim_end_matches(".npy").to_string();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        arrays.insert(name, NpyArray::from_npy_bytes(&bytes)?);
    }
    Ok(arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_alignment() -> Result<(), DatasetIoError> {
        let array = NpyArray::from_f64(&[4, 4], vec![0.0; 16])?;
        let bytes = array.to_npy_bytes();
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 16 * 8);

        let header = std::str::from_utf8(&bytes[10..10 + header_len]).map_err(|e| {
            DatasetIoError::NpyError(e.to_string())
        })?;
        assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (4, 4), }"));
        Ok(())
    }

    #[test]
    fn test_one_dimensional_shape() -> Result<(), DatasetIoError> {
        let array = NpyArray::from_f64(&[1], vec![2666.5])?;
        let bytes = array.to_npy_bytes();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("'shape': (1,)"));
        assert_eq!(NpyArray::from_npy_bytes(&bytes)?, array);
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(NpyArray::from_u8(&[2, 2], vec![0; 3]).is_err());
    }

    #[test]
    fn test_archive_roundtrip() -> Result<(), DatasetIoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("cameras.npz");

        let world = NpyArray::from_f64(&[4, 4], (0..16).map(|v| v as f64).collect())?;
        let images = NpyArray::from_u8(&[1, 2, 2, 3], (0..12).collect())?;

        let mut writer = NpzWriter::create(&path)?;
        writer.add_array("world_mat_0", &world)?;
        writer.add_array("images", &images)?;
        writer.finish()?;

        let arrays = read_npz(&path)?;
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays.get("world_mat_0"), Some(&world));
        assert_eq!(arrays.get("images").and_then(|a| a.as_u8()), images.as_u8());
        Ok(())
    }
}
