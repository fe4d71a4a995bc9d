use std::{fs::File, io::Write, path::Path};

use bat_image::Image;

use crate::error::IoError;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

// magic, version and header length
const NPY_PREAMBLE_LEN: usize = NPY_MAGIC.len() + 2 + 2;

/// Writes a floating point image as a NumPy `.npy` array (format 1.0).
///
/// The array is little-endian `float32` in C order, with shape
/// `(height, width)` for single channel images and `(height, width, channels)`
/// otherwise.
///
/// # Arguments
///
/// - `file_path` - The path to the `.npy` file.
/// - `image` - The image to write, e.g. a depth pass.
pub fn write_image_npy_f32<const C: usize>(
    file_path: impl AsRef<Path>,
    image: &Image<f32, C>,
) -> Result<(), IoError> {
    let mut file = File::create(file_path)?;
    file.write_all(&npy_header(image.rows(), image.cols(), C))?;

    let data = image
        .as_slice()
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect::<Vec<u8>>();
    file.write_all(&data)?;
    Ok(())
}

fn npy_header(rows: usize, cols: usize, channels: usize) -> Vec<u8> {
    let shape = match channels {
        1 => format!("({rows}, {cols})"),
        c => format!("({rows}, {cols}, {c})"),
    };
    let mut dict = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {shape}, }}");

    // the data starts at a multiple of 64 bytes, the header ends with a newline
    let padding = (64 - (NPY_PREAMBLE_LEN + dict.len() + 1) % 64) % 64;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');

    let mut header = Vec::with_capacity(NPY_PREAMBLE_LEN + dict.len());
    header.extend_from_slice(NPY_MAGIC);
    header.extend_from_slice(&[1, 0]);
    header.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header
}
