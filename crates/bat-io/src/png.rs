use std::{fs, fs::File, path::Path};

use bat_image::{Image, ImageSize};
use png::{BitDepth, ColorType, Decoder, Encoder};

use crate::conv_utils::{convert_buf_u16_u8, convert_buf_u8_u16, convert_f32_unit_u16};
use crate::error::IoError;

/// Read a PNG image with a four channels (rgba16).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A RGBA image with four channels (rgba16).
pub fn read_image_png_rgba16(file_path: impl AsRef<Path>) -> Result<Image<u16, 4>, IoError> {
    let (buf, size, color_type, depth) = read_png_impl(file_path)?;
    if color_type != ColorType::Rgba || depth != BitDepth::Sixteen {
        return Err(IoError::PngDecodeError(format!(
            "expected a 16-bit RGBA image, found {color_type:?} with {depth:?} bits"
        )));
    }

    Ok(Image::new(size, convert_buf_u8_u16(buf))?)
}

/// Writes the given PNG _(rgba16)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image containing the PNG image data.
pub fn write_image_png_rgba16(
    file_path: impl AsRef<Path>,
    image: &Image<u16, 4>,
) -> Result<(), IoError> {
    let image_buf = convert_buf_u16_u8(image.as_slice());
    write_png_impl(
        file_path,
        &image_buf,
        image.size(),
        BitDepth::Sixteen,
        ColorType::Rgba,
    )
}

/// Writes a floating point RGBA image as a 16-bit PNG.
///
/// Samples are clamped to `[0, 1]` and scaled to the full 16-bit range; NaN
/// samples are written as zero.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - A render pass or annotation mask with samples in `[0, 1]`.
pub fn write_image_png_rgba_f32(
    file_path: impl AsRef<Path>,
    image: &Image<f32, 4>,
) -> Result<(), IoError> {
    write_image_png_rgba16(file_path, &image.map(|v| convert_f32_unit_u16(*v)))
}

// utility function to read the png file
fn read_png_impl(
    file_path: impl AsRef<Path>,
) -> Result<(Vec<u8>, ImageSize, ColorType, BitDepth), IoError> {
    // verify the file exists
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let file = fs::File::open(file_path)?;
    let mut reader = Decoder::new(file)
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let size = [info.width as usize, info.height as usize].into();
    Ok((buf, size, info.color_type, info.bit_depth))
}

fn write_png_impl(
    file_path: impl AsRef<Path>,
    image_data: &[u8],
    image_size: ImageSize,
    // Make sure you set `depth` correctly
    depth: BitDepth,
    color_type: ColorType,
) -> Result<(), IoError> {
    let file = File::create(file_path)?;

    let mut encoder = Encoder::new(file, image_size.width as u32, image_size.height as u32);
    encoder.set_color(color_type);
    encoder.set_depth(depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_png_rgba16() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("mask-rgba16.png");

        let image = Image::<u16, 4>::from_fn([5, 3].into(), |x, y| {
            [x as u16 * 1000, y as u16 * 20000, 65535, 1]
        });
        write_image_png_rgba16(&file_path, &image)?;

        let image_back = read_image_png_rgba16(&file_path)?;
        assert_eq!(image_back, image);
        Ok(())
    }

    #[test]
    fn write_png_rgba_f32() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("render.png");

        let image = Image::<f32, 4>::new(
            [2, 1].into(),
            vec![0.0, 0.5, 1.0, 1.0, -0.5, 2.0, f32::NAN, 1.0],
        )?;
        write_image_png_rgba_f32(&file_path, &image)?;

        let image_back = read_image_png_rgba16(&file_path)?;
        assert_eq!(
            image_back.as_slice(),
            &[0, 32768, 65535, 65535, 0, 65535, 0, 65535]
        );
        Ok(())
    }

    #[test]
    fn read_png_missing_file() {
        let res = read_image_png_rgba16("/definitely/not/here.png");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }
}
