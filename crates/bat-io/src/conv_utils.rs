/// Utility function to convert 16-bit `Vec<u8>` to `Vec<u16>`
pub fn convert_buf_u8_u16(buf: Vec<u8>) -> Vec<u16> {
    buf.chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

pub fn convert_buf_u16_u8(buf: &[u16]) -> Vec<u8> {
    buf.iter().flat_map(|v| v.to_be_bytes()).collect()
}

// map [0, 1] to the full u16 range, NaN becomes 0
pub fn convert_f32_unit_u16(v: f32) -> u16 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_be_bytes() {
        let bytes = convert_buf_u16_u8(&[0x0102, 0xff00]);
        assert_eq!(bytes, vec![1, 2, 0xff, 0]);
        assert_eq!(convert_buf_u8_u16(bytes), vec![0x0102, 0xff00]);
    }

    #[test]
    fn test_f32_unit_u16() {
        assert_eq!(convert_f32_unit_u16(-1.0), 0);
        assert_eq!(convert_f32_unit_u16(0.0), 0);
        assert_eq!(convert_f32_unit_u16(1.0), u16::MAX);
        assert_eq!(convert_f32_unit_u16(7.0), u16::MAX);
        assert_eq!(convert_f32_unit_u16(f32::NAN), 0);
    }
}
