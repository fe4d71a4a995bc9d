/// Number of distinct instance colors.
pub const NUM_INSTANCE_COLORS: usize = 69;

/// The finite sequence of colors handed out to object instances.
///
/// For every intensity `v` in `230, 220, ..., 10` (out of 255) the palette
/// yields `(0, v, v)`, `(v, 0, v)` and `(v, v, 0)`, all opaque. Once the
/// colors run out the iterator returns `None`; callers must handle that case
/// explicitly.
///
/// # Example
///
/// ```
/// use bat_scene::palette::InstancePalette;
///
/// let mut palette = InstancePalette::new();
/// assert_eq!(palette.len(), 69);
/// assert_eq!(palette.next(), Some([0.0, 230.0 / 255.0, 230.0 / 255.0, 1.0]));
/// assert_eq!(palette.nth(67), Some([10.0 / 255.0, 10.0 / 255.0, 0.0, 1.0]));
/// assert_eq!(palette.next(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstancePalette {
    index: usize,
}

impl InstancePalette {
    /// Create a palette positioned at its first color.
    pub fn new() -> Self {
        Self::default()
    }

    /// The color at position `index` of the palette.
    pub fn color(index: usize) -> Option<[f32; 4]> {
        if index >= NUM_INSTANCE_COLORS {
            return None;
        }
        let v = (230 - 10 * (index / 3) as u32) as f32 / 255.0;
        Some(match index % 3 {
            0 => [0.0, v, v, 1.0],
            1 => [v, 0.0, v, 1.0],
            _ => [v, v, 0.0, 1.0],
        })
    }
}

impl Iterator for InstancePalette {
    type Item = [f32; 4];

    fn next(&mut self) -> Option<Self::Item> {
        let color = Self::color(self.index)?;
        self.index += 1;
        Some(color)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = NUM_INSTANCE_COLORS.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for InstancePalette {}
