use bat_image::ImageSize;

/// Create a meshgrid of coordinates by evaluating `f(row, col)`.
///
/// # Arguments
///
/// * `rows` - The number of rows indicating the height of the grid
/// * `cols` - The number of columns indicating the width of the grid
/// * `f` - Maps a grid index to the stored value
///
/// # Returns
///
/// The values in row-major order.
pub fn meshgrid_from_fn<T>(rows: usize, cols: usize, f: impl Fn(usize, usize) -> T) -> Vec<T> {
    let mut grid = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            grid.push(f(r, c));
        }
    }
    grid
}

/// Create an oversampled grid of `[y, x]` pixel coordinates.
///
/// The grid has `size.height * factor` rows and `size.width * factor` columns,
/// and the coordinates are expressed in the pixel units of `size`, i.e. the
/// sample at index `(r, c)` is `[r / factor, c / factor]`.
///
/// # Example
///
/// ```
/// use bat_imgproc::interpolation::grid::oversampled_meshgrid;
///
/// let grid = oversampled_meshgrid([2, 1].into(), 2);
/// assert_eq!(grid.len(), 8);
/// assert_eq!(grid[1], [0.0, 0.5]);
/// assert_eq!(grid[4], [0.5, 0.0]);
/// ```
pub fn oversampled_meshgrid(size: ImageSize, factor: usize) -> Vec<[f64; 2]> {
    let f = factor as f64;
    meshgrid_from_fn(size.height * factor, size.width * factor, |r, c| {
        [r as f64 / f, c as f64 / f]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshgrid_from_fn() {
        let grid = meshgrid_from_fn(2, 3, |r, c| (r, c));
        assert_eq!(grid, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_oversampled_meshgrid_identity_factor() {
        let grid = oversampled_meshgrid([3, 2].into(), 1);
        assert_eq!(
            grid,
            vec![
                [0.0, 0.0],
                [0.0, 1.0],
                [0.0, 2.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [1.0, 2.0]
            ]
        );
    }

    #[test]
    fn test_oversampled_meshgrid_contains_original() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let grid = oversampled_meshgrid(size, 3);
        assert_eq!(grid.len(), 12 * 9);
        // every third sample of every third row is an original pixel center
        for r in 0..size.height {
            for c in 0..size.width {
                let idx = (r * 3) * (size.width * 3) + c * 3;
                assert_eq!(grid[idx], [r as f64, c as f64]);
            }
        }
    }
}
