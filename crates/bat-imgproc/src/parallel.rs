use rayon::prelude::*;

use bat_image::Image;

/// Apply a function to each pixel for lookup-table sampling in parallel.
///
/// `map` holds one `(y, x)` source coordinate per destination pixel and must
/// have the size of `dst`.
pub fn par_iter_rows_resample<T, const C: usize>(
    dst: &mut Image<T, C>,
    map: &Image<f64, 2>,
    f: impl Fn(f64, f64, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map.as_slice().par_chunks_exact(2 * cols))
        .for_each(|(dst_chunk, map_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_chunk.chunks_exact(2))
                .for_each(|(dst_pixel, yx)| {
                    f(yx[0], yx[1], dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bat_image::ImageError;

    #[test]
    fn test_par_iter_rows_resample() -> Result<(), ImageError> {
        let map = Image::<f64, 2>::new([2, 1].into(), vec![0.0, 1.0, 5.0, 7.0])?;
        let mut dst = Image::<f64, 1>::from_size_val([2, 1].into(), 0.0);
        par_iter_rows_resample(&mut dst, &map, |y, x, d| d[0] = y * 10.0 + x);
        assert_eq!(dst.as_slice(), &[1.0, 57.0]);
        Ok(())
    }

    #[test]
    fn test_par_iter_rows_resample_empty() {
        let map = Image::<f64, 2>::from_size_val([0, 0].into(), 0.0);
        let mut dst = Image::<f64, 3>::from_size_val([0, 0].into(), 0.0);
        par_iter_rows_resample(&mut dst, &map, |_, _, _| {});
        assert!(dst.as_slice().is_empty());
    }
}
