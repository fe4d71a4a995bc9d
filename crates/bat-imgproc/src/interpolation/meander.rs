use bat_image::{Image, ImageError};

/// The axis a meandering sweep walks along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAxis {
    /// Walk the grid row by row.
    Rows,
    /// Walk the grid column by column.
    Columns,
}

/// The direction of a meandering sweep.
///
/// A sweep reverses every second line so that consecutive lines connect end
/// to end. `Forward` walks the first line left to right (odd lines are
/// reversed), `Backward` walks it right to left (even lines are reversed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// The first line is walked in increasing index order.
    Forward,
    /// The first line is walked in decreasing index order.
    Backward,
}

impl SweepDirection {
    fn reverses(self, line: usize) -> bool {
        match self {
            SweepDirection::Forward => line % 2 == 1,
            SweepDirection::Backward => line % 2 == 0,
        }
    }
}

/// Interpolate missing values of a grid along a meandering path.
///
/// The grid is flattened following a boustrophedon path along `axis`, and the
/// resulting 1D signal is linearly interpolated between consecutive valid
/// samples. Positions before the first or after the last valid sample of the
/// path cannot be estimated and are NaN.
///
/// Each estimate comes with a confidence weight `(1 / (1 + d))^falloff`, where
/// `d` is the path distance to the closest valid sample.
///
/// # Arguments
///
/// * `values` - Grid with missing/incorrect values.
/// * `mask` - `true` where the value in `values` is reliable.
/// * `axis` - Walk the grid by rows or by columns.
/// * `direction` - Which lines of the meander are reversed.
/// * `falloff` - How fast the weight decays with distance (1 = linear).
///
/// # Returns
///
/// The estimates and the weights, both with the shape of `values`.
///
/// # Errors
///
/// If `values` and `mask` differ in size.
pub fn interpolate_axis(
    values: &Image<f64, 1>,
    mask: &Image<bool, 1>,
    axis: SweepAxis,
    direction: SweepDirection,
    falloff: i32,
) -> Result<(Image<f64, 1>, Image<f64, 1>), ImageError> {
    if values.size() != mask.size() {
        return Err(ImageError::InvalidImageSize(
            mask.width(),
            mask.height(),
            values.width(),
            values.height(),
        ));
    }

    match axis {
        SweepAxis::Rows => meander_rows(values, mask, direction, falloff),
        SweepAxis::Columns => {
            let (estimates, weights) =
                meander_rows(&values.transpose(), &mask.transpose(), direction, falloff)?;
            Ok((estimates.transpose(), weights.transpose()))
        }
    }
}

/// Fill missing elements by combining meandering sweeps in all four directions.
///
/// Cells marked valid in `mask` keep their value bit for bit. Every other cell
/// is the weighted average of the sweeps that could estimate it; if none of
/// the four sweeps reached the cell it stays NaN.
///
/// # Arguments
///
/// * `values` - Grid with missing/incorrect values.
/// * `mask` - `true` where the value in `values` is reliable.
/// * `falloff` - How fast the sweep weights decay with distance (1 = linear).
///
/// # Example
///
/// ```
/// use bat_image::Image;
/// use bat_imgproc::interpolation::fill_missing_values;
///
/// let values = Image::<f64, 1>::new([3, 1].into(), vec![0.0, 0.0, 2.0]).unwrap();
/// let mask = Image::<bool, 1>::new([3, 1].into(), vec![true, false, true]).unwrap();
///
/// let filled = fill_missing_values(&values, &mask, 1).unwrap();
/// assert_eq!(filled.as_slice(), &[0.0, 1.0, 2.0]);
/// ```
pub fn fill_missing_values(
    values: &Image<f64, 1>,
    mask: &Image<bool, 1>,
    falloff: i32,
) -> Result<Image<f64, 1>, ImageError> {
    let sweep = |axis, direction| interpolate_axis(values, mask, axis, direction, falloff);

    let ((rows_fwd, rows_bwd), (cols_fwd, cols_bwd)) = rayon::join(
        || {
            rayon::join(
                || sweep(SweepAxis::Rows, SweepDirection::Forward),
                || sweep(SweepAxis::Rows, SweepDirection::Backward),
            )
        },
        || {
            rayon::join(
                || sweep(SweepAxis::Columns, SweepDirection::Forward),
                || sweep(SweepAxis::Columns, SweepDirection::Backward),
            )
        },
    );
    let sweeps = [rows_fwd?, rows_bwd?, cols_fwd?, cols_bwd?];

    let mut filled = values.clone();
    for (i, (value, valid)) in filled
        .as_slice_mut()
        .iter_mut()
        .zip(mask.as_slice())
        .enumerate()
    {
        if *valid {
            continue;
        }

        let (mut num, mut den) = (0.0, 0.0);
        for (estimates, weights) in sweeps.iter() {
            let estimate = estimates.as_slice()[i];
            if !estimate.is_nan() {
                let weight = weights.as_slice()[i];
                num += estimate * weight;
                den += weight;
            }
        }

        *value = if den > 0.0 { num / den } else { f64::NAN };
    }

    Ok(filled)
}

// walk the rows of the grid as one meandering 1D signal
fn meander_rows(
    values: &Image<f64, 1>,
    mask: &Image<bool, 1>,
    direction: SweepDirection,
    falloff: i32,
) -> Result<(Image<f64, 1>, Image<f64, 1>), ImageError> {
    let (rows, cols) = (values.rows(), values.cols());

    // grid index visited at each step of the meander
    let path = (0..rows)
        .flat_map(|r| {
            let reversed = direction.reverses(r);
            (0..cols).map(move |c| r * cols + if reversed { cols - 1 - c } else { c })
        })
        .collect::<Vec<_>>();

    let signal = path
        .iter()
        .map(|&idx| values.as_slice()[idx])
        .collect::<Vec<_>>();
    let known = path
        .iter()
        .enumerate()
        .filter(|(_, &idx)| mask.as_slice()[idx])
        .map(|(k, _)| k)
        .collect::<Vec<_>>();

    let (path_estimates, path_weights) = interpolate_1d(&signal, &known, falloff);

    // scatter the path back onto the grid
    let mut estimates = vec![f64::NAN; path.len()];
    let mut weights = vec![0.0; path.len()];
    for (k, &idx) in path.iter().enumerate() {
        estimates[idx] = path_estimates[k];
        weights[idx] = path_weights[k];
    }

    Ok((
        Image::new(values.size(), estimates)?,
        Image::new(values.size(), weights)?,
    ))
}

// linear interpolation of `signal` through the sorted `known` positions
fn interpolate_1d(signal: &[f64], known: &[usize], falloff: i32) -> (Vec<f64>, Vec<f64>) {
    let n = signal.len();
    let mut estimates = vec![f64::NAN; n];
    let mut weights = vec![0.0; n];

    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return (estimates, weights);
    };

    // index into `known` of the first known position >= k
    let mut next = 0;
    for k in 0..n {
        while next < known.len() && known[next] < k {
            next += 1;
        }

        let right = known.get(next).copied();
        let left = match right {
            Some(r) if r == k => Some(r),
            _ if next > 0 => Some(known[next - 1]),
            _ => None,
        };

        let dist = match (left, right) {
            (Some(l), Some(r)) => (k - l).min(r - k),
            (Some(l), None) => k - l,
            (None, Some(r)) => r - k,
            (None, None) => continue,
        };
        weights[k] = (1.0 / (1.0 + dist as f64)).powi(falloff);

        if k < first || k > last {
            continue;
        }

        estimates[k] = match (left, right) {
            (Some(l), Some(r)) if l == r => signal[l],
            (Some(l), Some(r)) => {
                let slope = (signal[r] - signal[l]) / (r - l) as f64;
                slope * (k - l) as f64 + signal[l]
            }
            _ => f64::NAN,
        };
    }

    (estimates, weights)
}
