use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Which vertices of an object to query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VertexSelection {
    /// Every vertex of the object.
    #[default]
    All,
    /// The vertices at the given indices, in that order.
    Indices(Vec<usize>),
}

impl VertexSelection {
    /// Resolve the selection against an object with `count` vertices.
    ///
    /// # Errors
    ///
    /// If an index is out of range.
    pub fn resolve(&self, object: &str, count: usize) -> Result<Vec<usize>, SceneError> {
        match self {
            VertexSelection::All => Ok((0..count).collect()),
            VertexSelection::Indices(indices) => {
                if let Some(&index) = indices.iter().find(|&&i| i >= count) {
                    return Err(SceneError::VertexIndexOutOfRange {
                        object: object.to_string(),
                        index,
                        count,
                    });
                }
                Ok(indices.clone())
            }
        }
    }
}

impl FromStr for VertexSelection {
    type Err = SceneError;

    /// Parse `"all"` or a comma separated list of indices such as `"0,4,7"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(VertexSelection::All);
        }

        s.split(',')
            .map(|v| v.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(VertexSelection::Indices)
            .map_err(|_| SceneError::InvalidVertexSelection(s.to_string()))
    }
}

/// Image and world coordinates of a set of vertices.
///
/// All vectors are ordered like the requested selection. Vertices that do not
/// project onto the image plane have NaN image coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexProjection {
    /// Distorted pixel coordinates `[y, x]`.
    pub coordinates_2d: Vec<[f64; 2]>,
    /// Distance between each vertex and the camera center.
    pub distance_from_cam: Vec<f64>,
    /// World coordinates `[x, y, z]`.
    pub coordinates_3d: Vec<[f64; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() -> Result<(), SceneError> {
        assert_eq!("all".parse::<VertexSelection>()?, VertexSelection::All);
        assert_eq!(" ALL ".parse::<VertexSelection>()?, VertexSelection::All);
        assert_eq!(
            "0, 4,7".parse::<VertexSelection>()?,
            VertexSelection::Indices(vec![0, 4, 7])
        );
        assert!(matches!(
            "1,x".parse::<VertexSelection>(),
            Err(SceneError::InvalidVertexSelection(_))
        ));
        assert!("".parse::<VertexSelection>().is_err());
        assert!("-1".parse::<VertexSelection>().is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_selection() -> Result<(), SceneError> {
        assert_eq!(VertexSelection::All.resolve("Cube", 3)?, vec![0, 1, 2]);
        assert_eq!(
            VertexSelection::Indices(vec![2, 0]).resolve("Cube", 3)?,
            vec![2, 0]
        );
        assert!(matches!(
            VertexSelection::Indices(vec![1, 3]).resolve("Cube", 3),
            Err(SceneError::VertexIndexOutOfRange { index: 3, count: 3, .. })
        ));
        Ok(())
    }
}
