//! Forcing field snapshots.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field data has {got} values, grid has {expected} points")]
    SizeMismatch { expected: usize, got: usize },
}

/// Scalar or vector values on a structured domain at one instant.
///
/// Row-major with rows = latitude, row 0 = south (hindcast layout).
/// Missing/land values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcingField {
    u: Vec<f32>,
    v: Option<Vec<f32>>,
    width: usize,
    height: usize,
}

impl ForcingField {
    /// Scalar field.
    pub fn scalar(u: Vec<f32>, width: usize, height: usize) -> Result<Self, FieldError> {
        if u.len() != width * height {
            return Err(FieldError::SizeMismatch {
                expected: width * height,
                got: u.len(),
            });
        }
        Ok(Self {
            u,
            v: None,
            width,
            height,
        })
    }

    /// Vector field, e.g. wind (u, v) components.
    pub fn vector(
        u: Vec<f32>,
        v: Vec<f32>,
        width: usize,
        height: usize,
    ) -> Result<Self, FieldError> {
        if u.len() != width * height {
            return Err(FieldError::SizeMismatch {
                expected: width * height,
                got: u.len(),
            });
        }
        if v.len() != width * height {
            return Err(FieldError::SizeMismatch {
                expected: width * height,
                got: v.len(),
            });
        }
        Ok(Self {
            u,
            v: Some(v),
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_vector(&self) -> bool {
        self.v.is_some()
    }

    pub fn u(&self) -> &[f32] {
        &self.u
    }

    pub fn v(&self) -> Option<&[f32]> {
        self.v.as_deref()
    }

    /// Value at a grid coordinate (col, row), row 0 = south.
    pub fn get_u(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.u.get(row * self.width + col).copied()
    }

    pub fn get_v(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.v.as_ref().and_then(|v| v.get(row * self.width + col)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_checked() {
        assert!(ForcingField::scalar(vec![0.0; 5], 2, 3).is_err());
        assert!(ForcingField::vector(vec![0.0; 6], vec![0.0; 5], 2, 3).is_err());
        assert!(ForcingField::vector(vec![0.0; 6], vec![0.0; 6], 2, 3).is_ok());
    }

    #[test]
    fn test_indexing() {
        let f = ForcingField::scalar((0..6).map(|i| i as f32).collect(), 3, 2).unwrap();
        assert_eq!(f.get_u(0, 0), Some(0.0));
        assert_eq!(f.get_u(2, 1), Some(5.0));
        assert_eq!(f.get_u(3, 0), None);
        assert_eq!(f.get_v(0, 0), None);
    }
}
