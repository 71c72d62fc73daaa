//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Check if this bounding box intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Intersection with another box, `None` if disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox {
            min_lon: self.min_lon.max(other.min_lon),
            min_lat: self.min_lat.max(other.min_lat),
            max_lon: self.max_lon.min(other.max_lon),
            max_lat: self.max_lat.min(other.max_lat),
        })
    }

    /// Check if a point is contained within this bounding box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Get the width in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Get the height in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Get the center point of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Expand the box around its center by a multiplicative factor.
    ///
    /// Source data is read over an area slightly larger than the target
    /// grid so that interpolation near the edges has support on all
    /// sides. A factor of 1.2 grows each side by 20%.
    pub fn expand_by_factor(&self, factor: f64) -> Self {
        let (clon, clat) = self.center();
        let half_w = self.width() / 2.0 * factor;
        let half_h = self.height() / 2.0 * factor;
        Self {
            min_lon: clon - half_w,
            min_lat: clat - half_h,
            max_lon: clon + half_w,
            max_lat: clat + half_h,
        }
    }

    /// Clamp this bounding box to valid geographic coordinates.
    pub fn clamp_to_valid(&self) -> Self {
        Self {
            min_lon: self.min_lon.clamp(-180.0, 180.0),
            min_lat: self.min_lat.clamp(-90.0, 90.0),
            max_lon: self.max_lon.clamp(-180.0, 180.0),
            max_lat: self.max_lat.clamp(-90.0, 90.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, BoundingBox::new(5.0, 5.0, 10.0, 10.0));

        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_expand_by_factor() {
        let a = BoundingBox::new(4.0, 60.0, 6.0, 61.0);
        let e = a.expand_by_factor(1.2);
        assert!((e.width() - 2.4).abs() < 1e-12);
        assert!((e.height() - 1.2).abs() < 1e-12);
        assert_eq!(e.center(), a.center());
    }

    #[test]
    fn test_expansion_clamps_near_world_edges() {
        // Expanding a near-pole box must not leave valid coordinates.
        let a = BoundingBox::new(-179.0, 88.0, 179.0, 90.0);
        let e = a.expand_by_factor(1.5).clamp_to_valid();
        assert_eq!(e.min_lon, -180.0);
        assert_eq!(e.max_lon, 180.0);
        assert_eq!(e.max_lat, 90.0);
        assert!((e.min_lat - 87.5).abs() < 1e-12);
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::new(4.0, 60.0, 6.0, 61.0);
        assert!(bbox.contains(5.0, 60.5));
        assert!(!bbox.contains(3.0, 60.5));
        assert!(!bbox.contains(5.0, 62.0));
    }
}
