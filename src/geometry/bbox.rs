//! Axis-aligned bounding boxes.

use super::vector::Vector;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector,
    pub max: Vector,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BoundingBox {
            min: Vector::new(f64::MAX, f64::MAX),
            max: Vector::new(f64::MIN, f64::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vector>) -> Self {
        let mut bbox = BoundingBox::new();
        for p in points {
            bbox.expand_point(p);
        }
        bbox
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x() > self.max.x() || self.min.y() > self.max.y()
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: Vector) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(mut self, other: &BoundingBox) -> BoundingBox {
        if !other.is_empty() {
            self.expand_point(other.min);
            self.expand_point(other.max);
        }
        self
    }

    pub fn contains(&self, p: Vector) -> bool {
        (self.min.x()..=self.max.x()).contains(&p.x())
            && (self.min.y()..=self.max.y()).contains(&p.y())
    }

    pub fn width(&self) -> f64 {
        self.max.x() - self.min.x()
    }

    pub fn height(&self) -> f64 {
        self.max.y() - self.min.y()
    }

    pub fn center(&self) -> Vector {
        self.min.midpoint(self.max)
    }
}
