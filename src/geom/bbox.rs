use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a geometry by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of corresponding geometry in the owning collection
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Bounding box of a MultiPolygon, or None if it is empty.
    pub(crate) fn of(idx: usize, shape: &MultiPolygon<f64>) -> Option<Self> {
        shape.bounding_rect().map(|bbox| Self::new(idx, bbox))
    }

    /// Get the index of the corresponding geometry.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }

    /// R-tree query envelope covering this box.
    #[inline]
    pub(crate) fn search_envelope(&self) -> AABB<[f64; 2]> {
        self.envelope()
    }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
