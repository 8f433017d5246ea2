//! Uniform 3-D bucket grid for radius-bounded neighbour queries.
//!
//! Used while shifting copter waypoints onto the terrain normal: drone
//! positions move one by one and every move needs the points near it.
//!
//! # Algorithm
//!
//! 1. The bounding box given at construction is divided into cubic buckets
//!    of edge `max_search_radius` (enlarged if the grid would get too big)
//! 2. Each element stores the bucket it lives in; points outside the box
//!    are clamped into the border buckets
//! 3. A query scans the buckets within `ceil(radius / bucket_size)` of the
//!    query bucket (3x3x3 for radius <= bucket size) and filters by exact
//!    distance and by the ordinal cutoff
//!
//! Clamping never moves two points further apart in bucket space, so
//! clamped points are still found by queries.
//!
//! # Performance
//!
//! - add/remove/relocate: O(1) amortized (removal is O(bucket size))
//! - neighbors: O(points in the scanned buckets)

use crate::core::LocalVector3;

/// Upper bound on buckets per axis
const MAX_BUCKETS_PER_AXIS: usize = 256;

/// Handle of an element in a [`SpatialBinIndex`]
pub type ElementId = usize;

/// Bucket coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BucketCoord {
    x: usize,
    y: usize,
    z: usize,
}

/// Stored element with its owning bucket.
#[derive(Clone, Debug)]
struct DataElement<T> {
    point: LocalVector3,
    payload: T,
    ordinal: i64,
    bucket: BucketCoord,
}

/// One neighbour query hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Element handle
    pub id: ElementId,
    /// Squared distance to the query point
    pub distance_sq: f64,
    /// Element position minus query position
    pub displacement: LocalVector3,
    /// Element ordinal
    pub ordinal: i64,
}

/// Uniform 3-D grid of buckets over a bounding box.
///
/// Not thread-safe; owned by the recomputation pass that builds it.
#[derive(Clone, Debug)]
pub struct SpatialBinIndex<T> {
    /// Lower corner of the grid
    min: LocalVector3,
    /// Bucket edge length (meters)
    bucket_size: f64,
    /// Buckets per axis
    dims: [usize; 3],
    /// Element ids per bucket, x-major
    buckets: Vec<Vec<ElementId>>,
    /// Element slots; removed elements leave `None`
    elements: Vec<Option<DataElement<T>>>,
    /// Live element count
    len: usize,
}

impl<T> SpatialBinIndex<T> {
    /// Create an empty index covering `min..max`.
    pub fn new(min: LocalVector3, max: LocalVector3, max_search_radius: f64) -> Self {
        let extent = max - min;
        let largest = extent.x.max(extent.y).max(extent.z).max(0.0);
        let bucket_size = max_search_radius
            .max(largest / MAX_BUCKETS_PER_AXIS as f64)
            .max(1e-6);

        let axis = |e: f64| ((e.max(0.0) / bucket_size).ceil() as usize).clamp(1, MAX_BUCKETS_PER_AXIS);
        let dims = [axis(extent.x), axis(extent.y), axis(extent.z)];
        let count = dims[0] * dims[1] * dims[2];

        Self {
            min,
            bucket_size,
            dims,
            buckets: vec![Vec::new(); count],
            elements: Vec::new(),
            len: 0,
        }
    }

    /// Build over the bounding box of `points`, using each index as ordinal.
    pub fn from_points(
        points: impl IntoIterator<Item = (LocalVector3, T)>,
        max_search_radius: f64,
    ) -> Self {
        let items: Vec<(LocalVector3, T)> = points.into_iter().collect();
        let (min, max) = bounding_box(items.iter().map(|(p, _)| *p));
        let mut index = Self::new(min, max, max_search_radius);
        for (i, (point, payload)) in items.into_iter().enumerate() {
            index.add(point, payload, i as i64);
        }
        index
    }

    /// Bucket edge length
    pub fn bucket_size(&self) -> f64 {
        self.bucket_size
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no element is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an element and return its handle.
    pub fn add(&mut self, point: LocalVector3, payload: T, ordinal: i64) -> ElementId {
        let bucket = self.bucket_of(&point);
        let id = self.elements.len();
        let flat = self.flat(bucket);
        self.buckets[flat].push(id);
        self.elements.push(Some(DataElement {
            point,
            payload,
            ordinal,
            bucket,
        }));
        self.len += 1;
        id
    }

    /// Move an element. Bucket membership is updated before the point.
    ///
    /// Returns false for unknown or removed handles.
    pub fn relocate(&mut self, id: ElementId, point: LocalVector3) -> bool {
        let new_bucket = self.bucket_of(&point);
        let Some(old_bucket) = self.element(id).map(|e| e.bucket) else {
            return false;
        };

        if new_bucket != old_bucket {
            let old_flat = self.flat(old_bucket);
            let new_flat = self.flat(new_bucket);
            self.buckets[old_flat].retain(|&e| e != id);
            self.buckets[new_flat].push(id);
        }

        if let Some(Some(element)) = self.elements.get_mut(id) {
            element.bucket = new_bucket;
            element.point = point;
        }
        true
    }

    /// Remove an element, returning its payload.
    pub fn remove(&mut self, id: ElementId) -> Option<T> {
        let element = self.elements.get_mut(id)?.take()?;
        let flat = self.flat(element.bucket);
        self.buckets[flat].retain(|&e| e != id);
        self.len -= 1;
        Some(element.payload)
    }

    /// Current position of an element
    pub fn point(&self, id: ElementId) -> Option<LocalVector3> {
        self.element(id).map(|e| e.point)
    }

    /// Payload of an element
    pub fn payload(&self, id: ElementId) -> Option<&T> {
        self.element(id).map(|e| &e.payload)
    }

    /// Ordinal of an element
    pub fn ordinal(&self, id: ElementId) -> Option<i64> {
        self.element(id).map(|e| e.ordinal)
    }

    /// Handles of all live elements in insertion order
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter_map(|(id, e)| e.as_ref().map(|_| id))
    }

    /// All elements within `radius` of `point` whose ordinal exceeds
    /// `ordinal_cutoff`, in no particular order.
    pub fn neighbors(&self, point: &LocalVector3, radius: f64, ordinal_cutoff: i64) -> Vec<Neighbor> {
        let mut result = Vec::new();
        if !(radius >= 0.0) || self.len == 0 {
            return result;
        }

        let radius_sq = radius * radius;
        let rings = ((radius / self.bucket_size).ceil() as usize).max(1);
        let center = self.bucket_of(point);

        let range = |c: usize, dim: usize| c.saturating_sub(rings)..=(c + rings).min(dim - 1);

        for bx in range(center.x, self.dims[0]) {
            for by in range(center.y, self.dims[1]) {
                for bz in range(center.z, self.dims[2]) {
                    let flat = self.flat(BucketCoord {
                        x: bx,
                        y: by,
                        z: bz,
                    });
                    for &id in &self.buckets[flat] {
                        let Some(element) = self.element(id) else {
                            continue;
                        };
                        if element.ordinal <= ordinal_cutoff {
                            continue;
                        }
                        let displacement = element.point - *point;
                        let distance_sq = displacement.length_squared();
                        if distance_sq <= radius_sq {
                            result.push(Neighbor {
                                id,
                                distance_sq,
                                displacement,
                                ordinal: element.ordinal,
                            });
                        }
                    }
                }
            }
        }
        result
    }

    fn element(&self, id: ElementId) -> Option<&DataElement<T>> {
        self.elements.get(id).and_then(|e| e.as_ref())
    }

    #[inline]
    fn bucket_of(&self, point: &LocalVector3) -> BucketCoord {
        let axis = |v: f64, min: f64, dim: usize| {
            let cell = ((v - min) / self.bucket_size).floor();
            // NaN and negatives saturate to 0
            (cell.max(0.0) as usize).min(dim - 1)
        };
        BucketCoord {
            x: axis(point.x, self.min.x, self.dims[0]),
            y: axis(point.y, self.min.y, self.dims[1]),
            z: axis(point.z, self.min.z, self.dims[2]),
        }
    }

    #[inline]
    fn flat(&self, b: BucketCoord) -> usize {
        (b.x * self.dims[1] + b.y) * self.dims[2] + b.z
    }
}

/// Axis-aligned bounding box of a point set (zero box for an empty set).
pub fn bounding_box(points: impl IntoIterator<Item = LocalVector3>) -> (LocalVector3, LocalVector3) {
    let mut iter = points.into_iter().filter(LocalVector3::is_finite);
    let Some(first) = iter.next() else {
        return (LocalVector3::ZERO, LocalVector3::ZERO);
    };
    iter.fold((first, first), |(min, max), p| {
        (
            LocalVector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
            LocalVector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_index() -> SpatialBinIndex<&'static str> {
        let mut index = SpatialBinIndex::new(
            LocalVector3::new(0.0, 0.0, 0.0),
            LocalVector3::new(100.0, 100.0, 10.0),
            5.0,
        );
        index.add(LocalVector3::new(10.0, 10.0, 0.0), "a", 0);
        index.add(LocalVector3::new(12.0, 10.0, 0.0), "b", 1);
        index.add(LocalVector3::new(14.5, 10.0, 0.0), "c", 2);
        index.add(LocalVector3::new(50.0, 50.0, 0.0), "d", 3);
        index
    }

    #[test]
    fn test_neighbors_radius_and_cutoff() {
        let index = grid_index();
        let query = LocalVector3::new(10.0, 10.0, 0.0);

        let mut hits: Vec<_> = index
            .neighbors(&query, 5.0, -1)
            .into_iter()
            .map(|n| *index.payload(n.id).unwrap())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["a", "b", "c"]);

        // cutoff excludes ordinals 0 and 1
        let hits = index.neighbors(&query, 5.0, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ordinal, 2);
        assert!((hits[0].distance_sq - 20.25).abs() < 1e-9);
        assert!((hits[0].displacement.x - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_relocate_updates_membership() {
        let mut index = grid_index();
        let query = LocalVector3::new(50.0, 50.0, 0.0);
        assert_eq!(index.neighbors(&query, 3.0, -1).len(), 1);

        assert!(index.relocate(0, LocalVector3::new(51.0, 50.0, 0.0)));
        let hits = index.neighbors(&query, 3.0, -1);
        assert_eq!(hits.len(), 2);
        assert!(
            index
                .neighbors(&LocalVector3::new(10.0, 10.0, 0.0), 1.0, -1)
                .is_empty()
        );
    }

    #[test]
    fn test_remove() {
        let mut index = grid_index();
        assert_eq!(index.remove(1), Some("b"));
        assert_eq!(index.remove(1), None);
        assert_eq!(index.len(), 3);
        assert!(!index.relocate(1, LocalVector3::ZERO));
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn test_points_outside_bounds_are_found() {
        let mut index = SpatialBinIndex::new(LocalVector3::ZERO, LocalVector3::new(10.0, 10.0, 10.0), 2.0);
        index.add(LocalVector3::new(-3.0, 5.0, 5.0), (), 0);
        index.add(LocalVector3::new(25.0, 5.0, 5.0), (), 1);

        assert_eq!(index.neighbors(&LocalVector3::new(-1.5, 5.0, 5.0), 2.0, -1).len(), 1);
        assert_eq!(index.neighbors(&LocalVector3::new(24.0, 5.0, 5.0), 2.0, -1).len(), 1);
        assert!(index.neighbors(&LocalVector3::new(5.0, 5.0, 5.0), 2.0, -1).is_empty());
    }

    #[test]
    fn test_large_radius_scans_more_rings() {
        let index = grid_index();
        let hits = index.neighbors(&LocalVector3::new(10.0, 10.0, 0.0), 60.0, -1);
        assert_eq!(hits.len(), 4);
    }
}
