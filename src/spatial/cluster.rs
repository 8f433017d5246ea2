//! Connected-component clustering of point sets.
//!
//! Two points belong to the same cluster when a chain of points, each
//! within `threshold` of the next, connects them. Pairs are found with a
//! [`SpatialBinIndex`] and merged with a union-find.

use crate::core::LocalVector3;

use super::bin_index::{ElementId, SpatialBinIndex};

/// Splits a point cloud into distance-connected clusters.
#[derive(Clone, Copy, Debug)]
pub struct PointCloudSplitter {
    threshold: f64,
}

impl PointCloudSplitter {
    /// Create with the linking distance (meters)
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Linking distance
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Cluster a slice of points.
    ///
    /// Returns clusters of point indices. Members are sorted, clusters are
    /// ordered by their smallest member.
    pub fn split_points(&self, points: &[LocalVector3]) -> Vec<Vec<usize>> {
        let index = SpatialBinIndex::from_points(points.iter().map(|p| (*p, ())), self.threshold);
        self.split_index(&index)
    }

    /// Cluster the live elements of an index.
    ///
    /// Each pair is examined once: a query from an element only returns
    /// elements with a larger ordinal, so ordinals must be distinct.
    pub fn split_index<T>(&self, index: &SpatialBinIndex<T>) -> Vec<Vec<ElementId>> {
        let ids: Vec<ElementId> = index.ids().collect();
        let slot_of = |id: ElementId| ids.binary_search(&id).ok();

        let mut sets = DisjointSets::new(ids.len());
        for (slot, &id) in ids.iter().enumerate() {
            let (Some(point), Some(ordinal)) = (index.point(id), index.ordinal(id)) else {
                continue;
            };
            for neighbor in index.neighbors(&point, self.threshold, ordinal) {
                if let Some(other) = slot_of(neighbor.id) {
                    sets.union(slot, other);
                }
            }
        }

        let mut clusters: Vec<Vec<ElementId>> = Vec::new();
        let mut cluster_of_root: Vec<Option<usize>> = vec![None; ids.len()];
        for (slot, &id) in ids.iter().enumerate() {
            let root = sets.find(slot);
            match cluster_of_root[root] {
                Some(c) => clusters[c].push(id),
                None => {
                    cluster_of_root[root] = Some(clusters.len());
                    clusters.push(vec![id]);
                }
            }
        }
        clusters
    }
}

/// Union-find with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}
