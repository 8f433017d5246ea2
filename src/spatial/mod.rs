//! Spatial indexing and point clustering.

mod bin_index;
mod cluster;

pub use bin_index::{ElementId, Neighbor, SpatialBinIndex, bounding_box};
pub use cluster::PointCloudSplitter;
