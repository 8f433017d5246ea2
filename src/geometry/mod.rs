//! Planar polygon operations for survey cell decomposition.

mod polygon_split;

pub use polygon_split::{INTERSECTION_OVERLAP, PolygonSplitter, SplitAxis, SplitResult};
