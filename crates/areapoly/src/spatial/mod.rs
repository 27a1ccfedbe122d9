//! Spatial machinery behind every simplicity guarantee.
//!
//! Purpose
//! - `KdTree`: bulk-built 2-D range index over point positions.
//! - `Ring`: the working polygon as an arena of point ids with explicit
//!   `next`/`prev` links, a membership mask and running aggregates (twice the
//!   signed area, a multiset of edge lengths).
//! - `Oracle`: decides whether a local edit (edges removed, edges added)
//!   keeps the ring simple, touching only edges near the edit.
//!
//! Why this design
//! - Point positions never move during a run; only the cyclic order changes
//!   and (for constructive algorithms) the vertex set grows. A static kd-tree
//!   plus the ring's membership mask therefore tracks the current vertex set
//!   without rebuilding.
//! - Edits are expressed as edge sets so the same check serves insertions,
//!   chain relocations, swaps and layer splices.

mod kdtree;
mod oracle;
mod ring;

pub use kdtree::{Bbox, KdTree};
pub use oracle::Oracle;
pub use ring::Ring;

#[cfg(test)]
mod tests;
