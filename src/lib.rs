//! A doubly connected edge list for polygon meshes.
//!
//! The mesh ([`Dcel`]) stores vertices, half-edges and faces in three id
//! addressed element stores. Elements refer to each other through typed,
//! copyable handles ([`VertexHandle`], [`HalfEdgeHandle`], [`FaceHandle`]);
//! deleting an element recycles its id for a later insertion. On top of
//! the raw structure sit circulators for walking face boundaries and
//! vertex neighborhoods, derived attributes (normals, areas, bounding
//! box), polygon triangulation through an exchangeable service, and file
//! IO.
//!
//! Faces are polygons with one outer boundary cycle and any number of
//! inner (hole) boundary cycles. Many operations only make sense on a
//! consistently linked mesh; the documentation of [`Dcel`] spells out
//! which links each operation relies on.
//!
//! # Cargo features
//!
//! - `io` *(default)*: reading and writing the binary dcel format plus
//!   ASCII OBJ and PLY.
//! - `triangulation` *(default)*: the `Earcut` triangulation service,
//!   backed by the `earcutr` crate.
//! - `large-handle`: 64 bit instead of 32 bit ids.

pub mod geom;
pub mod handle;
#[cfg(feature = "io")]
pub mod io;
pub mod mesh;
pub mod refs;
mod store;
pub mod triangulate;

pub use self::{
    geom::Aabb,
    handle::{hsize, FaceHandle, HalfEdgeHandle, Opt, VertexHandle},
    mesh::{BuildError, Dcel, Face, HalfEdge, Vertex},
    refs::{FaceRef, HalfEdgeRef, VertexRef},
    triangulate::{Triangulate, TriangulationError},
};

#[cfg(feature = "triangulation")]
pub use self::triangulate::Earcut;
