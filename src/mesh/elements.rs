//! The three element records stored by the mesh.
//!
//! These are plain data: all topological cross-references are nullable
//! handles (`Opt<…>`), never owning. A record never knows its own id; the id
//! lives in the store that holds the record. Consistency (twins pointing at
//! each other, `next`/`prev` being inverse, and so on) is a property of the
//! whole mesh, maintained by the operations on [`Dcel`][crate::Dcel].

use cgmath::{Point3, Vector3, prelude::*};
use smallvec::SmallVec;

use crate::handle::{FaceHandle, HalfEdgeHandle, Opt, VertexHandle};


/// A vertex: a point in space plus one *outgoing* half-edge, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub coordinate: Point3<f64>,
    pub normal: Vector3<f64>,
    /// One outgoing half-edge. Unset for isolated vertices.
    pub incident_half_edge: Opt<HalfEdgeHandle>,
    pub flag: u32,
}

impl Vertex {
    pub fn new(coordinate: Point3<f64>) -> Self {
        Self {
            coordinate,
            normal: Vector3::zero(),
            incident_half_edge: Opt::none(),
            flag: 0,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}


/// One direction of an edge.
///
/// The half-edge runs `from_vertex → to_vertex`, with `twin` being the
/// opposite direction, `next`/`prev` its neighbors along the boundary cycle
/// it belongs to, and `face` the face whose boundary that cycle is (unset on
/// boundary edges of open meshes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    pub from_vertex: Opt<VertexHandle>,
    pub to_vertex: Opt<VertexHandle>,
    pub twin: Opt<HalfEdgeHandle>,
    pub next: Opt<HalfEdgeHandle>,
    pub prev: Opt<HalfEdgeHandle>,
    pub face: Opt<FaceHandle>,
    pub flag: u32,
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self {
            from_vertex: Opt::none(),
            to_vertex: Opt::none(),
            twin: Opt::none(),
            next: Opt::none(),
            prev: Opt::none(),
            face: Opt::none(),
            flag: 0,
        }
    }
}


/// A face: one outer boundary cycle plus any number of inner boundary
/// cycles (holes), each represented by one of its half-edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub outer_half_edge: Opt<HalfEdgeHandle>,
    /// One representative half-edge per hole.
    pub inner_half_edges: SmallVec<[HalfEdgeHandle; 2]>,
    pub normal: Vector3<f64>,
    pub area: f64,
    pub color: [u8; 4],
    pub flag: u32,
}

impl Face {
    pub const DEFAULT_COLOR: [u8; 4] = [128, 128, 128, 255];
}

impl Default for Face {
    fn default() -> Self {
        Self {
            outer_half_edge: Opt::none(),
            inner_half_edges: SmallVec::new(),
            normal: Vector3::zero(),
            area: 0.0,
            color: Self::DEFAULT_COLOR,
            flag: 0,
        }
    }
}
