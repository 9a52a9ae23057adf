//! Types for references to elements within a mesh.
//!
//! An element ref is just a handle paired with a reference to the mesh the
//! handle belongs to. All derived queries that need both (degree counting,
//! incidence tests, boundary walks) live here, so call sites can write
//! `mesh.face_ref(f).is_triangle()` instead of threading the mesh through
//! manually.

use std::fmt;

use cgmath::{Point3, Vector3, prelude::*};

use crate::{
    handle::{hsize, Handle, Opt, FaceHandle, HalfEdgeHandle, VertexHandle},
    mesh::{Dcel, Face, HalfEdge, Vertex},
    mesh::adj::{
        AdjacentFaces, AdjacentVertices, CycleIter, CycleVertices,
        IncidentFaces, IncomingHalfEdges, OutgoingHalfEdges,
    },
};


/// A reference to an element within a mesh: a handle plus the mesh itself.
///
/// The element must be live whenever one of the accessors is called;
/// accessing a deleted element through a ref panics (use
/// [`Dcel::vertex`] and friends for fallible lookup of possibly stale
/// handles).
pub struct ElementRef<'a, H: Handle> {
    mesh: &'a Dcel,
    handle: H,
}

/// A reference to a vertex within a mesh.
pub type VertexRef<'a> = ElementRef<'a, VertexHandle>;

/// A reference to a half-edge within a mesh.
pub type HalfEdgeRef<'a> = ElementRef<'a, HalfEdgeHandle>;

/// A reference to a face within a mesh.
pub type FaceRef<'a> = ElementRef<'a, FaceHandle>;

impl<'a, H: Handle> ElementRef<'a, H> {
    pub(crate) fn new(mesh: &'a Dcel, handle: H) -> Self {
        Self { mesh, handle }
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn mesh(&self) -> &'a Dcel {
        self.mesh
    }
}

impl<H: Handle> Clone for ElementRef<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<H: Handle> Copy for ElementRef<'_, H> {}

impl<H: Handle> fmt::Debug for ElementRef<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ref({:?})", self.handle)
    }
}


// ===========================================================================
// ===== Vertex
// ===========================================================================

impl<'a> VertexRef<'a> {
    fn record(&self) -> &'a Vertex {
        &self.mesh[self.handle]
    }

    pub fn coordinate(&self) -> Point3<f64> {
        self.record().coordinate
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.record().normal
    }

    pub fn flag(&self) -> u32 {
        self.record().flag
    }

    /// One outgoing half-edge, unset for isolated vertices.
    pub fn incident_half_edge(&self) -> Opt<HalfEdgeHandle> {
        self.record().incident_half_edge
    }

    /// Number of edges incident to this vertex, counted by walking the
    /// umbrella. Zero for isolated vertices.
    pub fn degree(&self) -> hsize {
        self.outgoing_half_edges().count() as hsize
    }

    /// Circulates over the outgoing half-edges of this vertex.
    pub fn outgoing_half_edges(&self) -> OutgoingHalfEdges<'a> {
        OutgoingHalfEdges::around(self.mesh, self.handle)
    }

    /// Circulates over the incoming half-edges of this vertex.
    pub fn incoming_half_edges(&self) -> IncomingHalfEdges<'a> {
        IncomingHalfEdges::around(self.mesh, self.handle)
    }

    /// Circulates over the faces around this vertex. On open meshes the
    /// boundary gap is skipped.
    pub fn incident_faces(&self) -> IncidentFaces<'a> {
        IncidentFaces::around(self.mesh, self.handle)
    }

    /// Circulates over the vertices connected to this one by an edge.
    pub fn adjacent_vertices(&self) -> AdjacentVertices<'a> {
        AdjacentVertices::around(self.mesh, self.handle)
    }
}


// ===========================================================================
// ===== Half-edge
// ===========================================================================

impl<'a> HalfEdgeRef<'a> {
    fn record(&self) -> &'a HalfEdge {
        &self.mesh[self.handle]
    }

    pub fn from_vertex(&self) -> Opt<VertexHandle> {
        self.record().from_vertex
    }

    pub fn to_vertex(&self) -> Opt<VertexHandle> {
        self.record().to_vertex
    }

    pub fn twin(&self) -> Opt<HalfEdgeHandle> {
        self.record().twin
    }

    pub fn next(&self) -> Opt<HalfEdgeHandle> {
        self.record().next
    }

    pub fn prev(&self) -> Opt<HalfEdgeHandle> {
        self.record().prev
    }

    pub fn face(&self) -> Opt<FaceHandle> {
        self.record().face
    }

    pub fn flag(&self) -> u32 {
        self.record().flag
    }

    /// Whether this half-edge has no face, i.e. lies on the border of an
    /// open mesh.
    pub fn is_boundary(&self) -> bool {
        self.face().is_none()
    }

    /// Walks the boundary cycle this half-edge belongs to, starting here.
    pub fn cycle(&self) -> CycleIter<'a> {
        self.mesh.half_edge_cycle(self.handle)
    }
}


// ===========================================================================
// ===== Face
// ===========================================================================

impl<'a> FaceRef<'a> {
    fn record(&self) -> &'a Face {
        &self.mesh[self.handle]
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.record().normal
    }

    pub fn area(&self) -> f64 {
        self.record().area
    }

    pub fn color(&self) -> [u8; 4] {
        self.record().color
    }

    pub fn flag(&self) -> u32 {
        self.record().flag
    }

    pub fn outer_half_edge(&self) -> Opt<HalfEdgeHandle> {
        self.record().outer_half_edge
    }

    /// Whether the outer boundary consists of exactly three half-edges:
    /// advance `next` three times and compare against the start. A face
    /// without outer boundary is not a triangle.
    pub fn is_triangle(&self) -> bool {
        let start = match self.outer_half_edge().into_option() {
            None => return false,
            Some(he) => he,
        };

        let mut he = start;
        for _ in 0..3 {
            he = self.mesh.next_of(he);
        }
        he == start
    }

    /// Whether some boundary edge of this face, outer or around a hole, is
    /// shared with `other`. Edges without twin (open mesh border) connect
    /// to nothing.
    pub fn is_adjacent_to(&self, other: FaceHandle) -> bool {
        if self.adjacent_faces().any(|f| f == other) {
            return true;
        }
        self.inner_half_edges().any(|hole| {
            AdjacentFaces::new(self.mesh, Opt::some(hole)).any(|f| f == other)
        })
    }

    /// Circulates over the faces sharing an outer boundary edge with this
    /// one (one item per shared edge).
    pub fn adjacent_faces(&self) -> AdjacentFaces<'a> {
        AdjacentFaces::new(self.mesh, self.outer_half_edge())
    }

    /// Whether some outgoing half-edge of `v` lies on a boundary of this
    /// face. Hole cycles store the face like the outer one does, so their
    /// vertices are incident too.
    pub fn is_incident_to(&self, v: VertexHandle) -> bool {
        OutgoingHalfEdges::around(self.mesh, v)
            .any(|he| self.mesh[he].face == Opt::some(self.handle))
    }

    /// Number of vertices on the outer boundary, counted by traversal.
    pub fn num_incident_vertices(&self) -> hsize {
        self.outer_vertices().count() as hsize
    }

    /// Number of half-edges on the outer boundary, counted by traversal.
    pub fn num_incident_half_edges(&self) -> hsize {
        self.outer_half_edges().count() as hsize
    }

    /// Number of holes.
    pub fn num_inner_half_edges(&self) -> hsize {
        self.record().inner_half_edges.len() as hsize
    }

    /// The arithmetic mean of the outer boundary vertex coordinates.
    /// The origin for a face without outer boundary.
    pub fn barycentre(&self) -> Point3<f64> {
        let mut sum = Vector3::zero();
        let mut n = 0;
        for v in self.outer_vertices() {
            sum += self.mesh[v].coordinate.to_vec();
            n += 1;
        }

        if n == 0 {
            Point3::origin()
        } else {
            Point3::from_vec(sum / f64::from(n))
        }
    }

    /// Walks the outer boundary half-edges, starting at the stored
    /// representative.
    pub fn outer_half_edges(&self) -> CycleIter<'a> {
        CycleIter::new(self.mesh, self.outer_half_edge())
    }

    /// Walks the boundary half-edges starting at `start` instead of the
    /// stored representative.
    ///
    /// # Panics
    ///
    /// If `start` does not lie on a boundary of this face.
    pub fn outer_half_edges_from(&self, start: HalfEdgeHandle) -> CycleIter<'a> {
        self.check_own_boundary(start, "start");
        CycleIter::new(self.mesh, Opt::some(start))
    }

    /// Walks the boundary half-edges from `start` up to `end`, which is
    /// not yielded. With `start == end` this is the full cycle.
    ///
    /// # Panics
    ///
    /// If either half-edge does not lie on a boundary of this face, or,
    /// once the walk closes, if the two lie on different boundary cycles.
    pub fn outer_half_edges_between(
        &self,
        start: HalfEdgeHandle,
        end: HalfEdgeHandle,
    ) -> CycleIter<'a> {
        self.check_own_boundary(start, "start");
        self.check_own_boundary(end, "end");
        CycleIter::bounded(self.mesh, start, end)
    }

    /// Walks the outer boundary vertices, starting at the origin of the
    /// stored representative half-edge.
    pub fn outer_vertices(&self) -> CycleVertices<'a> {
        CycleVertices::new(self.mesh, self.outer_half_edge())
    }

    /// Walks the boundary vertices starting at `start`.
    ///
    /// # Panics
    ///
    /// If `start` is not incident to this face.
    pub fn outer_vertices_from(&self, start: VertexHandle) -> CycleVertices<'a> {
        let he = self.leaving_boundary_half_edge(start, "start");
        CycleVertices::new(self.mesh, Opt::some(he))
    }

    /// Walks the boundary vertices from `start` up to `end`, which is not
    /// yielded. With `start == end` this is the full cycle.
    ///
    /// # Panics
    ///
    /// If either vertex is not incident to this face, or, once the walk
    /// closes, if the two lie on different boundary cycles.
    pub fn outer_vertices_between(
        &self,
        start: VertexHandle,
        end: VertexHandle,
    ) -> CycleVertices<'a> {
        let s = self.leaving_boundary_half_edge(start, "start");
        let e = self.leaving_boundary_half_edge(end, "end");
        CycleVertices::bounded(self.mesh, s, e)
    }

    fn check_own_boundary(&self, he: HalfEdgeHandle, role: &str) {
        if self.mesh[he].face != Opt::some(self.handle) {
            panic!(
                "{} half-edge {:?} is not incident to face {:?}",
                role,
                he,
                self.handle,
            );
        }
    }

    /// The boundary half-edge of this face leaving `v`, panicking when
    /// there is none.
    fn leaving_boundary_half_edge(
        &self,
        v: VertexHandle,
        role: &str,
    ) -> HalfEdgeHandle {
        match self.mesh.boundary_start_at(self.handle, v) {
            Some(he) => he,
            None => panic!(
                "{} vertex {:?} is not incident to face {:?}",
                role,
                v,
                self.handle,
            ),
        }
    }

    /// Iterator over the hole representatives (one half-edge per inner
    /// boundary). Walk a hole's full cycle via
    /// [`Dcel::half_edge_cycle`].
    pub fn inner_half_edges(&self) -> InnerHalfEdges<'a> {
        InnerHalfEdges {
            iter: self.record().inner_half_edges.iter(),
        }
    }
}

/// Iterator over the hole representatives of one face.
#[derive(Debug, Clone)]
pub struct InnerHalfEdges<'a> {
    iter: std::slice::Iter<'a, HalfEdgeHandle>,
}

impl Iterator for InnerHalfEdges<'_> {
    type Item = HalfEdgeHandle;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().copied()
    }
}
