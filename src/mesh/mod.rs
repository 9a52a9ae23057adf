//! The mesh itself: a doubly connected edge list.
//!
//! ```text
//!       to  ┌─────┐
//!        ●──┤twin ├──●
//!       ╱ ╲ └─────┘ ╱ ╲
//!  next▕   ▏       ▕   ▏prev of twin
//!       ╲ ╱  face   ╲ ╱
//!        ●───────────●
//!       from
//! ```
//!
//! Every edge of the mesh is split into two directed *half-edges* that are
//! twins of each other. Each half-edge knows its origin and destination
//! vertex, its successor and predecessor along the boundary cycle it belongs
//! to, and the face owning that cycle. A face stores one half-edge of its
//! outer boundary plus one representative half-edge per inner boundary
//! (hole). A vertex stores one outgoing half-edge.
//!
//! Elements are addressed by typed handles. Deleting an element frees its id
//! for reuse (smallest freed id first) and leaves all references held by
//! surviving elements untouched: a handle to a deleted element is *stale*
//! and all lookups with it return `None`. Nothing is repaired silently;
//! [`Dcel::recalculate_ids`] refuses (panics) to renumber a mesh that still
//! contains stale references.

use std::ops;

use fxhash::FxHashMap;

use crate::{
    geom::Aabb,
    handle::{hsize, Handle, Opt, FaceHandle, HalfEdgeHandle, VertexHandle},
    refs::{FaceRef, HalfEdgeRef, VertexRef},
    store::{self, ElementStore},
};

pub mod adj;
pub mod build;
mod elements;
mod geo;


pub use self::build::BuildError;
pub use self::elements::{Face, HalfEdge, Vertex};


/// A polygon mesh stored as a doubly connected edge list.
///
/// The facade owns three element stores (vertices, half-edges, faces) and a
/// cached bounding box. Topology is edited through the `add_*`/`delete_*`
/// primitives plus direct field access via [`vertex_mut`][Self::vertex_mut]
/// and friends; higher level operations (file loading, triangulation) build
/// on exactly these primitives.
#[derive(Debug, Clone)]
pub struct Dcel {
    pub(crate) vertices: ElementStore<VertexHandle, Vertex>,
    pub(crate) half_edges: ElementStore<HalfEdgeHandle, HalfEdge>,
    pub(crate) faces: ElementStore<FaceHandle, Face>,
    pub(crate) bounding_box: Aabb,
}

impl Dcel {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: ElementStore::new(),
            half_edges: ElementStore::new(),
            faces: ElementStore::new(),
            bounding_box: Aabb::new(),
        }
    }

    // ----- Adding elements --------------------------------------------------

    /// Adds an isolated vertex at the given position and returns its handle.
    ///
    /// The id is the smallest recycled one, or a fresh id if none was freed.
    pub fn add_vertex(&mut self, coordinate: cgmath::Point3<f64>) -> VertexHandle {
        self.vertices.insert(Vertex::new(coordinate))
    }

    /// Adds a vertex with all fields taken from the given record.
    pub fn add_vertex_from(&mut self, proto: Vertex) -> VertexHandle {
        self.vertices.insert(proto)
    }

    /// Adds a half-edge with all references unset.
    pub fn add_half_edge(&mut self) -> HalfEdgeHandle {
        self.half_edges.insert(HalfEdge::default())
    }

    /// Adds a half-edge with all fields taken from the given record.
    pub fn add_half_edge_from(&mut self, proto: HalfEdge) -> HalfEdgeHandle {
        self.half_edges.insert(proto)
    }

    /// Adds a face with no boundary yet.
    pub fn add_face(&mut self) -> FaceHandle {
        self.faces.insert(Face::default())
    }

    /// Adds a face with all fields taken from the given record.
    pub fn add_face_from(&mut self, proto: Face) -> FaceHandle {
        self.faces.insert(proto)
    }

    // ----- Deleting elements ------------------------------------------------
    //
    // The deletes are primitives: they free one slot and recycle one id.
    // References held by other elements are not rewritten, so the caller is
    // responsible for relinking the surroundings. Stale handles are
    // observable and resolve to `None`.

    /// Deletes the vertex. Returns `false` if there is no such vertex.
    pub fn delete_vertex(&mut self, v: VertexHandle) -> bool {
        self.vertices.remove(v).is_some()
    }

    /// Deletes the half-edge. Returns `false` if there is no such half-edge.
    pub fn delete_half_edge(&mut self, he: HalfEdgeHandle) -> bool {
        self.half_edges.remove(he).is_some()
    }

    /// Deletes the face. Returns `false` if there is no such face.
    pub fn delete_face(&mut self, f: FaceHandle) -> bool {
        self.faces.remove(f).is_some()
    }

    // ----- Lookup -----------------------------------------------------------

    pub fn vertex(&self, v: VertexHandle) -> Option<&Vertex> {
        self.vertices.get(v)
    }

    pub fn vertex_mut(&mut self, v: VertexHandle) -> Option<&mut Vertex> {
        self.vertices.get_mut(v)
    }

    pub fn half_edge(&self, he: HalfEdgeHandle) -> Option<&HalfEdge> {
        self.half_edges.get(he)
    }

    pub fn half_edge_mut(&mut self, he: HalfEdgeHandle) -> Option<&mut HalfEdge> {
        self.half_edges.get_mut(he)
    }

    pub fn face(&self, f: FaceHandle) -> Option<&Face> {
        self.faces.get(f)
    }

    pub fn face_mut(&mut self, f: FaceHandle) -> Option<&mut Face> {
        self.faces.get_mut(f)
    }

    pub fn contains_vertex(&self, v: VertexHandle) -> bool {
        self.vertices.contains(v)
    }

    pub fn contains_half_edge(&self, he: HalfEdgeHandle) -> bool {
        self.half_edges.contains(he)
    }

    pub fn contains_face(&self, f: FaceHandle) -> bool {
        self.faces.contains(f)
    }

    // ----- Counts -----------------------------------------------------------

    /// Number of live vertices.
    pub fn num_vertices(&self) -> hsize {
        self.vertices.len()
    }

    /// Number of live half-edges.
    pub fn num_half_edges(&self) -> hsize {
        self.half_edges.len()
    }

    /// Number of live faces.
    pub fn num_faces(&self) -> hsize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_vertices() == 0 && self.num_half_edges() == 0 && self.num_faces() == 0
    }

    // ----- Iteration --------------------------------------------------------

    /// Iterator over all vertices, ascending by id.
    pub fn vertices(&self) -> Vertices<'_> {
        Vertices { mesh: self, handles: self.vertices.handles() }
    }

    /// Iterator over all half-edges, ascending by id.
    pub fn half_edges(&self) -> HalfEdges<'_> {
        HalfEdges { mesh: self, handles: self.half_edges.handles() }
    }

    /// Iterator over all faces, ascending by id.
    pub fn faces(&self) -> Faces<'_> {
        Faces { mesh: self, handles: self.faces.handles() }
    }

    /// Wraps a vertex handle together with this mesh for derived queries.
    pub fn vertex_ref(&self, v: VertexHandle) -> VertexRef<'_> {
        VertexRef::new(self, v)
    }

    /// Wraps a half-edge handle together with this mesh for derived queries.
    pub fn half_edge_ref(&self, he: HalfEdgeHandle) -> HalfEdgeRef<'_> {
        HalfEdgeRef::new(self, he)
    }

    /// Wraps a face handle together with this mesh for derived queries.
    pub fn face_ref(&self, f: FaceHandle) -> FaceRef<'_> {
        FaceRef::new(self, f)
    }

    // ----- Whole-mesh operations --------------------------------------------

    /// Removes every element and resets the id counters and the cached
    /// bounding box. Afterwards the mesh is indistinguishable from a fresh
    /// one.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.faces.clear();
        self.bounding_box = Aabb::new();
    }

    /// Sets the color of every face.
    pub fn set_face_colors(&mut self, color: [u8; 4]) {
        for (_, face) in self.faces.iter_mut() {
            face.color = color;
        }
    }

    /// Resets every face to [`Face::DEFAULT_COLOR`].
    pub fn reset_face_colors(&mut self) {
        self.set_face_colors(Face::DEFAULT_COLOR);
    }

    /// Compacts all three id spaces to `0..n`, keeping the relative order of
    /// the surviving elements and rewriting every stored cross-reference.
    /// The recycling pools are empty afterwards. Calling this on an already
    /// compact mesh changes nothing.
    ///
    /// # Panics
    ///
    /// If any live element still references a deleted one. Renumbering such
    /// a mesh would have to guess what the reference meant, which this
    /// method refuses to do.
    pub fn recalculate_ids(&mut self) {
        fn id_map<H: Handle, T>(store: &ElementStore<H, T>) -> FxHashMap<hsize, hsize> {
            store.handles()
                .enumerate()
                .map(|(new, h)| (h.idx(), new as hsize))
                .collect()
        }

        fn remap_required<H: Handle>(h: H, map: &FxHashMap<hsize, hsize>) -> H {
            match map.get(&h.idx()) {
                Some(&new) => H::new(new),
                None => panic!(
                    "cannot renumber ids: {:?} refers to a deleted element",
                    h,
                ),
            }
        }

        fn remap<H: Handle>(r: Opt<H>, map: &FxHashMap<hsize, hsize>) -> Opt<H> {
            match r.into_option() {
                None => Opt::none(),
                Some(h) => Opt::some(remap_required(h, map)),
            }
        }

        let vmap = id_map(&self.vertices);
        let hmap = id_map(&self.half_edges);
        let fmap = id_map(&self.faces);

        let mut vertices = ElementStore::new();
        for (_, v) in self.vertices.iter() {
            let mut v = *v;
            v.incident_half_edge = remap(v.incident_half_edge, &hmap);
            vertices.insert(v);
        }

        let mut half_edges = ElementStore::new();
        for (_, he) in self.half_edges.iter() {
            let mut he = *he;
            he.from_vertex = remap(he.from_vertex, &vmap);
            he.to_vertex = remap(he.to_vertex, &vmap);
            he.twin = remap(he.twin, &hmap);
            he.next = remap(he.next, &hmap);
            he.prev = remap(he.prev, &hmap);
            he.face = remap(he.face, &fmap);
            half_edges.insert(he);
        }

        let mut faces = ElementStore::new();
        for (_, f) in self.faces.iter() {
            let mut f = f.clone();
            f.outer_half_edge = remap(f.outer_half_edge, &hmap);
            for inner in &mut f.inner_half_edges {
                *inner = remap_required(*inner, &hmap);
            }
            faces.insert(f);
        }

        self.vertices = vertices;
        self.half_edges = half_edges;
        self.faces = faces;
    }
}

impl Default for Dcel {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: the same live ids per store with equal records. The
/// id counters, recycling pools and the cached bounding box are not part of
/// the comparison.
impl PartialEq for Dcel {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.half_edges == other.half_edges
            && self.faces == other.faces
    }
}


// ----- Indexing by handle ---------------------------------------------------

macro_rules! impl_index {
    ($handle:ident, $elem:ident, $field:ident, $name:expr) => {
        impl ops::Index<$handle> for Dcel {
            type Output = $elem;
            fn index(&self, h: $handle) -> &Self::Output {
                match self.$field.get(h) {
                    Some(elem) => elem,
                    None => panic!(concat!("no ", $name, " with handle {:?}"), h),
                }
            }
        }

        impl ops::IndexMut<$handle> for Dcel {
            fn index_mut(&mut self, h: $handle) -> &mut Self::Output {
                match self.$field.get_mut(h) {
                    Some(elem) => elem,
                    None => panic!(concat!("no ", $name, " with handle {:?}"), h),
                }
            }
        }
    }
}

impl_index!(VertexHandle, Vertex, vertices, "vertex");
impl_index!(HalfEdgeHandle, HalfEdge, half_edges, "half-edge");
impl_index!(FaceHandle, Face, faces, "face");


// ----- Element iterators ----------------------------------------------------

macro_rules! impl_element_iter {
    ($name:ident, $handle:ident, $elem:ident, $ref_type:ident) => {
        #[derive(Clone)]
        pub struct $name<'a> {
            mesh: &'a Dcel,
            handles: store::Handles<'a, $handle, $elem>,
        }

        impl<'a> Iterator for $name<'a> {
            type Item = $ref_type<'a>;
            fn next(&mut self) -> Option<Self::Item> {
                let mesh = self.mesh;
                self.handles.next().map(move |h| $ref_type::new(mesh, h))
            }
        }
    }
}

impl_element_iter!(Vertices, VertexHandle, Vertex, VertexRef);
impl_element_iter!(HalfEdges, HalfEdgeHandle, HalfEdge, HalfEdgeRef);
impl_element_iter!(Faces, FaceHandle, Face, FaceRef);
