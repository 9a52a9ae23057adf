//! Iterators over the neighborhood of faces and vertices.
//!
//! All iterators in here are small copyable cursors: they borrow the mesh
//! immutably, carry O(1) state and can be cloned to restart or fork a walk.
//! They yield handles, not references, so the caller can go back to the
//! mesh for mutation between steps (ending the borrow first).
//!
//! Two walks cover everything:
//!
//! - The *cycle* walk follows `next` around one boundary cycle (outer or
//!   inner) until it reaches its starting half-edge again, or an explicit
//!   final half-edge when the walk is bounded.
//! - The *umbrella* walk circulates around a vertex: from one outgoing
//!   half-edge `c`, the next outgoing one is `c.twin.next`.
//!
//! ```text
//!    v4 ______ v3
//!      \      /
//!       \ f2 /
//!        \  / f1
//!         \/______ v2
//!         /\
//!        /  \ f0
//!       /    \
//!     v5      v1
//! ```
//!
//! Iterating the umbrella of the middle vertex visits the spokes towards
//! `v1 … v5` one after the other, and `f0, f1, f2` once each.
//!
//! Both walks panic with a descriptive message when a `next` or `prev`
//! link is unset: a cycle with holes in it is a broken mesh, and
//! continuing would silently produce wrong results. An unset *twin* is
//! not an error, it marks the border of an open mesh. When the forward
//! sweep (`twin.next`) of the umbrella runs into the border, the walk
//! picks up the remaining spokes by sweeping backwards (`prev.twin`)
//! from the start, so every spoke is still visited exactly once.

use crate::{
    handle::{Opt, FaceHandle, HalfEdgeHandle, VertexHandle},
    mesh::Dcel,
};


impl Dcel {
    // Required-link lookups for traversal code. `[]` already panics for
    // stale handles; these add the "link is unset" case.

    pub(crate) fn next_of(&self, he: HalfEdgeHandle) -> HalfEdgeHandle {
        match self[he].next.into_option() {
            Some(out) => out,
            None => panic!("half-edge {:?} has no `next` link (broken cycle)", he),
        }
    }

    pub(crate) fn prev_of(&self, he: HalfEdgeHandle) -> HalfEdgeHandle {
        match self[he].prev.into_option() {
            Some(out) => out,
            None => panic!("half-edge {:?} has no `prev` link (broken cycle)", he),
        }
    }

    pub(crate) fn from_of(&self, he: HalfEdgeHandle) -> VertexHandle {
        match self[he].from_vertex.into_option() {
            Some(out) => out,
            None => panic!("half-edge {:?} has no origin vertex", he),
        }
    }

    pub(crate) fn to_of(&self, he: HalfEdgeHandle) -> VertexHandle {
        match self[he].to_vertex.into_option() {
            Some(out) => out,
            None => panic!("half-edge {:?} has no destination vertex", he),
        }
    }

    /// Walks the boundary cycle containing `start` (following `next`),
    /// beginning at `start` itself.
    pub fn half_edge_cycle(&self, start: HalfEdgeHandle) -> CycleIter<'_> {
        CycleIter::new(self, Opt::some(start))
    }

    /// Finds the boundary half-edge of `f` whose origin is `v`, by scanning
    /// the incoming half-edges of `v` for one lying on a boundary of `f`.
    /// `None` if `v` is not incident to `f`.
    pub(crate) fn boundary_start_at(
        &self,
        f: FaceHandle,
        v: VertexHandle,
    ) -> Option<HalfEdgeHandle> {
        let incoming = IncomingHalfEdges {
            umbrella: Umbrella::around(self, v),
        };
        for inc in incoming {
            if self[inc].face == Opt::some(f) {
                return Some(self.next_of(inc));
            }
        }
        None
    }
}


// ----- The cycle walk -------------------------------------------------------

#[derive(Clone)]
enum Cycle<'a> {
    Empty,
    NonEmpty {
        mesh: &'a Dcel,
        current: HalfEdgeHandle,
        start: HalfEdgeHandle,
        /// Reaching this half-edge ends the walk without yielding it. A
        /// full cycle is bounded by its own start.
        until: HalfEdgeHandle,
    },
}

impl<'a> Cycle<'a> {
    fn new(mesh: &'a Dcel, start: Opt<HalfEdgeHandle>) -> Self {
        match start.into_option() {
            None => Cycle::Empty,
            Some(start) => Cycle::NonEmpty { mesh, current: start, start, until: start },
        }
    }

    fn bounded(mesh: &'a Dcel, start: HalfEdgeHandle, until: HalfEdgeHandle) -> Self {
        Cycle::NonEmpty { mesh, current: start, start, until }
    }
}

impl Iterator for Cycle<'_> {
    type Item = HalfEdgeHandle;
    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            Cycle::Empty => None,
            Cycle::NonEmpty { mesh, current, start, until } => {
                let after = mesh.next_of(current);
                if after == until {
                    *self = Cycle::Empty;
                } else if after == start {
                    // The cycle closed without passing `until`: the bound
                    // lies on some other cycle.
                    panic!(
                        "boundary cycle through {:?} does not contain {:?}",
                        start,
                        until,
                    );
                } else {
                    *self = Cycle::NonEmpty { mesh, current: after, start, until };
                }
                Some(current)
            }
        }
    }
}

/// Iterator over the half-edges of one boundary cycle, in `next` order.
#[derive(Clone)]
pub struct CycleIter<'a>(Cycle<'a>);

impl<'a> CycleIter<'a> {
    pub(crate) fn new(mesh: &'a Dcel, start: Opt<HalfEdgeHandle>) -> Self {
        CycleIter(Cycle::new(mesh, start))
    }

    /// A walk from `start` that ends at `until` instead of yielding it.
    /// Panics mid-walk if the cycle closes without passing `until`.
    pub(crate) fn bounded(
        mesh: &'a Dcel,
        start: HalfEdgeHandle,
        until: HalfEdgeHandle,
    ) -> Self {
        CycleIter(Cycle::bounded(mesh, start, until))
    }
}

impl Iterator for CycleIter<'_> {
    type Item = HalfEdgeHandle;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

/// Iterator over the origin vertices of one boundary cycle.
#[derive(Clone)]
pub struct CycleVertices<'a>(Cycle<'a>);

impl<'a> CycleVertices<'a> {
    pub(crate) fn new(mesh: &'a Dcel, start: Opt<HalfEdgeHandle>) -> Self {
        CycleVertices(Cycle::new(mesh, start))
    }

    pub(crate) fn bounded(
        mesh: &'a Dcel,
        start: HalfEdgeHandle,
        until: HalfEdgeHandle,
    ) -> Self {
        CycleVertices(Cycle::bounded(mesh, start, until))
    }
}

impl Iterator for CycleVertices<'_> {
    type Item = VertexHandle;
    fn next(&mut self) -> Option<Self::Item> {
        let mesh = match &self.0 {
            Cycle::Empty => return None,
            Cycle::NonEmpty { mesh, .. } => *mesh,
        };
        self.0.next().map(|he| mesh.from_of(he))
    }
}

/// Iterator over the neighboring faces along one boundary cycle, yielding
/// `twin.face` of every half-edge that has both. A face sharing several
/// edges with the cycle is yielded once per shared edge.
#[derive(Clone)]
pub struct AdjacentFaces<'a>(Cycle<'a>);

impl<'a> AdjacentFaces<'a> {
    pub(crate) fn new(mesh: &'a Dcel, start: Opt<HalfEdgeHandle>) -> Self {
        AdjacentFaces(Cycle::new(mesh, start))
    }
}

impl Iterator for AdjacentFaces<'_> {
    type Item = FaceHandle;
    fn next(&mut self) -> Option<Self::Item> {
        let mesh = match &self.0 {
            Cycle::Empty => return None,
            Cycle::NonEmpty { mesh, .. } => *mesh,
        };
        loop {
            let he = self.0.next()?;
            let neighbor = mesh[he].twin
                .into_option()
                .and_then(|twin| mesh[twin].face.into_option());
            if let Some(f) = neighbor {
                return Some(f);
            }
        }
    }
}


// ----- The umbrella walk ----------------------------------------------------

#[derive(Clone)]
enum Umbrella<'a> {
    Empty,
    /// Sweeping `twin.next` away from `start`.
    Forward {
        mesh: &'a Dcel,
        /// An outgoing half-edge of the circulated vertex.
        current: HalfEdgeHandle,
        start: HalfEdgeHandle,
    },
    /// The forward sweep ran into the border of an open mesh. The spokes
    /// on the other side of `start` are reached with the inverse step,
    /// `prev.twin`.
    Backward {
        mesh: &'a Dcel,
        current: HalfEdgeHandle,
    },
}

impl<'a> Umbrella<'a> {
    fn around(mesh: &'a Dcel, v: VertexHandle) -> Self {
        match mesh[v].incident_half_edge.into_option() {
            None => Umbrella::Empty,
            Some(start) => Umbrella::Forward { mesh, current: start, start },
        }
    }

    fn mesh(&self) -> Option<&'a Dcel> {
        match *self {
            Umbrella::Empty => None,
            Umbrella::Forward { mesh, .. } | Umbrella::Backward { mesh, .. } => Some(mesh),
        }
    }

    /// The spoke rotationally before `spoke`, or `None` at the border.
    fn spoke_before(mesh: &Dcel, spoke: HalfEdgeHandle) -> Option<HalfEdgeHandle> {
        mesh[mesh.prev_of(spoke)].twin.into_option()
    }
}

impl Iterator for Umbrella<'_> {
    /// The current *outgoing* half-edge.
    type Item = HalfEdgeHandle;
    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            Umbrella::Empty => None,
            Umbrella::Forward { mesh, current, start } => {
                *self = match mesh[current].twin.into_option() {
                    Some(twin) => {
                        let after = mesh.next_of(twin);
                        if after == start {
                            Umbrella::Empty
                        } else {
                            Umbrella::Forward { mesh, current: after, start }
                        }
                    }
                    // `current` lies on the border, so the cycle will never
                    // close. Turn around and sweep from `start` in the other
                    // direction.
                    None => match Self::spoke_before(mesh, start) {
                        Some(before) => Umbrella::Backward { mesh, current: before },
                        None => Umbrella::Empty,
                    },
                };
                Some(current)
            }
            Umbrella::Backward { mesh, current } => {
                *self = match Self::spoke_before(mesh, current) {
                    Some(before) => Umbrella::Backward { mesh, current: before },
                    None => Umbrella::Empty,
                };
                Some(current)
            }
        }
    }
}

macro_rules! impl_umbrella_iter {
    ($(#[$attr:meta])* $name:ident, $item:ident, |$mesh:ident, $he:ident| $map:expr) => {
        $(#[$attr])*
        #[derive(Clone)]
        pub struct $name<'a> {
            umbrella: Umbrella<'a>,
        }

        impl<'a> $name<'a> {
            pub(crate) fn around(mesh: &'a Dcel, v: VertexHandle) -> Self {
                Self { umbrella: Umbrella::around(mesh, v) }
            }
        }

        impl Iterator for $name<'_> {
            type Item = $item;
            fn next(&mut self) -> Option<Self::Item> {
                let $mesh = self.umbrella.mesh()?;
                loop {
                    let $he = self.umbrella.next()?;
                    if let Some(out) = $map {
                        return Some(out);
                    }
                }
            }
        }
    }
}

impl_umbrella_iter!(
    /// Iterator over the outgoing half-edges of a vertex.
    OutgoingHalfEdges, HalfEdgeHandle, |_mesh, he| Some(he)
);
impl_umbrella_iter!(
    /// Iterator over the incoming half-edges of a vertex. Each spoke
    /// contributes the half-edge arriving right before it in its cycle,
    /// which exists even where the spoke's twin does not.
    IncomingHalfEdges, HalfEdgeHandle, |mesh, he| Some(mesh.prev_of(he))
);
impl_umbrella_iter!(
    /// Iterator over the faces around a vertex. Unset faces (boundary gaps
    /// of an open mesh) are skipped.
    IncidentFaces, FaceHandle, |mesh, he| mesh[he].face.into_option()
);
impl_umbrella_iter!(
    /// Iterator over the vertices connected to a vertex by an edge.
    AdjacentVertices, VertexHandle, |mesh, he| Some(mesh.to_of(he))
);
