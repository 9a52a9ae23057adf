//! Geometric operations on the mesh: normals, areas, the bounding box,
//! affine transforms and polygon triangulation.

use cgmath::{Matrix3, Point3, Vector3, prelude::*};
use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    geom::{project_to_xy, rotation_onto_z, winding_sum, Aabb},
    handle::{hsize, Handle, Opt, FaceHandle, HalfEdgeHandle, VertexHandle},
    mesh::{Dcel, Face, HalfEdge},
    triangulate::{Triangulate, TriangulationError},
};


/// `|(p3 - p1) × (p2 - p1)| / 2`
fn triangle_area(p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> f64 {
    (p3 - p1).cross(p2 - p1).magnitude() / 2.0
}

/// Exact-coordinate key. Triangulation services hand coordinates back
/// unchanged, so bit equality is the right notion here.
fn coord_key(p: Point3<f64>) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

impl Dcel {
    // ----- Normals ----------------------------------------------------------

    /// Recomputes and stores the normal of `f`, returning it.
    ///
    /// The normal is the normalized cross product of the first two outer
    /// boundary edge vectors. For non-triangular faces the winding of the
    /// boundary is checked afterwards: the boundary is rotated into the
    /// plane perpendicular to z and its signed edge sum computed; a
    /// clockwise loop means the cross product picked the wrong side, so the
    /// normal is flipped.
    ///
    /// A face without outer boundary or with degenerate boundary geometry
    /// (zero cross product) gets the zero vector.
    pub fn update_face_normal(&mut self, f: FaceHandle) -> Vector3<f64> {
        let outer = match self[f].outer_half_edge.into_option() {
            None => {
                self[f].normal = Vector3::zero();
                return Vector3::zero();
            }
            Some(he) => he,
        };

        let second = self.next_of(outer);
        let a = self[self.from_of(outer)].coordinate;
        let b = self[self.to_of(outer)].coordinate;
        let c = self[self.to_of(second)].coordinate;

        let cross = (b - a).cross(c - b);
        let len = cross.magnitude();
        if len == 0.0 || !len.is_finite() {
            self[f].normal = Vector3::zero();
            return Vector3::zero();
        }
        let mut normal = cross / len;

        // Triangle check by advancing three links, like `is_triangle`.
        let third = self.next_of(second);
        if self.to_of(third) != self.from_of(outer) {
            let m = rotation_onto_z(normal);
            let loop_2d: Vec<(f64, f64)> = self.face_ref(f)
                .outer_vertices()
                .map(|v| project_to_xy(&m, self[v].coordinate))
                .collect();

            if winding_sum(&loop_2d) > 0.0 {
                normal = -normal;
            }
        }

        self[f].normal = normal;
        normal
    }

    /// Runs [`update_face_normal`][Self::update_face_normal] on every face.
    pub fn update_face_normals(&mut self) {
        let faces: Vec<_> = self.faces.handles().collect();
        for f in faces {
            self.update_face_normal(f);
        }
    }

    /// Recomputes and stores the normal of `v` as the unweighted mean of
    /// the normals currently stored on its incident faces. A vertex without
    /// incident faces gets the zero vector.
    pub fn update_vertex_normal(&mut self, v: VertexHandle) -> Vector3<f64> {
        let mut sum = Vector3::zero();
        let mut n = 0;
        for f in self.vertex_ref(v).incident_faces() {
            sum += self[f].normal;
            n += 1;
        }

        let normal = if n == 0 { Vector3::zero() } else { sum / f64::from(n) };
        self[v].normal = normal;
        normal
    }

    /// Runs [`update_vertex_normal`][Self::update_vertex_normal] on every
    /// vertex. Face normals are used as stored; refresh them first.
    pub fn update_vertex_normals(&mut self) {
        let vertices: Vec<_> = self.vertices.handles().collect();
        for v in vertices {
            self.update_vertex_normal(v);
        }
    }

    // ----- Areas ------------------------------------------------------------

    /// Recomputes and stores the area of `f`, returning it. The face normal
    /// is refreshed first.
    ///
    /// For a triangle the area is computed directly from its three corners.
    /// Any other face is triangulated through `service` and the triangle
    /// areas are summed.
    pub fn update_face_area<S: Triangulate>(
        &mut self,
        f: FaceHandle,
        service: &S,
    ) -> Result<f64, TriangulationError> {
        self.update_face_normal(f);

        let area = match self[f].outer_half_edge.into_option() {
            None => 0.0,
            Some(outer) if self.face_ref(f).is_triangle() => triangle_area(
                self[self.from_of(outer)].coordinate,
                self[self.to_of(outer)].coordinate,
                self[self.from_of(self.prev_of(outer))].coordinate,
            ),
            Some(_) => {
                let mut sum = 0.0;
                for [va, vb, vc] in self.face_triangulation(f, service)? {
                    sum += triangle_area(
                        self[va].coordinate,
                        self[vb].coordinate,
                        self[vc].coordinate,
                    );
                }
                sum
            }
        };

        self[f].area = area;
        Ok(area)
    }

    /// Runs [`update_face_area`][Self::update_face_area] on every face.
    pub fn update_face_areas<S: Triangulate>(
        &mut self,
        service: &S,
    ) -> Result<(), TriangulationError> {
        let faces: Vec<_> = self.faces.handles().collect();
        for f in faces {
            self.update_face_area(f, service)?;
        }
        Ok(())
    }

    /// Sum of the *stored* face areas. Run
    /// [`update_face_areas`][Self::update_face_areas] first if the mesh
    /// was edited since the areas were last computed.
    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(|(_, f)| f.area).sum()
    }

    // ----- Bounding box -----------------------------------------------------

    /// Recomputes the bounding box from all vertex coordinates, caches and
    /// returns it. The box of an empty mesh is
    /// [invalid][crate::Aabb::is_valid].
    pub fn update_bounding_box(&mut self) -> Aabb {
        let bb = Aabb::around(self.vertices.iter().map(|(_, v)| v.coordinate));
        self.bounding_box = bb;
        bb
    }

    /// The cached bounding box, as of the last
    /// [`update_bounding_box`][Self::update_bounding_box].
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    // ----- Whole-mesh queries -----------------------------------------------

    /// Whether every face is a triangle. Vacuously true for a mesh without
    /// faces.
    pub fn is_triangle_mesh(&self) -> bool {
        self.faces().all(|f| f.is_triangle())
    }

    // ----- Affine transforms ------------------------------------------------

    /// Remaps all vertex coordinates so that the mesh's bounding box becomes
    /// `target`, axis by axis, then refreshes the cached box. Does nothing
    /// if the mesh is empty or `target` is invalid.
    pub fn scale(&mut self, target: Aabb) {
        let current = self.update_bounding_box();
        if !current.is_valid() || !target.is_valid() {
            return;
        }

        let cur_size = current.size();
        let tgt_size = target.size();
        // A zero-extent axis holds a single coordinate value; it is moved,
        // not scaled.
        let factor = |tgt: f64, cur: f64| if cur == 0.0 { 1.0 } else { tgt / cur };
        let fx = factor(tgt_size.x, cur_size.x);
        let fy = factor(tgt_size.y, cur_size.y);
        let fz = factor(tgt_size.z, cur_size.z);

        let vertices: Vec<_> = self.vertices.handles().collect();
        for v in vertices {
            let p = self[v].coordinate;
            self[v].coordinate = Point3::new(
                target.min().x + (p.x - current.min().x) * fx,
                target.min().y + (p.y - current.min().y) * fy,
                target.min().z + (p.z - current.min().z) * fz,
            );
        }

        self.update_bounding_box();
    }

    /// Rotates every vertex around `centroid` (`p ← m·(p−c) + c`), then
    /// refreshes face normals, vertex normals and the bounding box.
    pub fn rotate(&mut self, matrix: Matrix3<f64>, centroid: Point3<f64>) {
        let vertices: Vec<_> = self.vertices.handles().collect();
        for v in vertices {
            let p = self[v].coordinate;
            self[v].coordinate = centroid + matrix * (p - centroid);
        }

        self.update_face_normals();
        self.update_vertex_normals();
        self.update_bounding_box();
    }

    // ----- Triangulation ----------------------------------------------------

    /// Returns a triangulation of `f` as vertex handle triples, without
    /// changing the mesh.
    ///
    /// A triangle face yields its own corner triple directly. Any other
    /// face is handed to `service` as coordinate loops (outer boundary,
    /// stored normal, one loop per hole); the returned coordinate triples
    /// are mapped back to vertex handles by exact coordinate lookup over
    /// the face's boundary vertices. Boundary vertices with identical
    /// coordinates map to the last one encountered, deterministically. A
    /// coordinate that matches no boundary vertex is a data-integrity
    /// failure and yields an error.
    pub fn face_triangulation<S: Triangulate>(
        &self,
        f: FaceHandle,
        service: &S,
    ) -> Result<Vec<[VertexHandle; 3]>, TriangulationError> {
        let fref = self.face_ref(f);

        if let Some(outer) = self[f].outer_half_edge.into_option() {
            if fref.is_triangle() {
                let a = self.from_of(outer);
                let b = self.to_of(outer);
                let c = self.to_of(self.next_of(outer));
                return Ok(vec![[a, b, c]]);
            }
        }

        let mut vertex_of: FxHashMap<[u64; 3], VertexHandle> = FxHashMap::default();
        let mut outer = Vec::new();
        for v in fref.outer_vertices() {
            let p = self[v].coordinate;
            outer.push(p);
            vertex_of.insert(coord_key(p), v);
        }

        let mut holes = Vec::new();
        for rep in fref.inner_half_edges() {
            let mut hole = Vec::new();
            for he in self.half_edge_cycle(rep) {
                let v = self.from_of(he);
                let p = self[v].coordinate;
                hole.push(p);
                vertex_of.insert(coord_key(p), v);
            }
            holes.push(hole);
        }

        let triangles = service.triangulate(&outer, self[f].normal, &holes)?;

        triangles.into_iter()
            .map(|tri| {
                let mut out = [VertexHandle::new(0); 3];
                for (slot, p) in out.iter_mut().zip(tri.iter()) {
                    *slot = match vertex_of.get(&coord_key(*p)) {
                        Some(&v) => v,
                        None => return Err(TriangulationError::UnmatchedCoordinate {
                            face: f,
                            coordinate: *p,
                        }),
                    };
                }
                Ok(out)
            })
            .collect()
    }

    /// Replaces a non-triangular face by triangles.
    ///
    /// The polygon (outer boundary plus holes) is triangulated through
    /// `service`. All existing boundary half-edges are kept and relinked
    /// into the triangles they border; one new half-edge pair is created
    /// per interior diagonal. `f` itself becomes the first triangle, every
    /// further triangle gets a new face inheriting flag and color. Hole
    /// lists are consumed, the new faces' normals are refreshed, and the
    /// number of *new* faces is returned.
    ///
    /// An already triangular face is left untouched (returns 0).
    pub fn triangulate_face<S: Triangulate>(
        &mut self,
        f: FaceHandle,
        service: &S,
    ) -> Result<hsize, TriangulationError> {
        if self.face_ref(f).is_triangle() {
            return Ok(0);
        }

        let triangles = self.face_triangulation(f, service)?;
        if triangles.is_empty() {
            return Err(TriangulationError::EmptyResult { face: f });
        }

        // All directed boundary edges of the polygon. Every one of them
        // reappears as a triangle edge and is relinked in place; its twin
        // (in a neighboring face, or unset on an open border) stays valid
        // throughout.
        let mut border: FxHashMap<(hsize, hsize), HalfEdgeHandle> = FxHashMap::default();
        let boundary_cycles: Vec<HalfEdgeHandle> = self.face_ref(f)
            .outer_half_edge()
            .into_option()
            .into_iter()
            .chain(self.face_ref(f).inner_half_edges())
            .collect();
        for start in boundary_cycles {
            for he in self.half_edge_cycle(start) {
                let key = (self.from_of(he).idx(), self.to_of(he).idx());
                border.insert(key, he);
            }
        }

        let normal = self[f].normal;
        let flag = self[f].flag;
        let color = self[f].color;

        let mut diagonals: FxHashMap<(hsize, hsize), HalfEdgeHandle> = FxHashMap::default();
        let mut new_faces = 0;
        let mut touched = Vec::with_capacity(triangles.len());

        for (i, tri) in triangles.iter().enumerate() {
            // Orient the triangle to wind like the face it replaces.
            let [a, b, c] = *tri;
            let (pa, pb, pc) = (
                self[a].coordinate,
                self[b].coordinate,
                self[c].coordinate,
            );
            let [a, b, c] = if (pb - pa).cross(pc - pb).dot(normal) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            };

            let face = if i == 0 {
                f
            } else {
                new_faces += 1;
                self.add_face_from(Face {
                    flag,
                    color,
                    ..Face::default()
                })
            };
            touched.push(face);

            let mut hes = [HalfEdgeHandle::new(0); 3];
            for (slot, &(u, v)) in hes.iter_mut().zip(&[(a, b), (b, c), (c, a)]) {
                let key = (u.idx(), v.idx());
                *slot = if let Some(&he) = border.get(&key) {
                    he
                } else if let Some(&he) = diagonals.get(&key) {
                    he
                } else {
                    let he = self.add_half_edge_from(HalfEdge {
                        from_vertex: Opt::some(u),
                        to_vertex: Opt::some(v),
                        ..HalfEdge::default()
                    });
                    diagonals.insert(key, he);
                    if let Some(&twin) = diagonals.get(&(v.idx(), u.idx())) {
                        self[he].twin = Opt::some(twin);
                        self[twin].twin = Opt::some(he);
                    }
                    he
                };
            }

            for k in 0..3 {
                let cur = hes[k];
                let nxt = hes[(k + 1) % 3];
                self[cur].next = Opt::some(nxt);
                self[nxt].prev = Opt::some(cur);
                self[cur].face = Opt::some(face);
            }

            self[face].outer_half_edge = Opt::some(hes[0]);
            self[a].incident_half_edge = Opt::some(hes[0]);
            self[b].incident_half_edge = Opt::some(hes[1]);
            self[c].incident_half_edge = Opt::some(hes[2]);
        }

        // The holes are tiled over now.
        self[f].inner_half_edges = SmallVec::new();

        for face in touched {
            self.update_face_normal(face);
        }

        Ok(new_faces)
    }

    /// Triangulates every non-triangular face of the mesh through
    /// `service`.
    pub fn triangulate<S: Triangulate>(
        &mut self,
        service: &S,
    ) -> Result<(), TriangulationError> {
        let faces: Vec<_> = self.faces.handles().collect();
        for f in faces {
            if !self.face_ref(f).is_triangle() {
                self.triangulate_face(f, service)?;
            }
        }
        Ok(())
    }
}
