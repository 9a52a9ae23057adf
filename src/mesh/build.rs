//! Building a mesh from indexed face lists and flattening it back.
//!
//! This is the bridge between the connectivity-free "positions plus index
//! loops" representation most exchange formats use and the linked half-edge
//! structure. [`Dcel::from_indexed`] wires up all links in one pass and
//! pairs twins through a directed edge map; [`Dcel::to_indexed`] walks the
//! outer boundaries and emits compact zero-based indices.

use cgmath::Point3;
use failure::Fail;
use fxhash::FxHashMap;

use crate::{
    handle::{HalfEdgeHandle, Opt, VertexHandle},
    mesh::Dcel,
};


/// Errors for mesh construction from indexed face lists.
#[derive(Debug, Fail)]
pub enum BuildError {
    /// A face references a vertex index that was never given.
    #[fail(
        display = "face {} references vertex index {}, but only {} vertices were given",
        face, index, num_vertices
    )]
    IndexOutOfRange {
        face: usize,
        index: usize,
        num_vertices: usize,
    },

    /// A face has fewer than three corners.
    #[fail(display = "face {} has only {} vertices (at least 3 required)", face, count)]
    FaceTooSmall {
        face: usize,
        count: usize,
    },

    /// The same directed edge occurs in two faces. The input is
    /// non-manifold or inconsistently wound.
    #[fail(
        display = "directed edge ({}, {}) occurs in more than one face \
            (non-manifold or inconsistently wound input)",
        from, to
    )]
    NonManifold {
        from: usize,
        to: usize,
    },
}

impl Dcel {
    /// Builds a mesh from raw positions and per-face index loops.
    ///
    /// Every index loop describes one face by its outer boundary, in
    /// order. Half-edges of opposite direction are paired as twins;
    /// directed edges without an opposite (the border of an open mesh)
    /// keep their twin unset. Face and vertex normals and the bounding box
    /// are computed before returning. Face areas are not (they may need a
    /// triangulation service), so they start out as zero.
    ///
    /// Fails if an index is out of range, a face has fewer than three
    /// corners or a directed edge occurs twice.
    pub fn from_indexed(
        coords: &[Point3<f64>],
        faces: &[Vec<usize>],
    ) -> Result<Self, BuildError> {
        let mut mesh = Dcel::new();

        let vhs: Vec<VertexHandle> = coords.iter()
            .map(|&p| mesh.add_vertex(p))
            .collect();

        // Directed edges seen so far, keyed by their input indices. Used
        // both to detect duplicates and to find the twin of a new edge.
        let mut edges: FxHashMap<(usize, usize), HalfEdgeHandle> = FxHashMap::default();

        for (fi, corners) in faces.iter().enumerate() {
            let n = corners.len();
            if n < 3 {
                return Err(BuildError::FaceTooSmall { face: fi, count: n });
            }
            if let Some(&index) = corners.iter().find(|&&i| i >= coords.len()) {
                return Err(BuildError::IndexOutOfRange {
                    face: fi,
                    index,
                    num_vertices: coords.len(),
                });
            }

            let fh = mesh.add_face();
            let hes: Vec<HalfEdgeHandle> = (0..n).map(|_| mesh.add_half_edge()).collect();

            for i in 0..n {
                let (from, to) = (corners[i], corners[(i + 1) % n]);
                let he = hes[i];

                if edges.insert((from, to), he).is_some() {
                    return Err(BuildError::NonManifold { from, to });
                }
                if let Some(&twin) = edges.get(&(to, from)) {
                    mesh[he].twin = Opt::some(twin);
                    mesh[twin].twin = Opt::some(he);
                }

                mesh[he].from_vertex = Opt::some(vhs[from]);
                mesh[he].to_vertex = Opt::some(vhs[to]);
                mesh[he].next = Opt::some(hes[(i + 1) % n]);
                mesh[he].prev = Opt::some(hes[(i + n - 1) % n]);
                mesh[he].face = Opt::some(fh);
                mesh[vhs[from]].incident_half_edge = Opt::some(he);
            }

            mesh[fh].outer_half_edge = Opt::some(hes[0]);
        }

        mesh.update_face_normals();
        mesh.update_vertex_normals();
        mesh.update_bounding_box();

        Ok(mesh)
    }

    /// Flattens the mesh back into positions and per-face index loops.
    ///
    /// Vertices are emitted in ascending handle order and indices refer to
    /// that order, so id gaps from deleted elements disappear. Only outer
    /// boundaries are emitted; hole boundaries have no place in an indexed
    /// face list. Faces without an outer boundary are skipped.
    pub fn to_indexed(&self) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let mut positions = Vec::with_capacity(self.num_vertices() as usize);
        let mut index_of: FxHashMap<VertexHandle, usize> = FxHashMap::default();
        for v in self.vertices() {
            index_of.insert(v.handle(), positions.len());
            positions.push(v.coordinate());
        }

        let mut faces = Vec::with_capacity(self.num_faces() as usize);
        for face in self.faces() {
            let corners: Vec<usize> = face.outer_vertices()
                .map(|v| index_of[&v])
                .collect();
            if !corners.is_empty() {
                faces.push(corners);
            }
        }

        (positions, faces)
    }
}


#[cfg(test)]
mod tests {
    use cgmath::vec3;
    use super::*;

    fn square() -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let coords = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 2, 3]];
        (coords, faces)
    }

    #[test]
    fn two_triangles_share_one_twin_pair() {
        let (coords, faces) = square();
        let mesh = Dcel::from_indexed(&coords, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_half_edges(), 6);
        assert_eq!(mesh.num_faces(), 2);

        // Only the diagonal is shared; the four outer edges are border.
        let paired = mesh.half_edges().filter(|he| he.twin().is_some()).count();
        assert_eq!(paired, 2);

        for he in mesh.half_edges() {
            if let Some(twin) = he.twin().into_option() {
                assert_eq!(mesh[twin].twin.into_option(), Some(he.handle()));
                assert_eq!(he.from_vertex(), mesh.half_edge_ref(twin).to_vertex());
                assert_eq!(he.to_vertex(), mesh.half_edge_ref(twin).from_vertex());
            }
        }
    }

    #[test]
    fn normals_of_a_flat_mesh_point_up() {
        let (coords, faces) = square();
        let mesh = Dcel::from_indexed(&coords, &faces).unwrap();

        for f in mesh.faces() {
            assert_eq!(f.normal(), vec3(0.0, 0.0, 1.0));
        }
        for v in mesh.vertices() {
            assert_eq!(v.normal(), vec3(0.0, 0.0, 1.0));
        }

        let bb = mesh.bounding_box();
        assert_eq!(bb.min(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max(), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn to_indexed_of_a_fresh_mesh_reproduces_the_input() {
        let (coords, faces) = square();
        let mesh = Dcel::from_indexed(&coords, &faces).unwrap();

        let (out_coords, out_faces) = mesh.to_indexed();
        assert_eq!(out_coords, coords);

        // Loops may start at any corner, but must contain the same cycle.
        assert_eq!(out_faces.len(), 2);
        for (expected, got) in faces.iter().zip(&out_faces) {
            assert_eq!(expected.len(), got.len());
            let offset = got.iter().position(|i| *i == expected[0]).unwrap();
            for (k, &e) in expected.iter().enumerate() {
                assert_eq!(got[(offset + k) % got.len()], e);
            }
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let coords = vec![Point3::new(0.0, 0.0, 0.0); 3];
        let err = Dcel::from_indexed(&coords, &[vec![0, 1, 7]]).unwrap_err();
        match err {
            BuildError::IndexOutOfRange { face: 0, index: 7, num_vertices: 3 } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let coords = vec![Point3::new(0.0, 0.0, 0.0); 3];
        let err = Dcel::from_indexed(&coords, &[vec![0, 1]]).unwrap_err();
        match err {
            BuildError::FaceTooSmall { face: 0, count: 2 } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn repeated_directed_edge_is_rejected() {
        let (coords, _) = square();
        // Both faces run through the directed edge (0, 1).
        let err = Dcel::from_indexed(&coords, &[vec![0, 1, 2], vec![0, 1, 3]]).unwrap_err();
        match err {
            BuildError::NonManifold { from: 0, to: 1 } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
