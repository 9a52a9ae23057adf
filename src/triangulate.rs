//! The polygon triangulation seam.
//!
//! The mesh core never triangulates polygons itself. Operations that need a
//! triangulation ([`update_face_area`][crate::Dcel::update_face_area],
//! [`triangulate_face`][crate::Dcel::triangulate_face], …) take a service
//! implementing [`Triangulate`] as an argument and map its result back onto
//! the mesh. The `triangulation` feature (on by default) provides
//! [`Earcut`], an implementation backed by the `earcutr` crate.

use cgmath::{Point3, Vector3};
use failure::Fail;

use crate::handle::FaceHandle;


/// A polygon triangulation service.
pub trait Triangulate {
    /// Triangulates the polygon given by its outer boundary loop, its
    /// normal and one coordinate loop per hole.
    ///
    /// The returned triangles must consist of *input coordinates*,
    /// unchanged, so the caller can map them back to its own vertex data.
    /// An empty result is legal for degenerate input.
    fn triangulate(
        &self,
        outer: &[Point3<f64>],
        normal: Vector3<f64>,
        holes: &[Vec<Point3<f64>>],
    ) -> Result<Vec<[Point3<f64>; 3]>, TriangulationError>;
}

/// Errors arising from polygon triangulation or from mapping its result
/// back onto the mesh.
#[derive(Debug, Fail)]
pub enum TriangulationError {
    /// The underlying service failed.
    #[fail(display = "polygon triangulation service failed: {}", _0)]
    Service(String),

    /// The service produced no triangles, but the face has to be replaced
    /// by something.
    #[fail(display = "triangulation of face {:?} produced no triangles", face)]
    EmptyResult {
        face: FaceHandle,
    },

    /// A coordinate returned by the service matches no vertex on the
    /// face's boundary.
    #[fail(
        display = "triangulated coordinate {:?} does not lie on the boundary of face {:?}",
        coordinate, face
    )]
    UnmatchedCoordinate {
        face: FaceHandle,
        coordinate: Point3<f64>,
    },
}


/// Ear clipping triangulation via the `earcutr` crate.
///
/// The loops are rotated into the plane perpendicular to the given normal
/// (the same projection the mesh uses for winding checks), flattened to 2D
/// and handed to `earcutr` together with the hole start offsets. Returned
/// indices are mapped back through a lookup table, so the output triangles
/// consist of exactly the input coordinates. Triangles with repeated
/// corners are dropped.
#[cfg(feature = "triangulation")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Earcut;

#[cfg(feature = "triangulation")]
impl Triangulate for Earcut {
    fn triangulate(
        &self,
        outer: &[Point3<f64>],
        normal: Vector3<f64>,
        holes: &[Vec<Point3<f64>>],
    ) -> Result<Vec<[Point3<f64>; 3]>, TriangulationError> {
        let m = crate::geom::rotation_onto_z(normal);

        let num_points = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
        let mut flat = Vec::with_capacity(num_points * 2);
        let mut lut = Vec::with_capacity(num_points);
        let mut hole_indices = Vec::with_capacity(holes.len());

        for &p in outer {
            let (x, y) = crate::geom::project_to_xy(&m, p);
            flat.push(x);
            flat.push(y);
            lut.push(p);
        }
        for hole in holes {
            hole_indices.push(lut.len());
            for &p in hole {
                let (x, y) = crate::geom::project_to_xy(&m, p);
                flat.push(x);
                flat.push(y);
                lut.push(p);
            }
        }

        let indices = earcutr::earcut(&flat, &hole_indices, 2)
            .map_err(|e| TriangulationError::Service(format!("{:?}", e)))?;

        let mut out = Vec::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                continue;
            }
            out.push([lut[tri[0]], lut[tri[1]], lut[tri[2]]]);
        }
        Ok(out)
    }
}


#[cfg(all(test, feature = "triangulation"))]
mod tests {
    use cgmath::{prelude::*, vec3};
    use super::*;

    #[test]
    fn square_becomes_two_triangles() {
        let outer = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];

        let tris = Earcut
            .triangulate(&outer, vec3(0.0, 0.0, 1.0), &[])
            .unwrap();
        assert_eq!(tris.len(), 2);

        // Every output coordinate is an input coordinate, bit for bit.
        for tri in &tris {
            for p in tri {
                assert!(outer.contains(p));
            }
        }
    }

    #[test]
    fn square_with_hole() {
        let outer = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let hole = vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];

        let tris = Earcut
            .triangulate(&outer, vec3(0.0, 0.0, 1.0), &[hole.clone()])
            .unwrap();

        // 8 boundary vertices and one hole: 8 triangles tile the ring.
        assert_eq!(tris.len(), 8);

        let area: f64 = tris.iter()
            .map(|[a, b, c]| (b - a).cross(c - a).magnitude() / 2.0)
            .sum();
        assert!((area - 12.0).abs() < 1e-9);
    }

    #[test]
    fn tilted_polygon_is_projected() {
        // The unit square rotated into the x = y plane.
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let outer = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, s, 0.0),
            Point3::new(s, s, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let normal = vec3(s, -s, 0.0);

        let tris = Earcut.triangulate(&outer, normal, &[]).unwrap();
        assert_eq!(tris.len(), 2);
    }
}
