//! The binary dcel format.
//!
//! A complete dump of the mesh: every live element with its id and all of
//! its links, followed by the three id counters and the bounding box.
//! Deserializing what [`serialize`][Dcel::serialize] wrote reproduces the
//! mesh exactly, including which ids are free for reuse.
//!
//! All numbers are little-endian. Ids are stored as `u32`, with
//! `u32::MAX` standing for an unset reference; floats are `f64`. The
//! stream layout is:
//!
//! 1. vertex count, then per vertex: id, coordinate, normal, flag,
//!    incident half-edge id;
//! 2. half-edge count, then per half-edge: id, from/to/twin/next/prev/face
//!    ids, flag;
//! 3. face count, then per face: id, outer half-edge id, inner half-edge
//!    count and ids, normal, area, color, flag;
//! 4. the three id counters, then the two bounding box corners.
//!
//! Reading rejects structurally broken files (duplicate ids, ids at or
//! above the stored counter, references to ids that hold no element) with
//! a descriptive [`Error`].

use std::{
    convert::TryFrom,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::{Point3, Vector3};
use smallvec::SmallVec;

use crate::{
    geom::Aabb,
    handle::{hsize, FaceHandle, HalfEdgeHandle, Handle, Opt, VertexHandle},
    io::{ElementKind, Error},
    mesh::{Dcel, Face, HalfEdge, Vertex},
    store::ElementStore,
};


/// The on-disk id standing for an unset reference.
const UNSET: u32 = u32::max_value();

fn wire_id(id: hsize) -> Result<u32, Error> {
    match u32::try_from(id) {
        Ok(x) if x != UNSET => Ok(x),
        _ => Err(Error::IdTooLarge(id as u64)),
    }
}

fn wire_count(n: hsize) -> Result<u32, Error> {
    u32::try_from(n).map_err(|_| Error::IdTooLarge(n as u64))
}

fn wire_opt<H: Handle>(opt: Opt<H>) -> Result<u32, Error> {
    match opt.into_option() {
        Some(h) => wire_id(h.idx()),
        None => Ok(UNSET),
    }
}

fn opt_from_wire<H: Handle>(raw: u32) -> Opt<H> {
    if raw == UNSET {
        Opt::none()
    } else {
        Opt::some(H::new(raw as hsize))
    }
}

fn write_point(w: &mut impl Write, p: Point3<f64>) -> io::Result<()> {
    w.write_f64::<LittleEndian>(p.x)?;
    w.write_f64::<LittleEndian>(p.y)?;
    w.write_f64::<LittleEndian>(p.z)
}

fn write_vector(w: &mut impl Write, v: Vector3<f64>) -> io::Result<()> {
    w.write_f64::<LittleEndian>(v.x)?;
    w.write_f64::<LittleEndian>(v.y)?;
    w.write_f64::<LittleEndian>(v.z)
}

fn read_point(r: &mut impl Read) -> io::Result<Point3<f64>> {
    Ok(Point3::new(
        r.read_f64::<LittleEndian>()?,
        r.read_f64::<LittleEndian>()?,
        r.read_f64::<LittleEndian>()?,
    ))
}

fn read_vector(r: &mut impl Read) -> io::Result<Vector3<f64>> {
    Ok(Vector3::new(
        r.read_f64::<LittleEndian>()?,
        r.read_f64::<LittleEndian>()?,
        r.read_f64::<LittleEndian>()?,
    ))
}

/// Reads a declared element id: any value but the unset sentinel.
fn read_declared_id(r: &mut impl Read, element: ElementKind) -> Result<u32, Error> {
    let id = r.read_u32::<LittleEndian>()?;
    if id == UNSET {
        return Err(Error::ReservedId { element, id });
    }
    Ok(id)
}

fn check_live<H: Handle, T>(
    store: &ElementStore<H, T>,
    h: H,
    element: ElementKind,
) -> Result<(), Error> {
    if store.contains(h) {
        Ok(())
    } else {
        Err(Error::DanglingReference { element, id: h.idx() as u32 })
    }
}

fn check_ref<H: Handle, T>(
    store: &ElementStore<H, T>,
    opt: Opt<H>,
    element: ElementKind,
) -> Result<(), Error> {
    match opt.into_option() {
        Some(h) => check_live(store, h, element),
        None => Ok(()),
    }
}

/// Checks that a store's largest used id lies below `counter` and restores
/// the recycling pool from the gaps.
fn restore_checked<H: Handle, T>(
    store: &mut ElementStore<H, T>,
    counter: u32,
    element: ElementKind,
) -> Result<(), Error> {
    if store.next_id() > counter as hsize {
        return Err(Error::IdAboveCounter {
            element,
            id: (store.next_id() - 1) as u32,
            counter,
        });
    }
    store.restore_counter(counter as hsize);
    Ok(())
}


impl Dcel {
    /// Writes the complete mesh structure into the given `Write` instance.
    pub fn serialize(&self, mut w: impl Write) -> Result<(), Error> {
        w.write_u32::<LittleEndian>(wire_count(self.vertices.len())?)?;
        for (h, vertex) in self.vertices.iter() {
            w.write_u32::<LittleEndian>(wire_id(h.idx())?)?;
            write_point(&mut w, vertex.coordinate)?;
            write_vector(&mut w, vertex.normal)?;
            w.write_u32::<LittleEndian>(vertex.flag)?;
            w.write_u32::<LittleEndian>(wire_opt(vertex.incident_half_edge)?)?;
        }

        w.write_u32::<LittleEndian>(wire_count(self.half_edges.len())?)?;
        for (h, he) in self.half_edges.iter() {
            w.write_u32::<LittleEndian>(wire_id(h.idx())?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.from_vertex)?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.to_vertex)?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.twin)?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.next)?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.prev)?)?;
            w.write_u32::<LittleEndian>(wire_opt(he.face)?)?;
            w.write_u32::<LittleEndian>(he.flag)?;
        }

        w.write_u32::<LittleEndian>(wire_count(self.faces.len())?)?;
        for (h, face) in self.faces.iter() {
            w.write_u32::<LittleEndian>(wire_id(h.idx())?)?;
            w.write_u32::<LittleEndian>(wire_opt(face.outer_half_edge)?)?;
            w.write_u32::<LittleEndian>(wire_count(face.inner_half_edges.len() as hsize)?)?;
            for &inner in &face.inner_half_edges {
                w.write_u32::<LittleEndian>(wire_id(inner.idx())?)?;
            }
            write_vector(&mut w, face.normal)?;
            w.write_f64::<LittleEndian>(face.area)?;
            w.write_all(&face.color)?;
            w.write_u32::<LittleEndian>(face.flag)?;
        }

        w.write_u32::<LittleEndian>(wire_count(self.vertices.next_id())?)?;
        w.write_u32::<LittleEndian>(wire_count(self.half_edges.next_id())?)?;
        w.write_u32::<LittleEndian>(wire_count(self.faces.next_id())?)?;
        write_point(&mut w, self.bounding_box.min())?;
        write_point(&mut w, self.bounding_box.max())?;

        Ok(())
    }

    /// Reads a mesh from the given `Read` instance.
    ///
    /// The file is rejected with a descriptive error if it declares an id
    /// twice, declares an id at or above its own id counter, or contains a
    /// reference to an id that holds no element.
    pub fn deserialize(mut r: impl Read) -> Result<Self, Error> {
        let mut mesh = Dcel::new();

        let num_vertices = r.read_u32::<LittleEndian>()?;
        for _ in 0..num_vertices {
            let id = read_declared_id(&mut r, ElementKind::Vertex)?;
            let vertex = Vertex {
                coordinate: read_point(&mut r)?,
                normal: read_vector(&mut r)?,
                flag: r.read_u32::<LittleEndian>()?,
                incident_half_edge: opt_from_wire(r.read_u32::<LittleEndian>()?),
            };

            let h = VertexHandle::new(id as hsize);
            if mesh.vertices.insert_at(h, vertex).is_some() {
                return Err(Error::DuplicateId { element: ElementKind::Vertex, id });
            }
        }

        let num_half_edges = r.read_u32::<LittleEndian>()?;
        for _ in 0..num_half_edges {
            let id = read_declared_id(&mut r, ElementKind::HalfEdge)?;
            let he = HalfEdge {
                from_vertex: opt_from_wire(r.read_u32::<LittleEndian>()?),
                to_vertex: opt_from_wire(r.read_u32::<LittleEndian>()?),
                twin: opt_from_wire(r.read_u32::<LittleEndian>()?),
                next: opt_from_wire(r.read_u32::<LittleEndian>()?),
                prev: opt_from_wire(r.read_u32::<LittleEndian>()?),
                face: opt_from_wire(r.read_u32::<LittleEndian>()?),
                flag: r.read_u32::<LittleEndian>()?,
            };

            let h = HalfEdgeHandle::new(id as hsize);
            if mesh.half_edges.insert_at(h, he).is_some() {
                return Err(Error::DuplicateId { element: ElementKind::HalfEdge, id });
            }
        }

        let num_faces = r.read_u32::<LittleEndian>()?;
        for _ in 0..num_faces {
            let id = read_declared_id(&mut r, ElementKind::Face)?;
            let outer_half_edge = opt_from_wire(r.read_u32::<LittleEndian>()?);
            let num_inner = r.read_u32::<LittleEndian>()?;
            let mut inner_half_edges = SmallVec::new();
            for _ in 0..num_inner {
                let raw = r.read_u32::<LittleEndian>()?;
                inner_half_edges.push(HalfEdgeHandle::new(raw as hsize));
            }

            let mut color = [0; 4];
            let face = Face {
                outer_half_edge,
                inner_half_edges,
                normal: read_vector(&mut r)?,
                area: r.read_f64::<LittleEndian>()?,
                color: {
                    r.read_exact(&mut color)?;
                    color
                },
                flag: r.read_u32::<LittleEndian>()?,
            };

            let h = FaceHandle::new(id as hsize);
            if mesh.faces.insert_at(h, face).is_some() {
                return Err(Error::DuplicateId { element: ElementKind::Face, id });
            }
        }

        let vertex_counter = r.read_u32::<LittleEndian>()?;
        let half_edge_counter = r.read_u32::<LittleEndian>()?;
        let face_counter = r.read_u32::<LittleEndian>()?;
        restore_checked(&mut mesh.vertices, vertex_counter, ElementKind::Vertex)?;
        restore_checked(&mut mesh.half_edges, half_edge_counter, ElementKind::HalfEdge)?;
        restore_checked(&mut mesh.faces, face_counter, ElementKind::Face)?;

        let min = read_point(&mut r)?;
        let max = read_point(&mut r)?;
        mesh.bounding_box = Aabb::from_corners(min, max);

        // All elements exist now, so cross-references can be checked.
        for (_, vertex) in mesh.vertices.iter() {
            check_ref(&mesh.half_edges, vertex.incident_half_edge, ElementKind::HalfEdge)?;
        }
        for (_, he) in mesh.half_edges.iter() {
            check_ref(&mesh.vertices, he.from_vertex, ElementKind::Vertex)?;
            check_ref(&mesh.vertices, he.to_vertex, ElementKind::Vertex)?;
            check_ref(&mesh.half_edges, he.twin, ElementKind::HalfEdge)?;
            check_ref(&mesh.half_edges, he.next, ElementKind::HalfEdge)?;
            check_ref(&mesh.half_edges, he.prev, ElementKind::HalfEdge)?;
            check_ref(&mesh.faces, he.face, ElementKind::Face)?;
        }
        for (_, face) in mesh.faces.iter() {
            check_ref(&mesh.half_edges, face.outer_half_edge, ElementKind::HalfEdge)?;
            for &inner in &face.inner_half_edges {
                check_live(&mesh.half_edges, inner, ElementKind::HalfEdge)?;
            }
        }

        Ok(mesh)
    }

    /// Writes the mesh to the file given by the filename. Overwrites the
    /// file if it already exists.
    pub fn save_dcel_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.serialize(BufWriter::new(File::create(path)?))
    }

    /// Reads a mesh from the file given by the filename.
    pub fn load_dcel_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::deserialize(BufReader::new(File::open(path)?))
    }
}


#[cfg(test)]
mod tests {
    use cgmath::Point3;
    use crate::handle::{FaceHandle, HalfEdgeHandle, VertexHandle};
    use super::*;

    fn sample_mesh() -> Dcel {
        let coords = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![
            vec![0, 1, 2],
            vec![0, 2, 3],
            vec![1, 0, 4],
        ];
        let mut mesh = Dcel::from_indexed(&coords, &faces).unwrap();

        // Tear out the third face again (face 2, half-edges 6..=8, vertex
        // 4) so every id space has holes that must survive the round trip.
        // References into the removed parts are redirected first.
        mesh.delete_face(FaceHandle::new(2));
        mesh.delete_vertex(VertexHandle::new(4));
        mesh.delete_half_edge(HalfEdgeHandle::new(6));
        mesh.delete_half_edge(HalfEdgeHandle::new(7));
        mesh.delete_half_edge(HalfEdgeHandle::new(8));
        mesh[HalfEdgeHandle::new(0)].twin = crate::handle::Opt::none();
        mesh[VertexHandle::new(0)].incident_half_edge =
            crate::handle::Opt::some(HalfEdgeHandle::new(3));
        mesh[VertexHandle::new(1)].incident_half_edge =
            crate::handle::Opt::some(HalfEdgeHandle::new(1));
        mesh
    }

    #[test]
    fn roundtrip_reproduces_the_mesh() {
        let mesh = sample_mesh();

        let mut buf = Vec::new();
        mesh.serialize(&mut buf).unwrap();
        let loaded = Dcel::deserialize(&buf[..]).unwrap();

        assert_eq!(mesh, loaded);
        assert_eq!(mesh.bounding_box(), loaded.bounding_box());
        assert_eq!(mesh.vertices.next_id(), loaded.vertices.next_id());
        assert_eq!(mesh.half_edges.next_id(), loaded.half_edges.next_id());
        assert_eq!(mesh.faces.next_id(), loaded.faces.next_id());

        // The recycled ids come back in the same order as well.
        let mut a = mesh.clone();
        let mut b = loaded.clone();
        assert_eq!(
            a.add_vertex(Point3::new(9.0, 9.0, 9.0)),
            b.add_vertex(Point3::new(9.0, 9.0, 9.0)),
        );
        assert_eq!(a.add_half_edge(), b.add_half_edge());
        assert_eq!(a.add_face(), b.add_face());
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let mesh = sample_mesh();
        let mut buf = Vec::new();
        mesh.serialize(&mut buf).unwrap();

        let err = Dcel::deserialize(&buf[..buf.len() / 2]).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// One vertex record: id, coordinate, normal, flag, incident id.
    fn push_vertex(buf: &mut Vec<u8>, id: u32) {
        buf.write_u32::<LittleEndian>(id).unwrap();
        for _ in 0..6 {
            buf.write_f64::<LittleEndian>(0.0).unwrap();
        }
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(UNSET).unwrap();
    }

    fn finish_stream(buf: &mut Vec<u8>, counters: [u32; 3]) {
        for &c in &counters {
            buf.write_u32::<LittleEndian>(c).unwrap();
        }
        for _ in 0..6 {
            buf.write_f64::<LittleEndian>(0.0).unwrap();
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(2).unwrap();
        push_vertex(&mut buf, 0);
        push_vertex(&mut buf, 0);

        match Dcel::deserialize(&buf[..]).unwrap_err() {
            Error::DuplicateId { element: ElementKind::Vertex, id: 0 } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn id_above_counter_is_rejected() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_vertex(&mut buf, 7);
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        finish_stream(&mut buf, [3, 0, 0]);

        match Dcel::deserialize(&buf[..]).unwrap_err() {
            Error::IdAboveCounter {
                element: ElementKind::Vertex,
                id: 7,
                counter: 3,
            } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let mut mesh = Dcel::new();
        let v = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        mesh[v].incident_half_edge = crate::handle::Opt::some(HalfEdgeHandle::new(5));

        let mut buf = Vec::new();
        mesh.serialize(&mut buf).unwrap();

        match Dcel::deserialize(&buf[..]).unwrap_err() {
            Error::DanglingReference { element: ElementKind::HalfEdge, id: 5 } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn reserved_id_is_rejected() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(1).unwrap();
        push_vertex(&mut buf, UNSET);

        match Dcel::deserialize(&buf[..]).unwrap_err() {
            Error::ReservedId { element: ElementKind::Vertex, id: UNSET } => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
