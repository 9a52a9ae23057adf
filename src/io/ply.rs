//! PLY, ASCII only.
//!
//! Writing emits the canonical header (`double` positions, one
//! `vertex_indices` list per face) followed by the two data blocks. As
//! with OBJ, only outer boundaries are written.
//!
//! Reading handles arbitrary scalar vertex properties: the `x`/`y`/`z`
//! columns are located by their position in the header, everything else is
//! skipped. Elements other than `vertex` and `face` are skipped whole.
//! Binary PLY is rejected. The connectivity is assembled through
//! [`Dcel::from_indexed`] and a short summary of what was read and skipped
//! is returned next to the mesh.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use cgmath::Point3;

use crate::{
    io::Error,
    mesh::Dcel,
};


/// Line reader that keeps track of the current 1-based line number.
struct Lines<R: BufRead> {
    inner: io::Lines<R>,
    lineno: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(r: R) -> Self {
        Self {
            inner: r.lines(),
            lineno: 0,
        }
    }

    fn next(&mut self) -> Result<Option<(usize, String)>, Error> {
        match self.inner.next() {
            Some(Ok(line)) => {
                self.lineno += 1;
                Ok(Some((self.lineno, line)))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn expect(&mut self) -> Result<(usize, String), Error> {
        self.next()?.ok_or_else(|| Error::Parse {
            line: self.lineno + 1,
            msg: "unexpected end of file".into(),
        })
    }
}

fn parse_error(line: usize, msg: impl Into<String>) -> Error {
    Error::Parse { line, msg: msg.into() }
}

/// What the current `property` lines in the header belong to.
#[derive(PartialEq)]
enum Section {
    None,
    Vertex,
    Face,
    Other,
}

impl Dcel {
    /// Writes the mesh as ASCII PLY into the given `Write` instance.
    pub fn write_ply(&self, mut w: impl Write) -> Result<(), Error> {
        let (coords, faces) = self.to_indexed();

        w.write_all(b"ply\n")?;
        w.write_all(b"format ascii 1.0\n")?;
        writeln!(w, "element vertex {}", coords.len())?;
        w.write_all(b"property double x\n")?;
        w.write_all(b"property double y\n")?;
        w.write_all(b"property double z\n")?;
        writeln!(w, "element face {}", faces.len())?;
        w.write_all(b"property list uchar int vertex_indices\n")?;
        w.write_all(b"end_header\n")?;

        for p in &coords {
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
        }
        for corners in &faces {
            write!(w, "{}", corners.len())?;
            for i in corners {
                write!(w, " {}", i)?;
            }
            writeln!(w)?;
        }

        Ok(())
    }

    /// Reads a mesh from ASCII PLY data. Returns the mesh together with a
    /// short diagnostic summary.
    pub fn read_ply(r: impl BufRead) -> Result<(Self, String), Error> {
        let mut lines = Lines::new(r);

        let (n, magic) = lines.expect()?;
        if magic.trim() != "ply" {
            return Err(parse_error(n, "not a PLY file (missing `ply` magic line)"));
        }
        let (n, format) = lines.expect()?;
        if format.trim() != "format ascii 1.0" {
            return Err(parse_error(
                n,
                format!("unsupported format {:?} (only `format ascii 1.0`)", format.trim()),
            ));
        }

        // Header: remember all declared elements in order, plus the names
        // of the vertex properties.
        let mut elements: Vec<(String, usize)> = Vec::new();
        let mut vertex_props: Vec<String> = Vec::new();
        let mut section = Section::None;

        loop {
            let (n, line) = lines.expect()?;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("end_header") => break,
                Some("comment") | Some("obj_info") | None => {}
                Some("element") => {
                    let name = tokens.next()
                        .ok_or_else(|| parse_error(n, "element without a name"))?;
                    let count = tokens.next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| parse_error(n, "element without a count"))?;

                    section = match name {
                        "vertex" => Section::Vertex,
                        "face" => Section::Face,
                        _ => Section::Other,
                    };
                    elements.push((name.into(), count));
                }
                Some("property") => {
                    if section == Section::Vertex {
                        let ty = tokens.next()
                            .ok_or_else(|| parse_error(n, "property without a type"))?;
                        if ty == "list" {
                            return Err(parse_error(
                                n,
                                "list properties are not supported for vertices",
                            ));
                        }
                        let name = tokens.next()
                            .ok_or_else(|| parse_error(n, "property without a name"))?;
                        vertex_props.push(name.into());
                    }
                }
                Some(other) => {
                    return Err(parse_error(
                        n,
                        format!("unknown header keyword {:?}", other),
                    ));
                }
            }
        }

        let num_vertices = elements.iter()
            .find(|(name, _)| name == "vertex")
            .map(|&(_, count)| count)
            .ok_or_else(|| parse_error(lines.lineno, "header declares no vertex element"))?;

        let prop_index = |name: &str| vertex_props.iter().position(|p| p == name);
        let (ix, iy, iz) = match (prop_index("x"), prop_index("y"), prop_index("z")) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => {
                return Err(parse_error(
                    lines.lineno,
                    "vertex element declares no x/y/z properties",
                ));
            }
        };
        let num_values = ix.max(iy).max(iz) + 1;

        // Body: one block per declared element, in declaration order.
        let mut coords: Vec<Point3<f64>> = Vec::new();
        let mut faces: Vec<Vec<usize>> = Vec::new();
        let mut skipped_rows = 0;

        for &(ref name, count) in &elements {
            match name.as_str() {
                "vertex" => {
                    for _ in 0..count {
                        let (n, line) = lines.expect()?;
                        let values: Vec<&str> = line.split_whitespace().collect();
                        if values.len() < num_values {
                            return Err(parse_error(n, format!(
                                "vertex row with {} values, expected at least {}",
                                values.len(), num_values,
                            )));
                        }

                        let component = |i: usize| -> Result<f64, Error> {
                            values[i].parse().map_err(|_| parse_error(
                                n,
                                format!("invalid coordinate {:?}", values[i]),
                            ))
                        };
                        coords.push(Point3::new(component(ix)?, component(iy)?, component(iz)?));
                    }
                }
                "face" => {
                    for _ in 0..count {
                        let (n, line) = lines.expect()?;
                        let mut tokens = line.split_whitespace();
                        let len: usize = tokens.next()
                            .and_then(|t| t.parse().ok())
                            .ok_or_else(|| parse_error(n, "face row without a vertex count"))?;

                        let mut corners = Vec::with_capacity(len);
                        for _ in 0..len {
                            let token = tokens.next().ok_or_else(|| parse_error(
                                n,
                                format!("face row declares {} indices but has fewer", len),
                            ))?;
                            let index: usize = token.parse().map_err(|_| parse_error(
                                n,
                                format!("invalid vertex index {:?}", token),
                            ))?;
                            if index >= num_vertices {
                                return Err(parse_error(n, format!(
                                    "vertex index {} out of range ({} vertices)",
                                    index, num_vertices,
                                )));
                            }
                            corners.push(index);
                        }
                        if corners.len() < 3 {
                            return Err(parse_error(
                                n,
                                format!("face with only {} vertices", corners.len()),
                            ));
                        }
                        faces.push(corners);
                    }
                }
                _ => {
                    for _ in 0..count {
                        lines.expect()?;
                        skipped_rows += 1;
                    }
                }
            }
        }

        let mesh = Dcel::from_indexed(&coords, &faces)?;

        let mut summary = format!(
            "loaded {} vertices and {} faces",
            coords.len(),
            faces.len(),
        );
        if vertex_props.len() > 3 {
            summary += &format!(", ignored {} extra vertex properties", vertex_props.len() - 3);
        }
        if skipped_rows > 0 {
            summary += &format!(", skipped {} rows of other elements", skipped_rows);
        }

        Ok((mesh, summary))
    }

    /// Writes the mesh as ASCII PLY to the file given by the filename.
    /// Overwrites the file if it already exists.
    pub fn save_ply_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.write_ply(BufWriter::new(File::create(path)?))
    }

    /// Reads a mesh from the PLY file given by the filename.
    pub fn load_ply_file(path: impl AsRef<Path>) -> Result<(Self, String), Error> {
        Self::read_ply(BufReader::new(File::open(path)?))
    }
}


#[cfg(test)]
mod tests {
    use crate::handle::{Handle, VertexHandle};
    use super::*;

    #[test]
    fn written_ply_is_stable() {
        let coords = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh = Dcel::from_indexed(&coords, &[vec![0, 1, 2]]).unwrap();

        let mut out = Vec::new();
        mesh.write_ply(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ply\n\
             format ascii 1.0\n\
             element vertex 3\n\
             property double x\n\
             property double y\n\
             property double z\n\
             element face 1\n\
             property list uchar int vertex_indices\n\
             end_header\n\
             0 0 0\n\
             1 0 0\n\
             0.5 1 0\n\
             3 0 1 2\n",
        );
    }

    #[test]
    fn extra_vertex_properties_are_skipped() {
        let input = "\
            ply\n\
            format ascii 1.0\n\
            comment made by hand\n\
            element vertex 3\n\
            property float confidence\n\
            property float x\n\
            property float y\n\
            property float z\n\
            element face 1\n\
            property list uchar int vertex_indices\n\
            end_header\n\
            0.9 0 0 0\n\
            0.8 1 0 0\n\
            0.1 0 1 0\n\
            3 0 1 2\n\
        ";

        let (mesh, summary) = Dcel::read_ply(input.as_bytes()).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(
            mesh.vertex_ref(VertexHandle::new(1)).coordinate(),
            Point3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(summary, "loaded 3 vertices and 1 faces, \
            ignored 1 extra vertex properties");
    }

    #[test]
    fn unknown_elements_are_skipped_whole() {
        let input = "\
            ply\n\
            format ascii 1.0\n\
            element vertex 3\n\
            property double x\n\
            property double y\n\
            property double z\n\
            element edge 2\n\
            property int vertex1\n\
            property int vertex2\n\
            element face 1\n\
            property list uchar int vertex_indices\n\
            end_header\n\
            0 0 0\n\
            1 0 0\n\
            0 1 0\n\
            0 1\n\
            1 2\n\
            3 0 1 2\n\
        ";

        let (mesh, summary) = Dcel::read_ply(input.as_bytes()).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert!(summary.contains("skipped 2 rows of other elements"));
    }

    #[test]
    fn binary_ply_is_rejected() {
        let input = "ply\nformat binary_little_endian 1.0\nend_header\n";
        match Dcel::read_ply(input.as_bytes()).unwrap_err() {
            Error::Parse { line: 2, msg } => assert!(msg.contains("only `format ascii 1.0`")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn short_face_row_names_the_line() {
        let input = "\
            ply\n\
            format ascii 1.0\n\
            element vertex 3\n\
            property double x\n\
            property double y\n\
            property double z\n\
            element face 1\n\
            property list uchar int vertex_indices\n\
            end_header\n\
            0 0 0\n\
            1 0 0\n\
            0 1 0\n\
            3 0 1\n\
        ";

        match Dcel::read_ply(input.as_bytes()).unwrap_err() {
            Error::Parse { line: 13, msg } => {
                assert!(msg.contains("declares 3 indices but has fewer"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn ply_roundtrip_keeps_geometry() {
        let coords = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mesh = Dcel::from_indexed(&coords, &[vec![0, 1, 2], vec![0, 2, 3]]).unwrap();

        let mut buf = Vec::new();
        mesh.write_ply(&mut buf).unwrap();
        let (loaded, _) = Dcel::read_ply(&buf[..]).unwrap();

        assert_eq!(loaded.to_indexed(), mesh.to_indexed());
    }
}
