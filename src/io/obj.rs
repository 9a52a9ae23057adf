//! Wavefront OBJ, ASCII only.
//!
//! Writing emits `v` lines in ascending vertex order followed by one
//! 1-based `f` line per face. Only outer boundaries are written; OBJ has no
//! notion of hole boundaries.
//!
//! Reading understands `v` and `f` lines and counts everything else as
//! unsupported. Face entries may be `i`, `i/t`, `i//n` or `i/t/n`; only the
//! position index is used. Negative indices are resolved relative to the
//! number of vertices read so far, per the OBJ specification. The
//! connectivity is assembled through [`Dcel::from_indexed`] and a short
//! summary of what was read (and normalized) is returned next to the mesh.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use cgmath::Point3;

use crate::{
    io::Error,
    mesh::Dcel,
};


fn parse_coordinate(token: Option<&str>, line: usize) -> Result<f64, Error> {
    let token = token.ok_or_else(|| Error::Parse {
        line,
        msg: "vertex with fewer than 3 coordinates".into(),
    })?;
    token.parse().map_err(|_| Error::Parse {
        line,
        msg: format!("invalid coordinate {:?}", token),
    })
}

/// Resolves one `f` entry to a zero-based vertex index.
fn parse_face_entry(entry: &str, num_vertices: usize, line: usize) -> Result<usize, Error> {
    let index_part = match entry.find('/') {
        Some(pos) => &entry[..pos],
        None => entry,
    };
    let raw: i64 = index_part.parse().map_err(|_| Error::Parse {
        line,
        msg: format!("invalid face entry {:?}", entry),
    })?;

    // OBJ counts from 1; negative values count backwards from the end.
    let resolved = if raw < 0 {
        num_vertices as i64 + raw
    } else {
        raw - 1
    };
    if resolved < 0 || resolved >= num_vertices as i64 {
        return Err(Error::Parse {
            line,
            msg: format!(
                "vertex index {} out of range ({} vertices read so far)",
                raw, num_vertices,
            ),
        });
    }

    Ok(resolved as usize)
}

impl Dcel {
    /// Writes the mesh as ASCII OBJ into the given `Write` instance.
    pub fn write_obj(&self, mut w: impl Write) -> Result<(), Error> {
        let (coords, faces) = self.to_indexed();

        for p in &coords {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for corners in &faces {
            write!(w, "f")?;
            for i in corners {
                write!(w, " {}", i + 1)?;
            }
            writeln!(w)?;
        }

        Ok(())
    }

    /// Reads a mesh from ASCII OBJ data. Returns the mesh together with a
    /// short diagnostic summary.
    pub fn read_obj(r: impl BufRead) -> Result<(Self, String), Error> {
        let mut coords: Vec<Point3<f64>> = Vec::new();
        let mut faces: Vec<Vec<usize>> = Vec::new();
        let mut unsupported = 0;
        let mut negative_indices = 0;

        for (i, line) in r.lines().enumerate() {
            let line = line?;
            let lineno = i + 1;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("v") => {
                    let x = parse_coordinate(tokens.next(), lineno)?;
                    let y = parse_coordinate(tokens.next(), lineno)?;
                    let z = parse_coordinate(tokens.next(), lineno)?;
                    coords.push(Point3::new(x, y, z));
                }
                Some("f") => {
                    let mut corners = Vec::new();
                    for entry in tokens {
                        if entry.starts_with('-') {
                            negative_indices += 1;
                        }
                        corners.push(parse_face_entry(entry, coords.len(), lineno)?);
                    }
                    if corners.len() < 3 {
                        return Err(Error::Parse {
                            line: lineno,
                            msg: format!("face with only {} vertices", corners.len()),
                        });
                    }
                    faces.push(corners);
                }
                Some(t) if t.starts_with('#') => {}
                Some(_) => unsupported += 1,
                None => {}
            }
        }

        let mesh = Dcel::from_indexed(&coords, &faces)?;

        let mut summary = format!(
            "loaded {} vertices and {} faces",
            coords.len(),
            faces.len(),
        );
        if negative_indices > 0 {
            summary += &format!(", resolved {} negative indices", negative_indices);
        }
        if unsupported > 0 {
            summary += &format!(", ignored {} unsupported lines", unsupported);
        }

        Ok((mesh, summary))
    }

    /// Writes the mesh as ASCII OBJ to the file given by the filename.
    /// Overwrites the file if it already exists.
    pub fn save_obj_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.write_obj(BufWriter::new(File::create(path)?))
    }

    /// Reads a mesh from the OBJ file given by the filename.
    pub fn load_obj_file(path: impl AsRef<Path>) -> Result<(Self, String), Error> {
        Self::read_obj(BufReader::new(File::open(path)?))
    }
}
