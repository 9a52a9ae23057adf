//! Reading and writing meshes.
//!
//! Three formats are supported:
//!
//! - the binary **dcel** format, a complete dump of the structure (ids,
//!   links, derived attributes, id counters, bounding box) that round-trips
//!   a mesh exactly;
//! - **Wavefront OBJ** (ASCII), positions and face loops only;
//! - **PLY** (ASCII), positions and face loops only.
//!
//! The two exchange formats go through [`Dcel::from_indexed`] and
//! [`Dcel::to_indexed`]: they carry nothing but coordinates and index
//! loops, so hole boundaries, flags and id gaps do not survive them.
//! Loading from them returns a short diagnostic summary next to the mesh.
//!
//! Every format comes as a reader/writer pair over `io::Read`/`io::Write`
//! plus `*_file` convenience functions. [`Dcel::save_file`] and
//! [`Dcel::load_file`] guess the format from the file extension.

use std::{
    fmt,
    io,
    path::{Path, PathBuf},
};

use failure::Fail;

use crate::mesh::{BuildError, Dcel};


pub mod dcel;
pub mod obj;
pub mod ply;


/// Represents one of the supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Dcel,
    Obj,
    Ply,
}

impl FileFormat {
    /// Tries to guess the file format from the file extension.
    ///
    /// Returns `None` if:
    /// - the path/file has no extension in its name, or
    /// - the extension is no valid UTF8, or
    /// - the file extension is not known.
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| {
                match ext {
                    "dcel" => Some(FileFormat::Dcel),
                    "obj" => Some(FileFormat::Obj),
                    "ply" => Some(FileFormat::Ply),
                    _ => None,
                }
            })
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileFormat::Dcel => "dcel",
            FileFormat::Obj => "OBJ",
            FileFormat::Ply => "PLY",
        }.fmt(f)
    }
}

/// The element kind an IO error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Vertex,
    HalfEdge,
    Face,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementKind::Vertex => "vertex",
            ElementKind::HalfEdge => "half-edge",
            ElementKind::Face => "face",
        }.fmt(f)
    }
}

/// The error type for everything in this module.
///
/// Malformed input is always reported through this type; readers never
/// panic on bad files.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(io::Error),

    /// Syntactically malformed ASCII input.
    #[fail(display = "parse error in line {}: {}", line, msg)]
    Parse { line: usize, msg: String },

    /// The input describes connectivity that cannot be assembled into a
    /// mesh.
    #[fail(display = "invalid mesh data: {}", _0)]
    Build(BuildError),

    /// A binary mesh file declares the same id twice.
    #[fail(display = "corrupt mesh file: duplicate {} id {}", element, id)]
    DuplicateId { element: ElementKind, id: u32 },

    /// A binary mesh file declares an element under the id reserved for
    /// unset references.
    #[fail(display = "corrupt mesh file: {} uses the reserved id {}", element, id)]
    ReservedId { element: ElementKind, id: u32 },

    /// A binary mesh file contains an id at or above its own id counter.
    #[fail(
        display = "corrupt mesh file: {} id {} is not below the stored id counter {}",
        element, id, counter
    )]
    IdAboveCounter { element: ElementKind, id: u32, counter: u32 },

    /// A cross-reference in a binary mesh file points at an id that holds
    /// no element.
    #[fail(display = "corrupt mesh file: reference to non-existent {} {}", element, id)]
    DanglingReference { element: ElementKind, id: u32 },

    /// An id does not fit into the 32 bit ids of the dcel format. Only
    /// possible with the `large-handle` feature.
    #[fail(display = "id {} does not fit into the 32 bit ids of the dcel format", _0)]
    IdTooLarge(u64),

    /// The file extension allows no format guess.
    #[fail(display = "cannot guess the file format of {:?}", _0)]
    UnknownFileFormat(PathBuf),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl From<BuildError> for Error {
    fn from(src: BuildError) -> Self {
        Error::Build(src)
    }
}


impl Dcel {
    /// Saves the mesh to the file given by the filename, guessing the
    /// format from the extension. Overwrites the file if it already
    /// exists.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        match FileFormat::from_extension(path) {
            Some(FileFormat::Dcel) => self.save_dcel_file(path),
            Some(FileFormat::Obj) => self.save_obj_file(path),
            Some(FileFormat::Ply) => self.save_ply_file(path),
            None => Err(Error::UnknownFileFormat(path.into())),
        }
    }

    /// Loads a mesh from the file given by the filename, guessing the
    /// format from the extension. Returns the mesh together with a short
    /// diagnostic summary.
    pub fn load_file(path: impl AsRef<Path>) -> Result<(Self, String), Error> {
        let path = path.as_ref();
        match FileFormat::from_extension(path) {
            Some(FileFormat::Dcel) => {
                let mesh = Self::load_dcel_file(path)?;
                let summary = format!(
                    "loaded {} vertices, {} half-edges and {} faces",
                    mesh.num_vertices(),
                    mesh.num_half_edges(),
                    mesh.num_faces(),
                );
                Ok((mesh, summary))
            }
            Some(FileFormat::Obj) => Self::load_obj_file(path),
            Some(FileFormat::Ply) => Self::load_ply_file(path),
            None => Err(Error::UnknownFileFormat(path.into())),
        }
    }
}
