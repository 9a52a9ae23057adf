//! Everything related to handles: typed indices that refer to the elements
//! of a mesh.
//!
//! A handle is just a wrapped integer id. Handles returned by
//! [`Dcel`][crate::Dcel] stay valid until the element they refer to is
//! deleted; after that, lookups with the stale handle simply return `None`.

use std::fmt;

use optional::{Noned, OptEq};
use static_assertions::const_assert_eq;


/// The integer type used for handle ids.
///
/// A `u32` is enough to address 4 billion elements, which is plenty for
/// basically all meshes that fit into memory anyway. Using a 32 bit index
/// halves the size of every cross-reference in the mesh compared to `usize`
/// on 64 bit systems. If you really need more elements, enable the
/// `large-handle` feature.
#[cfg(not(feature = "large-handle"))]
#[allow(non_camel_case_types)]
pub type hsize = u32;

/// The integer type used for handle ids (the `large-handle` version).
#[cfg(feature = "large-handle")]
#[allow(non_camel_case_types)]
pub type hsize = u64;

/// A nullable handle. `Opt<H>` has the same size as `H`: the id
/// `hsize::max_value()` is reserved as the "none" niche.
pub type Opt<H> = optional::Optioned<H>;


/// Types that can be used to refer to some element of a mesh.
///
/// The `Noned`/`OptEq` bounds let code generic over the handle type build
/// and compare `Opt<H>` values.
pub trait Handle: Copy + Eq + Ord + std::hash::Hash + fmt::Debug + Noned + OptEq {
    /// Creates a handle from the given id.
    fn new(id: hsize) -> Self;

    /// Returns the id of this handle.
    fn idx(&self) -> hsize;

    /// Creates a handle from the given `usize`, panicking if the value
    /// does not fit into `hsize`.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        if raw > hsize::max_value() as usize {
            panic!("handle id {} is too large for `hsize`", raw);
        }
        Self::new(raw as hsize)
    }

    /// Returns the id of this handle as `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr;) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(id: hsize) -> Self {
                $name(id)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($short, "{}"), self.0)
            }
        }

        impl optional::Noned for $name {
            #[inline(always)]
            fn is_none(&self) -> bool {
                self.0 == hsize::max_value()
            }

            #[inline(always)]
            fn get_none() -> Self {
                $name(hsize::max_value())
            }
        }

        impl optional::OptEq for $name {
            #[inline(always)]
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }
    }
}

make_handle_type!{
    /// A typed index referring to a vertex.
    VertexHandle = "V";
}
make_handle_type!{
    /// A typed index referring to a half-edge.
    HalfEdgeHandle = "HE";
}
make_handle_type!{
    /// A typed index referring to a face.
    FaceHandle = "F";
}

// The niche at `hsize::max_value()` is what makes `Opt` free.
const_assert_eq!(
    std::mem::size_of::<Opt<VertexHandle>>(),
    std::mem::size_of::<hsize>()
);
