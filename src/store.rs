//! The storage backing the three element kinds of a mesh.
//!
//! [`ElementStore`] is a dense vector with holes: deleting an element leaves
//! a hole and pushes the freed id into an ordered pool. The next insertion
//! reuses the smallest pooled id before it ever touches the high-water
//! counter, so id spaces stay as compact as the deletion pattern allows.

use std::{
    collections::BTreeSet,
    fmt,
    marker::PhantomData,
};

use stable_vec::{
    StableVec,
    core::DefaultCore,
    iter::{Indices, IterMut as SvIterMut},
};

use crate::handle::{hsize, Handle};


/// Slot storage for one element kind, addressed by a typed handle.
///
/// Ids of deleted elements are recycled smallest-first. Live ids are always
/// strictly below [`next_id`][ElementStore::next_id], and iteration yields
/// them in ascending order.
#[derive(Clone)]
pub(crate) struct ElementStore<H: Handle, T> {
    vec: StableVec<T>,
    free: BTreeSet<hsize>,
    next_id: hsize,
    _dummy: PhantomData<H>,
}

impl<H: Handle, T> ElementStore<H, T> {
    pub(crate) fn new() -> Self {
        Self {
            vec: StableVec::new(),
            free: BTreeSet::new(),
            next_id: 0,
            _dummy: PhantomData,
        }
    }

    /// Inserts the given value, reusing the smallest recycled id if one
    /// exists, and returns the element's handle.
    pub(crate) fn insert(&mut self, value: T) -> H {
        let id = match self.free.iter().next().copied() {
            Some(id) => {
                self.free.remove(&id);
                id
            }
            None => {
                if self.next_id == hsize::max_value() {
                    panic!("handle space exhausted: more than hsize::MAX elements");
                }
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };

        self.vec.reserve_for(id as usize);
        let old = self.vec.insert(id as usize, value);
        debug_assert!(old.is_none());

        H::new(id)
    }

    /// Places a value at a specific id, growing the high-water counter as
    /// needed. Returns the previous value if the slot was occupied. Used to
    /// rebuild a store from serialized form.
    pub(crate) fn insert_at(&mut self, handle: H, value: T) -> Option<T> {
        let id = handle.idx();
        self.free.remove(&id);
        if id >= self.next_id {
            self.next_id = id + 1;
        }

        self.vec.reserve_for(id as usize);
        self.vec.insert(id as usize, value)
    }

    /// Removes the element, freeing its id for reuse. Returns `None` (and
    /// changes nothing) if there is no element with this id.
    pub(crate) fn remove(&mut self, handle: H) -> Option<T> {
        let idx = handle.to_usize();
        if idx >= self.vec.capacity() {
            return None;
        }

        let out = self.vec.remove(idx);
        if out.is_some() {
            self.free.insert(handle.idx());
        }
        out
    }

    pub(crate) fn get(&self, handle: H) -> Option<&T> {
        self.vec.get(handle.to_usize())
    }

    pub(crate) fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.vec.get_mut(handle.to_usize())
    }

    pub(crate) fn contains(&self, handle: H) -> bool {
        self.vec.has_element_at(handle.to_usize())
    }

    /// Number of live elements (not the high-water mark).
    pub(crate) fn len(&self) -> hsize {
        self.vec.num_elements() as hsize
    }

    /// The id the next insertion would get if the recycling pool were empty.
    /// All live ids are strictly below this.
    pub(crate) fn next_id(&self) -> hsize {
        self.next_id
    }

    pub(crate) fn clear(&mut self) {
        self.vec.clear();
        self.free.clear();
        self.next_id = 0;
    }

    /// Forces the high-water counter to `next` and recomputes the recycling
    /// pool as the set of unoccupied ids below it. Panics if a live id is
    /// not below `next`. Used after rebuilding a store from serialized form.
    pub(crate) fn restore_counter(&mut self, next: hsize) {
        assert!(
            next >= self.next_id,
            "id counter {} is below the store's high-water mark {}",
            next,
            self.next_id,
        );

        self.next_id = next;
        self.free = (0..next)
            .filter(|&id| !self.vec.has_element_at(id as usize))
            .collect();
    }

    /// Iterator over all live handles, ascending.
    pub(crate) fn handles(&self) -> Handles<'_, H, T> {
        Handles {
            iter: self.vec.indices(),
            _dummy: PhantomData,
        }
    }

    /// Iterator over `(handle, &element)` pairs, ascending by id.
    pub(crate) fn iter(&self) -> Iter<'_, H, T> {
        Iter {
            vec: &self.vec,
            indices: self.vec.indices(),
            _dummy: PhantomData,
        }
    }

    /// Iterator over `(handle, &mut element)` pairs, ascending by id.
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, H, T> {
        IterMut {
            iter: self.vec.iter_mut(),
            _dummy: PhantomData,
        }
    }
}

impl<H: Handle, T: PartialEq> PartialEq for ElementStore<H, T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<H: Handle, T: fmt::Debug> fmt::Debug for ElementStore<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.vec.indices().map(|id| (H::from_usize(id), &self.vec[id])))
            .finish()
    }
}


#[derive(Debug, Clone)]
pub(crate) struct Handles<'s, H: Handle, T> {
    iter: Indices<'s, T, DefaultCore<T>>,
    _dummy: PhantomData<H>,
}

impl<'s, H: Handle, T> Iterator for Handles<'s, H, T> {
    type Item = H;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(H::from_usize)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Iter<'s, H: Handle, T> {
    vec: &'s StableVec<T>,
    indices: Indices<'s, T, DefaultCore<T>>,
    _dummy: PhantomData<H>,
}

impl<'s, H: Handle, T> Iterator for Iter<'s, H, T> {
    type Item = (H, &'s T);
    fn next(&mut self) -> Option<Self::Item> {
        let vec = self.vec;
        self.indices.next().map(move |id| (H::from_usize(id), &vec[id]))
    }
}

#[derive(Debug)]
pub(crate) struct IterMut<'s, H: Handle, T> {
    iter: SvIterMut<'s, T, DefaultCore<T>>,
    _dummy: PhantomData<H>,
}

impl<'s, H: Handle, T> Iterator for IterMut<'s, H, T> {
    type Item = (H, &'s mut T);
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(id, value)| (H::from_usize(id), value))
    }
}
