//! Identity-keyed storage for object reflections.
//!
//! One pool per archive side. Entries are keyed by the head of the object's
//! identity chain; invalid identities are answered with a process-wide
//! invalid sentinel and never create entries.

use std::collections::BTreeMap;

use crate::object::Object;
use crate::uid::Uid;

static INVALID_OBJECT: Object = Object::invalid();

/// The archive's object collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ObjectPool {
    entries: BTreeMap<Uid, Object>,
}

impl ObjectPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Non-inserting lookup. Missing or invalid identities yield the
    /// invalid sentinel.
    pub(crate) fn lookup(&self, uid: Uid) -> &Object {
        if !uid.is_valid() {
            return &INVALID_OBJECT;
        }
        self.entries.get(&uid).unwrap_or(&INVALID_OBJECT)
    }

    /// Returns the entry for `uid`, inserting an invalid placeholder when
    /// absent. This is how a parent object comes into existence before its
    /// type is known. Invalid identities yield `None`.
    pub(crate) fn get_or_insert(&mut self, uid: Uid) -> Option<&mut Object> {
        if !uid.is_valid() {
            return None;
        }
        Some(self.entries.entry(uid).or_insert_with(Object::invalid))
    }

    /// Mutable access to an existing entry; never inserts.
    pub(crate) fn get_mut(&mut self, uid: Uid) -> Option<&mut Object> {
        if !uid.is_valid() {
            return None;
        }
        self.entries.get_mut(&uid)
    }

    /// Writes `object` under `uid` iff no entry exists yet, or the existing
    /// entry is still an invalid placeholder and the new object is valid.
    ///
    /// Returns whether a write happened; repeated walks over the same datum
    /// therefore perform no additional work, which is also what terminates
    /// registration on cyclic graphs.
    pub(crate) fn insert_or_upgrade(&mut self, uid: Uid, object: Object) -> bool {
        if !uid.is_valid() {
            return false;
        }
        match self.entries.get(&uid) {
            None => {
                self.entries.insert(uid, object);
                true
            }
            Some(existing) if !existing.is_valid() && object.is_valid() => {
                self.entries.insert(uid, object);
                true
            }
            Some(_) => false,
        }
    }

    /// Unconditional insert used while decoding a stream, where the decoded
    /// objects are authoritative. Invalid objects are dropped.
    pub(crate) fn replace(&mut self, uid: Uid, object: Object) {
        if uid.is_valid() && object.is_valid() {
            self.entries.insert(uid, object);
        }
    }

    pub(crate) fn erase(&mut self, uid: Uid) {
        self.entries.remove(&uid);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn objects(&self) -> impl Iterator<Item = &Object> {
        self.entries.values()
    }

    pub(crate) fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.entries.values_mut()
    }
}
