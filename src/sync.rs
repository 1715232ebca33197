//! The synchronizer: binds a decoded source pool onto the live destination
//! graph and writes values into place.
//!
//! Matching starts at the two root objects and recurses along members and
//! pointees. For every pair it checks version compatibility and structural
//! type equality before anything is written. Class members are bound by a
//! ladder of policies, evaluated in order of confidence:
//!
//! 1. **Name and type** equal. A member whose name matches but whose type
//!    differs fails the bind outright; a retyped field must not silently
//!    swallow a renamed one.
//! 2. **Unique type**: exactly one destination member of the source
//!    member's type.
//! 3. **Type and offset** equal.
//! 4. **Type and sequence index** equal.
//!
//! This tolerates independent renames, additions of unrelated fields and
//! reorderings of same-typed fields, and it refuses to cross the type
//! barrier. An unbound source member aborts the sync; the destination may
//! be left partially written.
//!
//! Cycle safety comes from a visited set of destination identities: the
//! first visit of an object does the work, any later visit along a cyclic
//! path terminates immediately, so a sync touches each object at most once.

use std::collections::HashSet;

use log::trace;

use crate::archive::Archive;
use crate::error::{Result, Side, SrxError};
use crate::object::{Member, Object};
use crate::uid::Uid;

/// Reconciles `src` (decoded) into the live memory described by `dst`.
pub(crate) fn sync(dst: &Archive, src: &Archive) -> Result<()> {
    let src_root = src.root_object();
    if !src_root.is_valid() {
        return Err(SrxError::MissingRoot(Side::Source));
    }
    let dst_root = dst.root_object();
    if !dst_root.is_valid() {
        return Err(SrxError::MissingRoot(Side::Destination));
    }
    let mut syncer = Syncer {
        dst,
        src,
        visited: HashSet::new(),
    };
    syncer.sync_object(dst_root, src_root)
}

struct Syncer<'a> {
    dst: &'a Archive,
    src: &'a Archive,
    visited: HashSet<Uid>,
}

impl<'a> Syncer<'a> {
    fn sync_object(&mut self, dst: &Object, src: &Object) -> Result<()> {
        if !dst.is_valid() || !src.is_valid() {
            return Ok(());
        }
        if !dst.is_version_compatible_with(src) {
            return Err(SrxError::VersionIncompatible {
                dst_version: dst.version(),
                dst_min_version: dst.min_version(),
                src_version: src.version(),
                src_min_version: src.min_version(),
            });
        }
        if dst.data_type() != src.data_type() {
            return Err(SrxError::TypeMismatch {
                dst: dst.data_type().clone(),
                src: src.data_type().clone(),
            });
        }
        // Mark before recursing; a cyclic path back to this object must
        // terminate instead of looping.
        if !self.visited.insert(dst.uid()) {
            return Ok(());
        }

        let dtype = dst.data_type();
        if dtype.is_primitive() && !dtype.is_pointer() {
            return self.sync_primitive(dst, src);
        }
        if dtype.is_pointer() {
            return self.sync_pointer(dst, src);
        }

        let (dst_archive, src_archive) = (self.dst, self.src);
        for src_member in src.members() {
            let dst_member = matching_member(dst, src, src_member)
                .ok_or_else(|| SrxError::MemberMissing(src_member.name().to_string()))?;
            trace!(
                "member '{}' bound to destination '{}'",
                src_member.name(),
                dst_member.name()
            );
            let dst_object = dst_archive.object_by_identity(dst_member.uid());
            let src_object = src_archive.object_by_identity(src_member.uid());
            self.sync_object(dst_object, src_object)?;
        }
        Ok(())
    }

    fn sync_primitive(&self, dst: &Object, src: &Object) -> Result<()> {
        let width = dst.data_type().size();
        if src.raw_data().len() != width {
            return Err(SrxError::Internal(format!(
                "source value of {} bytes against a destination width of {width}",
                src.raw_data().len()
            )));
        }
        let target = dst.uid().id() as usize as *mut u8;
        #[allow(unsafe_code)]
        // SAFETY: destination identities were resolved from live references
        // during this deserialize call, and `width` is the destination
        // datum's own size.
        unsafe {
            std::ptr::copy_nonoverlapping(src.raw_data().as_ptr(), target, width);
        }
        Ok(())
    }

    fn sync_pointer(&mut self, dst: &Object, src: &Object) -> Result<()> {
        let (dst_archive, src_archive) = (self.dst, self.src);
        let dst_pointee = dst_archive.object_by_identity(dst.uid_at(1));
        let src_pointee = src_archive.object_by_identity(src.uid_at(1));
        self.sync_object(dst_pointee, src_pointee)
    }
}

/// The member matching ladder. First hit wins; `None` aborts the sync.
fn matching_member<'o>(
    dst: &'o Object,
    src: &Object,
    src_member: &Member,
) -> Option<&'o Member> {
    if let Some(named) = dst.member_named(src_member.name()) {
        // A name hit with a different type is a refusal, not a miss.
        return if named.data_type() == src_member.data_type() {
            Some(named)
        } else {
            None
        };
    }
    let candidates = dst.members_of_type(src_member.data_type());
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(candidates[0]);
    }
    if let Some(member) = candidates
        .iter()
        .find(|m| m.offset() == src_member.offset())
    {
        return Some(*member);
    }
    let src_index = src.sequence_index_of(src_member)?;
    candidates
        .into_iter()
        .find(|m| dst.sequence_index_of(m) == Some(src_index))
}
