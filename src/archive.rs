//! The archive: destination container for encoding, source container for
//! decoding.
//!
//! An [`Archive`] owns one object pool plus the stream metadata (name,
//! comment, timestamps). [`Archive::serialize`] walks a live root through
//! its descriptor routine and encodes the resulting pool;
//! [`Archive::deserialize`] walks the live *receiver* root into a second,
//! internal archive and then syncs the decoded pool onto it, mutating live
//! memory.
//!
//! ```rust,ignore
//! // Sender
//! let mut archive = Archive::new();
//! archive.serialize(&root)?;
//! send(archive.raw_bytes()?);
//!
//! // Receiver
//! let mut archive = Archive::from_bytes(&received)?;
//! archive.deserialize(&mut root)?;
//! ```
//!
//! Between decode and deserialize, a decoded archive can be inspected and
//! edited through the identity-keyed value accessors, which is how hosts
//! implement partial deserialization and preset editing.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use log::debug;

use crate::codec;
use crate::dtype::DataType;
use crate::error::{Result, SrxError};
use crate::object::{Member, Object, Version};
use crate::pool::ObjectPool;
use crate::reflect::Reflect;
use crate::sync;
use crate::uid::Uid;

/// What an archive is currently busy with.
///
/// Descriptor routines receive the archive and may branch on this, for
/// example to register extra members only while serializing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Operation {
    /// No walk in progress.
    #[default]
    None,
    /// A `serialize` call is walking the sender graph.
    Serialize,
    /// A `deserialize` call is walking the receiver graph.
    Deserialize,
}

/// Calendar base for the timestamp accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeBase {
    /// The host's local time zone.
    Local,
    /// Coordinated universal time.
    Utc,
}

/// Destination container for serialization and source container for
/// deserialization.
#[derive(Debug, Default)]
pub struct Archive {
    pool: ObjectPool,
    root: Uid,
    raw_data: Vec<u8>,
    operation: Operation,
    modified: bool,
    name: String,
    comment: String,
    time_created: i64,
    time_modified: i64,
}

impl Archive {
    /// Creates an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an archive by decoding an existing byte stream.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = Self::new();
        archive.decode(data)?;
        Ok(archive)
    }

    /// Creates an archive by decoding `len` bytes starting at `data`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `len` bytes.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw_parts(data: *const u8, len: usize) -> Result<Self> {
        let slice = unsafe { std::slice::from_raw_parts(data, len) };
        Self::from_bytes(slice)
    }

    // --- SERIALIZATION / DESERIALIZATION ---

    /// Serializes the object graph reachable from `root`.
    ///
    /// The root's descriptor routine is invoked once; it registers the
    /// members to track and the walk recurses from there through structs
    /// and non-null pointers. Afterwards the encoded stream is available
    /// through [`Archive::raw_bytes`].
    pub fn serialize<T: Reflect>(&mut self, root: &T) -> Result<()> {
        self.operation = Operation::Serialize;
        self.pool.clear();
        self.raw_data.clear();
        self.root = Uid::of(root);
        root.describe(self);
        let result = self.encode();
        self.operation = Operation::None;
        result
    }

    /// Mutates the live graph under `root` to assume the values this
    /// archive was decoded from.
    ///
    /// The receiver graph is walked with the same descriptor routines as on
    /// the sender side, producing the destination pool; the synchronizer
    /// then binds each decoded object to its live counterpart and writes
    /// primitive bytes into place. Sender and receiver may disagree about
    /// the exact shape of their types; the member matching ladder in the
    /// crate documentation describes what still binds. On error the
    /// destination graph may be left partially written.
    pub fn deserialize<T: Reflect>(&mut self, root: &mut T) -> Result<()> {
        self.operation = Operation::Deserialize;
        let mut destination = Archive::new();
        destination.operation = Operation::Deserialize;
        destination.root = Uid::of(root);
        root.describe(&mut destination);
        destination.operation = Operation::None;
        let result = sync::sync(&destination, self);
        self.operation = Operation::None;
        result
    }

    /// Registers one member of `parent` under `name`.
    ///
    /// This is the workhorse of every descriptor routine. It records a
    /// member descriptor on the parent's reflection, creates the member's
    /// own object in the pool, and recurses into the member's descriptor
    /// routine if the member is a struct or a non-null pointer to one.
    /// Registering the same member twice is a no-op, which is what keeps
    /// walks over cyclic graphs from looping.
    pub fn register_member<P: Reflect, M: Reflect>(
        &mut self,
        parent: &P,
        member: &M,
        name: &str,
    ) {
        let offset =
            (member as *const M as usize).wrapping_sub(parent as *const P as usize);
        let chain = member.uid_chain();
        let dtype = M::data_type();
        let descriptor = Member::new(name, chain.head(), offset, dtype.clone());

        if let Some(entry) = self.pool.get_or_insert(Uid::of(parent)) {
            if !entry.is_valid() {
                entry.initialize(parent.uid_chain(), P::data_type());
            }
            if !entry.contains_member(&descriptor) {
                entry.push_member(descriptor);
            }
        }

        let snapshot = dtype.is_primitive() && !dtype.is_pointer();
        let mut object = Object::new(chain, dtype);
        if snapshot {
            object.set_raw(value_snapshot(member));
        }
        if self.pool.insert_or_upgrade(object.uid(), object) {
            // First sighting of this datum: recurse. Primitives have an
            // empty descriptor routine and terminate here.
            member.describe(self);
        }
    }

    /// Stamps schema versions on the object reflecting `datum`.
    ///
    /// Meant to be called from inside a descriptor routine, before or after
    /// the member registrations.
    pub fn declare_version<T: Reflect>(
        &mut self,
        datum: &T,
        version: Version,
        min_version: Version,
    ) {
        if let Some(entry) = self.pool.get_or_insert(Uid::of(datum)) {
            entry.set_version(version);
            entry.set_min_version(min_version);
        }
    }

    // --- RAW STREAM ACCESS ---

    /// The encoded byte stream, re-encoding first if the archive was
    /// modified since the last encode or decode.
    pub fn raw_bytes(&mut self) -> Result<&[u8]> {
        if self.modified {
            self.encode()?;
        }
        Ok(&self.raw_data)
    }

    /// Replaces this archive's contents by decoding `data`.
    pub fn decode(&mut self, data: &[u8]) -> Result<()> {
        let decoded = codec::decode(data)?;
        self.pool = decoded.pool;
        self.root = decoded.root;
        self.name = decoded.name;
        self.comment = decoded.comment;
        self.time_created = decoded.created;
        self.time_modified = decoded.modified;
        self.raw_data = data.to_vec();
        self.modified = false;
        self.operation = Operation::None;
        Ok(())
    }

    /// Decodes `len` bytes starting at `data`.
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `len` bytes.
    #[allow(unsafe_code)]
    pub unsafe fn decode_raw(&mut self, data: *const u8, len: usize) -> Result<()> {
        let slice = unsafe { std::slice::from_raw_parts(data, len) };
        self.decode(slice)
    }

    /// The name of this archive's wire format.
    pub fn raw_data_format(&self) -> &'static str {
        codec::MAGIC_NAME
    }

    fn encode(&mut self) -> Result<()> {
        self.time_modified = Utc::now().timestamp();
        if self.time_created == 0 {
            self.time_created = self.time_modified;
        }
        self.raw_data = codec::encode(
            &self.pool,
            self.root,
            &self.name,
            &self.comment,
            self.time_created,
            self.time_modified,
        )?;
        self.modified = false;
        Ok(())
    }

    // --- OBJECT ACCESS ---

    /// The reflection of the root object; invalid if there is none.
    pub fn root_object(&self) -> &Object {
        self.pool.lookup(self.root)
    }

    /// The reflection stored under `uid`; invalid if there is none.
    pub fn object_by_identity(&self, uid: Uid) -> &Object {
        self.pool.lookup(uid)
    }

    /// Removes the object stored under `uid` and sweeps dangling member
    /// descriptors referring to it from the remaining objects.
    pub fn remove(&mut self, uid: Uid) {
        if !uid.is_valid() {
            return;
        }
        self.pool.erase(uid);
        for object in self.pool.objects_mut() {
            object.retain_members(|member| member.uid() != uid);
        }
        self.modified = true;
        debug!("removed object {uid} and swept its member references");
    }

    /// Removes one member descriptor from the object stored under `parent`.
    pub fn remove_member(&mut self, parent: Uid, member: &Member) {
        if let Some(entry) = self.pool.get_mut(parent) {
            entry.remove_member(member);
            self.modified = true;
        }
    }

    /// What the archive is currently doing; useful inside descriptor
    /// routines shared between both directions.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Whether the archive has been edited since the last encode or decode.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Resets the archive to the empty state.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.root = Uid::NONE;
        self.raw_data.clear();
        self.operation = Operation::None;
        self.modified = false;
        self.name.clear();
        self.comment.clear();
        self.time_created = 0;
        self.time_modified = 0;
    }

    // --- VALUE ACCESS ---

    /// Renders the primitive value stored under `uid` as decimal text.
    pub fn value_as_string(&self, uid: Uid) -> Result<String> {
        let object = self.primitive_object(uid)?;
        codec::render_primitive(object)
    }

    /// Reads the integer or enum value stored under `uid`, widened to
    /// `i64`.
    pub fn value_as_int(&self, uid: Uid) -> Result<i64> {
        let object = self.primitive_object(uid)?;
        let dtype = object.data_type();
        if !dtype.is_integer() && !dtype.is_enum() {
            return Err(SrxError::Value(format!(
                "not an integer data type: {dtype}"
            )));
        }
        let width = dtype.size();
        let raw = object.raw_data();
        let value = if dtype.is_signed() {
            codec::signed_from_raw(raw, width)
        } else {
            codec::unsigned_from_raw(raw, width).map(|v| v as i64)
        };
        value.ok_or_else(|| SrxError::Value(format!("unsupported integer width {width}")))
    }

    /// Reads the floating point value stored under `uid`, widened to `f64`.
    pub fn value_as_real(&self, uid: Uid) -> Result<f64> {
        let object = self.primitive_object(uid)?;
        let dtype = object.data_type();
        if !dtype.is_real() {
            return Err(SrxError::Value(format!(
                "not a floating point data type: {dtype}"
            )));
        }
        codec::real_from_raw(object.raw_data(), dtype.size())
            .ok_or_else(|| SrxError::Value(format!("unsupported real width {}", dtype.size())))
    }

    /// Reads the boolean value stored under `uid`.
    pub fn value_as_bool(&self, uid: Uid) -> Result<bool> {
        let object = self.primitive_object(uid)?;
        if !object.data_type().is_bool() {
            return Err(SrxError::Value(format!(
                "not a boolean data type: {}",
                object.data_type()
            )));
        }
        Ok(object.raw_data().first().copied().unwrap_or(0) != 0)
    }

    /// Parses `value` according to the object's own type and stores it.
    ///
    /// Integers and enums parse as decimal, reals as floating point;
    /// booleans accept `true`/`yes`/`1` and `false`/`no`/`0` and otherwise
    /// fall back to numeric interpretation.
    pub fn set_auto_value(&mut self, uid: Uid, value: &str) -> Result<()> {
        let dtype = self.primitive_object(uid)?.data_type().clone();
        let parse_error =
            |what: &str| SrxError::Value(format!("cannot parse '{value}' as {what}"));
        if dtype.is_integer() {
            let parsed = value
                .trim()
                .parse::<i64>()
                .map_err(|_| parse_error("an integer"))?;
            self.set_int_value(uid, parsed)
        } else if dtype.is_real() {
            let parsed = value
                .trim()
                .parse::<f64>()
                .map_err(|_| parse_error("a real"))?;
            self.set_real_value(uid, parsed)
        } else if dtype.is_bool() {
            let parsed = match value.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                other => other.parse::<f64>().map_err(|_| parse_error("a boolean"))? != 0.0,
            };
            self.set_bool_value(uid, parsed)
        } else if dtype.is_enum() {
            let parsed = value
                .trim()
                .parse::<u64>()
                .map_err(|_| parse_error("an enum value"))?;
            self.set_enum_value(uid, parsed)
        } else {
            Err(SrxError::Value(format!(
                "not a primitive data type: {dtype}"
            )))
        }
    }

    /// Stores an integer value, narrowed to the object's own width.
    pub fn set_int_value(&mut self, uid: Uid, value: i64) -> Result<()> {
        let (dtype, object) = self.primitive_object_mut(uid)?;
        if !dtype.is_integer() {
            return Err(SrxError::Value(format!(
                "not an integer data type: {dtype}"
            )));
        }
        let width = dtype.size();
        let raw = if dtype.is_signed() {
            codec::signed_to_raw(value, width)
        } else {
            codec::unsigned_to_raw(value as u64, width)
        }
        .ok_or_else(|| SrxError::Value(format!("unsupported integer width {width}")))?;
        object.set_raw(raw);
        self.modified = true;
        Ok(())
    }

    /// Stores a floating point value, narrowed to the object's own width.
    pub fn set_real_value(&mut self, uid: Uid, value: f64) -> Result<()> {
        let (dtype, object) = self.primitive_object_mut(uid)?;
        if !dtype.is_real() {
            return Err(SrxError::Value(format!(
                "not a floating point data type: {dtype}"
            )));
        }
        let raw = codec::real_to_raw(value, dtype.size())
            .ok_or_else(|| SrxError::Value(format!("unsupported real width {}", dtype.size())))?;
        object.set_raw(raw);
        self.modified = true;
        Ok(())
    }

    /// Stores a boolean value.
    pub fn set_bool_value(&mut self, uid: Uid, value: bool) -> Result<()> {
        let (dtype, object) = self.primitive_object_mut(uid)?;
        if !dtype.is_bool() {
            return Err(SrxError::Value(format!(
                "not a boolean data type: {dtype}"
            )));
        }
        object.set_raw(vec![u8::from(value)]);
        self.modified = true;
        Ok(())
    }

    /// Stores an enum value, narrowed to the enum's representation width.
    pub fn set_enum_value(&mut self, uid: Uid, value: u64) -> Result<()> {
        let (dtype, object) = self.primitive_object_mut(uid)?;
        if !dtype.is_enum() {
            return Err(SrxError::Value(format!("not an enum data type: {dtype}")));
        }
        let raw = codec::unsigned_to_raw(value, dtype.size())
            .ok_or_else(|| SrxError::Value(format!("unsupported enum width {}", dtype.size())))?;
        object.set_raw(raw);
        self.modified = true;
        Ok(())
    }

    /// Re-stamps the schema version of the object stored under `uid`.
    pub fn set_version(&mut self, uid: Uid, version: Version) -> Result<()> {
        let object = self
            .pool
            .get_mut(uid)
            .ok_or_else(|| SrxError::Value("no object with the given identity".to_string()))?;
        object.set_version(version);
        self.modified = true;
        Ok(())
    }

    /// Re-stamps the minimum compatible version of the object under `uid`.
    pub fn set_min_version(&mut self, uid: Uid, version: Version) -> Result<()> {
        let object = self
            .pool
            .get_mut(uid)
            .ok_or_else(|| SrxError::Value("no object with the given identity".to_string()))?;
        object.set_min_version(version);
        self.modified = true;
        Ok(())
    }

    fn primitive_object(&self, uid: Uid) -> Result<&Object> {
        let object = self.pool.lookup(uid);
        if !object.is_valid() {
            return Err(SrxError::Value(
                "no object with the given identity".to_string(),
            ));
        }
        let dtype = object.data_type();
        if !dtype.is_primitive() || dtype.is_pointer() {
            return Err(SrxError::Value(format!(
                "not a primitive data type: {dtype}"
            )));
        }
        Ok(object)
    }

    fn primitive_object_mut(&mut self, uid: Uid) -> Result<(DataType, &mut Object)> {
        let object = self
            .pool
            .get_mut(uid)
            .filter(|o| o.is_valid())
            .ok_or_else(|| SrxError::Value("no object with the given identity".to_string()))?;
        let dtype = object.data_type().clone();
        if !dtype.is_primitive() || dtype.is_pointer() {
            return Err(SrxError::Value(format!(
                "not a primitive data type: {dtype}"
            )));
        }
        Ok((dtype, object))
    }

    // --- METADATA ---

    /// The archive's name, as carried in the stream.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the archive.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.modified = true;
    }

    /// The archive's free form comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replaces the archive's comment.
    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
        self.modified = true;
    }

    /// Seconds since the epoch at which this archive was first encoded.
    pub fn timestamp_created(&self) -> i64 {
        self.time_created
    }

    /// Seconds since the epoch of the most recent encode.
    pub fn timestamp_modified(&self) -> i64 {
        self.time_modified
    }

    /// Creation time as calendar date and time in the requested base.
    pub fn date_time_created(&self, base: TimeBase) -> Result<NaiveDateTime> {
        date_time(self.time_created, base)
    }

    /// Modification time as calendar date and time in the requested base.
    pub fn date_time_modified(&self, base: TimeBase) -> Result<NaiveDateTime> {
        date_time(self.time_modified, base)
    }
}

fn date_time(seconds: i64, base: TimeBase) -> Result<NaiveDateTime> {
    let utc = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| SrxError::Value(format!("timestamp {seconds} out of range")))?;
    Ok(match base {
        TimeBase::Utc => utc.naive_utc(),
        TimeBase::Local => utc.with_timezone(&Local).naive_local(),
    })
}

fn value_snapshot<M>(member: &M) -> Vec<u8> {
    #[allow(unsafe_code)]
    // SAFETY: `member` is a live reference and only fixed width scalars
    // reach this path, so every byte of the value is initialized.
    let bytes = unsafe {
        std::slice::from_raw_parts(member as *const M as *const u8, std::mem::size_of::<M>())
    };
    bytes.to_vec()
}
