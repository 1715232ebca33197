//! The `Srx1v` wire format.
//!
//! A self-describing, length-prefixed layout that looks textual but is
//! binary safe. Every node is written as `N:` (the payload length as
//! unsigned decimal ASCII) followed by exactly `N` raw bytes; nodes nest
//! freely. All integers are rendered as signed decimal ASCII.
//!
//! ## Stream Layout
//!
//! ```text
//! "Srx1v"                       magic, no length prefix
//! root blob
//! ├── format minor version      integer blob (currently 0)
//! ├── root identity             UID blob
//! ├── objects blob              one object blob per pool entry
//! ├── archive name              string blob
//! ├── archive comment           string blob
//! ├── created timestamp         integer blob, seconds since the epoch
//! └── modified timestamp        integer blob
//! ```
//!
//! ## Object Anatomy
//!
//! ```text
//! object blob
//! ├── data type                 base name, custom name, size, is-pointer
//! ├── version                   integer blob
//! ├── minimum version           integer blob
//! ├── identity chain            one UID blob per chain element
//! ├── members                   one member blob per registered member
//! │   └── member                UID, offset, name, data type
//! └── primitive value           decimal rendering, or an empty blob for
//!                               structs and pointers
//! ```
//!
//! A UID blob nests two integer blobs, the address-shaped token and the
//! width. An empty blob at a position where an object or member is expected
//! terminates the enclosing list.
//!
//! ## Rendering Rules
//!
//! Booleans are written as `0`/`1` and travel through the 8-bit unsigned
//! path. One byte integers are widened to 16 bits before rendering so they
//! are never mistaken for character literals. Reals use Rust's shortest
//! round-trip formatting. Identity tokens are rendered as decimal from the
//! full 64-bit value; the decoder preserves them verbatim and never
//! dereferences them.

use log::debug;

use crate::dtype::DataType;
use crate::error::{Result, SrxError};
use crate::object::{Member, Object, Version};
use crate::pool::ObjectPool;
use crate::uid::{Uid, UidChain};

/// The magic bytes opening every stream.
pub(crate) const MAGIC: &[u8] = b"Srx1v";

/// The magic as a displayable format name.
pub(crate) const MAGIC_NAME: &str = "Srx1v";

/// Reserved for future format extensions; written but not yet consulted.
pub(crate) const ENCODING_FORMAT_MINOR_VERSION: i64 = 0;

// --- RAW VALUE HELPERS ---
//
// Value snapshots live in native byte order; endianness never reaches the
// wire because values are rendered as decimal text.

pub(crate) fn signed_from_raw(raw: &[u8], width: usize) -> Option<i64> {
    match width {
        1 => Some(i8::from_ne_bytes(fixed(raw)?) as i64),
        2 => Some(i16::from_ne_bytes(fixed(raw)?) as i64),
        4 => Some(i32::from_ne_bytes(fixed(raw)?) as i64),
        8 => Some(i64::from_ne_bytes(fixed(raw)?)),
        _ => None,
    }
}

pub(crate) fn unsigned_from_raw(raw: &[u8], width: usize) -> Option<u64> {
    match width {
        1 => Some(u8::from_ne_bytes(fixed(raw)?) as u64),
        2 => Some(u16::from_ne_bytes(fixed(raw)?) as u64),
        4 => Some(u32::from_ne_bytes(fixed(raw)?) as u64),
        8 => Some(u64::from_ne_bytes(fixed(raw)?)),
        _ => None,
    }
}

pub(crate) fn real_from_raw(raw: &[u8], width: usize) -> Option<f64> {
    match width {
        4 => Some(f32::from_ne_bytes(fixed(raw)?) as f64),
        8 => Some(f64::from_ne_bytes(fixed(raw)?)),
        _ => None,
    }
}

pub(crate) fn signed_to_raw(value: i64, width: usize) -> Option<Vec<u8>> {
    match width {
        1 => Some((value as i8).to_ne_bytes().to_vec()),
        2 => Some((value as i16).to_ne_bytes().to_vec()),
        4 => Some((value as i32).to_ne_bytes().to_vec()),
        8 => Some(value.to_ne_bytes().to_vec()),
        _ => None,
    }
}

pub(crate) fn unsigned_to_raw(value: u64, width: usize) -> Option<Vec<u8>> {
    match width {
        1 => Some((value as u8).to_ne_bytes().to_vec()),
        2 => Some((value as u16).to_ne_bytes().to_vec()),
        4 => Some((value as u32).to_ne_bytes().to_vec()),
        8 => Some(value.to_ne_bytes().to_vec()),
        _ => None,
    }
}

pub(crate) fn real_to_raw(value: f64, width: usize) -> Option<Vec<u8>> {
    match width {
        4 => Some((value as f32).to_ne_bytes().to_vec()),
        8 => Some(value.to_ne_bytes().to_vec()),
        _ => None,
    }
}

fn fixed<const N: usize>(raw: &[u8]) -> Option<[u8; N]> {
    raw.get(..N).and_then(|bytes| bytes.try_into().ok())
}

/// Decimal rendering of a primitive object's value snapshot.
///
/// One byte integers widen to 16 bits first, booleans normalize to `0`/`1`.
pub(crate) fn render_primitive(object: &Object) -> Result<String> {
    let dtype = object.data_type();
    let raw = object.raw_data();
    let width = dtype.size();
    let short = || SrxError::Internal("value snapshot shorter than declared width".to_string());
    if dtype.is_integer() || dtype.is_enum() {
        if dtype.is_signed() {
            Ok(signed_from_raw(raw, width).ok_or_else(short)?.to_string())
        } else {
            Ok(unsigned_from_raw(raw, width).ok_or_else(short)?.to_string())
        }
    } else if dtype.is_real() {
        match width {
            4 => Ok(f32::from_ne_bytes(fixed(raw).ok_or_else(short)?).to_string()),
            8 => Ok(f64::from_ne_bytes(fixed(raw).ok_or_else(short)?).to_string()),
            _ => Err(SrxError::Internal(format!(
                "unknown floating point width {width}"
            ))),
        }
    } else if dtype.is_bool() {
        Ok(if raw.first().copied().unwrap_or(0) != 0 {
            "1".to_string()
        } else {
            "0".to_string()
        })
    } else {
        Err(SrxError::Internal(format!(
            "not a primitive type: {dtype}"
        )))
    }
}

// --- ENCODER ---

fn push_blob(out: &mut Vec<u8>, payload: &[u8]) {
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(payload);
}

fn push_str_blob(out: &mut Vec<u8>, payload: &str) {
    push_blob(out, payload.as_bytes());
}

fn encode_uid(out: &mut Vec<u8>, uid: Uid) {
    let mut blob = Vec::new();
    push_str_blob(&mut blob, &uid.id().to_string());
    push_str_blob(&mut blob, &uid.size().to_string());
    push_blob(out, &blob);
}

fn encode_data_type(out: &mut Vec<u8>, dtype: &DataType) {
    let mut blob = Vec::new();
    push_str_blob(&mut blob, dtype.base_type_name());
    push_str_blob(&mut blob, dtype.custom_type_name());
    push_str_blob(&mut blob, &dtype.size().to_string());
    push_str_blob(&mut blob, if dtype.is_pointer() { "1" } else { "0" });
    push_blob(out, &blob);
}

fn encode_uid_chain(out: &mut Vec<u8>, chain: &UidChain) {
    let mut blob = Vec::new();
    for uid in chain.as_slice() {
        encode_uid(&mut blob, *uid);
    }
    push_blob(out, &blob);
}

fn encode_member(out: &mut Vec<u8>, member: &Member) {
    let mut blob = Vec::new();
    encode_uid(&mut blob, member.uid());
    push_str_blob(&mut blob, &member.offset().to_string());
    push_str_blob(&mut blob, member.name());
    encode_data_type(&mut blob, member.data_type());
    push_blob(out, &blob);
}

fn encode_members(out: &mut Vec<u8>, members: &[Member]) {
    let mut blob = Vec::new();
    for member in members {
        encode_member(&mut blob, member);
    }
    push_blob(out, &blob);
}

fn encode_primitive_value(out: &mut Vec<u8>, object: &Object) -> Result<()> {
    let dtype = object.data_type();
    let rendered = if dtype.is_primitive() && !dtype.is_pointer() {
        render_primitive(object)?
    } else {
        String::new()
    };
    push_str_blob(out, &rendered);
    Ok(())
}

fn encode_object(out: &mut Vec<u8>, object: &Object) -> Result<()> {
    let mut blob = Vec::new();
    encode_data_type(&mut blob, object.data_type());
    push_str_blob(&mut blob, &object.version().to_string());
    push_str_blob(&mut blob, &object.min_version().to_string());
    encode_uid_chain(&mut blob, object.uid_chain());
    encode_members(&mut blob, object.members());
    encode_primitive_value(&mut blob, object)?;
    push_blob(out, &blob);
    Ok(())
}

/// Encodes a whole archive into a fresh byte stream.
pub(crate) fn encode(
    pool: &ObjectPool,
    root: Uid,
    name: &str,
    comment: &str,
    created: i64,
    modified: i64,
) -> Result<Vec<u8>> {
    let mut objects = Vec::new();
    for object in pool.objects() {
        if !object.is_valid() {
            continue;
        }
        encode_object(&mut objects, object)?;
    }

    let mut root_blob = Vec::new();
    push_str_blob(&mut root_blob, &ENCODING_FORMAT_MINOR_VERSION.to_string());
    encode_uid(&mut root_blob, root);
    push_blob(&mut root_blob, &objects);
    push_str_blob(&mut root_blob, name);
    push_str_blob(&mut root_blob, comment);
    push_str_blob(&mut root_blob, &created.to_string());
    push_str_blob(&mut root_blob, &modified.to_string());

    let mut out = Vec::with_capacity(MAGIC.len() + root_blob.len() + 16);
    out.extend_from_slice(MAGIC);
    push_blob(&mut out, &root_blob);

    debug!(
        "encoded {} objects into {} bytes",
        pool.len(),
        out.len()
    );
    Ok(out)
}

// --- DECODER ---

/// Everything a decoded stream yields.
pub(crate) struct DecodedArchive {
    pub root: Uid,
    pub pool: ObjectPool,
    pub name: String,
    pub comment: String,
    pub created: i64,
    pub modified: i64,
}

/// Splits the next length-prefixed blob off `input`.
fn pop_blob<'a>(input: &mut &'a [u8]) -> Result<&'a [u8]> {
    let mut size: usize = 0;
    let mut rest = *input;
    loop {
        let (&byte, tail) = rest
            .split_first()
            .ok_or_else(|| SrxError::Format("missing blob".to_string()))?;
        rest = tail;
        if byte == b':' {
            break;
        }
        if !byte.is_ascii_digit() {
            return Err(SrxError::Format("malformed blob size".to_string()));
        }
        size = size
            .wrapping_mul(10)
            .wrapping_add((byte - b'0') as usize);
    }
    if rest.len() < size {
        return Err(SrxError::Format("premature end of blob".to_string()));
    }
    let (blob, tail) = rest.split_at(size);
    *input = tail;
    Ok(blob)
}

/// Like [`pop_blob`], but an exhausted `input` means "end of list" rather
/// than an error.
fn try_pop_blob<'a>(input: &mut &'a [u8]) -> Result<Option<&'a [u8]>> {
    if input.is_empty() {
        return Ok(None);
    }
    pop_blob(input).map(Some)
}

/// Parses a decimal integer blob into the full 64-bit token space.
///
/// Digits accumulate with wrap-around, matching the reference decoder's
/// tolerance for foreign word widths.
fn pop_u64(input: &mut &[u8]) -> Result<u64> {
    let blob = pop_blob(input)?;
    let (negative, digits) = match blob.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, blob),
    };
    if digits.is_empty() {
        return Err(SrxError::Format("premature end of int blob".to_string()));
    }
    let mut value: u64 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(SrxError::Format("invalid int blob format".to_string()));
        }
        value = value.wrapping_mul(10).wrapping_add((byte - b'0') as u64);
    }
    Ok(if negative { value.wrapping_neg() } else { value })
}

fn pop_i64(input: &mut &[u8]) -> Result<i64> {
    Ok(pop_u64(input)? as i64)
}

fn pop_f64(input: &mut &[u8]) -> Result<f64> {
    let blob = pop_blob(input)?;
    if blob.is_empty() {
        return Err(SrxError::Format("premature end of real blob".to_string()));
    }
    std::str::from_utf8(blob)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SrxError::Format("invalid real blob format".to_string()))
}

fn pop_string(input: &mut &[u8]) -> Result<String> {
    let blob = pop_blob(input)?;
    String::from_utf8(blob.to_vec())
        .map_err(|_| SrxError::Format("string blob is not valid UTF-8".to_string()))
}

fn pop_uid(input: &mut &[u8]) -> Result<Uid> {
    let mut blob = pop_blob(input)?;
    if blob.is_empty() {
        return Err(SrxError::Format("premature end of UID blob".to_string()));
    }
    let id = pop_u64(&mut blob)?;
    let size = pop_u64(&mut blob)?;
    Ok(Uid::new(id, size))
}

fn pop_uid_chain(input: &mut &[u8]) -> Result<UidChain> {
    let mut blob = pop_blob(input)?;
    let mut uids = Vec::new();
    while !blob.is_empty() {
        uids.push(pop_uid(&mut blob)?);
    }
    if uids.is_empty() {
        return Err(SrxError::Format("empty UID chain".to_string()));
    }
    Ok(UidChain::from_vec(uids))
}

fn pop_data_type(input: &mut &[u8]) -> Result<DataType> {
    let mut blob = pop_blob(input)?;
    let base_name = pop_string(&mut blob)?;
    let custom_name = pop_string(&mut blob)?;
    let size = pop_u64(&mut blob)? as usize;
    let is_pointer = pop_u64(&mut blob)? != 0;
    Ok(DataType::from_wire(base_name, custom_name, size, is_pointer))
}

fn pop_member(input: &mut &[u8]) -> Result<Option<Member>> {
    let mut blob = match try_pop_blob(input)? {
        None => return Ok(None),
        Some(blob) if blob.is_empty() => return Ok(None),
        Some(blob) => blob,
    };
    let uid = pop_uid(&mut blob)?;
    let offset = pop_u64(&mut blob)? as usize;
    let name = pop_string(&mut blob)?;
    let dtype = pop_data_type(&mut blob)?;
    Ok(Some(Member::new(&name, uid, offset, dtype)))
}

fn pop_members(input: &mut &[u8]) -> Result<Vec<Member>> {
    let mut blob = match try_pop_blob(input)? {
        None => return Ok(Vec::new()),
        Some(blob) => blob,
    };
    let mut members = Vec::new();
    while let Some(member) = pop_member(&mut blob)? {
        members.push(member);
    }
    Ok(members)
}

/// Parses the primitive value blob into the native width dictated by the
/// decoded type descriptor. Structs and pointers consume their empty
/// placeholder blob instead.
fn pop_primitive_value(input: &mut &[u8], object: &mut Object) -> Result<()> {
    let dtype = object.data_type().clone();
    if !dtype.is_primitive() || dtype.is_pointer() {
        let _ = try_pop_blob(input)?;
        return Ok(());
    }
    let width = dtype.size();
    let unsupported = || SrxError::Format(format!("unsupported primitive width {width}"));
    let raw = if dtype.is_integer() || dtype.is_enum() {
        if dtype.is_signed() {
            signed_to_raw(pop_i64(input)?, width).ok_or_else(unsupported)?
        } else {
            unsigned_to_raw(pop_u64(input)?, width).ok_or_else(unsupported)?
        }
    } else if dtype.is_real() {
        real_to_raw(pop_f64(input)?, width).ok_or_else(unsupported)?
    } else if dtype.is_bool() {
        vec![pop_u64(input)? as u8]
    } else {
        return Err(SrxError::Format(format!(
            "unknown primitive type '{}'",
            dtype.base_type_name()
        )));
    };
    object.set_raw(raw);
    Ok(())
}

fn pop_object(input: &mut &[u8]) -> Result<Option<Object>> {
    let mut blob = match try_pop_blob(input)? {
        None => return Ok(None),
        Some(blob) if blob.is_empty() => return Ok(None),
        Some(blob) => blob,
    };
    let dtype = pop_data_type(&mut blob)?;
    let version = pop_u64(&mut blob)? as Version;
    let min_version = pop_u64(&mut blob)? as Version;
    let chain = pop_uid_chain(&mut blob)?;
    let members = pop_members(&mut blob)?;
    let mut object = Object::from_wire(chain, dtype, version, min_version, members);
    pop_primitive_value(&mut blob, &mut object)?;
    Ok(Some(object))
}

fn pop_objects(input: &mut &[u8], pool: &mut ObjectPool) -> Result<()> {
    let mut blob = match try_pop_blob(input)? {
        None => return Err(SrxError::Format("premature end of objects blob".to_string())),
        Some(blob) if blob.is_empty() => {
            return Err(SrxError::Format("premature end of objects blob".to_string()))
        }
        Some(blob) => blob,
    };
    while let Some(object) = pop_object(&mut blob)? {
        pool.replace(object.uid(), object);
    }
    Ok(())
}

/// Decodes a byte stream into a pool plus archive metadata.
///
/// The stream must open with the magic; every other rule follows from the
/// blob grammar above.
pub(crate) fn decode(data: &[u8]) -> Result<DecodedArchive> {
    if !data.starts_with(MAGIC) {
        return Err(SrxError::Format("magic start missing".to_string()));
    }
    let mut input = &data[MAGIC.len()..];

    let mut root_blob = match try_pop_blob(&mut input)? {
        None => return Err(SrxError::Format("premature end of root blob".to_string())),
        Some(blob) if blob.is_empty() => {
            return Err(SrxError::Format("premature end of root blob".to_string()))
        }
        Some(blob) => blob,
    };

    // Reserved for future extensions of this encoding format.
    let _minor_version = pop_i64(&mut root_blob)?;

    let root = pop_uid(&mut root_blob)?;
    if !root.is_valid() {
        return Err(SrxError::Format("no root object".to_string()));
    }

    let mut pool = ObjectPool::new();
    pop_objects(&mut root_blob, &mut pool)?;
    if !pool.lookup(root).is_valid() {
        return Err(SrxError::Format("missing declared root object".to_string()));
    }

    let name = pop_string(&mut root_blob)?;
    let comment = pop_string(&mut root_blob)?;
    let created = pop_i64(&mut root_blob)?;
    let modified = pop_i64(&mut root_blob)?;

    debug!("decoded {} objects, root {}", pool.len(), root);
    Ok(DecodedArchive {
        root,
        pool,
        name,
        comment,
        created,
        modified,
    })
}
