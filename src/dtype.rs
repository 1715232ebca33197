//! Abstract reflection of native data types.
//!
//! A [`DataType`] records everything the engine needs to know about one
//! value slot: its canonical base kind, an opaque custom tag for
//! user-defined types, its byte width, and whether the slot is a pointer.
//! The canonical base names below are what goes on the wire; native type
//! names are deliberately avoided because their mangling varies between
//! toolchains.
//!
//! | base name | meaning |
//! |-----------|---------|
//! | `int8` .. `int64`, `uint8` .. `uint64` | fixed width integers |
//! | `bool` | boolean |
//! | `real32`, `real64` | floating point |
//! | `enum`, `union`, `class` | user-defined types, named by the custom tag |
//!
//! The custom tag is compared as an opaque token and never interpreted.

use std::cmp::Ordering;
use std::fmt;
use std::mem;

/// Detailed description of one native data type.
///
/// Equality is structural over all four attributes, which is exactly the
/// comparison the synchronizer applies before it touches live memory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataType {
    base_name: String,
    custom_name: String,
    size: usize,
    is_pointer: bool,
}

impl DataType {
    pub(crate) const fn invalid() -> Self {
        Self {
            base_name: String::new(),
            custom_name: String::new(),
            size: 0,
            is_pointer: false,
        }
    }

    pub(crate) fn new(is_pointer: bool, size: usize, base_name: &str, custom_name: &str) -> Self {
        Self {
            base_name: base_name.to_string(),
            custom_name: custom_name.to_string(),
            size,
            is_pointer,
        }
    }

    pub(crate) fn from_wire(
        base_name: String,
        custom_name: String,
        size: usize,
        is_pointer: bool,
    ) -> Self {
        Self {
            base_name,
            custom_name,
            size,
            is_pointer,
        }
    }

    /// Descriptor for a user-defined struct type, named by an opaque `tag`.
    ///
    /// The tag is what corresponding types on sender and receiver are
    /// matched by, so it must stay stable across versions of a program.
    pub fn of_class<T>(tag: &str) -> Self {
        Self::new(false, mem::size_of::<T>(), "class", tag)
    }

    /// Descriptor for a user-defined enum type.
    ///
    /// The enum must have a fixed width integer representation
    /// (`#[repr(u32)]` and friends) for its values to be serializable.
    pub fn of_enum<T>(tag: &str) -> Self {
        Self::new(false, mem::size_of::<T>(), "enum", tag)
    }

    /// Descriptor for a user-defined untagged union type.
    pub fn of_union<T>(tag: &str) -> Self {
        Self::new(false, mem::size_of::<T>(), "union", tag)
    }

    /// The same type, seen through a pointer variable.
    ///
    /// Note that `size` keeps describing the pointee.
    pub(crate) fn pointer_to(self) -> Self {
        Self {
            is_pointer: true,
            ..self
        }
    }

    /// Byte width of one value of this type (the pointee's width for
    /// pointer descriptors).
    pub fn size(&self) -> usize {
        self.size
    }

    /// A descriptor is valid once it has a non-zero width.
    pub fn is_valid(&self) -> bool {
        self.size != 0
    }

    /// Whether this descriptor describes a pointer variable.
    pub fn is_pointer(&self) -> bool {
        self.is_pointer
    }

    /// Whether the base kind is a user-defined struct.
    pub fn is_class(&self) -> bool {
        self.base_name == "class"
    }

    /// Everything that is not a class counts as primitive.
    pub fn is_primitive(&self) -> bool {
        !self.is_class()
    }

    /// Signed or unsigned fixed width integer.
    pub fn is_integer(&self) -> bool {
        self.base_name.starts_with("int") || self.base_name.starts_with("uint")
    }

    /// Floating point of either width.
    pub fn is_real(&self) -> bool {
        self.base_name.starts_with("real")
    }

    /// Boolean.
    pub fn is_bool(&self) -> bool {
        self.base_name == "bool"
    }

    /// User-defined enum.
    pub fn is_enum(&self) -> bool {
        self.base_name == "enum"
    }

    /// Signed integers and reals carry a sign.
    pub fn is_signed(&self) -> bool {
        self.base_name.starts_with("int") || self.is_real()
    }

    /// The canonical base name as written to the wire.
    pub fn base_type_name(&self) -> &str {
        &self.base_name
    }

    /// The opaque tag of a user-defined type; empty for primitives.
    pub fn custom_type_name(&self) -> &str {
        &self.custom_name
    }

    /// Human readable rendering, e.g. `class Node pointer`.
    pub fn as_long_descr(&self) -> String {
        let mut s = self.base_name.clone();
        if !self.custom_name.is_empty() {
            s.push(' ');
            s.push_str(&self.custom_name);
        }
        if self.is_pointer {
            s.push_str(" pointer");
        }
        s
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_long_descr())
    }
}

impl Ord for DataType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base_name
            .cmp(&other.base_name)
            .then_with(|| self.custom_name.cmp(&other.custom_name))
            .then_with(|| self.size.cmp(&other.size))
            .then_with(|| self.is_pointer.cmp(&other.is_pointer))
    }
}

impl PartialOrd for DataType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
