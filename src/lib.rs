//! # Srx
//!
//! A reflective serialization library that turns live object graphs into
//! self-describing byte streams and, on the receiving side, writes the
//! captured values back into a live graph, even when sender and receiver
//! were built from different versions of the same types.
//!
//! ## Overview
//!
//! Srx is fundamentally different from value-oriented serialization
//! libraries. Instead of producing a detached value tree, it reflects over
//! the *live* graph: every tracked datum gets an identity derived from its
//! address and width, every struct records named member descriptors with
//! offsets and precise types, and the decoded stream is reconciled member
//! by member against the receiver's own reflection of its current types.
//!
//! ### Key Features
//!
//! *   **Schema evolution tolerance:** renamed fields, added or removed
//!     members and reordered fields are bound by a multi-stage matching
//!     policy instead of failing outright, and incompatibilities fail
//!     cleanly with both sides of the mismatch in the error.
//! *   **Cyclic graphs:** first degree pointers may form arbitrary cycles;
//!     identity tracking guarantees each object is registered and synced
//!     exactly once.
//! *   **Self-describing streams:** the wire format carries the complete
//!     reflection (types, names, offsets, versions), so no external schema
//!     or registry is needed to make sense of a stream.
//! *   **Partial deserialization:** a decoded archive can be inspected and
//!     edited through identity-keyed value accessors before its values are
//!     applied to live memory.
//! *   **Portable identities:** identity tokens are carried as decimal text
//!     of the full 64-bit value and are never dereferenced on the receiving
//!     side, which makes streams portable across machines with different
//!     pointer widths and address layouts.
//!
//! ## Architecture
//!
//! ### The Reflection Model
//!
//! Each tracked datum is described by an [`Object`]: an identity chain
//! ([`UidChain`]), a type descriptor ([`DataType`]), version stamps, a
//! value snapshot for primitives, and the registered [`Member`] list for
//! structs. Objects live in an identity-keyed pool, one pool per archive.
//!
//! ### The Descriptor Routine
//!
//! The engine does not introspect structs by itself. Every user type
//! implements [`Reflect`] (usually via `#[derive(Reflect)]`), whose
//! `describe` method names the members to track. The same routine serves
//! serialization and deserialization; on the receiving side it reflects the
//! *current* shape of the type, which is exactly what schema-tolerant
//! matching needs.
//!
//! ### The Synchronizer
//!
//! Decoding produces a source pool; walking the receiver's root produces a
//! destination pool. The synchronizer pairs objects starting at both roots,
//! gates each pair on version and structural type equality, binds class
//! members through the matching ladder (name+type, unique type,
//! type+offset, type+sequence), and copies primitive bytes into the
//! destination addresses.
//!
//! ## Usage
//!
//! ```rust
//! use srx::{Archive, Reflect};
//!
//! #[derive(Reflect)]
//! struct Settings {
//!     gain: f64,
//!     muted: bool,
//!     channel: i32,
//! }
//!
//! # fn main() -> srx::Result<()> {
//! // Sender side.
//! let settings = Settings { gain: 0.8, muted: false, channel: 3 };
//! let mut archive = srx::Archive::new();
//! archive.serialize(&settings)?;
//! let wire = archive.raw_bytes()?.to_vec();
//!
//! // Receiver side, possibly a different build of `Settings`.
//! let mut received = Settings { gain: 0.0, muted: true, channel: 0 };
//! let mut archive = Archive::from_bytes(&wire)?;
//! archive.deserialize(&mut received)?;
//! assert_eq!(received.channel, 3);
//! # Ok(())
//! # }
//! ```
//!
//! Pointered graphs work the same way; a `*mut T` member contributes a two
//! element identity chain and the walk follows non-null pointers:
//!
//! ```rust,ignore
//! #[derive(Reflect)]
//! #[repr(C)]
//! struct Node {
//!     value: i32,
//!     next: *mut Node, // cycles are fine
//! }
//! ```
//!
//! ## Safety and Error Handling
//!
//! * **Encapsulated unsafe:** `unsafe` is confined to the three operations
//!   the design requires: snapshotting primitive bytes during registration,
//!   following non-null pointers during a walk, and writing synced values
//!   through destination identities. Everything else is forbidden via
//!   `#![deny(unsafe_code)]` with site-local allowances.
//! * **No panics:** no `unwrap()` or `panic!()` in the library (enforced by
//!   clippy lints). All failures surface as [`SrxError`].
//! * **Single-threaded:** an archive is a single-owner mutable value;
//!   encode and decode are blocking calls without internal concurrency.

#![deny(unsafe_code)]
#![warn(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod archive;
pub mod dtype;
pub mod error;
pub mod object;
pub mod reflect;
pub mod uid;

// --- INTERNAL IMPLEMENTATION MODULES ---
mod codec;
mod pool;
mod reflect_impls;
mod sync;

// --- RE-EXPORTS ---

pub use archive::{Archive, Operation, TimeBase};
pub use dtype::DataType;
pub use error::{Result, Side, SrxError};
pub use object::{Member, Object, Version};
pub use reflect::Reflect;
pub use uid::{Uid, UidChain};

// Re-export the derive macro so it is accessible as `srx::Reflect`.
pub use srx_derive::Reflect;
