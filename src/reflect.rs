//! The capability trait that makes a type serializable.
//!
//! The engine cannot introspect arbitrary structs on its own. Each type
//! taking part in serialization implements [`Reflect`], which supplies the
//! three things the archive needs: a type descriptor, an identity chain for
//! a concrete datum, and the *descriptor routine* enumerating the members
//! to track.
//!
//! The crate implements the trait for all fixed width scalars and for raw
//! pointers of first degree. User structs either derive it:
//!
//! ```rust,ignore
//! #[derive(Reflect)]
//! struct Foo {
//!     a: i32,
//!     b: bool,
//!     #[srx(skip)]
//!     scratch: f64, // not serialized
//! }
//! ```
//!
//! or implement it by hand, which is also how enums declare their
//! classification and opaque tag:
//!
//! ```rust,ignore
//! impl Reflect for Bar {
//!     fn data_type() -> DataType {
//!         DataType::of_class::<Bar>("Bar")
//!     }
//!     fn describe(&self, archive: &mut Archive) {
//!         archive.register_member(self, &self.one, "one");
//!         archive.register_member(self, &self.two, "two");
//!     }
//! }
//! ```
//!
//! The same routine serves both directions: during encode it records the
//! sender's graph, during decode it records the receiver's live graph so
//! the synchronizer knows where values may be written.

use crate::archive::Archive;
use crate::dtype::DataType;
use crate::uid::{Uid, UidChain};

/// A type that can be registered with an [`Archive`].
pub trait Reflect {
    /// The type descriptor for one value of this type.
    fn data_type() -> DataType
    where
        Self: Sized;

    /// The identity chain of this concrete datum.
    ///
    /// Scalars and structs use the default one element chain. Pointer
    /// variables override this with a two element chain covering the
    /// variable and its pointee.
    fn uid_chain(&self) -> UidChain
    where
        Self: Sized,
    {
        UidChain::single(Uid::of(self))
    }

    /// The descriptor routine: registers every member that should be
    /// tracked.
    ///
    /// The default does nothing, which is correct for primitives. Pointer
    /// implementations forward to the pointee when it exists.
    fn describe(&self, archive: &mut Archive) {
        let _ = archive;
    }
}
