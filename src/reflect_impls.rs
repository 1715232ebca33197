//! `Reflect` implementations for scalars and first degree pointers.

use std::mem;

use crate::archive::Archive;
use crate::dtype::DataType;
use crate::reflect::Reflect;
use crate::uid::{Uid, UidChain};

macro_rules! reflect_scalar {
    ($($ty:ty => $tag:literal),* $(,)?) => {$(
        impl Reflect for $ty {
            fn data_type() -> DataType {
                DataType::new(false, mem::size_of::<$ty>(), $tag, "")
            }
        }
    )*};
}

reflect_scalar! {
    i8  => "int8",
    u8  => "uint8",
    i16 => "int16",
    u16 => "uint16",
    i32 => "int32",
    u32 => "uint32",
    i64 => "int64",
    u64 => "uint64",
    bool => "bool",
    f32 => "real32",
    f64 => "real64",
}

impl<T: Reflect> Reflect for *mut T {
    fn data_type() -> DataType {
        T::data_type().pointer_to()
    }

    fn uid_chain(&self) -> UidChain {
        UidChain::pair(
            Uid::of(self),
            Uid::new(*self as usize as u64, mem::size_of::<T>() as u64),
        )
    }

    fn describe(&self, archive: &mut Archive) {
        if self.is_null() {
            return;
        }
        #[allow(unsafe_code)]
        // SAFETY: non-null was just checked; a registered pointer must
        // reference a live pointee for the duration of the archive call.
        let pointee = unsafe { &**self };
        pointee.describe(archive);
    }
}

impl<T: Reflect> Reflect for *const T {
    fn data_type() -> DataType {
        T::data_type().pointer_to()
    }

    fn uid_chain(&self) -> UidChain {
        UidChain::pair(
            Uid::of(self),
            Uid::new(*self as usize as u64, mem::size_of::<T>() as u64),
        )
    }

    fn describe(&self, archive: &mut Archive) {
        if self.is_null() {
            return;
        }
        #[allow(unsafe_code)]
        // SAFETY: non-null was just checked; a registered pointer must
        // reference a live pointee for the duration of the archive call.
        let pointee = unsafe { &**self };
        pointee.describe(archive);
    }
}
