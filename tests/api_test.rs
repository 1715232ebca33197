#![allow(missing_docs)]

use std::io::{Read, Write};

use srx::{Archive, DataType, Reflect, SrxError, TimeBase, Uid};

#[derive(Reflect)]
#[repr(C)]
struct Sample {
    a: i32,
    b: bool,
    c: f64,
}

fn sample() -> Sample {
    Sample {
        a: 42,
        b: true,
        c: -1.5,
    }
}

// --- TESTS ---

/// Full primitive round trip: encode a struct, decode the stream on a
/// fresh archive, sync into a zeroed instance.
#[test]
fn test_primitive_round_trip() -> srx::Result<()> {
    let original = sample();
    let mut archive = Archive::new();
    archive.serialize(&original)?;
    let wire = archive.raw_bytes()?.to_vec();

    let mut received = Sample {
        a: 0,
        b: false,
        c: 0.0,
    };
    let mut archive = Archive::from_bytes(&wire)?;
    archive.deserialize(&mut received)?;

    assert_eq!(received.a, 42);
    assert!(received.b);
    assert_eq!(received.c, -1.5);
    Ok(())
}

/// The stream self-identifies through the magic prefix.
#[test]
fn test_raw_data_format() -> srx::Result<()> {
    let mut archive = Archive::new();
    assert_eq!(archive.raw_data_format(), "Srx1v");
    archive.serialize(&sample())?;
    assert!(archive.raw_bytes()?.starts_with(b"Srx1v"));
    Ok(())
}

/// Fields marked `#[srx(skip)]` take no part in serialization.
#[test]
fn test_skip_attribute() -> srx::Result<()> {
    #[derive(Reflect)]
    #[repr(C)]
    struct WithScratch {
        kept: i32,
        #[srx(skip)]
        scratch: i64,
    }

    let source = WithScratch {
        kept: 9,
        scratch: 1111,
    };
    let mut archive = Archive::new();
    archive.serialize(&source)?;
    assert_eq!(archive.root_object().members().len(), 1);
    let wire = archive.raw_bytes()?.to_vec();

    let mut received = WithScratch {
        kept: 0,
        scratch: -7,
    };
    Archive::from_bytes(&wire)?.deserialize(&mut received)?;
    assert_eq!(received.kept, 9);
    assert_eq!(received.scratch, -7, "skipped member must stay untouched");
    Ok(())
}

/// Walking the same datum twice registers nothing new.
#[test]
fn test_registration_idempotence() {
    let data = sample();
    let mut archive = Archive::new();
    data.describe(&mut archive);
    let members_once = archive
        .object_by_identity(Uid::of(&data))
        .members()
        .to_vec();

    data.describe(&mut archive);
    let root = archive.object_by_identity(Uid::of(&data));
    assert_eq!(root.members(), &members_once[..]);
    assert_eq!(root.members().len(), 3);
}

/// Name, comment and timestamps travel inside the stream.
#[test]
fn test_metadata_round_trip() -> srx::Result<()> {
    let mut archive = Archive::new();
    archive.set_name("unit");
    archive.set_comment("metadata probe");
    archive.serialize(&sample())?;
    let wire = archive.raw_bytes()?.to_vec();

    assert!(archive.timestamp_created() > 0);
    assert_eq!(archive.timestamp_created(), archive.timestamp_modified());

    let decoded = Archive::from_bytes(&wire)?;
    assert_eq!(decoded.name(), "unit");
    assert_eq!(decoded.comment(), "metadata probe");
    assert_eq!(decoded.timestamp_created(), archive.timestamp_created());
    let utc = decoded.date_time_created(TimeBase::Utc)?;
    let local = decoded.date_time_modified(TimeBase::Local)?;
    assert!(utc.and_utc().timestamp() == decoded.timestamp_created());
    let _ = local;
    Ok(())
}

/// Editing a decoded archive re-encodes lazily on the next raw access.
#[test]
fn test_lazy_reencode_after_edit() -> srx::Result<()> {
    let mut archive = Archive::new();
    archive.serialize(&sample())?;
    let wire = archive.raw_bytes()?.to_vec();

    let mut decoded = Archive::from_bytes(&wire)?;
    assert!(!decoded.is_modified());
    let a_uid = decoded
        .root_object()
        .member_named("a")
        .expect("member a")
        .uid();
    decoded.set_int_value(a_uid, 7)?;
    assert!(decoded.is_modified());

    let edited_wire = decoded.raw_bytes()?.to_vec();
    assert!(!decoded.is_modified());

    let mut received = sample();
    Archive::from_bytes(&edited_wire)?.deserialize(&mut received)?;
    assert_eq!(received.a, 7);
    assert!(received.b);
    Ok(())
}

/// An archive survives a trip over the file system.
#[test]
fn test_disk_round_trip() -> srx::Result<()> {
    let mut archive = Archive::new();
    archive.serialize(&sample())?;
    let wire = archive.raw_bytes()?.to_vec();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sample.srx");
    std::fs::File::create(&path)
        .and_then(|mut f| f.write_all(&wire))
        .expect("write archive");

    let mut bytes = Vec::new();
    std::fs::File::open(&path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .expect("read archive");

    let mut received = Sample {
        a: 0,
        b: false,
        c: 0.0,
    };
    Archive::from_bytes(&bytes)?.deserialize(&mut received)?;
    assert_eq!(received.a, 42);
    Ok(())
}

/// `clear` drops pool, stream and metadata alike.
#[test]
fn test_clear() -> srx::Result<()> {
    let mut archive = Archive::new();
    archive.set_name("gone soon");
    archive.serialize(&sample())?;
    archive.clear();
    assert!(!archive.root_object().is_valid());
    assert!(archive.name().is_empty());
    assert_eq!(archive.timestamp_created(), 0);
    assert!(!archive.is_modified());
    Ok(())
}

/// Removing an object sweeps the member descriptors referring to it.
#[test]
fn test_remove_sweeps_members() -> srx::Result<()> {
    let data = sample();
    let mut archive = Archive::new();
    archive.serialize(&data)?;

    let root_uid = archive.root_object().uid();
    let b_uid = archive
        .root_object()
        .member_named("b")
        .expect("member b")
        .uid();
    archive.remove(b_uid);

    assert!(!archive.object_by_identity(b_uid).is_valid());
    let root = archive.object_by_identity(root_uid);
    assert!(root.member_named("b").is_none());
    assert_eq!(root.members().len(), 2);
    Ok(())
}

/// Enums serialize through their fixed width representation.
#[test]
fn test_enum_round_trip() -> srx::Result<()> {
    #[repr(u32)]
    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Mode {
        Off = 0,
        Auto = 2,
    }

    impl Reflect for Mode {
        fn data_type() -> DataType {
            DataType::of_enum::<Mode>("Mode")
        }
    }

    #[derive(Reflect)]
    #[repr(C)]
    struct Settings {
        mode: Mode,
        level: u16,
    }

    let source = Settings {
        mode: Mode::Auto,
        level: 800,
    };
    let mut archive = Archive::new();
    archive.serialize(&source)?;
    let wire = archive.raw_bytes()?.to_vec();

    let decoded = Archive::from_bytes(&wire)?;
    let mode_member = decoded
        .root_object()
        .member_named("mode")
        .expect("member mode")
        .clone();
    assert!(mode_member.data_type().is_enum());
    assert_eq!(mode_member.data_type().custom_type_name(), "Mode");
    assert_eq!(decoded.value_as_int(mode_member.uid())?, 2);

    let mut received = Settings {
        mode: Mode::Off,
        level: 0,
    };
    let mut decoded = decoded;
    decoded.deserialize(&mut received)?;
    assert_eq!(received.mode, Mode::Auto);
    assert_eq!(received.level, 800);
    Ok(())
}

/// A stream without any decodable root fails cleanly.
#[test]
fn test_empty_archive_has_no_root() {
    let archive = Archive::new();
    assert!(!archive.root_object().is_valid());
    assert!(matches!(
        Archive::from_bytes(b""),
        Err(SrxError::Format(_))
    ));
}
