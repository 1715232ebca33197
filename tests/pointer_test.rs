#![allow(missing_docs)]

use std::ptr;

use srx::{Archive, Reflect};

#[derive(Reflect)]
#[repr(C)]
struct Node {
    id: i32,
    next: *mut Node,
}

fn alloc_node(id: i32) -> *mut Node {
    Box::into_raw(Box::new(Node {
        id,
        next: ptr::null_mut(),
    }))
}

fn make_cycle(ids: [i32; 3]) -> [*mut Node; 3] {
    let nodes = [alloc_node(ids[0]), alloc_node(ids[1]), alloc_node(ids[2])];
    unsafe {
        (*nodes[0]).next = nodes[1];
        (*nodes[1]).next = nodes[2];
        (*nodes[2]).next = nodes[0];
    }
    nodes
}

fn free(nodes: [*mut Node; 3]) {
    for node in nodes {
        unsafe {
            drop(Box::from_raw(node));
        }
    }
}

// --- TESTS ---

/// A three node pointer cycle round trips without endless recursion and
/// preserves the cycle order.
#[test]
fn test_cycle_round_trip() -> srx::Result<()> {
    let source = make_cycle([1, 2, 3]);
    let mut archive = Archive::new();
    unsafe {
        archive.serialize(&*source[0])?;
    }
    let wire = archive.raw_bytes()?.to_vec();
    free(source);

    let destination = make_cycle([0, 0, 0]);
    let mut archive = Archive::from_bytes(&wire)?;
    unsafe {
        archive.deserialize(&mut *destination[0])?;

        assert_eq!((*destination[0]).id, 1);
        assert_eq!((*(*destination[0]).next).id, 2);
        assert_eq!((*(*(*destination[0]).next).next).id, 3);
        // One more hop closes the cycle.
        assert_eq!((*(*(*(*destination[0]).next).next).next).id, 1);
    }
    free(destination);
    Ok(())
}

/// A null pointer ends the chain on both sides.
#[test]
fn test_null_pointer() -> srx::Result<()> {
    let source = Node {
        id: 5,
        next: ptr::null_mut(),
    };
    let mut archive = Archive::new();
    archive.serialize(&source)?;
    let wire = archive.raw_bytes()?.to_vec();

    let mut received = Node {
        id: 0,
        next: ptr::null_mut(),
    };
    Archive::from_bytes(&wire)?.deserialize(&mut received)?;
    assert_eq!(received.id, 5);
    assert!(received.next.is_null());
    Ok(())
}

/// A source-side null pointer leaves an existing destination pointee
/// untouched; pointer variables themselves are never rewritten.
#[test]
fn test_source_null_keeps_destination_pointee() -> srx::Result<()> {
    let source = Node {
        id: 7,
        next: ptr::null_mut(),
    };
    let mut archive = Archive::new();
    archive.serialize(&source)?;
    let wire = archive.raw_bytes()?.to_vec();

    let tail = alloc_node(99);
    let mut head = Node { id: 0, next: tail };
    Archive::from_bytes(&wire)?.deserialize(&mut head)?;

    assert_eq!(head.id, 7);
    assert_eq!(head.next, tail);
    unsafe {
        assert_eq!((*tail).id, 99);
        drop(Box::from_raw(tail));
    }
    Ok(())
}

/// Two pointers to one pointee register it once and sync it once.
#[test]
fn test_shared_pointee() -> srx::Result<()> {
    #[derive(Reflect)]
    #[repr(C)]
    struct Pair {
        first: *mut Node,
        second: *mut Node,
    }

    let shared = alloc_node(31);
    let source = Pair {
        first: shared,
        second: shared,
    };
    let mut archive = Archive::new();
    archive.serialize(&source)?;
    let wire = archive.raw_bytes()?.to_vec();
    unsafe {
        drop(Box::from_raw(shared));
    }

    let shared = alloc_node(0);
    let mut received = Pair {
        first: shared,
        second: shared,
    };
    Archive::from_bytes(&wire)?.deserialize(&mut received)?;
    unsafe {
        assert_eq!((*shared).id, 31);
        drop(Box::from_raw(shared));
    }
    Ok(())
}
