//! Host-file block store: open modes, geometry, round trips.

mod common;

use std::io::Write;

use microfat::{BlockStore, FileStore, StoreError};

fn temp_image(blocks: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..blocks * 512).map(|i| (i % 256) as u8).collect();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn opens_an_existing_image() {
    let image = temp_image(4);
    let store = FileStore::open(image.path(), false).unwrap();
    assert_eq!(store.block_size(), 512);
    assert_eq!(store.block_count(), 4);
    assert!(!store.is_writable());
}

#[test]
fn missing_files_fail_to_open() {
    assert_eq!(
        FileStore::open("/nonexistent/no-such.img", false).unwrap_err(),
        StoreError::Io
    );
}

#[test]
fn reads_match_the_file_contents() {
    let image = temp_image(3);
    let mut store = FileStore::open(image.path(), false).unwrap();

    let mut buf = [0u8; 512];
    store.read_at(2, &mut buf).unwrap();
    for (i, &b) in buf.iter().enumerate() {
        assert_eq!(b, ((2 * 512 + i) % 256) as u8);
    }
    assert_eq!(store.position(), 3);
    assert_eq!(store.read(&mut buf).unwrap_err(), StoreError::OutOfBounds);
}

#[test]
fn sequential_reads_walk_the_file() {
    let image = temp_image(3);
    let mut store = FileStore::open(image.path(), false).unwrap();

    let mut first = [0u8; 512];
    let mut second = [0u8; 512];
    store.read(&mut first).unwrap();
    store.read(&mut second).unwrap();
    assert_eq!(first[0], 0);
    assert_eq!(second[0], 0);
    assert_eq!(second[1], 1);
    assert_eq!(store.position(), 2);
}

#[test]
fn write_read_round_trip() {
    let image = temp_image(4);
    let mut store = FileStore::open(image.path(), true).unwrap();

    let block = [0xC3u8; 512];
    store.write_at(1, &block).unwrap();

    let mut back = [0u8; 512];
    store.read_at(1, &mut back).unwrap();
    assert_eq!(&back[..], &block[..]);
}

#[test]
fn read_only_handles_reject_writes() {
    let image = temp_image(2);
    let mut store = FileStore::open(image.path(), false).unwrap();

    let block = [0u8; 512];
    store.seek(0).unwrap();
    assert_eq!(store.write(&block).unwrap_err(), StoreError::NotWritable);

    // The rejection is a pre-check, not a sticky failure.
    let mut buf = [0u8; 512];
    store.read_at(0, &mut buf).unwrap();
}

#[test]
fn seeking_past_the_end_is_rejected() {
    let image = temp_image(2);
    let mut store = FileStore::open(image.path(), true).unwrap();
    assert_eq!(store.seek(2).unwrap_err(), StoreError::OutOfBounds);
}
