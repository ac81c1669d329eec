//! Rescaling decorator: logical/inner mapping, fail-closed construction.

mod common;

use microfat::{BlockStore, MemStore, ScaleStore, StoreError};

#[test]
fn presents_the_scaled_geometry() {
    let mut data = vec![0u8; 8 * 512];
    let store = ScaleStore::new(MemStore::new(&mut data), 1024);
    assert_eq!(store.block_size(), 1024);
    assert_eq!(store.block_count(), 4);
    assert!(store.is_writable());
}

#[test]
fn a_logical_read_concatenates_inner_blocks() {
    let mut data = vec![0u8; 8 * 512];
    for (i, b) in data.iter_mut().enumerate() {
        *b = (i / 512) as u8;
    }

    // Reference: the two inner blocks under logical block 1.
    let mut expected = vec![0u8; 1024];
    {
        let mut inner = MemStore::new(&mut data);
        inner.read_at(2, &mut expected[..512]).unwrap();
        inner.read_at(3, &mut expected[512..]).unwrap();
    }

    let mut store = ScaleStore::new(MemStore::new(&mut data), 1024);
    let mut buf = vec![0u8; 1024];
    store.read_at(1, &mut buf).unwrap();
    assert_eq!(buf, expected);
    assert_eq!(store.position(), 2);
}

#[test]
fn writes_pass_through_to_the_inner_store() {
    let mut data = vec![0u8; 8 * 512];
    {
        let mut store = ScaleStore::new(MemStore::new(&mut data), 2048);
        let block: Vec<u8> = (0..2048).map(|i| (i % 199) as u8).collect();
        store.write_at(1, &block).unwrap();

        let mut back = vec![0u8; 2048];
        store.read_at(1, &mut back).unwrap();
        assert_eq!(back, block);
    }
    // Logical block 1 covers inner blocks 4..8.
    assert_eq!(data[4 * 512], 0);
    assert_eq!(data[4 * 512 + 1], 1);
}

#[test]
fn scale_of_one_is_transparent() {
    let mut data = vec![0u8; 4 * 512];
    data[3 * 512] = 0x77;
    let mut store = ScaleStore::new(MemStore::new(&mut data), 512);
    assert_eq!(store.block_count(), 4);

    let mut buf = [0u8; 512];
    store.read_at(3, &mut buf).unwrap();
    assert_eq!(buf[0], 0x77);
}

#[test]
fn misaligned_sizes_fail_closed() {
    let mut data = vec![0u8; 8 * 512];
    let mut store = ScaleStore::new(MemStore::new(&mut data), 768);

    let mut buf = vec![0u8; 768];
    assert_eq!(store.seek(0).unwrap_err(), StoreError::Io);
    assert_eq!(store.read(&mut buf).unwrap_err(), StoreError::Io);
    assert_eq!(store.write(&buf).unwrap_err(), StoreError::Io);
}

#[test]
fn a_size_smaller_than_the_inner_block_fails_closed() {
    let mut data = vec![0u8; 8 * 512];
    let mut store = ScaleStore::new(MemStore::new(&mut data), 256);
    let mut buf = vec![0u8; 256];
    assert_eq!(store.read(&mut buf).unwrap_err(), StoreError::Io);
}

#[test]
fn bounds_are_checked_on_the_logical_geometry() {
    let mut data = vec![0u8; 6 * 512]; // 3 logical blocks of 1024
    let mut store = ScaleStore::new(MemStore::new(&mut data), 1024);
    assert_eq!(store.block_count(), 3);
    assert_eq!(store.seek(3).unwrap_err(), StoreError::OutOfBounds);
    store.seek(2).unwrap();
}

#[test]
fn read_only_inner_stores_stay_read_only() {
    let data = vec![0u8; 4 * 512];
    let mut store = ScaleStore::new(MemStore::read_only(&data), 1024);
    assert!(!store.is_writable());
    let buf = vec![0u8; 1024];
    store.seek(0).unwrap();
    assert_eq!(store.write(&buf).unwrap_err(), StoreError::NotWritable);
}
