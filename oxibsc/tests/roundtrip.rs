//! End-to-end round trips over fixed inputs.

use oxibsc::bwt::{inverse_transform, transform};
use oxibsc::small_sort::cyclic_cmp;
use oxibsc::{
    BlockDecoder, BlockEncoder, BlockSorter, CodecConfig, DecodeStatus, compress, decompress,
};
use oxibsc_core::trace::SymbolRecorder;
use std::cmp::Ordering;

const LENGTHS: [usize; 7] = [0, 1, 2, 63, 64, 65, 1000];

fn random(len: usize) -> Vec<u8> {
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}

fn periodic(len: usize) -> Vec<u8> {
    b"TOBEORNOT".iter().copied().cycle().take(len).collect()
}

fn contents(len: usize) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("zeros", vec![0; len]),
        ("repeated", vec![0x41; len]),
        ("random", random(len)),
        ("periodic", periodic(len)),
    ]
}

fn assert_sorted(block: &[u8], ptr: &[u32]) {
    let mut seen = vec![false; block.len()];
    for &p in ptr {
        assert!(!seen[p as usize], "offset {p} appears twice");
        seen[p as usize] = true;
    }
    assert!(seen.iter().all(|&s| s));

    for pair in ptr.windows(2) {
        assert_ne!(
            cyclic_cmp(block, pair[0] as usize, pair[1] as usize),
            Ordering::Greater
        );
    }
}

#[test]
fn test_transform_roundtrip_all_shapes() {
    let mut sorter = BlockSorter::new(1000);
    let mut last = Vec::new();

    for len in LENGTHS {
        for (name, block) in contents(len) {
            let origin = transform(&mut sorter, &block, &mut last);
            assert_sorted(&block, sorter.rotation_index());
            if len == 0 {
                assert!(last.is_empty());
                continue;
            }
            assert_eq!(
                inverse_transform(&last, origin).unwrap(),
                block,
                "{name} block of {len} bytes"
            );
        }
    }
}

/// Bytes drawn from the first `alphabet` values.
fn narrow(len: usize, alphabet: u64) -> Vec<u8> {
    let mut seed: u64 = 0x0DDB_1A5E_5BAD_5EED;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((seed >> 33) % alphabet) as u8
        })
        .collect()
}

#[test]
fn test_large_buckets_roundtrip() {
    // Leading-byte buckets well past the 16-bit rank tag range
    for (len, alphabet) in [(300_000, 2), (240_000, 3)] {
        let block = narrow(len, alphabet);
        let mut sorter = BlockSorter::new(len);
        let mut last = Vec::new();
        let origin = transform(&mut sorter, &block, &mut last);
        assert_sorted(&block, sorter.rotation_index());
        assert_eq!(
            inverse_transform(&last, origin).unwrap(),
            block,
            "{len} bytes over {alphabet} symbols"
        );

        let packed = compress(&block, &CodecConfig::new(len)).unwrap();
        assert_eq!(decompress(&packed).unwrap(), block);
    }
}

#[test]
fn test_banana_scenario() {
    let mut sorter = BlockSorter::new(6);
    let mut last = Vec::new();
    let origin = transform(&mut sorter, b"banana", &mut last);
    assert_eq!(last, b"nnbaaa");
    assert_eq!(inverse_transform(&last, origin).unwrap(), b"banana");
}

#[test]
fn test_uniform_200_bytes() {
    let block = vec![0x41u8; 200];
    let mut sorter = BlockSorter::new(block.len());
    let mut last = Vec::new();
    let origin = transform(&mut sorter, &block, &mut last);
    assert_eq!(inverse_transform(&last, origin).unwrap(), block);

    let packed = compress(&block, &CodecConfig::new(200)).unwrap();
    assert_eq!(decompress(&packed).unwrap(), block);
}

#[test]
fn test_frame_roundtrip_all_shapes() {
    for len in LENGTHS {
        for (name, data) in contents(len) {
            for block_size in [1, 64, 100, 4096] {
                let config = CodecConfig::new(block_size);
                let packed = compress(&data, &config).unwrap();
                assert_eq!(
                    decompress(&packed).unwrap(),
                    data,
                    "{name} data of {len} bytes in {block_size} byte blocks"
                );
            }
        }
    }
}

#[test]
fn test_block_codec_with_stub_coder() {
    let config = CodecConfig::new(256).with_checksum(false);
    let data = [random(700), periodic(300), vec![0; 256]].concat();

    let mut encoder = BlockEncoder::start(SymbolRecorder::new(), config).unwrap();
    let mut rest = &data[..];
    while !rest.is_empty() {
        let used = encoder.encode(rest).unwrap();
        rest = &rest[used..];
    }
    assert_eq!(encoder.blocks_written(), 5);
    let recorder = encoder.finish().unwrap();

    let mut decoder = BlockDecoder::start(recorder.into_replayer(), config).unwrap();
    let mut buffer = vec![0u8; 256];
    let mut out = Vec::new();
    loop {
        match decoder.decode(&mut buffer).unwrap() {
            DecodeStatus::Block(len) => out.extend_from_slice(&buffer[..len]),
            DecodeStatus::EndOfStream => break,
            DecodeStatus::NeedsOutput { needed } => panic!("buffer too small: {needed}"),
        }
    }
    assert_eq!(out, data);
}

#[test]
fn test_compression_ratio_on_text() {
    let text = b"The quick brown fox jumps over the lazy dog. \
                 Pack my box with five dozen liquor jugs. "
        .repeat(200);
    let packed = compress(&text, &CodecConfig::default()).unwrap();
    assert!(
        packed.len() * 20 < text.len(),
        "{} bytes packed to {}",
        text.len(),
        packed.len()
    );
    assert_eq!(decompress(&packed).unwrap(), text);
}

#[test]
fn test_random_data_does_not_blow_up() {
    let data = random(50_000);
    let packed = compress(&data, &CodecConfig::new(16 * 1024)).unwrap();
    assert!(packed.len() < data.len() + data.len() / 10);
    assert_eq!(decompress(&packed).unwrap(), data);
}
