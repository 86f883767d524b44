//! Property tests for the transform, the rank coder and the codec.

use oxibsc::bwt::{inverse_transform, transform};
use oxibsc::mtf::{EOB, MtfRecoder, ZRUN1};
use oxibsc::small_sort::cyclic_cmp;
use oxibsc::{BlockSorter, CodecConfig, compress, decompress};
use oxibsc_core::trace::{SymbolRecorder, TraceContext};
use oxibsc_core::traits::{EntropyDecoder, EntropyEncoder};
use proptest::prelude::*;
use std::cmp::Ordering;

fn block_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..1500),
        prop::collection::vec(0u8..3, 0..1500),
        (prop::collection::vec(any::<u8>(), 1..6), 1usize..300)
            .prop_map(|(unit, times)| unit.repeat(times)),
    ]
}

/// Run digits the encoder emits for a run of `run` zeros.
fn run_digits(run: usize) -> Vec<u32> {
    let mut recorder = SymbolRecorder::new();
    let mut recoder: MtfRecoder<TraceContext> =
        MtfRecoder::new(|spec| recorder.make_context(spec));
    recoder.encode_ranks(&mut recorder, &vec![0; run]).unwrap();

    let symbols: Vec<u32> = recorder.symbols().iter().map(|s| s.symbol).collect();
    assert_eq!(symbols.last(), Some(&EOB));
    symbols[..symbols.len() - 1].to_vec()
}

proptest! {
    #[test]
    fn test_sort_is_ordered_permutation(block in block_strategy()) {
        let mut sorter = BlockSorter::new(block.len());
        sorter.sort(&block);
        let ptr = sorter.rotation_index();

        let mut sorted = ptr.to_vec();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..block.len() as u32).collect::<Vec<_>>());

        for pair in ptr.windows(2) {
            prop_assert_ne!(
                cyclic_cmp(&block, pair[0] as usize, pair[1] as usize),
                Ordering::Greater
            );
        }
    }

    #[test]
    fn test_transform_roundtrip(block in block_strategy()) {
        prop_assume!(!block.is_empty());
        let mut sorter = BlockSorter::new(block.len());
        let mut last = Vec::new();
        let origin = transform(&mut sorter, &block, &mut last);
        prop_assert_eq!(inverse_transform(&last, origin).unwrap(), block);
    }

    #[test]
    fn test_codec_roundtrip(
        data in block_strategy(),
        block_size in 1usize..700,
        checksum in any::<bool>(),
    ) {
        let config = CodecConfig::new(block_size).with_checksum(checksum);
        let packed = compress(&data, &config).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_rank_roundtrip(
        ranks in prop::collection::vec(
            prop_oneof![3 => Just(0u8), 1 => any::<u8>()],
            0..2000,
        )
    ) {
        let mut recorder = SymbolRecorder::new();
        let mut encoder: MtfRecoder<TraceContext> =
            MtfRecoder::new(|spec| recorder.make_context(spec));
        encoder.encode_ranks(&mut recorder, &ranks).unwrap();

        let mut replayer = recorder.into_replayer();
        let mut decoder: MtfRecoder<TraceContext> =
            MtfRecoder::new(|spec| replayer.make_context(spec));
        let mut out = Vec::new();
        decoder.decode_ranks(&mut replayer, &mut out, usize::MAX, 0).unwrap();
        prop_assert_eq!(out, ranks);
    }

    #[test]
    fn test_zero_run_digits_are_bijective(a in 0usize..5000, b in 0usize..5000) {
        let da = run_digits(a);
        let db = run_digits(b);
        prop_assert!(da.iter().all(|&d| d <= ZRUN1));
        prop_assert_eq!(a == b, da == db);

        // Decoding the digits gives the run back
        let decoded: usize = da
            .iter()
            .enumerate()
            .map(|(i, &d)| (d as usize + 1) << i)
            .sum();
        prop_assert_eq!(decoded, a);
    }
}
