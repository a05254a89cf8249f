//! Pin/unpin balance across arbitrary add sequences

use std::collections::HashSet;

use proptest::prelude::*;

use crate::common::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Releases on drop equal the number of distinct chunks retained, no
    /// matter how often the same chunk was added.
    #[test]
    fn document_result_releases_each_distinct_chunk_once(
        picks in proptest::collection::vec(1u64..=8, 1..40)
    ) {
        let cache = small_cache(8);
        let trx = transaction(&cache);
        populate(&cache, 8, 900);
        let baseline = cache.stats().pins_released;

        let mut distinct = HashSet::new();
        let mut redundant = 0u64;
        {
            let mut doc = DocumentResult::new(&trx);
            for n in &picks {
                let guard = cache.protect(rid(*n)).unwrap();
                if !distinct.insert(guard.chunk_id()) {
                    redundant += 1;
                }
                doc.add(guard, rid(*n));
                prop_assert_eq!(doc.last_revision_id(), rid(*n));
                prop_assert_eq!(doc.vpack()[0], *n as u8);
            }
            prop_assert_eq!(doc.pinned_chunks(), distinct.len());
            prop_assert_eq!(cache.stats().pins_released, baseline + redundant);
            prop_assert_eq!(cache.stats().pinned_chunks, distinct.len());
        }
        prop_assert_eq!(
            cache.stats().pins_released,
            baseline + redundant + distinct.len() as u64
        );
        prop_assert_eq!(cache.stats().pinned_chunks, 0);
    }

    /// Reads through the transaction never take a second pin on a chunk the
    /// result already holds.
    #[test]
    fn multi_result_reads_pin_each_chunk_once(
        picks in proptest::collection::vec(1u64..=8, 1..40)
    ) {
        let cache = small_cache(8);
        let trx = transaction(&cache);
        let chunk_ids = populate(&cache, 8, 900);
        let baseline = cache.stats().pins_released;

        let mut batch = MultiDocumentResult::new(&trx);
        trx.read_revisions(picks.iter().copied().map(rid), &mut batch).unwrap();

        let expected: HashSet<ChunkId> =
            picks.iter().map(|n| chunk_ids[(*n - 1) as usize]).collect();
        prop_assert_eq!(batch.len(), picks.len());
        prop_assert_eq!(batch.pinned_chunks(), expected.len());
        prop_assert_eq!(cache.stats().pins_released, baseline);
        for (i, n) in picks.iter().enumerate() {
            prop_assert_eq!(batch[i][0], *n as u8);
        }

        drop(batch);
        prop_assert_eq!(cache.stats().pins_released, baseline + expected.len() as u64);
    }
}
