//! Document and multi-document result scenarios

use crate::common::*;

#[test]
fn document_result_tracks_last_add_across_chunks() {
    let cache = small_cache(8);
    let trx = transaction(&cache);
    let first = cache.store(rid(5), &[5u8; 900]).unwrap();
    let second = cache.store(rid(7), &[7u8; 900]).unwrap();
    let (c1, c2) = (first.chunk_id(), second.chunk_id());
    let p1 = first.payload_ptr().as_ptr();
    let p2 = second.payload_ptr().as_ptr();

    let mut doc = DocumentResult::new(&trx);
    doc.add(first, rid(5));
    assert_eq!(doc.last_revision_id(), rid(5));
    assert_eq!(doc.vpack().as_ptr(), p1);

    doc.add(second, rid(7));
    assert_eq!(doc.last_revision_id(), rid(7));
    assert_eq!(doc.vpack().as_ptr(), p2);
    assert!(doc.has_seen_chunk(c1));
    assert!(doc.has_seen_chunk(c2));
}

#[test]
fn same_chunk_second_guard_leaves_single_pin() {
    let cache = small_cache(8);
    let trx = transaction(&cache);
    let guard_a = cache.store(rid(5), b"P1").unwrap();
    let guard_b = cache.store(rid(7), b"P2").unwrap();
    let chunk_x = guard_a.chunk_id();
    assert_eq!(guard_b.chunk_id(), chunk_x);

    let mut doc = DocumentResult::new(&trx);
    doc.add(guard_a, rid(5));
    assert_eq!(doc.vpack(), b"P1");
    assert!(doc.has_seen_chunk(chunk_x));

    doc.add(guard_b, rid(7));
    assert_eq!(doc.vpack(), b"P2");
    assert_eq!(doc.last_revision_id(), rid(7));
    assert!(doc.has_seen_chunk(chunk_x));
    assert_eq!(doc.pinned_chunks(), 1);
    assert_eq!(cache.chunk(chunk_x).unwrap().pin_count(), 1);
}

#[test]
fn membership_survives_inline_to_hashed_transition() {
    let cache = small_cache(8);
    let trx = transaction(&cache);
    let chunk_ids = populate(&cache, 5, 900);

    let mut doc = DocumentResult::new(&trx);
    for n in 1..=4 {
        trx.read_revision(rid(n), &mut doc).unwrap();
    }
    for id in &chunk_ids[..4] {
        assert!(doc.has_seen_chunk(*id));
    }
    assert!(!doc.has_seen_chunk(chunk_ids[4]));

    trx.read_revision(rid(5), &mut doc).unwrap();
    for id in &chunk_ids {
        assert!(doc.has_seen_chunk(*id));
    }
    assert!(!doc.has_seen_chunk(ChunkId::new(999)));
}

#[test]
fn multi_result_indexing_and_clear() {
    let cache = small_cache(8);
    let trx = transaction(&cache);
    populate(&cache, 6, 300);

    let mut batch = MultiDocumentResult::new(&trx);
    batch.reserve(6);
    let n = trx.read_revisions((1..=6).map(rid), &mut batch).unwrap();
    assert_eq!(n, 6);
    assert_eq!(batch.len(), 6);
    for i in 0..6 {
        assert_eq!(batch.at(i).unwrap(), &vec![(i + 1) as u8; 300][..]);
    }
    assert_eq!(batch.at(6), Err(Error::OutOfRange { index: 6, len: 6 }));
    assert_eq!(batch.last_revision_id(), rid(6));

    batch.clear();
    assert_eq!(batch.len(), 0);
    assert_eq!(batch.last_revision_id(), RevisionId::ZERO);
    assert_eq!(cache.stats().pinned_chunks, 0);
}

#[test]
fn results_keep_payload_after_index_removal() {
    let cache = small_cache(8);
    let trx = transaction(&cache);
    let mut doc = DocumentResult::new(&trx);
    trx.insert_revision(rid(1), b"kept", &mut doc).unwrap();

    assert!(cache.remove(rid(1)));
    assert_eq!(doc.vpack(), b"kept");
}
