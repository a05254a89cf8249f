//! Readers holding results while writers churn the pool and the
//! background reclaimer recycles chunks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use revcache::ChunkReclaimer;

use crate::common::*;

fn fill_byte(n: u64) -> u8 {
    (n % 251) as u8
}

#[test]
fn pinned_payloads_survive_eviction_and_reclaim() {
    let cache = small_cache(6);
    let reclaimer = ChunkReclaimer::new(Arc::clone(&cache), Duration::from_millis(1));
    let reclaim_handle = reclaimer.start();

    let stop = Arc::new(AtomicBool::new(false));
    let latest = Arc::new(AtomicU64::new(0));

    let writer = {
        let cache = Arc::clone(&cache);
        let stop = Arc::clone(&stop);
        let latest = Arc::clone(&latest);
        thread::spawn(move || {
            let mut n = 0u64;
            while !stop.load(Ordering::Relaxed) {
                n += 1;
                match cache.store(rid(n), &[fill_byte(n); 400]) {
                    Ok(guard) => drop(guard),
                    Err(Error::CacheExhausted) => thread::yield_now(),
                    Err(e) => panic!("unexpected store error: {e}"),
                }
                latest.store(n, Ordering::Release);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let latest = Arc::clone(&latest);
            thread::spawn(move || {
                let trx = TransactionContext::new(TxnId::new(t), cache);
                let mut rng = rand::thread_rng();
                let mut hits = 0usize;
                for _ in 0..200 {
                    let mut batch = MultiDocumentResult::new(&trx);
                    let mut expected = Vec::new();
                    let top = latest.load(Ordering::Acquire).max(1);
                    for _ in 0..8 {
                        let n = rng.gen_range(top.saturating_sub(20).max(1)..=top);
                        match trx.read_revision(rid(n), &mut batch) {
                            Ok(()) => expected.push(n),
                            Err(Error::RevisionNotFound(_)) => {}
                            Err(e) => panic!("unexpected read error: {e}"),
                        }
                    }
                    // give the writer and reclaimer time to churn
                    thread::sleep(Duration::from_micros(200));
                    for (i, n) in expected.iter().enumerate() {
                        assert!(
                            batch[i].iter().all(|b| *b == fill_byte(*n)),
                            "payload of rev {n} changed while pinned"
                        );
                    }
                    hits += expected.len();
                }
                hits
            })
        })
        .collect();

    let hits: usize = readers.into_iter().map(|h| h.join().unwrap()).sum();
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    reclaimer.shutdown();
    reclaim_handle.join().unwrap();

    assert!(hits > 0, "readers never found a revision");
    cache.reclaim();
    assert_eq!(cache.stats().pinned_chunks, 0);
}

#[test]
fn document_results_on_many_threads_share_chunk_pins() {
    let cache = small_cache(4);
    populate(&cache, 3, 100);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let trx = TransactionContext::new(TxnId::new(t), cache);
                for _ in 0..500 {
                    let mut doc = DocumentResult::new(&trx);
                    for n in 1..=3 {
                        trx.read_revision(rid(n), &mut doc).unwrap();
                        assert_eq!(doc.vpack(), &vec![n as u8; 100][..]);
                    }
                    assert_eq!(doc.pinned_chunks(), 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.pinned_chunks, 0);
    // 3 from populate, then one pin per document result
    assert_eq!(stats.pins_released, 3 + 8 * 500);
}
