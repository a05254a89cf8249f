//! Pinning protocol integration tests
//!
//! Exercises results, membership and the cache together:
//! - Result scenarios: payload/revision bookkeeping across adds
//! - Pin balance: releases equal distinct chunks retained
//! - Concurrent reclaim: pinned chunks survive a running reclaimer

#[path = "../common/mod.rs"]
mod common;

mod concurrent_reclaim;
mod pin_balance;
mod result_scenarios;
