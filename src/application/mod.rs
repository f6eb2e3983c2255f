//! Application layer: the ledger service facade, the two queue workers and
//! the tick-driven worker pool that schedules them.

pub mod service;
pub mod transfer;
pub mod verification;
pub mod worker_pool;
