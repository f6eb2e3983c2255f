//! In-process adapters for the domain ports and the bounded work queues.

pub mod in_memory;
pub mod queue;
