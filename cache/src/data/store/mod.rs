//! Span storage backend
//!
//! The cache stores serialized records in an ordered, prefix-scannable
//! key-value backend. The backend is owned exclusively by one partition
//! actor; no other component reads or writes it directly.

mod backend;
mod memory;

pub use backend::SpanStore;
pub use memory::MemoryStore;
