// Adapters layer: concrete implementations of the domain ports.

pub mod csv_source;
pub mod memory;

pub use memory::InMemoryStore;
