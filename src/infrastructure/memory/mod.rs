pub mod store;

pub use store::MemoryLedgerStore;
