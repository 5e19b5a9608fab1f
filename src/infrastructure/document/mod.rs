pub mod migrations;
pub mod object_id;
pub mod store;

pub use store::DocumentLedgerStore;
