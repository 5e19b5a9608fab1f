pub mod ledger_store;
pub mod wallet_provider;
