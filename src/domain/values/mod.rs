pub mod amount;
pub mod entity_id;
pub mod role;
pub mod transfer;
pub mod wallet_address;
