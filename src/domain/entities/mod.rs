pub mod investment;
pub mod milestone;
pub mod startup;
pub mod update;
pub mod user;
