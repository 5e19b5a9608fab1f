pub mod document;
pub mod memory;
pub mod resolvers;
pub mod wallet;
