pub mod migrate;
pub mod org;
pub mod token;
