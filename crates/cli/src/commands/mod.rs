pub mod backend;
pub mod migrate;
