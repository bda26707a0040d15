pub mod configure;
pub mod migrate;
pub mod show;
