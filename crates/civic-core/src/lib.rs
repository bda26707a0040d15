pub mod error;
pub mod io;
pub mod logger;
pub mod paths;
pub mod pipeline;
pub mod schema;
pub mod settings;
pub mod steps;
pub mod subtheme;

pub use error::{CivicError, Result};
