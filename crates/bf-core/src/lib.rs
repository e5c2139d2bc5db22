pub mod error;
pub mod record;

pub use error::BenchError;
pub use record::*;
