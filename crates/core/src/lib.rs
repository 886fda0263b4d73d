pub mod config;
pub mod error;
pub mod record;
pub mod schema;
pub mod threshold;

pub use config::Config;
pub use error::*;
pub use record::*;
pub use schema::{ColumnSpec, SourceSchema};
pub use threshold::Threshold;
