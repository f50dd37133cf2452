pub mod attribute;
pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod payload;
pub mod query;
pub mod render;
pub mod time;

pub use error::{Result, SignozError};
