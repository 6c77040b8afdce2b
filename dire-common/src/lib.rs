//! Direct IR Emitter - Common Types and Utilities
//!
//! This crate contains shared identifiers, generators and the error type
//! used across all components of the dire emitter.

pub mod error;
pub mod ids;

pub use error::EmitError;
pub use ids::{BlockGenerator, BlockId, TempGenerator, TempId};
