//! Core error types shared by the model and the reader

pub mod error;
pub mod error_code;

pub use error::*;
pub use error_code::*;
