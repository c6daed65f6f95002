//! Backend services.
//!
//! # Services
//!
//! - [`upload`] - Image upload to the backend

pub mod upload;

pub use upload::*;
