//! Core types for faas-http.
//!
//! This crate provides the transport-agnostic pieces shared by the adapter
//! (`faas-http`) and by anything that wants to build requests or render
//! errors without pulling in the gateway code.
//!
//! ## Modules
//!
//! - [`values`]: Typed accessors over single- and multi-valued string maps
//! - [`cookie`]: `Cookie` header parsing and `Set-Cookie` rendering
//! - [`error`]: The error chain and the HTTP rendering capability

mod cookie;
mod error;
mod values;

pub use cookie::*;
pub use error::*;
pub use values::*;
