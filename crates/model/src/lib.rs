//! An abstraction layer for different generative models.
//!
//! This crate establishes an unified protocol for the chat and
//! summarization front ends to talk to various supported models, so that
//! they can switch between providers without touching the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
