//! # Pipewright Core
//!
//! Core contracts shared by every Pipewright handler chain.
//!
//! This crate provides the leaf types the composition layer is built on:
//!
//! - [`Request`] / [`Response`] - The HTTP types flowing through a chain
//! - [`ResponseWriter`] - The response sink handlers and steps write to
//! - [`BufferedWriter`] / [`BufferingWriter`] - Read-back access to written bytes
//! - [`ResponseRecorder`] - An in-memory sink that produces a [`Response`]
//! - [`RequestContext`] / [`CancelTrigger`] - Request-scoped cooperative cancellation
//! - [`ChainError`] - Configuration errors raised by misassembled chains

#![doc(html_root_url = "https://docs.rs/pipewright-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
mod error;
pub mod types;
pub mod writer;

pub use context::{CancelTrigger, RequestContext, RequestContextExt};
pub use error::{ChainError, ChainResult, ERR_NOTCANCELABLE, ERR_UNBUFFERED};
pub use types::{Request, Response, ResponseExt};
pub use writer::{
    expect_buffered_writer, BufferedWriter, BufferingWriter, ResponseRecorder, ResponseWriter,
};
