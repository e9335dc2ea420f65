//! # Pipewright
//!
//! Composable handler chains for HTTP services.
//!
//! A chain wraps one terminal handler in layers of steps that run before or
//! after it. Chains are assembled once with immutable combinators and then
//! finalized into a [`Pipeline`] that serves requests concurrently.
//!
//! ## Combinators
//!
//! | Combinator | Adds |
//! |------------|------|
//! | [`Chain::pre_with_run_post`] | pre-steps whose cancellation skips only the handler |
//! | [`Chain::pre_with_cancel_post`] | pre-steps whose cancellation skips every post-step |
//! | [`Chain::post`] | post-steps |
//! | [`Chain::post_buffered`] | post-steps that read the written body |
//! | [`Chain::prepare`] | steps that may substitute the writer and request |
//! | [`Chain::buffered`] | body capture for buffered post-steps |
//! | [`Chain::cancelable`] | the root cancellation context |
//!
//! ## Example
//!
//! ```
//! use pipewright::{CancelTrigger, Chain, Request, ResponseWriter};
//! use bytes::Bytes;
//! use http_body_util::Full;
//!
//! fn require_get(w: &mut dyn ResponseWriter, r: &Request, cancel: &CancelTrigger) {
//!     if r.method() != http::Method::GET {
//!         w.write_status(http::StatusCode::METHOD_NOT_ALLOWED);
//!         cancel.cancel();
//!     }
//! }
//!
//! fn hello(w: &mut dyn ResponseWriter, _r: &Request) {
//!     w.write(b"hello").unwrap();
//! }
//!
//! let pipeline = Chain::new(hello)
//!     .pre_with_cancel_post([require_get])
//!     .cancelable()
//!     .build();
//!
//! let request = http::Request::post("/").body(Full::new(Bytes::new())).unwrap();
//! let response = pipeline.respond(request);
//! assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
//! ```
//!
//! ## Configuration Errors
//!
//! A chain that asks for something an outer layer does not provide fails at
//! request time with [`ERR_UNBUFFERED`] or [`ERR_NOTCANCELABLE`]. The
//! response is marked with a 500 status and no further steps run.

#![doc(html_root_url = "https://docs.rs/pipewright/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod pipeline;
pub mod step;

// Re-export main types at crate root
pub use chain::{Chain, PreparedChain};
pub use config::{ChainConfig, ConfigError, ConfigLoader};
pub use pipeline::Pipeline;
pub use step::{BoxWriter, BufferedPostStep, Handler, PostStep, PreStep, PrepStep};

pub use pipewright_core::{
    expect_buffered_writer, BufferedWriter, BufferingWriter, CancelTrigger, ChainError,
    ChainResult, Request, RequestContext, RequestContextExt, Response, ResponseExt,
    ResponseRecorder, ResponseWriter, ERR_NOTCANCELABLE, ERR_UNBUFFERED,
};
pub use pipewright_telemetry::{init_logging, LogConfig, LogFormat};
