//! Finalized, immutable pipelines.
//!
//! A [`Pipeline`] is what [`Chain::build`](crate::Chain::build) produces: a
//! single callable that runs every layer of the chain for one request. It
//! holds no per-request state, so one value can serve any number of
//! concurrent requests.

use crate::step::Handler;
use pipewright_core::{
    ChainError, ChainResult, Request, Response, ResponseExt, ResponseRecorder, ResponseWriter,
};
use std::fmt;
use std::sync::Arc;

/// A composed layer: runs its part of the chain and everything inside it.
pub(crate) type Link =
    Arc<dyn Fn(&mut dyn ResponseWriter, &Request) -> ChainResult<()> + Send + Sync>;

/// Builds a [`Link`] from a closure, fixing its higher-ranked signature.
pub(crate) fn link<F>(f: F) -> Link
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> ChainResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Marks the response as failed, logs the error and hands it back for propagation.
pub(crate) fn fail(
    writer: &mut dyn ResponseWriter,
    err: ChainError,
    layer: &'static str,
    expose_errors: bool,
) -> ChainError {
    writer.override_status(err.status_code());
    if expose_errors {
        if let Err(io_err) = writer.write(err.to_string().as_bytes()) {
            tracing::warn!(layer, error = %io_err, "failed to write error body");
        }
    }
    tracing::error!(layer, error = %err, "handler chain misconfigured");
    err
}

/// An assembled handler chain.
///
/// # Example
///
/// ```
/// use pipewright::{Chain, Request, ResponseWriter};
/// use bytes::Bytes;
/// use http_body_util::Full;
///
/// fn hello(w: &mut dyn ResponseWriter, _r: &Request) {
///     w.write(b"hello").unwrap();
/// }
///
/// let pipeline = Chain::new(hello).build();
/// let request = http::Request::new(Full::new(Bytes::new()));
///
/// let response = pipeline.respond(request);
/// assert_eq!(response.status(), http::StatusCode::OK);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    link: Link,

    /// Layer names, outermost first.
    layers: Arc<[&'static str]>,

    expose_errors: bool,
}

impl Pipeline {
    pub(crate) fn new(link: Link, layers: Vec<&'static str>, expose_errors: bool) -> Self {
        Self {
            link,
            layers: layers.into(),
            expose_errors,
        }
    }

    /// Runs the pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`] if the chain was assembled incorrectly. The
    /// response has already been marked with a 500 status through
    /// [`ResponseWriter::override_status`], even if earlier steps wrote to it,
    /// and no further steps ran after the failure.
    pub fn serve(&self, writer: &mut dyn ResponseWriter, request: &Request) -> ChainResult<()> {
        (self.link)(writer, request)
    }

    /// Runs the pipeline against an in-memory recorder and returns the response.
    ///
    /// On a configuration error anything written so far is discarded and an
    /// internal-error response is returned instead.
    pub fn respond(&self, request: Request) -> Response {
        let mut recorder = ResponseRecorder::new();
        match self.serve(&mut recorder, &request) {
            Ok(()) => recorder.into_response(),
            Err(err) if self.expose_errors => {
                Response::json_error(err.status_code(), err.code(), &err.to_string())
            }
            Err(err) => {
                let status = err.status_code();
                Response::error(status, status.canonical_reason().unwrap_or_default())
            }
        }
    }

    /// Returns the layer names, outermost first.
    #[must_use]
    pub fn layer_names(&self) -> &[&'static str] {
        &self.layers
    }

    /// Returns the number of layers around the terminal handler.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// A pipeline can be the terminal handler of another chain.
///
/// Inside a chain its configuration errors propagate to the outer layers.
/// Called directly through [`Handler::handle`] they are logged; the failed
/// response status is already written.
impl Handler for Pipeline {
    fn handle(&self, writer: &mut dyn ResponseWriter, request: &Request) {
        if let Err(err) = self.serve(writer, request) {
            tracing::warn!(error = %err, "nested pipeline failed");
        }
    }

    fn try_handle(&self, writer: &mut dyn ResponseWriter, request: &Request) -> ChainResult<()> {
        self.serve(writer, request)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layers)
            .field("expose_errors", &self.expose_errors)
            .finish_non_exhaustive()
    }
}
