//! Handler and step contracts.
//!
//! A chain is assembled from one terminal [`Handler`] and any number of
//! steps. Each step kind is a cheaply cloneable wrapper over a function with
//! a fixed signature:
//!
//! | Step | Signature | Runs |
//! |------|-----------|------|
//! | [`PreStep`] | `(writer, request, trigger)` | before the handler |
//! | [`PostStep`] | `(writer, request)` | after the handler |
//! | [`BufferedPostStep`] | `(buffered writer, request)` | after the handler, with body read-back |
//! | [`PrepStep`] | `(writer, request) -> (writer, request)` | before everything, may substitute both |
//!
//! Steps convert from plain functions and closures, so arrays of fn items
//! can be handed straight to the chain combinators:
//!
//! ```
//! use pipewright::{CancelTrigger, PreStep, Request, ResponseWriter};
//!
//! fn deny_writes(w: &mut dyn ResponseWriter, r: &Request, cancel: &CancelTrigger) {
//!     if r.method() != http::Method::GET {
//!         w.write_status(http::StatusCode::METHOD_NOT_ALLOWED);
//!         cancel.cancel();
//!     }
//! }
//!
//! let step: PreStep = deny_writes.into();
//! ```

use pipewright_core::{BufferedWriter, CancelTrigger, ChainResult, Request, ResponseWriter};
use std::fmt;
use std::sync::Arc;

/// A response sink that may replace the one a chain was invoked with.
pub type BoxWriter<'w> = Box<dyn ResponseWriter + 'w>;

/// The terminal unit of work at the center of a chain.
///
/// Implemented for every `Fn(&mut dyn ResponseWriter, &Request)`.
pub trait Handler: Send + Sync + 'static {
    /// Handles `request`, writing the response to `writer`.
    fn handle(&self, writer: &mut dyn ResponseWriter, request: &Request);

    /// Handles `request` as the center of a chain.
    ///
    /// Plain handlers never fail. Handlers that are themselves chains report
    /// their configuration error so the surrounding layers stop as well.
    fn try_handle(&self, writer: &mut dyn ResponseWriter, request: &Request) -> ChainResult<()> {
        self.handle(writer, request);
        Ok(())
    }
}

impl<F> Handler for F
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
{
    fn handle(&self, writer: &mut dyn ResponseWriter, request: &Request) {
        self(writer, request);
    }
}

type PreFn = dyn Fn(&mut dyn ResponseWriter, &Request, &CancelTrigger) + Send + Sync;
type PostFn = dyn Fn(&mut dyn ResponseWriter, &Request) + Send + Sync;
type BufferedPostFn = dyn Fn(&mut dyn BufferedWriter, &Request) + Send + Sync;
type PrepFn = dyn for<'w> Fn(BoxWriter<'w>, Request) -> (BoxWriter<'w>, Request) + Send + Sync;

/// A step that runs before the terminal handler and may cancel it.
///
/// The trigger handed to the step decides how far a cancellation reaches;
/// see [`Chain::pre_with_run_post`](crate::Chain::pre_with_run_post) and
/// [`Chain::pre_with_cancel_post`](crate::Chain::pre_with_cancel_post).
#[derive(Clone)]
pub struct PreStep(Arc<PreFn>);

impl PreStep {
    /// Wraps a pre-step function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request, &CancelTrigger) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, writer: &mut dyn ResponseWriter, request: &Request, cancel: &CancelTrigger) {
        (self.0)(writer, request, cancel);
    }
}

impl<F> From<F> for PreStep
where
    F: Fn(&mut dyn ResponseWriter, &Request, &CancelTrigger) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// A step that runs after the terminal handler.
#[derive(Clone)]
pub struct PostStep(Arc<PostFn>);

impl PostStep {
    /// Wraps a post-step function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, writer: &mut dyn ResponseWriter, request: &Request) {
        (self.0)(writer, request);
    }
}

impl<F> From<F> for PostStep
where
    F: Fn(&mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// A step that runs after the terminal handler and reads the written body.
///
/// Requires buffering to be enabled on an outer layer.
#[derive(Clone)]
pub struct BufferedPostStep(Arc<BufferedPostFn>);

impl BufferedPostStep {
    /// Wraps a buffered post-step function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn BufferedWriter, &Request) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, writer: &mut dyn BufferedWriter, request: &Request) {
        (self.0)(writer, request);
    }
}

impl<F> From<F> for BufferedPostStep
where
    F: Fn(&mut dyn BufferedWriter, &Request) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// A step that prepares the writer and request before anything else runs.
///
/// Preparation is the only place a chain may substitute the sink or the
/// request; each step sees the previous step's output.
#[derive(Clone)]
pub struct PrepStep(Arc<PrepFn>);

impl PrepStep {
    /// Wraps a preparation function.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'w> Fn(BoxWriter<'w>, Request) -> (BoxWriter<'w>, Request) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call<'w>(&self, writer: BoxWriter<'w>, request: Request) -> (BoxWriter<'w>, Request) {
        (self.0)(writer, request)
    }
}

impl<F> From<F> for PrepStep
where
    F: for<'w> Fn(BoxWriter<'w>, Request) -> (BoxWriter<'w>, Request) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

macro_rules! opaque_debug {
    ($($ty:ident),*) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($ty)).finish_non_exhaustive()
                }
            }
        )*
    };
}

opaque_debug!(PreStep, PostStep, BufferedPostStep, PrepStep);

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use pipewright_core::{BufferingWriter, RequestContext, ResponseRecorder};

    fn create_test_request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn hello(w: &mut dyn ResponseWriter, _r: &Request) {
        w.write(b"hello").unwrap();
    }

    #[test]
    fn test_fn_is_handler() {
        let mut recorder = ResponseRecorder::new();
        hello.handle(&mut recorder, &create_test_request());
        assert_eq!(recorder.body(), b"hello");
    }

    #[test]
    fn test_plain_handler_never_fails() {
        let mut recorder = ResponseRecorder::new();
        assert!(hello.try_handle(&mut recorder, &create_test_request()).is_ok());
        assert_eq!(recorder.body(), b"hello");
    }

    #[test]
    fn test_pre_step_receives_trigger() {
        let step = PreStep::new(|w, _r, cancel| {
            w.write_status(StatusCode::FORBIDDEN);
            cancel.cancel();
        });

        let (_, trigger) = RequestContext::background().with_cancel();
        let mut recorder = ResponseRecorder::new();
        step.call(&mut recorder, &create_test_request(), &trigger);

        assert!(trigger.is_cancelled());
        assert_eq!(recorder.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_post_step_from_fn() {
        let step: PostStep = hello.into();
        let mut recorder = ResponseRecorder::new();
        step.call(&mut recorder, &create_test_request());
        assert_eq!(recorder.body(), b"hello");
    }

    #[test]
    fn test_buffered_post_step_reads_buffer() {
        let step = BufferedPostStep::new(|w, _r| {
            let len = w.buffer().len();
            w.write(format!("={len}").as_bytes()).unwrap();
        });

        let mut recorder = ResponseRecorder::new();
        let mut buffering = BufferingWriter::new(&mut recorder);
        buffering.write(b"abcd").unwrap();
        step.call(&mut buffering, &create_test_request());
        drop(buffering);

        assert_eq!(recorder.body(), b"abcd=4");
    }

    #[test]
    fn test_prep_step_substitutes_request() {
        let step = PrepStep::new(|w, mut r| {
            r.headers_mut()
                .insert("x-prepared", http::HeaderValue::from_static("1"));
            (w, r)
        });

        let mut recorder = ResponseRecorder::new();
        let writer: BoxWriter<'_> = Box::new(&mut recorder);
        let (_, request) = step.call(writer, create_test_request());

        assert_eq!(request.headers().get("x-prepared").unwrap(), "1");
    }

    #[test]
    fn test_steps_are_debug() {
        let step: PostStep = hello.into();
        assert_eq!(format!("{step:?}"), "PostStep { .. }");
    }
}
