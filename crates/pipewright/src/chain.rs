//! Chain assembly.
//!
//! A [`Chain`] starts from a terminal [`Handler`] and accumulates layers.
//! Each combinator consumes the chain and returns a new value with one more
//! layer; nothing is shared mutably, so a partially built chain can be
//! cloned and extended in different directions.
//!
//! ## Layer Order
//!
//! Layers nest outward in the order they are applied: the layer applied
//! last is the outermost and runs first.
//!
//! ```text
//! Chain::new(handler)
//!     .pre_with_run_post([a, b])   // layer 1 (innermost)
//!     .post([x, y])                // layer 2
//!     .prepare([p])                // layer 3
//!     .buffered()                  // layer 4 (outermost)
//!
//! buffered → prepare(p) → post { pre(a, b) → handler } → x → y
//! ```
//!
//! Pre- and post-step layers come first; [`Chain::prepare`],
//! [`Chain::buffered`] and [`Chain::cancelable`] turn the chain into a
//! [`PreparedChain`], which only accepts further outer-shell layers. This
//! keeps the substituted writer and the root cancellation context visible
//! to every step inside.
//!
//! ## Cancellation
//!
//! | Combinator | Trigger given to pre-steps | Cancelling skips |
//! |------------|----------------------------|------------------|
//! | [`pre_with_run_post`](Chain::pre_with_run_post) | fresh local trigger | the handler |
//! | [`pre_with_cancel_post`](Chain::pre_with_cancel_post) | root trigger | the handler and every post-step |

use crate::config::ChainConfig;
use crate::pipeline::{fail, link, Link, Pipeline};
use crate::step::{BoxWriter, BufferedPostStep, Handler, PostStep, PreStep, PrepStep};
use pipewright_core::{
    expect_buffered_writer, BufferingWriter, ChainError, RequestContextExt, ResponseWriter,
};
use std::fmt;
use std::sync::Arc;

/// One combinator application.
#[derive(Clone)]
enum Layer {
    PreWithRunPost(Arc<[PreStep]>),
    PreWithCancelPost(Arc<[PreStep]>),
    Post(Arc<[PostStep]>),
    PostBuffered(Arc<[BufferedPostStep]>),
    Prepare(Arc<[PrepStep]>),
    Buffered,
    Cancelable,
}

impl Layer {
    const fn name(&self) -> &'static str {
        match self {
            Self::PreWithRunPost(_) => "pre_with_run_post",
            Self::PreWithCancelPost(_) => "pre_with_cancel_post",
            Self::Post(_) => "post",
            Self::PostBuffered(_) => "post_buffered",
            Self::Prepare(_) => "prepare",
            Self::Buffered => "buffered",
            Self::Cancelable => "cancelable",
        }
    }

    /// Wraps `base` in this layer.
    fn wrap(&self, base: Link, expose_errors: bool) -> Link {
        let layer = self.name();
        match self {
            Self::PreWithRunPost(steps) => {
                let steps = Arc::clone(steps);
                link(move |writer, request| {
                    let (ctx, cancel) = request.context().with_cancel();
                    let request = request.clone().with_context(ctx.clone());
                    for (step, pre) in steps.iter().enumerate() {
                        pre.call(writer, &request, &cancel);
                        if ctx.is_cancelled() {
                            tracing::debug!(layer, step, "pre-step cancelled the handler");
                            return Ok(());
                        }
                    }
                    base(&mut *writer, &request)
                })
            }
            Self::PreWithCancelPost(steps) => {
                let steps = Arc::clone(steps);
                link(move |writer, request| {
                    let ctx = request.context();
                    let root = match ctx.root_trigger() {
                        Ok(root) => root,
                        Err(err) => return Err(fail(writer, err, layer, expose_errors)),
                    };
                    for (step, pre) in steps.iter().enumerate() {
                        pre.call(writer, request, &root);
                        if ctx.is_cancelled() {
                            tracing::debug!(layer, step, "pre-step cancelled the chain");
                            return Ok(());
                        }
                    }
                    base(&mut *writer, request)
                })
            }
            Self::Post(steps) => {
                let steps = Arc::clone(steps);
                link(move |writer, request| {
                    base(&mut *writer, request)?;
                    if request.context().is_cancelled() {
                        tracing::debug!(layer, "request cancelled, skipping post-steps");
                        return Ok(());
                    }
                    for post in steps.iter() {
                        post.call(writer, request);
                    }
                    Ok(())
                })
            }
            Self::PostBuffered(steps) => {
                let steps = Arc::clone(steps);
                link(move |writer, request| {
                    if writer.as_buffered().is_none() {
                        return Err(fail(writer, ChainError::Unbuffered, layer, expose_errors));
                    }
                    base(&mut *writer, request)?;
                    if request.context().is_cancelled() {
                        tracing::debug!(layer, "request cancelled, skipping post-steps");
                        return Ok(());
                    }
                    match expect_buffered_writer(&mut *writer) {
                        Ok(buffered) => {
                            for post in steps.iter() {
                                post.call(&mut *buffered, request);
                            }
                            Ok(())
                        }
                        Err(err) => Err(fail(writer, err, layer, expose_errors)),
                    }
                })
            }
            Self::Prepare(steps) => {
                let steps = Arc::clone(steps);
                link(move |writer, request| {
                    let mut writer: BoxWriter<'_> = Box::new(writer);
                    let mut request = request.clone();
                    for prep in steps.iter() {
                        (writer, request) = prep.call(writer, request);
                    }
                    base(&mut writer, &request)
                })
            }
            Self::Buffered => link(move |writer, request| {
                let mut buffering = BufferingWriter::new(writer);
                base(&mut buffering, request)
            }),
            Self::Cancelable => link(move |writer, request| {
                let (ctx, _root) = request.context().with_root_cancel();
                let request = request.clone().with_context(ctx);
                base(writer, &request)
            }),
        }
    }
}

/// A chain under construction that still accepts pre- and post-step layers.
///
/// # Example
///
/// ```
/// use pipewright::{CancelTrigger, Chain, Request, ResponseWriter};
/// use bytes::Bytes;
/// use http_body_util::Full;
///
/// fn handler(w: &mut dyn ResponseWriter, _r: &Request) {
///     w.write(b"Handler").unwrap();
/// }
///
/// fn require_get(w: &mut dyn ResponseWriter, r: &Request, cancel: &CancelTrigger) {
///     if r.method() != http::Method::GET {
///         w.write_status(http::StatusCode::METHOD_NOT_ALLOWED);
///         cancel.cancel();
///     }
/// }
///
/// fn audit(w: &mut dyn ResponseWriter, _r: &Request) {
///     w.write(b"-audited").unwrap();
/// }
///
/// let pipeline = Chain::new(handler)
///     .pre_with_run_post([require_get])
///     .post([audit])
///     .build();
///
/// let request = http::Request::builder()
///     .method(http::Method::POST)
///     .body(Full::new(Bytes::new()))
///     .unwrap();
///
/// let response = pipeline.respond(request);
/// assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
/// ```
#[derive(Clone)]
pub struct Chain {
    handler: Arc<dyn Handler>,

    /// Layers in application order, innermost first.
    layers: Vec<Layer>,
}

impl Chain {
    /// Starts a chain around a terminal handler.
    ///
    /// Any [`Pipeline`] is itself a handler, so finished pipelines can be
    /// wrapped again. A configuration error inside the wrapped pipeline
    /// stops the outer layers too.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            layers: Vec::new(),
        }
    }

    fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Adds pre-steps whose cancellation skips only the handler.
    ///
    /// Each request gets a fresh local scope derived from its context. The
    /// steps run in order with the scope's trigger; once the scope is
    /// cancelled, remaining steps and the inner chain are skipped. Post-steps
    /// added by outer layers still run because they observe the parent scope.
    pub fn pre_with_run_post<I>(self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PreStep>,
    {
        let steps = steps.into_iter().map(Into::<PreStep>::into).collect();
        self.with_layer(Layer::PreWithRunPost(steps))
    }

    /// Adds pre-steps whose cancellation skips the handler and all post-steps.
    ///
    /// The steps receive the root trigger, so [`cancelable`](Self::cancelable)
    /// must be applied as an outer layer. Without it every request fails
    /// with [`ChainError::NotCancelable`].
    pub fn pre_with_cancel_post<I>(self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PreStep>,
    {
        let steps = steps.into_iter().map(Into::<PreStep>::into).collect();
        self.with_layer(Layer::PreWithCancelPost(steps))
    }

    /// Adds post-steps that run after the inner chain unless the request was cancelled.
    pub fn post<I>(self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PostStep>,
    {
        let steps = steps.into_iter().map(Into::<PostStep>::into).collect();
        self.with_layer(Layer::Post(steps))
    }

    /// Adds post-steps that read the written response body.
    ///
    /// [`buffered`](Self::buffered) must be applied as an outer layer.
    /// Without it every request fails with [`ChainError::Unbuffered`]
    /// before the inner chain runs.
    pub fn post_buffered<I>(self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<BufferedPostStep>,
    {
        let steps = steps.into_iter().map(Into::<BufferedPostStep>::into).collect();
        self.with_layer(Layer::PostBuffered(steps))
    }

    /// Adds preparation steps; see [`PreparedChain::prepare`].
    pub fn prepare<I>(self, steps: I) -> PreparedChain
    where
        I: IntoIterator,
        I::Item: Into<PrepStep>,
    {
        PreparedChain { chain: self }.prepare(steps)
    }

    /// Buffers the response body; see [`PreparedChain::buffered`].
    pub fn buffered(self) -> PreparedChain {
        PreparedChain { chain: self }.buffered()
    }

    /// Enables root cancellation; see [`PreparedChain::cancelable`].
    pub fn cancelable(self) -> PreparedChain {
        PreparedChain { chain: self }.cancelable()
    }

    /// Returns the layer names, outermost first.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().rev().map(Layer::name).collect()
    }

    /// Finalizes the chain with default settings.
    pub fn build(&self) -> Pipeline {
        self.build_with(&ChainConfig::default())
    }

    /// Finalizes the chain.
    pub fn build_with(&self, config: &ChainConfig) -> Pipeline {
        let handler = Arc::clone(&self.handler);
        let mut current = link(move |writer: &mut dyn ResponseWriter, request| {
            handler.try_handle(writer, request)
        });
        for layer in &self.layers {
            current = layer.wrap(current, config.expose_errors);
        }
        Pipeline::new(current, self.layer_names(), config.expose_errors)
    }
}

/// A chain whose outer shell is being assembled.
///
/// Only layers that must surround all pre- and post-steps can be added.
#[derive(Clone)]
pub struct PreparedChain {
    chain: Chain,
}

impl PreparedChain {
    /// Adds preparation steps that run before every inner layer.
    ///
    /// The writer and request are threaded through the steps in order, each
    /// step receiving the previous step's output; the inner chain runs with
    /// the final pair. Preparation cannot be cancelled.
    pub fn prepare<I>(self, steps: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PrepStep>,
    {
        let steps = steps.into_iter().map(Into::<PrepStep>::into).collect();
        Self {
            chain: self.chain.with_layer(Layer::Prepare(steps)),
        }
    }

    /// Wraps the writer in a [`BufferingWriter`] before the inner chain runs.
    pub fn buffered(self) -> Self {
        Self {
            chain: self.chain.with_layer(Layer::Buffered),
        }
    }

    /// Attaches a fresh root cancellation trigger to every request before
    /// the inner chain runs.
    pub fn cancelable(self) -> Self {
        Self {
            chain: self.chain.with_layer(Layer::Cancelable),
        }
    }

    /// Returns the layer names, outermost first.
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.chain.layer_names()
    }

    /// Finalizes the chain with default settings.
    pub fn build(&self) -> Pipeline {
        self.chain.build()
    }

    /// Finalizes the chain.
    pub fn build_with(&self, config: &ChainConfig) -> Pipeline {
        self.chain.build_with(config)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("layers", &self.layer_names())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PreparedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedChain")
            .field("layers", &self.layer_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use pipewright_core::{CancelTrigger, Request, ResponseRecorder};
    use std::sync::{Arc, Mutex};

    fn create_test_request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn run(pipeline: &Pipeline) -> (ResponseRecorder, Result<(), ChainError>) {
        let mut recorder = ResponseRecorder::new();
        let result = pipeline.serve(&mut recorder, &create_test_request());
        (recorder, result)
    }

    fn body(recorder: &ResponseRecorder) -> &str {
        std::str::from_utf8(recorder.body()).unwrap()
    }

    fn handler(w: &mut dyn ResponseWriter, _r: &Request) {
        w.write(b"H").unwrap();
    }

    fn cancel(_w: &mut dyn ResponseWriter, _r: &Request, cancel: &CancelTrigger) {
        cancel.cancel();
    }

    fn writes_pre(tag: &'static str) -> PreStep {
        PreStep::new(move |w, _r, _c| {
            w.write(tag.as_bytes()).unwrap();
        })
    }

    fn writes_post(tag: &'static str) -> PostStep {
        PostStep::new(move |w, _r| {
            w.write(tag.as_bytes()).unwrap();
        })
    }

    #[test]
    fn test_bare_handler() {
        let (recorder, result) = run(&Chain::new(handler).build());
        assert!(result.is_ok());
        assert_eq!(body(&recorder), "H");
    }

    #[test]
    fn test_pre_steps_run_in_order() {
        let pipeline = Chain::new(handler)
            .pre_with_run_post([writes_pre("a"), writes_pre("b")])
            .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "abH");
    }

    #[test]
    fn test_local_cancel_stops_remaining_pre_steps() {
        let pipeline = Chain::new(handler)
            .pre_with_run_post([writes_pre("a"), PreStep::from(cancel), writes_pre("b")])
            .build();
        let (recorder, result) = run(&pipeline);
        assert!(result.is_ok());
        assert_eq!(body(&recorder), "a");
    }

    #[test]
    fn test_later_layers_are_outermost() {
        let pipeline = Chain::new(handler)
            .pre_with_run_post([writes_pre("inner-")])
            .pre_with_run_post([writes_pre("outer-")])
            .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "outer-inner-H");
    }

    #[test]
    fn test_post_layers_nest_outward() {
        let pipeline = Chain::new(handler)
            .post([writes_post("1")])
            .post([writes_post("2")])
            .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "H12");
    }

    #[test]
    fn test_local_cancel_skips_post_steps_inside_its_group() {
        // post attached inside the cancelling group is skipped with the handler
        let pipeline = Chain::new(handler)
            .post([writes_post("-inner")])
            .pre_with_run_post([cancel])
            .post([writes_post("-outer")])
            .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "-outer");
    }

    #[test]
    fn test_root_cancel_skips_every_post_layer() {
        let pipeline = Chain::new(handler)
            .post([writes_post("-inner")])
            .pre_with_cancel_post([writes_pre("A"), PreStep::from(cancel)])
            .post([writes_post("-outer")])
            .cancelable()
            .build();
        let (recorder, result) = run(&pipeline);
        assert!(result.is_ok());
        assert_eq!(body(&recorder), "A");
    }

    #[test]
    fn test_root_cancel_reaches_through_local_scope() {
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([cancel])
            .pre_with_run_post([writes_pre("local-")])
            .post([writes_post("-post")])
            .cancelable()
            .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "local-");
    }

    #[test]
    fn test_cancel_post_without_cancelable_fails() {
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([writes_pre("A")])
            .post([writes_post("-post")])
            .build();
        let (recorder, result) = run(&pipeline);
        assert_eq!(result, Err(ChainError::NotCancelable));
        assert_eq!(recorder.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_post_buffered_without_buffering_fails_before_handler() {
        let pipeline = Chain::new(handler)
            .post_buffered([|w: &mut dyn pipewright_core::BufferedWriter, _r: &Request| {
                w.write(b"never").unwrap();
            }])
            .build();
        let (recorder, result) = run(&pipeline);
        assert_eq!(result, Err(ChainError::Unbuffered));
        assert_eq!(recorder.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_expose_errors_writes_message() {
        let config = ChainConfig {
            expose_errors: true,
            ..ChainConfig::default()
        };
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([writes_pre("A")])
            .build_with(&config);
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "root request has to be cancelable");
    }

    #[test]
    fn test_error_stops_outer_post_steps() {
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([writes_pre("A")])
            .post([writes_post("-post")])
            .prepare([PrepStep::new(|w, r| (w, r))])
            .build();
        let (recorder, result) = run(&pipeline);
        assert!(result.is_err());
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_prepare_threads_request_in_order() {
        fn tag(w: BoxWriter<'_>, mut r: Request) -> (BoxWriter<'_>, Request) {
            let seen = r
                .headers()
                .get("x-order")
                .map(|v| v.to_str().unwrap().to_string())
                .unwrap_or_default();
            let next = format!("{seen}{}", r.headers().len());
            r.headers_mut()
                .insert("x-order", http::HeaderValue::from_str(&next).unwrap());
            (w, r)
        }

        let seen = Arc::new(Mutex::new(String::new()));
        let recorded = Arc::clone(&seen);
        let pipeline = Chain::new(move |_w: &mut dyn ResponseWriter, r: &Request| {
            let value = r.headers().get("x-order").unwrap().to_str().unwrap();
            *recorded.lock().unwrap() = value.to_string();
        })
        .prepare([tag, tag])
        .build();

        let _ = run(&pipeline);
        // first step sees no header (len 0), second sees one (len 1)
        assert_eq!(*seen.lock().unwrap(), "01");
    }

    #[test]
    fn test_prepare_substitutes_writer() {
        fn wrap(w: BoxWriter<'_>, r: Request) -> (BoxWriter<'_>, Request) {
            (Box::new(BufferingWriter::new(w)), r)
        }

        let pipeline = Chain::new(handler)
            .post_buffered([|w: &mut dyn pipewright_core::BufferedWriter, _r: &Request| {
                let len = w.buffer().len();
                w.write(format!("={len}").as_bytes()).unwrap();
            }])
            .prepare([wrap])
            .build();
        let (recorder, result) = run(&pipeline);
        assert!(result.is_ok());
        assert_eq!(body(&recorder), "H=1");
    }

    #[test]
    fn test_cancelable_attaches_root_trigger() {
        let pipeline = Chain::new(|w: &mut dyn ResponseWriter, r: &Request| {
            let attached = r.context().is_root_cancelable();
            w.write(if attached { b"root" } else { b"none" }).unwrap();
        })
        .cancelable()
        .build();
        let (recorder, _) = run(&pipeline);
        assert_eq!(body(&recorder), "root");
    }

    #[test]
    fn test_each_invocation_gets_fresh_root() {
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([PreStep::new(|_w, r, c| {
                if r.uri().path() == "/cancel" {
                    c.cancel();
                }
            })])
            .cancelable()
            .build();

        let mut first = ResponseRecorder::new();
        let cancelled = http::Request::builder()
            .uri("/cancel")
            .body(Full::new(Bytes::new()))
            .unwrap();
        pipeline.serve(&mut first, &cancelled).unwrap();
        assert!(first.body().is_empty());

        let (second, _) = run(&pipeline);
        assert_eq!(body(&second), "H");
    }

    #[test]
    fn test_branching_a_chain_leaves_base_untouched() {
        let base = Chain::new(handler).post([writes_post("-a")]);
        let branch = base.clone().post([writes_post("-b")]);

        let (base_out, _) = run(&base.build());
        let (branch_out, _) = run(&branch.build());

        assert_eq!(body(&base_out), "H-a");
        assert_eq!(body(&branch_out), "H-a-b");
    }

    #[test]
    fn test_pipeline_wraps_again() {
        let inner = Chain::new(handler).post([writes_post("-inner")]).build();
        let outer = Chain::new(inner)
            .pre_with_run_post([writes_pre("outer-")])
            .build();
        let (recorder, _) = run(&outer);
        assert_eq!(body(&recorder), "outer-H-inner");
    }

    #[test]
    fn test_wrapped_pipeline_error_stops_outer_post_steps() {
        let inner = Chain::new(handler)
            .pre_with_cancel_post([writes_pre("A")])
            .build();
        let outer = Chain::new(inner).post([writes_post("-X")]).build();

        let (recorder, result) = run(&outer);

        assert_eq!(result, Err(ChainError::NotCancelable));
        assert_eq!(recorder.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_error_after_prepare_wrote_is_still_500() {
        let pipeline = Chain::new(handler)
            .pre_with_cancel_post([writes_pre("A")])
            .prepare([PrepStep::new(|mut w, r| {
                w.write(b"PrepA-").unwrap();
                (w, r)
            })])
            .build();

        let (recorder, result) = run(&pipeline);

        assert_eq!(result, Err(ChainError::NotCancelable));
        assert_eq!(recorder.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&recorder), "PrepA-");
    }

    #[test]
    fn test_buffering_lost_during_inner_chain_fails() {
        /// Reports read-back support only on the first query.
        struct FlakyWriter {
            inner: BufferingWriter<ResponseRecorder>,
            queried: bool,
        }

        impl ResponseWriter for FlakyWriter {
            fn headers_mut(&mut self) -> &mut http::HeaderMap {
                self.inner.headers_mut()
            }

            fn write_status(&mut self, status: StatusCode) {
                self.inner.write_status(status);
            }

            fn override_status(&mut self, status: StatusCode) {
                self.inner.override_status(status);
            }

            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.inner.write(buf)
            }

            fn as_buffered(&mut self) -> Option<&mut dyn pipewright_core::BufferedWriter> {
                if self.queried {
                    return None;
                }
                self.queried = true;
                self.inner.as_buffered()
            }
        }

        let pipeline = Chain::new(handler)
            .post_buffered([|w: &mut dyn pipewright_core::BufferedWriter, _r: &Request| {
                w.write(b"never").unwrap();
            }])
            .build();
        let mut writer = FlakyWriter {
            inner: BufferingWriter::new(ResponseRecorder::new()),
            queried: false,
        };

        let result = pipeline.serve(&mut writer, &create_test_request());

        assert_eq!(result, Err(ChainError::Unbuffered));
        assert_eq!(writer.inner.get_ref().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(writer.inner.get_ref().body(), b"H");
    }

    #[test]
    fn test_layer_names_outermost_first() {
        let chain = Chain::new(handler)
            .pre_with_run_post([writes_pre("a")])
            .post([writes_post("b")])
            .prepare([PrepStep::new(|w, r| (w, r))])
            .buffered();

        assert_eq!(
            chain.layer_names(),
            vec!["buffered", "prepare", "post", "pre_with_run_post"]
        );
        assert_eq!(chain.build().layer_count(), 4);
    }

    #[test]
    fn test_debug_lists_layers() {
        let chain = Chain::new(handler).post([writes_post("b")]);
        assert_eq!(format!("{chain:?}"), r#"Chain { layers: ["post"], .. }"#);
    }
}
