use std::error::Error;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;

use crate::measure::{Clock, MetricDescriptor, MetricOutcome, MetricsContext, SystemClock};
use crate::model::{Failure, OperationContext, OperationResult};
use crate::providers::{
    AnonymousIssuerProvider, CorrelationIdProvider, DefaultInvocationInfoProvider,
    DefaultMetricOutcomeClassifier, DefaultMetricsContextFactory, DefaultMetricsEnricher,
    InvocationInfoProvider, IssuerProvider, MetricOutcomeClassifier, MetricsContextFactory,
    MetricsEnricher, MetricsRecorder, NoopMetricsRecorder, NoopOperationListener,
    NoopTelemetryProvider, OperationListener, TelemetryContextProvider, UuidCorrelationIdProvider,
};

/// Runs units of work and produces their operation and metrics records.
///
/// Cheap to share behind an `Arc`; every invocation builds its own contexts.
#[derive(Clone)]
pub struct OperationExecutor {
    invocation: Arc<dyn InvocationInfoProvider>,
    issuer: Arc<dyn IssuerProvider>,
    correlation: Arc<dyn CorrelationIdProvider>,
    telemetry: Arc<dyn TelemetryContextProvider>,
    listener: Arc<dyn OperationListener>,
    factory: Arc<dyn MetricsContextFactory>,
    classifier: Arc<dyn MetricOutcomeClassifier>,
    enricher: Arc<dyn MetricsEnricher>,
    recorder: Arc<dyn MetricsRecorder>,
    clock: Arc<dyn Clock>,
}

/// State captured before the work runs.
struct Started {
    base: OperationContext,
    metrics: MetricsContext,
    instant: Instant,
}

impl OperationExecutor {
    pub fn builder() -> OperationExecutorBuilder {
        OperationExecutorBuilder::default()
    }

    /// Run fallible work.
    ///
    /// On `Ok` the value is wrapped with the completed contexts. On `Err` the
    /// failure path runs to completion and the very same error is returned.
    /// A panic runs the failure path and is then resumed.
    pub fn run<T, E, F>(&self, work: F) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(&OperationContext) -> Result<T, E>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        let started = self.begin();
        match catch_unwind(AssertUnwindSafe(|| work(&started.base))) {
            Ok(Ok(data)) => Ok(self.succeed(started, data)),
            Ok(Err(error)) => {
                self.fail(started, &Failure::from_error(&error));
                Err(error)
            }
            Err(payload) => {
                self.fail(started, &Failure::from_panic(payload.as_ref()));
                resume_unwind(payload)
            }
        }
    }

    /// Run infallible work.
    pub fn call<T, F>(&self, work: F) -> OperationResult<T>
    where
        F: FnOnce(&OperationContext) -> T,
        T: fmt::Debug,
    {
        match self.run(|ctx| Ok::<T, std::convert::Infallible>(work(ctx))) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Async twin of [`run`](Self::run). The work receives an owned copy of
    /// the base context so it can move it into the future.
    pub async fn run_async<T, E, F, Fut>(&self, work: F) -> Result<OperationResult<T>, E>
    where
        F: FnOnce(OperationContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: fmt::Debug,
        E: Error + 'static,
    {
        let started = self.begin();
        let base = started.base.clone();
        let outcome = AssertUnwindSafe(async move { work(base).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(data)) => Ok(self.succeed(started, data)),
            Ok(Err(error)) => {
                self.fail(started, &Failure::from_error(&error));
                Err(error)
            }
            Err(payload) => {
                self.fail(started, &Failure::from_panic(payload.as_ref()));
                resume_unwind(payload)
            }
        }
    }

    fn begin(&self) -> Started {
        let info = self.invocation.current();
        let telemetry = self.telemetry.current();
        let base = OperationContext::new(
            self.correlation.new_correlation_id(),
            self.issuer.current_issuer(),
            info,
            telemetry,
            self.clock.now_millis(),
        );

        let metrics = self
            .factory
            .create()
            .inject_descriptor(MetricDescriptor {
                operation: base.operation.clone(),
                use_case: base.use_case.clone(),
                event: base.event.clone(),
            })
            .start(self.clock.as_ref());

        Started {
            base,
            metrics,
            instant: Instant::now(),
        }
    }

    fn succeed<T: fmt::Debug>(&self, started: Started, data: T) -> OperationResult<T> {
        let context = started
            .base
            .completed(elapsed_millis(started.instant), format!("{data:?}"));
        let metrics = self.finalize(started.metrics, &context, None);

        self.guard("listener", &context, || self.listener.on_success(&context));
        let recorded = metrics.clone();
        self.guard("recorder", &context, || self.recorder.record(recorded));

        OperationResult {
            context,
            metrics,
            data,
        }
    }

    fn fail(&self, started: Started, failure: &Failure<'_>) {
        let context = started
            .base
            .completed(elapsed_millis(started.instant), failure.type_name());
        let metrics = self.finalize(started.metrics, &context, Some(failure));

        self.guard("listener", &context, || self.listener.on_failure(&context, failure));
        self.guard("recorder", &context, || self.recorder.record(metrics));
    }

    /// Classify, end and enrich. Hook panics fall back to safe values.
    fn finalize(
        &self,
        metrics: MetricsContext,
        context: &OperationContext,
        failure: Option<&Failure<'_>>,
    ) -> MetricsContext {
        let outcome = self
            .guard("classifier", context, || self.classifier.classify(None, failure))
            .unwrap_or_else(|| fallback_outcome(failure));
        let ended = metrics.end(self.clock.as_ref(), outcome);

        let unenriched = ended.clone();
        self.guard("enricher", context, || self.enricher.enrich(ended))
            .unwrap_or(unenriched)
    }

    fn guard<R>(&self, hook: &'static str, context: &OperationContext, f: impl FnOnce() -> R) -> Option<R> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::error!(
                    hook,
                    correlation_id = %context.correlation_id,
                    operation = %context.operation,
                    "Operation hook panicked, outcome preserved"
                );
                None
            }
        }
    }
}

impl Default for OperationExecutor {
    fn default() -> Self {
        OperationExecutorBuilder::default().build()
    }
}

impl fmt::Debug for OperationExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationExecutor").finish_non_exhaustive()
    }
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn fallback_outcome(failure: Option<&Failure<'_>>) -> MetricOutcome {
    DefaultMetricOutcomeClassifier.classify(None, failure)
}

/// Assembles an [`OperationExecutor`]; every omitted collaborator gets its
/// default.
#[derive(Default)]
pub struct OperationExecutorBuilder {
    invocation: Option<Arc<dyn InvocationInfoProvider>>,
    issuer: Option<Arc<dyn IssuerProvider>>,
    correlation: Option<Arc<dyn CorrelationIdProvider>>,
    telemetry: Option<Arc<dyn TelemetryContextProvider>>,
    listener: Option<Arc<dyn OperationListener>>,
    factory: Option<Arc<dyn MetricsContextFactory>>,
    classifier: Option<Arc<dyn MetricOutcomeClassifier>>,
    enricher: Option<Arc<dyn MetricsEnricher>>,
    recorder: Option<Arc<dyn MetricsRecorder>>,
    clock: Option<Arc<dyn Clock>>,
}

impl OperationExecutorBuilder {
    pub fn invocation_info_provider(mut self, provider: impl InvocationInfoProvider + 'static) -> Self {
        self.invocation = Some(Arc::new(provider));
        self
    }

    pub fn issuer_provider(mut self, provider: impl IssuerProvider + 'static) -> Self {
        self.issuer = Some(Arc::new(provider));
        self
    }

    pub fn correlation_id_provider(mut self, provider: impl CorrelationIdProvider + 'static) -> Self {
        self.correlation = Some(Arc::new(provider));
        self
    }

    pub fn telemetry_provider(mut self, provider: impl TelemetryContextProvider + 'static) -> Self {
        self.telemetry = Some(Arc::new(provider));
        self
    }

    pub fn listener(mut self, listener: impl OperationListener + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn metrics_context_factory(mut self, factory: impl MetricsContextFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn outcome_classifier(mut self, classifier: impl MetricOutcomeClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn metrics_enricher(mut self, enricher: impl MetricsEnricher + 'static) -> Self {
        self.enricher = Some(Arc::new(enricher));
        self
    }

    pub fn metrics_recorder(mut self, recorder: impl MetricsRecorder + 'static) -> Self {
        self.recorder = Some(Arc::new(recorder));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> OperationExecutor {
        OperationExecutor {
            invocation: self
                .invocation
                .unwrap_or_else(|| Arc::new(DefaultInvocationInfoProvider)),
            issuer: self.issuer.unwrap_or_else(|| Arc::new(AnonymousIssuerProvider)),
            correlation: self
                .correlation
                .unwrap_or_else(|| Arc::new(UuidCorrelationIdProvider)),
            telemetry: self.telemetry.unwrap_or_else(|| Arc::new(NoopTelemetryProvider)),
            listener: self.listener.unwrap_or_else(|| Arc::new(NoopOperationListener)),
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(DefaultMetricsContextFactory::default())),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(DefaultMetricOutcomeClassifier)),
            enricher: self.enricher.unwrap_or_else(|| Arc::new(DefaultMetricsEnricher)),
            recorder: self.recorder.unwrap_or_else(|| Arc::new(NoopMetricsRecorder)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::timing::test_clock::ManualClock;
    use crate::measure::{keys, MeasurementState, MetricResult};
    use crate::model::InvocationInfo;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    struct OutOfStock;

    impl fmt::Display for OutOfStock {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "out of stock")
        }
    }

    impl Error for OutOfStock {}

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<MetricsContext>>>);

    impl MetricsRecorder for Recorded {
        fn record(&self, ctx: MetricsContext) {
            self.0.lock().unwrap().push(ctx);
        }
    }

    fn executor(recorded: &Recorded) -> OperationExecutor {
        OperationExecutor::builder()
            .correlation_id_provider(|| "cid-fixed".to_string())
            .invocation_info_provider(|| InvocationInfo {
                service: "ItemService".into(),
                function: "find".into(),
                operation: "items.find".into(),
                ..InvocationInfo::default()
            })
            .metrics_recorder(recorded.clone())
            .build()
    }

    #[test]
    fn test_success_path() {
        let recorded = Recorded::default();
        let result = executor(&recorded)
            .run(|ctx| {
                assert_eq!(ctx.correlation_id, "cid-fixed");
                assert_eq!(ctx.duration_ms, None);
                Ok::<_, OutOfStock>(7u32)
            })
            .unwrap();

        assert_eq!(result.data, 7);
        assert_eq!(result.context.response.as_deref(), Some("7"));
        assert!(result.context.duration_ms.is_some());
        assert_eq!(result.context.issuer, "anonymous");
        assert_eq!(result.metrics.state(), MeasurementState::Ended);
        assert_eq!(
            result.metrics.outcome().map(|o| o.result),
            Some(MetricResult::Success)
        );
        assert_eq!(result.metrics.tags().get(keys::RESULT), Some("success"));
        assert_eq!(
            result.metrics.descriptor().map(|d| d.operation.as_str()),
            Some("items.find")
        );
        assert_eq!(recorded.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_error_is_returned_unchanged() {
        let recorded = Recorded::default();
        let err = executor(&recorded)
            .run(|_| Err::<u32, _>(OutOfStock))
            .unwrap_err();

        assert_eq!(err, OutOfStock);
        let metrics = recorded.0.lock().unwrap();
        let outcome = metrics[0].outcome().unwrap();
        assert_eq!(outcome.result, MetricResult::Failure);
        assert_eq!(outcome.exception.as_deref(), Some("OutOfStock"));
    }

    #[test]
    fn test_panic_runs_failure_path_then_resumes() {
        let recorded = Recorded::default();
        let exec = executor(&recorded);
        let caught = catch_unwind(AssertUnwindSafe(|| {
            exec.call(|_| -> u32 { panic!("invariant broken") })
        }));

        let payload = caught.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"invariant broken"));
        let metrics = recorded.0.lock().unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].outcome().unwrap().exception.as_deref(), Some("Panic"));
    }

    #[test]
    fn test_hook_panics_do_not_mask_result() {
        let exec = OperationExecutor::builder()
            .metrics_recorder(|_ctx: MetricsContext| panic!("backend down"))
            .metrics_enricher(|_ctx: MetricsContext| -> MetricsContext { panic!("enricher bug") })
            .build();

        let result = exec.call(|_| "ok");
        assert_eq!(result.data, "ok");
        // Enricher fallback keeps the ended, unenriched context.
        assert!(result.metrics.is_ended());
        assert!(result.metrics.tags().get(keys::RESULT).is_none());
    }

    #[test]
    fn test_duration_uses_injected_clock_for_timing() {
        let clock = Arc::new(ManualClock::at(1_000));
        let exec = OperationExecutor::builder()
            .metrics_context_factory(DefaultMetricsContextFactory::default().clock(clock.clone()))
            .clock(clock.clone())
            .build();

        let result = exec.call(|_| clock.advance(25));
        assert_eq!(result.metrics.duration_millis(), Some(25));
        assert_eq!(result.context.timestamp, 1_000);
    }

    #[tokio::test]
    async fn test_run_async() {
        let recorded = Recorded::default();
        let exec = executor(&recorded);

        let ok = exec
            .run_async(|ctx| async move { Ok::<_, OutOfStock>(ctx.service.clone()) })
            .await
            .unwrap();
        assert_eq!(ok.data, "ItemService");

        let err = exec
            .run_async(|_| async { Err::<(), _>(OutOfStock) })
            .await
            .unwrap_err();
        assert_eq!(err, OutOfStock);
        assert_eq!(recorded.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_work_message_reaches_result() {
        let result = OperationExecutor::default().call(|ctx| {
            ctx.set_message("created 3 items");
            3
        });
        assert_eq!(result.context.message.as_deref(), Some("created 3 items"));
    }

    #[test]
    fn test_work_message_reaches_failure_listener() {
        #[derive(Clone, Default)]
        struct Messages(Arc<Mutex<Vec<Option<String>>>>);

        impl OperationListener for Messages {
            fn on_failure(&self, ctx: &OperationContext, _failure: &Failure<'_>) {
                self.0.lock().unwrap().push(ctx.message.clone());
            }
        }

        let messages = Messages::default();
        let exec = OperationExecutor::builder().listener(messages.clone()).build();
        let _ = exec.run(|ctx| {
            ctx.set_message("reserved 2 of 5");
            Err::<(), _>(OutOfStock)
        });

        assert_eq!(
            *messages.0.lock().unwrap(),
            vec![Some("reserved 2 of 5".to_string())]
        );
    }

    #[tokio::test]
    async fn test_async_work_message_reaches_result() {
        let result = OperationExecutor::default()
            .run_async(|ctx| async move {
                tokio::task::yield_now().await;
                ctx.set_message("async note");
                Ok::<_, OutOfStock>(())
            })
            .await
            .unwrap();
        assert_eq!(result.context.message.as_deref(), Some("async note"));
    }
}
