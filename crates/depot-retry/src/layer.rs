use crate::{Retry, RetryExecutor};
use tower::Layer;

/// A Tower [`Layer`] that runs every call of the wrapped service under a
/// [`RetryExecutor`].
///
/// ```
/// use depot_core::AccessError;
/// use depot_retry::{RetryExecutor, RetryLayer, RetryPolicy};
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(RetryLayer::new(RetryExecutor::new(RetryPolicy::default())))
///     .service(tower::service_fn(|key: String| async move {
///         Ok::<_, AccessError>(key.len())
///     }));
/// # let _ = service;
/// ```
#[derive(Clone, Debug)]
pub struct RetryLayer {
    executor: RetryExecutor,
}

impl RetryLayer {
    /// Creates a layer sharing `executor`'s policy and listeners.
    pub fn new(executor: RetryExecutor) -> Self {
        Self { executor }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, service: S) -> Self::Service {
        self.executor.wrap(service)
    }
}
