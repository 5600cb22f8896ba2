//! Call dispatch.
//!
//! Normalizing, routing and recording a call happen synchronously under the
//! router lock, so concurrent callers are recorded in dispatch order.
//! Response resolution then runs as a spawned task that races the call's
//! cancellation signal.

use super::core::FetchMock;
use crate::config::FallbackMode;
use crate::error::FetchMockError;
use crate::history::CallLog;
use crate::network::FetchClient;
use crate::request::{normalize_request, FetchInput, Request, RequestInit};
use crate::resolver::{resolve_response, ResolveOptions, ResponseSpec};
use crate::response::MockResponse;
use crate::router::RouteOutcome;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the spawned task does to answer a call.
enum Plan {
    Respond {
        response: ResponseSpec,
        options: ResolveOptions,
        delay: Option<Duration>,
    },
    Network(Arc<dyn FetchClient>),
}

/// Response of a dispatched call, resolving once the response is realized.
///
/// Dropping it does not cancel the call; use the request's signal for that.
#[must_use = "a PendingFetch resolves to the call's response"]
pub struct PendingFetch {
    task: JoinHandle<Result<MockResponse, FetchMockError>>,
}

impl Future for PendingFetch {
    type Output = Result<MockResponse, FetchMockError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(FetchMockError::Task(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FetchMock {
    /// Dispatch a call.
    ///
    /// Fails immediately on an invalid URL, outside a tokio runtime, or
    /// when nothing matches and neither a fallback nor the network is
    /// available. Everything else is reported through the returned future.
    ///
    /// Matching holds the route table's write lock, so predicate and custom
    /// matchers must not query this mock.
    pub fn fetch(
        &self,
        input: impl Into<FetchInput>,
        init: Option<RequestInit>,
    ) -> Result<PendingFetch, FetchMockError> {
        let runtime = Handle::try_current().map_err(|e| FetchMockError::Task(e.to_string()))?;
        let input = input.into();
        let raw_url = input.url().to_string();
        let normalized = normalize_request(input, init)
            .map_err(|source| FetchMockError::InvalidUrl { url: raw_url, source })?;

        let config = &self.inner.config;
        let mut router = self.inner.router.write();
        let mut call = CallLog::new(normalized, router.needs_body());

        let outcome = if config.fallback_to_network == FallbackMode::Always {
            RouteOutcome::Unmatched {
                captured: BTreeMap::new(),
            }
        } else {
            router.execute(&call)
        };

        let defaults = ResolveOptions {
            include_content_length: config.include_content_length,
            send_as_json: config.send_as_json,
        };
        let plan = match outcome {
            RouteOutcome::Matched {
                identifier,
                response,
                overrides,
                captured,
            } => {
                call.route = Some(identifier);
                call.captured_params = captured;
                Ok(Plan::Respond {
                    response,
                    options: ResolveOptions {
                        include_content_length: overrides
                            .include_content_length
                            .unwrap_or(defaults.include_content_length),
                        send_as_json: overrides.send_as_json.unwrap_or(defaults.send_as_json),
                    },
                    delay: overrides.delay,
                })
            }
            RouteOutcome::Fallback { response, captured } => {
                call.captured_params = captured;
                if config.warn_on_fallback {
                    warn!("Unmatched {} to {}", call.method().to_uppercase(), call.url);
                }
                Ok(Plan::Respond {
                    response,
                    options: defaults,
                    delay: None,
                })
            }
            RouteOutcome::Unmatched { captured } => {
                call.captured_params = captured;
                match config.fallback_to_network {
                    FallbackMode::Never => Err(FetchMockError::Unmatched {
                        method: call.method().to_uppercase(),
                        url: call.url.clone(),
                    }),
                    mode => {
                        if mode == FallbackMode::Unmatched && config.warn_on_fallback {
                            warn!(
                                "Unmatched {} to {}, falling back to the network",
                                call.method().to_uppercase(),
                                call.url
                            );
                        } else {
                            debug!("Forwarding {} to the network", call.url);
                        }
                        config
                            .network
                            .clone()
                            .map(Plan::Network)
                            .ok_or(FetchMockError::NetworkUnavailable)
                    }
                }
            }
        };

        let call = Arc::new(call);
        self.inner.history.record_call(call.clone());
        drop(router);
        let plan = plan?;

        let completion = self.inner.pending.track_call();
        let pending = self.inner.pending.clone();
        let task = runtime.spawn(async move {
            let _completion = completion;
            let result = match call.signal.clone() {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.cancelled() => Err(FetchMockError::Aborted),
                    result = respond(plan, &call) => result,
                },
                None => respond(plan, &call).await,
            };
            result.map(|response| {
                let response = response.with_tracker(pending);
                call.set_response(response.clone());
                response
            })
        });

        Ok(PendingFetch { task })
    }
}

async fn respond(plan: Plan, call: &CallLog) -> Result<MockResponse, FetchMockError> {
    match plan {
        Plan::Respond {
            response,
            options,
            delay,
        } => {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            resolve_response(response, call, options).await
        }
        Plan::Network(client) => client.fetch(call.to_request()).await,
    }
}

#[async_trait]
impl FetchClient for FetchMock {
    async fn fetch(&self, request: Request) -> Result<MockResponse, FetchMockError> {
        FetchMock::fetch(self, request, None)?.await
    }
}
