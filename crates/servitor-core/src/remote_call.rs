//! Resolution of a blocking call made by a controller against a running service.
//!
//! A call is settled by whichever happens first: the service answers (with the method reply or
//! a completion signal), the transport reports an error, or the service disappears from the
//! bus. A service that exits while answering a stop request counts as a successful stop.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use pin_project_lite::pin_project;
use tracing::{debug, warn};

use crate::{
    CommandError,
    runtime::{EXIT_FAILURE, EXIT_SUCCESS},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOutcome {
    Completed { exit_code: i32 },
    /// The service left the bus before answering.
    PeerVanished,
}

impl RemoteOutcome {
    pub fn from_success(success: bool) -> Self {
        RemoteOutcome::Completed {
            exit_code: if success { EXIT_SUCCESS } else { EXIT_FAILURE },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RemoteOutcome::Completed { exit_code } => *exit_code,
            RemoteOutcome::PeerVanished => EXIT_SUCCESS,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == EXIT_SUCCESS
    }
}

pin_project! {
    /// Settles exactly once. After that neither source is polled again.
    pub struct PendingRemoteCall<R, V> {
        request: String,
        awaiting: bool,
        #[pin]
        reply: R,
        #[pin]
        vanished: V,
    }
}

impl<R, V> PendingRemoteCall<R, V>
where
    R: Future<Output = Result<RemoteOutcome, CommandError>>,
    V: Future<Output = ()>,
{
    pub fn new(request: impl Into<String>, reply: R, vanished: V) -> Self {
        Self {
            request: request.into(),
            awaiting: true,
            reply,
            vanished,
        }
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Waits for the outcome, giving up with [`CommandError::Timeout`] after `bound` if given.
    pub async fn resolve(self, bound: Option<Duration>) -> Result<RemoteOutcome, CommandError> {
        match bound {
            Some(bound) => tokio::time::timeout(bound, self)
                .await
                .map_err(|_| CommandError::Timeout(bound))?,
            None => self.await,
        }
    }
}

impl<R, V> Future for PendingRemoteCall<R, V>
where
    R: Future<Output = Result<RemoteOutcome, CommandError>>,
    V: Future<Output = ()>,
{
    type Output = Result<RemoteOutcome, CommandError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        assert!(*this.awaiting, "PendingRemoteCall polled after it resolved");

        let outcome = match this.reply.poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                debug!("{} answered: {outcome:?}", this.request);
                Ok(outcome)
            }
            Poll::Ready(Err(e)) => {
                // The error may just be the reply losing the race with the exit
                if this.vanished.poll(cx).is_ready() {
                    warn!("{} failed after the service left the bus: {e}", this.request);
                    Ok(RemoteOutcome::PeerVanished)
                } else {
                    Err(e)
                }
            }
            Poll::Pending => match this.vanished.poll(cx) {
                Poll::Ready(()) => {
                    warn!(
                        "Service left the bus before answering {}, assuming it succeeded",
                        this.request
                    );
                    Ok(RemoteOutcome::PeerVanished)
                }
                Poll::Pending => return Poll::Pending,
            },
        };

        *this.awaiting = false;
        Poll::Ready(outcome)
    }
}

#[cfg(test)]
#[path = "./remote_call_test.rs"]
mod remote_call_test;
