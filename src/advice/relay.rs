//! Relays a streamed completion to the caller, fragment by fragment.
//!
//! [`open`] waits for the first upstream item so that failures the provider
//! reports up front (bad key, unknown model) can still become a JSON error.
//! After that the relay owns the stream: [`OpenRelay::spawn`] moves it into a
//! task that forwards each non-empty fragment through a bounded channel. The
//! sender is dropped when the task returns, which closes the outbound body on
//! every exit path.

use super::session::{RelayEvent, StreamSession};
use crate::{Error, Result, config::RelayConfig, llm::FragmentStream};
use bytes::Bytes;
use futures::StreamExt;
use std::{io, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// One item of the outbound body. An `Err` aborts the response mid-flight.
pub type OutboundChunk = std::result::Result<Bytes, io::Error>;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub first_fragment_timeout: Duration,
    pub idle_timeout: Duration,
    pub channel_capacity: usize,
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            first_fragment_timeout: Duration::from_secs(config.first_fragment_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            channel_capacity: config.channel_capacity.max(1),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

enum Primed {
    Fragment(String),
    Finished,
}

/// An upstream stream that has produced its first item.
pub struct OpenRelay {
    session: StreamSession,
    primed: Primed,
    upstream: FragmentStream,
    settings: RelaySettings,
    permit: Option<OwnedSemaphorePermit>,
}

/// Waits for the first upstream item, bounded by the first-fragment timeout.
///
/// Errors here happen before anything was sent to the caller.
pub async fn open(mut upstream: FragmentStream, settings: RelaySettings) -> Result<OpenRelay> {
    let mut session = StreamSession::new();

    let primed = match tokio::time::timeout(settings.first_fragment_timeout, upstream.next()).await
    {
        Err(_) => {
            return Err(Error::UpstreamTimeout {
                seconds: settings.first_fragment_timeout.as_secs(),
            });
        }
        Ok(Some(Err(e))) => return Err(e),
        Ok(Some(Ok(text))) => Primed::Fragment(text),
        Ok(None) => Primed::Finished,
    };

    session.transition(RelayEvent::UpstreamOpened)?;
    debug!(session = %session.id(), "Advice stream open");

    Ok(OpenRelay {
        session,
        primed,
        upstream,
        settings,
        permit: None,
    })
}

impl OpenRelay {
    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Moves the relay into a background task and returns the outbound body.
    ///
    /// `permit` is held until the session closes and is released before the
    /// body ends.
    pub fn spawn(mut self, permit: Option<OwnedSemaphorePermit>) -> ReceiverStream<OutboundChunk> {
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity);
        self.permit = permit;

        tokio::spawn(async move {
            self.pump(tx).await;
        });

        ReceiverStream::new(rx)
    }

    /// Forwards fragments into `tx` until the session closes, then drops `tx`.
    pub async fn pump(self, tx: mpsc::Sender<OutboundChunk>) -> StreamSession {
        let OpenRelay {
            mut session,
            primed,
            mut upstream,
            settings,
            permit,
        } = self;

        let event = relay_fragments(
            &mut session,
            primed,
            &mut upstream,
            &tx,
            settings.idle_timeout,
        )
        .await;

        if let Err(e) = session.transition(event) {
            error!(session = %session.id(), "Failed to close advice stream: {}", e);
        }

        // Upstream and the stream slot go first so both are free before the body ends.
        drop(upstream);
        drop(permit);
        drop(tx);
        session
    }
}

async fn relay_fragments(
    session: &mut StreamSession,
    primed: Primed,
    upstream: &mut FragmentStream,
    tx: &mpsc::Sender<OutboundChunk>,
    idle_timeout: Duration,
) -> RelayEvent {
    match primed {
        Primed::Finished => return RelayEvent::UpstreamFinished,
        Primed::Fragment(text) => {
            if let Some(event) = forward(session, tx, text).await {
                return event;
            }
        }
    }

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => return RelayEvent::CallerDisconnected,
            next = tokio::time::timeout(idle_timeout, upstream.next()) => next,
        };

        match next {
            Err(_) => {
                warn!(
                    session = %session.id(),
                    "No upstream fragment for {:?}, aborting stream",
                    idle_timeout
                );
                let _ = tx
                    .send(Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "advice stream stalled",
                    )))
                    .await;
                return RelayEvent::IdleTimeout;
            }
            Ok(None) => return RelayEvent::UpstreamFinished,
            Ok(Some(Err(e))) => {
                warn!(session = %session.id(), "Upstream stream failed: {}", e);
                let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                return RelayEvent::UpstreamFailed;
            }
            Ok(Some(Ok(text))) => {
                if let Some(event) = forward(session, tx, text).await {
                    return event;
                }
            }
        }
    }
}

/// Writes one fragment. Returns the closing event if the caller is gone.
async fn forward(
    session: &mut StreamSession,
    tx: &mpsc::Sender<OutboundChunk>,
    text: String,
) -> Option<RelayEvent> {
    if text.is_empty() {
        return None;
    }

    let len = text.len();
    if tx.send(Ok(Bytes::from(text))).await.is_err() {
        debug!(session = %session.id(), "Caller went away, dropping upstream");
        return Some(RelayEvent::CallerDisconnected);
    }

    if let Err(e) = session.record_fragment(len) {
        warn!(session = %session.id(), "{}", e);
    }
    None
}
