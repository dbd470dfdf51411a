use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

// Relay states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    StreamOpen,
    Closed(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    UpstreamFailed,
    CallerDisconnected,
    IdleTimeout,
}

// Relay events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEvent {
    UpstreamOpened,
    UpstreamFinished,
    UpstreamFailed,
    CallerDisconnected,
    IdleTimeout,
}

/// Bookkeeping for one advice stream, from the upstream call until close.
#[derive(Debug)]
pub struct StreamSession {
    id: Uuid,
    state: RelayState,
    fragments_relayed: usize,
    bytes_relayed: usize,
    started_at: Instant,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RelayState::Idle,
            fragments_relayed: 0,
            bytes_relayed: 0,
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, RelayState::Closed(_))
    }

    pub fn fragments_relayed(&self) -> usize {
        self.fragments_relayed
    }

    pub fn bytes_relayed(&self) -> usize {
        self.bytes_relayed
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn transition(&mut self, event: RelayEvent) -> Result<()> {
        let new_state = match (self.state, event) {
            (RelayState::Idle, RelayEvent::UpstreamOpened) => RelayState::StreamOpen,
            (RelayState::StreamOpen, RelayEvent::UpstreamFinished) => {
                RelayState::Closed(CloseReason::Completed)
            }
            (RelayState::StreamOpen, RelayEvent::UpstreamFailed) => {
                RelayState::Closed(CloseReason::UpstreamFailed)
            }
            (RelayState::StreamOpen, RelayEvent::CallerDisconnected) => {
                RelayState::Closed(CloseReason::CallerDisconnected)
            }
            (RelayState::StreamOpen, RelayEvent::IdleTimeout) => {
                RelayState::Closed(CloseReason::IdleTimeout)
            }
            _ => {
                warn!(
                    session = %self.id,
                    "Invalid relay transition from {:?} with event {:?}", self.state, event
                );
                return Err(Error::relay(format!(
                    "Invalid transition from {:?} with event {:?}",
                    self.state, event
                )));
            }
        };

        debug!(session = %self.id, "Relay state {:?} -> {:?}", self.state, new_state);
        self.state = new_state;

        if let RelayState::Closed(reason) = new_state {
            info!(
                session = %self.id,
                fragments = self.fragments_relayed,
                bytes = self.bytes_relayed,
                elapsed_ms = self.elapsed().as_millis() as u64,
                "Advice stream closed: {:?}",
                reason
            );
        }
        Ok(())
    }

    /// Counts a fragment accepted by the outbound stream.
    pub fn record_fragment(&mut self, len: usize) -> Result<()> {
        if self.state != RelayState::StreamOpen {
            return Err(Error::relay(format!(
                "Cannot relay a fragment in state {:?}",
                self.state
            )));
        }
        self.fragments_relayed += 1;
        self.bytes_relayed += len;
        Ok(())
    }
}
