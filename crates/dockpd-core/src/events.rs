//! Event system for host/UI decoupling.
//!
//! The update pipeline reports phase transitions and chunk progress through
//! an observer so CLI/daemon front-ends stay decoupled from the core logic.

use std::sync::Mutex;

use crate::update::UpdatePhase;

/// Log level for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Events emitted during an update attempt.
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    /// Phase changed.
    PhaseChanged { from: UpdatePhase, to: UpdatePhase },
    /// One more chunk landed; `written` of `total` are now on the wire.
    ChunkWritten { written: usize, total: usize },
    /// Log message.
    Log { level: LogLevel, message: String },
    /// The whole phase sequence completed.
    Completed,
}

/// Observer trait for receiving update events.
///
/// Callbacks run synchronously between chunk writes and must not block
/// indefinitely, or they stall the update.
pub trait UpdateObserver: Send + Sync {
    fn on_event(&self, event: &UpdateEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl UpdateObserver for NullObserver {
    fn on_event(&self, _event: &UpdateEvent) {}
}

/// Observer that mirrors events into `tracing`.
pub struct TracingObserver;

impl UpdateObserver for TracingObserver {
    fn on_event(&self, event: &UpdateEvent) {
        match event {
            UpdateEvent::PhaseChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Phase changed");
            }
            UpdateEvent::ChunkWritten { written, total } => {
                let pct = if *total > 0 { written * 100 / total } else { 100 };
                tracing::debug!(written, total, progress = %format!("{pct}%"), "Chunk written");
            }
            UpdateEvent::Log { level, message } => match level {
                LogLevel::Trace => tracing::trace!("{}", message),
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
            UpdateEvent::Completed => {
                tracing::info!("Update complete");
            }
        }
    }
}

/// Observer that records every event, for assertions and post-mortems.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The `(written, total)` pairs reported so far, in order.
    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                UpdateEvent::ChunkWritten { written, total } => Some((*written, *total)),
                _ => None,
            })
            .collect()
    }
}

impl UpdateObserver for RecordingObserver {
    fn on_event(&self, event: &UpdateEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
