//! Externally observable update phase sequence.
//!
//! A PD update moves through a fixed, non-branching sequence:
//! `Detach → Write → Attach → Reload → (terminal)`. Only `Write` carries
//! transport traffic and progress weight; the bracketing phases are
//! zero-weight bookkeeping the host renders as restart/busy status.

use std::fmt;
use tracing::debug;

/// Host-facing status of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// Device is going through (or returning from) a restart.
    DeviceRestart,
    /// Firmware pages are being written.
    DeviceWrite,
    /// Device is busy refreshing dependent state.
    DeviceBusy,
}

/// One phase of the update sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Detach,
    Write,
    Attach,
    Reload,
}

impl UpdatePhase {
    pub fn status(self) -> PhaseStatus {
        match self {
            UpdatePhase::Detach | UpdatePhase::Attach => PhaseStatus::DeviceRestart,
            UpdatePhase::Write => PhaseStatus::DeviceWrite,
            UpdatePhase::Reload => PhaseStatus::DeviceBusy,
        }
    }

    /// Progress weight of this phase; weights sum to
    /// [`UpdatePhases::TOTAL_WEIGHT`].
    pub fn weight(self) -> u32 {
        match self {
            UpdatePhase::Write => 100,
            UpdatePhase::Detach | UpdatePhase::Attach | UpdatePhase::Reload => 0,
        }
    }

    fn next(self) -> Option<UpdatePhase> {
        match self {
            UpdatePhase::Detach => Some(UpdatePhase::Write),
            UpdatePhase::Write => Some(UpdatePhase::Attach),
            UpdatePhase::Attach => Some(UpdatePhase::Reload),
            UpdatePhase::Reload => None,
        }
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdatePhase::Detach => write!(f, "detach"),
            UpdatePhase::Write => write!(f, "write"),
            UpdatePhase::Attach => write!(f, "attach"),
            UpdatePhase::Reload => write!(f, "reload"),
        }
    }
}

/// The phase state machine for one update attempt.
///
/// Transitions are unconditional in sequence; a failed write simply stops
/// advancing, so `fraction` can never reach 1.0 on a failed attempt.
#[derive(Debug)]
pub struct UpdatePhases {
    current: UpdatePhase,
    completed_weight: u32,
    finished: bool,
}

impl UpdatePhases {
    pub const TOTAL_WEIGHT: u32 = 100;

    pub fn new() -> Self {
        Self {
            current: UpdatePhase::Detach,
            completed_weight: 0,
            finished: false,
        }
    }

    pub fn current(&self) -> UpdatePhase {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Complete the current phase and move to the next; returns the new
    /// phase, or `None` once the sequence is terminal.
    pub fn advance(&mut self) -> Option<UpdatePhase> {
        if self.finished {
            return None;
        }
        self.completed_weight += self.current.weight();
        match self.current.next() {
            Some(next) => {
                debug!(from = %self.current, to = %next, "Phase transition");
                self.current = next;
                Some(next)
            }
            None => {
                debug!(from = %self.current, "Phase sequence complete");
                self.finished = true;
                None
            }
        }
    }

    /// Overall completion in `[0.0, 1.0]` given the fraction of the current
    /// phase that is done. Reaches 1.0 only once every weighted phase has
    /// completed, so a write that fails mid-stream stays below it.
    pub fn fraction(&self, phase_fraction: f64) -> f64 {
        if self.finished {
            return 1.0;
        }
        let in_phase = f64::from(self.current.weight()) * phase_fraction.clamp(0.0, 1.0);
        (f64::from(self.completed_weight) + in_phase) / f64::from(Self::TOTAL_WEIGHT)
    }
}

impl Default for UpdatePhases {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sequence() {
        let mut phases = UpdatePhases::new();
        assert_eq!(phases.current(), UpdatePhase::Detach);
        assert_eq!(phases.advance(), Some(UpdatePhase::Write));
        assert_eq!(phases.advance(), Some(UpdatePhase::Attach));
        assert_eq!(phases.advance(), Some(UpdatePhase::Reload));
        assert_eq!(phases.advance(), None);
        assert!(phases.is_finished());
        // Terminal is absorbing.
        assert_eq!(phases.advance(), None);
    }

    #[test]
    fn test_weights() {
        let total: u32 = [
            UpdatePhase::Detach,
            UpdatePhase::Write,
            UpdatePhase::Attach,
            UpdatePhase::Reload,
        ]
        .iter()
        .map(|p| p.weight())
        .sum();
        assert_eq!(total, UpdatePhases::TOTAL_WEIGHT);
        assert_eq!(UpdatePhase::Write.weight(), 100);
    }

    #[test]
    fn test_statuses() {
        assert_eq!(UpdatePhase::Detach.status(), PhaseStatus::DeviceRestart);
        assert_eq!(UpdatePhase::Write.status(), PhaseStatus::DeviceWrite);
        assert_eq!(UpdatePhase::Attach.status(), PhaseStatus::DeviceRestart);
        assert_eq!(UpdatePhase::Reload.status(), PhaseStatus::DeviceBusy);
    }

    #[test]
    fn test_fraction_tracks_write_phase() {
        let mut phases = UpdatePhases::new();
        assert_eq!(phases.fraction(1.0), 0.0); // detach is zero-weight

        phases.advance(); // -> Write
        assert_eq!(phases.fraction(0.0), 0.0);
        assert!((phases.fraction(0.5) - 0.5).abs() < f64::EPSILON);

        phases.advance(); // -> Attach
        assert!((phases.fraction(0.0) - 1.0).abs() < f64::EPSILON);

        phases.advance(); // -> Reload
        phases.advance(); // terminal
        assert_eq!(phases.fraction(0.0), 1.0);
    }

    #[test]
    fn test_failed_write_never_reaches_full_fraction() {
        let mut phases = UpdatePhases::new();
        phases.advance(); // -> Write, then the write fails: no further advance
        assert!(phases.fraction(0.99) < 1.0);
        assert!(!phases.is_finished());
    }
}
