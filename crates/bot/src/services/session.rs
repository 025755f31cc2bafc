//! Recording session state machine.
//!
//! [`Session`] holds no I/O: the recorder feeds it motion edges, capture
//! results and timer ticks, and acts on what it returns.

use tracing::debug;

use crate::config::RecordingConfig;

/// Where the session is in the capture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No capture in flight.
    Idle,
    /// Camera start requested.
    Starting,
    /// Capture running with the drain timer ticking.
    Recording {
        /// Ticks since the capture started.
        elapsed: u32,
        /// Consecutive ticks observed without motion.
        inactive_streak: u32,
    },
    /// Camera stop requested.
    Stopping,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Starting => f.write_str("starting"),
            Self::Recording { elapsed, .. } => write!(f, "recording ({elapsed} ticks)"),
            Self::Stopping => f.write_str("stopping"),
        }
    }
}

/// What the driver should do after a motion edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    /// Start a capture.
    StartCapture,
    /// Nothing to do.
    Ignore,
}

/// Why a capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Motion was inactive for the debounce threshold.
    Debounced,
    /// The capture reached its maximum length.
    MaxDuration,
}

/// Result of one drain timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep recording.
    Continue,
    /// Stop the capture.
    Stop(StopReason),
    /// The session is not recording; the timer should end.
    NotRecording,
}

/// Motion-to-recording state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    motion_active: bool,
    paused: bool,
    debounce_ticks: u32,
    max_capture_ticks: u32,
}

impl Session {
    /// Create an idle session.
    #[must_use]
    pub const fn new(config: &RecordingConfig) -> Self {
        Self {
            phase: Phase::Idle,
            motion_active: false,
            paused: config.start_paused,
            debounce_ticks: config.debounce_ticks,
            max_capture_ticks: config.max_capture_ticks,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Last motion level reported by the sensor.
    #[must_use]
    pub const fn motion_active(&self) -> bool {
        self.motion_active
    }

    /// Whether new captures are suppressed.
    #[must_use]
    pub const fn paused(&self) -> bool {
        self.paused
    }

    /// Record a motion edge.
    ///
    /// Only a start edge while idle and unpaused starts a capture; every
    /// other edge just updates the motion level.
    pub fn on_motion(&mut self, active: bool) -> MotionAction {
        self.motion_active = active;

        if active && self.phase == Phase::Idle && !self.paused {
            self.phase = Phase::Starting;
            MotionAction::StartCapture
        } else {
            MotionAction::Ignore
        }
    }

    /// The camera started; begin counting ticks.
    pub fn capture_started(&mut self) {
        if self.phase == Phase::Starting {
            self.phase = Phase::Recording {
                elapsed: 0,
                inactive_streak: 0,
            };
        }
    }

    /// The camera failed to start.
    pub fn capture_failed(&mut self) {
        if self.phase == Phase::Starting {
            self.phase = Phase::Idle;
        }
    }

    /// Advance the drain timer by one tick.
    ///
    /// The debounce check runs before the duration cap.
    pub fn tick(&mut self) -> TickOutcome {
        let Phase::Recording {
            elapsed,
            inactive_streak,
        } = self.phase
        else {
            return TickOutcome::NotRecording;
        };

        let elapsed = elapsed + 1;
        let inactive_streak = if self.motion_active {
            0
        } else {
            inactive_streak + 1
        };

        debug!(
            elapsed,
            total = self.max_capture_ticks,
            inactive_streak,
            threshold = self.debounce_ticks,
            motion_active = self.motion_active,
            "Recording tick"
        );

        let reason = if inactive_streak >= self.debounce_ticks {
            Some(StopReason::Debounced)
        } else if elapsed >= self.max_capture_ticks {
            Some(StopReason::MaxDuration)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.phase = Phase::Stopping;
                TickOutcome::Stop(reason)
            }
            None => {
                self.phase = Phase::Recording {
                    elapsed,
                    inactive_streak,
                };
                TickOutcome::Continue
            }
        }
    }

    /// The camera stopped. Returns true if a new capture should start.
    ///
    /// A capped capture restarts unless paused. A debounced capture restarts
    /// only if a start edge arrived while it was stopping.
    pub fn capture_stopped(&mut self, reason: StopReason) -> bool {
        if self.phase != Phase::Stopping {
            return false;
        }

        let restart = !self.paused
            && match reason {
                StopReason::MaxDuration => true,
                StopReason::Debounced => self.motion_active,
            };

        self.phase = if restart { Phase::Starting } else { Phase::Idle };
        restart
    }

    /// Set the pause flag. Returns whether it changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let changed = self.paused != paused;
        self.paused = paused;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&RecordingConfig::default())
    }

    fn recording(session: &mut Session) {
        assert_eq!(session.on_motion(true), MotionAction::StartCapture);
        session.capture_started();
    }

    #[test]
    fn test_start_edge_starts_capture_once() {
        let mut session = session();
        assert_eq!(session.on_motion(true), MotionAction::StartCapture);
        assert_eq!(session.phase(), Phase::Starting);

        // Re-entrant start edges while a capture is in flight are ignored.
        assert_eq!(session.on_motion(true), MotionAction::Ignore);
        session.capture_started();
        assert_eq!(session.on_motion(true), MotionAction::Ignore);
    }

    #[test]
    fn test_paused_ignores_motion() {
        let mut session = session();
        assert!(session.set_paused(true));
        assert_eq!(session.on_motion(true), MotionAction::Ignore);
        assert!(session.motion_active());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_failed_start_returns_to_idle() {
        let mut session = session();
        session.on_motion(true);
        session.capture_failed();
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_debounce_after_motion_ends() {
        let mut session = session();
        recording(&mut session);

        // Motion through t=5.
        for _ in 0..5 {
            assert_eq!(session.tick(), TickOutcome::Continue);
        }
        session.on_motion(false);

        assert_eq!(session.tick(), TickOutcome::Continue);
        assert_eq!(session.tick(), TickOutcome::Stop(StopReason::Debounced));
        assert_eq!(session.phase(), Phase::Stopping);

        assert!(!session.capture_stopped(StopReason::Debounced));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_motion_resets_streak() {
        let mut session = session();
        recording(&mut session);

        session.on_motion(false);
        assert_eq!(session.tick(), TickOutcome::Continue);
        session.on_motion(true);
        assert_eq!(session.tick(), TickOutcome::Continue);
        assert_eq!(
            session.phase(),
            Phase::Recording {
                elapsed: 2,
                inactive_streak: 0
            }
        );
    }

    #[test]
    fn test_max_duration_restarts() {
        let mut session = session();
        recording(&mut session);

        for _ in 0..29 {
            assert_eq!(session.tick(), TickOutcome::Continue);
        }
        assert_eq!(session.tick(), TickOutcome::Stop(StopReason::MaxDuration));
        assert!(session.capture_stopped(StopReason::MaxDuration));
        assert_eq!(session.phase(), Phase::Starting);
    }

    #[test]
    fn test_pause_during_capture_blocks_restart() {
        let mut session = session();
        recording(&mut session);
        assert!(session.set_paused(true));

        for _ in 0..29 {
            assert_eq!(session.tick(), TickOutcome::Continue);
        }
        assert_eq!(session.tick(), TickOutcome::Stop(StopReason::MaxDuration));
        assert!(!session.capture_stopped(StopReason::MaxDuration));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_debounce_wins_over_cap() {
        let mut session = Session::new(&RecordingConfig {
            debounce_ticks: 2,
            max_capture_ticks: 2,
            ..RecordingConfig::default()
        });
        recording(&mut session);
        session.on_motion(false);

        assert_eq!(session.tick(), TickOutcome::Continue);
        assert_eq!(session.tick(), TickOutcome::Stop(StopReason::Debounced));
    }

    #[test]
    fn test_start_edge_while_stopping_restarts() {
        let mut session = session();
        recording(&mut session);
        session.on_motion(false);
        session.tick();
        assert_eq!(session.tick(), TickOutcome::Stop(StopReason::Debounced));

        assert_eq!(session.on_motion(true), MotionAction::Ignore);
        assert!(session.capture_stopped(StopReason::Debounced));
    }

    #[test]
    fn test_tick_outside_recording() {
        let mut session = session();
        assert_eq!(session.tick(), TickOutcome::NotRecording);
    }

    #[test]
    fn test_set_paused_reports_change() {
        let mut session = session();
        assert!(!session.set_paused(false));
        assert!(session.set_paused(true));
        assert!(!session.set_paused(true));
        assert!(session.set_paused(false));
    }
}
