/// Crawl lifecycle phases
///
/// A run moves strictly forward through these phases; it never re-enters one.
use crate::CrawlError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Represents the lifecycle phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Constructed, `start` not yet called
    Idle,

    /// Seed URLs are being turned into depth-0 tasks
    Seeding,

    /// Worker pool and monitor are active
    Running,

    /// Cancellation fired; in-flight tasks are finishing
    Draining,

    /// Results materialized
    Done,
}

impl CrawlPhase {
    /// Returns true if `next` is a legal successor of this phase
    ///
    /// Seeding may jump straight to Done when no seed can be scheduled.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Seeding)
                | (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Done)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true once no more work will be processed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Seeding => 1,
            Self::Running => 2,
            Self::Draining => 3,
            Self::Done => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Seeding,
            2 => Self::Running,
            3 => Self::Draining,
            _ => Self::Done,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lock-free holder of the current phase, shared between the run and observers
#[derive(Debug)]
pub struct PhaseTracker {
    phase: AtomicU8,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(CrawlPhase::Idle.to_u8()),
        }
    }

    pub fn current(&self) -> CrawlPhase {
        CrawlPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Moves to `next`, failing if that is not a legal step from the current phase
    pub fn advance(&self, next: CrawlPhase) -> Result<(), CrawlError> {
        let mut current = self.current();
        loop {
            if !current.can_transition_to(next) {
                return Err(CrawlError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }

            match self.phase.compare_exchange(
                current.to_u8(),
                next.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::debug!(from = %current, to = %next, "Crawl phase changed");
                    return Ok(());
                }
                Err(actual) => current = CrawlPhase::from_u8(actual),
            }
        }
    }
}
