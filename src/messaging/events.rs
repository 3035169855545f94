/// Game events
///
/// Events represent things that have happened (past tense).
/// They are broadcast to all subscribers.
use std::time::{Duration, Instant};

use crate::game::Side;

/// Events emitted by the scorekeeper and the game loop
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The ball entered the scoring zone of a half
    DwellStarted { side: Side, at: Instant },

    /// The ball left the zone before the dwell threshold
    DwellCancelled { side: Side, after: Duration },

    /// A point was awarded; scores are after the point
    PointScored {
        scorer: Side,
        left: u32,
        right: u32,
        at: Instant,
    },

    /// The point decided the match
    MatchWon {
        winner: Side,
        left: u32,
        right: u32,
        at: Instant,
    },

    /// Inter-point pause ended
    PointResumed { at: Instant },

    /// Scores were reset for a new match
    MatchRestarted { at: Instant },

    /// The game loop is stopping
    Shutdown,
}

impl GameEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            GameEvent::DwellStarted { side, .. } => {
                format!("Ball in {} scoring zone", side)
            }
            GameEvent::DwellCancelled { side, after } => {
                format!("Dwell on {} half cancelled after {:.1}s", side, after.as_secs_f32())
            }
            GameEvent::PointScored { scorer, left, right, .. } => {
                format!("Point to {} ({}-{})", scorer, left, right)
            }
            GameEvent::MatchWon { winner, left, right, .. } => {
                format!("{} player won {}-{}", winner.label(), left, right)
            }
            GameEvent::PointResumed { .. } => "Next rally".to_string(),
            GameEvent::MatchRestarted { .. } => "New match".to_string(),
            GameEvent::Shutdown => "Shutting down".to_string(),
        }
    }

    /// Whether the event changes the score or phase
    pub fn is_transition(&self) -> bool {
        !matches!(
            self,
            GameEvent::DwellStarted { .. } | GameEvent::DwellCancelled { .. }
        )
    }
}
