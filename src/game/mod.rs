/// Game module
///
/// Dwell-time scoring and the match state machine.
///
/// ## Architecture
///
/// ```text
/// Scorekeeper (one tick per frame)
///   ├── MatchState::advance   (pause expiry, restart)
///   ├── DwellTimers::evaluate (left, then right)
///   └── MatchState::award_point (opposite side, at most once)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use game::{GameRules, Scorekeeper, SideMap};
///
/// let mut keeper = Scorekeeper::new(GameRules::default(), 300.0);
/// let events = keeper.tick(clock.now(), &SideMap::new(left, right));
/// let (score_line, status_line) = keeper.state().display_strings();
/// ```

pub mod dwell;
pub mod match_state;
pub mod rules;
pub mod scorekeeper;
pub mod side;

// Re-export commonly used types
pub use dwell::DwellTimers;
pub use match_state::{MatchState, MatchStatus, Phase, PhaseChange, PointOutcome, TransitionError};
pub use rules::GameRules;
pub use scorekeeper::{Observations, Scorekeeper};
pub use side::{Side, SideMap};
