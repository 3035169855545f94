/// Match state machine
///
/// Owns the scores and the match phase. Phase timestamps live inside the
/// variants, so a pause start exists exactly while the point is paused and a
/// game-over time exists exactly while the match is over.
use std::time::{Duration, Instant};

use super::rules::GameRules;
use super::side::{Side, SideMap};

/// Phase of the match
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Rally in progress, scoring enabled
    Playing,

    /// A point was just scored
    PointPaused { since: Instant },

    /// Someone won; a new match starts after the restart delay
    GameOver { since: Instant, winner: Side },
}

impl Phase {
    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Phase::PointPaused { .. })
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Phase::GameOver { .. })
    }

    /// Timestamp-free view of the phase
    pub fn status(&self) -> MatchStatus {
        match self {
            Phase::Playing => MatchStatus::Playing,
            Phase::PointPaused { .. } => MatchStatus::PointPaused,
            Phase::GameOver { .. } => MatchStatus::GameOver,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Playing
    }
}

/// Public read surface for the phase
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchStatus {
    Playing,
    PointPaused,
    GameOver,
}

impl MatchStatus {
    pub fn description(&self) -> &'static str {
        match self {
            MatchStatus::Playing => "PLAYING",
            MatchStatus::PointPaused => "POINT_PAUSED",
            MatchStatus::GameOver => "GAME_OVER",
        }
    }
}

/// What an accepted point did to the match
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointOutcome {
    /// Match continues after the inter-point pause
    Paused,
    /// The point decided the match
    MatchWon { winner: Side },
}

/// Time-driven phase changes reported by [`MatchState::advance`]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhaseChange {
    /// Inter-point pause elapsed
    Resumed,
    /// Restart delay elapsed; scores are back to zero
    Restarted,
}

/// Rejected state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Points can only be awarded while playing
    NotPlaying(MatchStatus),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::NotPlaying(status) => {
                write!(f, "Cannot award a point while {}", status.description())
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// Scores and phase of the current match
#[derive(Debug, Clone)]
pub struct MatchState {
    rules: GameRules,
    scores: SideMap<u32>,
    phase: Phase,
}

impl MatchState {
    /// Fresh match at 0-0, playing
    pub fn new(rules: GameRules) -> Self {
        Self {
            rules,
            scores: SideMap::default(),
            phase: Phase::Playing,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> MatchStatus {
        self.phase.status()
    }

    /// `(left, right)`
    pub fn scores(&self) -> (u32, u32) {
        (self.scores[Side::Left], self.scores[Side::Right])
    }

    pub fn score(&self, side: Side) -> u32 {
        self.scores[side]
    }

    /// Winner of the finished match, if it is over
    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            Phase::GameOver { winner, .. } => Some(winner),
            _ => None,
        }
    }

    /// Credit one point to `side`.
    ///
    /// Only valid while playing; otherwise the call is rejected and nothing
    /// changes. A match-winning point goes straight to game over, skipping
    /// the inter-point pause.
    pub fn award_point(
        &mut self,
        side: Side,
        now: Instant,
    ) -> Result<PointOutcome, TransitionError> {
        if !self.phase.is_playing() {
            return Err(TransitionError::NotPlaying(self.status()));
        }

        self.scores[side] += 1;
        let (left, right) = self.scores();
        tracing::info!("Point to {}: {}-{}", side, left, right);

        if self.rules.is_winning(self.scores[side], self.scores[side.opposite()]) {
            self.phase = Phase::GameOver { since: now, winner: side };
            tracing::info!("{} player won the match {}-{}", side.label(), left, right);
            return Ok(PointOutcome::MatchWon { winner: side });
        }

        self.phase = Phase::PointPaused { since: now };
        Ok(PointOutcome::Paused)
    }

    /// Apply any time-driven transition that is due at `now`
    pub fn advance(&mut self, now: Instant) -> Option<PhaseChange> {
        match self.phase {
            Phase::PointPaused { since }
                if now.saturating_duration_since(since) >= self.rules.point_delay() =>
            {
                self.phase = Phase::Playing;
                tracing::info!("Next rally");
                Some(PhaseChange::Resumed)
            }
            Phase::GameOver { since, .. }
                if now.saturating_duration_since(since) >= self.rules.restart_delay() =>
            {
                self.reset();
                tracing::info!("Match restarted");
                Some(PhaseChange::Restarted)
            }
            _ => None,
        }
    }

    /// Back to 0-0, playing
    pub fn reset(&mut self) {
        self.scores = SideMap::default();
        self.phase = Phase::Playing;
    }

    /// Time left in the inter-point pause
    pub fn pause_remaining(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::PointPaused { since } => {
                Some(self.rules.point_delay().saturating_sub(now.saturating_duration_since(since)))
            }
            _ => None,
        }
    }

    /// Time left before the next match starts
    pub fn restart_remaining(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::GameOver { since, .. } => Some(
                self.rules
                    .restart_delay()
                    .saturating_sub(now.saturating_duration_since(since)),
            ),
            _ => None,
        }
    }

    /// `L:NN - R:NN`
    pub fn score_line(&self) -> String {
        let (left, right) = self.scores();
        format!("L:{:02} - R:{:02}", left, right)
    }

    pub fn status_line(&self) -> &'static str {
        match self.phase {
            Phase::GameOver { winner: Side::Left, .. } => "LEFT PLAYER WON!",
            Phase::GameOver { winner: Side::Right, .. } => "RIGHT PLAYER WON!",
            Phase::PointPaused { .. } => "POINT PAUSED",
            Phase::Playing => "GAME ACTIVE",
        }
    }

    /// `(score_line, status_line)` for the character display
    pub fn display_strings(&self) -> (String, String) {
        (self.score_line(), self.status_line().to_string())
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(GameRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Play points for `side`, sitting out each pause
    fn play_points(state: &mut MatchState, side: Side, count: u32, now: &mut Instant) {
        for _ in 0..count {
            state.award_point(side, *now).unwrap();
            *now += state.rules().point_delay();
            state.advance(*now);
        }
    }

    #[test]
    fn test_initial_state() {
        let state = MatchState::default();
        assert_eq!(state.scores(), (0, 0));
        assert_eq!(state.status(), MatchStatus::Playing);
        assert_eq!(state.winner(), None);
        assert_eq!(
            state.display_strings(),
            ("L:00 - R:00".to_string(), "GAME ACTIVE".to_string())
        );
    }

    #[test]
    fn test_award_point_pauses() {
        let mut state = MatchState::default();
        let t0 = Instant::now();

        assert_eq!(state.award_point(Side::Right, t0), Ok(PointOutcome::Paused));
        assert_eq!(state.scores(), (0, 1));
        assert_eq!(state.phase(), Phase::PointPaused { since: t0 });
        assert_eq!(state.status_line(), "POINT PAUSED");
    }

    #[test]
    fn test_award_point_rejected_while_paused() {
        let mut state = MatchState::default();
        let t0 = Instant::now();
        state.award_point(Side::Left, t0).unwrap();

        let result = state.award_point(Side::Left, t0 + ms(10));

        assert_eq!(result, Err(TransitionError::NotPlaying(MatchStatus::PointPaused)));
        assert_eq!(state.scores(), (1, 0));
        assert_eq!(state.phase(), Phase::PointPaused { since: t0 });
    }

    #[test]
    fn test_pause_ends_at_point_delay() {
        let mut state = MatchState::default();
        let t0 = Instant::now();
        state.award_point(Side::Left, t0).unwrap();

        assert_eq!(state.advance(t0 + ms(1999)), None);
        assert!(state.phase().is_paused());
        assert_eq!(state.pause_remaining(t0 + ms(1500)), Some(ms(500)));

        assert_eq!(state.advance(t0 + ms(2000)), Some(PhaseChange::Resumed));
        assert!(state.phase().is_playing());
        assert_eq!(state.pause_remaining(t0 + ms(2000)), None);
    }

    #[test]
    fn test_match_point_goes_straight_to_game_over() {
        let mut state = MatchState::default();
        let mut now = Instant::now();
        play_points(&mut state, Side::Left, 8, &mut now);
        play_points(&mut state, Side::Right, 11, &mut now);
        assert_eq!(state.scores(), (8, 11));
        assert!(state.phase().is_over());

        // 11-8 already wins; check a closer finish instead
        let mut state = MatchState::default();
        let mut now = Instant::now();
        play_points(&mut state, Side::Left, 10, &mut now);
        play_points(&mut state, Side::Right, 11, &mut now);
        assert_eq!(state.scores(), (10, 11));
        assert!(state.phase().is_playing());

        let outcome = state.award_point(Side::Right, now).unwrap();
        assert_eq!(outcome, PointOutcome::MatchWon { winner: Side::Right });
        assert_eq!(state.phase(), Phase::GameOver { since: now, winner: Side::Right });
        assert_eq!(state.status(), MatchStatus::GameOver);
        assert_eq!(state.status_line(), "RIGHT PLAYER WON!");
    }

    #[test]
    fn test_deuce_continues() {
        let mut state = MatchState::default();
        let mut now = Instant::now();
        play_points(&mut state, Side::Left, 10, &mut now);
        play_points(&mut state, Side::Right, 10, &mut now);
        play_points(&mut state, Side::Left, 1, &mut now);

        assert_eq!(state.scores(), (11, 10));
        assert!(state.phase().is_playing());
    }

    #[test]
    fn test_game_over_rejects_points_until_restart() {
        let mut state = MatchState::default();
        let mut now = Instant::now();
        play_points(&mut state, Side::Left, 10, &mut now);
        let game_over_at = now;
        state.award_point(Side::Left, game_over_at).unwrap();
        assert_eq!(state.winner(), Some(Side::Left));

        let result = state.award_point(Side::Right, game_over_at + ms(100));
        assert_eq!(result, Err(TransitionError::NotPlaying(MatchStatus::GameOver)));
        assert_eq!(state.scores(), (11, 0));

        // The point delay never resumes a finished match
        assert_eq!(state.advance(game_over_at + ms(2000)), None);
        assert!(state.phase().is_over());

        assert_eq!(state.advance(game_over_at + ms(4999)), None);
        assert_eq!(state.restart_remaining(game_over_at + ms(4000)), Some(ms(1000)));

        assert_eq!(state.advance(game_over_at + ms(5000)), Some(PhaseChange::Restarted));
        assert_eq!(state.scores(), (0, 0));
        assert_eq!(state.status(), MatchStatus::Playing);
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_score_sum_matches_accepted_points() {
        let mut state = MatchState::default();
        let mut now = Instant::now();
        let sequence = [
            Side::Left, Side::Right, Side::Right, Side::Left, Side::Left,
            Side::Right, Side::Left, Side::Left, Side::Right, Side::Left,
        ];

        let mut accepted = 0;
        let mut previous = (0, 0);
        for side in sequence {
            // Every other attempt lands during the pause and must be rejected
            if state.award_point(side, now).is_ok() {
                accepted += 1;
            }
            assert!(state.award_point(side.opposite(), now).is_err());

            let (left, right) = state.scores();
            assert!(left >= previous.0 && right >= previous.1);
            assert_eq!(left + right, accepted);
            previous = (left, right);

            now += ms(2000);
            state.advance(now);
        }
        assert_eq!(accepted, sequence.len() as u32);
    }

    #[test]
    fn test_score_line_format() {
        let mut state = MatchState::default();
        let mut now = Instant::now();
        play_points(&mut state, Side::Left, 3, &mut now);
        play_points(&mut state, Side::Right, 10, &mut now);

        assert_eq!(state.score_line(), "L:03 - R:10");
    }

    #[test]
    fn test_transition_error_display() {
        let err = TransitionError::NotPlaying(MatchStatus::GameOver);
        assert_eq!(err.to_string(), "Cannot award a point while GAME_OVER");
    }
}
