/// Scoring event dispatch
///
/// Turns per-frame detections into at most one scoring event per tick:
/// the ball has to sit in a half's scoring zone for the dwell threshold
/// before the opposite side is credited.
use std::time::Instant;

use super::dwell::DwellTimers;
use super::match_state::{MatchState, PhaseChange, PointOutcome, TransitionError};
use super::rules::GameRules;
use super::side::{Side, SideMap};
use crate::detection::Detection;
use crate::messaging::GameEvent;

/// Per-side observations for one tick
pub type Observations = SideMap<Option<Detection>>;

pub struct Scorekeeper {
    state: MatchState,
    dwell: DwellTimers,
    min_area: f32,
}

impl Scorekeeper {
    /// Detections smaller than `min_area` count as "not found"
    pub fn new(rules: GameRules, min_area: f32) -> Self {
        Self {
            state: MatchState::new(rules),
            dwell: DwellTimers::new(),
            min_area,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn dwell(&self) -> &DwellTimers {
        &self.dwell
    }

    pub fn min_area(&self) -> f32 {
        self.min_area
    }

    /// Whether the observation puts the ball in the scoring zone right now
    fn in_zone(&self, detection: Option<&Detection>) -> bool {
        let Some(detection) = detection else {
            return false;
        };

        detection.is_confident(self.min_area)
            && detection.y > self.state.rules().bottom_threshold
            && self.state.phase().is_playing()
    }

    /// Process one frame's worth of observations
    pub fn tick(&mut self, now: Instant, observations: &Observations) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if let Some(change) = self.state.advance(now) {
            self.dwell.clear_all();
            events.push(match change {
                PhaseChange::Resumed => GameEvent::PointResumed { at: now },
                PhaseChange::Restarted => GameEvent::MatchRestarted { at: now },
            });
        }

        for side in Side::ALL {
            let in_zone = self.in_zone(observations[side].as_ref());
            let previous = self.dwell.started_at(side);
            let dwell = self.dwell.evaluate(side, in_zone, now);

            match (previous, dwell) {
                (None, Some(_)) => {
                    tracing::debug!("Dwell started on {} half", side);
                    events.push(GameEvent::DwellStarted { side, at: now });
                }
                (Some(started), None) => {
                    let after = now.saturating_duration_since(started);
                    tracing::debug!("Dwell cancelled on {} half after {:?}", side, after);
                    events.push(GameEvent::DwellCancelled { side, after });
                }
                _ => {}
            }

            let Some(elapsed) = dwell else {
                continue;
            };
            if elapsed < self.state.rules().dwell_threshold() {
                continue;
            }

            // Ball settled on this half: the opponent takes the point
            match self.award_point(side.opposite(), now) {
                Ok(scored) => events.extend(scored),
                Err(e) => tracing::warn!("Dropped scoring event from {} half: {}", side, e),
            }
        }

        events
    }

    /// Credit `scorer` and consume every running dwell
    pub fn award_point(
        &mut self,
        scorer: Side,
        now: Instant,
    ) -> Result<Vec<GameEvent>, TransitionError> {
        let outcome = self.state.award_point(scorer, now)?;
        self.dwell.clear_all();

        let (left, right) = self.state.scores();
        let mut events = vec![GameEvent::PointScored {
            scorer,
            left,
            right,
            at: now,
        }];
        if let PointOutcome::MatchWon { winner } = outcome {
            events.push(GameEvent::MatchWon {
                winner,
                left,
                right,
                at: now,
            });
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::match_state::MatchStatus;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn ball_at(y: f32) -> Option<Detection> {
        Some(Detection { x: 100.0, y, area: 900.0 })
    }

    fn left_only(detection: Option<Detection>) -> Observations {
        SideMap::new(detection, None)
    }

    fn keeper() -> Scorekeeper {
        Scorekeeper::new(GameRules::default(), 300.0)
    }

    #[test]
    fn test_ball_above_zone_never_scores() {
        let mut keeper = keeper();
        let t0 = Instant::now();

        for step in 0..50 {
            let events = keeper.tick(t0 + ms(step * 100), &left_only(ball_at(399.0)));
            assert!(events.is_empty());
        }
        assert_eq!(keeper.state().scores(), (0, 0));
        assert!(!keeper.dwell().is_running(Side::Left));
    }

    #[test]
    fn test_zone_boundary_is_exclusive() {
        let mut keeper = keeper();
        let t0 = Instant::now();

        keeper.tick(t0, &left_only(ball_at(400.0)));
        assert!(!keeper.dwell().is_running(Side::Left));

        keeper.tick(t0, &left_only(ball_at(400.5)));
        assert!(keeper.dwell().is_running(Side::Left));
    }

    #[test]
    fn test_small_blob_is_ignored() {
        let mut keeper = keeper();
        let t0 = Instant::now();
        let faint = Some(Detection { x: 10.0, y: 450.0, area: 299.0 });
        let exact = Some(Detection { x: 10.0, y: 450.0, area: 300.0 });

        keeper.tick(t0, &left_only(faint));
        assert!(!keeper.dwell().is_running(Side::Left));

        keeper.tick(t0, &left_only(exact));
        assert!(keeper.dwell().is_running(Side::Left));
    }

    #[test]
    fn test_dwell_on_left_scores_for_right() {
        let mut keeper = keeper();
        let t0 = Instant::now();

        let events = keeper.tick(t0, &left_only(ball_at(450.0)));
        assert_eq!(events, vec![GameEvent::DwellStarted { side: Side::Left, at: t0 }]);

        assert!(keeper.tick(t0 + ms(1499), &left_only(ball_at(450.0))).is_empty());

        let scored_at = t0 + ms(1500);
        let events = keeper.tick(scored_at, &left_only(ball_at(450.0)));
        assert_eq!(
            events,
            vec![GameEvent::PointScored {
                scorer: Side::Right,
                left: 0,
                right: 1,
                at: scored_at,
            }]
        );
        assert_eq!(keeper.state().status(), MatchStatus::PointPaused);
        assert!(!keeper.dwell().is_running(Side::Left));
    }

    #[test]
    fn test_no_rescoring_during_pause() {
        let mut keeper = keeper();
        let t0 = Instant::now();

        for step in 0..=35u64 {
            keeper.tick(t0 + ms(step * 100), &left_only(ball_at(450.0)));
        }
        // Scored at 1.5s, paused until 3.5s, dwell restarts at 3.5s
        assert_eq!(keeper.state().scores(), (0, 1));
        assert_eq!(keeper.state().status(), MatchStatus::Playing);
        assert_eq!(keeper.dwell().started_at(Side::Left), Some(t0 + ms(3500)));
    }

    #[test]
    fn test_resume_clears_timers_and_reports() {
        let mut keeper = keeper();
        let t0 = Instant::now();
        keeper.award_point(Side::Left, t0).unwrap();

        let resume_at = t0 + ms(2000);
        let events = keeper.tick(resume_at, &SideMap::default());

        assert_eq!(events, vec![GameEvent::PointResumed { at: resume_at }]);
        assert!(!keeper.dwell().is_running(Side::Left));
        assert!(!keeper.dwell().is_running(Side::Right));
    }

    #[test]
    fn test_leaving_zone_cancels_dwell() {
        let mut keeper = keeper();
        let t0 = Instant::now();

        keeper.tick(t0, &left_only(ball_at(450.0)));
        let events = keeper.tick(t0 + ms(800), &left_only(ball_at(200.0)));

        assert_eq!(
            events,
            vec![GameEvent::DwellCancelled { side: Side::Left, after: ms(800) }]
        );
    }

    #[test]
    fn test_one_point_per_tick_when_both_halves_dwell() {
        let mut keeper = keeper();
        let t0 = Instant::now();
        let both = SideMap::new(ball_at(450.0), ball_at(450.0));

        keeper.tick(t0, &both);
        let events = keeper.tick(t0 + ms(1600), &both);

        let points = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PointScored { .. }))
            .count();
        assert_eq!(points, 1);
        // Left half is evaluated first, so right scores
        assert_eq!(keeper.state().scores(), (0, 1));
        assert!(!keeper.dwell().is_running(Side::Right));
    }

    #[test]
    fn test_award_point_rejected_when_not_playing() {
        let mut keeper = keeper();
        let t0 = Instant::now();
        keeper.award_point(Side::Left, t0).unwrap();

        assert!(keeper.award_point(Side::Left, t0 + ms(1)).is_err());
        assert_eq!(keeper.state().scores(), (1, 0));
    }

    #[test]
    fn test_match_won_event() {
        let mut rules = GameRules::default();
        rules.winning_score = 1;
        rules.winning_margin = 1;
        let mut keeper = Scorekeeper::new(rules, 300.0);
        let t0 = Instant::now();

        let events = keeper.award_point(Side::Right, t0).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            GameEvent::MatchWon {
                winner: Side::Right,
                left: 0,
                right: 1,
                at: t0,
            }
        );
    }
}
