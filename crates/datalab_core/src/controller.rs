//! Manual stepping, batch training and timed auto-play over one trajectory.
//!
//! Auto-play is cooperative: the host calls [`StepController::poll`] from its
//! own timer or frame loop and the controller decides whether a tick is due.
//! Pausing only drops the logical timer, so a pause that lands before the
//! first due time leaves the trajectory untouched.

use crate::clock::Clock;
use crate::config;
use crate::error::{DemoError, Result};
use crate::traits::StepRule;
use crate::trajectory::{StepResult, Trajectory};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Stepping,
    AutoPlaying,
}

/// When a timed run ends on its own.
pub enum StopCondition {
    MaxSteps(usize),
    /// Stop on the demo's own convergence rule, or after `cap` steps.
    UntilConverged { cap: usize },
    Predicate {
        predicate: Box<dyn Fn(&StepResult) -> bool>,
        cap: usize,
    },
}

impl StopCondition {
    pub fn until_converged() -> Self {
        StopCondition::UntilConverged {
            cap: config::DEFAULT_AUTOPLAY_CAP,
        }
    }

    pub fn predicate(predicate: impl Fn(&StepResult) -> bool + 'static, cap: usize) -> Self {
        StopCondition::Predicate {
            predicate: Box::new(predicate),
            cap,
        }
    }

    fn cap(&self) -> usize {
        match self {
            StopCondition::MaxSteps(n) => *n,
            StopCondition::UntilConverged { cap } | StopCondition::Predicate { cap, .. } => *cap,
        }
    }
}

impl fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCondition::MaxSteps(n) => f.debug_tuple("MaxSteps").field(n).finish(),
            StopCondition::UntilConverged { cap } => {
                f.debug_struct("UntilConverged").field("cap", cap).finish()
            }
            StopCondition::Predicate { cap, .. } => f
                .debug_struct("Predicate")
                .field("cap", cap)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    StepLimit,
    Converged,
    /// The rule cannot step any further (end of an input sequence).
    Completed,
}

/// A logical timer. Stale handles are simply ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerHandle {
    pub id: u64,
    pub due_ms: f64,
}

/// What a poll did, for whoever redraws the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    Stepped { step: StepResult },
    Finished { step: StepResult, reason: FinishReason },
}

#[derive(Debug)]
struct AutoPlay {
    handle: TimerHandle,
    interval_ms: f64,
    stop: StopCondition,
    steps_taken: usize,
}

/// Owns one demo instance: its rule, frozen settings and trajectory.
#[derive(Debug)]
pub struct StepController<R: StepRule> {
    rule: R,
    settings: R::Settings,
    initial: StepResult,
    trajectory: Trajectory,
    run_state: RunState,
    autoplay: Option<AutoPlay>,
    next_timer_id: u64,
}

impl<R: StepRule> StepController<R> {
    pub fn new(rule: R, settings: R::Settings) -> Result<Self> {
        rule.validate(&settings)?;
        let initial = rule.initial_state(&settings)?;
        Ok(Self {
            trajectory: Trajectory::new(initial.clone()),
            rule,
            settings,
            initial,
            run_state: RunState::Idle,
            autoplay: None,
            next_timer_id: 0,
        })
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn settings(&self) -> &R::Settings {
        &self.settings
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn current(&self) -> &StepResult {
        self.trajectory.current()
    }

    pub fn history(&self) -> &[StepResult] {
        self.trajectory.history()
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn converged(&self) -> bool {
        self.rule.converged(self.current(), &self.settings)
    }

    fn ensure_not_playing(&self, request: &str) -> Result<()> {
        if self.run_state == RunState::AutoPlaying {
            warn!("{request} rejected: auto-play in progress");
            return Err(DemoError::RunInProgress);
        }
        Ok(())
    }

    /// Replaces the settings and restarts the trajectory from the new initial
    /// state. Nothing changes if validation fails.
    pub fn set_settings(&mut self, settings: R::Settings) -> Result<()> {
        self.ensure_not_playing("settings change")?;
        if let Err(err) = self.rule.validate(&settings) {
            warn!("settings rejected: {err}");
            return Err(err);
        }
        let initial = self.rule.initial_state(&settings)?;
        self.settings = settings;
        self.initial = initial;
        self.trajectory.reset(self.initial.clone());
        info!("settings updated; trajectory restarted");
        Ok(())
    }

    fn next_state(&self, previous: &StepResult) -> Result<StepResult> {
        let next = self.rule.step(previous, &self.settings)?;
        if next.params.len() != self.trajectory.dimension() {
            return Err(DemoError::mismatch(
                "step result",
                self.trajectory.dimension(),
                next.params.len(),
            ));
        }
        Ok(next)
    }

    fn advance(&mut self) -> Result<StepResult> {
        let next = self.next_state(self.trajectory.current())?;
        self.trajectory.append(next.clone())?;
        debug!(
            "step {}: params={:?} loss={:?}",
            next.iteration,
            next.params.as_slice(),
            next.loss
        );
        Ok(next)
    }

    /// One synchronous step from the trajectory tail.
    pub fn step(&mut self) -> Result<StepResult> {
        self.ensure_not_playing("step")?;
        self.run_state = RunState::Stepping;
        let result = self.advance();
        self.run_state = RunState::Idle;
        result
    }

    /// Applies `epochs` steps back to back. Either all of them land in the
    /// trajectory or none do.
    pub fn train_epochs(&mut self, epochs: usize) -> Result<Vec<StepResult>> {
        self.ensure_not_playing("train")?;
        config::non_zero_count("epochs", epochs)?;

        self.run_state = RunState::Stepping;
        let batch = self.compute_batch(epochs);
        self.run_state = RunState::Idle;
        let batch = batch?;

        for step in &batch {
            self.trajectory.append(step.clone())?;
        }
        info!(
            "trained {epochs} epochs; iteration={}",
            self.trajectory.iteration()
        );
        Ok(batch)
    }

    fn compute_batch(&self, epochs: usize) -> Result<Vec<StepResult>> {
        let mut batch: Vec<StepResult> = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            let previous = batch.last().unwrap_or_else(|| self.trajectory.current());
            let next = self.next_state(previous)?;
            batch.push(next);
        }
        Ok(batch)
    }

    /// Starts a timed run. The first step is due one interval from now.
    pub fn auto_play(
        &mut self,
        interval_ms: f64,
        stop: StopCondition,
        clock: &impl Clock,
    ) -> Result<TimerHandle> {
        self.ensure_not_playing("auto-play")?;
        config::positive("interval_ms", interval_ms)?;
        config::non_zero_count("max_steps", stop.cap())?;

        self.next_timer_id += 1;
        let handle = TimerHandle {
            id: self.next_timer_id,
            due_ms: clock.now_ms() + interval_ms,
        };
        info!("auto-play started: interval={interval_ms}ms stop={stop:?}");
        self.autoplay = Some(AutoPlay {
            handle,
            interval_ms,
            stop,
            steps_taken: 0,
        });
        self.run_state = RunState::AutoPlaying;
        Ok(handle)
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.autoplay
            .as_ref()
            .is_some_and(|play| play.handle.id == handle.id)
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.autoplay.as_ref().map(|play| play.handle.due_ms)
    }

    /// Performs at most one step if the active timer is due.
    ///
    /// A failing step ends the run and leaves the trajectory as it was.
    pub fn poll(&mut self, clock: &impl Clock) -> Result<Option<ControllerEvent>> {
        let now = clock.now_ms();
        match &self.autoplay {
            Some(play) if now >= play.handle.due_ms => {}
            _ => return Ok(None),
        }

        let step = match self.advance() {
            Ok(step) => step,
            Err(err) => {
                warn!("auto-play stopped by error: {err}");
                self.stop_autoplay();
                return Err(err);
            }
        };

        let Some(play) = self.autoplay.as_mut() else {
            return Ok(None);
        };
        play.steps_taken += 1;

        let satisfied = match &play.stop {
            StopCondition::MaxSteps(_) => false,
            StopCondition::UntilConverged { .. } => self.rule.converged(&step, &self.settings),
            StopCondition::Predicate { predicate, .. } => predicate(&step),
        };
        let reason = if self.rule.exhausted(&step, &self.settings) {
            Some(FinishReason::Completed)
        } else if satisfied {
            Some(FinishReason::Converged)
        } else if play.steps_taken >= play.stop.cap() {
            Some(FinishReason::StepLimit)
        } else {
            None
        };

        if let Some(reason) = reason {
            info!(
                "auto-play finished after {} steps: {reason:?}",
                play.steps_taken
            );
            self.stop_autoplay();
            return Ok(Some(ControllerEvent::Finished { step, reason }));
        }

        // A host that fell behind gets one step now, not a burst.
        let mut due = play.handle.due_ms + play.interval_ms;
        if due <= now {
            due = now + play.interval_ms;
        }
        play.handle.due_ms = due;
        Ok(Some(ControllerEvent::Stepped { step }))
    }

    fn stop_autoplay(&mut self) {
        self.autoplay = None;
        self.run_state = RunState::Idle;
    }

    /// Cancels the active timer. Returns whether a run was in progress.
    pub fn pause(&mut self) -> bool {
        if self.autoplay.is_none() {
            return false;
        }
        info!("auto-play paused at iteration {}", self.trajectory.iteration());
        self.stop_autoplay();
        true
    }

    /// Pauses if needed and restarts from the initial state.
    pub fn reset(&mut self) {
        self.pause();
        self.trajectory.reset(self.initial.clone());
        self.run_state = RunState::Idle;
        info!("reset to initial state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backprop::{BackpropSettings, TwoLayerNetwork};
    use crate::clock::ManualClock;
    use crate::descent::{DescentSettings, GradientDescent, Parabola};
    use crate::recurrent::{RecurrentCell, RecurrentSettings};

    fn descent() -> StepController<GradientDescent<Parabola>> {
        StepController::new(GradientDescent::default(), DescentSettings::default())
            .expect("controller")
    }

    #[test]
    fn manual_steps_append_to_the_trajectory() {
        let mut controller = descent();
        let first = controller.step().expect("step");
        assert!((first.params[0] - 6.4).abs() < 1e-12);
        let second = controller.step().expect("step");
        assert!((second.params[0] - 5.12).abs() < 1e-12);
        assert_eq!(controller.history().len(), 3);
        assert_eq!(controller.run_state(), RunState::Idle);
    }

    #[test]
    fn invalid_settings_are_rejected_up_front() {
        let bad = DescentSettings {
            learning_rate: 0.0,
            ..DescentSettings::default()
        };
        assert!(StepController::new(GradientDescent::<Parabola>::default(), bad).is_err());

        let mut controller = descent();
        controller.step().expect("step");
        assert!(controller.set_settings(bad).is_err());
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.settings(), &DescentSettings::default());
    }

    #[test]
    fn accepted_settings_restart_the_trajectory() {
        let mut controller = descent();
        controller.train_epochs(3).expect("train");
        controller
            .set_settings(DescentSettings {
                initial_position: -2.0,
                ..DescentSettings::default()
            })
            .expect("settings");
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.current().params[0], -2.0);
    }

    #[test]
    fn train_epochs_matches_repeated_steps() {
        let mut batched = descent();
        let mut stepped = descent();
        let batch = batched.train_epochs(5).expect("train");
        for _ in 0..5 {
            stepped.step().expect("step");
        }
        assert_eq!(batch.len(), 5);
        assert_eq!(batched.history(), stepped.history());
        assert!(batched.train_epochs(0).is_err());
    }

    #[test]
    fn failed_batch_leaves_trajectory_untouched() {
        let mut controller =
            StepController::new(RecurrentCell, RecurrentSettings::default()).expect("controller");
        let err = controller.train_epochs(6).expect_err("sequence is only 5 long");
        assert_eq!(err, DemoError::SequenceExhausted { length: 5 });
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.run_state(), RunState::Idle);

        controller.train_epochs(5).expect("train");
        assert_eq!(controller.history().len(), 6);
        assert!(controller.step().is_err());
        assert_eq!(controller.history().len(), 6);
    }

    #[test]
    fn pause_before_first_tick_executes_nothing() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        let handle = controller
            .auto_play(100.0, StopCondition::MaxSteps(10), &clock)
            .expect("auto-play");
        assert!(controller.is_active(handle));
        assert!(controller.pause());
        assert!(!controller.is_active(handle));

        clock.advance(1_000.0);
        assert_eq!(controller.poll(&clock).expect("poll"), None);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.run_state(), RunState::Idle);
    }

    #[test]
    fn ticks_fire_on_the_interval_until_the_step_limit() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        controller
            .auto_play(100.0, StopCondition::MaxSteps(3), &clock)
            .expect("auto-play");

        clock.set(50.0);
        assert_eq!(controller.poll(&clock).expect("poll"), None);

        clock.set(100.0);
        assert!(matches!(
            controller.poll(&clock).expect("poll"),
            Some(ControllerEvent::Stepped { .. })
        ));
        assert_eq!(controller.next_due_ms(), Some(200.0));

        clock.set(150.0);
        assert_eq!(controller.poll(&clock).expect("poll"), None);

        clock.set(200.0);
        assert!(controller.poll(&clock).expect("poll").is_some());

        clock.set(300.0);
        match controller.poll(&clock).expect("poll") {
            Some(ControllerEvent::Finished { step, reason }) => {
                assert_eq!(reason, FinishReason::StepLimit);
                assert_eq!(step.iteration, 3);
            }
            other => panic!("expected finish, got {other:?}"),
        }
        assert_eq!(controller.run_state(), RunState::Idle);
        assert_eq!(controller.history().len(), 4);
    }

    #[test]
    fn late_polls_do_not_burst() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        controller
            .auto_play(100.0, StopCondition::MaxSteps(50), &clock)
            .expect("auto-play");

        clock.set(1_000.0);
        assert!(controller.poll(&clock).expect("poll").is_some());
        assert_eq!(controller.poll(&clock).expect("poll"), None);
        assert_eq!(controller.next_due_ms(), Some(1_100.0));
        assert_eq!(controller.history().len(), 2);
    }

    #[test]
    fn step_is_rejected_while_playing() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        controller
            .auto_play(100.0, StopCondition::until_converged(), &clock)
            .expect("auto-play");

        assert_eq!(controller.step(), Err(DemoError::RunInProgress));
        assert_eq!(controller.train_epochs(2), Err(DemoError::RunInProgress));
        assert!(matches!(
            controller.auto_play(100.0, StopCondition::MaxSteps(1), &clock),
            Err(DemoError::RunInProgress)
        ));
        assert_eq!(
            controller.set_settings(DescentSettings::default()),
            Err(DemoError::RunInProgress)
        );
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn auto_play_runs_until_converged() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        controller
            .auto_play(10.0, StopCondition::until_converged(), &clock)
            .expect("auto-play");

        let mut finished = None;
        for _ in 0..100 {
            clock.advance(10.0);
            if let Some(ControllerEvent::Finished { reason, .. }) =
                controller.poll(&clock).expect("poll")
            {
                finished = Some(reason);
                break;
            }
        }
        assert_eq!(finished, Some(FinishReason::Converged));
        assert_eq!(controller.current().iteration, 30);
        assert!(controller.converged());
    }

    #[test]
    fn predicate_stop_condition() {
        let clock = ManualClock::new(0.0);
        let mut controller =
            StepController::new(TwoLayerNetwork, BackpropSettings::default()).expect("controller");
        let start_loss = controller.current().loss.expect("loss");
        controller
            .auto_play(
                1.0,
                StopCondition::predicate(move |s| s.loss.is_some_and(|l| l < start_loss), 10),
                &clock,
            )
            .expect("auto-play");
        clock.advance(1.0);
        assert!(matches!(
            controller.poll(&clock).expect("poll"),
            Some(ControllerEvent::Finished {
                reason: FinishReason::Converged,
                ..
            })
        ));
    }

    #[test]
    fn sequence_end_completes_the_run() {
        let clock = ManualClock::new(0.0);
        let mut controller =
            StepController::new(RecurrentCell, RecurrentSettings::default()).expect("controller");
        controller
            .auto_play(5.0, StopCondition::MaxSteps(100), &clock)
            .expect("auto-play");

        let mut last = None;
        for _ in 0..10 {
            clock.advance(5.0);
            if let Some(event) = controller.poll(&clock).expect("poll") {
                last = Some(event);
            }
            if controller.run_state() == RunState::Idle {
                break;
            }
        }
        assert!(matches!(
            last,
            Some(ControllerEvent::Finished {
                reason: FinishReason::Completed,
                ..
            })
        ));
        assert_eq!(controller.history().len(), 6);
    }

    #[test]
    fn invalid_auto_play_arguments() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        assert!(controller
            .auto_play(-5.0, StopCondition::MaxSteps(3), &clock)
            .is_err());
        assert!(controller
            .auto_play(10.0, StopCondition::MaxSteps(0), &clock)
            .is_err());
        assert_eq!(controller.run_state(), RunState::Idle);
    }

    #[test]
    fn reset_pauses_and_is_idempotent() {
        let clock = ManualClock::new(0.0);
        let mut controller = descent();
        controller.train_epochs(4).expect("train");
        controller
            .auto_play(10.0, StopCondition::MaxSteps(5), &clock)
            .expect("auto-play");

        controller.reset();
        assert_eq!(controller.run_state(), RunState::Idle);
        let first = controller.history().to_vec();
        controller.reset();
        assert_eq!(controller.history(), first.as_slice());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].params[0], 8.0);

        clock.advance(100.0);
        assert_eq!(controller.poll(&clock).expect("poll"), None);
    }
}
