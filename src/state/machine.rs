//! Focus/break timer state machine
//!
//! `TimerMachine` owns the `TimerState` and is the only thing that mutates it.
//! Every operation is a synchronous, infallible mutation that returns the side
//! effects the owner must carry out (ticking, notifications, delayed starts).
//! Keeping the effects as data keeps the machine free of I/O and lets the
//! owner decide how and where they run.

use std::time::Duration;
use tracing::{debug, info};

use super::timer_state::{clamp_break_minutes, clamp_focus_minutes, Phase, TimerState};

/// Delay before a freshly entered break starts counting down
pub const BREAK_AUTOSTART_DELAY: Duration = Duration::from_millis(300);
/// Delay before an auto-looped focus phase starts after a break
pub const AUTO_LOOP_DELAY: Duration = Duration::from_millis(500);
/// The ongoing notification is refreshed on multiples of this many seconds
pub const NOTIFICATION_REFRESH_SECONDS: u32 = 5;

/// Which countdown a delayed start resumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredStart {
    Break,
    Focus,
}

/// Side effect requested by a state machine operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Begin delivering one tick per second
    StartTicking,
    /// Stop delivering ticks before the operation returns
    StopTicking,
    /// Post the ongoing "timer" notification
    PostActive { remaining_seconds: u32 },
    /// Refresh the ongoing notification
    UpdateActive { remaining_seconds: u32, sticky: bool },
    /// One-shot "focus complete" alert
    PostCompletion,
    DismissAll,
    /// Call `run_deferred(start, epoch)` after `delay`
    Defer {
        delay: Duration,
        start: DeferredStart,
        epoch: u64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TimerMachine {
    state: TimerState,
    /// Bumped by every user cancellation so stale delayed starts are dropped
    epoch: u64,
}

impl TimerMachine {
    pub fn new(state: TimerState) -> Self {
        Self { state, epoch: 0 }
    }

    /// Rebuild the machine from a persisted state.
    ///
    /// The countdown never resumes on its own, and an interrupted break comes
    /// back as the idle focus baseline since the break lock is not re-entered
    /// without the countdown that releases it.
    pub fn restore(saved: TimerState) -> Self {
        let mut state = saved.with_flags_cleared().sanitized();
        if state.is_break {
            info!("Discarding interrupted break from previous run");
            state.is_break = false;
            state.remaining_seconds = state.focus_seconds();
        }
        Self::new(state)
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start (or resume) the countdown.
    ///
    /// A second call while running changes nothing. In a break that is not
    /// counting yet, this starts the break countdown.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state.is_running {
            debug!("Start ignored, timer already running");
            return Vec::new();
        }
        if self.state.is_break {
            return self.start_break();
        }

        if !self.state.is_paused {
            self.state.remaining_seconds = self.state.focus_seconds();
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        info!("Focus started with {}s remaining", self.state.remaining_seconds);

        vec![
            Effect::StartTicking,
            Effect::PostActive {
                remaining_seconds: self.state.remaining_seconds,
            },
        ]
    }

    /// Pause a running focus countdown.
    ///
    /// Breaks cannot be paused: the break lock only exits through its countdown.
    pub fn pause(&mut self) -> Vec<Effect> {
        if !self.state.is_running {
            debug!("Pause ignored, timer not running");
            return Vec::new();
        }
        if self.state.is_break {
            debug!("Pause ignored, break lock active");
            return Vec::new();
        }

        self.epoch += 1;
        self.state.is_running = false;
        self.state.is_paused = true;
        info!("Timer paused with {}s remaining", self.state.remaining_seconds);

        vec![
            Effect::StopTicking,
            Effect::UpdateActive {
                remaining_seconds: self.state.remaining_seconds,
                sticky: false,
            },
        ]
    }

    /// Return to the idle focus baseline from any state
    pub fn reset(&mut self) -> Vec<Effect> {
        self.epoch += 1;
        self.state.is_running = false;
        self.state.is_paused = false;
        self.state.is_break = false;
        self.state.remaining_seconds = self.state.focus_seconds();
        info!("Timer reset");

        vec![Effect::StopTicking, Effect::DismissAll]
    }

    /// Apply new durations, clamped to `[1, 120]` and `[1, 30]` minutes.
    ///
    /// The remaining time is left alone while a countdown is running or a break
    /// is pending; otherwise it snaps to the new focus duration.
    pub fn update_settings(&mut self, focus_minutes: i64, break_minutes: i64) -> Vec<Effect> {
        self.state.focus_duration = clamp_focus_minutes(focus_minutes);
        self.state.break_duration = clamp_break_minutes(break_minutes);

        if !self.state.is_running && !self.state.is_break {
            self.state.remaining_seconds = self.state.focus_seconds();
        }
        info!(
            "Settings updated: focus={}min break={}min",
            self.state.focus_duration, self.state.break_duration
        );
        Vec::new()
    }

    pub fn toggle_auto_loop(&mut self) -> Vec<Effect> {
        self.state.is_auto_loop = !self.state.is_auto_loop;
        info!("Auto-loop set to: {}", self.state.is_auto_loop);
        Vec::new()
    }

    /// One second elapsed
    pub fn tick(&mut self) -> Vec<Effect> {
        if !self.state.is_running {
            return Vec::new();
        }

        if self.state.remaining_seconds <= 1 {
            return if self.state.is_break {
                self.complete_break()
            } else {
                self.complete_focus()
            };
        }

        self.state.remaining_seconds -= 1;
        debug!("Tick: {}s remaining", self.state.remaining_seconds);

        if self.state.remaining_seconds % NOTIFICATION_REFRESH_SECONDS == 0 {
            vec![Effect::UpdateActive {
                remaining_seconds: self.state.remaining_seconds,
                sticky: true,
            }]
        } else {
            Vec::new()
        }
    }

    /// The break lock finished its countdown.
    ///
    /// Ends the break the same way a natural completion does, without the
    /// auto-loop restart. Outside a break this does nothing, so it converges
    /// with the tick path whichever arrives first.
    pub fn on_break_complete(&mut self) -> Vec<Effect> {
        if !self.state.is_break {
            debug!("Break completion ignored, no break in progress");
            return Vec::new();
        }

        self.epoch += 1;
        self.end_break();
        info!("Break ended by break lock");
        vec![Effect::StopTicking]
    }

    /// Run a delayed start scheduled through `Effect::Defer`.
    ///
    /// Dropped when a reset, pause or forced break completion happened since
    /// it was scheduled.
    pub fn run_deferred(&mut self, start: DeferredStart, epoch: u64) -> Vec<Effect> {
        if epoch != self.epoch {
            debug!("Dropping stale {:?} start", start);
            return Vec::new();
        }
        match start {
            DeferredStart::Break => self.start_break(),
            DeferredStart::Focus => self.start_focus(),
        }
    }

    fn complete_focus(&mut self) -> Vec<Effect> {
        self.state.session_count += 1;
        self.state.is_running = false;
        self.state.is_paused = false;
        self.state.is_break = true;
        self.state.remaining_seconds = self.state.break_seconds();
        info!(
            "Focus session {} complete, break of {}s",
            self.state.session_count, self.state.remaining_seconds
        );

        vec![
            Effect::StopTicking,
            Effect::PostCompletion,
            Effect::Defer {
                delay: BREAK_AUTOSTART_DELAY,
                start: DeferredStart::Break,
                epoch: self.epoch,
            },
        ]
    }

    fn complete_break(&mut self) -> Vec<Effect> {
        self.end_break();
        info!("Break complete");

        let mut effects = vec![Effect::StopTicking];
        if self.state.is_auto_loop {
            effects.push(Effect::Defer {
                delay: AUTO_LOOP_DELAY,
                start: DeferredStart::Focus,
                epoch: self.epoch,
            });
        }
        effects
    }

    fn end_break(&mut self) {
        self.state.is_running = false;
        self.state.is_paused = false;
        self.state.is_break = false;
        self.state.remaining_seconds = self.state.focus_seconds();
    }

    fn start_break(&mut self) -> Vec<Effect> {
        if self.state.is_running || !self.state.is_break {
            return Vec::new();
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        info!("Break countdown started with {}s", self.state.remaining_seconds);
        vec![Effect::StartTicking]
    }

    fn start_focus(&mut self) -> Vec<Effect> {
        if self.state.is_running || self.state.is_break {
            return Vec::new();
        }
        self.state.is_running = true;
        self.state.is_paused = false;
        self.state.remaining_seconds = self.state.focus_seconds();
        info!("Auto-loop focus started with {}s", self.state.remaining_seconds);

        vec![
            Effect::StartTicking,
            Effect::PostActive {
                remaining_seconds: self.state.remaining_seconds,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_minute_machine(auto_loop: bool) -> TimerMachine {
        let mut machine = TimerMachine::default();
        machine.update_settings(1, 1);
        if auto_loop {
            machine.toggle_auto_loop();
        }
        machine
    }

    fn tick_times(machine: &mut TimerMachine, times: usize) {
        for _ in 0..times {
            machine.tick();
        }
    }

    fn deferred(effects: &[Effect]) -> Option<(DeferredStart, u64)> {
        effects.iter().find_map(|effect| match effect {
            Effect::Defer { start, epoch, .. } => Some((*start, *epoch)),
            _ => None,
        })
    }

    fn assert_invariants(machine: &TimerMachine) {
        let state = machine.state();
        assert!(!(state.is_running && state.is_paused));
        assert!(state.remaining_seconds <= state.max_remaining_seconds());
    }

    #[test]
    fn test_start_from_idle() {
        let mut machine = TimerMachine::default();
        let effects = machine.start();

        assert_eq!(
            effects,
            vec![
                Effect::StartTicking,
                Effect::PostActive { remaining_seconds: 1500 }
            ]
        );
        assert!(machine.state().is_running);
        assert_eq!(machine.phase(), Phase::Focus);
    }

    #[test]
    fn test_start_twice_is_idempotent() {
        let mut machine = TimerMachine::default();
        machine.start();
        let once = machine.state().clone();

        assert!(machine.start().is_empty());
        assert_eq!(machine.state(), &once);
    }

    #[test]
    fn test_full_focus_cycle() {
        let mut machine = one_minute_machine(false);
        machine.start();

        tick_times(&mut machine, 59);
        assert_eq!(machine.state().remaining_seconds, 1);

        let effects = machine.tick();
        assert_eq!(machine.phase(), Phase::Break);
        assert_eq!(machine.state().remaining_seconds, 60);
        assert_eq!(machine.state().session_count, 1);
        assert!(effects.contains(&Effect::StopTicking));
        assert!(effects.contains(&Effect::PostCompletion));

        let (start, epoch) = deferred(&effects).unwrap();
        assert_eq!(start, DeferredStart::Break);
        assert_eq!(machine.run_deferred(start, epoch), vec![Effect::StartTicking]);
        assert!(machine.state().is_running);

        tick_times(&mut machine, 59);
        assert_eq!(machine.state().remaining_seconds, 1);

        let effects = machine.tick();
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.state().remaining_seconds, 60);
        assert!(!machine.state().is_running);
        assert!(deferred(&effects).is_none());
        assert_invariants(&machine);
    }

    #[test]
    fn test_auto_loop_restarts_focus() {
        let mut machine = one_minute_machine(true);
        machine.start();
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();
        machine.run_deferred(start, epoch);
        tick_times(&mut machine, 59);

        let (start, epoch) = deferred(&machine.tick()).unwrap();
        assert_eq!(start, DeferredStart::Focus);
        let effects = machine.run_deferred(start, epoch);

        assert!(effects.contains(&Effect::StartTicking));
        assert_eq!(machine.phase(), Phase::Focus);
        assert!(machine.state().is_running);
        assert_eq!(machine.state().remaining_seconds, 60);
    }

    #[test]
    fn test_pause_resume_preserves_remaining() {
        let mut machine = TimerMachine::default();
        machine.start();
        tick_times(&mut machine, 10);

        let effects = machine.pause();
        assert!(effects.contains(&Effect::StopTicking));
        assert!(!machine.state().is_running);
        assert!(machine.state().is_paused);
        assert_eq!(machine.state().remaining_seconds, 1490);

        machine.start();
        assert!(machine.state().is_running);
        assert!(!machine.state().is_paused);
        assert_eq!(machine.state().remaining_seconds, 1490);
    }

    #[test]
    fn test_settings_change_while_idle_resets_countdown() {
        let mut machine = TimerMachine::default();
        machine.update_settings(10, 5);
        assert_eq!(machine.state().remaining_seconds, 600);
    }

    #[test]
    fn test_settings_change_while_running_keeps_countdown() {
        let mut machine = TimerMachine::default();
        machine.start();
        tick_times(&mut machine, 3);
        machine.update_settings(10, 5);

        assert_eq!(machine.state().remaining_seconds, 1497);
        assert_eq!(machine.state().focus_duration, 10);
    }

    #[test]
    fn test_settings_are_clamped() {
        let mut machine = TimerMachine::default();
        machine.update_settings(0, 50);
        assert_eq!(machine.state().focus_duration, 1);
        assert_eq!(machine.state().break_duration, 30);
    }

    #[test]
    fn test_reset_cancels_pending_break_start() {
        let mut machine = one_minute_machine(false);
        machine.start();
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();

        assert_eq!(machine.reset(), vec![Effect::StopTicking, Effect::DismissAll]);
        assert!(machine.run_deferred(start, epoch).is_empty());
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.state().remaining_seconds, 60);
    }

    #[test]
    fn test_break_cannot_be_paused() {
        let mut machine = one_minute_machine(false);
        machine.start();
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();
        machine.run_deferred(start, epoch);

        assert!(machine.pause().is_empty());
        assert!(machine.state().is_running);
        assert_eq!(machine.phase(), Phase::Break);
    }

    #[test]
    fn test_break_complete_converges_with_tick_path() {
        let mut forced = one_minute_machine(false);
        forced.start();
        tick_times(&mut forced, 59);
        let (start, epoch) = deferred(&forced.tick()).unwrap();
        forced.run_deferred(start, epoch);
        tick_times(&mut forced, 10);

        let mut natural = forced.clone();
        tick_times(&mut natural, 50);

        assert_eq!(forced.on_break_complete(), vec![Effect::StopTicking]);
        assert_eq!(forced.state(), natural.state());

        // A second signal after the transition changes nothing.
        assert!(forced.on_break_complete().is_empty());
        assert_eq!(forced.state(), natural.state());
    }

    #[test]
    fn test_break_complete_does_not_stop_auto_looped_focus() {
        let mut machine = one_minute_machine(true);
        machine.start();
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();
        machine.run_deferred(start, epoch);
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();
        machine.run_deferred(start, epoch);

        assert!(machine.on_break_complete().is_empty());
        assert!(machine.state().is_running);
    }

    #[test]
    fn test_tick_refreshes_notification_every_five_seconds() {
        let mut machine = TimerMachine::default();
        machine.start();

        let refreshes: Vec<u32> = (0..10)
            .flat_map(|_| machine.tick())
            .filter_map(|effect| match effect {
                Effect::UpdateActive { remaining_seconds, .. } => Some(remaining_seconds),
                _ => None,
            })
            .collect();

        assert_eq!(refreshes, vec![1495, 1490]);
    }

    #[test]
    fn test_tick_while_stopped_is_noop() {
        let mut machine = TimerMachine::default();
        assert!(machine.tick().is_empty());
        assert_eq!(machine.state(), &TimerState::new());
    }

    #[test]
    fn test_start_during_pending_break_runs_break() {
        let mut machine = one_minute_machine(false);
        machine.start();
        tick_times(&mut machine, 59);
        let (start, epoch) = deferred(&machine.tick()).unwrap();

        assert_eq!(machine.start(), vec![Effect::StartTicking]);
        assert_eq!(machine.state().remaining_seconds, 60);
        // The delayed start then finds the break already counting.
        assert!(machine.run_deferred(start, epoch).is_empty());
    }

    #[test]
    fn test_restore_clears_flags_and_interrupted_break() {
        let saved = TimerState {
            focus_duration: 30,
            remaining_seconds: 120,
            is_running: true,
            is_break: true,
            session_count: 4,
            ..TimerState::new()
        };
        let machine = TimerMachine::restore(saved);

        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.state().remaining_seconds, 1800);
        assert_eq!(machine.state().session_count, 4);
    }

    #[test]
    fn test_invariants_hold_over_long_run() {
        let mut machine = one_minute_machine(true);
        machine.start();
        for step in 0..400 {
            let effects = match step % 97 {
                13 => machine.pause(),
                14 => machine.start(),
                50 => machine.start(),
                _ => machine.tick(),
            };
            if let Some((start, epoch)) = deferred(&effects) {
                machine.run_deferred(start, epoch);
            }
            assert_invariants(&machine);
        }
        assert!(machine.state().session_count >= 2);
    }
}
