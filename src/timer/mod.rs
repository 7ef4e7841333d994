//! Countdown timer for speaking exams.
//!
//! One countdown runs at a time, moving through
//! `Idle -> Information -> Preparation -> Recording -> Completed`.
//! Remaining time is always recomputed from the clock, so a late poll never
//! drifts. Snapshots go out on a watch channel, phase ends on a broadcast.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
  Idle,
  Information,
  Preparation,
  Recording,
  Completed,
}

impl TimerPhase {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "information" => Some(Self::Information),
      "preparation" => Some(Self::Preparation),
      "recording" => Some(Self::Recording),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::Information => "information",
      Self::Preparation => "preparation",
      Self::Recording => "recording",
      Self::Completed => "completed",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
  pub phase: TimerPhase,
  pub remaining: u32,
  pub information_remaining: u32,
  pub preparation_remaining: u32,
  pub recording_remaining: u32,
  pub paused: bool,
}

impl TimerSnapshot {
  fn idle() -> Self {
    Self {
      phase: TimerPhase::Idle,
      remaining: 0,
      information_remaining: 0,
      preparation_remaining: 0,
      recording_remaining: 0,
      paused: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
  PhaseEnded(TimerPhase),
}

#[derive(Debug)]
struct Countdown {
  phase: TimerPhase,
  duration: u32,
  started_at: Instant,
  paused_total: Duration,
  paused_at: Option<Instant>,
}

impl Countdown {
  fn remaining(&self, now: Instant) -> u32 {
    let mut run = now.saturating_duration_since(self.started_at);
    run = run.saturating_sub(self.paused_total);
    if let Some(paused_at) = self.paused_at {
      run = run.saturating_sub(now.saturating_duration_since(paused_at));
    }
    let elapsed = run.as_secs().min(u32::MAX as u64) as u32;
    self.duration.saturating_sub(elapsed)
  }
}

#[derive(Debug)]
struct TimerState {
  active: Option<Countdown>,
  snapshot: TimerSnapshot,
  /// Set when an information phase starts; cleared by reset or when
  /// recording ends
  in_attempt: bool,
}

pub struct SpeakingTimer {
  clock: Arc<dyn Clock>,
  pause_on_hidden: bool,
  state: Mutex<TimerState>,
  snapshots: watch::Sender<TimerSnapshot>,
  events: broadcast::Sender<TimerEvent>,
}

impl SpeakingTimer {
  pub fn new(clock: Arc<dyn Clock>, pause_on_hidden: bool) -> Self {
    let (snapshots, _) = watch::channel(TimerSnapshot::idle());
    let (events, _) = broadcast::channel(16);
    Self {
      clock,
      pause_on_hidden,
      state: Mutex::new(TimerState {
        active: None,
        snapshot: TimerSnapshot::idle(),
        in_attempt: false,
      }),
      snapshots,
      events,
    }
  }

  pub fn system(pause_on_hidden: bool) -> Self {
    Self::new(Arc::new(SystemClock), pause_on_hidden)
  }

  fn lock(&self) -> MutexGuard<'_, TimerState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  fn publish(&self, snapshot: TimerSnapshot) {
    self.snapshots.send_replace(snapshot);
  }

  /// Begin the information phase, discarding any previous state
  pub fn start_information(&self, seconds: u32) {
    self.reset();
    self.start(TimerPhase::Information, seconds);
  }

  pub fn start_preparation(&self, seconds: u32) {
    self.start(TimerPhase::Preparation, seconds);
  }

  pub fn start_recording(&self, seconds: u32) {
    self.start(TimerPhase::Recording, seconds);
  }

  /// Start a phase on request from the exam page. Preparation and recording
  /// are refused unless an attempt was opened by the information phase.
  pub fn start_phase(&self, phase: TimerPhase, seconds: u32) -> bool {
    match phase {
      TimerPhase::Information => self.start_information(seconds),
      TimerPhase::Preparation | TimerPhase::Recording => {
        if !self.in_attempt() {
          tracing::debug!("Speaking timer: {} refused outside an attempt", phase.as_str());
          return false;
        }
        self.start(phase, seconds);
      }
      TimerPhase::Idle | TimerPhase::Completed => self.reset(),
    }
    true
  }

  pub fn in_attempt(&self) -> bool {
    self.lock().in_attempt
  }

  fn start(&self, phase: TimerPhase, seconds: u32) {
    let snapshot = {
      let mut state = self.lock();
      state.active = Some(Countdown {
        phase,
        duration: seconds,
        started_at: self.clock.now(),
        paused_total: Duration::ZERO,
        paused_at: None,
      });
      if phase == TimerPhase::Information {
        state.in_attempt = true;
      }
      state.snapshot.phase = phase;
      state.snapshot.remaining = seconds;
      state.snapshot.paused = false;
      set_phase_remaining(&mut state.snapshot, phase, seconds);
      state.snapshot
    };
    tracing::debug!("Speaking timer: {} for {}s", phase.as_str(), seconds);
    self.publish(snapshot);
  }

  /// Back to idle with every counter at zero
  pub fn reset(&self) {
    {
      let mut state = self.lock();
      state.active = None;
      state.snapshot = TimerSnapshot::idle();
      state.in_attempt = false;
    }
    self.publish(TimerSnapshot::idle());
  }

  /// Recompute remaining time; completes the countdown when it reaches zero
  pub fn poll(&self) -> TimerSnapshot {
    let now = self.clock.now();
    let (snapshot, ended) = {
      let mut state = self.lock();
      let Some(countdown) = state.active.as_ref() else {
        return state.snapshot;
      };
      let phase = countdown.phase;
      let remaining = countdown.remaining(now);
      state.snapshot.remaining = remaining;
      set_phase_remaining(&mut state.snapshot, phase, remaining);

      let ended = if remaining == 0 {
        state.active = None;
        if phase == TimerPhase::Recording {
          state.in_attempt = false;
        }
        state.snapshot.phase = TimerPhase::Completed;
        state.snapshot.paused = false;
        Some(phase)
      } else {
        None
      };
      (state.snapshot, ended)
    };

    self.publish(snapshot);
    if let Some(phase) = ended {
      tracing::debug!("Speaking timer: {} ended", phase.as_str());
      // No subscribers is fine
      let _ = self.events.send(TimerEvent::PhaseEnded(phase));
    }
    snapshot
  }

  pub fn pause(&self) {
    let now = self.clock.now();
    let snapshot = {
      let mut state = self.lock();
      let Some(countdown) = state.active.as_mut() else { return };
      if countdown.paused_at.is_some() {
        return;
      }
      countdown.paused_at = Some(now);
      state.snapshot.paused = true;
      state.snapshot
    };
    self.publish(snapshot);
  }

  pub fn resume(&self) {
    let now = self.clock.now();
    let snapshot = {
      let mut state = self.lock();
      let Some(countdown) = state.active.as_mut() else { return };
      let Some(paused_at) = countdown.paused_at.take() else { return };
      countdown.paused_total += now.saturating_duration_since(paused_at);
      state.snapshot.paused = false;
      state.snapshot
    };
    self.publish(snapshot);
  }

  /// Page visibility change from the browser
  pub fn set_visibility(&self, hidden: bool) {
    if !self.pause_on_hidden {
      return;
    }
    if hidden { self.pause() } else { self.resume() }
  }

  pub fn snapshot(&self) -> TimerSnapshot {
    self.lock().snapshot
  }

  pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
    self.snapshots.subscribe()
  }

  pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
    self.events.subscribe()
  }

  pub fn is_running(&self) -> bool {
    self.lock().active.is_some()
  }
}

fn set_phase_remaining(snapshot: &mut TimerSnapshot, phase: TimerPhase, remaining: u32) {
  match phase {
    TimerPhase::Information => snapshot.information_remaining = remaining,
    TimerPhase::Preparation => snapshot.preparation_remaining = remaining,
    TimerPhase::Recording => snapshot.recording_remaining = remaining,
    TimerPhase::Idle | TimerPhase::Completed => {}
  }
}

/// Poll the timer every `tick` until the handle is aborted
pub fn spawn_driver(timer: Arc<SpeakingTimer>, tick: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
      interval.tick().await;
      if timer.is_running() {
        timer.poll();
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn timer() -> (Arc<ManualClock>, SpeakingTimer) {
    let clock = Arc::new(ManualClock::new());
    let timer = SpeakingTimer::new(clock.clone(), true);
    (clock, timer)
  }

  #[test]
  fn test_thirty_second_countdown_fires_once() {
    let (clock, timer) = timer();
    let mut events = timer.events();
    timer.start_preparation(30);

    for _ in 0..30 {
      clock.advance(Duration::from_secs(1));
      timer.poll();
    }

    let snap = timer.snapshot();
    assert_eq!(snap.remaining, 0);
    assert_eq!(snap.phase, TimerPhase::Completed);
    assert_eq!(events.try_recv().unwrap(), TimerEvent::PhaseEnded(TimerPhase::Preparation));

    clock.advance(Duration::from_secs(5));
    timer.poll();
    assert!(events.try_recv().is_err());
  }

  #[test]
  fn test_remaining_recomputed_from_clock() {
    let (clock, timer) = timer();
    timer.start_recording(45);
    clock.advance(Duration::from_millis(10_900));
    assert_eq!(timer.poll().remaining, 35);
    assert_eq!(timer.snapshot().recording_remaining, 35);
  }

  #[test]
  fn test_start_information_resets_previous_phase() {
    let (clock, timer) = timer();
    timer.start_recording(20);
    clock.advance(Duration::from_secs(3));
    timer.poll();
    timer.start_information(15);
    let snap = timer.snapshot();
    assert_eq!(snap.phase, TimerPhase::Information);
    assert_eq!(snap.recording_remaining, 0);
    assert_eq!(snap.information_remaining, 15);
  }

  #[test]
  fn test_new_phase_replaces_countdown() {
    let (clock, timer) = timer();
    let mut events = timer.events();
    timer.start_information(10);
    clock.advance(Duration::from_secs(4));
    timer.start_preparation(30);
    clock.advance(Duration::from_secs(10));
    let snap = timer.poll();
    assert_eq!(snap.phase, TimerPhase::Preparation);
    assert_eq!(snap.remaining, 20);
    assert!(events.try_recv().is_err());
  }

  #[test]
  fn test_hidden_page_pauses_countdown() {
    let (clock, timer) = timer();
    timer.start_recording(30);
    clock.advance(Duration::from_secs(5));
    timer.set_visibility(true);
    clock.advance(Duration::from_secs(60));
    let snap = timer.poll();
    assert!(snap.paused);
    assert_eq!(snap.remaining, 25);

    timer.set_visibility(false);
    clock.advance(Duration::from_secs(5));
    assert_eq!(timer.poll().remaining, 20);
  }

  #[test]
  fn test_visibility_ignored_when_disabled() {
    let clock = Arc::new(ManualClock::new());
    let timer = SpeakingTimer::new(clock.clone(), false);
    timer.start_recording(30);
    timer.set_visibility(true);
    clock.advance(Duration::from_secs(10));
    assert_eq!(timer.poll().remaining, 20);
  }

  #[test]
  fn test_reset_returns_to_idle() {
    let (_clock, timer) = timer();
    let rx = timer.subscribe();
    timer.start_information(10);
    timer.reset();
    assert_eq!(*rx.borrow(), TimerSnapshot::idle());
    assert!(!timer.is_running());
  }

  #[test]
  fn test_later_phases_need_an_open_attempt() {
    let (clock, timer) = timer();
    assert!(!timer.start_phase(TimerPhase::Recording, 30));
    assert!(!timer.start_phase(TimerPhase::Preparation, 30));
    assert_eq!(timer.snapshot().phase, TimerPhase::Idle);

    assert!(timer.start_phase(TimerPhase::Information, 5));
    assert!(timer.start_phase(TimerPhase::Preparation, 5));
    assert!(timer.start_phase(TimerPhase::Recording, 5));
    clock.advance(Duration::from_secs(5));
    timer.poll();

    // The attempt is over once recording ends
    assert!(!timer.in_attempt());
    assert!(!timer.start_phase(TimerPhase::Recording, 5));
  }

  #[tokio::test]
  async fn test_driver_completes_with_system_clock() {
    let timer = Arc::new(SpeakingTimer::system(true));
    let mut events = timer.events();
    let handle = spawn_driver(timer.clone(), Duration::from_millis(100));
    timer.start_preparation(0);
    let event = events.recv().await.unwrap();
    assert_eq!(event, TimerEvent::PhaseEnded(TimerPhase::Preparation));
    handle.abort();
  }
}
