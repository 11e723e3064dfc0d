use chrono::{serde::ts_milliseconds_option, DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Derived from the persisted flags; never stored on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

/// The single in-progress timer.
///
/// While running, `start_time` is authoritative and elapsed time is
/// `now - start_time`. While paused, `start_time` is absent and
/// `elapsed_time` holds the frozen duration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub is_running: bool,
    #[serde(with = "ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    pub elapsed_time: u64,
    pub session_name: String,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        if self.is_running {
            TimerStatus::Running
        } else if self.elapsed_time > 0 {
            TimerStatus::Paused
        } else {
            TimerStatus::Idle
        }
    }

    /// True when stopping would have anything to record.
    pub fn has_time(&self) -> bool {
        self.is_running || self.elapsed_time > 0
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match (self.is_running, self.start_time) {
            (true, Some(start)) => millis_between(start, now),
            _ => self.elapsed_time,
        }
    }

    /// Idle or Paused -> Running. Back-dates the start so that previously
    /// accumulated time keeps counting.
    pub fn begin(&mut self, session_name: &str, now: DateTime<Utc>) {
        self.start_time = Some(offset_back(now, self.elapsed_time));
        self.is_running = true;
        self.session_name = session_name.to_string();
    }

    /// Running -> Paused. Returns false when the timer was not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running {
            return false;
        }

        self.elapsed_time = self.elapsed_ms(now);
        self.start_time = None;
        self.is_running = false;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Re-anchor a timer restored from storage. The time that passed while
    /// nothing was observing the timer counts as elapsed.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        match (self.is_running, self.start_time) {
            (true, Some(start)) => {
                let gap = millis_between(start, now);
                self.start_time = Some(offset_back(now, gap));
                true
            }
            _ => false,
        }
    }

    /// Repair flag combinations that the state machine never produces.
    /// Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        match (self.is_running, self.start_time) {
            (true, None) => {
                self.is_running = false;
                true
            }
            (false, Some(_)) => {
                self.start_time = None;
                true
            }
            _ => false,
        }
    }
}

/// Read model handed to the presentation layer on every change and tick.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub elapsed_ms: u64,
    pub session_name: String,
    #[serde(with = "ts_milliseconds_option")]
    pub started_at: Option<DateTime<Utc>>,
    pub active_project_id: Option<String>,
}

fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

pub(crate) fn offset_back(now: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    let ms = i64::try_from(ms).unwrap_or(i64::MAX);
    Duration::try_milliseconds(ms)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    #[test]
    fn new_timer_is_idle() {
        let timer = TimerState::new();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert!(!timer.has_time());
        assert_eq!(timer.elapsed_ms(at(10_000)), 0);
    }

    #[test]
    fn elapsed_grows_while_running_and_freezes_while_paused() {
        let mut timer = TimerState::new();
        timer.begin("Draft", t0());
        assert_eq!(timer.status(), TimerStatus::Running);
        assert_eq!(timer.elapsed_ms(at(1_500)), 1_500);
        assert_eq!(timer.elapsed_ms(at(4_000)), 4_000);

        assert!(timer.pause(at(5_000)));
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.start_time, None);
        assert_eq!(timer.elapsed_ms(at(9_000)), 5_000);
        assert_eq!(timer.elapsed_ms(at(90_000)), 5_000);
    }

    #[test]
    fn begin_after_pause_keeps_accumulated_time() {
        let mut timer = TimerState::new();
        timer.begin("Draft", t0());
        timer.pause(at(5_000));

        timer.begin("Draft", at(60_000));

        assert_eq!(timer.start_time, Some(at(55_000)));
        assert_eq!(timer.elapsed_ms(at(62_000)), 7_000);
    }

    #[test]
    fn pause_when_not_running_is_noop() {
        let mut timer = TimerState::new();
        assert!(!timer.pause(at(1_000)));
        assert_eq!(timer, TimerState::new());
    }

    #[test]
    fn resume_counts_the_unobserved_gap() {
        let mut timer = TimerState::new();
        timer.begin("Draft", t0());

        assert!(timer.resume(at(3_600_000)));

        assert_eq!(timer.start_time, Some(t0()));
        assert_eq!(timer.elapsed_ms(at(3_600_000)), 3_600_000);
    }

    #[test]
    fn normalize_repairs_running_without_start() {
        let mut timer = TimerState {
            is_running: true,
            start_time: None,
            elapsed_time: 4_000,
            session_name: "Draft".into(),
        };

        assert!(timer.normalize());
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.elapsed_ms(at(100_000)), 4_000);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Start,
        Pause,
        Stop,
        Reset,
        Wait(i64),
    }

    #[test]
    fn elapsed_monotonic_while_running_and_frozen_while_paused() {
        use Op::*;

        let scripts: &[&[Op]] = &[
            &[Start, Wait(1_000), Pause, Wait(5_000), Start, Wait(2_500), Pause, Wait(9_000), Stop],
            &[Start, Wait(700), Wait(700), Pause, Pause, Start, Start, Wait(300), Reset, Start, Wait(40)],
            &[Pause, Wait(1_000), Start, Wait(60_000), Stop, Wait(1_000), Start, Wait(1), Pause, Reset],
            &[Start, Pause, Start, Pause, Wait(10_000), Start, Wait(1_234), Stop, Stop],
        ];

        for (index, script) in scripts.iter().enumerate() {
            let mut timer = TimerState::new();
            let mut now = t0();
            let mut last = timer.elapsed_ms(now);

            for op in script.iter().copied() {
                let status_before = timer.status();
                match op {
                    Start => {
                        if !timer.is_running {
                            timer.begin("Draft", now);
                        }
                    }
                    Pause => {
                        timer.pause(now);
                    }
                    Stop | Reset => timer.clear(),
                    Wait(ms) => now += Duration::milliseconds(ms),
                }

                let elapsed = timer.elapsed_ms(now);
                match (op, status_before, timer.status()) {
                    (Stop | Reset, _, status) => {
                        assert_eq!(status, TimerStatus::Idle, "script {index} {op:?}");
                        assert_eq!(elapsed, 0, "script {index} {op:?}");
                    }
                    (Wait(_), TimerStatus::Paused, _) | (Wait(_), TimerStatus::Idle, _) => {
                        assert_eq!(elapsed, last, "script {index}: frozen across {op:?}")
                    }
                    (Wait(ms), TimerStatus::Running, _) => {
                        assert_eq!(elapsed, last + ms as u64, "script {index}: {op:?}")
                    }
                    _ => assert_eq!(elapsed, last, "script {index}: {op:?} moved time"),
                }
                last = elapsed;
            }
        }
    }

    #[test]
    fn snapshot_serializes_start_as_epoch_millis() {
        let snapshot = TimerSnapshot {
            status: TimerStatus::Running,
            elapsed_ms: 0,
            session_name: "Draft".into(),
            started_at: Some(t0()),
            active_project_id: None,
        };

        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["startedAt"], serde_json::json!(1_700_000_000_000i64));
        assert_eq!(value["status"], serde_json::json!("running"));
    }

    #[test]
    fn clock_going_backwards_never_underflows() {
        let mut timer = TimerState::new();
        timer.begin("Draft", at(10_000));
        assert_eq!(timer.elapsed_ms(at(5_000)), 0);
    }
}
