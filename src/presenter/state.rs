use anyhow::{bail, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::parse_timestamp;

/// Snapshot of a timer. `accumulated_duration` holds the whole seconds of every running interval
/// that has already been closed, the current one excluded.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accumulated_duration: u64,
    #[serde(default = "running_by_default")]
    pub is_running: bool,
}

fn running_by_default() -> bool {
    true
}

impl TimerState {
    /// A fresh timer whose first interval opens at `now`.
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            end_time: None,
            accumulated_duration: 0,
            is_running: true,
        }
    }

    /// Whole seconds of the open interval. Skipped (zero) while paused, and a start in the future
    /// counts as zero rather than going negative.
    pub fn current_session_seconds(&self, now: DateTime<Utc>) -> u64 {
        if !self.is_running {
            return 0;
        }
        let millis = (now - self.start_time).num_milliseconds();
        u64::try_from(millis.div_euclid(1000)).unwrap_or(0)
    }

    /// Closes the open interval and folds it into the accumulated duration.
    pub fn pause(self, now: DateTime<Utc>) -> Result<Self> {
        if !self.is_running {
            bail!("Timer is already paused");
        }
        let accumulated_duration = self
            .accumulated_duration
            .saturating_add(self.current_session_seconds(now));
        Ok(Self {
            end_time: Some(now),
            accumulated_duration,
            is_running: false,
            ..self
        })
    }

    /// Opens a new interval at `now`, keeping what was accumulated so far.
    pub fn resume(self, now: DateTime<Utc>) -> Result<Self> {
        if self.is_running {
            bail!("Timer is already running");
        }
        Ok(Self {
            start_time: now,
            end_time: None,
            is_running: true,
            ..self
        })
    }
}

/// Timer state as it arrives from the outside world, before the timestamps are interpreted.
#[derive(PartialEq, Eq, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimerState {
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub accumulated_duration: Option<u64>,
    #[serde(default)]
    pub is_running: Option<bool>,
}

impl RawTimerState {
    /// Validates the raw fields. A timestamp that can't be interpreted is an error, never a zero
    /// duration.
    pub fn parse(self, now: DateTime<Local>) -> Result<TimerState> {
        let start_time = parse_timestamp(&self.start_time, now)
            .map_err(|e| e.context("Invalid start time"))?;
        let end_time = self
            .end_time
            .map(|end| parse_timestamp(&end, now).map_err(|e| e.context("Invalid end time")))
            .transpose()?;
        Ok(TimerState {
            start_time,
            end_time,
            accumulated_duration: self.accumulated_duration.unwrap_or(0),
            is_running: self.is_running.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, Local, TimeZone, Utc};

    use super::{RawTimerState, TimerState};

    fn test_start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn current_session_floors_milliseconds() {
        let state = TimerState::started(test_start());
        assert_eq!(
            state.current_session_seconds(test_start() + Duration::milliseconds(4999)),
            4
        );
        assert_eq!(
            state.current_session_seconds(test_start() + Duration::milliseconds(5000)),
            5
        );
    }

    #[test]
    fn current_session_ignores_future_start() {
        let state = TimerState::started(test_start());
        assert_eq!(
            state.current_session_seconds(test_start() - Duration::milliseconds(1500)),
            0
        );
    }

    #[test]
    fn pause_then_resume_carries_interval() -> Result<()> {
        let state = TimerState {
            accumulated_duration: 30,
            ..TimerState::started(test_start())
        };

        let paused = state.pause(test_start() + Duration::seconds(90))?;
        assert!(!paused.is_running);
        assert_eq!(paused.accumulated_duration, 120);
        assert_eq!(paused.end_time, Some(test_start() + Duration::seconds(90)));

        let resumed = paused.resume(test_start() + Duration::hours(1))?;
        assert!(resumed.is_running);
        assert_eq!(resumed.accumulated_duration, 120);
        assert_eq!(resumed.start_time, test_start() + Duration::hours(1));
        assert_eq!(resumed.end_time, None);
        Ok(())
    }

    #[test]
    fn pause_saturates_huge_accumulated_duration() -> Result<()> {
        let state = TimerState {
            accumulated_duration: u64::MAX,
            ..TimerState::started(test_start())
        };

        let paused = state.pause(test_start() + Duration::seconds(5))?;
        assert_eq!(paused.accumulated_duration, u64::MAX);
        Ok(())
    }

    #[test]
    fn transitions_reject_wrong_state() {
        let running = TimerState::started(test_start());
        assert!(running.clone().resume(test_start()).is_err());

        let paused = running.pause(test_start()).unwrap();
        assert!(paused.pause(test_start()).is_err());
    }

    #[test]
    fn raw_state_defaults() -> Result<()> {
        let raw: RawTimerState =
            serde_json::from_str(r#"{"startTime": "2024-04-05T12:00:00Z"}"#)?;
        let state = raw.parse(Local::now())?;
        assert_eq!(state, TimerState::started(test_start()));
        Ok(())
    }

    #[test]
    fn raw_state_rejects_invalid_start() {
        let raw = RawTimerState {
            start_time: "definitely not a date".into(),
            end_time: None,
            accumulated_duration: Some(10),
            is_running: Some(false),
        };
        let error = raw.parse(Local::now()).unwrap_err();
        assert!(format!("{error:#}").contains("Invalid start time"));
    }

    #[test]
    fn raw_state_rejects_invalid_end() {
        let raw = RawTimerState {
            start_time: "2024-04-05T12:00:00Z".into(),
            end_time: Some("???".into()),
            accumulated_duration: None,
            is_running: Some(false),
        };
        assert!(raw.parse(Local::now()).is_err());
    }

    #[test]
    fn state_serializes_camel_case() -> Result<()> {
        let json = serde_json::to_value(TimerState::started(test_start()))?;
        assert_eq!(json["accumulatedDuration"], 0);
        assert_eq!(json["isRunning"], true);
        assert!(json["endTime"].is_null());
        Ok(())
    }
}
