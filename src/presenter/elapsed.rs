use chrono::{DateTime, Utc};

use super::state::TimerState;

const SECONDS_IN_MINUTE: u64 = 60;
const SECONDS_IN_HOUR: u64 = 60 * SECONDS_IN_MINUTE;

/// Everything the presenter renders from.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PresenterConfig {
    pub state: TimerState,
    /// Keep the hours field even when it is zero.
    pub show_hours: bool,
}

impl PresenterConfig {
    pub fn new(state: TimerState) -> Self {
        Self {
            state,
            show_hours: true,
        }
    }

    pub fn with_show_hours(self, show_hours: bool) -> Self {
        Self { show_hours, ..self }
    }
}

/// Total whole seconds accounted for by the timer. A paused timer reports only its accumulated
/// duration, whether or not the interval was closed with an end time.
pub fn elapsed_seconds(state: &TimerState, now: DateTime<Utc>) -> u64 {
    if state.is_running {
        state
            .accumulated_duration
            .saturating_add(state.current_session_seconds(now))
    } else {
        state.accumulated_duration
    }
}

/// `H:MM:SS` when hours are shown or non-zero, `M:SS` otherwise.
pub fn format_elapsed(seconds: u64, show_hours: bool) -> String {
    let hours = seconds / SECONDS_IN_HOUR;
    let minutes = (seconds % SECONDS_IN_HOUR) / SECONDS_IN_MINUTE;
    let seconds = seconds % SECONDS_IN_MINUTE;
    if show_hours || hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn evaluate(config: &PresenterConfig, now: DateTime<Utc>) -> String {
    format_elapsed(elapsed_seconds(&config.state, now), config.show_hours)
}
