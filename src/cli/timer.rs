use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::{
    presenter::{
        elapsed::{evaluate, PresenterConfig},
        state::TimerState,
    },
    storage::timer_storage::TimerStorage,
    utils::clock::Clock,
};

async fn load_existing(storage: &impl TimerStorage) -> Result<TimerState> {
    storage
        .load()
        .await?
        .ok_or_else(|| anyhow!("No timer is running. Start one with `tickwise start`"))
}

/// Starts a new timer, replacing whatever was stored before.
pub async fn start_timer(storage: &impl TimerStorage, clock: &Arc<dyn Clock>) -> Result<TimerState> {
    let state = TimerState::started(clock.time());
    storage.save(&state).await?;
    info!("Started timer at {}", state.start_time);
    Ok(state)
}

pub async fn pause_timer(storage: &impl TimerStorage, clock: &Arc<dyn Clock>) -> Result<TimerState> {
    let state = load_existing(storage).await?.pause(clock.time())?;
    storage.save(&state).await?;
    info!("Paused timer with {}s accumulated", state.accumulated_duration);
    Ok(state)
}

pub async fn resume_timer(storage: &impl TimerStorage, clock: &Arc<dyn Clock>) -> Result<TimerState> {
    let state = load_existing(storage).await?.resume(clock.time())?;
    storage.save(&state).await?;
    info!("Resumed timer at {}", state.start_time);
    Ok(state)
}

pub async fn reset_timer(storage: &impl TimerStorage) -> Result<()> {
    storage.clear().await?;
    info!("Timer reset");
    Ok(())
}

/// A single evaluation of the stored timer.
pub async fn timer_status(
    storage: &impl TimerStorage,
    clock: &Arc<dyn Clock>,
    show_hours: bool,
) -> Result<String> {
    let state = load_existing(storage).await?;
    let config = PresenterConfig::new(state).with_show_hours(show_hours);
    Ok(evaluate(&config, clock.time()))
}
