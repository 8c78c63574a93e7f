use std::{io::Write, sync::Arc};

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    presenter::{
        elapsed::PresenterConfig,
        state::{RawTimerState, TimerState},
        ElapsedPresenter,
    },
    storage::timer_storage::TimerStorage,
    utils::clock::Clock,
};

#[derive(Debug, Default, Parser)]
pub struct WatchCommand {
    #[arg(
        long = "start",
        short,
        help = "Start of the current interval instead of the stored timer. Examples are \"10 minutes ago\", \"12:00\", \"2025-03-16T12:00:00Z\""
    )]
    pub start_time: Option<String>,
    #[arg(long = "end", short, requires = "start_time", help = "End of the interval")]
    pub end_time: Option<String>,
    #[arg(
        long = "accumulated",
        short,
        requires = "start_time",
        help = "Seconds accumulated by earlier intervals"
    )]
    pub accumulated_duration: Option<u64>,
    #[arg(long, requires = "start_time", help = "Treat the timer as paused")]
    pub paused: bool,
    #[arg(long = "no-hours", help = "Drop the hours field while it is zero")]
    pub no_hours: bool,
}

impl WatchCommand {
    async fn resolve_state(
        self,
        storage: &impl TimerStorage,
        clock: &Arc<dyn Clock>,
    ) -> Result<TimerState> {
        match self.start_time {
            Some(start_time) => RawTimerState {
                start_time,
                end_time: self.end_time,
                accumulated_duration: self.accumulated_duration,
                is_running: Some(!self.paused),
            }
            .parse(clock.time().with_timezone(&Local)),
            None => storage
                .load()
                .await?
                .ok_or_else(|| anyhow!("No timer to watch. Start one with `tickwise start` or pass --start")),
        }
    }
}

/// Prints the timer every time the presenter renders it, until `shutdown` is cancelled. A paused
/// timer is printed once.
pub async fn process_watch_command(
    command: WatchCommand,
    storage: &impl TimerStorage,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    out: &mut impl Write,
) -> Result<()> {
    let show_hours = !command.no_hours;
    let state = command.resolve_state(storage, &clock).await?;
    let config = PresenterConfig::new(state).with_show_hours(show_hours);

    let presenter = ElapsedPresenter::mount(config, clock);
    if !presenter.is_ticking() {
        writeln!(out, "{}", presenter.display())?;
        return Ok(());
    }

    info!("Watching timer");
    let mut values = WatchStream::new(presenter.subscribe());
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Watch interrupted");
                break;
            }
            value = values.next() => {
                let Some(value) = value else {
                    break;
                };
                writeln!(out, "{value}")?;
                out.flush()?;
            }
        }
    }

    presenter.unmount();
    Ok(())
}
