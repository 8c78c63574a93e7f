pub mod shutdown;
pub mod timer;
pub mod watch;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use shutdown::detect_shutdown;
use timer::{pause_timer, reset_timer, resume_timer, start_timer, timer_status};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use watch::{process_watch_command, WatchCommand};

use crate::{
    presenter::elapsed::format_elapsed,
    storage::timer_storage::TimerStorageImpl,
    utils::clock::{Clock, DefaultClock},
};

#[derive(Parser, Debug)]
#[command(name = "Tickwise", version, long_about = None)]
#[command(about = "Terminal time tracker with a live elapsed-time display", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level, e.g. debug or trace")]
    pub log: Option<LevelFilter>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console", global = true)]
    pub log_console: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start a new timer, replacing the current one")]
    Start {},
    #[command(about = "Pause the running timer")]
    Pause {},
    #[command(about = "Resume the paused timer")]
    Resume {},
    #[command(about = "Forget the current timer")]
    Reset {},
    #[command(about = "Print the elapsed time of the current timer")]
    Status {
        #[arg(long = "no-hours", help = "Drop the hours field while it is zero")]
        no_hours: bool,
    },
    #[command(about = "Print the elapsed time every second until interrupted")]
    Watch {
        #[command(flatten)]
        command: WatchCommand,
    },
    #[command(about = "Format a number of seconds the way timers are displayed")]
    Format {
        seconds: u64,
        #[arg(long = "no-hours", help = "Drop the hours field while it is zero")]
        no_hours: bool,
    },
}

pub async fn run_cli(args: Args, app_dir: PathBuf) -> Result<()> {
    let storage = TimerStorageImpl::new(app_dir)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    match args.commands {
        Commands::Start {} => {
            start_timer(&storage, &clock).await?;
            println!("{}", timer_status(&storage, &clock, true).await?);
            Ok(())
        }
        Commands::Pause {} => {
            let state = pause_timer(&storage, &clock).await?;
            println!("Paused at {}", format_elapsed(state.accumulated_duration, true));
            Ok(())
        }
        Commands::Resume {} => {
            let state = resume_timer(&storage, &clock).await?;
            println!("Resumed from {}", format_elapsed(state.accumulated_duration, true));
            Ok(())
        }
        Commands::Reset {} => reset_timer(&storage).await,
        Commands::Status { no_hours } => {
            println!("{}", timer_status(&storage, &clock, !no_hours).await?);
            Ok(())
        }
        Commands::Watch { command } => {
            let shutdown = CancellationToken::new();
            let mut stdout = std::io::stdout();
            let (_, result) = tokio::join!(detect_shutdown(shutdown.clone()), async {
                let result =
                    process_watch_command(command, &storage, clock, shutdown.clone(), &mut stdout)
                        .await;
                shutdown.cancel();
                result
            });
            result
        }
        Commands::Format { seconds, no_hours } => {
            println!("{}", format_elapsed(seconds, !no_hours));
            Ok(())
        }
    }
}
