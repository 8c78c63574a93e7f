//! The elapsed-time presenter. It renders a [TimerState] into a duration string right away and,
//! while the timer runs, once per second after that.
//!
//! Every value is published through a [watch] channel. The periodic tick is a spawned task that
//! only exists while the timer runs. Any input change, a pause, or tearing the presenter down
//! cancels it before anything else happens.

pub mod elapsed;
pub mod state;

use std::{sync::Arc, time::Duration};

use elapsed::{evaluate, PresenterConfig};
use state::TimerState;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, trace, Instrument};

use crate::utils::clock::Clock;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle of the running refresh task.
struct Tick {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Tick {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

pub struct ElapsedPresenter {
    config: PresenterConfig,
    clock: Arc<dyn Clock>,
    display: Arc<watch::Sender<String>>,
    tick: Option<Tick>,
}

impl ElapsedPresenter {
    /// Evaluates `config` immediately and arms the refresh if the timer is running. Has to be
    /// called from within a tokio runtime.
    pub fn mount(config: PresenterConfig, clock: Arc<dyn Clock>) -> Self {
        let (display, _) = watch::channel(evaluate(&config, clock.time()));
        debug!("Mounted presenter {:?}", config);
        let mut presenter = Self {
            config,
            clock,
            display: Arc::new(display),
            tick: None,
        };
        presenter.arm();
        presenter
    }

    /// Replaces the inputs. Any pending tick is cancelled, the new inputs are evaluated right away
    /// and the refresh is re-armed for a running timer. Identical inputs change nothing.
    pub fn update(&mut self, config: PresenterConfig) {
        if config == self.config {
            return;
        }
        self.disarm();
        debug!("Updating presenter {:?}", config);
        self.config = config;
        self.display
            .send_replace(evaluate(&self.config, self.clock.time()));
        self.arm();
    }

    /// Shortcut for [Self::update] that keeps `show_hours`.
    pub fn update_state(&mut self, state: TimerState) {
        let config = PresenterConfig {
            state,
            ..self.config.clone()
        };
        self.update(config);
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Latest rendered value.
    pub fn display(&self) -> String {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.as_ref().is_some_and(|tick| !tick.task.is_finished())
    }

    /// Tears the presenter down. Dropping it has the same effect.
    pub fn unmount(self) {
        debug!("Unmounting presenter");
    }

    fn arm(&mut self) {
        if !self.config.state.is_running {
            return;
        }
        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            run_ticks(
                self.config.clone(),
                self.clock.clone(),
                self.display.clone(),
                cancel.clone(),
            )
            .instrument(debug_span!("Elapsed tick")),
        );
        self.tick = Some(Tick { cancel, task });
    }

    fn disarm(&mut self) {
        if let Some(tick) = self.tick.take() {
            trace!("Cancelling pending tick");
            tick.stop();
        }
    }
}

impl Drop for ElapsedPresenter {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Re-evaluates `config` on every second boundary since the task started. Deadlines are absolute
/// so a slow evaluation doesn't push the following ones.
async fn run_ticks(
    config: PresenterConfig,
    clock: Arc<dyn Clock>,
    display: Arc<watch::Sender<String>>,
    cancel: CancellationToken,
) {
    let mut tick_point = clock.instant();
    loop {
        tick_point += TICK_INTERVAL;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return
            }
            _ = clock.sleep_until(tick_point) => ()
        }

        if cancel.is_cancelled() {
            return;
        }
        let value = evaluate(&config, clock.time());
        trace!("Tick {value}");
        display.send_replace(value);
    }
}
