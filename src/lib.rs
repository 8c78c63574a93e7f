//! Small time tracker for the terminal. A timer is started, paused and resumed from the command
//! line, and its elapsed time is rendered by [presenter::ElapsedPresenter], which refreshes once
//! per second while the timer runs.

pub mod cli;
pub mod presenter;
pub mod storage;
pub mod utils;
