use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

use crate::presenter::state::TimerState;

pub const TIMER_FILE_NAME: &str = "timer.json";

/// Interface for abstracting storage of the current timer.
pub trait TimerStorage {
    /// Returns the stored timer, `None` if there is none.
    fn load(&self) -> impl Future<Output = Result<Option<TimerState>>>;

    /// Replaces the stored timer.
    fn save(&self, state: &TimerState) -> impl Future<Output = Result<()>>;

    /// Forgets the stored timer. Clearing when nothing is stored is fine.
    fn clear(&self) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> TimerStorage for T
where
    T::Target: TimerStorage,
{
    fn load(&self) -> impl Future<Output = Result<Option<TimerState>>> {
        self.deref().load()
    }

    fn save(&self, state: &TimerState) -> impl Future<Output = Result<()>> {
        self.deref().save(state)
    }

    fn clear(&self) -> impl Future<Output = Result<()>> {
        self.deref().clear()
    }
}

/// The main realization of [TimerStorage].
pub struct TimerStorageImpl {
    path: PathBuf,
}

impl TimerStorageImpl {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            path: dir.join(TIMER_FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimerStorage for TimerStorageImpl {
    async fn load(&self) -> Result<Option<TimerState>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!("Loading timer from {:?}", self.path);

        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        let state = serde_json::from_str::<TimerState>(&content)
            .with_context(|| format!("Timer file {:?} is corrupted", self.path))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &TimerState) -> Result<()> {
        let buffer = serde_json::to_vec(state)?;

        // Truncation waits for the lock so that readers never see a half written file.
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await?;

        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.write_all(&buffer).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        result?;

        debug!("Saved timer {:?}", state);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::presenter::state::TimerState;

    use super::{TimerStorage, TimerStorageImpl};

    fn test_state() -> TimerState {
        TimerState::started(Utc.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn missing_file_means_no_timer() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;

        assert_eq!(storage.load().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn saved_timer_is_loaded_back() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;
        let state = test_state();

        storage.save(&state).await?;

        assert_eq!(storage.load().await?, Some(state));
        Ok(())
    }

    #[tokio::test]
    async fn shorter_save_overwrites_longer_one() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;

        let paused = TimerState {
            accumulated_duration: 123_456_789,
            ..test_state()
        }
        .pause(test_state().start_time + Duration::seconds(3))?;
        storage.save(&paused).await?;

        let fresh = test_state();
        storage.save(&fresh).await?;

        assert_eq!(storage.load().await?, Some(fresh));
        Ok(())
    }

    #[tokio::test]
    async fn corrupted_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;
        std::fs::write(storage.path(), "{\"startTime\": 12")?;

        let error = storage.load().await.unwrap_err();
        assert!(error.to_string().contains("corrupted"));
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_timer() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;

        storage.clear().await?;
        storage.save(&test_state()).await?;
        storage.clear().await?;

        assert_eq!(storage.load().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn storage_reads_the_documented_format() -> Result<()> {
        let dir = tempdir()?;
        let storage = TimerStorageImpl::new(dir.path().to_owned())?;
        std::fs::write(
            storage.path(),
            r#"{"startTime":"2018-07-04T08:00:00Z","endTime":"2018-07-04T09:00:00Z","accumulatedDuration":3600,"isRunning":false}"#,
        )?;

        let state = storage.load().await?.unwrap();
        assert_eq!(state.accumulated_duration, 3600);
        assert!(!state.is_running);
        assert_eq!(state.end_time, Some(test_state().start_time + Duration::hours(1)));
        Ok(())
    }
}
