use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    /// Wall-clock time. Elapsed durations are measured against it.
    fn time(&self) -> DateTime<Utc>;

    /// Monotonic time. Tick deadlines are scheduled against it.
    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
pub mod test_clock {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Wall clock that follows tokio's (possibly paused) time, so `tokio::time::advance` moves
    /// both the monotonic and the wall-clock readings.
    #[derive(Clone)]
    pub struct TestClock {
        pub start_time: DateTime<Utc>,
        pub reference: Instant,
    }

    impl TestClock {
        pub fn starting_at(start_time: DateTime<Utc>) -> Self {
            Self {
                start_time,
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }
}
