//! Background jobs that run on a fixed interval for the lifetime of
//! the server.

mod evict_sessions;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::chat::SessionStore;

pub use evict_sessions::EvictIdleSessions;

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self, sessions: &SessionStore);
}

/// Run `job` in its own tokio task, waiting `interval` between runs.
pub fn spawn_periodic_job<J: PeriodicJob>(
    sessions: Arc<SessionStore>,
    job: J,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(job.interval());
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            job.run_job(&sessions).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    struct SweepAll;

    #[async_trait]
    impl PeriodicJob for SweepAll {
        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn run_job(&self, sessions: &SessionStore) {
            sessions.evict_idle(Instant::now() + Duration::from_secs(3600));
        }
    }

    #[tokio::test]
    async fn test_spawned_job_runs_against_store() {
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(60)));
        sessions.get_or_create("idle");

        let handle = spawn_periodic_job(Arc::clone(&sessions), SweepAll);
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(sessions.is_empty());
    }
}
