use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::chat::SessionStore;

#[derive(Debug)]
pub struct EvictIdleSessions;

#[async_trait]
impl crate::jobs::PeriodicJob for EvictIdleSessions {
    fn interval(&self) -> Duration {
        // Run every minute
        Duration::from_secs(60)
    }

    async fn run_job(&self, sessions: &SessionStore) {
        let evicted = sessions.evict_idle(Instant::now());
        if evicted > 0 {
            tracing::info!(
                "Evicted {} idle chat sessions, {} remaining",
                evicted,
                sessions.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::PeriodicJob;

    #[tokio::test]
    async fn test_run_job_keeps_active_sessions() {
        let sessions = SessionStore::new(Duration::from_secs(60));
        sessions.get_or_create("active");

        EvictIdleSessions.run_job(&sessions).await;
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_run_job_evicts_with_zero_ttl() {
        let sessions = SessionStore::new(Duration::ZERO);
        sessions.get_or_create("stale");
        tokio::time::sleep(Duration::from_millis(5)).await;

        EvictIdleSessions.run_job(&sessions).await;
        assert!(sessions.is_empty());
    }
}
