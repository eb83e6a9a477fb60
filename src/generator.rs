use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::models::Generation;

/// Default simulated round-trip, matching a plausible inference latency.
pub const DEFAULT_DELAY_MS: u64 = 3000;

/// Produces a preview image reference for a parameter snapshot.
///
/// The trait is the seam for swapping the simulator out for a real inference
/// client later without touching the handlers.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_preview(&self, params: &Generation) -> String;
}

/// Stand-in for a real inference call: wait a fixed delay, then hand back a
/// randomized placeholder image URL. Never fails, never retries.
pub struct SimulatedGenerator {
    delay: Duration,
}

impl SimulatedGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay from `GENERATION_DELAY_MS`, falling back to the default.
    pub fn from_env() -> Self {
        let ms = std::env::var("GENERATION_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DELAY_MS);
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl ImageGenerator for SimulatedGenerator {
    async fn generate_preview(&self, params: &Generation) -> String {
        info!(
            "🎨 Simulating {} generation at {} ({} steps)",
            params.model, params.resolution, params.steps
        );
        tokio::time::sleep(self.delay).await;
        let nonce: u32 = rand::thread_rng().gen();
        format!("https://picsum.photos/200?random={nonce}")
    }
}

/// At most one generation may be in flight; the flag takes the place of the
/// form's disabled submit button. No queue — a second attempt is rejected.
#[derive(Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    /// Claims the flag, or returns `None` if a generation is already running.
    /// The claim is released when the guard drops.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn simulator_waits_the_configured_delay() {
        let generator = SimulatedGenerator::new(Duration::from_secs(3));
        let before = tokio::time::Instant::now();
        let preview = generator.generate_preview(&Generation::default()).await;
        assert!(before.elapsed() >= Duration::from_secs(3));
        assert!(preview.starts_with("https://picsum.photos/200?random="));
    }

    #[test]
    fn busy_flag_admits_one_claim_at_a_time() {
        let busy = BusyFlag::default();
        let guard = busy.try_acquire().expect("flag should be free");
        assert!(busy.is_busy());
        assert!(busy.try_acquire().is_none());
        drop(guard);
        assert!(!busy.is_busy());
        assert!(busy.try_acquire().is_some());
    }
}
