use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)` used for every random decision the
/// simulator makes.
pub trait Entropy: Send + Sync {
    fn unit(&self) -> f64;
}

// Backed by the per-thread generator, never held across an await
#[derive(Debug, Default)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible draws from a seeded `StdRng`.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Entropy for SeededEntropy {
    fn unit(&self) -> f64 {
        // a poisoned lock still holds a usable generator
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen::<f64>()
    }
}

/// Suspends the current request for the simulated processor latency.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

#[derive(Debug, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct NoPause;

#[cfg(test)]
#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_unit_interval() {
        let thread = ThreadEntropy;
        let seeded = SeededEntropy::new(42);
        for _ in 0..1_000 {
            let a = thread.unit();
            let b = seeded.unit();
            assert!((0.0..1.0).contains(&a));
            assert!((0.0..1.0).contains(&b));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let first = SeededEntropy::new(7);
        let second = SeededEntropy::new(7);
        let a: Vec<f64> = (0..16).map(|_| first.unit()).collect();
        let b: Vec<f64> = (0..16).map(|_| second.unit()).collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn no_pause_returns_immediately() {
        let started = std::time::Instant::now();
        NoPause.pause(Duration::from_secs(30)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn tokio_pause_waits() {
        let started = std::time::Instant::now();
        TokioPause.pause(Duration::from_millis(50)).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
