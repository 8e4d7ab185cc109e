//! Fictitious payment processor.
//!
//! Every call waits for a random latency, then approves or rejects the
//! payment with a fixed probability. Randomness and waiting are injected
//! through [`Entropy`] and [`Pause`] so callers can make runs deterministic.

use std::time::Duration;

use uuid::Uuid;

use crate::schema::{PaymentRequest, PaymentResponse, PaymentStatus};

mod source;

pub use source::{Entropy, Pause, SeededEntropy, ThreadEntropy, TokioPause};
#[cfg(test)]
pub use source::NoPause;

/// Outcome distribution and latency bounds of the simulated processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Policy {
    /// Probability of [`PaymentStatus::Approved`], in `[0, 1]`.
    pub approval_rate: f64,
    /// Inclusive lower latency bound.
    pub latency_min: Duration,
    /// Exclusive upper latency bound; equal to `latency_min` for a fixed latency.
    pub latency_max: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            approval_rate: 0.8,
            latency_min: Duration::from_millis(100),
            latency_max: Duration::from_millis(500),
        }
    }
}

pub struct Simulator {
    policy: Policy,
    entropy: Box<dyn Entropy>,
    pause: Box<dyn Pause>,
}

impl Simulator {
    pub fn new(policy: Policy, entropy: Box<dyn Entropy>, pause: Box<dyn Pause>) -> Self {
        Self {
            policy,
            entropy,
            pause,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Simulates the processor answering a validated payment request.
    ///
    /// Never fails: a rejection is a regular outcome.
    pub async fn process(&self, req: &PaymentRequest) -> PaymentResponse {
        let latency = self.draw_latency();
        self.pause.pause(latency).await;

        let status = self.decide();
        let response = PaymentResponse::new(status, Uuid::new_v4());

        tracing::info!(
            amount = req.monto,
            status = ?response.status,
            transaction_id = %response.transaction_id,
            latency_ms = latency.as_millis() as u64,
            "Simulated transaction processed"
        );

        response
    }

    fn draw_latency(&self) -> Duration {
        let Policy {
            latency_min,
            latency_max,
            ..
        } = self.policy;
        let spread = latency_max.saturating_sub(latency_min);
        latency_min + spread.mul_f64(self.entropy.unit())
    }

    fn decide(&self) -> PaymentStatus {
        if self.entropy.unit() < self.policy.approval_rate {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;

    use super::*;

    // Replays the given draws in order, then repeats the last one
    struct Scripted(Mutex<VecDeque<f64>>);

    impl Scripted {
        fn new(draws: &[f64]) -> Self {
            Self(Mutex::new(draws.iter().copied().collect()))
        }
    }

    impl Entropy for Scripted {
        fn unit(&self) -> f64 {
            let mut draws = self.0.lock().unwrap();
            if draws.len() > 1 {
                draws.pop_front().unwrap()
            } else {
                *draws.front().unwrap()
            }
        }
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            monto: 100.0,
            token_hash: "abcdefghijklmnop".to_string(),
        }
    }

    fn simulator(entropy: impl Entropy + 'static) -> Simulator {
        Simulator::new(Policy::default(), Box::new(entropy), Box::new(NoPause))
    }

    #[tokio::test]
    async fn low_draw_approves() {
        // latency draw, then decision draw
        let sim = simulator(Scripted::new(&[0.5, 0.79]));
        let res = sim.process(&request()).await;
        assert_eq!(res.status, PaymentStatus::Approved);
        assert_eq!(res.message, "Pago aprobado.");
    }

    #[tokio::test]
    async fn high_draw_rejects() {
        let sim = simulator(Scripted::new(&[0.5, 0.8]));
        let res = sim.process(&request()).await;
        assert_eq!(res.status, PaymentStatus::Rejected);
        assert_eq!(res.message, "Pago rechazado (Simulación de fallo 20%).");
    }

    #[test]
    fn latency_spans_policy_bounds() {
        let sim = simulator(Scripted::new(&[0.0]));
        assert_eq!(sim.draw_latency(), Duration::from_millis(100));

        let sim = simulator(Scripted::new(&[0.5]));
        assert_eq!(sim.draw_latency(), Duration::from_millis(300));

        let sim = simulator(SeededEntropy::new(3));
        for _ in 0..1_000 {
            let latency = sim.draw_latency();
            assert!(latency >= Duration::from_millis(100));
            assert!(latency < Duration::from_millis(500));
        }
    }

    #[test]
    fn fixed_latency_when_bounds_match() {
        let policy = Policy {
            latency_min: Duration::from_millis(250),
            latency_max: Duration::from_millis(250),
            ..Policy::default()
        };
        let sim = Simulator::new(policy, Box::new(ThreadEntropy), Box::new(NoPause));
        assert_eq!(sim.draw_latency(), Duration::from_millis(250));
    }

    #[test]
    fn approval_rate_is_close_to_policy() {
        let sim = simulator(SeededEntropy::new(2024));
        let draws = 10_000;
        let approved = (0..draws)
            .filter(|_| sim.decide() == PaymentStatus::Approved)
            .count();
        let rate = approved as f64 / draws as f64;
        assert!((0.78..=0.82).contains(&rate), "approval rate {rate}");
    }

    #[test]
    fn extreme_rates_are_absolute() {
        let always = Policy {
            approval_rate: 1.0,
            ..Policy::default()
        };
        let never = Policy {
            approval_rate: 0.0,
            ..Policy::default()
        };
        let yes = Simulator::new(always, Box::new(ThreadEntropy), Box::new(NoPause));
        let no = Simulator::new(never, Box::new(ThreadEntropy), Box::new(NoPause));
        for _ in 0..500 {
            assert_eq!(yes.decide(), PaymentStatus::Approved);
            assert_eq!(no.decide(), PaymentStatus::Rejected);
        }
    }

    #[tokio::test]
    async fn transaction_ids_are_fresh() {
        let sim = simulator(ThreadEntropy);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let res = sim.process(&request()).await;
            assert_eq!(res.transaction_id.get_version_num(), 4);
            assert!(seen.insert(res.transaction_id));
        }
    }
}
