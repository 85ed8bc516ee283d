//! Settlement delay strategy. The platform shows fixed "processing" and
//! "verifying" waits that stand in for a confirmation step that never calls
//! out anywhere. Keeping them behind a trait lets tests run with no timers.

use std::time::Duration;

use tokio::time::sleep;

#[allow(async_fn_in_trait)]
pub trait SettlementSimulator {
    async fn processing(&self);
    async fn verifying(&self);
    /// Extra wait on the crypto path only.
    async fn waiting(&self);
}

/// Production delays: real timers, nothing else.
#[derive(Debug, Clone, Copy)]
pub struct TimerSimulator {
    pub processing: Duration,
    pub verifying: Duration,
    pub waiting: Duration,
}

impl Default for TimerSimulator {
    fn default() -> Self {
        Self {
            processing: Duration::from_millis(1800),
            verifying: Duration::from_millis(1200),
            waiting: Duration::from_millis(800),
        }
    }
}

impl TimerSimulator {
    /// Zero-length delays. Handy for wiring the real type into tests.
    pub fn zero() -> Self {
        Self {
            processing: Duration::ZERO,
            verifying: Duration::ZERO,
            waiting: Duration::ZERO,
        }
    }
}

impl SettlementSimulator for TimerSimulator {
    async fn processing(&self) {
        sleep(self.processing).await;
    }

    async fn verifying(&self) {
        sleep(self.verifying).await;
    }

    async fn waiting(&self) {
        sleep(self.waiting).await;
    }
}

/// No-op simulator for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSimulator;

impl SettlementSimulator for InstantSimulator {
    async fn processing(&self) {}

    async fn verifying(&self) {}

    async fn waiting(&self) {}
}
