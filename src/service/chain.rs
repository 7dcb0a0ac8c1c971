//! Simulated downstream call chain: cart → order → payment.
//!
//! Each stage opens a child span of the current span and sleeps to emulate
//! work. Cart and order call the next stage before their span closes.

use std::time::Duration;
use tokio::time::sleep;

/// Delays applied by the handler and each chain stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTimings {
    /// Delay after the chain returns, before the handler completes.
    pub handler: Duration,
    pub cart: Duration,
    pub order: Duration,
    pub payment: Duration,
}

impl Default for ChainTimings {
    fn default() -> Self {
        Self {
            handler: Duration::from_secs(1),
            cart: Duration::from_secs(2),
            order: Duration::from_secs(1),
            payment: Duration::from_millis(3),
        }
    }
}

impl ChainTimings {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            handler: Duration::ZERO,
            cart: Duration::ZERO,
            order: Duration::ZERO,
            payment: Duration::ZERO,
        }
    }

    /// Multiply every delay by `factor`. Negative or non-finite factors yield zero.
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |d: Duration| {
            if factor.is_finite() && factor > 0.0 {
                d.mul_f64(factor)
            } else {
                Duration::ZERO
            }
        };
        Self {
            handler: scale(self.handler),
            cart: scale(self.cart),
            order: scale(self.order),
            payment: scale(self.payment),
        }
    }

    /// Total time one request spends sleeping.
    pub fn total(&self) -> Duration {
        self.handler + self.cart + self.order + self.payment
    }
}

/// Cart stage: sleeps, then calls [`order`].
#[tracing::instrument(name = "cart", skip_all)]
pub async fn cart(timings: &ChainTimings) {
    sleep(timings.cart).await;
    order(timings).await;
}

/// Order stage: sleeps, then calls [`payment`].
#[tracing::instrument(name = "order", skip_all)]
pub async fn order(timings: &ChainTimings) {
    sleep(timings.order).await;
    payment(timings).await;
}

/// Payment stage, the leaf of the chain.
#[tracing::instrument(name = "payment", skip_all)]
pub async fn payment(timings: &ChainTimings) {
    sleep(timings.payment).await;
}
