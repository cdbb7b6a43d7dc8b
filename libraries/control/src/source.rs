use std::sync::Arc;
use std::time::{Duration, Instant};

use hal::{AttitudeEstimate, Share};

use crate::error::ControlError;

/// Where an axis controller gets its current angle from
pub trait EstimateSource {
    /// Current angle in degrees. May block, but only for a bounded time.
    fn sample(&mut self) -> Result<AttitudeEstimate, ControlError>;
}

impl<S: EstimateSource + ?Sized> EstimateSource for &mut S {
    fn sample(&mut self) -> Result<AttitudeEstimate, ControlError> {
        (**self).sample()
    }
}

/// Consumes estimates from a [`Share`], blocking until one is published
pub struct ShareSource {
    share: Arc<Share<AttitudeEstimate>>,
    timeout: Duration,
    max_age: Duration,
}

impl ShareSource {
    pub fn new(share: Arc<Share<AttitudeEstimate>>, timeout: Duration, max_age: Duration) -> Self {
        Self {
            share,
            timeout,
            max_age,
        }
    }
}

impl EstimateSource for ShareSource {
    fn sample(&mut self) -> Result<AttitudeEstimate, ControlError> {
        let stamped = self.share.take_timeout(self.timeout)?;
        let age = stamped.age(Instant::now());
        if age > self.max_age {
            log::warn!(
                "{} estimate #{} is {:?} old, discarding",
                self.share.name(),
                stamped.sequence,
                age
            );
            return Err(ControlError::StaleEstimate {
                age,
                limit: self.max_age,
            });
        }
        Ok(stamped.value)
    }
}
