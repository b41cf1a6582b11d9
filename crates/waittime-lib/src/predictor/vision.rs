//! Image-to-queue-size seam
//!
//! Counting people in an image is delegated to an external detector. The
//! predictor only sees the resulting count.

use crate::error::Result;
use async_trait::async_trait;

/// Safety cap on detected people, noisy detections can report absurd counts
pub const DEFAULT_MAX_PEOPLE: u32 = 500;

/// Counts people visible in an encoded image
#[async_trait]
pub trait PeopleCounter: Send + Sync {
    async fn count_people(&self, image: &[u8]) -> Result<u32>;
}

/// Counter that always reports the same number of people
///
/// Useful for demos and for driving the image endpoint without a detector.
#[derive(Debug, Clone, Copy)]
pub struct FixedPeopleCounter {
    count: u32,
}

impl FixedPeopleCounter {
    pub fn new(count: u32) -> Self {
        Self { count }
    }
}

#[async_trait]
impl PeopleCounter for FixedPeopleCounter {
    async fn count_people(&self, _image: &[u8]) -> Result<u32> {
        Ok(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_counter_ignores_image() {
        let counter = FixedPeopleCounter::new(7);
        let count = tokio_test::assert_ok!(counter.count_people(b"").await);
        assert_eq!(count, 7);
        assert_eq!(counter.count_people(&[0xff, 0xd8, 0xff]).await.unwrap(), 7);
    }
}
