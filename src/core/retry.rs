use crate::domain::model::ImageRequest;
use crate::domain::ports::ImageGenerator;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use std::time::Duration;

/// 指數退避：每次暫時性失敗後延遲加倍，上限為 `max_delay`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` 代表暫時性錯誤無限重試
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// 呼叫影像生成服務，僅對暫時性錯誤（429、5xx、網路）重試
pub async fn generate_with_retry<G: ImageGenerator + ?Sized>(
    generator: &G,
    request: &ImageRequest,
    policy: &RetryPolicy,
    monitor: Option<&RunMonitor>,
) -> Result<Vec<u8>> {
    let mut delay = policy.initial_delay.min(policy.max_delay);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        tracing::debug!(
            "Sending request for frame {} with size {}",
            request.index,
            request.size
        );

        match generator.generate(request).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.is_retryable() && !policy.exhausted(attempts) => {
                tracing::warn!(
                    "Error while requesting image for frame {}: {}. Retrying in {:.1}s...",
                    request.index,
                    e,
                    delay.as_secs_f64()
                );
                if let Some(monitor) = monitor {
                    monitor.record_retry();
                }
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
            }
            Err(e) => return Err(e.for_frame(request.index)),
        }
    }
}
