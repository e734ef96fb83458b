//! Rotating status messages while a request is in flight.
//!
//! Purely cosmetic: the messages are not tied to the request's real progress.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

pub const PROCESSING_MESSAGES: [&str; 5] = [
    "Analyzing your photo...",
    "Identifying the item...",
    "Estimating condition and value...",
    "Writing your listings...",
    "Almost there...",
];

pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(2);

/// Message shown after `elapsed`; wraps around.
pub fn message_at(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_millis() / MESSAGE_INTERVAL.as_millis()) as usize;
    PROCESSING_MESSAGES[index % PROCESSING_MESSAGES.len()]
}

/// Drive `work` to completion, calling `on_message` with the first message
/// immediately and the next one every `MESSAGE_INTERVAL`.
pub async fn with_progress<F, T>(work: F, mut on_message: impl FnMut(&str)) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(work);

    let start = Instant::now();
    let mut interval = tokio::time::interval_at(start, MESSAGE_INTERVAL);

    loop {
        tokio::select! {
            output = &mut work => return output,
            tick = interval.tick() => on_message(message_at(tick.duration_since(start))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_at_rotates_every_interval() {
        assert_eq!(message_at(Duration::ZERO), "Analyzing your photo...");
        assert_eq!(message_at(Duration::from_millis(1999)), "Analyzing your photo...");
        assert_eq!(message_at(Duration::from_secs(2)), "Identifying the item...");
        assert_eq!(message_at(Duration::from_secs(9)), "Almost there...");
        assert_eq!(message_at(Duration::from_secs(10)), "Analyzing your photo...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_progress_reports_while_waiting() {
        let mut seen = Vec::new();

        let output = with_progress(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            },
            |msg| seen.push(msg.to_string()),
        )
        .await;

        assert_eq!(output, "done");
        assert_eq!(
            seen,
            vec![
                "Analyzing your photo...",
                "Identifying the item...",
                "Estimating condition and value...",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_progress_wraps_on_long_requests() {
        let mut seen = Vec::new();

        with_progress(tokio::time::sleep(Duration::from_secs(11)), |msg| {
            seen.push(msg.to_string())
        })
        .await;

        assert_eq!(seen.len(), 6);
        assert_eq!(seen[4], "Almost there...");
        assert_eq!(seen[5], "Analyzing your photo...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_progress_returns_immediately_ready_work() {
        let mut count = 0;
        let output = with_progress(async { 42 }, |_| count += 1).await;

        assert_eq!(output, 42);
        assert!(count <= 1);
    }
}
