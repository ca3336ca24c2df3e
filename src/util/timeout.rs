//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::TwinError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, TwinError>>,
) -> Result<T, TwinError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TwinError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_future_maps_to_timeout() {
        let result: Result<(), TwinError> = with_timeout(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(TwinError::Timeout(20))));
    }

    #[tokio::test]
    async fn fast_future_passes_through() {
        let value = with_timeout(Duration::from_secs(1), async { Ok::<_, TwinError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
