use bddap_config::Settings;
use bddap_utils::cancel::CancellationToken;
use bddap_utils::error::BddapError;
use std::future::Future;

/// Per-call timeout and cancellation shared by the simulator and generator.
#[derive(Debug, Clone)]
pub(crate) struct CallGuard<'a> {
    pub settings: &'a Settings,
    pub cancel: &'a CancellationToken,
}

impl CallGuard<'_> {
    /// Await `fut`, failing with `BddapError::Timeout` if the configured
    /// per-call timeout elapses first.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T, BddapError>
    where
        F: Future<Output = Result<T, BddapError>>,
    {
        match self.settings.call_timeout {
            None => fut.await,
            Some(duration) => tokio::time::timeout(duration, fut).await.map_err(|_| {
                BddapError::Timeout {
                    operation: operation.to_string(),
                    duration,
                }
            })?,
        }
    }

    pub fn checkpoint(&self, operation: &str) -> Result<(), BddapError> {
        self.cancel.check(operation)
    }

    /// Units in flight at once, never zero.
    pub fn concurrency(&self) -> usize {
        self.settings.max_concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_call_without_timeout_passes_through() {
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        let guard = CallGuard {
            settings: &settings,
            cancel: &cancel,
        };
        let value = guard.call("op", async { Ok::<_, BddapError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_call_times_out() {
        let settings = Settings {
            call_timeout: Some(Duration::from_millis(50)),
            ..Settings::default()
        };
        let cancel = CancellationToken::new();
        let guard = CallGuard {
            settings: &settings,
            cancel: &cancel,
        };
        let result = guard
            .call("send_message", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, BddapError>(())
            })
            .await;
        match result {
            Err(BddapError::Timeout { operation, duration }) => {
                assert_eq!(operation, "send_message");
                assert_eq!(duration, Duration::from_millis(50));
            }
            other => panic!("Expected Timeout, got {other:?}"),
        }
    }
}
