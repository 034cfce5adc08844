//! Blocking utilities for CPU-intensive operations.
//!
//! Chart rasterization and PNG encoding run here so they do not stall the
//! async runtime while network stages are in flight.

use crate::Error;

/// Execute a CPU-intensive closure on Tokio's blocking threadpool.
///
/// # Example
///
/// ```ignore
/// let png = run_blocking(move || render_chart(&spec)).await??;
/// ```
pub async fn run_blocking<F, T>(f: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Unknown(format!("Blocking task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_returns_value() {
        let sum = run_blocking(|| (1..=10).sum::<u32>()).await.unwrap();
        assert_eq!(sum, 55);
    }
}
