//! Per-session nonce.

use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic nonce sent as the `_` query parameter of handshake and ping
/// calls.
///
/// Starts at the session's creation time in milliseconds and advances by
/// exactly one before every call after the first. Values are never reused
/// within a session.
#[derive(Debug)]
pub struct Nonce(AtomicI64);

impl Nonce {
    /// A nonce starting at `initial`.
    pub fn starting_at(initial: i64) -> Self {
        Self(AtomicI64::new(initial))
    }

    /// A nonce starting at the current Unix time in milliseconds.
    pub fn starting_now() -> Self {
        Self::starting_at(chrono::Utc::now().timestamp_millis())
    }

    /// The most recently used value.
    pub fn current(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Advance by one and return the new value.
    pub fn advance(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn advances_by_one() {
        let nonce = Nonce::starting_at(1_000);
        assert_eq!(nonce.current(), 1_000);
        assert_eq!(nonce.advance(), 1_001);
        assert_eq!(nonce.advance(), 1_002);
        assert_eq!(nonce.current(), 1_002);
    }

    #[test]
    fn starts_near_now() {
        let before = chrono::Utc::now().timestamp_millis();
        let nonce = Nonce::starting_now();
        let after = chrono::Utc::now().timestamp_millis();
        assert!(nonce.current() >= before && nonce.current() <= after);
    }

    #[tokio::test]
    async fn concurrent_advances_never_repeat() {
        let nonce = Arc::new(Nonce::starting_at(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let nonce = nonce.clone();
            handles.push(tokio::spawn(async move {
                (0..250).map(|_| nonce.advance()).collect::<Vec<_>>()
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.extend(handle.await.unwrap());
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 1_000);
        assert_eq!(nonce.current(), 1_000);
    }
}
