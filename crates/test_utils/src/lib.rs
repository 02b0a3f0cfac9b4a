#![deny(missing_docs)]
//! Utilities for testing pinhold modules.

pub mod id;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Get a vec of random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::Rng;
    let mut out = vec![0_u8; len];
    rand::thread_rng().fill(&mut out[..]);
    out
}

/// Repeatedly run a block of code until it breaks out of the loop, or
/// panic when the timeout (in milliseconds, default 1000) elapses first.
///
/// Intended for polling an async condition in tests:
/// `iter_check!({ if done() { break; } })`.
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $code:block) => {{
        let deadline = std::time::Instant::now()
            + std::time::Duration::from_millis($timeout_ms);
        loop {
            $code

            if std::time::Instant::now() > deadline {
                panic!("iter_check timed out after {} ms", $timeout_ms);
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }};
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}
