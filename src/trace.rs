//! Feature-gated tracing macros.
//!
//! With the `tracing` feature the tracing crate's macros are re-exported;
//! without it they expand to nothing.
//!
//! ```rust,ignore
//! #[cfg(feature = "tracing")]
//! use crate::trace::{debug, trace};
//!
//! trace!(var = v.0, "bind");
//! debug!(rule = %name, "rule_fired");
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, warn, Level, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    #[derive(Clone, Copy, Debug)]
    pub struct Level;

    impl Level {
        pub const TRACE: Level = Level;
        pub const DEBUG: Level = Level;
        pub const INFO: Level = Level;
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace, warn};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "SUCHLOG_LOG";

/// Install a stderr subscriber. Safe to call more than once.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
