//! Logging facade for evaluation passes.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it they
//! swallow their arguments, so library code can log unconditionally.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, warn};

// Named apart from the built-in `warn` lint attribute, then re-exported.
#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug_noop as debug, warn_noop as warn};
