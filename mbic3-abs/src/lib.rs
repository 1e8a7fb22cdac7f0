#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

# Background and Motivation

A motivating example is `HashMap`/`HashSet`: this module redirects to whatever chosen
implementation we want (currently `std::collections`). If we ever wanted a different
representation, only this module would need to change.

For logging, the (crate) public interface is just `tracing`'s own macros re-exported under our
namespace, so that call sites don't need a direct dependency on `tracing` and a future change of
logging framework is a one-module change.

*/

mod shuffle;

pub use std::collections::{HashMap, HashSet};

// For vectors that are expected to have few or zero elements.
pub use smallvec::{smallvec, SmallVec};

pub use shuffle::seeded_shuffle;

// Logging facade. Call sites use `mbic3_abs::tracing::{debug, warn, ...}` or the re-exported
// macros directly.
pub use tracing;
pub use tracing::{debug, error, info, trace, warn};

/// Installs a `tracing` subscriber that reads `RUST_LOG` (or defaults to `info`). Intended for
/// binaries and integration tests; library code never installs a subscriber itself.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
