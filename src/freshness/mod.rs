//! Staleness detection: mtime baselines for sources, a logical clock for reloads.
//!
//! Two independent signals feed the reload decision:
//!
//! - [`MtimeTable`]: has this source file changed since it was last looked at?
//! - [`ReloadTimes`]: when (logically) was each module last reloaded?

mod clock;
pub mod mtime;

pub use clock::{LogicalTime, ReloadTimes};
pub use mtime::{MtimeTable, get_mtime};
