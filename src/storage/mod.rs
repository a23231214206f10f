pub mod event_log;
pub mod region;

pub use event_log::{DrainReport, DurableEventLog};
pub use region::{FileRegion, MemRegion, Region};
