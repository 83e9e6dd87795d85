pub mod age;
pub mod lock;
pub mod planner;
pub mod quota;
pub mod usage;

pub use age::select_by_age;
pub use lock::{apply_locks, LockFiltered, LockSet};
pub use planner::{EvictionReason, Planner, RetentionDecision};
pub use quota::{species_counts, GuardOutcome, QuotaGuard, SpeciesQuota, TrimOrder};
pub use usage::{select_by_usage, DiskUsage, UsageSelection};
