pub mod clip;
pub mod collab;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod platform;
pub mod progress;
pub mod retention;
pub mod scanner;
pub mod scheduler;
pub mod storage;

pub use config::{AppConfig, RetentionMode, RetentionSettings};
pub use engine::{PassPlan, PassSummary, RetentionEngine};
pub use error::{ClipError, Error, PassWarning};
pub use executor::{DeletionExecutor, ExecutionReport};
pub use progress::{ProgressReporter, SilentReporter};
pub use scheduler::{Scheduler, SchedulerHandle};
