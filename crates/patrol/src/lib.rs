//! patrol - Per-file quality checks
//!
//! Every changed file is routed to the first tier that can check it: a
//! built-in core plugin, an experimental tool from the tools database (run
//! only after its command passes the validator), or a hardcoded legacy
//! checker for the file's language. Results go to a notifier in live mode or
//! are collected as [`CheckResult`]s for a batch review.

pub mod detect;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod git;
pub mod issues;
pub mod legacy;
pub mod notifier;
pub mod plugin;
pub mod process;
pub mod registry;
pub mod result;
pub mod template;
pub mod validator;

pub use dispatch::{DispatchOptions, Dispatched, Dispatcher, FileOutcome, Status, Tier};
pub use error::{ExecError, RegistryError};
pub use executor::ExperimentalExecutor;
pub use notifier::Notifier;
pub use registry::{ExperimentalToolDescriptor, ToolDescriptor, ToolLookup, ToolRegistry};
pub use result::{CheckResult, ExecutionOutcome, Severity, Summary};
pub use validator::{is_valid_command, CommandValidator};
