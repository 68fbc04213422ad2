pub mod args;
pub mod command;
pub mod context;
pub mod log;
pub mod registry;
pub mod resolver;
pub mod target;
pub mod variables;
pub use command::{CommandExecResult, ErrorKind, JobCommand};
pub use context::{CommandContext, TargetLookup};
pub use log::{JobLog, LogEntry, LogLevel};
pub use registry::{CommandRegistry, RegistryError};
pub use target::TargetRef;
pub use variables::{normalize_var_name, VariableTable, VARIABLE_MARKER};
