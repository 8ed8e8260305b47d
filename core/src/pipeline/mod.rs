// larder/src/pipeline/mod.rs

//! A small async step runner.
//!
//! A `Pipeline<TData, Err>` is an ordered list of named steps. Each step has
//! one or more `on` handlers and optional `after` handlers, all operating on a
//! shared `ContextData<TData>`. Handlers return `PipelineControl` to continue
//! or halt, or an error that aborts the run.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use step::{Handler, SkipCondition, StepDef};
