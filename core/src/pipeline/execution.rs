// larder/src/pipeline/execution.rs

use super::definition::Pipeline;
use super::step::{Handler, StepDef};
use super::{ContextData, PipelineControl, PipelineResult};
use crate::error::PipelineError;
use tracing::{event, instrument, span, Instrument, Level};

enum PhaseOutcome {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// The first handler error aborts the run and is returned as is; the
  /// context keeps whatever the completed handlers wrote into it.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step = step_def.name.as_str(),
        step_index = step_idx
      );
      if let PhaseOutcome::Stopped = self.run_step(step_def, &ctx_data).instrument(step_span).await? {
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<PhaseOutcome, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_if) = &step_def.skip_if {
      if ctx_data.with(|data| skip_if(data)) {
        event!(Level::DEBUG, "Step skipped by its condition.");
        return Ok(PhaseOutcome::Continue);
      }
    }

    let on_handlers = self.on.get(step_name).filter(|v| !v.is_empty());
    let after_handlers = self.after.get(step_name).filter(|v| !v.is_empty());

    let Some(on_handlers) = on_handlers else {
      if step_def.optional && after_handlers.is_none() {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PhaseOutcome::Continue);
      }
      event!(Level::ERROR, "Required step has no 'on' handler.");
      return Err(Err::from(PipelineError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    };

    if let PhaseOutcome::Stopped = Self::run_phase("on", on_handlers, ctx_data).await? {
      return Ok(PhaseOutcome::Stopped);
    }
    if let Some(after_handlers) = after_handlers {
      if let PhaseOutcome::Stopped = Self::run_phase("after", after_handlers, ctx_data).await? {
        return Ok(PhaseOutcome::Stopped);
      }
    }
    event!(Level::DEBUG, "Step finished.");
    Ok(PhaseOutcome::Continue)
  }

  async fn run_phase(
    phase: &'static str,
    handlers: &[Handler<TData, Err>],
    ctx_data: &ContextData<TData>,
  ) -> Result<PhaseOutcome, Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, phase, handler_index = handler_idx, "Pipeline stopped by handler.");
          return Ok(PhaseOutcome::Stopped);
        }
        Err(e) => {
          event!(Level::WARN, phase, handler_index = handler_idx, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }
}
