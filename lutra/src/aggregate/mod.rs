//! The aggregation compiler: turns a pipeline (an ordered list of
//! single-key stage documents) into a canonical plan, renders that plan as
//! a deterministic string, and executes it stage-by-stage over a document
//! stream.

mod executor;
mod stages;

pub(crate) use executor::run_pipeline;
pub(crate) use stages::Stage;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::LutraResult;

/// Interns literal scalars during rendering, assigning `#0, #1, …` ordinals
/// in emission order. A repeated literal reuses its first ordinal.
///
/// The counter lives in the plan render call, never in shared state:
/// identical pipelines always produce byte-identical output.
pub(crate) struct ParamInterner {
    params: Vec<Value>,
}

impl ParamInterner {
    pub fn new() -> Self {
        ParamInterner { params: Vec::new() }
    }

    pub fn intern(&mut self, value: &Value) -> usize {
        if let Some(position) = self.params.iter().position(|p| p == value) {
            return position;
        }
        self.params.push(value.clone());
        self.params.len() - 1
    }
}

/// A compiled aggregation pipeline: one canonical [Stage] per input stage
/// document, in source order.
pub struct AggregatePlan {
    stages: Vec<Stage>,
}

impl AggregatePlan {
    /// Compiles a pipeline of stage documents (`$match`, `$group`, `$sort`).
    ///
    /// Parse failures reject the whole pipeline before anything executes.
    pub fn compile(pipeline: &[Document]) -> LutraResult<AggregatePlan> {
        let mut stages = Vec::with_capacity(pipeline.len());
        for stage_doc in pipeline {
            stages.push(Stage::parse(stage_doc)?);
        }
        Ok(AggregatePlan { stages })
    }

    pub(crate) fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Renders the canonical `$aggregate: {…}` representation.
    pub fn render(&self) -> String {
        let mut interner = ParamInterner::new();
        let rendered: Vec<String> = self
            .stages
            .iter()
            .map(|stage| stage.render(&mut interner))
            .collect();
        format!("$aggregate: {{{}}}", rendered.join(", "))
    }
}

/// Compiles a pipeline and renders its canonical string form.
///
/// This is a pure function with no collection involved; it is the
/// validation/debugging entry point for pipelines:
///
/// ```ignore
/// let rendered = to_aggregate(&[doc! { "$match": { size: "medium" } }])?;
/// assert_eq!(rendered, "$aggregate: {$match: {\"size\": {$eq: #0}}}");
/// ```
pub fn to_aggregate(pipeline: &[Document]) -> LutraResult<String> {
    Ok(AggregatePlan::compile(pipeline)?.render())
}
