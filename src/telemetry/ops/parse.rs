use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Parse;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Extract,
    Prompt,
    CallLlm,
    Output,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Extract => "extract",
            Phase::Prompt => "prompt",
            Phase::CallLlm => "call_llm",
            Phase::Output => "output",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Extract => info_span!("extract"),
            Phase::Prompt => info_span!("prompt"),
            Phase::CallLlm => info_span!("call_llm"),
            Phase::Output => info_span!("output"),
        }
    }
}

impl OpMarker for Parse {
    const NAME: &'static str = "parse";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("parse")
    }
}
