use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Compare;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Read,
    ParseResume,
    Extract,
    ParseJob,
    Compare,
    Output,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Read => "read",
            Phase::ParseResume => "parse_resume",
            Phase::Extract => "extract",
            Phase::ParseJob => "parse_job",
            Phase::Compare => "compare",
            Phase::Output => "output",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Read => info_span!("read"),
            Phase::ParseResume => info_span!("parse_resume"),
            Phase::Extract => info_span!("extract"),
            Phase::ParseJob => info_span!("parse_job"),
            Phase::Compare => info_span!("compare"),
            Phase::Output => info_span!("output"),
        }
    }
}

impl OpMarker for Compare {
    const NAME: &'static str = "compare";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("compare")
    }
}
