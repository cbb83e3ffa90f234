use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Describe;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Read,
    Tiers,
    Output,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Read => "read",
            Phase::Tiers => "tiers",
            Phase::Output => "output",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Read => info_span!("read"),
            Phase::Tiers => info_span!("tiers"),
            Phase::Output => info_span!("output"),
        }
    }
}

impl OpMarker for Describe {
    const NAME: &'static str = "describe";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("describe")
    }
}
