use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Extract;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Route, Fetch, GuestFetch, Strategy, Assemble }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Route => "route",
        Phase::Fetch => "fetch",
        Phase::GuestFetch => "guest_fetch",
        Phase::Strategy => "strategy",
        Phase::Assemble => "assemble",
    }}
    fn span(&self) -> Span { match self {
        Phase::Route => info_span!("route"),
        Phase::Fetch => info_span!("fetch"),
        Phase::GuestFetch => info_span!("guest_fetch"),
        Phase::Strategy => info_span!("strategy"),
        Phase::Assemble => info_span!("assemble"),
    }}
}

impl OpMarker for Extract {
    const NAME: &'static str = "extract";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("extract") }
}
