pub mod config;
pub mod ctx;
pub mod ops;

use std::marker::PhantomData;
use std::time::Instant;

use ctx::LogCtx;

fn new_ctx<O: ctx::OpMarker>() -> LogCtx<O> {
    LogCtx { json: config::logs_are_json(), started: Instant::now(), _marker: PhantomData }
}

pub fn extract() -> LogCtx<ops::extract::Extract> { new_ctx() }
pub fn describe() -> LogCtx<ops::describe::Describe> { new_ctx() }
pub fn parse() -> LogCtx<ops::parse::Parse> { new_ctx() }
pub fn compare() -> LogCtx<ops::compare::Compare> { new_ctx() }
