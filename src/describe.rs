use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::extraction::extractor::linkedin::{DESCRIPTION_TIERS, MANUAL_INPUT_MESSAGE, run_chain};
use crate::extraction::markup::Markup;
use crate::telemetry;
use crate::telemetry::ops::describe::Phase as DescribePhase;

#[derive(Args)]
pub struct DescribeCmd {
    /// Saved job page; reads stdin when omitted
    #[arg(long)] pub file: Option<PathBuf>,
}

#[derive(Serialize)]
struct DescribeResult<'a> {
    tier: Option<&'static str>,
    chars: usize,
    text: &'a str,
}

pub async fn run(args: DescribeCmd) -> Result<()> {
    let log = telemetry::describe();
    let _g = log.root_span_kv([("file", format!("{:?}", args.file))]).entered();

    let html = {
        let _s = log.span(&DescribePhase::Read).entered();
        match &args.file {
            Some(path) => tokio::fs::read_to_string(path).await.with_context(|| format!("read {}", path.display()))?,
            None => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await.context("read stdin")?;
                buf
            }
        }
    };

    let (tier, text) = {
        let _s = log.span(&DescribePhase::Tiers).entered();
        match run_chain(&Markup::parse(&html), DESCRIPTION_TIERS) {
            Some((name, text)) => (Some(name), text),
            None => (None, MANUAL_INPUT_MESSAGE.to_string()),
        }
    };
    log.tier(tier, text.chars().count());

    let _s = log.span(&DescribePhase::Output).entered();
    log.result(&DescribeResult { tier, chars: text.chars().count(), text: &text })?;
    Ok(())
}
