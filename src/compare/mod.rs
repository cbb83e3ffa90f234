use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::Instrument;

use crate::extraction::Extractor;
use crate::extraction::config::ExtractorConfig;
use crate::llm::openai::{
    ChatCompletionRequest, ChatMessage, ChatRole, LlmClient, OpenAiClient, OpenAiClientConfig, OpenAiError,
    UsageMetrics,
};
use crate::parse::{parse_job_text, parse_resume_text};
use crate::telemetry;
use crate::telemetry::ops::compare::Phase as ComparePhase;

const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Keys of the report the model is asked to return.
pub const REPORT_FIELDS: &[&str] =
    &["match_score", "key_strengths", "areas_for_improvement", "resume_suggestions", "skills_to_develop"];

#[derive(Args, Debug)]
pub struct CompareCmd {
    /// Job posting URL
    pub url: String,
    /// Resume as plain text or as already-parsed JSON
    #[arg(long)]
    pub resume: PathBuf,
    #[arg(long)]
    pub model: Option<String>,
    /// Build the inputs without calling the model
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct ComparePlan<'a> {
    url: &'a str,
    model: &'a str,
    resume_is_json: bool,
    resume_chars: usize,
    job_text_chars: usize,
}

#[derive(Serialize)]
struct CompareResult<'a> {
    url: &'a str,
    model: &'a str,
    report: Value,
    usage: Option<UsageMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// The parsed report, or an object with `error`, `raw_response` and `parse_error`.
    pub report: Value,
    pub usage: Option<UsageMetrics>,
}

/// JSON input is re-indented for the prompt; anything else passes through.
pub fn pretty_if_json(input: &str) -> String {
    serde_json::from_str::<Value>(input)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| input.to_string())
}

/// Prompt text for a value produced by one of the parse agents.
pub fn prompt_input(value: &Value) -> String {
    match value {
        Value::String(s) => pretty_if_json(s),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub fn build_compare_prompt(resume: &str, job: &str) -> String {
    format!(
        "You are an expert resume consultant and job matcher.\n\n\
         Compare the following resume and job posting. Dont give much weight to the preferred skills mentioned in the job posting. \
         Provide a detailed analysis in JSON format with the following structure:\n\
         {{\n    \"match_score\": number (0-100),\n    \"key_strengths\": [\"strength1\", \"strength2\", ...],\n    \
         \"areas_for_improvement\": [\"area1\", \"area2\", ...],\n    \"resume_suggestions\": [\"suggestion1\", \"suggestion2\", ...],\n    \
         \"skills_to_develop\": [\"skill1\", \"skill2\", ...]\n}}\n\n\
         Resume Information:\n{resume}\n\n\
         Job Information:\n{job}\n\n\
         Provide a clear, actionable analysis in JSON format to help you improve your resume for this position."
    )
}

/// Strips a ```json fence; a reply that still isn't JSON becomes an error object.
pub fn decode_comparison(reply: &str) -> Value {
    let mut body = reply.trim();
    body = body.strip_prefix("```json").unwrap_or(body);
    body = body.strip_suffix("```").unwrap_or(body);
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(v) => v,
        Err(e) => json!({
            "error": "Failed to parse LLM response as JSON",
            "raw_response": reply,
            "parse_error": e.to_string(),
        }),
    }
}

/// Score a resume against a job. Both inputs may be JSON or free text.
pub async fn compare_job_text<C: LlmClient + ?Sized>(
    client: &C,
    resume: &str,
    job: &str,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<Comparison, OpenAiError> {
    let prompt = build_compare_prompt(&pretty_if_json(resume), &pretty_if_json(job));
    let request = ChatCompletionRequest {
        model,
        messages: vec![ChatMessage::new(ChatRole::User, prompt)],
        temperature: Some(temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        json_object: true,
    };
    let response = client.chat_completion(request).await?;
    Ok(Comparison { report: decode_comparison(&response.content), usage: response.usage })
}

fn hint(log: &telemetry::ctx::LogCtx<telemetry::ops::compare::Compare>, err: &OpenAiError) {
    match err {
        OpenAiError::MissingApiKey => log.warn("⚠️  Missing OPENAI_API_KEY — set it or use --dry-run."),
        OpenAiError::Timeout => log.warn("⚠️  OpenAI request timed out — consider increasing OPENAI_TIMEOUT_SECS."),
        other => log.warn(format!("⚠️  OpenAI request failed — {other}")),
    }
}

pub async fn run(args: CompareCmd) -> Result<()> {
    let log = telemetry::compare();
    let _g = log.root_span_kv([
        ("url", args.url.clone()),
        ("resume", args.resume.display().to_string()),
        ("dry_run", args.dry_run.to_string()),
    ]).entered();

    let resume_raw = tokio::fs::read_to_string(&args.resume)
        .instrument(log.span(&ComparePhase::Read))
        .await
        .with_context(|| format!("read {}", args.resume.display()))?;
    let resume_is_json = serde_json::from_str::<Value>(&resume_raw).is_ok();

    let job_text = async {
        match Extractor::from_config(ExtractorConfig::from_env()) {
            Ok(ex) => ex.extract(&args.url).await,
            Err(err) => err.into_outcome(),
        }
    }
    .instrument(log.span(&ComparePhase::Extract))
    .await;
    log.info(format!("📄 Extracted {} chars", job_text.chars().count()));

    let client_cfg = OpenAiClientConfig::from_env();
    let model_name = args.model.clone().unwrap_or_else(|| client_cfg.default_model.clone());

    if args.dry_run {
        log.info("📝 Dry run — skipping LLM calls");
        log.plan(&ComparePlan {
            url: &args.url,
            model: &model_name,
            resume_is_json,
            resume_chars: resume_raw.chars().count(),
            job_text_chars: job_text.chars().count(),
        })?;
        return Ok(());
    }

    let client = OpenAiClient::new(client_cfg).context("init OpenAI client")?;
    let model = Some(model_name.clone());

    let resume = if resume_is_json {
        resume_raw
    } else {
        let parsed = parse_resume_text(&client, &resume_raw, model.clone())
            .instrument(log.span(&ComparePhase::ParseResume))
            .await
            .inspect_err(|e| hint(&log, e))
            .context("parse resume")?;
        prompt_input(&parsed.resume)
    };

    let job = parse_job_text(&client, &job_text, model.clone(), None)
        .instrument(log.span(&ComparePhase::ParseJob))
        .await
        .inspect_err(|e| hint(&log, e))
        .context("parse job posting")?;

    let comparison = compare_job_text(&client, &resume, &prompt_input(&job.job), model, None)
        .instrument(log.span(&ComparePhase::Compare))
        .await
        .inspect_err(|e| hint(&log, e))
        .context("compare resume to job")?;
    if comparison.report.get("error").is_some() {
        log.warn("⚠️  Model reply was not valid JSON; returning the raw reply");
    }

    let _s = log.span(&ComparePhase::Output).entered();
    log.result(&CompareResult {
        url: &args.url,
        model: &model_name,
        report: comparison.report,
        usage: comparison.usage,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::{ChatCompletionResponse, MockClient};

    fn reply(content: &str) -> Result<ChatCompletionResponse, OpenAiError> {
        Ok(ChatCompletionResponse { content: content.into(), usage: None })
    }

    #[test]
    fn json_inputs_are_reindented_and_text_passes_through() {
        assert_eq!(pretty_if_json(r#"{"skills":["Rust"]}"#), "{\n  \"skills\": [\n    \"Rust\"\n  ]\n}");
        assert_eq!(pretty_if_json("Senior engineer, 8 years"), "Senior engineer, 8 years");
        assert_eq!(prompt_input(&Value::String("plain".into())), "plain");
        assert_eq!(prompt_input(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn prompt_places_resume_before_job() {
        let p = build_compare_prompt("RESUME", "JOB");
        assert!(p.starts_with("You are an expert resume consultant and job matcher."));
        for field in REPORT_FIELDS {
            assert!(p.contains(&format!("\"{field}\"")), "missing {field}");
        }
        let r = p.find("Resume Information:\nRESUME").unwrap();
        let j = p.find("Job Information:\nJOB").unwrap();
        assert!(r < j);
    }

    #[tokio::test]
    async fn fenced_report_is_parsed() {
        let mock = MockClient::new();
        mock.push_response(reply(
            "```json\n{\"match_score\": 72, \"key_strengths\": [\"Rust\"], \"areas_for_improvement\": [], \
             \"resume_suggestions\": [\"Quantify impact\"], \"skills_to_develop\": [\"Kubernetes\"]}\n```",
        ));

        let cmp = compare_job_text(&mock, r#"{"skills":["Rust"]}"#, "Backend Engineer", None, None).await.unwrap();
        assert_eq!(cmp.report["match_score"], 72);
        assert_eq!(cmp.report["skills_to_develop"][0], "Kubernetes");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(DEFAULT_TEMPERATURE));
        let prompt = &calls[0].messages[0].content;
        assert!(prompt.contains("Resume Information:\n{\n  \"skills\": [\n    \"Rust\"\n  ]\n}"));
        assert!(prompt.contains("Job Information:\nBackend Engineer\n"));
    }

    #[tokio::test]
    async fn unparseable_reply_becomes_error_object() {
        let mock = MockClient::new();
        mock.push_response(reply("Strong match overall, about 80/100."));

        let cmp = compare_job_text(&mock, "resume", "job", None, Some(0.5)).await.unwrap();
        assert_eq!(cmp.report["error"], "Failed to parse LLM response as JSON");
        assert_eq!(cmp.report["raw_response"], "Strong match overall, about 80/100.");
        assert!(cmp.report["parse_error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(cmp.report.get("match_score").is_none());
        assert_eq!(mock.calls()[0].temperature, Some(0.5));
    }

    #[tokio::test]
    async fn client_errors_propagate() {
        let mock = MockClient::new();
        let err = compare_job_text(&mock, "resume", "job", None, None).await.unwrap_err();
        assert!(matches!(err, OpenAiError::MockQueueEmpty));
    }
}
