use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::extraction::Extractor;
use crate::extraction::config::ExtractorConfig;
use crate::llm::openai::{
    ChatCompletionRequest, ChatMessage, ChatRole, LlmClient, OpenAiClient, OpenAiClientConfig, OpenAiError,
    UsageMetrics,
};
use crate::telemetry;
use crate::telemetry::ops::parse::Phase as ParsePhase;

const SYSTEM_MESSAGE: &str = "You are an expert job description analyzer.";

/// Fields requested from the model, in prompt order.
pub const JOB_FIELDS: &[&str] = &[
    "job_title",
    "company_name",
    "location",
    "required_skills (as a list)",
    "preferred_skills (as a list, if mentioned)",
    "experience_required",
    "education_required",
    "job_description_summary",
    "responsibilities (as a list)",
    "qualifications (as a list)",
];

/// Resume fields requested from the model, in prompt order.
pub const RESUME_FIELDS: &[&str] = &[
    "full_name",
    "email",
    "phone_number",
    "linkedin",
    "github",
    "portfolio_website",
    "education (list of degrees with university name and years)",
    "skills (as a list)",
    "work_experience (list of jobs, each with title, company, start_date, end_date, and responsibilities)",
    "projects (if any, with title and description)",
    "certifications (if any)",
    "summary (a brief summary of the candidate)",
];

#[derive(Args, Debug)]
pub struct ParseCmd {
    /// Job posting URL
    pub url: String,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Extract and build the prompt without calling the model
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct ParsePlan<'a> {
    url: &'a str,
    model: &'a str,
    prompt_chars: usize,
    job_text: &'a str,
}

#[derive(Serialize)]
struct ParseResult<'a> {
    url: &'a str,
    model: &'a str,
    job_text_chars: usize,
    job: Value,
    usage: Option<UsageMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJob {
    /// The model reply as JSON when it parsed, else the raw reply as a string.
    pub job: Value,
    pub usage: Option<UsageMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResume {
    pub resume: Value,
    pub usage: Option<UsageMetrics>,
}

pub fn build_prompt(job_text: &str) -> String {
    let mut out = String::from("Extract the following information from this job posting:\n");
    for field in JOB_FIELDS {
        out.push_str("- ");
        out.push_str(field);
        out.push('\n');
    }
    out.push_str("\nReturn the information in a clean JSON format.\n\nJob Posting:\n");
    out.push_str(job_text);
    out
}

/// Ask the model to turn extracted posting text into structured fields.
pub async fn parse_job_text<C: LlmClient + ?Sized>(
    client: &C,
    job_text: &str,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<ParsedJob, OpenAiError> {
    let request = ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage::new(ChatRole::System, SYSTEM_MESSAGE),
            ChatMessage::new(ChatRole::User, build_prompt(job_text)),
        ],
        temperature,
        json_object: true,
    };
    let response = client.chat_completion(request).await?;
    Ok(ParsedJob { job: reply_to_value(&response.content), usage: response.usage })
}

pub fn build_resume_prompt(resume_text: &str) -> String {
    let mut out = String::from(
        "You are an expert resume parser.\n\nParse the following resume text and return a structured JSON with the following fields:\n\n",
    );
    for field in RESUME_FIELDS {
        out.push_str("- ");
        out.push_str(field);
        out.push('\n');
    }
    out.push_str("\nResume Text:\n");
    out.push_str(resume_text);
    out
}

/// Structured fields from plain resume text. PDF decoding happens upstream.
pub async fn parse_resume_text<C: LlmClient + ?Sized>(
    client: &C,
    resume_text: &str,
    model: Option<String>,
) -> Result<ParsedResume, OpenAiError> {
    let request = ChatCompletionRequest {
        model,
        messages: vec![ChatMessage::new(ChatRole::User, build_resume_prompt(resume_text))],
        temperature: None,
        json_object: true,
    };
    let response = client.chat_completion(request).await?;
    Ok(ParsedResume { resume: reply_to_value(&response.content), usage: response.usage })
}

/// Models sometimes wrap JSON in a fenced block; accept both.
fn reply_to_value(reply: &str) -> Value {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

pub async fn run(args: ParseCmd) -> Result<()> {
    let log = telemetry::parse();
    let _g = log.root_span_kv([
        ("url", args.url.clone()),
        ("model", format!("{:?}", args.model)),
        ("dry_run", args.dry_run.to_string()),
    ]).entered();

    let job_text = async {
        match Extractor::from_config(ExtractorConfig::from_env()) {
            Ok(ex) => ex.extract(&args.url).await,
            Err(err) => err.into_outcome(),
        }
    }
    .instrument(log.span(&ParsePhase::Extract))
    .await;
    log.info(format!("📄 Extracted {} chars", job_text.chars().count()));

    let client_cfg = OpenAiClientConfig::from_env();
    let model_name = args.model.clone().unwrap_or_else(|| client_cfg.default_model.clone());

    if args.dry_run {
        let _s = log.span(&ParsePhase::Prompt).entered();
        let prompt = build_prompt(&job_text);
        log.info("📝 Dry run — skipping LLM call");
        log.plan(&ParsePlan { url: &args.url, model: &model_name, prompt_chars: prompt.chars().count(), job_text: &job_text })?;
        return Ok(());
    }

    let client = OpenAiClient::new(client_cfg).context("init OpenAI client")?;
    let parsed = parse_job_text(&client, &job_text, Some(model_name.clone()), args.temperature)
        .instrument(log.span(&ParsePhase::CallLlm))
        .await;
    let parsed = match parsed {
        Ok(p) => p,
        Err(err) => {
            match &err {
                OpenAiError::MissingApiKey => log.warn("⚠️  Missing OPENAI_API_KEY — set it or use --dry-run."),
                OpenAiError::Timeout => log.warn("⚠️  OpenAI request timed out — consider increasing OPENAI_TIMEOUT_SECS."),
                other => log.warn(format!("⚠️  OpenAI request failed — {other}")),
            }
            return Err(anyhow::Error::new(err).context("call OpenAI chat completion"));
        }
    };

    let _s = log.span(&ParsePhase::Output).entered();
    log.result(&ParseResult {
        url: &args.url,
        model: &model_name,
        job_text_chars: job_text.chars().count(),
        job: parsed.job,
        usage: parsed.usage,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::openai::{ChatCompletionResponse, MockClient};
    use serde_json::json;

    #[test]
    fn prompt_lists_fields_then_posting() {
        let p = build_prompt("Backend Engineer\nWe build systems.");
        assert!(p.starts_with("Extract the following information from this job posting:\n- job_title\n"));
        assert!(p.contains("- qualifications (as a list)\n"));
        assert!(p.ends_with("Job Posting:\nBackend Engineer\nWe build systems."));
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        assert_eq!(reply_to_value("```json\n{\"job_title\": \"SRE\"}\n```"), json!({"job_title": "SRE"}));
        assert_eq!(reply_to_value(" {\"a\": 1} "), json!({"a": 1}));
        assert_eq!(reply_to_value("not json"), Value::String("not json".into()));
    }

    #[tokio::test]
    async fn sends_prompt_and_parses_reply() {
        let mock = MockClient::new();
        mock.push_response(Ok(ChatCompletionResponse {
            content: r#"{"job_title": "Backend Engineer", "required_skills": ["Rust"]}"#.into(),
            usage: None,
        }));

        let parsed = parse_job_text(&mock, "Backend Engineer", None, None).await.unwrap();
        assert_eq!(parsed.job["job_title"], "Backend Engineer");
        assert_eq!(parsed.job["required_skills"][0], "Rust");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].json_object);
        assert_eq!(calls[0].messages[0].content, SYSTEM_MESSAGE);
        assert!(calls[0].messages[1].content.ends_with("Job Posting:\nBackend Engineer"));
    }

    #[tokio::test]
    async fn resume_text_becomes_fields() {
        let mock = MockClient::new();
        mock.push_response(Ok(ChatCompletionResponse {
            content: "```json\n{\"full_name\": \"Ada Lovelace\", \"skills\": [\"Rust\", \"SQL\"]}\n```".into(),
            usage: None,
        }));

        let parsed = parse_resume_text(&mock, "Ada Lovelace\nSkills: Rust, SQL", None).await.unwrap();
        assert_eq!(parsed.resume["full_name"], "Ada Lovelace");
        assert_eq!(parsed.resume["skills"][1], "SQL");

        let calls = mock.calls();
        assert_eq!(calls[0].messages.len(), 1);
        let prompt = &calls[0].messages[0].content;
        assert!(prompt.starts_with("You are an expert resume parser."));
        assert!(prompt.contains("- work_experience (list of jobs"));
        assert!(prompt.ends_with("Resume Text:\nAda Lovelace\nSkills: Rust, SQL"));
    }

    #[tokio::test]
    async fn client_errors_propagate() {
        let mock = MockClient::new();
        let err = parse_job_text(&mock, "text", None, None).await.unwrap_err();
        assert!(matches!(err, OpenAiError::MockQueueEmpty));
    }
}
