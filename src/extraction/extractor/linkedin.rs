use tracing::Instrument;

use crate::extraction::config::ExtractorConfig;
use crate::extraction::error::ExtractError;
use crate::extraction::fetch::{Fetch, HeaderProfile};
use crate::extraction::markup::{Markup, block_text, inline_text};
use crate::telemetry;
use crate::telemetry::ops::extract::Phase as ExtractPhase;

pub const UNKNOWN_TITLE: &str = "Unknown Position";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Returned by [`describe_job`] when every tier comes up empty.
pub const MANUAL_INPUT_MESSAGE: &str =
    "Could not extract job details from LinkedIn. Please provide the job description manually.";

/// Whole-page text is only trusted past this many characters.
pub const MIN_PAGE_TEXT_CHARS: usize = 200;

/// Paragraph aggregation needs strictly more paragraphs than this.
const MIN_PARAGRAPHS: usize = 3;

/// One named way of pulling text out of a document. `None` means the target
/// was absent or empty; the caller moves on to the next strategy.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&Markup) -> Option<String>,
}

/// Description tiers for job-page HTML that is already in hand, most precise
/// first.
pub const DESCRIPTION_TIERS: &[Strategy] = &[
    Strategy { name: "description_text", run: description_text },
    Strategy { name: "show_more_less_markup", run: show_more_less_markup },
    Strategy { name: "job_details_block", run: job_details_block },
    Strategy { name: "main_content", run: main_content },
    Strategy { name: "paragraphs", run: paragraphs },
    Strategy { name: "page_text", run: substantial_page_text },
];

/// First strategy that yields text, with its name.
pub fn run_chain(doc: &Markup, chain: &[Strategy]) -> Option<(&'static str, String)> {
    chain.iter().find_map(|s| (s.run)(doc).map(|text| (s.name, text)))
}

/// Best-effort job description from raw LinkedIn HTML.
pub fn describe_job(html: &str) -> String {
    let doc = Markup::parse(html);
    match run_chain(&doc, DESCRIPTION_TIERS) {
        Some((_, text)) => text,
        None => MANUAL_INPUT_MESSAGE.to_string(),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

fn description_text(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("div", "class", "description__text").map(block_text).and_then(non_empty)
}

fn show_more_less_markup(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("div", "class", "show-more-less-html__markup").map(block_text).and_then(non_empty)
}

fn job_details_block(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("div", "id", "job-details").map(block_text).and_then(non_empty)
}

fn main_content(doc: &Markup) -> Option<String> {
    doc.find("main").map(block_text).and_then(non_empty)
}

fn paragraphs(doc: &Markup) -> Option<String> {
    let ps = doc.find_all("p");
    if ps.len() <= MIN_PARAGRAPHS { return None; }
    let texts: Vec<String> = ps.into_iter().map(inline_text).filter(|t| !t.is_empty()).collect();
    non_empty(texts.join("\n\n"))
}

fn substantial_page_text(doc: &Markup) -> Option<String> {
    let text = doc.visible_text();
    if text.chars().count() > MIN_PAGE_TEXT_CHARS { Some(text) } else { None }
}

// Guest API fields

fn posting_title(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("h1", "class", "top-card-layout__title").map(inline_text).and_then(non_empty)
}

fn posting_company(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("a", "class", "topcard__org-name-link").map(inline_text).and_then(non_empty)
}

fn posting_location(doc: &Markup) -> Option<String> {
    doc.find_by_attribute("span", "class", "topcard__flavor--bullet").map(inline_text).and_then(non_empty)
}

/// Whatever the guest API markup gave up. Missing fields stay `None` and
/// render as placeholders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: String,
}

impl JobPosting {
    pub fn from_html(html: &str, original_url: &str) -> Self {
        let doc = Markup::parse(html);
        JobPosting {
            title: posting_title(&doc),
            company: posting_company(&doc),
            location: posting_location(&doc),
            description: show_more_less_markup(&doc),
            url: original_url.to_string(),
        }
    }

    /// A title alone is enough.
    pub fn is_usable(&self) -> bool {
        self.title.is_some() || self.description.is_some()
    }

    pub fn render(&self) -> String {
        format!(
            "Job Title: {}\nCompany: {}\nLocation: {}\n\nJob Description:\n{}\n\nOriginal URL: {}",
            self.title.as_deref().unwrap_or(UNKNOWN_TITLE),
            self.company.as_deref().unwrap_or(UNKNOWN_COMPANY),
            self.location.as_deref().unwrap_or(UNKNOWN_LOCATION),
            self.description.as_deref().unwrap_or(""),
            self.url,
        )
    }
}

/// Terminal message handed to the operator when nothing could be scraped.
pub fn guidance_message(job_id: Option<&str>, original_url: &str) -> String {
    let subject = match job_id {
        Some(id) => format!("for job ID: {id}"),
        None => "for this job posting".to_string(),
    };
    format!(
        "Unable to automatically extract the job details from LinkedIn {subject}.\n\
         \n\
         LinkedIn restricts access to their job listings through web scraping.\n\
         \n\
         To proceed, please:\n\
         1. Open the job listing URL: {original_url}\n\
         2. Copy the job details manually\n\
         3. Paste them into the system, or\n\
         4. Use a different job source that doesn't have these restrictions\n\
         \n\
         If you'd like to continue with this job, please provide the job details manually."
    )
}

/// Fetch the guest API rendition of a posting and pull its fields.
pub async fn fetch_guest_posting(
    fetcher: &dyn Fetch,
    cfg: &ExtractorConfig,
    job_id: &str,
    original_url: &str,
) -> Result<JobPosting, ExtractError> {
    let guest_url = cfg.guest_posting_url(job_id);
    let res = fetcher.get(&guest_url, HeaderProfile::BrowserNoCache).await?;
    if !res.status.is_success() {
        return Err(ExtractError::HttpStatus { url: guest_url, status: res.status });
    }
    Ok(JobPosting::from_html(&res.body, original_url))
}

/// LinkedIn job-view path. Always produces text: the assembled posting when
/// anything useful came back, the guidance message otherwise.
pub async fn extract_job(fetcher: &dyn Fetch, cfg: &ExtractorConfig, job_id: Option<&str>, original_url: &str) -> String {
    let log = telemetry::extract();
    let Some(id) = job_id else {
        log.warn_kv("no job id in LinkedIn URL", [("url", original_url.to_string())]);
        return guidance_message(None, original_url);
    };

    let fetched = fetch_guest_posting(fetcher, cfg, id, original_url)
        .instrument(log.span_kv(&ExtractPhase::GuestFetch, [("job_id", id.to_string())]))
        .await;

    match fetched {
        Ok(posting) if posting.is_usable() => {
            let _s = log.span(&ExtractPhase::Assemble).entered();
            log.info_kv("assembled posting", [
                ("job_id", id.to_string()),
                ("title", posting.title.is_some().to_string()),
                ("company", posting.company.is_some().to_string()),
                ("location", posting.location.is_some().to_string()),
                ("description", posting.description.is_some().to_string()),
            ]);
            posting.render()
        }
        Ok(_) => {
            log.warn_kv("guest posting had no recognizable fields", [("job_id", id.to_string())]);
            guidance_message(Some(id), original_url)
        }
        Err(err) => {
            log.warn_kv("guest posting fetch failed", [("job_id", id.to_string()), ("error", err.to_string())]);
            guidance_message(Some(id), original_url)
        }
    }
}
