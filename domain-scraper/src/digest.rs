//! Digest rendering: subject line, JSON plain-text part and HTML part.

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;

use crate::errors::Result;
use crate::extractor::{DomainMap, MessageId};

const SUMMARY_TEMPLATE: &str = include_str!("templates/summary.html");

/// A rendered digest ready for a transport.
#[derive(Debug, Clone)]
pub struct Digest {
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Ids covered by this digest, to be marked sent after delivery.
    pub message_ids: Vec<MessageId>,
}

#[derive(Serialize)]
struct SummaryContext<'a> {
    title: &'a str,
    count: usize,
    messages: Vec<SummaryEntry<'a>>,
}

#[derive(Serialize)]
struct SummaryEntry<'a> {
    message_id: &'a str,
    domains: Vec<&'a str>,
}

/// `Domain Scraper update for January 01, 2024`
pub fn subject_for(date: NaiveDate) -> String {
    format!("Domain Scraper update for {}", date.format("%B %d, %Y"))
}

impl Digest {
    pub fn render(selection: &DomainMap, date: NaiveDate) -> Result<Self> {
        let subject = subject_for(date);

        let text = serde_json::to_string_pretty(selection)?;

        let context = SummaryContext {
            title: &subject,
            count: selection.len(),
            messages: selection
                .iter()
                .map(|(message_id, domains)| SummaryEntry {
                    message_id,
                    domains: domains.iter().map(String::as_str).collect(),
                })
                .collect(),
        };

        let mut registry = Handlebars::new();
        registry.register_template_string("summary", SUMMARY_TEMPLATE)?;
        let html = registry.render("summary", &context)?;

        Ok(Digest {
            subject,
            text,
            html,
            message_ids: selection.keys().cloned().collect(),
        })
    }
}
