//! Contact and entity extraction from resume text

use crate::config::ContactConfig;
use crate::error::Result;
use crate::processing::text_processor::words;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// As written in the document
    pub display: String,
    /// Digits and `+` only, for comparison
    pub normalized: String,
}

impl ContactRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.links.is_empty()
    }
}

pub struct ContactParser {
    email_regex: Regex,
    phone_regex: Regex,
    url_regex: Regex,
    year_range_regex: Regex,
    date_regex: Regex,
    name_skip_regex: Regex,
    min_phone_digits: usize,
    max_phone_digits: usize,
}

impl ContactParser {
    /// Fails only when the configured phone pattern does not compile
    pub fn new(config: &ContactConfig) -> Result<Self> {
        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(&config.phone_pattern)?;

        let url_regex = Regex::new(
            r"(?ix)
            \b(?:
                https?://[^\s<>()\[\]{}]+
              | www\.[^\s<>()\[\]{}]+
              | (?:[a-z0-9-]+\.)+
                (?:com|org|net|io|dev|me|co|ai|app|edu|gov|info|tech|xyz|us|uk|de|fr|in|ca|au|nl)\b
                (?:/[^\s<>()\[\]{}]*)?
            )",
        )
        .expect("Invalid URL regex");

        let year_range_regex = Regex::new(r"^(?:19|20)\d{2}\s*[-./]?\s*(?:19|20)\d{2}$")
            .expect("Invalid year range regex");

        let date_regex = Regex::new(r"^\d{1,4}[./-]\d{1,2}[./-]\d{1,4}$")
            .expect("Invalid date regex");

        let name_skip_regex = Regex::new(
            r"(?i)^(?:curriculum vitae|resume|résumé|cv|profile|summary|contacts?|personal details)$",
        )
        .expect("Invalid name skip regex");

        Ok(Self {
            email_regex,
            phone_regex,
            url_regex,
            year_range_regex,
            date_regex,
            name_skip_regex,
            min_phone_digits: config.min_phone_digits,
            max_phone_digits: config.max_phone_digits,
        })
    }

    /// Scan `text` for contact details. Absent fields are simply `None`/empty.
    pub fn parse_contacts(&self, text: &str) -> ContactRecord {
        let email = self.find_email(text);
        ContactRecord {
            name: self.guess_name(text),
            phone: self.find_phone(text),
            links: self.find_links(text),
            email,
        }
    }

    pub fn find_email(&self, text: &str) -> Option<String> {
        self.email_regex.find(text).map(|m| m.as_str().to_string())
    }

    /// First phone-shaped match with a plausible digit count that is not a
    /// year range or a date
    pub fn find_phone(&self, text: &str) -> Option<PhoneNumber> {
        self.phone_regex
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|candidate| {
                !self.year_range_regex.is_match(candidate) && !self.date_regex.is_match(candidate)
            })
            .find_map(|candidate| {
                let normalized: String = candidate
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '+')
                    .collect();
                let digits = normalized.chars().filter(|c| c.is_ascii_digit()).count();
                (self.min_phone_digits..=self.max_phone_digits)
                    .contains(&digits)
                    .then(|| PhoneNumber {
                        display: candidate.to_string(),
                        normalized,
                    })
            })
    }

    /// Every URL-like token outside email addresses, deduplicated in first-seen order
    pub fn find_links(&self, text: &str) -> Vec<String> {
        let email_spans: Vec<(usize, usize)> = self
            .email_regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for m in self.url_regex.find_iter(text) {
            if email_spans.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            let link = m.as_str().trim_end_matches(|c: char| ".,;:!?'\"".contains(c));
            if link.is_empty() || is_product_name(link) {
                continue;
            }
            if seen.insert(dedup_key(link)) {
                links.push(link.to_string());
            }
        }

        links
    }

    /// First line near the top that reads like a person's name
    pub fn guess_name(&self, text: &str) -> Option<String> {
        text.lines()
            .take(25)
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.name_skip_regex.is_match(line))
            .find(|line| {
                if line.len() >= 60 || line.contains('@') || line.chars().any(|c| c.is_ascii_digit()) {
                    return false;
                }
                let tokens = words(line);
                let capitalized = tokens
                    .iter()
                    .filter(|t| t.chars().next().map_or(false, char::is_uppercase))
                    .count();
                (2..=5).contains(&tokens.len()) && capitalized >= 2
            })
            .map(str::to_string)
    }
}

/// Bare dotted names with an upper-case suffix ("ASP.NET") are technologies, not domains
fn is_product_name(link: &str) -> bool {
    let lower = link.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.") {
        return false;
    }
    let host = link.split('/').next().unwrap_or(link);
    host.rsplit('.')
        .next()
        .map_or(false, |tld| tld.chars().any(|c| c.is_uppercase()))
}

fn dedup_key(link: &str) -> String {
    let lower = link.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.trim_end_matches('/').to_string()
}
