//! Text-level field extractors
//!
//! Pure functions turning raw strings read from the listing or the detail page
//! into typed field values. Absence always maps to the sentinel.

use crate::record::SENTINEL;
use url::Url;

/// Extracts the club identifier from a display name such as `"TC Example (1234)"`
///
/// The identifier is the text strictly between the last `(` and the `)` that
/// follows it, taken as is. A name without parentheses yields the whole name;
/// an unclosed parenthesis yields everything after it.
pub fn parse_club_id(name: &str) -> String {
    match name.rfind('(') {
        Some(open) => {
            let tail = &name[open + 1..];
            match tail.find(')') {
                Some(close) => tail[..close].to_string(),
                None => tail.to_string(),
            }
        }
        None => name.to_string(),
    }
}

/// Splits a listing address block on its first comma into `(postal_code, city)`
///
/// Without a comma the postal code is the sentinel and the whole block is the city.
pub fn split_address(address: &str) -> (String, String) {
    match address.split_once(',') {
        Some((postal, city)) => (postal.trim().to_string(), city.trim().to_string()),
        None => (SENTINEL.to_string(), address.trim().to_string()),
    }
}

/// Splits a `"postal city-country"` line on its first space
pub fn split_postal_line(line: &str) -> (String, String) {
    match line.split_once(' ') {
        Some((postal, rest)) => (postal.to_string(), rest.to_string()),
        None => (line.to_string(), SENTINEL.to_string()),
    }
}

/// Builds an absolute detail URL from the site base and a result's path attribute
///
/// Absolute attributes are kept as they are.
pub fn resolve_detail_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    if Url::parse(path).is_ok() {
        return path.to_string();
    }

    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// A definition value from the detail page's info block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCandidate {
    /// Whitespace-stripped text
    pub text: String,

    /// `href` of the first link inside the value, if any
    pub href: Option<String>,
}

/// Classification of one [`ContactCandidate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactField {
    Email(String),
    Website(String),
    Phone(String),
    Unclassified,
}

type Classifier = fn(&ContactCandidate, &[String]) -> Option<ContactField>;

/// Tried in order; the first match classifies the candidate
const CLASSIFIERS: &[Classifier] = &[classify_email, classify_website, classify_phone];

const MAILTO: &str = "mailto:";

fn classify_email(candidate: &ContactCandidate, _: &[String]) -> Option<ContactField> {
    let href = candidate.href.as_deref()?.trim();
    let lower = href.to_ascii_lowercase();
    let start = lower.find(MAILTO)?;
    let address = href[start + MAILTO.len()..].trim();
    Some(ContactField::Email(address.to_string()))
}

fn classify_website(candidate: &ContactCandidate, _: &[String]) -> Option<ContactField> {
    let href = candidate.href.as_deref()?.trim();
    href.starts_with("http")
        .then(|| ContactField::Website(href.to_string()))
}

fn classify_phone(
    candidate: &ContactCandidate,
    non_phone_prefixes: &[String],
) -> Option<ContactField> {
    let text = &candidate.text;
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    let labelled = non_phone_prefixes
        .iter()
        .any(|prefix| text.starts_with(prefix.as_str()));

    (has_digit && !labelled).then(|| ContactField::Phone(text.clone()))
}

/// Classifies a candidate by content
pub fn classify_contact(
    candidate: &ContactCandidate,
    non_phone_prefixes: &[String],
) -> ContactField {
    CLASSIFIERS
        .iter()
        .find_map(|classify| classify(candidate, non_phone_prefixes))
        .unwrap_or(ContactField::Unclassified)
}

/// Phone, email and website of a club, sentinel when not found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub website: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: SENTINEL.to_string(),
            email: SENTINEL.to_string(),
            website: SENTINEL.to_string(),
        }
    }
}

impl ContactInfo {
    /// Classifies every candidate; the first value of each kind wins
    pub fn collect<'a, I>(candidates: I, non_phone_prefixes: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a ContactCandidate>,
    {
        let mut info = Self::default();
        let (mut phone, mut email, mut website) = (false, false, false);

        for candidate in candidates {
            match classify_contact(candidate, non_phone_prefixes) {
                ContactField::Email(value) if !email => {
                    info.email = value;
                    email = true;
                }
                ContactField::Website(value) if !website => {
                    info.website = value;
                    website = true;
                }
                ContactField::Phone(value) if !phone => {
                    info.phone = value;
                    phone = true;
                }
                _ => {}
            }
        }

        info
    }
}
