use crate::output::TabularRecord;
use crate::record::SENTINEL;
use std::fmt;

/// Number of fixed installation columns in the enriched dataset
pub const INSTALLATION_SLOTS: usize = 4;

/// Postal code as written to the enriched dataset
///
/// All-digit codes become numbers; anything else, including the sentinel,
/// passes through as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostalCode {
    Numeric(u64),
    Text(String),
}

impl PostalCode {
    pub fn normalize(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(value) = raw.parse::<u64>() {
                return PostalCode::Numeric(value);
            }
        }
        PostalCode::Text(raw.to_string())
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostalCode::Numeric(value) => write!(f, "{}", value),
            PostalCode::Text(text) => f.write_str(text),
        }
    }
}

/// An enriched club record, keyed by the seed's `index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDetail {
    pub index: u32,
    pub club_id: String,

    // Seed preview fields
    pub name_preview: String,
    pub postal_code_preview: PostalCode,
    pub city_preview: String,
    pub facility_summary_preview: String,
    pub detail_url: String,
    pub image_url_preview: String,

    // Static page fields
    pub full_name: String,
    pub street: String,
    pub postal_city_country: String,
    pub phone: String,
    pub website: String,
    pub email: String,
    pub total_members: String,

    // Interactive fields
    pub installations: [String; INSTALLATION_SLOTS],
    pub president: String,
}

/// Keeps the first four facilities and fills the remaining slots with the sentinel
pub fn pad_installations(found: Vec<String>) -> [String; INSTALLATION_SLOTS] {
    let mut found = found.into_iter();
    std::array::from_fn(|_| found.next().unwrap_or_else(|| SENTINEL.to_string()))
}

impl TabularRecord for EntityDetail {
    const HEADERS: &'static [&'static str] = &[
        "index",
        "club_id",
        "name_preview",
        "postal_code_preview",
        "city_preview",
        "facility_summary_preview",
        "detail_url",
        "image_url_preview",
        "full_name",
        "street",
        "postal_city_country",
        "phone",
        "website",
        "email",
        "total_members",
        "installation_1",
        "installation_2",
        "installation_3",
        "installation_4",
        "president",
    ];

    fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.index.to_string(),
            self.club_id.clone(),
            self.name_preview.clone(),
            self.postal_code_preview.to_string(),
            self.city_preview.clone(),
            self.facility_summary_preview.clone(),
            self.detail_url.clone(),
            self.image_url_preview.clone(),
            self.full_name.clone(),
            self.street.clone(),
            self.postal_city_country.clone(),
            self.phone.clone(),
            self.website.clone(),
            self.email.clone(),
            self.total_members.clone(),
        ];
        row.extend(self.installations.iter().cloned());
        row.push(self.president.clone());
        row
    }
}
