use crate::output::TabularRecord;
use serde::Deserialize;

/// A seed club discovered on the search results page
///
/// Created once by the listing phase and read back, unchanged, by the detail phase.
/// `index` is the 1-based discovery position and identifies the row across both datasets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entity {
    pub index: u32,

    /// Token taken from the trailing parentheses of `name`
    pub id: String,

    /// Display name as shown in the results
    pub name: String,

    /// Absolute detail page URL
    pub url: String,

    /// Raw address block, e.g. `"1000, Bruxelles"`
    pub street_address: String,

    pub postal_code: String,
    pub city: String,
    pub facility_summary: String,
    pub image_url: String,
}

impl TabularRecord for Entity {
    const HEADERS: &'static [&'static str] = &[
        "index",
        "id",
        "name",
        "url",
        "street_address",
        "postal_code",
        "city",
        "facility_summary",
        "image_url",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.id.clone(),
            self.name.clone(),
            self.url.clone(),
            self.street_address.clone(),
            self.postal_code.clone(),
            self.city.clone(),
            self.facility_summary.clone(),
            self.image_url.clone(),
        ]
    }
}
