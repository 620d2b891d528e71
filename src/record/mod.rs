//! Record types produced by the two extraction phases
//!
//! - [`Entity`]: a seed club discovered on the search page (dataset A)
//! - [`EntityDetail`]: the enriched club record built from its detail page (dataset B)
//!
//! Optional fields never hold an empty/absent value; they carry [`SENTINEL`]
//! instead so that every output row has the same width.

mod detail;
mod entity;

pub use detail::{pad_installations, EntityDetail, PostalCode, INSTALLATION_SLOTS};
pub use entity::Entity;

/// Placeholder for an intentionally absent field
pub const SENTINEL: &str = "/";
