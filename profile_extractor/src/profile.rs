//! Built-in field set for guest profile pages

use url::Url;

use crate::error::SpecError;
use crate::field::FieldSet;

const GUEST_PROFILE_TOML: &str = include_str!("../fields/guest_profile.toml");

/// Field set for a guest profile page: name, location, stats, reviews,
/// verifications, about, languages and join date
pub fn guest_profile() -> Result<FieldSet, SpecError> {
    FieldSet::from_toml(GUEST_PROFILE_TOML)
}

/// Profile identifier: the last non-empty path segment of the profile URL,
/// or `unknown`
pub fn profile_id(profile_url: &str) -> String {
    let from_path = |path: &str| {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .next_back()
            .map(String::from)
    };

    let id = match Url::parse(profile_url) {
        Ok(url) => from_path(url.path()),
        Err(_) => from_path(profile_url.split(['?', '#']).next().unwrap_or_default()),
    };
    id.unwrap_or_else(|| "unknown".to_string())
}
