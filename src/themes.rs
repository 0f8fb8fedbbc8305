use crate::models::Response;

/// The seven fixed survey themes; every output section enumerates all of them
/// in this order.
pub const THEMES: [&str; 7] = [
    "Infrastructure & Facilities",
    "Academic Quality & Curriculum",
    "Parent–Teacher Communication",
    "Student Experience & Wellbeing",
    "Teacher Quality & Stability",
    "School Leadership & Community",
    "Resources & Capacity",
];

pub const STABILITY_THEME: &str = "Teacher Quality & Stability";
pub const COMMUNICATION_THEME: &str = "Parent–Teacher Communication";
pub const VALUE_THEME: &str = "Value for Money";

pub const TURNOVER_KEYWORDS: [&str; 8] = [
    "left",
    "leaving",
    "gone",
    "turnover",
    "resign",
    "new teacher",
    "change",
    "replacement",
];

pub const RESPONSE_KEYWORDS: [&str; 5] = ["reply", "respond", "answer", "email", "contact"];

pub const FACILITIES_KEYWORDS: [&str; 7] =
    ["facilit", "sport", "pool", "gym", "field", "campus", "building"];

/// Every aggregator goes through this one predicate so volume counts cannot
/// drift between output sections.
pub fn matches_theme(response: &Response, theme: &str) -> bool {
    response.theme.contains(theme)
}

pub fn theme_subset<'a>(responses: &'a [Response], theme: &str) -> Vec<&'a Response> {
    responses
        .iter()
        .filter(|r| matches_theme(r, theme))
        .collect()
}

pub fn recognized_themes(theme_field: &str) -> Vec<&'static str> {
    theme_field
        .split(';')
        .map(str::trim)
        .filter_map(|part| THEMES.iter().find(|t| **t == part).copied())
        .collect()
}

// "very negative" counts toward the "negative" family
pub fn label_in_family(label: &str, family: &str) -> bool {
    label.to_lowercase().contains(family)
}

pub fn verbatim_mentions_any(verbatim: &str, keywords: &[&str]) -> bool {
    let lower = verbatim.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
