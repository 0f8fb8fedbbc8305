use crate::models::Response;
use crate::themes;

const SEARCH_KEYWORDS: [&str; 5] = ["system", "care", "safe", "contact", "support"];

/// The label match is literal so it catches "Negative" and "Very Negative" as
/// exported; theme and keyword matching are case-insensitive.
pub fn find_wellbeing_matches<'a>(responses: &'a [Response], limit: usize) -> Vec<&'a Response> {
    responses
        .iter()
        .filter(|r| r.theme.to_lowercase().contains("wellbeing"))
        .filter(|r| r.sentiment_label.contains("Negative"))
        .filter(|r| themes::verbatim_mentions_any(&r.verbatim, &SEARCH_KEYWORDS))
        .take(limit)
        .collect()
}

pub fn run(responses: &[Response], limit: usize) {
    let matches = find_wellbeing_matches(responses, limit);
    if matches.is_empty() {
        println!("No matching verbatims found with keywords.");
        return;
    }
    for (index, row) in matches.iter().enumerate() {
        println!("--- Result {} ---", index + 1);
        println!("School: {}", row.school_id);
        println!("Verbatim: {}", row.verbatim);
    }
}
