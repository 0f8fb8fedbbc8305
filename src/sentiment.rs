use crate::models::Response;

/// The "very" forms must be checked first since "negative" is a substring of
/// "very negative". Unrecognized labels score 0.
pub fn score_from_label(label: &str) -> f64 {
    let label = label.to_lowercase();
    if label.contains("very positive") {
        2.0
    } else if label.contains("very negative") {
        -2.0
    } else if label.contains("positive") {
        1.0
    } else if label.contains("negative") {
        -1.0
    } else {
        0.0
    }
}

pub fn mean_score(responses: &[&Response]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let sum: f64 = responses.iter().map(|r| r.sentiment_score).sum();
    round2(sum / responses.len() as f64)
}

pub fn bucket(score: f64) -> &'static str {
    if score > 1.0 {
        "Very Positive"
    } else if score > 0.05 {
        "Positive"
    } else if score < -1.0 {
        "Very Negative"
    } else if score < -0.05 {
        "Negative"
    } else {
        "Neutral"
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// zero denominator degrades to 0
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}
