use indexmap::IndexMap;
use log::{debug, warn};

const STOP_WORDS: [&str; 104] = [
    "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "him", "his",
    "how", "if", "in", "into", "is", "it", "its", "just", "more", "most", "my", "no", "nor",
    "not", "now", "of", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "why", "with",
];

const DOMAIN_STOP_WORDS: [&str; 3] = ["school", "students", "teachers"];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token) || DOMAIN_STOP_WORDS.contains(&token)
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Top `n` bigram/trigram phrases by corpus frequency, ties in first-seen
/// order. Never fails the run; degradation to an empty list is logged.
pub fn extract_key_phrases<S: AsRef<str>>(texts: &[S], n: usize) -> Vec<String> {
    if texts.is_empty() {
        debug!("key-phrase extraction skipped: no documents in group");
        return Vec::new();
    }

    let mut vocabulary: IndexMap<String, usize> = IndexMap::new();
    for text in texts {
        let tokens = tokenize(text.as_ref());
        for size in 2..=3 {
            for window in tokens.windows(size) {
                *vocabulary.entry(window.join(" ")).or_insert(0) += 1;
            }
        }
    }

    if vocabulary.is_empty() {
        warn!("key-phrase extraction produced an empty vocabulary");
        return Vec::new();
    }

    let mut ranked: Vec<(String, usize)> = vocabulary.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(n).map(|(phrase, _)| phrase).collect()
}

pub fn title_case(phrase: &str) -> String {
    phrase
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
