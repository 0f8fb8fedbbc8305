use std::path::{Path, PathBuf};

use anyhow::Context;
use log::info;

use crate::models::Response;
use crate::sentiment;

/// Probed in order when no explicit input path is given; first existing wins.
const FALLBACK_PATHS: [&str; 2] = ["Feedback.csv", "data/Feedback.csv"];

const DEFAULT_CITY: &str = "Global";

/// The export upstream has shipped two header conventions; aliases accept
/// either.
#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(alias = "school_name")]
    school_id: String,
    #[serde(default = "default_city")]
    city: String,
    #[serde(alias = "theme")]
    standardized_theme: String,
    sentiment: String,
    #[serde(alias = "feedback")]
    verbatim: String,
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

pub fn resolve_input(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    for candidate in FALLBACK_PATHS {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "no feedback dataset found; looked for {}",
        FALLBACK_PATHS.join(", ")
    )
}

pub fn load_responses(path: &Path) -> anyhow::Result<Vec<Response>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open feedback CSV at {}", path.display()))?;

    let mut responses = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result.with_context(|| format!("malformed row in {}", path.display()))?;
        let sentiment_score = sentiment::score_from_label(&row.sentiment);
        responses.push(Response {
            school_id: row.school_id,
            city: row.city,
            theme: row.standardized_theme,
            sentiment_label: row.sentiment,
            verbatim: row.verbatim,
            sentiment_score,
        });
    }

    info!("loaded {} responses from {}", responses.len(), path.display());
    Ok(responses)
}
