use indexmap::IndexMap;
use serde::Serialize;

/// One survey entry, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Response {
    pub school_id: String,
    pub city: String,
    pub theme: String,
    pub sentiment_label: String,
    pub verbatim: String,
    pub sentiment_score: f64,
}

// Field order on the Serialize types below is part of the dashboard contract.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeStat {
    pub volume: usize,
    pub school_count: usize,
    pub sentiment_breakdown: SentimentBreakdown,
    pub score: f64,
    pub bucket: String,
    pub neg_phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: usize,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadialGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CellBreakdown {
    pub pos: usize,
    pub neu: usize,
    pub neg: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolThemeCell {
    pub count: usize,
    pub avg_sentiment: f64,
    pub sentiment_bucket: String,
    pub sentiment_breakdown: CellBreakdown,
    /// JSON-encoded array of `{text, bucket, score}`; the dashboard calls
    /// JSON.parse on this field, so it ships as a string.
    pub example_verbatims: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExampleVerbatim {
    pub text: String,
    /// raw sentiment label, not the derived bucket
    pub bucket: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolRow {
    pub name: String,
    pub city: String,
    pub count: usize,
    /// all seven themes, null where the school has no responses
    pub themes: IndexMap<String, Option<SchoolThemeCell>>,
    pub overall_raw: f64,
    pub overall_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub total: usize,
    pub score: f64,
    pub neg_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StabilityInsight {
    pub neg_pct_of_topic: f64,
    pub turnover_mention_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunicationInsight {
    pub score: f64,
    pub response_issue_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueInsight {
    pub facilities_overlap_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NegativeDriver {
    pub phrase: String,
    pub context: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub stability: StabilityInsight,
    pub communication: CommunicationInsight,
    pub value: ValueInsight,
    pub drivers: Vec<NegativeDriver>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecSummary {
    pub kpi: Kpi,
    pub insights: Insights,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub exec_summary: ExecSummary,
    pub themes: IndexMap<String, ThemeStat>,
    pub radial_graph: RadialGraph,
    pub matrix: Vec<SchoolRow>,
}
