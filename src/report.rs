use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use log::debug;

use crate::models::{
    CellBreakdown, CommunicationInsight, DashboardData, ExampleVerbatim, ExecSummary, GraphLink,
    GraphNode, Insights, Kpi, NegativeDriver, RadialGraph, Response, SchoolRow, SchoolThemeCell,
    SentimentBreakdown, StabilityInsight, ThemeStat, ValueInsight,
};
use crate::phrases;
use crate::sentiment;
use crate::themes;

const THEME_PHRASE_COUNT: usize = 3;
const DRIVER_PHRASE_COUNT: usize = 8;
const VERBATIMS_PER_CELL: usize = 5;
const CONTEXT_TRUNCATE_CHARS: usize = 100;

/// Shared by the radial graph and the matrix so both agree on school order.
#[derive(Debug, Clone)]
pub struct SchoolMetric {
    pub id: String,
    pub score: f64,
    pub count: usize,
}

fn negative_subset<'a>(responses: &[&'a Response]) -> Vec<&'a Response> {
    responses
        .iter()
        .filter(|r| themes::label_in_family(&r.sentiment_label, "negative"))
        .copied()
        .collect()
}

fn family_count(responses: &[&Response], family: &str) -> usize {
    responses
        .iter()
        .filter(|r| themes::label_in_family(&r.sentiment_label, family))
        .count()
}

/// Themes with zero matching rows still emit an all-zero placeholder so the
/// dashboard never sees a missing key.
pub fn theme_stats(responses: &[Response]) -> IndexMap<String, ThemeStat> {
    let mut stats = IndexMap::new();

    for theme in themes::THEMES {
        let subset = themes::theme_subset(responses, theme);
        if subset.is_empty() {
            stats.insert(
                theme.to_string(),
                ThemeStat {
                    volume: 0,
                    school_count: 0,
                    sentiment_breakdown: SentimentBreakdown {
                        positive: 0,
                        neutral: 0,
                        negative: 0,
                    },
                    score: 0.0,
                    bucket: "Neutral".to_string(),
                    neg_phrases: Vec::new(),
                },
            );
            continue;
        }

        let negatives = negative_subset(&subset);
        let neg_verbatims: Vec<&str> = negatives.iter().map(|r| r.verbatim.as_str()).collect();
        let score = sentiment::mean_score(&subset);
        let school_count = subset
            .iter()
            .map(|r| r.school_id.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();

        stats.insert(
            theme.to_string(),
            ThemeStat {
                volume: subset.len(),
                school_count,
                sentiment_breakdown: SentimentBreakdown {
                    positive: family_count(&subset, "positive"),
                    neutral: family_count(&subset, "neutral"),
                    negative: family_count(&subset, "negative"),
                },
                score,
                bucket: sentiment::bucket(score).to_string(),
                neg_phrases: phrases::extract_key_phrases(&neg_verbatims, THEME_PHRASE_COUNT),
            },
        );
    }

    stats
}

// grouped alphabetically, then stable-sorted by score descending, so
// alphabetical order breaks score ties
pub fn school_metrics(responses: &[Response]) -> Vec<SchoolMetric> {
    let mut groups: BTreeMap<&str, Vec<&Response>> = BTreeMap::new();
    for response in responses {
        groups.entry(&response.school_id).or_default().push(response);
    }

    let mut metrics: Vec<SchoolMetric> = groups
        .into_iter()
        .map(|(id, group)| SchoolMetric {
            id: id.to_string(),
            score: sentiment::mean_score(&group),
            count: group.len(),
        })
        .collect();

    metrics.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    metrics
}

/// A response naming several themes contributes to one link per recognized
/// theme.
pub fn radial_graph(responses: &[Response], metrics: &[SchoolMetric]) -> RadialGraph {
    let mut nodes: Vec<GraphNode> = themes::THEMES
        .iter()
        .map(|theme| GraphNode {
            id: theme.to_string(),
            group: "theme".to_string(),
            score: None,
        })
        .collect();

    for metric in metrics {
        nodes.push(GraphNode {
            id: metric.id.clone(),
            group: "school".to_string(),
            score: Some(metric.score),
        });
    }

    let mut pairs: IndexMap<(String, &'static str), (usize, f64)> = IndexMap::new();
    for response in responses {
        for theme in themes::recognized_themes(&response.theme) {
            let entry = pairs
                .entry((response.school_id.clone(), theme))
                .or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += response.sentiment_score;
        }
    }

    let links = pairs
        .into_iter()
        .map(|((school, theme), (count, sent_sum))| GraphLink {
            source: school,
            target: theme.to_string(),
            value: count,
            sentiment: sentiment::round2(sent_sum / count as f64),
        })
        .collect();

    RadialGraph { nodes, links }
}

// positive cells lead with the strongest praise, negative cells with the
// harshest criticism, neutral cells with the rows closest to zero; verbatim
// text descending breaks every tie
fn order_cell_responses<'a>(subset: &[&'a Response], cell_score: f64) -> Vec<&'a Response> {
    let mut ordered: Vec<&Response> = subset.to_vec();
    ordered.sort_by(|a, b| {
        let primary = if cell_score > 0.0 {
            b.sentiment_score
                .partial_cmp(&a.sentiment_score)
                .unwrap_or(Ordering::Equal)
        } else if cell_score < 0.0 {
            a.sentiment_score
                .partial_cmp(&b.sentiment_score)
                .unwrap_or(Ordering::Equal)
        } else {
            a.sentiment_score
                .abs()
                .partial_cmp(&b.sentiment_score.abs())
                .unwrap_or(Ordering::Equal)
        };
        primary.then_with(|| b.verbatim.cmp(&a.verbatim))
    });
    ordered
}

fn build_cell(subset: &[&Response]) -> anyhow::Result<(SchoolThemeCell, f64)> {
    let score = sentiment::mean_score(subset);
    let ordered = order_cell_responses(subset, score);

    let examples: Vec<ExampleVerbatim> = ordered
        .iter()
        .take(VERBATIMS_PER_CELL)
        .map(|r| ExampleVerbatim {
            text: r.verbatim.clone(),
            bucket: r.sentiment_label.clone(),
            score: r.sentiment_score,
        })
        .collect();

    let cell = SchoolThemeCell {
        count: subset.len(),
        avg_sentiment: score,
        sentiment_bucket: sentiment::bucket(score).to_string(),
        sentiment_breakdown: CellBreakdown {
            pos: family_count(subset, "positive"),
            neu: family_count(subset, "neutral"),
            neg: family_count(subset, "negative"),
        },
        example_verbatims: serde_json::to_string(&examples)
            .context("failed to encode example verbatims")?,
    };

    Ok((cell, score))
}

/// A theme with no responses for a school maps to null and contributes 0 to
/// the overall average, pulling sparse-coverage schools toward neutral.
pub fn matrix(responses: &[Response], metrics: &[SchoolMetric]) -> anyhow::Result<Vec<SchoolRow>> {
    let mut rows = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let school_rows: Vec<&Response> = responses
            .iter()
            .filter(|r| r.school_id == metric.id)
            .collect();
        let city = school_rows
            .first()
            .map(|r| r.city.clone())
            .unwrap_or_else(|| "Global".to_string());

        let mut cells: IndexMap<String, Option<SchoolThemeCell>> = IndexMap::new();
        let mut theme_scores = Vec::with_capacity(themes::THEMES.len());

        for theme in themes::THEMES {
            let subset: Vec<&Response> = school_rows
                .iter()
                .filter(|r| themes::matches_theme(r, theme))
                .copied()
                .collect();

            if subset.is_empty() {
                theme_scores.push(0.0);
                cells.insert(theme.to_string(), None);
            } else {
                let (cell, score) = build_cell(&subset)?;
                theme_scores.push(score);
                cells.insert(theme.to_string(), Some(cell));
            }
        }

        let overall_raw =
            sentiment::round2(theme_scores.iter().sum::<f64>() / themes::THEMES.len() as f64);
        let overall_percent = sentiment::round1(overall_raw / 2.0 * 100.0);

        rows.push(SchoolRow {
            name: metric.id.clone(),
            city,
            count: metric.count,
            themes: cells,
            overall_raw,
            overall_percent,
        });
    }

    Ok(rows)
}

fn truncate_context(verbatim: &str) -> String {
    if verbatim.chars().count() > CONTEXT_TRUNCATE_CHARS {
        let head: String = verbatim.chars().take(CONTEXT_TRUNCATE_CHARS).collect();
        format!("{head}...")
    } else {
        verbatim.to_string()
    }
}

fn top_negative_drivers(responses: &[Response]) -> Vec<NegativeDriver> {
    let all: Vec<&Response> = responses.iter().collect();
    let negatives = negative_subset(&all);
    let neg_verbatims: Vec<&str> = negatives.iter().map(|r| r.verbatim.as_str()).collect();

    let mut drivers = Vec::new();
    for phrase in phrases::extract_key_phrases(&neg_verbatims, DRIVER_PHRASE_COUNT) {
        let matching: Vec<&&Response> = negatives
            .iter()
            .filter(|r| r.verbatim.to_lowercase().contains(&phrase))
            .collect();

        // A phrase assembled across punctuation may not literally occur in
        // any verbatim; it carries no usable context, so it is dropped.
        let Some(first) = matching.first() else {
            debug!("driver phrase {phrase:?} has no literal occurrence, skipping");
            continue;
        };

        drivers.push(NegativeDriver {
            phrase: phrases::title_case(&phrase),
            context: truncate_context(&first.verbatim),
            count: matching.len(),
        });
    }

    drivers
}

pub fn exec_summary(responses: &[Response]) -> ExecSummary {
    let all: Vec<&Response> = responses.iter().collect();
    let negatives = negative_subset(&all);

    let stability = themes::theme_subset(responses, themes::STABILITY_THEME);
    let stability_neg = negative_subset(&stability);
    let turnover_mentions = stability_neg
        .iter()
        .filter(|r| themes::verbatim_mentions_any(&r.verbatim, &themes::TURNOVER_KEYWORDS))
        .count();

    let communication = themes::theme_subset(responses, themes::COMMUNICATION_THEME);
    let communication_neg = negative_subset(&communication);
    let response_issues = communication_neg
        .iter()
        .filter(|r| themes::verbatim_mentions_any(&r.verbatim, &themes::RESPONSE_KEYWORDS))
        .count();

    let value = themes::theme_subset(responses, themes::VALUE_THEME);
    let facilities_overlap = value
        .iter()
        .filter(|r| themes::verbatim_mentions_any(&r.verbatim, &themes::FACILITIES_KEYWORDS))
        .count();

    ExecSummary {
        kpi: Kpi {
            total: responses.len(),
            score: sentiment::mean_score(&all),
            neg_pct: sentiment::percentage(negatives.len(), responses.len()),
        },
        insights: Insights {
            stability: StabilityInsight {
                neg_pct_of_topic: sentiment::percentage(stability_neg.len(), stability.len()),
                turnover_mention_pct: sentiment::percentage(
                    turnover_mentions,
                    stability_neg.len(),
                ),
            },
            communication: CommunicationInsight {
                score: sentiment::mean_score(&communication),
                response_issue_count: response_issues,
            },
            value: ValueInsight {
                facilities_overlap_pct: sentiment::percentage(facilities_overlap, value.len()),
            },
            drivers: top_negative_drivers(responses),
        },
    }
}

pub fn assemble(responses: &[Response]) -> anyhow::Result<DashboardData> {
    let metrics = school_metrics(responses);
    Ok(DashboardData {
        exec_summary: exec_summary(responses),
        themes: theme_stats(responses),
        radial_graph: radial_graph(responses, &metrics),
        matrix: matrix(responses, &metrics)?,
    })
}

pub fn to_json(data: &DashboardData) -> anyhow::Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(data, &mut serializer)
        .context("failed to serialize dashboard data")?;
    String::from_utf8(out).context("dashboard JSON was not valid UTF-8")
}

pub fn write_json(data: &DashboardData, path: &Path) -> anyhow::Result<()> {
    let json = to_json(data)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write dashboard data to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(school: &str, theme: &str, label: &str, verbatim: &str) -> Response {
        Response {
            school_id: school.to_string(),
            city: "Bangkok".to_string(),
            theme: theme.to_string(),
            sentiment_label: label.to_string(),
            verbatim: verbatim.to_string(),
            sentiment_score: sentiment::score_from_label(label),
        }
    }

    fn communication_sample() -> Vec<Response> {
        vec![
            response(
                "NAS A",
                "Parent–Teacher Communication",
                "Negative",
                "Emails go unanswered for weeks",
            ),
            response(
                "NAS A",
                "Parent–Teacher Communication",
                "Negative",
                "No reply to my contact request",
            ),
            response(
                "NAS A",
                "Parent–Teacher Communication",
                "Positive",
                "Form teacher responds quickly",
            ),
        ]
    }

    #[test]
    fn every_fixed_theme_appears_even_without_rows() {
        let stats = theme_stats(&communication_sample());
        assert_eq!(stats.len(), themes::THEMES.len());
        let empty = &stats["Resources & Capacity"];
        assert_eq!(empty.volume, 0);
        assert_eq!(empty.school_count, 0);
        assert_eq!(empty.bucket, "Neutral");
        assert!(empty.neg_phrases.is_empty());
    }

    #[test]
    fn theme_volume_counts_substring_matches() {
        let stats = theme_stats(&communication_sample());
        let comm = &stats["Parent–Teacher Communication"];
        assert_eq!(comm.volume, 3);
        assert_eq!(comm.school_count, 1);
        assert_eq!(comm.sentiment_breakdown.positive, 1);
        assert_eq!(comm.sentiment_breakdown.neutral, 0);
        assert_eq!(comm.sentiment_breakdown.negative, 2);
        assert_eq!(comm.score, -0.33);
        assert_eq!(comm.bucket, "Negative");
    }

    #[test]
    fn school_metrics_sort_by_score_then_name() {
        let rows = vec![
            response("NAS B", "Resources & Capacity", "Positive", "ok"),
            response("NAS A", "Resources & Capacity", "Positive", "ok"),
            response("NAS C", "Resources & Capacity", "Very Positive", "ok"),
        ];
        let metrics = school_metrics(&rows);
        let ids: Vec<&str> = metrics.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["NAS C", "NAS A", "NAS B"]);
    }

    #[test]
    fn semicolon_theme_rows_link_to_each_recognized_theme() {
        let rows = vec![response(
            "NAS A",
            "Resources & Capacity; Infrastructure & Facilities",
            "Neutral",
            "shared comment",
        )];
        let metrics = school_metrics(&rows);
        let graph = radial_graph(&rows, &metrics);
        assert_eq!(graph.links.len(), 2);
        assert!(graph
            .links
            .iter()
            .all(|l| l.source == "NAS A" && l.value == 1 && l.sentiment == 0.0));
    }

    #[test]
    fn theme_nodes_carry_no_score_and_schools_do() {
        let rows = communication_sample();
        let metrics = school_metrics(&rows);
        let graph = radial_graph(&rows, &metrics);
        assert_eq!(graph.nodes.len(), themes::THEMES.len() + 1);
        let theme_node = &graph.nodes[0];
        assert_eq!(theme_node.group, "theme");
        assert!(theme_node.score.is_none());
        let school_node = graph.nodes.last().unwrap();
        assert_eq!(school_node.group, "school");
        assert_eq!(school_node.score, Some(-0.33));
    }

    #[test]
    fn negative_cells_lead_with_the_lowest_score() {
        let subset_owned = vec![
            response("NAS A", "Teacher Quality & Stability", "Negative", "bad year"),
            response(
                "NAS A",
                "Teacher Quality & Stability",
                "Very Negative",
                "three teachers left",
            ),
            response("NAS A", "Teacher Quality & Stability", "Positive", "new head is great"),
        ];
        let subset: Vec<&Response> = subset_owned.iter().collect();
        let ordered = order_cell_responses(&subset, -0.67);
        assert_eq!(ordered[0].verbatim, "three teachers left");
        assert_eq!(ordered[2].verbatim, "new head is great");
    }

    #[test]
    fn positive_cells_lead_with_the_highest_score_ties_by_text_desc() {
        let subset_owned = vec![
            response("NAS A", "Academic Quality & Curriculum", "Positive", "alpha"),
            response("NAS A", "Academic Quality & Curriculum", "Positive", "zeta"),
            response("NAS A", "Academic Quality & Curriculum", "Very Positive", "best maths"),
        ];
        let subset: Vec<&Response> = subset_owned.iter().collect();
        let ordered = order_cell_responses(&subset, 1.33);
        assert_eq!(ordered[0].verbatim, "best maths");
        assert_eq!(ordered[1].verbatim, "zeta");
        assert_eq!(ordered[2].verbatim, "alpha");
    }

    #[test]
    fn neutral_cells_order_by_distance_from_zero() {
        let subset_owned = vec![
            response("NAS A", "Student Experience & Wellbeing", "Very Positive", "wonderful"),
            response("NAS A", "Student Experience & Wellbeing", "Neutral", "fine"),
            response("NAS A", "Student Experience & Wellbeing", "Very Negative", "awful"),
        ];
        let subset: Vec<&Response> = subset_owned.iter().collect();
        let ordered = order_cell_responses(&subset, 0.0);
        assert_eq!(ordered[0].verbatim, "fine");
    }

    #[test]
    fn matrix_zero_fills_missing_themes_into_the_overall_score() {
        let rows = vec![response(
            "NAS A",
            "Academic Quality & Curriculum",
            "Very Positive",
            "excellent teaching",
        )];
        let metrics = school_metrics(&rows);
        let matrix_rows = matrix(&rows, &metrics).unwrap();
        assert_eq!(matrix_rows.len(), 1);
        let school = &matrix_rows[0];
        assert_eq!(school.themes.len(), themes::THEMES.len());
        assert!(school.themes["Academic Quality & Curriculum"].is_some());
        assert!(school.themes["Resources & Capacity"].is_none());
        // one theme at 2.0, six zero-filled
        assert_eq!(school.overall_raw, 0.29);
        assert_eq!(school.overall_percent, 14.5);
    }

    #[test]
    fn matrix_cell_verbatims_round_trip_as_json_string() {
        let rows = communication_sample();
        let metrics = school_metrics(&rows);
        let matrix_rows = matrix(&rows, &metrics).unwrap();
        assert_eq!(matrix_rows[0].count, 3);
        let cell = matrix_rows[0].themes["Parent–Teacher Communication"]
            .as_ref()
            .unwrap();
        assert_eq!(cell.count, 3);
        assert_eq!(cell.avg_sentiment, -0.33);
        assert_eq!(cell.sentiment_bucket, "Negative");
        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&cell.example_verbatims).unwrap();
        assert_eq!(parsed.len(), 3);
        // negative cell: lowest score first
        assert_eq!(parsed[0]["score"], -1.0);
        assert_eq!(parsed[0]["bucket"], "Negative");
    }

    #[test]
    fn exec_summary_counts_response_issue_keywords() {
        let summary = exec_summary(&communication_sample());
        assert_eq!(summary.kpi.total, 3);
        assert_eq!(summary.kpi.score, -0.33);
        assert_eq!(summary.kpi.neg_pct, 66.7);
        assert_eq!(summary.insights.communication.score, -0.33);
        // both negative rows mention email/reply/contact keywords
        assert_eq!(summary.insights.communication.response_issue_count, 2);
    }

    #[test]
    fn exec_summary_zero_guards_empty_topics() {
        let rows = vec![response("NAS A", "Academic Quality & Curriculum", "Positive", "good")];
        let summary = exec_summary(&rows);
        assert_eq!(summary.insights.stability.neg_pct_of_topic, 0.0);
        assert_eq!(summary.insights.stability.turnover_mention_pct, 0.0);
        assert_eq!(summary.insights.value.facilities_overlap_pct, 0.0);
        assert!(summary.insights.drivers.is_empty());
    }

    #[test]
    fn turnover_mentions_are_measured_against_the_negative_subset() {
        let rows = vec![
            response(
                "NAS A",
                "Teacher Quality & Stability",
                "Negative",
                "Our favourite teacher left mid-term",
            ),
            response(
                "NAS A",
                "Teacher Quality & Stability",
                "Negative",
                "Classes feel crowded",
            ),
            response("NAS A", "Teacher Quality & Stability", "Positive", "Stable staff now"),
        ];
        let summary = exec_summary(&rows);
        assert_eq!(summary.insights.stability.neg_pct_of_topic, 66.7);
        assert_eq!(summary.insights.stability.turnover_mention_pct, 50.0);
    }

    #[test]
    fn drivers_report_count_title_case_and_truncated_context() {
        let long_verbatim = "Homework overload every single night leaves zero family time \
                             and the workload keeps growing beyond anything reasonable for children";
        let rows = vec![
            response("NAS A", "Academic Quality & Curriculum", "Negative", long_verbatim),
            response(
                "NAS B",
                "Academic Quality & Curriculum",
                "Negative",
                "Constant homework overload again this term",
            ),
            response("NAS C", "Resources & Capacity", "Negative", "Fees rose. Quality dropped."),
            response("NAS D", "Resources & Capacity", "Negative", "Fees rose. Quality dropped."),
        ];
        let drivers = exec_summary(&rows).insights.drivers;

        let homework = &drivers[0];
        assert_eq!(homework.phrase, "Homework Overload");
        assert_eq!(homework.count, 2);
        // context comes from the first matching row, cut at 100 chars
        assert_eq!(homework.context.chars().count(), 103);
        assert!(homework.context.ends_with("..."));

        let quality = drivers.iter().find(|d| d.phrase == "Quality Dropped").unwrap();
        assert_eq!(quality.count, 2);
        assert_eq!(quality.context, "Fees rose. Quality dropped.");

        // "rose quality" ranks high but never occurs across the punctuation
        assert!(drivers.iter().all(|d| d.phrase != "Rose Quality"));
    }

    #[test]
    fn rerun_on_same_input_is_byte_identical() {
        let rows = communication_sample();
        let first = to_json(&assemble(&rows).unwrap()).unwrap();
        let second = to_json(&assemble(&rows).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_uses_four_space_indent_and_fixed_top_level_keys() {
        let rows = communication_sample();
        let json = to_json(&assemble(&rows).unwrap()).unwrap();
        assert!(json.starts_with("{\n    \"exec_summary\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["exec_summary", "themes", "radial_graph", "matrix"]);
    }
}
