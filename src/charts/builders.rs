//! The five dashboard charts.
//!
//! Every builder reads the enriched record set and falls back to [`Figure::no_data`] when the
//! columns it needs are missing or no row has a usable value.

use serde_json::Value as Json;

use crate::processing::{filter, group_counts, group_shares, reduce, GroupShare, ReduceOp};
use crate::processing::reduce::is_truthy;
use crate::types::DataSet;

use super::figure::{Axis, Figure, Marker, Orientation, Trace};

pub const IS_OA_COLUMN: &str = "is_oa";
pub const YEAR_COLUMN: &str = "year";
pub const STATUS_COLUMN: &str = "oa_status";
pub const GENRE_COLUMN: &str = "genre";

const OPEN_LABEL: &str = "Open access";
const CLOSED_LABEL: &str = "Closed";
const OPEN_COLOR: &str = "#2a9d8f";
const CLOSED_COLOR: &str = "#9e9e9e";

/// Display order and color of the Unpaywall statuses.
const STATUS_PALETTE: [(&str, &str); 5] = [
    ("gold", "#f4c430"),
    ("hybrid", "#e76f51"),
    ("bronze", "#cd7f32"),
    ("green", "#52b788"),
    ("closed", CLOSED_COLOR),
];
const OTHER_STATUS_COLOR: &str = "#6c757d";

/// Overall open-access rate as a pie.
pub fn oa_rate(dataset: &DataSet) -> Figure {
    let Some(idx) = dataset.schema.index_of(IS_OA_COLUMN) else {
        return Figure::no_data();
    };
    let known = filter(dataset, |row| is_truthy(&row[idx]).is_some());
    let total = known.row_count();
    let open = reduce(&known, IS_OA_COLUMN, ReduceOp::CountTrue).unwrap_or(0);
    if total == 0 {
        return Figure::no_data();
    }

    Figure::titled(
        "Open access rate",
        vec![Trace::Pie {
            labels: vec![OPEN_LABEL.to_string(), CLOSED_LABEL.to_string()],
            values: vec![open as f64, (total - open) as f64],
            hole: Some(0.4),
            marker: Marker::colors(vec![OPEN_COLOR.to_string(), CLOSED_COLOR.to_string()]),
        }],
    )
}

/// Open/closed share per publication year, oldest first.
pub fn oa_rate_by_year(dataset: &DataSet) -> Figure {
    let Some(mut groups) = group_shares(dataset, YEAR_COLUMN, IS_OA_COLUMN) else {
        return Figure::no_data();
    };
    if groups.is_empty() {
        return Figure::no_data();
    }
    groups.sort_by(|a, b| match (a.key.parse::<i64>(), b.key.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.key.cmp(&b.key),
    });

    let mut fig = Figure::titled("Open access rate by year", share_bars(&groups, Orientation::Vertical));
    fig.layout.barmode = Some("stack".to_string());
    fig.layout.xaxis = Some(Axis {
        kind: Some("category".to_string()),
        ..Axis::titled("Year")
    });
    fig.layout.yaxis = Some(Axis::titled("%"));
    fig
}

/// Open/closed share for the `top_n` publishers with the most records.
pub fn oa_rate_by_publisher(dataset: &DataSet, publisher_field: &str, top_n: usize) -> Figure {
    let Some(mut groups) = group_shares(dataset, publisher_field, IS_OA_COLUMN) else {
        return Figure::no_data();
    };
    if groups.is_empty() || top_n == 0 {
        return Figure::no_data();
    }
    // Stable sort keeps first-seen order among equal totals.
    groups.sort_by(|a, b| b.total().cmp(&a.total()));
    groups.truncate(top_n);

    let mut fig = Figure::titled(
        &format!("Open access rate by publisher (top {top_n})"),
        share_bars(&groups, Orientation::Horizontal),
    );
    fig.layout.barmode = Some("stack".to_string());
    fig.layout.xaxis = Some(Axis::titled("%"));
    fig.layout.yaxis = Some(Axis {
        autorange: Some("reversed".to_string()),
        ..Default::default()
    });
    fig
}

/// Record count per Unpaywall status.
pub fn oa_by_status(dataset: &DataSet) -> Figure {
    let Some(mut counts) = group_counts(dataset, STATUS_COLUMN) else {
        return Figure::no_data();
    };
    if counts.is_empty() {
        return Figure::no_data();
    }
    counts.sort_by_key(|(status, _)| status_rank(status));

    let colors = counts.iter().map(|(status, _)| status_color(status).to_string()).collect();
    let mut fig = Figure::titled(
        "Records by open access status",
        vec![Trace::Bar {
            name: "Records".to_string(),
            x: counts.iter().map(|(s, _)| Json::from(s.as_str())).collect(),
            y: counts.iter().map(|(_, n)| Json::from(*n)).collect(),
            orientation: Orientation::Vertical,
            marker: Marker::colors(colors),
            texttemplate: Some("%{y}".to_string()),
        }],
    );
    fig.layout.yaxis = Some(Axis::titled("Records"));
    fig
}

/// Open/closed share per publication type, most frequent first.
pub fn oa_rate_by_type(dataset: &DataSet) -> Figure {
    let Some(mut groups) = group_shares(dataset, GENRE_COLUMN, IS_OA_COLUMN) else {
        return Figure::no_data();
    };
    if groups.is_empty() {
        return Figure::no_data();
    }
    groups.sort_by(|a, b| b.total().cmp(&a.total()));

    let mut fig = Figure::titled("Open access rate by type", share_bars(&groups, Orientation::Vertical));
    fig.layout.barmode = Some("stack".to_string());
    fig.layout.yaxis = Some(Axis::titled("%"));
    fig
}

fn share_bars(groups: &[GroupShare], orientation: Orientation) -> Vec<Trace> {
    let keys: Vec<Json> = groups.iter().map(|g| Json::from(g.key.as_str())).collect();
    let series = [
        (OPEN_LABEL, OPEN_COLOR, groups.iter().map(GroupShare::open_rate).collect::<Vec<_>>()),
        (CLOSED_LABEL, CLOSED_COLOR, groups.iter().map(GroupShare::closed_rate).collect()),
    ];

    series
        .into_iter()
        .map(|(name, color, rates)| {
            let rates: Vec<Json> = rates.into_iter().map(Json::from).collect();
            let (x, y) = match orientation {
                Orientation::Vertical => (keys.clone(), rates),
                Orientation::Horizontal => (rates, keys.clone()),
            };
            Trace::Bar {
                name: name.to_string(),
                x,
                y,
                orientation,
                marker: Marker::color(color),
                texttemplate: None,
            }
        })
        .collect()
}

fn status_rank(status: &str) -> usize {
    STATUS_PALETTE
        .iter()
        .position(|(s, _)| s.eq_ignore_ascii_case(status))
        .unwrap_or(STATUS_PALETTE.len())
}

fn status_color(status: &str) -> &'static str {
    STATUS_PALETTE
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(status))
        .map(|(_, c)| *c)
        .unwrap_or(OTHER_STATUS_COLOR)
}

#[cfg(test)]
mod tests {
    use super::{oa_by_status, oa_rate, oa_rate_by_publisher, oa_rate_by_type, oa_rate_by_year};
    use crate::charts::figure::Trace;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn enriched() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("doi", DataType::Utf8),
            Field::new("is_oa", DataType::Bool),
            Field::new("oa_status", DataType::Utf8),
            Field::new("year", DataType::Int64),
            Field::new("publisher", DataType::Utf8),
            Field::new("genre", DataType::Utf8),
        ]);
        let s = |v: &str| Value::Utf8(v.to_string());
        let row = |doi: &str, oa: bool, status: &str, year: i64, publisher: &str, genre: &str| {
            vec![s(doi), Value::Bool(oa), s(status), Value::Int64(year), s(publisher), s(genre)]
        };
        DataSet::new(
            schema,
            vec![
                row("10.1/a", true, "green", 2021, "Elsevier", "journal-article"),
                row("10.1/b", false, "closed", 2020, "Elsevier", "journal-article"),
                row("10.1/c", true, "gold", 2020, "PLOS", "journal-article"),
                row("10.1/d", true, "hybrid", 2021, "Springer", "book-chapter"),
            ],
        )
    }

    fn bar_xs(trace: &Trace) -> Vec<serde_json::Value> {
        match trace {
            Trace::Bar { x, .. } => x.clone(),
            Trace::Pie { .. } => panic!("expected a bar trace"),
        }
    }

    #[test]
    fn oa_rate_counts_open_and_closed() {
        let fig = oa_rate(&enriched());
        match &fig.data[0] {
            Trace::Pie { values, .. } => assert_eq!(values, &vec![3.0, 1.0]),
            Trace::Bar { .. } => panic!("expected a pie"),
        }
    }

    #[test]
    fn years_are_sorted_ascending() {
        let fig = oa_rate_by_year(&enriched());
        assert_eq!(fig.data.len(), 2);
        assert_eq!(bar_xs(&fig.data[0]), vec![serde_json::json!("2020"), serde_json::json!("2021")]);
        // 2020: one open, one closed.
        match &fig.data[0] {
            Trace::Bar { y, .. } => assert_eq!(y[0], serde_json::json!(50.0)),
            Trace::Pie { .. } => unreachable!(),
        }
    }

    #[test]
    fn publishers_are_limited_to_top_n() {
        let fig = oa_rate_by_publisher(&enriched(), "publisher", 2);
        match &fig.data[0] {
            Trace::Bar { y, .. } => {
                assert_eq!(y, &vec![serde_json::json!("Elsevier"), serde_json::json!("PLOS")]);
            }
            Trace::Pie { .. } => unreachable!(),
        }
    }

    #[test]
    fn statuses_follow_palette_order() {
        let fig = oa_by_status(&enriched());
        assert_eq!(
            bar_xs(&fig.data[0]),
            vec![
                serde_json::json!("gold"),
                serde_json::json!("hybrid"),
                serde_json::json!("green"),
                serde_json::json!("closed"),
            ]
        );
    }

    #[test]
    fn types_ordered_by_frequency() {
        let fig = oa_rate_by_type(&enriched());
        assert_eq!(bar_xs(&fig.data[0])[0], serde_json::json!("journal-article"));
    }

    #[test]
    fn missing_columns_fall_back_to_placeholder() {
        let ds = DataSet::new(
            Schema::new(vec![Field::new("doi", DataType::Utf8)]),
            vec![vec![Value::Utf8("10.1/a".to_string())]],
        );
        assert!(oa_rate(&ds).is_placeholder());
        assert!(oa_rate_by_year(&ds).is_placeholder());
        assert!(oa_rate_by_publisher(&ds, "publisher", 10).is_placeholder());
        assert!(oa_by_status(&ds).is_placeholder());
        assert!(oa_rate_by_type(&ds).is_placeholder());
    }
}
