//! Chart-ready summaries of an enriched record set.
//!
//! [`Charting`] is the seam the dashboard calls; [`PlotlyCharts`] is the default
//! implementation built from the functions in [`builders`].

pub mod builders;
pub mod figure;

use serde::Serialize;

use crate::types::DataSet;

pub use figure::{Figure, NO_DATA_TEXT};

/// Knobs for the publisher chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Column holding the publisher name.
    pub publisher_field: String,
    /// Number of publishers shown.
    pub top_publishers: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            publisher_field: "publisher".to_string(),
            top_publishers: 10,
        }
    }
}

/// The five dashboard panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub oa_rate: Figure,
    pub oa_rate_by_year: Figure,
    pub oa_rate_by_publisher: Figure,
    pub oa_by_status: Figure,
    pub oa_rate_by_type: Figure,
}

impl ChartSet {
    /// Five "no data" placeholders.
    pub fn placeholders() -> Self {
        Self {
            oa_rate: Figure::no_data(),
            oa_rate_by_year: Figure::no_data(),
            oa_rate_by_publisher: Figure::no_data(),
            oa_by_status: Figure::no_data(),
            oa_rate_by_type: Figure::no_data(),
        }
    }

    /// Panels in display order.
    pub fn figures(&self) -> [&Figure; 5] {
        [
            &self.oa_rate,
            &self.oa_rate_by_year,
            &self.oa_rate_by_publisher,
            &self.oa_by_status,
            &self.oa_rate_by_type,
        ]
    }
}

/// Builds the dashboard charts from an enriched record set.
pub trait Charting: Send + Sync {
    fn build(&self, enriched: &DataSet) -> ChartSet;
}

/// Plotly figures built by [`builders`].
#[derive(Debug, Clone, Default)]
pub struct PlotlyCharts {
    options: ChartOptions,
}

impl PlotlyCharts {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }
}

impl Charting for PlotlyCharts {
    fn build(&self, enriched: &DataSet) -> ChartSet {
        ChartSet {
            oa_rate: builders::oa_rate(enriched),
            oa_rate_by_year: builders::oa_rate_by_year(enriched),
            oa_rate_by_publisher: builders::oa_rate_by_publisher(
                enriched,
                &self.options.publisher_field,
                self.options.top_publishers,
            ),
            oa_by_status: builders::oa_by_status(enriched),
            oa_rate_by_type: builders::oa_rate_by_type(enriched),
        }
    }
}
