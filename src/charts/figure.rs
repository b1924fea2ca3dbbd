//! Chart figure model.
//!
//! Figures serialize to the plotly JSON shape (`{"data": [...], "layout": {...}}`) so the
//! browser can hand them straight to `Plotly.react`.

use serde::Serialize;

/// Text shown on a figure that has nothing to plot.
pub const NO_DATA_TEXT: &str = "No data to display";

/// A chart: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// One plotly trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hole: Option<f64>,
        marker: Marker,
    },
    Bar {
        name: String,
        x: Vec<serde_json::Value>,
        y: Vec<serde_json::Value>,
        orientation: Orientation,
        marker: Marker,
        #[serde(skip_serializing_if = "Option::is_none")]
        texttemplate: Option<String>,
    },
}

/// Bar direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "h")]
    Horizontal,
}

/// Trace colors; a single color or one per point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl Marker {
    pub fn color(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
            colors: None,
        }
    }

    pub fn colors(colors: Vec<String>) -> Self {
        Self {
            color: None,
            colors: Some(colors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<String>,
}

impl Axis {
    pub fn hidden() -> Self {
        Self {
            visible: Some(false),
            ..Default::default()
        }
    }

    pub fn titled(text: &str) -> Self {
        Self {
            title: Some(Title { text: text.to_string() }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: String,
    pub yref: String,
    pub showarrow: bool,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
}

impl Figure {
    /// Placeholder: hidden axes and one centered "no data" annotation.
    pub fn no_data() -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                xaxis: Some(Axis::hidden()),
                yaxis: Some(Axis::hidden()),
                annotations: vec![Annotation {
                    text: NO_DATA_TEXT.to_string(),
                    xref: "paper".to_string(),
                    yref: "paper".to_string(),
                    showarrow: false,
                    font: Font { size: 28 },
                }],
                ..Default::default()
            },
        }
    }

    /// `true` for the [`Figure::no_data`] placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.data.is_empty() && self.layout.annotations.iter().any(|a| a.text == NO_DATA_TEXT)
    }

    pub(crate) fn titled(title: &str, data: Vec<Trace>) -> Self {
        Self {
            data,
            layout: Layout {
                title: Some(Title { text: title.to_string() }),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Figure, NO_DATA_TEXT};

    #[test]
    fn placeholder_serializes_hidden_axes_and_annotation() {
        let json = serde_json::to_value(Figure::no_data()).unwrap();
        assert_eq!(json["data"], serde_json::json!([]));
        assert_eq!(json["layout"]["xaxis"]["visible"], serde_json::json!(false));
        assert_eq!(json["layout"]["yaxis"]["visible"], serde_json::json!(false));
        assert_eq!(json["layout"]["annotations"][0]["text"], serde_json::json!(NO_DATA_TEXT));
        assert_eq!(json["layout"]["annotations"][0]["showarrow"], serde_json::json!(false));
        assert!(json["layout"].get("title").is_none());
    }
}
