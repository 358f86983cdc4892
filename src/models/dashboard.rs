use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One complete aggregate payload, replaced wholesale every poll tick.
/// Every branch is optional at the decode layer: a missing or malformed
/// sub-field degrades that renderer only, never the whole cycle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub stats: Option<DashboardStats>,
    #[serde(default)]
    pub trends: Option<TrendSeries>,
    #[serde(default)]
    pub sentiment: Option<SentimentCounts>,
    #[serde(default)]
    pub wordcloud_data: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub recent: Option<Vec<FeedbackRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub week: i64,
    #[serde(default)]
    pub active_sales: i64,
    #[serde(default)]
    pub leads: Option<LeadBuckets>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadBuckets {
    #[serde(default)]
    pub high: i64,
    #[serde(default)]
    pub medium: i64,
    #[serde(default)]
    pub low: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendSeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: i64,
    #[serde(default)]
    pub neutral: i64,
    #[serde(default)]
    pub negative: i64,
}

/// At most one ML annotation pair is populated per record; both absent
/// means annotation is pending or unsupported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default)]
    pub salesperson: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub lead_label: Option<String>,
    #[serde(default)]
    pub lead_score: Option<f64>,
    #[serde(default)]
    pub sentiment_label: Option<String>,
}

// --- View models handed to the black-box chart layer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartSurface {
    LeadQuality,
    Trend,
    Sentiment,
    WordCloud,
}

impl ChartSurface {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartSurface::LeadQuality => "leadQuality",
            ChartSurface::Trend => "trend",
            ChartSurface::Sentiment => "sentiment",
            ChartSurface::WordCloud => "wordCloud",
        }
    }
}

/// Typed data series for one drawing surface. The chart library is a
/// black box: it receives labels, series, and colors and owns the pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBinding {
    pub surface: ChartSurface,
    pub chart_kind: &'static str,
    pub labels: Vec<String>,
    pub series: Vec<f64>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsText {
    pub total: String,
    pub week: String,
    pub active_sales: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackCard {
    pub salesperson: String,
    pub text: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<crate::models::submission::ScoreBadge>,
}

/// Output of one refresh cycle: five independent renderer slots fanned
/// out from the same snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRender {
    pub generated_at: String,
    pub stats: StatsText,
    pub lead_quality: ChartBinding,
    pub trend: ChartBinding,
    pub sentiment: ChartBinding,
    pub word_cloud: ChartBinding,
    pub recent: Vec<FeedbackCard>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDownload {
    pub path: String,
    pub file_name: String,
    pub bytes_written: usize,
}
