use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::dashboard::{
    ChartBinding, ChartSurface, DashboardRender, DashboardSnapshot, DashboardStats, FeedbackCard,
    FeedbackRecord, LeadBuckets, ReportDownload, SentimentCounts, StatsText, TrendSeries,
};
use crate::models::submission::ScoreBadge;
use crate::services::api_gateway::{status_error, ApiGateway, RequestOptions};
use crate::services::settings_service::SettingsService;

const LEAD_COLORS: [&str; 3] = ["#059669", "#d97706", "#dc2626"];
const SENTIMENT_COLORS: [&str; 3] = ["#059669", "#6b7280", "#dc2626"];
const TREND_COLOR: &str = "#667eea";
const REPORTS_DIR: &str = "reports";

/// The view owns at most one live chart binding per surface; installing
/// a replacement releases the prior one before the new one takes over,
/// so polling ticks never stack renders on the same surface.
#[derive(Default)]
pub struct ChartBindings {
    live: HashMap<ChartSurface, ChartBinding>,
}

impl ChartBindings {
    pub fn install(&mut self, binding: ChartBinding) -> Option<ChartBinding> {
        let released = self.live.insert(binding.surface, binding);
        if let Some(prior) = released.as_ref() {
            debug!(
                target: "app::dashboard",
                surface = prior.surface.as_str(),
                "released prior chart binding"
            );
        }
        released
    }

    pub fn live(&self, surface: ChartSurface) -> Option<&ChartBinding> {
        self.live.get(&surface)
    }

    pub fn release_all(&mut self) {
        self.live.clear();
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

/// Fetches the composite snapshot and fans it out to the renderers.
/// Doubles as the session keep-alive: a failed tick is diagnostics
/// only and leaves the previous render untouched.
pub struct DashboardService {
    gateway: Arc<ApiGateway>,
    settings: Arc<SettingsService>,
    reports_dir: PathBuf,
    last_render: RwLock<Option<DashboardRender>>,
    bindings: RwLock<ChartBindings>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl DashboardService {
    pub fn new(
        gateway: Arc<ApiGateway>,
        settings: Arc<SettingsService>,
        db_path: &Path,
    ) -> AppResult<Self> {
        let reports_dir = default_reports_dir(db_path);
        std::fs::create_dir_all(&reports_dir)?;

        Ok(Self {
            gateway,
            settings,
            reports_dir,
            last_render: RwLock::new(None),
            bindings: RwLock::new(ChartBindings::default()),
            poll_task: Mutex::new(None),
        })
    }

    /// One refresh cycle. Returns the new render on success, `None`
    /// when the server answered non-OK or with an undecodable body;
    /// in both cases the previously rendered state stays as-is.
    pub async fn refresh(&self) -> AppResult<Option<DashboardRender>> {
        let response = self
            .gateway
            .send("/api/dashboard", RequestOptions::get())
            .await?;

        if !response.is_ok() {
            debug!(
                target: "app::dashboard",
                status = response.status,
                "dashboard refresh returned non-OK, keeping previous render"
            );
            return Ok(None);
        }

        let snapshot: DashboardSnapshot = match serde_json::from_value(response.body) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    target: "app::dashboard",
                    error = %err,
                    "dashboard payload is unreadable, keeping previous render"
                );
                return Ok(None);
            }
        };

        let render = render_snapshot(&snapshot);

        if let Ok(mut bindings) = self.bindings.write() {
            bindings.install(render.lead_quality.clone());
            bindings.install(render.trend.clone());
            bindings.install(render.sentiment.clone());
            bindings.install(render.word_cloud.clone());
        }

        if let Ok(mut guard) = self.last_render.write() {
            *guard = Some(render.clone());
        }

        debug!(target: "app::dashboard", "dashboard render replaced");
        Ok(Some(render))
    }

    pub fn current_render(&self) -> Option<DashboardRender> {
        self.last_render
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn live_binding(&self, surface: ChartSurface) -> Option<ChartBinding> {
        self.bindings
            .read()
            .ok()
            .and_then(|guard| guard.live(surface).cloned())
    }

    /// Start the repeating refresh owned by the active view. Starting
    /// again replaces (and aborts) the prior task.
    pub fn start_polling(self: &Arc<Self>) -> AppResult<()> {
        let interval = self.settings.dashboard_poll_interval()?;
        let service = Arc::clone(self);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match service.refresh().await {
                    Ok(_) => {}
                    Err(err) if err.is_auth_expired() => {
                        // The gateway already cleared the session and
                        // recorded the redirect; this task just ends.
                        debug!(
                            target: "app::dashboard",
                            "poll tick after session invalidation, stopping"
                        );
                        break;
                    }
                    Err(err) => {
                        warn!(target: "app::dashboard", error = %err, "dashboard poll tick failed");
                    }
                }
            }
        });

        if let Ok(mut guard) = self.poll_task.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }

        debug!(
            target: "app::dashboard",
            interval_secs = interval.as_secs(),
            "dashboard polling started"
        );
        Ok(())
    }

    /// View teardown: cancel the repeating task and release the chart
    /// bindings the view owned.
    pub fn stop_polling(&self) {
        if let Ok(mut guard) = self.poll_task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
                debug!(target: "app::dashboard", "dashboard polling stopped");
            }
        }

        if let Ok(mut bindings) = self.bindings.write() {
            bindings.release_all();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .map(|guard| guard.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Fetch the opaque CSV blob and store it client-named by date.
    pub async fn download_report(&self) -> AppResult<ReportDownload> {
        let (status, bytes) = self.gateway.fetch_bytes("/api/download-report").await?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, "Failed to download report."));
        }

        let file_name = format!("sales_report_{}.csv", Utc::now().format("%Y-%m-%d"));
        let path = self.reports_dir.join(&file_name);
        std::fs::write(&path, &bytes)?;

        debug!(
            target: "app::dashboard",
            path = %path.display(),
            bytes = bytes.len(),
            "report downloaded"
        );

        Ok(ReportDownload {
            path: path.display().to_string(),
            file_name,
            bytes_written: bytes.len(),
        })
    }
}

impl Drop for DashboardService {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn default_reports_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .map(|parent| parent.join(REPORTS_DIR))
        .unwrap_or_else(|| PathBuf::from(REPORTS_DIR))
}

/// Fan one snapshot out to every renderer. Each renderer is defensive
/// against absent optional sub-fields and fills its slot with a zero
/// state instead of failing the cycle.
pub fn render_snapshot(snapshot: &DashboardSnapshot) -> DashboardRender {
    DashboardRender {
        generated_at: Utc::now().to_rfc3339(),
        stats: render_stats(snapshot.stats.as_ref()),
        lead_quality: render_lead_chart(
            snapshot
                .stats
                .as_ref()
                .and_then(|stats| stats.leads.as_ref()),
        ),
        trend: render_trend_chart(snapshot.trends.as_ref()),
        sentiment: render_sentiment_chart(snapshot.sentiment.as_ref()),
        word_cloud: render_word_cloud(snapshot.wordcloud_data.as_deref()),
        recent: render_recent(snapshot.recent.as_deref()),
    }
}

fn render_stats(stats: Option<&DashboardStats>) -> StatsText {
    StatsText {
        total: stats.map(|stats| stats.total).unwrap_or(0).to_string(),
        week: stats.map(|stats| stats.week).unwrap_or(0).to_string(),
        active_sales: stats
            .map(|stats| stats.active_sales)
            .unwrap_or(0)
            .to_string(),
    }
}

fn render_lead_chart(leads: Option<&LeadBuckets>) -> ChartBinding {
    let (high, medium, low) = leads
        .map(|leads| (leads.high, leads.medium, leads.low))
        .unwrap_or((0, 0, 0));

    ChartBinding {
        surface: ChartSurface::LeadQuality,
        chart_kind: "doughnut",
        labels: vec![
            "High Quality".to_string(),
            "Medium Quality".to_string(),
            "Low Quality".to_string(),
        ],
        series: vec![high as f64, medium as f64, low as f64],
        colors: LEAD_COLORS.to_vec(),
    }
}

fn render_trend_chart(trends: Option<&TrendSeries>) -> ChartBinding {
    let (labels, series) = match trends {
        Some(trends) => {
            // A truncated payload can leave the label and data series
            // different lengths; render the overlap.
            let len = trends.labels.len().min(trends.data.len());
            (
                trends.labels[..len].to_vec(),
                trends.data[..len]
                    .iter()
                    .map(|value| if value.is_finite() { *value } else { 0.0 })
                    .collect(),
            )
        }
        None => (Vec::new(), Vec::new()),
    };

    ChartBinding {
        surface: ChartSurface::Trend,
        chart_kind: "line",
        labels,
        series,
        colors: vec![TREND_COLOR],
    }
}

fn render_sentiment_chart(sentiment: Option<&SentimentCounts>) -> ChartBinding {
    let (positive, neutral, negative) = sentiment
        .map(|counts| (counts.positive, counts.neutral, counts.negative))
        .unwrap_or((0, 0, 0));

    ChartBinding {
        surface: ChartSurface::Sentiment,
        chart_kind: "doughnut",
        labels: vec![
            "Positive".to_string(),
            "Neutral".to_string(),
            "Negative".to_string(),
        ],
        series: vec![positive as f64, neutral as f64, negative as f64],
        colors: SENTIMENT_COLORS.to_vec(),
    }
}

fn render_word_cloud(terms: Option<&[JsonValue]>) -> ChartBinding {
    let mut labels = Vec::new();
    let mut series = Vec::new();

    // Entries are `[term, weight]` pairs; anything else is skipped
    // rather than sinking the whole surface.
    for entry in terms.unwrap_or_default() {
        let Some(pair) = entry.as_array() else {
            continue;
        };
        let Some(term) = pair.first().and_then(|value| value.as_str()) else {
            continue;
        };
        let Some(weight) = pair.get(1).and_then(|value| value.as_f64()) else {
            continue;
        };
        if term.is_empty() || !weight.is_finite() || weight <= 0.0 {
            continue;
        }
        labels.push(term.to_string());
        series.push(weight);
    }

    ChartBinding {
        surface: ChartSurface::WordCloud,
        chart_kind: "wordcloud",
        labels,
        series,
        colors: Vec::new(),
    }
}

fn render_recent(records: Option<&[FeedbackRecord]>) -> Vec<FeedbackCard> {
    records
        .unwrap_or_default()
        .iter()
        .map(|record| {
            let badge = match (record.lead_label.as_deref(), record.sentiment_label.as_deref()) {
                (Some(label), _) => Some(ScoreBadge::from_label_and_score(label, record.lead_score)),
                (None, Some(label)) => Some(ScoreBadge::from_label_and_score(label, None)),
                (None, None) => None,
            };

            FeedbackCard {
                salesperson: record.salesperson.clone(),
                text: record.text.clone(),
                timestamp: record.timestamp.clone(),
                badge,
            }
        })
        .collect()
}
