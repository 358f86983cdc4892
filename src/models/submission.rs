use serde::{Deserialize, Serialize};

/// The server disambiguates feedback and leads by content; the client
/// only uses the kind to address the right draft and result surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Feedback,
    Lead,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionKind::Feedback => "feedback",
            SubmissionKind::Lead => "lead",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MlResult {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ml_result: Option<MlResult>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarResponse {
    #[serde(default)]
    pub corrected_text: String,
}

/// Qualitative tier buckets keyed by the server's label; the client
/// never applies its own numeric threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Strong,
    Moderate,
    Weak,
}

impl BadgeTier {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" | "positive" => BadgeTier::Strong,
            "medium" | "neutral" => BadgeTier::Moderate,
            _ => BadgeTier::Weak,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            BadgeTier::Strong => "#059669",
            BadgeTier::Moderate => "#d97706",
            BadgeTier::Weak => "#dc2626",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBadge {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_display: Option<String>,
    pub tier: BadgeTier,
    pub color: &'static str,
}

impl ScoreBadge {
    pub fn from_label_and_score(label: &str, score: Option<f64>) -> Self {
        let tier = BadgeTier::from_label(label);
        let score_display = score
            .filter(|value| value.is_finite())
            .map(|value| format!("{:.1}", value * 100.0));
        Self {
            label: label.to_string(),
            score_display,
            tier,
            color: tier.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<ScoreBadge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarSuggestion {
    pub original: String,
    pub corrected: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistReply {
    pub reply: String,
}
