use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use roadmap_core::model::{
    Resource, ResourceError, ResourceId, ResourceKind, RoadmapRequest, RoadmapStep, StepId,
};

use crate::error::ProviderError;

//
// ─── PROVIDER CONTRACT ─────────────────────────────────────────────────────────
//

/// External collaborator that turns a (technology, timeframe) pair into an
/// ordered step list.
///
/// Callers must treat this as fallible and slow: failures surface as
/// `ProviderError` with a user-displayable message, and responses may arrive
/// after the caller has moved on (the session's ticket sequencing handles
/// that).
#[async_trait]
pub trait RoadmapProvider: Send + Sync {
    /// Generate the ordered steps for one request.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the provider is not configured, the
    /// request fails, or the response cannot be turned into steps.
    async fn generate(&self, request: &RoadmapRequest) -> Result<Vec<RoadmapStep>, ProviderError>;
}

//
// ─── GEMINI PROVIDER ───────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("GEMINI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("ROADMAP_AI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
        let model = env::var("ROADMAP_AI_MODEL").unwrap_or_else(|_| "gemini-1.5-pro".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Roadmap generation backed by the Gemini text-generation endpoint.
///
/// Constructed without a config it stays inert and reports `NotConfigured`
/// on every call.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    config: Option<GeminiConfig>,
}

impl GeminiProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeminiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeminiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl RoadmapProvider for GeminiProvider {
    async fn generate(&self, request: &RoadmapRequest) -> Result<Vec<RoadmapStep>, ProviderError> {
        let config = self.config.as_ref().ok_or(ProviderError::NotConfigured)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            config.base_url.trim_end_matches('/'),
            config.model,
            config.api_key,
        );
        let payload = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: build_prompt(request),
                }],
            }],
        };

        tracing::debug!(model = %config.model, "calling generation endpoint");
        let response = self.client.post(url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(ProviderError::EmptyResponse)?;

        parse_roadmap_payload(&text)
    }
}

fn build_prompt(request: &RoadmapRequest) -> String {
    format!(
        r#"Create a detailed learning roadmap for {technology}.
The learner wants to master this technology in {timeframe}.

Provide a structured path with:
1. Clear sequential steps from beginner to advanced
2. For each step, include specific topics to cover
3. For each step, recommend 2-3 high-quality learning resources (videos, articles, tutorials)
4. Estimate how long each step might take within the {timeframe} timeframe

Format the response as JSON with the following structure:
{{
  "roadmap": [
    {{
      "id": "unique-id",
      "title": "Step title",
      "description": "Detailed description of what to learn",
      "estimatedTime": "Time estimate for this step",
      "resources": [
        {{
          "id": "resource-id",
          "title": "Resource title",
          "type": "video|article|tutorial",
          "url": "URL to the resource",
          "source": "Source name (e.g., YouTube, Medium)"
        }}
      ]
    }}
  ]
}}"#,
        technology = request.technology(),
        timeframe = request.timeframe(),
    )
}

/// Pulls the first JSON object out of the candidate text, tolerating prose
/// around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

/// Parses and validates the provider's JSON payload into domain steps.
///
/// # Errors
///
/// Returns `ProviderError::Malformed` for missing/invalid JSON, an empty step
/// list, or resources that fail domain validation.
pub(crate) fn parse_roadmap_payload(text: &str) -> Result<Vec<RoadmapStep>, ProviderError> {
    let json = extract_json_object(text)
        .ok_or_else(|| ProviderError::Malformed("no JSON object in response".into()))?;
    let payload: RoadmapPayload =
        serde_json::from_str(json).map_err(|err| ProviderError::Malformed(err.to_string()))?;

    if payload.roadmap.is_empty() {
        return Err(ProviderError::Malformed("roadmap has no steps".into()));
    }

    payload
        .roadmap
        .into_iter()
        .map(StepPayload::into_step)
        .collect()
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct RoadmapPayload {
    roadmap: Vec<StepPayload>,
}

#[derive(Debug, Deserialize)]
struct StepPayload {
    id: String,
    title: String,
    description: String,
    #[serde(rename = "estimatedTime")]
    estimated_time: String,
    #[serde(default)]
    resources: Vec<ResourcePayload>,
}

#[derive(Debug, Deserialize)]
struct ResourcePayload {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: ResourceKind,
    url: String,
    source: String,
}

impl StepPayload {
    fn into_step(self) -> Result<RoadmapStep, ProviderError> {
        let resources = self
            .resources
            .into_iter()
            .map(ResourcePayload::into_resource)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        Ok(RoadmapStep::new(
            StepId::new(self.id),
            self.title,
            self.description,
            self.estimated_time,
            resources,
        ))
    }
}

impl ResourcePayload {
    fn into_resource(self) -> Result<Resource, ResourceError> {
        Resource::new(
            ResourceId::new(self.id),
            self.title,
            self.kind,
            self.url,
            self.source,
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::model::Timeframe;

    const VALID_PAYLOAD: &str = r#"{
        "roadmap": [
            {
                "id": "step1",
                "title": "Rust Fundamentals",
                "description": "Learn the core concepts and basics of Rust.",
                "estimatedTime": "2 weeks",
                "resources": [
                    {
                        "id": "res1",
                        "title": "Introduction to Rust",
                        "type": "video",
                        "url": "https://example.com/intro",
                        "source": "YouTube"
                    }
                ]
            },
            {
                "id": "step2",
                "title": "Intermediate Rust",
                "description": "Build on your foundation.",
                "estimatedTime": "3 weeks",
                "resources": []
            }
        ]
    }"#;

    #[tokio::test]
    async fn unconfigured_provider_reports_not_configured() {
        let provider = GeminiProvider::new(None);
        assert!(!provider.enabled());

        let request = RoadmapRequest::new("Rust", Timeframe::ThreeMonths).unwrap();
        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
        assert_eq!(err.to_string(), "provider not configured");
    }

    #[test]
    fn parses_valid_payload_into_steps() {
        let steps = parse_roadmap_payload(VALID_PAYLOAD).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, StepId::new("step1"));
        assert_eq!(steps[0].resources.len(), 1);
        assert_eq!(steps[0].resources[0].kind, ResourceKind::Video);
        assert_eq!(steps[1].estimated_time, "3 weeks");
    }

    #[test]
    fn tolerates_prose_around_the_json_object() {
        let wrapped = format!("Here is your roadmap:\n```json\n{VALID_PAYLOAD}\n```\nEnjoy!");
        let steps = parse_roadmap_payload(&wrapped).unwrap();
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn rejects_text_without_json() {
        let err = parse_roadmap_payload("sorry, I cannot help with that").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn rejects_empty_step_list() {
        let err = parse_roadmap_payload(r#"{"roadmap": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn rejects_invalid_resource_url() {
        let payload = r#"{
            "roadmap": [
                {
                    "id": "step1",
                    "title": "Fundamentals",
                    "description": "Basics.",
                    "estimatedTime": "1 week",
                    "resources": [
                        {
                            "id": "res1",
                            "title": "Broken",
                            "type": "article",
                            "url": "not a url",
                            "source": "Medium"
                        }
                    ]
                }
            ]
        }"#;
        let err = parse_roadmap_payload(payload).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn prompt_mentions_technology_and_timeframe() {
        let request = RoadmapRequest::new("React", Timeframe::SixMonths).unwrap();
        let prompt = build_prompt(&request);
        assert!(prompt.contains("React"));
        assert!(prompt.contains("6 months"));
        assert!(prompt.contains("\"roadmap\""));
    }
}
