use std::collections::HashMap;

use plexus_common::{AliasId, ProviderId, Secret};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Openrouter,
    #[serde(rename = "openai-compatible")]
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: ProviderId,
    #[serde(rename = "type")]
    pub kind: ProviderType,
    #[serde(default)]
    pub base_url: Option<String>,
    pub api_key: Secret,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub quota_checker_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Random,
    Cost,
    Latency,
    Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasTarget {
    pub provider_id: ProviderId,
    pub canonical_slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_per_1m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_per_1m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_per_1m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_per_1m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAlias {
    pub alias_id: AliasId,
    /// Declaration order matters: Router preserves it when filtering.
    pub targets: Vec<AliasTarget>,
    #[serde(default = "default_selector")]
    pub selector: SelectorKind,
    #[serde(default)]
    pub pricing: PricingOverride,
}

fn default_selector() -> SelectorKind {
    SelectorKind::Random
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub label: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuotaCheckerConfig {
    Minimax { groupid: String, #[serde(rename = "hertzSession")] hertz_session: String },
    Generic { options: serde_json::Value },
}

/// The fully parsed, validated configuration document before it is published
/// as an immutable `ConfigSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderRecord>,
    #[serde(default)]
    pub models: HashMap<AliasId, ModelAlias>,
    #[serde(default)]
    pub keys: HashMap<String, ApiKeyRecord>,
    pub admin: AdminConfig,
    #[serde(default)]
    pub quotas: HashMap<ProviderId, QuotaCheckerConfig>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub api_key: Secret,
}
