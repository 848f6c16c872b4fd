//! Configuration structures for the bill pipeline.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use cartbill_inference::{
    GeminiBackend, GeminiSettings, InferenceProvider, OpenAiBackend, OpenAiSettings,
};

use super::store::Store;
use crate::{CartBillError, Result};

/// Main configuration for cartbill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartBillConfig {
    /// Model backend configuration.
    pub inference: InferenceConfig,

    /// Bill text configuration.
    pub bill: BillConfig,

    /// Export file configuration.
    pub export: ExportConfig,
}

/// Which model API to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Google Gemini `generateContent`.
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat completions server.
    OpenAi,
}

/// Inference backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Selected backend.
    pub backend: Backend,

    /// API key. Falls back to environment variables when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Gemini endpoint settings.
    pub gemini: EndpointConfig,

    /// OpenAI-compatible endpoint settings.
    pub openai: EndpointConfig,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Gemini,
            api_key: None,
            timeout_secs: 120,
            gemini: EndpointConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.0-flash".to_string(),
            },
            openai: EndpointConfig {
                base_url: "http://localhost:11434/v1".to_string(),
                model: "llava".to_string(),
            },
        }
    }
}

/// Base URL and model for one backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// API root.
    pub base_url: String,

    /// Model name.
    pub model: String,
}

/// Bill text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillConfig {
    /// Shop brand printed in the header and closing line.
    pub brand: String,

    /// Currency label printed after prices and the total.
    pub currency: String,

    /// Store used when none is given on the command line.
    pub default_store: Store,
}

impl Default for BillConfig {
    fn default() -> Self {
        Self {
            brand: "TSQA".to_string(),
            currency: "QAR".to_string(),
            default_store: Store::Temu,
        }
    }
}

/// Export file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name of the CSV summary.
    pub csv_file_name: String,

    /// File name of the spreadsheet summary.
    pub xlsx_file_name: String,

    /// Worksheet name inside the spreadsheet.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_file_name: "bill_summary.csv".to_string(),
            xlsx_file_name: "bill_summary.xlsx".to_string(),
            sheet_name: "Sheet1".to_string(),
        }
    }
}

const GEMINI_KEY_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];
const OPENAI_KEY_VARS: &[&str] = &["LLM_API_KEY"];

impl Backend {
    /// Environment variables consulted for the API key, in order.
    pub fn api_key_vars(&self) -> &'static [&'static str] {
        match self {
            Backend::Gemini => GEMINI_KEY_VARS,
            Backend::OpenAi => OPENAI_KEY_VARS,
        }
    }
}

impl InferenceConfig {
    /// Endpoint settings of the selected backend.
    pub fn endpoint(&self) -> &EndpointConfig {
        match self.backend {
            Backend::Gemini => &self.gemini,
            Backend::OpenAi => &self.openai,
        }
    }

    /// Resolve the API key: explicit override, then config, then environment.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        self.resolve_api_key_with(explicit, |name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.api_key.clone())
            .or_else(|| {
                self.backend
                    .api_key_vars()
                    .iter()
                    .find_map(|name| lookup(name))
            })
            .filter(|key| !key.trim().is_empty())
    }

    /// Build the provider for the selected backend.
    ///
    /// A missing Gemini key only logs a warning; the first request fails instead.
    pub fn build_provider(&self, explicit_key: Option<&str>) -> Result<Box<dyn InferenceProvider>> {
        let api_key = self.resolve_api_key(explicit_key);
        let endpoint = self.endpoint();
        let timeout = Duration::from_secs(self.timeout_secs);

        if api_key.is_none() && self.backend == Backend::Gemini {
            warn!(
                vars = ?self.backend.api_key_vars(),
                "API key not found in config or environment"
            );
        }

        info!(
            backend = ?self.backend,
            url = %endpoint.base_url,
            model = %endpoint.model,
            "Using inference backend"
        );

        let provider: Box<dyn InferenceProvider> = match self.backend {
            Backend::Gemini => Box::new(GeminiBackend::new(GeminiSettings {
                base_url: endpoint.base_url.clone(),
                model: endpoint.model.clone(),
                api_key,
                timeout,
            })?),
            Backend::OpenAi => Box::new(OpenAiBackend::new(OpenAiSettings {
                base_url: endpoint.base_url.clone(),
                model: endpoint.model.clone(),
                api_key,
                timeout,
            })?),
        };

        Ok(provider)
    }
}

impl CartBillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CartBillError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CartBillError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Value at a dotted key such as `inference.gemini.model`.
    pub fn get_key(&self, key: &str) -> Result<Value> {
        let json = self.to_json()?;
        key.split('.')
            .try_fold(&json, |node, part| node.get(part))
            .cloned()
            .ok_or_else(|| CartBillError::Config(format!("Configuration key not found: {key}")))
    }

    /// Set a dotted key and return the value stored.
    ///
    /// `raw` is read as JSON when possible, so `120` is a number and `SAR`
    /// a string. A JSON reading the field rejects is retried as a plain string.
    pub fn set_key(&mut self, key: &str, raw: &str) -> Result<Value> {
        let candidates = match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(s)) => vec![Value::String(s)],
            Ok(parsed) => vec![parsed, Value::String(raw.to_string())],
            Err(_) => vec![Value::String(raw.to_string())],
        };

        let mut last_error = None;
        for value in candidates {
            match self.with_key(key, value.clone()) {
                Ok(updated) => {
                    *self = updated;
                    return Ok(value);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| CartBillError::Config(format!("Configuration key not found: {key}"))))
    }

    /// Copy of this config with `key` replaced, checked by reading it back.
    fn with_key(&self, key: &str, value: Value) -> Result<Self> {
        let mut json = self.to_json()?;
        let (parents, leaf) = key.rsplit_once('.').unwrap_or(("", key));

        let parent = parents
            .split('.')
            .filter(|p| !p.is_empty())
            .try_fold(&mut json, |node, part| node.get_mut(part))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CartBillError::Config(format!("Configuration key not found: {key}")))?;
        parent.insert(leaf.to_string(), value.clone());

        let updated: Self = serde_json::from_value(json)
            .map_err(|e| CartBillError::Config(format!("invalid value for {key}: {e}")))?;

        // Unknown fields are dropped on deserialization, so a lost write means a bad key.
        if updated.get_key(key).ok().as_ref() != Some(&value) {
            return Err(CartBillError::Config(format!("Configuration key not found: {key}")));
        }
        Ok(updated)
    }

    fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CartBillError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CartBillConfig =
            serde_json::from_str(r#"{"bill": {"currency": "SAR"}}"#).unwrap();
        assert_eq!(config.bill.currency, "SAR");
        assert_eq!(config.bill.brand, "TSQA");
        assert_eq!(config.inference.backend, Backend::Gemini);
        assert_eq!(config.inference.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.export.csv_file_name, "bill_summary.csv");
    }

    #[test]
    fn test_backend_names() {
        let config: InferenceConfig = serde_json::from_str(r#"{"backend": "openai"}"#).unwrap();
        assert_eq!(config.backend, Backend::OpenAi);
        assert_eq!(config.endpoint().model, "llava");
    }

    #[test]
    fn test_api_key_precedence() {
        let mut config = InferenceConfig::default();
        let env = |name: &str| (name == "GEMINI_API_KEY").then(|| "from-env".to_string());

        assert_eq!(config.resolve_api_key_with(None, env), Some("from-env".to_string()));

        config.api_key = Some("from-config".to_string());
        assert_eq!(config.resolve_api_key_with(None, env), Some("from-config".to_string()));
        assert_eq!(
            config.resolve_api_key_with(Some("explicit"), env),
            Some("explicit".to_string())
        );
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let config = InferenceConfig::default();
        assert_eq!(config.resolve_api_key_with(Some("  "), |_| None), None);
    }

    #[test]
    fn test_get_key() {
        let config = CartBillConfig::default();
        assert_eq!(config.get_key("bill.currency").unwrap(), Value::from("QAR"));
        assert_eq!(config.get_key("inference.timeout_secs").unwrap(), Value::from(120));
        assert!(config.get_key("inference").unwrap().is_object());
        assert!(matches!(config.get_key("bill.tax_rate"), Err(CartBillError::Config(_))));
    }

    #[test]
    fn test_set_key_typed_values() {
        let mut config = CartBillConfig::default();

        assert_eq!(config.set_key("bill.currency", "SAR").unwrap(), Value::from("SAR"));
        assert_eq!(config.set_key("inference.timeout_secs", "30").unwrap(), Value::from(30));
        assert_eq!(config.set_key("inference.backend", "openai").unwrap(), Value::from("openai"));
        assert_eq!(config.set_key("bill.default_store", "\"noon\"").unwrap(), Value::from("noon"));

        assert_eq!(config.bill.currency, "SAR");
        assert_eq!(config.inference.timeout_secs, 30);
        assert_eq!(config.inference.backend, Backend::OpenAi);
        assert_eq!(config.bill.default_store, Store::Noon);
    }

    #[test]
    fn test_set_key_numeric_string_field() {
        let mut config = CartBillConfig::default();
        assert_eq!(config.set_key("bill.brand", "2024").unwrap(), Value::from("2024"));
        assert_eq!(config.bill.brand, "2024");
    }

    #[test]
    fn test_set_optional_api_key() {
        let mut config = CartBillConfig::default();
        config.set_key("inference.api_key", "secret").unwrap();
        assert_eq!(config.inference.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_set_key_rejects_unknown_and_invalid() {
        let mut config = CartBillConfig::default();
        assert!(config.set_key("bill.tax_rate", "5").is_err());
        assert!(config.set_key("nothing.here", "5").is_err());
        assert!(config.set_key("inference.timeout_secs", "soon").is_err());
        assert!(config.set_key("bill.default_store", "amazon").is_err());
        assert_eq!(config.inference.timeout_secs, 120);
    }

    #[test]
    fn test_build_provider_without_key() {
        let config = InferenceConfig::default();
        let provider = config.build_provider(Some("")).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.0-flash");
    }
}
