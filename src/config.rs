//! Service provider configuration.
//!
//! Settings are looked up through [`CollectionKey`]s (collection, key, default).
//! Values come from the process environment (optionally seeded from `.env`)
//! under `{COLLECTION}_{KEY}` names, e.g. `CALAMARI_MSA_HOST_ID`. Values are
//! trimmed and blank values fall back to the key's default.
//!
//! Microservice hosts are registered in a [`MicroserviceArchitecture`], loaded
//! from the JSON file named by `MSA_CONFIG` or from the `MSA_HOSTS` list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::ProcessorType;
use crate::error::{ProviderError, ProviderResult};

/// The service provider collection name.
pub const COLLECTION_NAME: &str = "calamari";

/// A configuration key with its collection and default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionKey {
    pub collection: &'static str,
    pub key: &'static str,
    pub default_value: &'static str,
}

impl CollectionKey {
    pub const fn new(key: &'static str, default_value: &'static str) -> Self {
        Self {
            collection: COLLECTION_NAME,
            key,
            default_value,
        }
    }

    /// Environment variable name, e.g. `CALAMARI_MSA_HOST_ID`.
    pub fn env_name(&self) -> String {
        format!("{}_{}", self.collection, self.key)
            .to_uppercase()
            .replace(['-', '.'], "_")
    }
}

pub const HOST_ID: CollectionKey = CollectionKey::new("msa-host-id", "calamari");
pub const HOST_PROTOCOL: CollectionKey = CollectionKey::new("msa-host-protocol", "http");
pub const TIMEOUT_ACTIVE_PROCESSOR: CollectionKey =
    CollectionKey::new("msa-timeout-active-processor", "15000");

pub const EVALUATION_ID: CollectionKey = CollectionKey::new("evaluation-id", "evaluation");
pub const EVALUATION_DESCRIPTION: CollectionKey =
    CollectionKey::new("evaluation-description", "Calamari evaluation processor");
pub const RECOGNITION_ID: CollectionKey = CollectionKey::new("recognition-id", "recognition");
pub const RECOGNITION_DESCRIPTION: CollectionKey =
    CollectionKey::new("recognition-description", "Calamari recognition processor");
pub const TRAINING_ID: CollectionKey = CollectionKey::new("training-id", "training");
pub const TRAINING_DESCRIPTION: CollectionKey =
    CollectionKey::new("training-description", "Calamari training processor");

/// Identifier and description keys of a processor type.
pub fn processor_keys(kind: ProcessorType) -> (CollectionKey, CollectionKey) {
    match kind {
        ProcessorType::Evaluation => (EVALUATION_ID, EVALUATION_DESCRIPTION),
        ProcessorType::Recognition => (RECOGNITION_ID, RECOGNITION_DESCRIPTION),
        ProcessorType::Training => (TRAINING_ID, TRAINING_DESCRIPTION),
    }
}

/// Raw configuration values keyed by environment-style name.
#[derive(Debug, Clone, Default)]
pub struct ServiceProviderConfiguration {
    values: HashMap<String, String>,
}

impl ServiceProviderConfiguration {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self {
            values: std::env::vars().collect(),
        }
    }

    /// Build a configuration from `(CollectionKey, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (CollectionKey, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.env_name(), value.to_string()))
                .collect(),
        }
    }

    /// Trimmed value for the key, or its default when missing or blank.
    pub fn value(&self, key: &CollectionKey) -> String {
        match self.values.get(&key.env_name()).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => key.default_value.to_string(),
        }
    }
}

/// Resolved settings shared by all processor types.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host_id: String,
    pub protocol: String,
    /// Milliseconds, never negative.
    pub timeout_active_processor: u64,
}

impl Settings {
    pub fn resolve(configuration: &ServiceProviderConfiguration) -> Self {
        Self {
            host_id: configuration.value(&HOST_ID),
            protocol: configuration.value(&HOST_PROTOCOL),
            timeout_active_processor: parse_timeout(&configuration.value(&TIMEOUT_ACTIVE_PROCESSOR)),
        }
    }

    pub fn timeout_active_processor(&self) -> Duration {
        Duration::from_millis(self.timeout_active_processor)
    }
}

fn parse_timeout(value: &str) -> u64 {
    let millis = value.parse::<i64>().unwrap_or_else(|_| {
        TIMEOUT_ACTIVE_PROCESSOR
            .default_value
            .parse()
            .unwrap_or_default()
    });
    millis.max(0) as u64
}

/// Identifier and description configured for one processor type.
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub identifier: String,
    pub description: String,
}

impl ProcessorSettings {
    pub fn resolve(configuration: &ServiceProviderConfiguration, kind: ProcessorType) -> Self {
        let (id_key, description_key) = processor_keys(kind);

        Self {
            identifier: configuration.value(&id_key),
            description: configuration.value(&description_key),
        }
    }
}

/// A registered microservice host. `url` has no scheme, e.g. `worker.local:9000`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub url: String,
}

/// Registry mapping logical microservice ids to network addresses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MicroserviceArchitecture {
    #[serde(default)]
    hosts: HashMap<String, Host>,
}

impl MicroserviceArchitecture {
    /// Load from `MSA_CONFIG` (JSON file) if set, else from `MSA_HOSTS`.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var("MSA_CONFIG") {
            return Self::load_from_file(Path::new(&path));
        }

        let hosts = std::env::var("MSA_HOSTS").unwrap_or_default();
        Ok(Self::parse_list(&hosts))
    }

    /// Load a registry from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read msa config: {:?}", path))?;

        let registry: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse msa config: {:?}", path))?;

        info!("Loaded {} msa hosts from {:?}", registry.hosts.len(), path);
        Ok(registry)
    }

    /// Parse `id=url` pairs separated by commas. Malformed pairs are skipped.
    pub fn parse_list(list: &str) -> Self {
        let mut registry = Self::default();
        for pair in list.split(',') {
            match pair.split_once('=') {
                Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                    registry.register(id.trim(), url.trim());
                }
                _ if pair.trim().is_empty() => {}
                _ => debug!("Skipping malformed msa host entry '{}'", pair),
            }
        }
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, url: impl Into<String>) {
        self.hosts.insert(id.into(), Host { url: url.into() });
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// A resolved microservice endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host_id: String,
    pub protocol: String,
    /// `{protocol}://{host url}` without trailing slash.
    pub base_url: String,
}

impl Endpoint {
    /// Resolve the configured host id against the registry.
    pub fn resolve(settings: &Settings, registry: &MicroserviceArchitecture) -> ProviderResult<Self> {
        let host = registry.host(&settings.host_id).ok_or_else(|| {
            ProviderError::configuration(format!(
                "unknown host configuration for msa id {}.",
                settings.host_id
            ))
        })?;

        let base_url = format!(
            "{}://{}",
            settings.protocol,
            host.url.trim().trim_end_matches('/')
        );

        reqwest::Url::parse(&base_url).map_err(|e| {
            ProviderError::configuration(format!(
                "invalid url '{}' for msa id {}: {}",
                base_url, settings.host_id, e
            ))
        })?;

        Ok(Self {
            host_id: settings.host_id.clone(),
            protocol: settings.protocol.clone(),
            base_url,
        })
    }
}
