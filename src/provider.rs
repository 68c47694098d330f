//! Calamari service providers.
//!
//! A [`CalamariProvider`] adapts one processor type of the Calamari
//! microservice to the host's [`ServiceProvider`] contract. It resolves the
//! endpoint, fetches the capability description once and caches it, answers
//! model/description queries from that cache and pings the scheduler for
//! premises.
//!
//! Lifecycle calls take `&mut self`; queries take `&self`. Hosts that share a
//! provider between tasks put it behind a read/write lock.

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{DescriptionResponse, ProcessorType, RequestMappings};
use crate::client::MsaClient;
use crate::config::{
    Endpoint, MicroserviceArchitecture, ProcessorSettings, ServiceProviderConfiguration, Settings,
};
use crate::error::{ProviderError, ProviderResult};
use crate::locale::Locale;
use crate::model::{build_model, Model};
use crate::premise::{Premise, Target};

/// Host-facing contract of a processor service provider.
#[async_trait::async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Provider id, e.g. `calamari/recognition`.
    fn provider(&self) -> String;
    fn name(&self, locale: &Locale) -> String;
    fn description(&self, locale: &Locale) -> Option<String>;
    fn categories(&self) -> Option<Vec<String>>;
    fn steps(&self) -> Option<Vec<String>>;
    fn version(&self) -> f32;
    fn index(&self) -> i32;
    async fn premise(&self, target: &Target) -> Premise;
    fn model(&self, target: &Target) -> Option<Model>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Started,
    Failed,
}

/// Provider for one Calamari processor type.
pub struct CalamariProvider {
    kind: ProcessorType,
    registry: MicroserviceArchitecture,
    settings: Settings,
    processor: ProcessorSettings,
    mappings: RequestMappings,
    state: LifecycleState,
    endpoint: Option<Endpoint>,
    client: Option<MsaClient>,
    description: Option<DescriptionResponse>,
}

impl CalamariProvider {
    pub fn new(
        kind: ProcessorType,
        configuration: ServiceProviderConfiguration,
        registry: MicroserviceArchitecture,
    ) -> Self {
        let settings = Settings::resolve(&configuration);
        let processor = ProcessorSettings::resolve(&configuration, kind);

        Self {
            kind,
            registry,
            settings,
            processor,
            mappings: RequestMappings::new(kind),
            state: LifecycleState::Uninitialized,
            endpoint: None,
            client: None,
            description: None,
        }
    }

    pub fn kind(&self) -> ProcessorType {
        self.kind
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn mappings(&self) -> &RequestMappings {
        &self.mappings
    }

    /// How long the execution path waits for the active-processor handshake.
    /// Settings are resolved once, when the provider is built.
    pub fn timeout_active_processor(&self) -> Duration {
        self.settings.timeout_active_processor()
    }

    /// Cached capability description, if any.
    pub fn capability_description(&self) -> Option<&DescriptionResponse> {
        self.description.as_ref()
    }

    /// Transport client for the execution path, once initialized.
    pub fn client(&self) -> Option<&MsaClient> {
        self.client.as_ref()
    }

    /// Resolve the endpoint and fetch the description.
    ///
    /// On failure the provider is `Failed` and holds no description.
    pub async fn initialize(&mut self) -> ProviderResult<()> {
        self.description = None;

        match self.connect_and_fetch().await {
            Ok(description) => {
                info!(
                    "{} provider initialized ({} fields)",
                    self.kind,
                    description.field_count()
                );
                self.description = Some(description);
                self.state = LifecycleState::Initialized;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    /// Initialize unless a description is already cached.
    pub async fn start(&mut self) -> ProviderResult<()> {
        if self.description.is_none() {
            self.initialize().await?;
        }
        self.state = LifecycleState::Started;
        Ok(())
    }

    /// Same as [`start`](Self::start): re-fetches only when nothing is cached.
    /// Use [`refresh`](Self::refresh) to pick up a changed remote schema.
    pub async fn restart(&mut self) -> ProviderResult<()> {
        self.start().await
    }

    /// Force a fresh fetch. The cache is replaced only on success; on failure
    /// the previous description is kept and the error is returned.
    pub async fn refresh(&mut self) -> ProviderResult<()> {
        let description = self.connect_and_fetch().await?;
        info!(
            "{} provider refreshed ({} fields)",
            self.kind,
            description.field_count()
        );
        self.description = Some(description);
        self.state = LifecycleState::Started;
        Ok(())
    }

    async fn connect_and_fetch(&mut self) -> ProviderResult<DescriptionResponse> {
        let endpoint = Endpoint::resolve(&self.settings, &self.registry).map_err(|e| {
            warn!("{} provider could not be initialized - {}", self.kind, e);
            e
        })?;

        let client = MsaClient::new(endpoint.base_url.clone());
        self.endpoint = Some(endpoint);
        self.client = Some(client.clone());

        client
            .fetch_description(&self.mappings.description)
            .await
            .map_err(|e| {
                warn!(
                    "{} provider could not be initialized ({}) - {}",
                    self.kind,
                    client.url(&self.mappings.description),
                    e
                );
                e
            })
    }

    async fn ping(&self) -> ProviderResult<()> {
        self.client
            .as_ref()
            .ok_or(ProviderError::NotInitialized)?
            .ping()
            .await
    }
}

#[async_trait::async_trait]
impl ServiceProvider for CalamariProvider {
    fn provider(&self) -> String {
        format!("calamari/{}", self.kind)
    }

    fn name(&self, _locale: &Locale) -> String {
        self.processor.identifier.clone()
    }

    fn description(&self, _locale: &Locale) -> Option<String> {
        self.description
            .as_ref()
            .and_then(|d| d.description.clone())
            .or_else(|| Some(self.processor.description.clone()))
    }

    fn categories(&self) -> Option<Vec<String>> {
        self.description.as_ref().map(|d| d.categories.clone())
    }

    fn steps(&self) -> Option<Vec<String>> {
        self.description.as_ref().map(|d| d.steps.clone())
    }

    fn version(&self) -> f32 {
        1.0
    }

    fn index(&self) -> i32 {
        100
    }

    async fn premise(&self, _target: &Target) -> Premise {
        match self.ping().await {
            Ok(()) => Premise::ready(),
            Err(e) => {
                let message = format!("trouble contacting calamari msa - {}", e);
                warn!("{}: {}", self.kind, message);
                Premise::block(message)
            }
        }
    }

    fn model(&self, _target: &Target) -> Option<Model> {
        build_model(self.description.as_ref())
    }
}
