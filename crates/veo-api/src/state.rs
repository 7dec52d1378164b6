//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use veo_client::{SimulatedGenerator, VeoClient, VideoGenerator};
use veo_storage::{SpacesClient, VideoPublisher};

use crate::auth::Authenticator;
use crate::config::ServiceConfig;
use crate::services::{Orchestrator, OrchestratorSettings};
use crate::store::TaskStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub auth: Arc<Authenticator>,
    pub store: Arc<TaskStore>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Create application state, wiring the generator and publisher the
    /// configuration asks for.
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let generator: Arc<dyn VideoGenerator> = if config.simulate {
            warn!("VEO_SIMULATE is on; videos will not be generated");
            Arc::new(SimulatedGenerator::new(config.simulate_delay))
        } else {
            let veo = config.veo_config().context("GOOGLE_API_KEY is required")?;
            info!(model = %veo.model, "Using Veo generator");
            Arc::new(VeoClient::new(veo).context("Failed to create Veo client")?)
        };

        let publisher: Option<Arc<dyn VideoPublisher>> = match (&config.storage, config.simulate) {
            (Some(_), true) => {
                warn!("Storage is configured but ignored while simulating");
                None
            }
            (Some(storage), false) => {
                info!(bucket = %storage.bucket_name, "Publishing videos to object storage");
                let client =
                    SpacesClient::new(storage.clone()).context("Failed to create storage client")?;
                Some(Arc::new(client) as Arc<dyn VideoPublisher>)
            }
            (None, _) => None,
        };

        Ok(Self::with_generator(config, generator, publisher))
    }

    /// Create application state around an explicit generator.
    pub fn with_generator(
        config: ServiceConfig,
        generator: Arc<dyn VideoGenerator>,
        publisher: Option<Arc<dyn VideoPublisher>>,
    ) -> Self {
        let store = Arc::new(TaskStore::new(
            config.max_concurrent_tasks,
            config.max_retained_tasks,
        ));
        let settings = OrchestratorSettings {
            limits: config.limits(),
            poll_interval: config.poll_interval,
            timeout: config.generation_timeout,
        };
        let orchestrator = Orchestrator::new(Arc::clone(&store), generator, publisher, settings);
        let auth = Arc::new(Authenticator::new(config.api_key.clone(), config.require_auth));

        Self {
            config: Arc::new(config),
            auth,
            store,
            orchestrator,
        }
    }
}
