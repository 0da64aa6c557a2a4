//! Application State
//!
//! Shared state across all handlers.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use sales_coach_agent::{DialogueEngine, InMemorySessionRepository};
use sales_coach_config::{load_settings, Settings};
use sales_coach_core::{CoachingGateway, SessionRepository};
use sales_coach_knowledge::{
    ActionTemplateGenerator, KnowledgeLoader, KnowledgeStore, OneOnOneAnalyzer,
};
use sales_coach_llm::{create_gateway, MockGateway};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for hot-reload support
    pub config: Arc<RwLock<Settings>>,
    pub engine: Arc<DialogueEngine>,
    pub knowledge: Arc<KnowledgeStore>,
    pub action_plans: Arc<ActionTemplateGenerator>,
    pub one_on_one: Arc<OneOnOneAnalyzer>,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    /// Build the engine, gateway and knowledge store from settings
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let gateway: Arc<dyn CoachingGateway> =
            match create_gateway(&config.llm, &config.dialogue) {
                Ok(gateway) => gateway,
                Err(e) => {
                    tracing::warn!(error = %e, "Gateway setup failed, using mock gateway");
                    Arc::new(MockGateway::new())
                },
            };

        let knowledge = Self::load_knowledge(&config)?;
        let action_plans = ActionTemplateGenerator::builtin()
            .map_err(|e| ServerError::Internal(format!("action templates: {}", e)))?;
        let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
        Ok(Self::with_parts(
            config,
            gateway,
            sessions,
            knowledge,
            Arc::new(action_plans),
        ))
    }

    /// Assemble state around an explicit gateway and repository
    pub fn with_parts(
        config: Settings,
        gateway: Arc<dyn CoachingGateway>,
        sessions: Arc<dyn SessionRepository>,
        knowledge: Arc<KnowledgeStore>,
        action_plans: Arc<ActionTemplateGenerator>,
    ) -> Self {
        let engine = DialogueEngine::new(gateway, sessions, config.dialogue.clone())
            .with_knowledge(knowledge.clone())
            .with_max_sessions(config.server.max_sessions);

        Self {
            config: Arc::new(RwLock::new(config)),
            engine: Arc::new(engine),
            one_on_one: Arc::new(OneOnOneAnalyzer::new(knowledge.clone())),
            knowledge,
            action_plans,
            env: None,
        }
    }

    /// Remember the environment name so reloads read the same files
    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    fn load_knowledge(config: &Settings) -> Result<Arc<KnowledgeStore>, ServerError> {
        let store = KnowledgeStore::builtin()
            .map_err(|e| ServerError::Internal(format!("built-in knowledge: {}", e)))?;

        if let Some(path) = config.knowledge.path.as_deref() {
            KnowledgeLoader::load_path(&store, Path::new(path))
                .map_err(|e| ServerError::Internal(format!("knowledge at {}: {}", path, e)))?;
        }

        Ok(Arc::new(store))
    }

    /// Reload configuration from files
    ///
    /// Dialogue rules apply from the next turn. Server and gateway settings
    /// need a restart.
    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| format!("Failed to reload config: {}", e))?;

        self.engine.update_rules(new_config.dialogue.clone());
        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
