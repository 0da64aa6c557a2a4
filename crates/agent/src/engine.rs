//! Dialogue engine
//!
//! Runs one coaching turn at a time:
//!
//! ```text
//! fetch session → analyze reply → fold patterns → decide transition
//!   → ask the next question, or summarize on reaching Summary → store
//! ```
//!
//! Gateway failures never reach the caller. Each operation degrades to the
//! matching constructor in [`crate::fallback`].

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use sales_coach_config::constants::server::DEFAULT_MAX_SESSIONS;
use sales_coach_config::DialogueConfig;
use sales_coach_core::{
    CoachingGateway, DialogueSession, Error, Phase, Progress, Result, SentimentAnalysis,
    SessionRepository, SummaryBundle, UserContext,
};
use sales_coach_knowledge::KnowledgeStore;
use sales_coach_llm::heuristics;

use crate::fallback;
use crate::reply::DialogueReply;
use crate::transition::decide;

pub struct DialogueEngine {
    gateway: Arc<dyn CoachingGateway>,
    sessions: Arc<dyn SessionRepository>,
    knowledge: Option<Arc<KnowledgeStore>>,
    rules: RwLock<DialogueConfig>,
    max_sessions: usize,
}

impl DialogueEngine {
    pub fn new(
        gateway: Arc<dyn CoachingGateway>,
        sessions: Arc<dyn SessionRepository>,
        rules: DialogueConfig,
    ) -> Self {
        Self {
            gateway,
            sessions,
            knowledge: None,
            rules: RwLock::new(rules),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Pair summary challenges with knowledge-base playbooks
    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeStore>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    pub async fn gateway_available(&self) -> bool {
        self.gateway.is_available().await
    }

    pub fn rules(&self) -> DialogueConfig {
        self.rules.read().clone()
    }

    /// Swap transition rules; applies from the next turn
    pub fn update_rules(&self, rules: DialogueConfig) {
        *self.rules.write() = rules;
    }

    /// Create (or replace) a session and greet the rep
    pub async fn start_session(
        &self,
        session_id: Option<String>,
        instruction: &str,
        user_context: Option<UserContext>,
    ) -> Result<DialogueReply> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(Error::InvalidInput(
                "abstract_instruction must not be empty".to_string(),
            ));
        }

        let id = session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(DialogueSession::generate_id);

        // Early exit before spending a gateway call; the store re-checks atomically
        let replacing = self.sessions.get(&id).await?.is_some();
        if !replacing && self.sessions.count().await? >= self.max_sessions {
            return Err(self.capacity_exceeded(&id));
        }

        let user_context = user_context.unwrap_or_default();
        let mut session = DialogueSession::new(id.clone(), instruction, user_context);

        let greeting = match self.gateway.greet(instruction, &session.user_context).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Greeting failed, using fallback");
                fallback::greeting(instruction, &session.user_context)
            },
        };

        session.push_assistant(greeting.clone(), None);
        session.phase = Phase::CurrentSituation;
        if !self
            .sessions
            .put_within_capacity(session, self.max_sessions)
            .await?
        {
            return Err(self.capacity_exceeded(&id));
        }

        tracing::info!(
            session_id = %id,
            replaced = replacing,
            gateway = self.gateway.name(),
            "Dialogue session started"
        );
        record_reply("greeting");

        Ok(DialogueReply::Greeting {
            message: greeting,
            session_id: id,
            next_state: Phase::CurrentSituation,
        })
    }

    /// Handle one user reply and produce the next question or the summary
    pub async fn process_response(
        &self,
        session_id: &str,
        user_response: &str,
    ) -> Result<DialogueReply> {
        let user_response = user_response.trim();
        if user_response.is_empty() {
            return Err(Error::InvalidInput(
                "user_response must not be empty".to_string(),
            ));
        }

        let mut session = self.load(session_id).await?;

        if session.is_complete() {
            tracing::debug!(session_id, "Session already summarized");
            let bundle = session
                .summary
                .clone()
                .unwrap_or_else(|| fallback::summary(&session));
            return Ok(DialogueReply::summary(&bundle));
        }

        let started = Instant::now();
        let rules = self.rules();
        let current = session.phase;

        session.push_user(user_response);

        let analysis = match self
            .gateway
            .analyze_response(
                user_response,
                current,
                session.recent_history(rules.analysis_history_window),
            )
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(session_id, phase = %current, error = %e, "Analysis failed, using heuristics");
                fallback::analysis(user_response)
            },
        };

        session.discovered_patterns.fold(current, &analysis);

        let transition = decide(current, &analysis, session.turns_in_phase(current), &rules);
        if transition.advanced() {
            tracing::info!(
                session_id,
                from = %transition.from,
                to = %transition.to,
                reason = transition.reason.as_str(),
                "Phase transition"
            );
            metrics::counter!(
                "sales_coach_phase_transitions_total",
                "from" => transition.from.as_str(),
                "to" => transition.to.as_str()
            )
            .increment(1);
        }

        let reply = if transition.to == Phase::Summary {
            let bundle = self.summarize(&session).await;
            session.phase = Phase::Summary;
            session.push_assistant(bundle.message.clone(), None);
            let reply = DialogueReply::summary(&bundle);
            session.summary = Some(bundle);
            reply
        } else {
            let next = transition.to;
            let question = match self
                .gateway
                .generate_question(&session, &analysis, next)
                .await
            {
                Ok(question) => question,
                Err(e) => {
                    tracing::warn!(session_id, phase = %next, error = %e, "Question generation failed, using fallback");
                    fallback::question(next)
                },
            };

            session.phase = next;
            let purpose = (!question.purpose.is_empty()).then(|| question.purpose.clone());
            session.push_assistant(question.question.clone(), purpose);
            DialogueReply::question(question, next, session.progress())
        };

        self.sessions.put(session).await?;

        record_reply(reply.kind());
        metrics::histogram!("sales_coach_turn_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(reply)
    }

    pub async fn get_progress(&self, session_id: &str) -> Result<Progress> {
        Ok(self.load(session_id).await?.progress())
    }

    /// Full session state, for the history view
    pub async fn session_snapshot(&self, session_id: &str) -> Result<DialogueSession> {
        self.load(session_id).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        if self.sessions.delete(session_id).await? {
            tracing::info!(session_id, "Dialogue session deleted");
            Ok(())
        } else {
            Err(Error::SessionNotFound(session_id.to_string()))
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<String>> {
        self.sessions.list_ids().await
    }

    pub async fn session_count(&self) -> Result<usize> {
        self.sessions.count().await
    }

    /// How completely the session has been talked through, 0..=100
    pub async fn evaluate_completeness(&self, session_id: &str) -> Result<u8> {
        let session = self.load(session_id).await?;
        match self.gateway.evaluate_completeness(&session.history).await {
            Ok(score) => Ok(score.min(100)),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Completeness evaluation failed, using turn count");
                Ok(heuristics::fallback_completeness(&session.history))
            },
        }
    }

    pub async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".to_string()));
        }
        match self.gateway.analyze_sentiment(text).await {
            Ok(sentiment) => Ok(sentiment),
            Err(e) => {
                tracing::warn!(error = %e, "Sentiment analysis failed, using heuristics");
                Ok(heuristics::analyze_sentiment(text))
            },
        }
    }

    fn capacity_exceeded(&self, session_id: &str) -> Error {
        tracing::warn!(session_id, max_sessions = self.max_sessions, "Session limit reached");
        Error::CapacityExceeded(self.max_sessions)
    }

    async fn load(&self, session_id: &str) -> Result<DialogueSession> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    async fn summarize(&self, session: &DialogueSession) -> SummaryBundle {
        let bundle = match self.gateway.generate_summary(session).await {
            Ok(bundle) => bundle,
            Err(Error::MalformedOutput { raw }) => {
                tracing::warn!(session_id = %session.id, "Summary was not valid JSON, keeping raw text");
                fallback::summary_from_raw(&raw, session)
            },
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Summary failed, using fallback");
                fallback::summary(session)
            },
        };

        let mut bundle = match &self.knowledge {
            Some(knowledge) => enrich_with_knowledge(bundle, session, knowledge),
            None => bundle,
        };
        fallback::fill_open_solutions(&mut bundle);
        bundle
    }
}

/// Fill solutions for discovered challenges the plan leaves open
fn enrich_with_knowledge(
    mut bundle: SummaryBundle,
    session: &DialogueSession,
    knowledge: &KnowledgeStore,
) -> SummaryBundle {
    let plan = &mut bundle.action_plan;

    for item in plan
        .challenges_and_solutions
        .iter_mut()
        .filter(|c| c.solution.trim().is_empty())
    {
        if let Some(solution) = knowledge
            .solution_for_challenge(&item.challenge)
            .and_then(|m| m.headline())
        {
            item.solution = solution;
        }
    }

    for challenge in fallback::unique(&session.discovered_patterns.challenges) {
        if plan.addresses(&challenge) {
            continue;
        }
        if let Some(solution) = knowledge
            .solution_for_challenge(&challenge)
            .and_then(|m| m.headline())
        {
            tracing::debug!(session_id = %session.id, challenge = %challenge, "Added knowledge-base solution");
            plan.challenges_and_solutions
                .push(sales_coach_core::ChallengeSolution { challenge, solution });
        }
    }

    bundle
}

fn record_reply(kind: &'static str) {
    metrics::counter!("sales_coach_replies_total", "type" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionRepository;
    use sales_coach_llm::MockGateway;

    fn engine() -> DialogueEngine {
        DialogueEngine::new(
            Arc::new(MockGateway::new()),
            Arc::new(InMemorySessionRepository::new()),
            DialogueConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_start_generates_id() {
        let engine = engine();
        let reply = engine
            .start_session(None, "Grow customer relationships", None)
            .await
            .unwrap();
        match reply {
            DialogueReply::Greeting {
                session_id,
                next_state,
                ..
            } => {
                assert!(session_id.starts_with("ideal_"));
                assert_eq!(next_state, Phase::CurrentSituation);
                let session = engine.session_snapshot(&session_id).await.unwrap();
                assert_eq!(session.phase, Phase::CurrentSituation);
                assert_eq!(session.history.len(), 1);
                assert_eq!(session.history[0].phase, Phase::Greeting);
            },
            other => panic!("expected greeting, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.start_session(None, "  ", None).await,
            Err(Error::InvalidInput(_))
        ));
        engine
            .start_session(Some("s".to_string()), "x", None)
            .await
            .unwrap();
        assert!(matches!(
            engine.process_response("s", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(engine.session_snapshot("s").await.unwrap().history.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let engine = engine().with_max_sessions(1);
        engine
            .start_session(Some("a".to_string()), "x", None)
            .await
            .unwrap();
        assert!(matches!(
            engine.start_session(Some("b".to_string()), "x", None).await,
            Err(Error::CapacityExceeded(1))
        ));
        // restarting an existing id is still allowed
        engine
            .start_session(Some("a".to_string()), "y", None)
            .await
            .unwrap();
    }

    #[test]
    fn test_enrichment_fills_open_challenges() {
        let knowledge = KnowledgeStore::builtin().unwrap();
        let mut session = DialogueSession::new("s", "x", UserContext::default());
        session.discovered_patterns.challenges =
            vec!["Fear of rejection".to_string(), "Printer jams".to_string()];

        let bundle = enrich_with_knowledge(SummaryBundle::default(), &session, &knowledge);
        let challenges = &bundle.action_plan.challenges_and_solutions;
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].challenge, "Fear of rejection");
        assert!(!challenges[0].solution.is_empty());
    }

    #[test]
    fn test_enrichment_keeps_existing_solutions() {
        let knowledge = KnowledgeStore::builtin().unwrap();
        let mut session = DialogueSession::new("s", "x", UserContext::default());
        session.discovered_patterns.challenges = vec!["finding time".to_string()];

        let mut bundle = SummaryBundle::default();
        bundle
            .action_plan
            .challenges_and_solutions
            .push(sales_coach_core::ChallengeSolution {
                challenge: "Finding time".to_string(),
                solution: "Block Friday mornings".to_string(),
            });

        let bundle = enrich_with_knowledge(bundle, &session, &knowledge);
        assert_eq!(bundle.action_plan.challenges_and_solutions.len(), 1);
        assert_eq!(
            bundle.action_plan.challenges_and_solutions[0].solution,
            "Block Friday mornings"
        );
    }
}
