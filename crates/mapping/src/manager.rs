//! Field mapping session manager.
//!
//! [`SessionManager`] owns every open [`IntegrationMappingSession`], one
//! mutex per session, and exposes the mapping operations to the
//! presentation layer. It is constructed per user context and shared via
//! `Arc`; there is no process-wide instance.
//!
//! Analysis runs never hold a session lock while the scorer is working.
//! Pending fields are snapshotted, scored concurrently, and the results are
//! applied only to fields that are still pending once scoring finishes, so
//! a user edit made mid-run always survives.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use pm33_core::discovery::DiscoveredField;
use pm33_core::export::{ExportedField, MappingExport};
use pm33_core::schema;
use pm33_core::types::{IntegrationId, Timestamp};
use pm33_core::{CoreError, FieldMapping, IntegrationMappingSession, MappingStatus, MappingSummary};
use pm33_events::bus::{
    EVENT_MAPPING_ANALYZED, EVENT_MAPPING_IGNORED, EVENT_MAPPING_TARGET_SET,
    EVENT_SESSION_CLOSED, EVENT_SESSION_OPENED, EVENT_SESSION_SYNCED,
};
use pm33_events::{EventBus, MappingEvent};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::scorer::{FieldScore, FieldScorer, ScoreError};

type SessionHandle = Arc<Mutex<IntegrationMappingSession>>;

// ---------------------------------------------------------------------------
// Analysis report
// ---------------------------------------------------------------------------

/// A field whose score could not be obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedScore {
    pub source_field: String,
    pub error: String,
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub integration_id: IntegrationId,
    /// Fields that received a new confidence and suggestion.
    pub scored: Vec<String>,
    /// Fields that left `pending` while the run was in flight.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedScore>,
    /// Session aggregate confidence after the run.
    pub confidence: f64,
    /// `true` if the run was cancelled and nothing was applied.
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Owns the mapping sessions of one user context.
pub struct SessionManager {
    sessions: RwLock<HashMap<IntegrationId, SessionHandle>>,
    scorer: Arc<dyn FieldScorer>,
    config: AnalysisConfig,
    events: Arc<EventBus>,
}

impl SessionManager {
    pub fn new(scorer: Arc<dyn FieldScorer>, config: AnalysisConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            scorer,
            config,
            events: Arc::new(EventBus::default()),
        }
    }

    /// Publish on a shared bus instead of a private one.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Subscribe to mapping events from this manager.
    pub fn subscribe(&self) -> broadcast::Receiver<MappingEvent> {
        self.events.subscribe()
    }

    // ---- lifecycle ----

    /// Register a session for its integration.
    ///
    /// A session is created once per integration: if one is already open
    /// for the same id, it is kept and its snapshot returned. The session is
    /// validated first and its aggregate confidence recomputed with the
    /// configured cap.
    pub async fn open_session(
        &self,
        mut session: IntegrationMappingSession,
    ) -> Result<IntegrationMappingSession, CoreError> {
        session.validate()?;
        session.recompute_confidence(self.config.confidence_cap);

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.integration_id) {
            tracing::debug!(
                integration_id = %session.integration_id,
                "Session already open, keeping existing state",
            );
            return Ok(existing.lock().await.clone());
        }

        let integration_id = session.integration_id.clone();
        let fields = session.mappings.len();
        sessions.insert(integration_id.clone(), Arc::new(Mutex::new(session.clone())));
        drop(sessions);

        tracing::info!(integration_id = %integration_id, fields, "Mapping session opened");
        self.events.publish(
            MappingEvent::new(EVENT_SESSION_OPENED, integration_id)
                .with_payload(serde_json::json!({ "fields": fields })),
        );
        Ok(session)
    }

    /// Build a session from a schema scan and open it.
    ///
    /// Initial statuses follow the configured thresholds.
    pub async fn open_discovered(
        &self,
        integration_id: &str,
        display_name: &str,
        fields: Vec<DiscoveredField>,
    ) -> Result<IntegrationMappingSession, CoreError> {
        let session = IntegrationMappingSession::from_discovery(
            integration_id,
            display_name,
            fields,
            &self.config.thresholds,
        )?;
        self.open_session(session).await
    }

    /// Discard a session. Returns `false` if none was open.
    pub async fn close_session(&self, integration_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(integration_id).is_some();
        if removed {
            tracing::info!(integration_id, "Mapping session closed");
            self.events
                .publish(MappingEvent::new(EVENT_SESSION_CLOSED, integration_id));
        }
        removed
    }

    /// Snapshot of one session.
    pub async fn session(
        &self,
        integration_id: &str,
    ) -> Result<IntegrationMappingSession, CoreError> {
        let handle = self.require(integration_id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    /// Snapshots of every open session, ordered by id.
    pub async fn sessions(&self) -> Vec<IntegrationMappingSession> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.lock().await.clone());
        }
        out.sort_by(|a, b| a.integration_id.cmp(&b.integration_id));
        out
    }

    pub async fn summary(&self, integration_id: &str) -> Result<MappingSummary, CoreError> {
        let handle = self.require(integration_id).await?;
        let session = handle.lock().await;
        Ok(session.summary())
    }

    /// Record a successful sync. Returns the new `last_synced_at`.
    pub async fn mark_synced(&self, integration_id: &str) -> Result<Timestamp, CoreError> {
        let handle = self.require(integration_id).await?;
        let now = chrono::Utc::now();
        handle.lock().await.last_synced_at = Some(now);

        tracing::info!(integration_id, synced_at = %now, "Mapping session synced");
        self.events.publish(MappingEvent::new(EVENT_SESSION_SYNCED, integration_id));
        Ok(now)
    }

    // ---- mutations ----

    /// Assign (or clear, with an empty string) the target of one field.
    ///
    /// Fails with [`CoreError::NotFound`] for an unknown session or field
    /// and [`CoreError::InvalidTransition`] for an ignored field. On error
    /// the session is left unchanged.
    pub async fn set_target_field(
        &self,
        integration_id: &str,
        source_field: &str,
        target_field: &str,
    ) -> Result<MappingStatus, CoreError> {
        let handle = self.require(integration_id).await?;
        let (status, target) = {
            let mut session = handle.lock().await;
            let status = session.set_target_field(source_field, target_field)?;
            let target = session
                .mapping(source_field)
                .map(|m| m.target_field.clone())
                .unwrap_or_default();
            (status, target)
        };

        if !target.is_empty() && !schema::is_canonical(&target) {
            tracing::debug!(
                integration_id,
                source_field,
                target_field = %target,
                "Target is not a canonical PM33 field",
            );
        }
        tracing::info!(
            integration_id,
            source_field,
            target_field = %target,
            status = %status,
            "Field target updated",
        );
        self.events.publish(
            MappingEvent::new(EVENT_MAPPING_TARGET_SET, integration_id)
                .with_field(source_field)
                .with_payload(serde_json::json!({
                    "target_field": target,
                    "status": status.as_str(),
                })),
        );
        Ok(status)
    }

    /// Exclude one field from the mapping. `ignored` is terminal.
    pub async fn ignore(&self, integration_id: &str, source_field: &str) -> Result<(), CoreError> {
        let handle = self.require(integration_id).await?;
        handle.lock().await.ignore(source_field)?;

        tracing::info!(integration_id, source_field, "Field ignored");
        self.events.publish(
            MappingEvent::new(EVENT_MAPPING_IGNORED, integration_id).with_field(source_field),
        );
        Ok(())
    }

    // ---- analysis ----

    /// Re-score every pending field of a session.
    ///
    /// Unknown sessions are a no-op and return `None`, as do sessions closed
    /// while the run was in flight. Statuses are never changed; only
    /// confidence and suggestion of fields still pending when scoring
    /// completes are updated.
    pub async fn analyze(&self, integration_id: &str) -> Option<AnalysisReport> {
        self.analyze_with_cancel(integration_id, &CancellationToken::new())
            .await
    }

    /// [`SessionManager::analyze`] with cooperative cancellation.
    ///
    /// A run cancelled before scoring completes applies nothing.
    pub async fn analyze_with_cancel(
        &self,
        integration_id: &str,
        cancel: &CancellationToken,
    ) -> Option<AnalysisReport> {
        let Some(handle) = self.handle(integration_id).await else {
            tracing::warn!(integration_id, "Analyze requested for unknown session, ignoring");
            return None;
        };

        let run_id = Uuid::new_v4();
        let pending = handle.lock().await.pending_fields();
        tracing::info!(
            integration_id,
            %run_id,
            pending = pending.len(),
            "Starting mapping analysis",
        );

        let scoring = join_all(pending.iter().map(|m| self.score_one(m)));
        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(integration_id, %run_id, "Mapping analysis cancelled");
                let confidence = handle.lock().await.confidence;
                return Some(AnalysisReport {
                    run_id,
                    integration_id: integration_id.to_string(),
                    scored: Vec::new(),
                    skipped: Vec::new(),
                    failed: Vec::new(),
                    confidence,
                    cancelled: true,
                });
            }
            results = scoring => results,
        };

        let mut report = AnalysisReport {
            run_id,
            integration_id: integration_id.to_string(),
            scored: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            confidence: 0.0,
            cancelled: false,
        };

        {
            // Held until the run is published so a concurrent close cannot
            // detach the handle in between.
            let sessions = self.sessions.read().await;
            let registered = sessions
                .get(integration_id)
                .is_some_and(|current| Arc::ptr_eq(current, &handle));
            if !registered {
                tracing::info!(
                    integration_id,
                    %run_id,
                    "Session closed during analysis, discarding scores",
                );
                return None;
            }

            let mut session = handle.lock().await;
            for (mapping, result) in pending.iter().zip(results) {
                let field = &mapping.source_field;
                match result {
                    Ok(score) => {
                        if session.apply_score(field, score.confidence, &score.suggestion) {
                            tracing::debug!(
                                integration_id,
                                source_field = %field,
                                confidence = score.confidence,
                                "Applied field score",
                            );
                            report.scored.push(field.clone());
                        } else {
                            tracing::debug!(
                                integration_id,
                                source_field = %field,
                                "Field left pending during analysis, score discarded",
                            );
                            report.skipped.push(field.clone());
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            integration_id,
                            source_field = %field,
                            error = %e,
                            "Field scoring failed",
                        );
                        report.failed.push(FailedScore {
                            source_field: field.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            report.confidence = session.recompute_confidence(self.config.confidence_cap);

            tracing::info!(
                integration_id,
                %run_id,
                scored = report.scored.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                confidence = report.confidence,
                "Mapping analysis complete",
            );
            self.events.publish(
                MappingEvent::new(EVENT_MAPPING_ANALYZED, integration_id).with_payload(
                    serde_json::json!({
                        "run_id": run_id.to_string(),
                        "scored": report.scored.len(),
                        "skipped": report.skipped.len(),
                        "failed": report.failed.len(),
                        "confidence": report.confidence,
                    }),
                ),
            );
        }

        Some(report)
    }

    /// Score one field within the configured timeout.
    async fn score_one(&self, mapping: &FieldMapping) -> Result<FieldScore, ScoreError> {
        let timeout = self.config.score_timeout;
        let score = tokio::time::timeout(timeout, self.scorer.score_field(mapping))
            .await
            .unwrap_or(Err(ScoreError::Timeout(timeout)))?;

        if !score.confidence.is_finite() {
            return Err(ScoreError::InvalidResponse(format!(
                "non-finite confidence {}",
                score.confidence
            )));
        }
        Ok(score)
    }

    // ---- export ----

    /// Mapped fields of a session in display order. Pure read.
    pub async fn export_mapped_fields(
        &self,
        integration_id: &str,
    ) -> Result<Vec<ExportedField>, CoreError> {
        let handle = self.require(integration_id).await?;
        let session = handle.lock().await;
        Ok(pm33_core::export::exported_fields(&session))
    }

    /// Export envelope stamped with the current time.
    pub async fn export(&self, integration_id: &str) -> Result<MappingExport, CoreError> {
        let handle = self.require(integration_id).await?;
        let session = handle.lock().await;
        Ok(MappingExport::from_session(&session, chrono::Utc::now()))
    }

    /// Export envelope as pretty UTF-8 JSON.
    pub async fn export_json(&self, integration_id: &str) -> Result<String, CoreError> {
        self.export(integration_id).await?.to_json()
    }

    // ---- private helpers ----

    async fn handle(&self, integration_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(integration_id).cloned()
    }

    async fn require(&self, integration_id: &str) -> Result<SessionHandle, CoreError> {
        self.handle(integration_id)
            .await
            .ok_or_else(|| CoreError::session_not_found(integration_id))
    }
}
