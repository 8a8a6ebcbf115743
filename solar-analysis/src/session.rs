use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};
use crate::ingest::EncodedImagePayload;
use crate::models::SolarAnalysis;

/// Where a session currently sits in the upload/analyze cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    ImageReady,
    Analyzing,
    ResultReady,
}

/// One user's interactive session: at most one encoded upload and at most
/// one analysis result, replaced wholesale on each successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub phase: SessionPhase,
    /// Held for the next analyze action. Skipped on serialization so status
    /// responses don't ship megabytes of base64.
    #[serde(skip)]
    pub image: Option<EncodedImagePayload>,
    pub analysis: Option<SolarAnalysis>,
    pub status_message: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase: SessionPhase::Idle,
            image: None,
            analysis: None,
            status_message: None,
        }
    }

    /// A new upload replaces the held image and rewinds the phase. Any
    /// previous result stays in its slot until the next successful analysis
    /// overwrites it.
    pub fn accept_image(&mut self, image: EncodedImagePayload) {
        self.image = Some(image);
        self.phase = SessionPhase::ImageReady;
        self.status_message = None;
    }

    /// Enter the in-flight state, handing the encoded payload to the caller.
    pub fn begin_analysis(&mut self) -> Result<EncodedImagePayload> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| AnalyzerError::MissingImage(self.id.clone()))?;
        self.phase = SessionPhase::Analyzing;
        Ok(image)
    }

    pub fn complete_analysis(&mut self, analysis: SolarAnalysis) {
        self.analysis = Some(analysis);
        self.phase = SessionPhase::ResultReady;
        self.status_message = Some("Analysis complete".to_string());
    }

    /// A failed call drops back to `ImageReady` so the user can retry
    /// manually. The previous result, if any, is left untouched.
    pub fn fail_analysis(&mut self, message: impl Into<String>) {
        self.phase = SessionPhase::ImageReady;
        self.status_message = Some(message.into());
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage. Nothing survives a restart.
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EncodedImagePayload {
        EncodedImagePayload {
            base64: "aGVsbG8=".to_string(),
            mime: "image/jpeg".to_string(),
        }
    }

    fn analysis(score: u8) -> SolarAnalysis {
        SolarAnalysis {
            rooftop_area_sqft: 1200.0,
            solar_suitability_score: score,
            roof_orientation: "West".to_string(),
            estimated_panel_capacity_kw: 9.6,
            annual_energy_production_kwh: 11000.0,
            estimated_installation_cost: 33000.0,
            annual_savings: 1430.0,
            payback_period_years: 8.0,
            key_observations: vec![],
            recommendations: vec![],
        }
    }

    #[test]
    fn walks_the_full_phase_cycle() {
        let mut session = Session::new("s1");
        assert_eq!(session.phase, SessionPhase::Idle);

        session.accept_image(payload());
        assert_eq!(session.phase, SessionPhase::ImageReady);

        let image = session.begin_analysis().unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(session.phase, SessionPhase::Analyzing);

        session.complete_analysis(analysis(8));
        assert_eq!(session.phase, SessionPhase::ResultReady);
        assert_eq!(session.analysis.as_ref().unwrap().solar_suitability_score, 8);

        // A new upload rewinds the phase but keeps the old result around
        // until the next successful analysis replaces it.
        session.accept_image(payload());
        assert_eq!(session.phase, SessionPhase::ImageReady);
        assert!(session.analysis.is_some());
    }

    #[test]
    fn failure_returns_to_image_ready_and_keeps_the_previous_result() {
        let mut session = Session::new("s1");
        session.accept_image(payload());
        session.begin_analysis().unwrap();
        session.complete_analysis(analysis(7));

        session.accept_image(payload());
        session.begin_analysis().unwrap();
        session.fail_analysis("analysis request failed: connection refused");

        assert_eq!(session.phase, SessionPhase::ImageReady);
        assert_eq!(session.analysis.as_ref().unwrap().solar_suitability_score, 7);
        assert!(
            session
                .status_message
                .as_deref()
                .unwrap()
                .contains("connection refused")
        );
    }

    #[test]
    fn analyze_without_an_upload_is_rejected() {
        let mut session = Session::new("s1");
        match session.begin_analysis() {
            Err(AnalyzerError::MissingImage(id)) => assert_eq!(id, "s1"),
            other => panic!("expected missing image error, got {other:?}"),
        }
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn storage_round_trips_and_deletes() {
        let storage = InMemorySessionStorage::new();

        let mut session = Session::new("session1");
        session.accept_image(payload());
        storage.save(session).await.unwrap();

        let loaded = storage.get("session1").await.unwrap().unwrap();
        assert_eq!(loaded.phase, SessionPhase::ImageReady);

        assert!(storage.get("other").await.unwrap().is_none());

        storage.delete("session1").await.unwrap();
        assert!(storage.get("session1").await.unwrap().is_none());
    }
}
