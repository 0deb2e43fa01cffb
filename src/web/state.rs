use std::sync::Arc;

use crate::course::{CertificateIssuer, CertificateRenderer, ProgressStore, SessionRegistry};
use crate::model::CourseGateway;

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<dyn CourseGateway>,
    progress: Arc<ProgressStore>,
    sessions: SessionRegistry,
    issuer: Arc<CertificateIssuer>,
    renderer: Option<Arc<dyn CertificateRenderer>>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn CourseGateway>) -> Self {
        Self {
            progress: Arc::new(ProgressStore::new(gateway.clone())),
            issuer: Arc::new(CertificateIssuer::new(gateway.clone())),
            sessions: SessionRegistry::default(),
            renderer: None,
            gateway,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn CertificateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn gateway(&self) -> &Arc<dyn CourseGateway> {
        &self.gateway
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn issuer(&self) -> &CertificateIssuer {
        &self.issuer
    }

    pub fn renderer(&self) -> Option<&Arc<dyn CertificateRenderer>> {
        self.renderer.as_ref()
    }
}
