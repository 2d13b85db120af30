//! Backend selection with ordered fallback
//!
//! Walks the fallback sequence in order and returns the first backend that
//! both fits in host memory and loads. Earlier entries always win; at most
//! one backend is loaded per call.

use std::sync::Arc;

use crate::config::BackendDescriptor;
use crate::error::{AgentError, Result};
use crate::llm::{BackendLoader, TextGenerator};
use crate::probe::CapabilityProbe;

/// A backend that passed the probe and loaded
pub struct SelectedBackend {
    pub backend_id: String,
    pub descriptor: BackendDescriptor,
    pub engine: Box<dyn TextGenerator>,
}

impl std::fmt::Debug for SelectedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedBackend")
            .field("backend_id", &self.backend_id)
            .field("model", &self.descriptor.name)
            .finish()
    }
}

pub struct BackendSelector {
    probe: CapabilityProbe,
    loader: Arc<dyn BackendLoader>,
}

impl BackendSelector {
    pub fn new(probe: CapabilityProbe, loader: Arc<dyn BackendLoader>) -> Self {
        Self { probe, loader }
    }

    /// Load the first eligible backend of `fallback_sequence`
    pub async fn select(&self, fallback_sequence: &[String]) -> Result<SelectedBackend> {
        for backend_id in fallback_sequence {
            if !self.probe.meets_requirements(backend_id) {
                tracing::warn!("Insufficient RAM for model {}, trying next model", backend_id);
                continue;
            }

            let Some(descriptor) = self.probe.descriptor(backend_id) else {
                tracing::warn!("No descriptor for model {}, trying next model", backend_id);
                continue;
            };

            match self.loader.load(backend_id, descriptor).await {
                Ok(engine) => {
                    tracing::info!("Successfully loaded model: {} ({})", descriptor.name, backend_id);
                    return Ok(SelectedBackend {
                        backend_id: backend_id.clone(),
                        descriptor: descriptor.clone(),
                        engine,
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to load model {}: {:#}", backend_id, e);
                }
            }
        }

        tracing::error!("Failed to initialize any text generation model");
        Err(AgentError::NoEligibleBackend {
            tried: fallback_sequence.to_vec(),
        })
    }
}
