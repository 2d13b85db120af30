//! Host capability checks
//!
//! Decides whether this machine has enough physical memory to run a
//! generation backend. Uses the sysinfo crate for cross-platform totals.

use std::collections::BTreeMap;
use std::sync::Arc;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::config::BackendDescriptor;

/// Total physical memory of the host in bytes
pub fn host_total_memory() -> u64 {
    let sys = System::new_with_specifics(
        RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
    );
    sys.total_memory()
}

/// Resource eligibility check against a fixed descriptor table
#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    descriptors: Arc<BTreeMap<String, BackendDescriptor>>,
    host_memory: u64,
}

impl CapabilityProbe {
    /// Probe with an explicit host memory figure
    pub fn new(descriptors: Arc<BTreeMap<String, BackendDescriptor>>, host_memory: u64) -> Self {
        Self {
            descriptors,
            host_memory,
        }
    }

    /// Probe measuring the current machine once
    pub fn for_host(descriptors: Arc<BTreeMap<String, BackendDescriptor>>) -> Self {
        let host_memory = host_total_memory();
        tracing::debug!("Host physical memory: {} bytes", host_memory);
        Self::new(descriptors, host_memory)
    }

    pub fn descriptor(&self, backend_id: &str) -> Option<&BackendDescriptor> {
        self.descriptors.get(backend_id)
    }

    /// True iff `backend_id` is known and the host has at least its minimum RAM
    pub fn meets_requirements(&self, backend_id: &str) -> bool {
        match self.descriptors.get(backend_id) {
            Some(descriptor) => self.host_memory >= descriptor.min_ram.bytes(),
            None => false,
        }
    }
}
