//! Provider that blocks until the test releases it, for observing job states.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use verigov_lookup::providers::{Provider, ProviderFailure};
use verigov_lookup::{CanonicalRecord, Cnpj, RecordSource};

#[derive(Debug)]
pub struct GatedProvider {
    gate: Semaphore,
    started: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl GatedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Let `n` blocked or future fetches complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Identifiers in the order fetches started
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for GatedProvider {
    fn tag(&self) -> &str {
        "gated"
    }

    async fn fetch(&self, identifier: &Cnpj) -> Result<CanonicalRecord, ProviderFailure> {
        self.started.lock().unwrap().push(identifier.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let permit = self.gate.acquire().await.map_err(|e| ProviderFailure::Network {
            provider: "gated".to_string(),
            message: e.to_string(),
        })?;
        permit.forget();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(CanonicalRecord {
            identifier: identifier.to_string(),
            legal_name: Some("EMPRESA GATED LTDA".to_string()),
            status: "ATIVA".to_string(),
            registered_since: None,
            retrieved_at: Utc::now(),
            source: RecordSource::provider("gated"),
            raw: None,
        })
    }
}
