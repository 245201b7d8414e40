use metrics_exporter_prometheus::PrometheusHandle;
use onboard_ai::workflows::onboarding::cases::{CaseNotice, CaseNotifier, NotifyError};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notice sink for deployments without a mail relay wired up. Keeps every
/// notice so the demo and tests can show what would have been sent.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCaseNotifier {
    events: Arc<Mutex<Vec<CaseNotice>>>,
}

impl InMemoryCaseNotifier {
    pub(crate) fn events(&self) -> Vec<CaseNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl CaseNotifier for InMemoryCaseNotifier {
    fn publish(&self, notice: CaseNotice) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}
