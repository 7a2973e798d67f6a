use crate::error::{Error, Result};
use crate::models::mcq::BackendIdentity;
use crate::services::backend::Backends;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Undetected,
    Local,
    Cloud,
    Unavailable,
}

impl From<BackendIdentity> for SelectionState {
    fn from(identity: BackendIdentity) -> Self {
        match identity {
            BackendIdentity::Local => SelectionState::Local,
            BackendIdentity::Cloud => SelectionState::Cloud,
        }
    }
}

impl SelectionState {
    pub fn backend(self) -> Option<BackendIdentity> {
        match self {
            SelectionState::Local => Some(BackendIdentity::Local),
            SelectionState::Cloud => Some(BackendIdentity::Cloud),
            SelectionState::Undetected | SelectionState::Unavailable => None,
        }
    }
}

/// Owns the cached backend choice for the lifetime of the process.
///
/// Detection runs once: the local backend is checked first, the cloud backend
/// is used when credentials exist, otherwise the selector becomes
/// `Unavailable` and stays that way. The cache only changes afterwards through
/// [`ServiceSelector::fall_back_from`].
///
/// The lock is never held across a liveness check or a generation call.
/// Concurrent first requests may therefore each run their own detection, but
/// only the first one to commit is kept; the others discard their result and
/// adopt the committed state. Fallback switches are compare-and-set too.
#[derive(Debug)]
pub struct ServiceSelector {
    state: RwLock<SelectionState>,
}

impl Default for ServiceSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceSelector {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SelectionState::Undetected),
        }
    }

    pub fn state(&self) -> SelectionState {
        *self.state.read()
    }

    pub fn current(&self) -> Option<BackendIdentity> {
        self.state().backend()
    }

    /// Returns the cached backend, detecting it on first use.
    pub async fn resolve(&self, backends: &Backends) -> Result<BackendIdentity> {
        let state = match self.state() {
            SelectionState::Undetected => {
                let detected = detect(backends).await;
                self.commit_detection(detected)
            }
            cached => cached,
        };

        state.backend().ok_or_else(unavailable)
    }

    fn commit_detection(&self, detected: SelectionState) -> SelectionState {
        let mut state = self.state.write();
        if *state == SelectionState::Undetected {
            *state = detected;
            match detected {
                SelectionState::Local => {
                    tracing::info!("PRIMARY: Using Ollama (local model)")
                }
                SelectionState::Cloud => {
                    tracing::info!("FALLBACK: Using Gemini API (cloud)")
                }
                _ => tracing::error!("No AI service available"),
            }
        }
        *state
    }

    /// Moves the cache off `failed` onto the other backend. Returns the backend
    /// now cached; a concurrent switch that already happened is kept.
    pub fn fall_back_from(&self, failed: BackendIdentity) -> Option<BackendIdentity> {
        let mut state = self.state.write();
        if *state == SelectionState::from(failed) {
            let next = failed.other();
            tracing::info!(from = %failed, to = %next, "Switching cached AI backend");
            *state = next.into();
        }
        state.backend()
    }
}

/// Probes the local backend, then checks for cloud credentials.
pub async fn detect(backends: &Backends) -> SelectionState {
    tracing::info!("Detecting available AI services");

    if let Some(local) = backends.get(BackendIdentity::Local) {
        if local.is_available().await {
            return SelectionState::Local;
        }
        tracing::warn!("Ollama not available, checking Gemini as fallback");
    }

    if let Some(cloud) = backends.get(BackendIdentity::Cloud) {
        if cloud.is_available().await {
            return SelectionState::Cloud;
        }
    }

    SelectionState::Unavailable
}

fn unavailable() -> Error {
    Error::ServiceUnavailable(
        "No AI service available. Configure OLLAMA_BASE_URL and OLLAMA_MODEL (then run: ollama serve), or set GEMINI_API_KEY"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::services::backend::{GenerationBackend, MockGenerationBackend};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn backend(available: bool, checks: usize) -> Arc<dyn GenerationBackend> {
        let mut mock = MockGenerationBackend::new();
        mock.expect_is_available().times(checks).return_const(available);
        Arc::new(mock)
    }

    /// Local backend whose liveness answers come from a script, one per call.
    struct ScriptedLocal {
        answers: Vec<(Duration, bool)>,
        calls: AtomicUsize,
    }

    impl ScriptedLocal {
        fn new(answers: Vec<(Duration, bool)>) -> Arc<Self> {
            Arc::new(Self {
                answers,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedLocal {
        async fn is_available(&self) -> bool {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, answer) = self.answers[call.min(self.answers.len() - 1)];
            tokio::time::sleep(delay).await;
            answer
        }

        async fn generate(&self, _prompt: &str) -> std::result::Result<String, BackendError> {
            Err(BackendError::Unknown("not used".to_string()))
        }
    }

    #[tokio::test]
    async fn reachable_local_backend_is_selected() {
        let backends = Backends::new(Some(backend(true, 1)), Some(backend(true, 0)));
        let selector = ServiceSelector::new();

        assert_eq!(selector.resolve(&backends).await.unwrap(), BackendIdentity::Local);
        assert_eq!(selector.state(), SelectionState::Local);
    }

    #[tokio::test]
    async fn unreachable_local_with_credentials_selects_cloud() {
        let backends = Backends::new(Some(backend(false, 1)), Some(backend(true, 1)));
        let selector = ServiceSelector::new();

        assert_eq!(selector.resolve(&backends).await.unwrap(), BackendIdentity::Cloud);
    }

    #[tokio::test]
    async fn nothing_configured_is_unavailable_and_terminal() {
        let backends = Backends::new(None, None);
        let selector = ServiceSelector::new();

        assert!(matches!(
            selector.resolve(&backends).await,
            Err(Error::ServiceUnavailable(_))
        ));
        assert_eq!(selector.state(), SelectionState::Unavailable);

        // A backend appearing later is not checked again within the same process.
        let later = Backends::new(Some(backend(true, 0)), None);
        assert!(selector.resolve(&later).await.is_err());
    }

    #[tokio::test]
    async fn cached_selection_is_reused_without_probing() {
        let backends = Backends::new(Some(backend(true, 1)), None);
        let selector = ServiceSelector::new();

        for _ in 0..3 {
            assert_eq!(selector.resolve(&backends).await.unwrap(), BackendIdentity::Local);
        }
    }

    #[test]
    fn fallback_switch_is_sticky_and_not_repeated() {
        let selector = ServiceSelector::new();
        assert_eq!(selector.commit_detection(SelectionState::Local), SelectionState::Local);

        assert_eq!(
            selector.fall_back_from(BackendIdentity::Local),
            Some(BackendIdentity::Cloud)
        );
        // A second request that also saw Local fail does not flip it back.
        assert_eq!(
            selector.fall_back_from(BackendIdentity::Local),
            Some(BackendIdentity::Cloud)
        );
        assert_eq!(selector.state(), SelectionState::Cloud);
    }

    #[test]
    fn first_detection_wins() {
        let selector = ServiceSelector::new();
        selector.commit_detection(SelectionState::Cloud);
        assert_eq!(
            selector.commit_detection(SelectionState::Local),
            SelectionState::Cloud
        );
    }

    #[tokio::test]
    async fn concurrent_first_requests_agree_on_slow_detection() {
        let local = ScriptedLocal::new(vec![(Duration::from_millis(100), true)]);
        let backends = Backends::new(
            Some(local.clone() as Arc<dyn GenerationBackend>),
            Some(backend(true, 0)),
        );
        let selector = ServiceSelector::new();

        let (first, second) =
            tokio::join!(selector.resolve(&backends), selector.resolve(&backends));

        assert_eq!(first.unwrap(), BackendIdentity::Local);
        assert_eq!(second.unwrap(), BackendIdentity::Local);
        assert_eq!(selector.state(), SelectionState::Local);
        // Both requests saw `Undetected`, so both checked liveness.
        assert_eq!(local.calls(), 2);
    }

    #[tokio::test]
    async fn racing_detections_keep_the_first_commit() {
        // The first check is slow and succeeds; the second fails at once and
        // commits the cloud backend before the first one finishes.
        let local = ScriptedLocal::new(vec![
            (Duration::from_millis(100), true),
            (Duration::ZERO, false),
        ]);
        let backends = Backends::new(
            Some(local.clone() as Arc<dyn GenerationBackend>),
            Some(backend(true, 1)),
        );
        let selector = ServiceSelector::new();

        let (first, second) =
            tokio::join!(selector.resolve(&backends), selector.resolve(&backends));

        assert_eq!(first.unwrap(), BackendIdentity::Cloud);
        assert_eq!(second.unwrap(), BackendIdentity::Cloud);
        assert_eq!(selector.state(), SelectionState::Cloud);
        assert_eq!(local.calls(), 2);
    }

    #[test]
    fn concurrent_fallbacks_switch_once() {
        let selector = ServiceSelector::new();
        selector.commit_detection(SelectionState::Local);
        let barrier = std::sync::Barrier::new(4);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        selector.fall_back_from(BackendIdentity::Local)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| *r == Some(BackendIdentity::Cloud)));
        assert_eq!(selector.state(), SelectionState::Cloud);
    }
}
