//! Console state wired to the in-memory backend.

use std::sync::Arc;

use crate::state::{AppState, Apis, ConfigState};
use vetdesk_client::notify::{RecordingNotifier, ScriptedConfirmer};
use vetdesk_client::testing::FakeBackend;
use vetdesk_client::{NoticeLevel, SessionStore};

pub struct Harness {
    pub state: AppState,
    pub api: Arc<FakeBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirmer: Arc<ScriptedConfirmer>,
}

impl Harness {
    pub fn errors(&self) -> Vec<String> {
        self.notifier.messages(NoticeLevel::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.notifier.messages(NoticeLevel::Success)
    }

    pub fn infos(&self) -> Vec<String> {
        self.notifier.messages(NoticeLevel::Info)
    }
}

/// Every confirmation answered yes.
pub async fn harness(logged_in: bool) -> Harness {
    harness_with(logged_in, vec![true; 16]).await
}

pub async fn harness_with(logged_in: bool, answers: Vec<bool>) -> Harness {
    let api = Arc::new(FakeBackend::new());
    let session = Arc::new(SessionStore::in_memory());
    if logged_in {
        session
            .login(api.as_ref(), "ana", "secreto", false)
            .await
            .unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let confirmer = Arc::new(ScriptedConfirmer::new(answers));
    let state = AppState::new(
        ConfigState::default(),
        session,
        Apis::from_backend(api.clone()),
        notifier.clone(),
        confirmer.clone(),
    );
    Harness {
        state,
        api,
        notifier,
        confirmer,
    }
}
