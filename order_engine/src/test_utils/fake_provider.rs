use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::Deserialize;
use serde_json::json;

use crate::{
    db_types::{Order, OrderId},
    traits::{
        PaymentProvider,
        ProviderError,
        ProviderEvent,
        ProviderSession,
        RedirectUrls,
        SessionStatus,
        SettlementStatus,
    },
};

/// The only signature [`FakeProvider`] accepts.
pub const FAKE_SIGNATURE: &str = "fake-signature";

#[derive(Default)]
struct FakeProviderState {
    sessions: HashMap<String, ProviderSession>,
    next_id: u64,
    fail_requests: bool,
    created: usize,
    retrieved: usize,
}

/// An in-memory payment provider. Sessions live in a shared map, so clones see the same sessions.
///
/// Push payloads are plain JSON: `{"type": "<event type>", "session": {..}}`, signed with [`FAKE_SIGNATURE`].
#[derive(Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<FakeProviderState>>,
}

#[derive(Deserialize)]
struct FakeEvent {
    #[serde(rename = "type")]
    event_type: String,
    session: Option<ProviderSession>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeProviderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// When set, every outbound call fails as if the provider were unreachable.
    pub fn fail_requests(&self, fail: bool) {
        self.state().fail_requests = fail;
    }

    pub fn session(&self, session_id: &str) -> Option<ProviderSession> {
        self.state().sessions.get(session_id).cloned()
    }

    pub fn insert_session(&self, session: ProviderSession) {
        self.state().sessions.insert(session.id.clone(), session);
    }

    /// Marks the session as paid and complete, and returns it.
    pub fn settle(&self, session_id: &str) -> Option<ProviderSession> {
        self.update(session_id, SettlementStatus::Paid, SessionStatus::Complete)
    }

    pub fn expire(&self, session_id: &str) -> Option<ProviderSession> {
        self.update(session_id, SettlementStatus::Unpaid, SessionStatus::Expired)
    }

    fn update(&self, session_id: &str, payment: SettlementStatus, status: SessionStatus) -> Option<ProviderSession> {
        let mut state = self.state();
        let session = state.sessions.get_mut(session_id)?;
        session.payment_status = payment;
        session.status = status;
        Some(session.clone())
    }

    pub fn created_sessions(&self) -> usize {
        self.state().created
    }

    pub fn retrieved_sessions(&self) -> usize {
        self.state().retrieved
    }

    /// A push payload for the given event type and session.
    pub fn event_payload(event_type: &str, session: &ProviderSession) -> Vec<u8> {
        json!({ "type": event_type, "session": session }).to_string().into_bytes()
    }
}

impl PaymentProvider for FakeProvider {
    fn signature_header(&self) -> &'static str {
        "Fake-Signature"
    }

    fn authenticate_event(&self, payload: &[u8], signature: &str) -> Result<ProviderEvent, ProviderError> {
        if signature != FAKE_SIGNATURE {
            return Err(ProviderError::InvalidSignature("signature mismatch".into()));
        }
        let event: FakeEvent =
            serde_json::from_slice(payload).map_err(|e| ProviderError::MalformedEvent(e.to_string()))?;
        let session = || event.session.clone().ok_or_else(|| ProviderError::MalformedEvent("no session".into()));
        let result = match event.event_type.as_str() {
            "checkout.session.completed" => ProviderEvent::SessionCompleted(session()?),
            "checkout.session.async_payment_succeeded" => ProviderEvent::AsyncPaymentSucceeded(session()?),
            "checkout.session.async_payment_failed" => ProviderEvent::AsyncPaymentFailed(session()?),
            "checkout.session.expired" => ProviderEvent::SessionExpired(session()?),
            other => ProviderEvent::Ignored(other.to_string()),
        };
        Ok(result)
    }

    async fn create_session(&self, order: &Order, _urls: &RedirectUrls) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state();
        if state.fail_requests {
            return Err(ProviderError::RequestFailed("provider unavailable".into()));
        }
        state.next_id += 1;
        let id = format!("cs_fake_{}", state.next_id);
        let session = ProviderSession::new(id.clone(), SettlementStatus::Unpaid, SessionStatus::Open)
            .with_order_id(order.id)
            .with_url(format!("https://pay.example/{id}"));
        state.sessions.insert(id, session.clone());
        state.created += 1;
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError> {
        let mut state = self.state();
        if state.fail_requests {
            return Err(ProviderError::RequestFailed("provider unavailable".into()));
        }
        state.retrieved += 1;
        let mut session =
            state.sessions.get(session_id).cloned().ok_or_else(|| ProviderError::SessionNotFound(session_id.into()))?;
        session.url = None;
        Ok(session)
    }
}

/// A settled session for an order that the provider never created a checkout for (e.g. a replayed event).
pub fn paid_session(id: &str, order_id: OrderId) -> ProviderSession {
    ProviderSession::new(id, SettlementStatus::Paid, SessionStatus::Complete).with_order_id(order_id)
}
