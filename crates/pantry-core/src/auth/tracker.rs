//! Observable authentication state.
//!
//! `AuthTracker` holds the current session and turns session changes into
//! `LoggedIn` / `LoggedOut` transition events. Token refreshes for the same
//! user produce no event.

use tokio::sync::{broadcast, watch};

use super::{AuthSession, AuthUser};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Authentication transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn(AuthUser),
    LoggedOut(AuthUser),
}

impl AuthEvent {
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::LoggedIn(user) | Self::LoggedOut(user) => user,
        }
    }
}

pub struct AuthTracker {
    session: watch::Sender<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for AuthTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AuthTracker {
    /// Create a tracker starting from an already-restored session, if any.
    ///
    /// The initial session does not emit an event.
    pub fn new(initial: Option<AuthSession>) -> Self {
        let (session, _) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { session, events }
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Subscribe to login/logout transitions
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Replace the current session and publish the resulting transitions.
    ///
    /// Switching directly between two users emits `LoggedOut` then `LoggedIn`.
    pub fn set_session(&self, session: Option<AuthSession>) -> Vec<AuthEvent> {
        let next_user = session.as_ref().map(|session| session.user.clone());
        let previous_user = self
            .session
            .send_replace(session)
            .map(|session| session.user);

        let transitions = match (previous_user, next_user) {
            (None, None) => Vec::new(),
            (None, Some(user)) => vec![AuthEvent::LoggedIn(user)],
            (Some(user), None) => vec![AuthEvent::LoggedOut(user)],
            (Some(previous), Some(next)) if previous.id == next.id => Vec::new(),
            (Some(previous), Some(next)) => {
                vec![AuthEvent::LoggedOut(previous), AuthEvent::LoggedIn(next)]
            }
        };

        for event in &transitions {
            tracing::info!(user_id = %event.user().id, "Auth transition: {:?}", event);
            // no subscribers is fine
            let _ = self.events.send(event.clone());
        }
        transitions
    }

    pub fn sign_in(&self, session: AuthSession) -> Vec<AuthEvent> {
        self.set_session(Some(session))
    }

    pub fn sign_out(&self) -> Vec<AuthEvent> {
        self.set_session(None)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn session(user_id: &str, token: &str) -> AuthSession {
        AuthSession {
            access_token: token.to_string(),
            refresh_token: format!("refresh-{token}"),
            expires_at: i64::MAX,
            user: AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn login_and_logout_emit_transitions() {
        let tracker = AuthTracker::default();
        let mut events = tracker.subscribe();

        assert!(!tracker.is_authenticated());
        let login = tracker.sign_in(session("user-1", "a"));
        assert!(tracker.is_authenticated());
        let logout = tracker.sign_out();
        assert!(!tracker.is_authenticated());

        let user = session("user-1", "a").user;
        assert_eq!(login, vec![AuthEvent::LoggedIn(user.clone())]);
        assert_eq!(logout, vec![AuthEvent::LoggedOut(user.clone())]);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoggedIn(user.clone()));
        assert_eq!(events.try_recv().unwrap(), AuthEvent::LoggedOut(user));
    }

    #[test]
    fn token_refresh_for_same_user_is_silent() {
        let tracker = AuthTracker::new(Some(session("user-1", "a")));

        assert!(tracker.sign_in(session("user-1", "b")).is_empty());
        assert_eq!(
            tracker.current_session().map(|session| session.access_token),
            Some("b".to_string())
        );
    }

    #[test]
    fn switching_users_logs_out_then_in() {
        let tracker = AuthTracker::new(Some(session("user-1", "a")));

        let events = tracker.sign_in(session("user-2", "b"));

        assert_eq!(
            events,
            vec![
                AuthEvent::LoggedOut(session("user-1", "a").user),
                AuthEvent::LoggedIn(session("user-2", "b").user),
            ]
        );
    }

    #[test]
    fn signing_out_while_signed_out_is_silent() {
        let tracker = AuthTracker::default();
        assert!(tracker.sign_out().is_empty());
    }
}
