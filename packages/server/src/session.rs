//! Per-connection event dispatch over the registry, log, and gateway.
//!
//! One `SessionManager` is constructed at process start and shared via
//! `Arc`. All shared state lives behind its mutexes; handlers take one
//! lock at a time and never hold a lock across a gateway fan-out.
//!
//! Every failure path in here degrades to a silent drop or a leave
//! notification. Invalid payloads and events from unjoined connections are
//! logged at `debug` and discarded; nothing is echoed back to the sender.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use parlor_shared::time::Clock;

use crate::domain::{
    BroadcastGateway, Connection, ConnectionId, ConnectionRegistry, GatewayChannel, MessageBody,
    MessageLog, SessionState, Timestamp, Username,
};
use crate::infrastructure::dto::websocket::{
    ClientEvent, MessageDto, PresenceNotice, ServerEvent, TypingNotice, UserInfo,
};

/// Number of messages sent to a joiner as history
pub const HISTORY_SNAPSHOT_LEN: usize = 20;

/// Process-wide counters for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Currently joined connections
    pub users: usize,
    /// Messages retained in the log
    pub total_messages: usize,
}

/// Owns all chat state and dispatches client events against it.
pub struct SessionManager {
    /// Explicit state for every open connection, joined or not
    sessions: Mutex<HashMap<ConnectionId, SessionState>>,
    /// Joined connections only
    registry: Mutex<ConnectionRegistry>,
    /// Bounded message history
    log: Mutex<MessageLog>,
    /// Fan-out to open connections
    gateway: Arc<dyn BroadcastGateway>,
    /// Time source, injectable for tests
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create a new manager with empty state.
    pub fn new(gateway: Arc<dyn BroadcastGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            registry: Mutex::new(ConnectionRegistry::new()),
            log: Mutex::new(MessageLog::new()),
            gateway,
            clock,
        }
    }

    /// Track a newly opened connection and attach its outbound channel.
    pub async fn connect(&self, id: ConnectionId, sender: GatewayChannel) {
        self.gateway.attach(id, sender).await;
        let mut sessions = self.sessions.lock().await;
        sessions.insert(id, SessionState::Unjoined);
        tracing::debug!("Connection '{}' opened", id);
    }

    /// Dispatch one inbound event for a connection.
    pub async fn handle_event(&self, id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join(payload) => self.handle_join(id, &payload.username).await,
            ClientEvent::SendMessage(payload) => self.handle_send(id, &payload.message).await,
            ClientEvent::Typing(is_typing) => self.handle_typing(id, is_typing).await,
        }
    }

    /// Tear down a connection: detach it and, if it had joined, remove it
    /// from the registry and notify the remaining connections.
    pub async fn disconnect(&self, id: ConnectionId) {
        self.gateway.detach(&id).await;

        {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&id);
        }

        let removed = {
            let mut registry = self.registry.lock().await;
            registry.remove(&id)
        };

        match removed {
            Some(connection) => {
                tracing::info!("'{}' left the chat", connection.username);
                let event = ServerEvent::UserLeft(PresenceNotice::left(
                    connection.username.as_str(),
                    self.clock.now_millis(),
                ));
                self.gateway.to_others(&id, &event.to_json()).await;
            }
            None => {
                tracing::debug!("Connection '{}' closed before joining", id);
            }
        }
    }

    /// Counters for the HTTP status endpoint.
    pub async fn stats(&self) -> SessionStats {
        let users = self.registry.lock().await.len();
        let total_messages = self.log.lock().await.len();
        SessionStats {
            users,
            total_messages,
        }
    }

    /// `join`: validate the username, register, send the joiner a registry
    /// snapshot and recent history, notify everyone else.
    ///
    /// A join on an already-joined connection overwrites the registry entry
    /// (last username wins) and replays the whole join flow for the new name.
    async fn handle_join(&self, id: ConnectionId, raw_username: &str) {
        let username = match Username::new(raw_username) {
            Ok(username) => username,
            Err(e) => {
                tracing::debug!("Dropping join from connection '{}': {}", id, e);
                return;
            }
        };

        let now = self.clock.now_millis();

        {
            let mut sessions = self.sessions.lock().await;
            let Some(state) = sessions.get_mut(&id) else {
                tracing::debug!("Dropping join from unknown connection '{}'", id);
                return;
            };
            *state = SessionState::Joined {
                username: username.clone(),
            };
        }

        {
            let mut registry = self.registry.lock().await;
            let connection = Connection::new(username.clone(), Timestamp::new(now));
            match registry.register(id, connection) {
                Some(previous) => tracing::info!(
                    "Connection '{}' renamed from '{}' to '{}'",
                    id,
                    previous.username,
                    username
                ),
                None => tracing::info!("'{}' joined the chat", username),
            }
        }

        let joined = ServerEvent::UserJoined(PresenceNotice::joined(username.as_str(), now));
        self.gateway.to_others(&id, &joined.to_json()).await;

        let users: Vec<UserInfo> = {
            let registry = self.registry.lock().await;
            registry
                .list_all()
                .iter()
                .map(|(conn_id, connection)| UserInfo::from((*conn_id, connection)))
                .collect()
        };
        let users_list = ServerEvent::UsersList(users);
        if let Err(e) = self.gateway.to_one(&id, &users_list.to_json()).await {
            tracing::warn!("Failed to send users list to '{}': {}", id, e);
            return;
        }

        let history: Vec<MessageDto> = {
            let log = self.log.lock().await;
            log.recent(HISTORY_SNAPSHOT_LEN)
                .iter()
                .map(MessageDto::from)
                .collect()
        };
        let history_event = ServerEvent::MessageHistory(history);
        if let Err(e) = self.gateway.to_one(&id, &history_event.to_json()).await {
            tracing::warn!("Failed to send message history to '{}': {}", id, e);
        }
    }

    /// `sendMessage`: append to the log and broadcast to every open
    /// connection, sender included. Requires a joined connection and a
    /// non-empty body.
    async fn handle_send(&self, id: ConnectionId, raw_body: &str) {
        {
            let sessions = self.sessions.lock().await;
            if !sessions.get(&id).is_some_and(|s| s.is_joined()) {
                tracing::debug!("Dropping message from unjoined connection '{}'", id);
                return;
            }
        }

        // Username is copied from the registry entry, the authority on the
        // connection's current identity.
        let username = {
            let registry = self.registry.lock().await;
            match registry.lookup(&id) {
                Some(connection) => connection.username.clone(),
                None => {
                    tracing::debug!("Dropping message from unknown connection '{}'", id);
                    return;
                }
            }
        };

        let body = match MessageBody::new(raw_body) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Dropping message from '{}': {}", username, e);
                return;
            }
        };

        let message = {
            let mut log = self.log.lock().await;
            log.append(username, body, self.clock.now_millis())
        };
        tracing::info!("'{}': {}", message.username, message.body);

        let event = ServerEvent::NewMessage(MessageDto::from(&message));
        self.gateway.to_all(&event.to_json()).await;
    }

    /// `typing`: relay the typing flag to everyone else. Nothing is stored.
    async fn handle_typing(&self, id: ConnectionId, is_typing: bool) {
        let username = {
            let sessions = self.sessions.lock().await;
            match sessions.get(&id).and_then(|s| s.username().cloned()) {
                Some(username) => username,
                None => {
                    tracing::debug!("Dropping typing event from unjoined connection '{}'", id);
                    return;
                }
            }
        };

        let event = ServerEvent::UserTyping(TypingNotice {
            username: username.into_string(),
            is_typing,
        });
        self.gateway.to_others(&id, &event.to_json()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockBroadcastGateway;
    use crate::infrastructure::dto::websocket::{JoinPayload, SendMessagePayload};
    use crate::infrastructure::gateway::WebSocketBroadcastGateway;
    use parlor_shared::time::FixedClock;
    use tokio::sync::mpsc;

    const NOW: i64 = 1_700_000_000_000;

    fn test_manager() -> SessionManager {
        SessionManager::new(
            Arc::new(WebSocketBroadcastGateway::new()),
            Arc::new(FixedClock::new(NOW)),
        )
    }

    struct TestClient {
        id: ConnectionId,
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl TestClient {
        /// Next event already delivered to this client, if any.
        fn next_event(&mut self) -> Option<ServerEvent> {
            self.rx
                .try_recv()
                .ok()
                .map(|json| serde_json::from_str(&json).expect("server sent invalid JSON"))
        }

        fn assert_no_events(&mut self) {
            assert!(self.rx.try_recv().is_err(), "expected no pending events");
        }
    }

    async fn open_connection(manager: &SessionManager) -> TestClient {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        manager.connect(id, tx).await;
        TestClient { id, rx }
    }

    async fn join(manager: &SessionManager, client: &TestClient, username: &str) {
        manager
            .handle_event(
                client.id,
                ClientEvent::Join(JoinPayload {
                    username: username.to_string(),
                }),
            )
            .await;
    }

    async fn send(manager: &SessionManager, client: &TestClient, message: &str) {
        manager
            .handle_event(
                client.id,
                ClientEvent::SendMessage(SendMessagePayload {
                    message: message.to_string(),
                }),
            )
            .await;
    }

    #[tokio::test]
    async fn test_first_joiner_gets_snapshot_with_only_itself() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;

        // when:
        join(&manager, &alice, "alice").await;

        // then: usersList with alice only, then empty history
        match alice.next_event().unwrap() {
            ServerEvent::UsersList(users) => {
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].username, "alice");
                assert_eq!(users[0].id, alice.id.to_string());
            }
            other => panic!("expected usersList, got {:?}", other),
        }
        match alice.next_event().unwrap() {
            ServerEvent::MessageHistory(history) => assert!(history.is_empty()),
            other => panic!("expected messageHistory, got {:?}", other),
        }
        alice.assert_no_events();
    }

    #[tokio::test]
    async fn test_second_joiner_notifies_first_and_sees_both() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        alice.next_event();
        alice.next_event();

        // when:
        let mut bob = open_connection(&manager).await;
        join(&manager, &bob, "bob").await;

        // then: alice is told about bob
        match alice.next_event().unwrap() {
            ServerEvent::UserJoined(notice) => {
                assert_eq!(notice.username, "bob");
                assert_eq!(notice.message, "bob joined the chat");
            }
            other => panic!("expected userJoined, got {:?}", other),
        }

        // then: bob's snapshot has both, sorted by username
        match bob.next_event().unwrap() {
            ServerEvent::UsersList(users) => {
                let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
                assert_eq!(names, vec!["alice", "bob"]);
            }
            other => panic!("expected usersList, got {:?}", other),
        }
        match bob.next_event().unwrap() {
            ServerEvent::MessageHistory(history) => assert!(history.is_empty()),
            other => panic!("expected messageHistory, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_broadcasts_to_all_including_sender() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        let mut bob = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        join(&manager, &bob, "bob").await;
        while alice.next_event().is_some() {}
        while bob.next_event().is_some() {}

        // when:
        send(&manager, &alice, "hi").await;

        // then: both see the same message
        for client in [&mut alice, &mut bob] {
            match client.next_event().unwrap() {
                ServerEvent::NewMessage(message) => {
                    assert_eq!(message.username, "alice");
                    assert_eq!(message.message, "hi");
                }
                other => panic!("expected newMessage, got {:?}", other),
            }
        }

        // then: exactly one message stored
        assert_eq!(
            manager.stats().await,
            SessionStats {
                users: 2,
                total_messages: 1
            }
        );
    }

    #[tokio::test]
    async fn test_send_before_join_is_dropped() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        while alice.next_event().is_some() {}
        let mut lurker = open_connection(&manager).await;

        // when:
        send(&manager, &lurker, "let me in").await;

        // then: no log mutation, no broadcast
        assert_eq!(manager.stats().await.total_messages, 0);
        alice.assert_no_events();
        lurker.assert_no_events();
    }

    #[tokio::test]
    async fn test_whitespace_message_is_dropped() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        while alice.next_event().is_some() {}

        // when:
        send(&manager, &alice, "   \t ").await;

        // then:
        assert_eq!(manager.stats().await.total_messages, 0);
        alice.assert_no_events();
    }

    #[tokio::test]
    async fn test_invalid_username_join_is_dropped() {
        // given:
        let manager = test_manager();
        let mut client = open_connection(&manager).await;

        // when: too short after trimming
        join(&manager, &client, " a ").await;

        // then: not registered, nothing sent
        assert_eq!(manager.stats().await.users, 0);
        client.assert_no_events();
    }

    #[tokio::test]
    async fn test_unjoined_connection_still_receives_message_broadcasts() {
        // given: a connection that never joined
        let manager = test_manager();
        let alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        let mut lurker = open_connection(&manager).await;

        // when:
        send(&manager, &alice, "hello?").await;

        // then: newMessage goes to every open connection
        match lurker.next_event().unwrap() {
            ServerEvent::NewMessage(message) => assert_eq!(message.message, "hello?"),
            other => panic!("expected newMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_typing_reaches_others_only() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        let mut bob = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        join(&manager, &bob, "bob").await;
        while alice.next_event().is_some() {}
        while bob.next_event().is_some() {}

        // when:
        manager.handle_event(bob.id, ClientEvent::Typing(true)).await;

        // then:
        match alice.next_event().unwrap() {
            ServerEvent::UserTyping(notice) => {
                assert_eq!(notice.username, "bob");
                assert!(notice.is_typing);
            }
            other => panic!("expected userTyping, got {:?}", other),
        }
        bob.assert_no_events();
    }

    #[tokio::test]
    async fn test_repeated_typing_produces_one_broadcast_per_call() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        let bob = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        join(&manager, &bob, "bob").await;
        while alice.next_event().is_some() {}
        let stats_before = manager.stats().await;

        // when:
        for _ in 0..3 {
            manager.handle_event(bob.id, ClientEvent::Typing(true)).await;
        }

        // then: three notices, no stored state change
        for _ in 0..3 {
            assert!(matches!(
                alice.next_event().unwrap(),
                ServerEvent::UserTyping(_)
            ));
        }
        alice.assert_no_events();
        assert_eq!(manager.stats().await, stats_before);
    }

    #[tokio::test]
    async fn test_typing_before_join_is_dropped() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        while alice.next_event().is_some() {}
        let lurker = open_connection(&manager).await;

        // when:
        manager
            .handle_event(lurker.id, ClientEvent::Typing(true))
            .await;

        // then:
        alice.assert_no_events();
    }

    #[tokio::test]
    async fn test_disconnect_notifies_others_and_unregisters() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        let bob = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        join(&manager, &bob, "bob").await;
        while alice.next_event().is_some() {}

        // when:
        manager.disconnect(bob.id).await;

        // then:
        match alice.next_event().unwrap() {
            ServerEvent::UserLeft(notice) => {
                assert_eq!(notice.username, "bob");
                assert_eq!(notice.message, "bob left the chat");
            }
            other => panic!("expected userLeft, got {:?}", other),
        }
        assert_eq!(manager.stats().await.users, 1);
    }

    #[tokio::test]
    async fn test_unjoined_disconnect_produces_no_notification() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        while alice.next_event().is_some() {}
        let lurker = open_connection(&manager).await;

        // when:
        manager.disconnect(lurker.id).await;

        // then:
        alice.assert_no_events();
        assert_eq!(manager.stats().await.users, 1);
    }

    #[tokio::test]
    async fn test_rejoin_overwrites_username() {
        // given:
        let manager = test_manager();
        let mut alice = open_connection(&manager).await;
        let mut bob = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        join(&manager, &bob, "bob").await;
        while alice.next_event().is_some() {}
        while bob.next_event().is_some() {}

        // when: alice joins again under a new name
        join(&manager, &alice, "alicia").await;

        // then: still two users, bob is told about the new name
        assert_eq!(manager.stats().await.users, 2);
        match bob.next_event().unwrap() {
            ServerEvent::UserJoined(notice) => assert_eq!(notice.username, "alicia"),
            other => panic!("expected userJoined, got {:?}", other),
        }

        // then: alice's fresh snapshot lists the new name, not the old
        match alice.next_event().unwrap() {
            ServerEvent::UsersList(users) => {
                let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
                assert_eq!(names, vec!["alicia", "bob"]);
            }
            other => panic!("expected usersList, got {:?}", other),
        }

        // then: subsequent messages carry the new name
        send(&manager, &alice, "new me").await;
        alice.next_event(); // drain messageHistory from the rejoin
        match alice.next_event().unwrap() {
            ServerEvent::NewMessage(message) => assert_eq!(message.username, "alicia"),
            other => panic!("expected newMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_snapshot_is_capped_at_twenty() {
        // given: 25 stored messages
        let manager = test_manager();
        let alice = open_connection(&manager).await;
        join(&manager, &alice, "alice").await;
        for i in 0..25 {
            send(&manager, &alice, &format!("message {}", i)).await;
        }

        // when:
        let mut charlie = open_connection(&manager).await;
        join(&manager, &charlie, "charlie").await;

        // then: history holds the last 20 in order
        charlie.next_event(); // usersList
        match charlie.next_event().unwrap() {
            ServerEvent::MessageHistory(history) => {
                assert_eq!(history.len(), HISTORY_SNAPSHOT_LEN);
                assert_eq!(history[0].message, "message 5");
                assert_eq!(history[19].message, "message 24");
            }
            other => panic!("expected messageHistory, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_join_touches_gateway_only_on_connect() {
        // given: a strict mock, so any unexpected fan-out call panics
        let mut gateway = MockBroadcastGateway::new();
        gateway.expect_attach().times(1).return_const(());
        let manager = SessionManager::new(Arc::new(gateway), Arc::new(FixedClock::new(NOW)));

        let id = ConnectionId::generate();
        let (tx, _rx) = mpsc::unbounded_channel();
        manager.connect(id, tx).await;

        // when:
        manager
            .handle_event(
                id,
                ClientEvent::Join(JoinPayload {
                    username: "".to_string(),
                }),
            )
            .await;

        // then: no broadcast, no snapshot (mock verifies on drop)
        assert_eq!(manager.stats().await.users, 0);
    }
}
