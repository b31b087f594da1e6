//! Chat service orchestrating gated turns.
//!
//! A turn only consumes quota once it has actually been answered: the
//! gate authorizes first, the provider replies, and only then is the
//! turn committed durably. A reply that cannot be committed (quota raced
//! away by another process) is discarded rather than logged.

use chrono::Local;
use rollcall_types::chat::{Session, Turn};
use rollcall_types::config::LlmConfig;
use rollcall_types::error::TurnError;
use rollcall_types::llm::{CompletionRequest, Message};
use tracing::debug;

use crate::gate::repository::RosterRepository;
use crate::gate::service::{LOG_TIME_FORMAT, SessionGate};
use crate::llm::provider::CompletionProvider;
use crate::llm::retry::{RetryPolicy, complete_with_retry};

/// Orchestrates the authorize -> complete -> commit cycle for each turn.
///
/// Generic over `RosterRepository` and `CompletionProvider` to maintain
/// clean architecture (rollcall-core never depends on rollcall-infra).
pub struct ChatService<R: RosterRepository, P: CompletionProvider> {
    gate: SessionGate<R>,
    provider: P,
    llm: LlmConfig,
    retry: RetryPolicy,
}

impl<R: RosterRepository, P: CompletionProvider> ChatService<R, P> {
    /// Create a new chat service over the given gate and provider.
    pub fn new(gate: SessionGate<R>, provider: P, llm: LlmConfig, retry: RetryPolicy) -> Self {
        Self {
            gate,
            provider,
            llm,
            retry,
        }
    }

    /// Access the session gate.
    pub fn gate(&self) -> &SessionGate<R> {
        &self.gate
    }

    /// Access the completion provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one full gated turn.
    ///
    /// The caller blocks until the provider replies or the retry bound is
    /// spent. On success the session carries one more turn and its usage
    /// mirror matches the durable counter.
    pub async fn send_turn(&self, session: &mut Session, question: &str) -> Result<Turn, TurnError> {
        self.gate.authorize_turn(session)?;

        let request = self.build_request(session, question);
        debug!(
            student_id = %session.student_id,
            messages = request.messages.len(),
            model = %request.model,
            "forwarding turn to completion provider"
        );
        let response = complete_with_retry(&self.provider, &request, &self.retry).await?;

        let asked_at = Local::now().format(LOG_TIME_FORMAT).to_string();
        let turn = self
            .gate
            .record_turn(session, question, &response.content, &asked_at)
            .await?;
        Ok(turn)
    }

    /// The conversation so far as role-tagged messages.
    ///
    /// The system instruction leads when non-empty; an empty instruction
    /// is valid and simply contributes no message.
    pub fn conversation(&self, session: &Session) -> Vec<Message> {
        let mut messages = Vec::with_capacity(session.turns.len() * 2 + 1);
        if !session.system_prompt.is_empty() {
            messages.push(Message::system(&session.system_prompt));
        }
        for turn in &session.turns {
            messages.push(Message::user(&turn.question));
            messages.push(Message::assistant(&turn.answer));
        }
        messages
    }

    fn build_request(&self, session: &Session, question: &str) -> CompletionRequest {
        let mut messages = self.conversation(session);
        messages.push(Message::user(question));
        CompletionRequest {
            model: self.llm.model.clone(),
            messages,
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::repository::TurnCommit;
    use rollcall_types::chat::SessionStatus;
    use rollcall_types::error::{GateError, StoreError};
    use rollcall_types::llm::{CompletionError, CompletionResponse, MessageRole};
    use rollcall_types::roster::{ChatLogEntry, PromptCategory, PromptRecord, StudentRecord};

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Single-student roster with enough behavior for turn orchestration.
    struct OneStudentRoster {
        quota_limit: u32,
        usage: Mutex<u32>,
        log: Mutex<Vec<ChatLogEntry>>,
    }

    impl OneStudentRoster {
        fn new(quota_limit: u32, usage: u32) -> Self {
            Self {
                quota_limit,
                usage: Mutex::new(usage),
                log: Mutex::new(Vec::new()),
            }
        }
    }

    impl RosterRepository for OneStudentRoster {
        async fn find_student(&self, student_id: &str) -> Result<Option<StudentRecord>, StoreError> {
            if student_id != "S001" {
                return Ok(None);
            }
            Ok(Some(StudentRecord {
                student_id: "S001".to_string(),
                password: "pw123".to_string(),
                quota_limit: self.quota_limit,
                usage_count: *self.usage.lock().unwrap(),
                created_at: chrono::Utc::now(),
            }))
        }

        async fn insert_student(&self, _record: &StudentRecord) -> Result<(), StoreError> {
            unimplemented!("not used by these tests")
        }

        async fn list_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
            unimplemented!("not used by these tests")
        }

        async fn reset_usage(&self, _student_id: &str) -> Result<(), StoreError> {
            *self.usage.lock().unwrap() = 0;
            Ok(())
        }

        async fn list_prompts(
            &self,
            _category: &PromptCategory,
        ) -> Result<Vec<PromptRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn insert_prompt(
            &self,
            _category: &PromptCategory,
            _subject: Option<&str>,
            _prompt_text: &str,
        ) -> Result<PromptRecord, StoreError> {
            unimplemented!("not used by these tests")
        }

        async fn commit_turn(&self, entry: &ChatLogEntry) -> Result<TurnCommit, StoreError> {
            let mut usage = self.usage.lock().unwrap();
            if *usage >= self.quota_limit {
                return Ok(TurnCommit::QuotaExhausted { usage_count: *usage });
            }
            *usage += 1;
            self.log.lock().unwrap().push(entry.clone());
            Ok(TurnCommit::Committed { usage_count: *usage })
        }

        async fn list_log(
            &self,
            _student_id: Option<&str>,
            _limit: Option<i64>,
        ) -> Result<Vec<ChatLogEntry>, StoreError> {
            Ok(self.log.lock().unwrap().clone())
        }

        async fn count_log(&self) -> Result<u64, StoreError> {
            Ok(self.log.lock().unwrap().len() as u64)
        }
    }

    /// Provider that pops scripted outcomes in order.
    struct ScriptedProvider {
        outcomes: Mutex<Vec<Result<CompletionResponse, CompletionError>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
            let mut outcomes = outcomes;
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
            }
        }

        fn always(content: &str) -> Self {
            Self::new(vec![Ok(CompletionResponse {
                content: content.to_string(),
                model: "gpt-4o".to_string(),
            })])
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("provider called more times than scripted")
        }
    }

    fn service(
        roster: OneStudentRoster,
        provider: ScriptedProvider,
    ) -> ChatService<OneStudentRoster, ScriptedProvider> {
        ChatService::new(
            SessionGate::new(roster),
            provider,
            LlmConfig::default(),
            RetryPolicy::default(),
        )
    }

    fn reply(content: &str) -> Result<CompletionResponse, CompletionError> {
        Ok(CompletionResponse {
            content: content.to_string(),
            model: "gpt-4o".to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_turn_commits_and_mirrors_usage() {
        let service = service(OneStudentRoster::new(3, 0), ScriptedProvider::always("42"));
        let mut session = Session::new("S001", 3, 0, "Be helpful.");

        let turn = service.send_turn(&mut session, "meaning of life?").await.unwrap();

        assert_eq!(turn.answer, "42");
        assert_eq!(session.usage_count, 1);
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_turn_retries_transient_failures() {
        let provider = ScriptedProvider::new(vec![
            Err(CompletionError::Overloaded("status 529".to_string())),
            Err(CompletionError::Transport("connection reset".to_string())),
            reply("eventually"),
        ]);
        let service = service(OneStudentRoster::new(3, 0), provider);
        let mut session = Session::new("S001", 3, 0, "");

        let turn = service.send_turn(&mut session, "q").await.unwrap();

        assert_eq!(turn.answer, "eventually");
        assert_eq!(service.provider().calls(), 3);
        assert_eq!(session.usage_count, 1);
    }

    #[tokio::test]
    async fn test_send_turn_denied_before_provider_is_called() {
        let service = service(OneStudentRoster::new(3, 3), ScriptedProvider::new(vec![]));
        let mut session = Session::new("S001", 3, 3, "");

        let err = service.send_turn(&mut session, "q").await.unwrap_err();

        assert!(matches!(err, TurnError::Gate(GateError::QuotaExceeded)));
        assert_eq!(service.provider().calls(), 0);
        assert!(session.turns.is_empty());
    }

    #[tokio::test]
    async fn test_send_turn_surfaces_terminal_completion_failure() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::AuthenticationFailed)]);
        let service = service(OneStudentRoster::new(3, 0), provider);
        let mut session = Session::new("S001", 3, 0, "");

        let err = service.send_turn(&mut session, "q").await.unwrap_err();

        assert!(matches!(
            err,
            TurnError::Completion(CompletionError::AuthenticationFailed)
        ));
        // Unanswered turns consume nothing.
        assert_eq!(session.usage_count, 0);
        assert!(session.turns.is_empty());
    }

    #[tokio::test]
    async fn test_send_turn_discards_reply_when_commit_refused() {
        // The store shows the quota already spent; the mirror does not.
        let service = service(OneStudentRoster::new(3, 3), ScriptedProvider::always("wasted"));
        let mut session = Session::new("S001", 3, 2, "");

        let err = service.send_turn(&mut session, "q").await.unwrap_err();

        assert!(matches!(err, TurnError::Gate(GateError::QuotaExceeded)));
        assert_eq!(session.usage_count, 3);
        assert_eq!(session.status, SessionStatus::Exhausted);
        assert!(session.turns.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_layout() {
        let service = service(OneStudentRoster::new(3, 0), ScriptedProvider::always("a2"));
        let mut session = Session::new("S001", 3, 0, "Be helpful.");

        service.send_turn(&mut session, "q1").await.unwrap();

        let conversation = service.conversation(&session);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[0].role, MessageRole::System);
        assert_eq!(conversation[0].content, "Be helpful.");
        assert_eq!(conversation[1].role, MessageRole::User);
        assert_eq!(conversation[1].content, "q1");
        assert_eq!(conversation[2].role, MessageRole::Assistant);
        assert_eq!(conversation[2].content, "a2");
    }

    #[tokio::test]
    async fn test_empty_system_prompt_contributes_no_message() {
        let service = service(OneStudentRoster::new(3, 0), ScriptedProvider::new(vec![]));
        let session = Session::new("S001", 3, 0, "");

        assert!(service.conversation(&session).is_empty());
    }
}
