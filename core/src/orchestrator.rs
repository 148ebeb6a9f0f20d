//! The response flow: classify, gather context, assemble the prompt, stream the answer.

use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::classifier::should_retrieve;
use crate::completion::{CompletionBackend, CompletionClient};
use crate::config::AssistantConfig;
use crate::context::ContextGatherer;
use crate::errors::AssistantResult;
use crate::prompt::assemble;
use crate::session::ChatSession;

pub const APOLOGY: &str =
    "I apologize, but I'm having trouble connecting to the server. Please try again later.";

/// Transient status shown while a request is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Whole request, until the answer has finished streaming
    Thinking,
    /// Context gathering only
    ProcessingDocuments,
}

/// UI boundary driven by the orchestrator
pub trait ChatView {
    fn show_indicator(&mut self, indicator: Indicator);
    fn clear_indicator(&mut self, indicator: Indicator);
    /// Called after every received fragment with the whole answer so far
    fn render_partial(&mut self, answer: &str);
}

/// Shows an indicator and clears it exactly once when dropped
struct IndicatorGuard<'a, V: ChatView + ?Sized> {
    view: &'a mut V,
    indicator: Indicator,
}

impl<'a, V: ChatView + ?Sized> IndicatorGuard<'a, V> {
    fn show(view: &'a mut V, indicator: Indicator) -> Self {
        view.show_indicator(indicator);
        Self { view, indicator }
    }

    fn view(&mut self) -> &mut V {
        &mut *self.view
    }
}

impl<V: ChatView + ?Sized> Drop for IndicatorGuard<'_, V> {
    fn drop(&mut self) {
        self.view.clear_indicator(self.indicator);
    }
}

/// Answers questions for a session by talking to the completion and context services
#[derive(Clone)]
pub struct Assistant {
    completion: Arc<dyn CompletionBackend>,
    gatherer: ContextGatherer,
    persona: String,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        gatherer: ContextGatherer,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            gatherer,
            persona: persona.into(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> AssistantResult<Self> {
        let http = config.http_client()?;
        let completion = CompletionClient::new(config, http.clone())?;
        info!(model = completion.model(), "Initialized completion client");
        let gatherer = ContextGatherer::from_config(config, http);
        Ok(Self::new(Arc::new(completion), gatherer, config.persona()))
    }

    /// Answers one query, rendering the answer into `view` as it streams.
    ///
    /// Returns `None` for blank input. Never fails: a completion call that cannot be opened, or
    /// whose body breaks before the first fragment, yields [`APOLOGY`]. A body that breaks later
    /// keeps the fragments already shown. The session is borrowed mutably for the whole request, so a second
    /// query cannot start before this one has finished.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn respond<V: ChatView + ?Sized>(
        &self,
        session: &mut ChatSession,
        query: &str,
        view: &mut V,
    ) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        session.conversation.push_user(query);

        let mut thinking = IndicatorGuard::show(view, Indicator::Thinking);

        let context = if should_retrieve(query) {
            let _processing = IndicatorGuard::show(thinking.view(), Indicator::ProcessingDocuments);
            self.gatherer.gather(query).await.render()
        } else {
            debug!("Answering without retrieval");
            String::new()
        };

        let envelope = assemble(&self.persona, &context, session.locale(), query);

        let mut answer = String::new();
        let failure = match self.completion.open_stream(&envelope).await {
            Ok(mut fragments) => loop {
                match fragments.next().await {
                    Some(Ok(fragment)) => {
                        answer.push_str(&fragment);
                        thinking.view().render_partial(&answer);
                    }
                    Some(Err(e)) if answer.is_empty() => break Some(e),
                    Some(Err(e)) => {
                        warn!(error = %e, kept = answer.len(), "Answer cut short");
                        break None;
                    }
                    None => break None,
                }
            },
            Err(e) => Some(e),
        };
        if let Some(e) = failure {
            error!(error = %e, "Completion request failed");
            thinking.view().render_partial(APOLOGY);
            answer = APOLOGY.to_string();
        }
        drop(thinking);

        info!(answer_len = answer.len(), "Answer complete");
        if !answer.is_empty() {
            session.conversation.push_bot(answer.clone());
        }
        Some(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::gatherer;
    use crate::errors::AssistantError;
    use crate::locale::Locale;
    use crate::prompt::PromptEnvelope;
    use crate::session::Sender;
    use crate::stream::{decode_fragments, FragmentStream};
    use async_trait::async_trait;
    use futures::stream;
    use crate::context::DocumentRepository;
    use crate::types::RepoEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingView {
        events: Vec<String>,
        renders: Vec<String>,
    }

    impl ChatView for RecordingView {
        fn show_indicator(&mut self, indicator: Indicator) {
            self.events.push(format!("show {:?}", indicator));
        }

        fn clear_indicator(&mut self, indicator: Indicator) {
            self.events.push(format!("clear {:?}", indicator));
        }

        fn render_partial(&mut self, answer: &str) {
            self.renders.push(answer.to_string());
        }
    }

    /// Replays a canned SSE body through the real decoder
    struct ScriptedBackend {
        body: Option<Vec<&'static str>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<PromptEnvelope>>,
    }

    impl ScriptedBackend {
        fn new(body: Option<Vec<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn open_stream(&self, envelope: &PromptEnvelope) -> AssistantResult<FragmentStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(envelope.clone());
            match &self.body {
                Some(lines) => {
                    let chunks: Vec<Result<Vec<u8>, String>> =
                        lines.iter().map(|l| Ok(l.as_bytes().to_vec())).collect();
                    Ok(decode_fragments(stream::iter(chunks)))
                }
                None => Err(AssistantError::RequestError("connection refused".into())),
            }
        }
    }

    /// Body that delivers some frames and then drops the connection
    struct BrokenBody(Vec<&'static str>);

    #[async_trait]
    impl CompletionBackend for BrokenBody {
        async fn open_stream(&self, _envelope: &PromptEnvelope) -> AssistantResult<FragmentStream> {
            let mut chunks: Vec<Result<Vec<u8>, String>> =
                self.0.iter().map(|l| Ok(l.as_bytes().to_vec())).collect();
            chunks.push(Err("connection reset".into()));
            Ok(decode_fragments(stream::iter(chunks)))
        }
    }

    struct HangingRepository;

    #[async_trait]
    impl DocumentRepository for HangingRepository {
        async fn list_documents(&self) -> AssistantResult<Vec<RepoEntry>> {
            futures::future::pending().await
        }
    }

    const HELLO: [&str; 3] = [
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "data: [DONE]\n",
    ];

    #[tokio::test]
    async fn streams_answer_with_incremental_renders() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(backend.clone(), ContextGatherer::default(), "Persona.");
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let answer = assistant.respond(&mut session, "thanks", &mut view).await;

        assert_eq!(answer.as_deref(), Some("Hello"));
        assert_eq!(view.renders, vec!["Hel", "Hello"]);
        assert_eq!(view.events, vec!["show Thinking", "clear Thinking"]);

        let entries = session.conversation.entries();
        assert_eq!(entries[entries.len() - 2].sender, Sender::User);
        assert_eq!(entries[entries.len() - 2].text, "thanks");
        assert_eq!(entries[entries.len() - 1].text, "Hello");
    }

    #[tokio::test]
    async fn malformed_frame_does_not_truncate_answer() {
        let backend = ScriptedBackend::new(Some(vec![
            HELLO[0],
            "data: {garbage}\n",
            HELLO[1],
            HELLO[2],
        ]));
        let assistant = Assistant::new(backend, ContextGatherer::default(), "Persona.");
        let mut view = RecordingView::default();

        let answer = assistant
            .respond(&mut ChatSession::default(), "ok", &mut view)
            .await;
        assert_eq!(answer.as_deref(), Some("Hello"));
        assert_eq!(view.renders, vec!["Hel", "Hello"]);
    }

    #[tokio::test]
    async fn failed_call_yields_apology() {
        let backend = ScriptedBackend::new(None);
        let assistant = Assistant::new(backend, ContextGatherer::default(), "Persona.");
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let answer = assistant.respond(&mut session, "thanks", &mut view).await;
        assert_eq!(answer.as_deref(), Some(APOLOGY));
        assert_eq!(view.renders, vec![APOLOGY]);
        assert_eq!(view.events, vec!["show Thinking", "clear Thinking"]);
        assert_eq!(session.conversation.entries().last().unwrap().text, APOLOGY);
    }

    #[tokio::test]
    async fn blank_query_is_a_no_op() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(backend.clone(), ContextGatherer::default(), "Persona.");
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        assert_eq!(assistant.respond(&mut session, "   ", &mut view).await, None);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(view.events.is_empty());
        assert_eq!(session.conversation.entries().len(), 1);
    }

    #[tokio::test]
    async fn retrieval_context_reaches_the_prompt() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(
            backend.clone(),
            gatherer(Ok(vec!["gbv-policy.pdf"]), Ok(vec!["Result A", "Result B", "Result C"])),
            "Persona.",
        );
        let mut session = ChatSession::new(Locale::Rw);
        let mut view = RecordingView::default();

        assistant
            .respond(&mut session, "What is the GBV policy?", &mut view)
            .await;

        assert_eq!(
            view.events,
            vec![
                "show Thinking",
                "show ProcessingDocuments",
                "clear ProcessingDocuments",
                "clear Thinking"
            ]
        );
        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0].system.content,
            "Persona. Context: Internal documents found: gbv-policy.pdf\nExternal sources: Result A, Result B. Please respond in Kinyarwanda."
        );
        assert_eq!(seen[0].user.content, "What is the GBV policy?");
    }

    #[tokio::test]
    async fn failing_sources_still_answer_and_clear_indicator_once() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(backend.clone(), gatherer(Err("401"), Err("500")), "P.");
        let mut view = RecordingView::default();

        let answer = assistant
            .respond(&mut ChatSession::default(), "Who do I contact?", &mut view)
            .await;

        assert_eq!(answer.as_deref(), Some("Hello"));
        let cleared = view
            .events
            .iter()
            .filter(|e| *e == "clear ProcessingDocuments")
            .count();
        assert_eq!(cleared, 1);
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].system.content, "P. Context: . Please respond in English.");
    }

    #[tokio::test]
    async fn small_talk_skips_retrieval() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(
            backend,
            gatherer(Ok(vec!["a.md"]), Ok(vec!["A"])),
            "P.",
        );
        let mut view = RecordingView::default();
        assistant
            .respond(&mut ChatSession::default(), "thanks", &mut view)
            .await;
        assert!(!view.events.iter().any(|e| e.contains("ProcessingDocuments")));
    }

    #[tokio::test]
    async fn body_broken_before_any_data_yields_apology() {
        let assistant = Assistant::new(
            Arc::new(BrokenBody(Vec::new())),
            ContextGatherer::default(),
            "P.",
        );
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let answer = assistant.respond(&mut session, "thanks", &mut view).await;
        assert_eq!(answer.as_deref(), Some(APOLOGY));
        assert_eq!(view.renders, vec![APOLOGY]);
        assert_eq!(session.conversation.entries().last().unwrap().text, APOLOGY);
    }

    #[tokio::test]
    async fn body_broken_mid_answer_keeps_partial_text() {
        let assistant = Assistant::new(
            Arc::new(BrokenBody(vec![HELLO[0]])),
            ContextGatherer::default(),
            "P.",
        );
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let answer = assistant.respond(&mut session, "thanks", &mut view).await;
        assert_eq!(answer.as_deref(), Some("Hel"));
        assert_eq!(view.renders, vec!["Hel"]);
        assert_eq!(session.conversation.entries().last().unwrap().text, "Hel");
    }

    #[tokio::test]
    async fn clean_empty_stream_adds_nothing() {
        let backend = ScriptedBackend::new(Some(vec![HELLO[2]]));
        let assistant = Assistant::new(backend, ContextGatherer::default(), "P.");
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let answer = assistant.respond(&mut session, "thanks", &mut view).await;
        assert_eq!(answer.as_deref(), Some(""));
        assert!(view.renders.is_empty());
        assert_eq!(session.conversation.entries().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_request_clears_each_indicator_once() {
        let backend = ScriptedBackend::new(Some(HELLO.to_vec()));
        let assistant = Assistant::new(
            backend.clone(),
            ContextGatherer::new(Some(Arc::new(HangingRepository)), None),
            "P.",
        );
        let mut session = ChatSession::default();
        let mut view = RecordingView::default();

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            assistant.respond(&mut session, "Where is the office?", &mut view),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            view.events,
            vec![
                "show Thinking",
                "show ProcessingDocuments",
                "clear ProcessingDocuments",
                "clear Thinking"
            ]
        );
    }
}
