// Agent session.
// Drives the chat loop: request a completion, run requested tools, repeat.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use url::Url;

use crate::cache::{DiskCache, PageCache};
use crate::contacts::Contact;
use crate::error::{Result, ScoutError};
use crate::events::{CrawlEvent, EventBus};
use crate::openai::{ChatMessage, ChatRequest, TokenUsage};
use crate::web::PageSource;

use super::prompts;
use super::tools::{self, Tool};
use super::{AgentOptions, ChatBackend};

/// Source of user replies when the model answers with plain text.
pub trait UserInput: Send {
    /// Show the model's reply and return the user's answer. `None` ends the session.
    fn reply_to(&mut self, assistant: &str) -> Option<String>;
}

/// Reads replies from stdin; `q` stops.
#[derive(Debug, Default)]
pub struct StdinInput;

impl UserInput for StdinInput {
    fn reply_to(&mut self, assistant: &str) -> Option<String> {
        tokio::task::block_in_place(|| {
            println!("Model:\n{}\n", assistant);
            print!("You ('q' to stop): ");
            io::stdout().flush().ok()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).ok()?;
            let line = line.trim().to_string();
            (line != "q").then_some(line)
        })
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
}

/// One conversation with the model, collecting saved contacts.
pub struct ContactAgent {
    backend: Arc<dyn ChatBackend>,
    pages: Arc<dyn PageSource>,
    disk_cache: Option<DiskCache>,
    events: EventBus,
    options: AgentOptions,
    user_input: Option<Box<dyn UserInput>>,

    messages: Vec<ChatMessage>,
    contacts: Vec<Contact>,
    web_cache: PageCache,
    start_url: Option<String>,
    last_url: Option<Url>,
    usage: TokenUsage,
}

impl ContactAgent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        pages: Arc<dyn PageSource>,
        events: EventBus,
        options: AgentOptions,
    ) -> Self {
        let web_cache = PageCache::new(options.cache_size);
        Self {
            backend,
            pages,
            disk_cache: None,
            events,
            options,
            user_input: None,
            messages: Vec::new(),
            contacts: Vec::new(),
            web_cache,
            start_url: None,
            last_url: None,
            usage: TokenUsage::default(),
        }
    }

    pub fn with_disk_cache(mut self, cache: Option<DiskCache>) -> Self {
        self.disk_cache = cache;
        self
    }

    /// Ask the user whenever the model replies without calling a tool.
    pub fn with_user_input(mut self, input: Box<dyn UserInput>) -> Self {
        self.user_input = Some(input);
        self
    }

    /// Run the conversation for a prompt template until the model stops.
    /// A `url` parameter becomes the start URL stamped on saved contacts.
    /// A failed completion after contacts were saved ends the search with those contacts.
    pub async fn start(&mut self, template: &str, params: &[(&str, &str)]) -> Result<Vec<Contact>> {
        self.start_url = params
            .iter()
            .find(|(key, _)| *key == "url")
            .map(|(_, value)| value.to_string());
        self.messages
            .push(ChatMessage::user(prompts::render(template, params)));

        for _ in 0..self.options.max_steps {
            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Done) => return Ok(self.contacts.clone()),
                Err(e) if !self.contacts.is_empty() => {
                    self.events.warn(format!(
                        "Search stopped early ({}), keeping {} saved contacts",
                        e,
                        self.contacts.len()
                    ));
                    return Ok(self.contacts.clone());
                }
                Err(e) => return Err(e),
            }
        }

        self.events.warn(format!(
            "Stopped after {} steps without a final answer",
            self.options.max_steps
        ));
        Ok(self.contacts.clone())
    }

    /// Clear the conversation, saved contacts and token counters.
    /// The page cache survives so a follow-up search can reuse pages.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.contacts.clear();
        self.start_url = None;
        self.last_url = None;
        self.usage = TokenUsage::default();
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    async fn step(&mut self) -> Result<Step> {
        let request = ChatRequest {
            model: self.options.model.clone(),
            messages: self.messages.clone(),
            tools: tools::definitions(),
            tool_choice: Some("auto".to_string()),
            seed: Some(42),
            temperature: Some(0.0),
        };

        let response = self.backend.complete(&request).await?;
        if let Some(usage) = &response.usage {
            self.usage.record(usage);
        }

        let Some(message) = response.first_message().cloned() else {
            log::debug!("Model returned no message");
            return Ok(Step::Done);
        };

        let calls = message.requested_tools().to_vec();
        if !calls.is_empty() {
            self.messages.push(message);
            for call in &calls {
                let output = self.run_tool(Tool::parse(&call.function)).await;
                self.messages.push(ChatMessage::tool_result(call, output));
            }
            return Ok(Step::Continue);
        }

        let text = message.content.clone().unwrap_or_default();
        self.messages.push(message);

        let Some(input) = self.user_input.as_mut() else {
            return Ok(Step::Done);
        };
        match input.reply_to(&text) {
            Some(reply) => {
                self.messages.push(ChatMessage::user(reply));
                Ok(Step::Continue)
            }
            None => Ok(Step::Done),
        }
    }

    async fn run_tool(&mut self, tool: std::result::Result<Tool, String>) -> String {
        match tool {
            Ok(Tool::VisitUrl { url }) => match self.visit_url(&url).await {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("visit_url {} failed: {}", url, e);
                    format!("Error: could not load {}: {}", url, e)
                }
            },
            Ok(Tool::SaveContact(contact)) => self.save_contact(contact),
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Resolve, fetch and clean a page, preferring cached copies.
    async fn visit_url(&mut self, url: &str) -> Result<String> {
        let resolved = self.resolve(url)?;
        let key = resolved.to_string();
        self.last_url = Some(resolved);

        if let Some(html) = self.web_cache.get(&key) {
            log::debug!("Using cached version of url {}", key);
            return Ok(html.clone());
        }
        if let Some(html) = self.disk_cache.as_ref().and_then(|cache| cache.get(&key)) {
            log::debug!("Using disk-cached version of url {}", key);
            self.web_cache.insert(key, html.clone());
            return Ok(html);
        }

        log::info!("Visiting {}", key);
        self.events.publish(CrawlEvent::Visiting { url: key.clone() });

        let html = self.pages.fetch(&key).await?;
        if let Some(cache) = &self.disk_cache {
            if let Err(e) = cache.put(&key, &html) {
                log::warn!("Could not cache {}: {}", key, e);
            }
        }
        self.web_cache.insert(key, html.clone());
        Ok(html)
    }

    /// Absolute URLs pass through; relative ones join the last visited page
    /// (or the start URL before any page was visited).
    fn resolve(&self, url: &str) -> Result<Url> {
        let url = url.trim();
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        let base = self
            .last_url
            .clone()
            .or_else(|| self.start_url.as_deref().and_then(|s| Url::parse(s).ok()))
            .ok_or_else(|| ScoutError::invalid_url(url, "relative URL without a base"))?;
        base.join(url).map_err(|e| ScoutError::invalid_url(url, e))
    }

    fn save_contact(&mut self, mut contact: Contact) -> String {
        contact.start_url = self.start_url.clone();
        let saved = serde_json::to_string(&contact).unwrap_or_else(|_| contact.name.clone());
        log::debug!("Saved contact {}", saved);
        self.contacts.push(contact);
        format!("Successfully saved contact: {}", saved)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::openai::{ChatResponse, Choice, FunctionCall, Role, ToolCall, Usage};

    /// Replays canned responses and records every request.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<ChatResponse>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ScoutError::Other("script exhausted".to_string()))
        }
    }

    struct StaticPages {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl StaticPages {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScoutError::Other(format!("404 {}", url)))
        }
    }

    fn tool_response(calls: &[(&str, &str)]) -> ChatResponse {
        let tool_calls = calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCall {
                id: format!("call_{}", i),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: args.to_string(),
                },
            })
            .collect();
        ChatResponse {
            choices: vec![Choice {
                index: 0,
                message: Some(ChatMessage {
                    role: Role::Assistant,
                    content: None,
                    tool_calls: Some(tool_calls),
                    tool_call_id: None,
                    name: None,
                }),
                finish_reason: Some("tool_calls".to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 2,
                total_tokens: 12,
            }),
        }
    }

    fn text_response(text: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![Choice {
                index: 0,
                message: Some(ChatMessage::assistant(text)),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens: 20,
                completion_tokens: 5,
                total_tokens: 25,
            }),
        }
    }

    fn agent(backend: Arc<ScriptedBackend>, pages: Arc<StaticPages>) -> ContactAgent {
        ContactAgent::new(backend, pages, EventBus::new(), AgentOptions::default())
    }

    #[tokio::test]
    async fn test_visits_saves_and_stops() {
        let backend = ScriptedBackend::new(vec![
            tool_response(&[("visit_url", r#"{"url": "https://a.de/"}"#)]),
            tool_response(&[
                ("save_contact", r#"{"name": "Anna", "political_party": "SPD"}"#),
                ("save_contact", r#"{"name": "Ben"}"#),
            ]),
            text_response("Done."),
        ]);
        let pages = StaticPages::new(&[("https://a.de/", "<p>Anna SPD</p>")]);
        let mut agent = agent(backend.clone(), pages.clone());

        let contacts = agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Anna");
        assert_eq!(contacts[0].start_url.as_deref(), Some("https://a.de/"));
        assert_eq!(
            agent.usage(),
            TokenUsage {
                input: 40,
                output: 9,
                total: 49
            }
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].seed, Some(42));

        // The second request carries the tool call and its page content.
        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[2].role, Role::Tool);
        assert_eq!(second[2].tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(second[2].content.as_deref(), Some("<p>Anna SPD</p>"));
    }

    #[tokio::test]
    async fn test_repeated_visit_served_from_cache() {
        let backend = ScriptedBackend::new(vec![
            tool_response(&[("visit_url", r#"{"url": "https://a.de/team"}"#)]),
            tool_response(&[("visit_url", r#"{"url": "/team"}"#)]),
            text_response("ok"),
        ]);
        let pages = StaticPages::new(&[("https://a.de/team", "<p>Team</p>")]);
        let events = EventBus::new();
        let mut sub = events.subscribe();
        let mut agent = ContactAgent::new(
            backend,
            pages.clone(),
            events.clone(),
            AgentOptions::default(),
        );

        agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        assert_eq!(pages.fetched.lock().unwrap().len(), 1);
        let mut visits = 0;
        while let Some(event) = sub.try_next() {
            if matches!(event, CrawlEvent::Visiting { .. }) {
                visits += 1;
            }
        }
        assert_eq!(visits, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_reported_to_model() {
        let backend = ScriptedBackend::new(vec![
            tool_response(&[("visit_url", r#"{"url": "https://a.de/missing"}"#)]),
            text_response("nothing there"),
        ]);
        let mut agent = agent(backend.clone(), StaticPages::new(&[]));

        let contacts = agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();
        assert!(contacts.is_empty());

        let requests = backend.requests.lock().unwrap();
        let tool_output = requests[1].messages[2].content.clone().unwrap();
        assert!(tool_output.starts_with("Error: could not load"));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let responses = (0..5)
            .map(|_| tool_response(&[("save_contact", r#"{"name": "Loop"}"#)]))
            .collect();
        let backend = ScriptedBackend::new(responses);
        let options = AgentOptions {
            max_steps: 3,
            ..AgentOptions::default()
        };
        let mut agent = ContactAgent::new(backend.clone(), StaticPages::new(&[]), EventBus::new(), options);

        let contacts = agent
            .start(prompts::UPDATE_CONTACT, &[("person", "Loop"), ("contact_url", "https://a.de")])
            .await
            .unwrap();

        assert_eq!(contacts.len(), 3);
        assert!(contacts[0].start_url.is_none());
        assert_eq!(backend.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_interactive_reply_continues() {
        struct Scripted(Vec<&'static str>);
        impl UserInput for Scripted {
            fn reply_to(&mut self, _assistant: &str) -> Option<String> {
                self.0.pop().map(String::from)
            }
        }

        let backend = ScriptedBackend::new(vec![text_response("Which party?"), text_response("Bye")]);
        let mut agent = agent(backend.clone(), StaticPages::new(&[]))
            .with_user_input(Box::new(Scripted(vec!["SPD"])));

        agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages[2].content.as_deref(), Some("SPD"));
    }

    #[tokio::test]
    async fn test_reset_clears_session() {
        let backend = ScriptedBackend::new(vec![
            tool_response(&[("save_contact", r#"{"name": "Anna"}"#)]),
            text_response("done"),
        ]);
        let mut agent = agent(backend, StaticPages::new(&[]));
        agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        agent.reset();
        assert!(agent.contacts().is_empty());
        assert!(agent.messages().is_empty());
        assert_eq!(agent.usage(), TokenUsage::default());
    }

    #[tokio::test]
    async fn test_backend_error_keeps_saved_contacts() {
        // The script runs out after the first answer, so the second request fails.
        let backend = ScriptedBackend::new(vec![tool_response(&[(
            "save_contact",
            r#"{"name": "Anna"}"#,
        )])]);
        let events = EventBus::new();
        let mut sub = events.subscribe();
        let mut agent = ContactAgent::new(
            backend.clone(),
            StaticPages::new(&[]),
            events.clone(),
            AgentOptions::default(),
        );

        let contacts = agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Anna");
        assert_eq!(backend.requests.lock().unwrap().len(), 2);

        let mut warned = false;
        while let Some(event) = sub.try_next() {
            if let CrawlEvent::Log { level, message } = event {
                warned |= level == log::Level::Warn && message.contains("stopped early");
            }
        }
        assert!(warned);
    }

    #[tokio::test]
    async fn test_disk_cache_hit_skips_fetch() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk = DiskCache::new(temp_dir.path(), std::time::Duration::from_secs(60));
        disk.put("https://a.de/team", "<p>Cached team</p>").unwrap();

        let backend = ScriptedBackend::new(vec![
            tool_response(&[("visit_url", r#"{"url": "https://a.de/team"}"#)]),
            text_response("ok"),
        ]);
        let pages = StaticPages::new(&[("https://a.de/team", "<p>Live team</p>")]);
        let events = EventBus::new();
        let mut sub = events.subscribe();
        let mut agent = ContactAgent::new(
            backend.clone(),
            pages.clone(),
            events.clone(),
            AgentOptions::default(),
        )
        .with_disk_cache(Some(disk));

        agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        assert!(pages.fetched.lock().unwrap().is_empty());
        let requests = backend.requests.lock().unwrap();
        assert_eq!(
            requests[1].messages[2].content.as_deref(),
            Some("<p>Cached team</p>")
        );
        while let Some(event) = sub.try_next() {
            assert!(!matches!(event, CrawlEvent::Visiting { .. }));
        }
    }

    #[tokio::test]
    async fn test_disk_cache_miss_stores_page() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let disk = DiskCache::new(temp_dir.path(), std::time::Duration::from_secs(60));

        let backend = ScriptedBackend::new(vec![
            tool_response(&[("visit_url", r#"{"url": "https://a.de/team"}"#)]),
            text_response("ok"),
        ]);
        let pages = StaticPages::new(&[("https://a.de/team", "<p>Live team</p>")]);
        let mut agent = agent(backend, pages.clone()).with_disk_cache(Some(disk.clone()));

        agent
            .start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")])
            .await
            .unwrap();

        assert_eq!(pages.fetched.lock().unwrap().len(), 1);
        assert_eq!(
            disk.get("https://a.de/team").as_deref(),
            Some("<p>Live team</p>")
        );
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mut agent = agent(ScriptedBackend::new(Vec::new()), StaticPages::new(&[]));
        let result = agent.start(prompts::FIND_CONTACTS, &[("url", "https://a.de/")]).await;
        assert!(matches!(result, Err(ScoutError::Other(_))));
    }
}
