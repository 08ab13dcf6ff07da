// Crawl pipeline.
// Runs agents over start URLs and contact subpages with bounded concurrency.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::agent::{AgentOptions, ChatBackend, ContactAgent, StdinInput, prompts};
use crate::cache::DiskCache;
use crate::contacts::{self, Contact, ContactRow, file};
use crate::error::{Result, ScoutError};
use crate::events::{CrawlEvent, EventBus};
use crate::openai::TokenUsage;
use crate::web::PageSource;

pub const URL_WORKERS: usize = 4;
pub const CONTACT_WORKERS: usize = 8;

pub const UPDATED_FILE: &str = "contacts_updated.csv";
pub const MERGED_FILE: &str = "contacts_merged.csv";

/// Rows produced by a crawl plus the tokens it consumed.
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub rows: Vec<ContactRow>,
    pub usage: TokenUsage,
}

/// Files written by [`Pipeline::run_file`].
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub updated_path: PathBuf,
    pub merged_path: PathBuf,
    pub summary: CrawlSummary,
}

/// Shared crawl setup. Cloning is cheap; clones drive the same backend and bus.
#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn ChatBackend>,
    pages: Arc<dyn PageSource>,
    disk_cache: Option<DiskCache>,
    events: EventBus,
    options: AgentOptions,
    url_workers: usize,
    contact_workers: usize,
    interactive: bool,
}

impl Pipeline {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        pages: Arc<dyn PageSource>,
        events: EventBus,
        options: AgentOptions,
    ) -> Self {
        Self {
            backend,
            pages,
            disk_cache: None,
            events,
            options,
            url_workers: URL_WORKERS,
            contact_workers: CONTACT_WORKERS,
            interactive: false,
        }
    }

    pub fn with_disk_cache(mut self, cache: Option<DiskCache>) -> Self {
        self.disk_cache = cache;
        self
    }

    pub fn with_workers(mut self, url_workers: usize, contact_workers: usize) -> Self {
        self.url_workers = url_workers.max(1);
        self.contact_workers = contact_workers.max(1);
        self
    }

    /// Let the user talk to the first-pass agent on stdin. Forces one URL at a time.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        if interactive {
            self.url_workers = 1;
        }
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn agent(&self) -> ContactAgent {
        ContactAgent::new(
            self.backend.clone(),
            self.pages.clone(),
            self.events.clone(),
            self.options.clone(),
        )
        .with_disk_cache(self.disk_cache.clone())
    }

    /// Find contacts for one start URL, then refine those that have a subpage.
    pub async fn find_contacts(&self, url: &str) -> Result<(Vec<Contact>, TokenUsage)> {
        let mut agent = self.agent();
        if self.interactive {
            agent = agent.with_user_input(Box::new(StdinInput));
        }

        let found = agent.start(prompts::FIND_CONTACTS, &[("url", url)]).await?;
        let mut usage = agent.usage();
        self.events.info(format!(
            "Tokens used for {}: input {}, output {}",
            url, usage.input, usage.output
        ));

        let first_pass = contacts::deduplicate(found);
        if first_pass.is_empty() {
            self.events.info(format!("No contacts found for {}", url));
            return Ok((first_pass, usage));
        }

        self.events.info(format!("Initial search for {} found:", url));
        for contact in &first_pass {
            self.events.info(contact.summary());
        }
        self.events.publish(CrawlEvent::ContactsFound {
            start_url: url.to_string(),
            contacts: first_pass.clone(),
        });

        let with_subpages = contacts::with_subpages(&first_pass);
        if with_subpages.is_empty() {
            return Ok((first_pass, usage));
        }

        let (mut refined, refine_usage) = self.update_contacts(&with_subpages).await;
        usage.add(refine_usage);
        for contact in &mut refined {
            contact.start_url.get_or_insert_with(|| url.to_string());
        }

        let merged = contacts::merge(first_pass, contacts::deduplicate(refined));
        Ok((merged, usage))
    }

    /// Visit each contact's subpage with a fresh agent, a bounded number at once.
    /// Failed lookups are logged and skipped.
    pub async fn update_contacts(&self, targets: &[Contact]) -> (Vec<Contact>, TokenUsage) {
        self.events.info("Searching subpages for additional information");

        let semaphore = Arc::new(Semaphore::new(self.contact_workers));
        let mut set = JoinSet::new();

        for (index, contact) in targets.iter().cloned().enumerate() {
            let this = self.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let closed = ScoutError::Other("worker pool closed".into());
                    return (index, contact.name, Err(closed));
                };
                let contact_url = contact.contact_url.clone().unwrap_or_default();
                let mut agent = this.agent();
                let result = agent
                    .start(
                        prompts::UPDATE_CONTACT,
                        &[
                            ("person", contact.name.as_str()),
                            ("contact_url", contact_url.as_str()),
                        ],
                    )
                    .await
                    .map(|found| (found, agent.usage()));
                (index, contact.name, result)
            });
        }

        let mut results: Vec<(usize, Vec<Contact>)> = Vec::new();
        let mut usage = TokenUsage::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, _, Ok((found, session_usage)))) => {
                    usage.add(session_usage);
                    results.push((index, found));
                }
                Ok((_, name, Err(e))) => {
                    self.events
                        .error(format!("Subpage search for {} failed: {}", name, e));
                }
                Err(e) => self.events.error(format!("Subpage task failed: {}", e)),
            }
        }

        results.sort_by_key(|(index, _)| *index);
        let refined = results.into_iter().flat_map(|(_, found)| found).collect();
        (refined, usage)
    }

    /// Crawl every start URL and return stamped rows with unknowns filled in.
    pub async fn run(&self, urls: Vec<String>) -> CrawlSummary {
        let semaphore = Arc::new(Semaphore::new(self.url_workers));
        let mut set = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let this = self.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let closed = ScoutError::Other("worker pool closed".into());
                    return (index, url, Err(closed));
                };
                let result = this.find_contacts(&url).await;
                (index, url, result)
            });
        }

        let mut results: Vec<(usize, Vec<Contact>)> = Vec::new();
        let mut usage = TokenUsage::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, _, Ok((found, url_usage)))) => {
                    usage.add(url_usage);
                    results.push((index, found));
                }
                Ok((_, url, Err(e))) => {
                    self.events
                        .error(format!("Error while searching {}: {}", url, e));
                }
                Err(e) => self.events.error(format!("Search task failed: {}", e)),
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let mut all: Vec<Contact> = results.into_iter().flat_map(|(_, found)| found).collect();
        if all.is_empty() {
            self.events.info("No contacts found.");
        }

        contacts::fill_unknown(&mut all);
        for contact in &all {
            self.events.info(contact.summary());
        }

        let now = Local::now();
        let rows: Vec<ContactRow> = all
            .into_iter()
            .map(|contact| ContactRow::stamped(contact, now))
            .collect();

        self.events.info(format!(
            "Finished: {} contacts, tokens input {}, output {}, total {}",
            rows.len(),
            usage.input,
            usage.output,
            usage.total
        ));
        self.events.publish(CrawlEvent::Finished {
            rows: rows.clone(),
            usage,
        });

        CrawlSummary { rows, usage }
    }

    /// Crawl the start URLs listed in `input` and write the updated and merged CSVs.
    pub async fn run_file(&self, input: &Path, output_dir: &Path) -> Result<RunOutput> {
        let original = file::read_rows(input)?;
        let urls = file::start_urls(&original);
        if urls.is_empty() {
            return Err(ScoutError::Other(format!(
                "No start_url values in {}",
                input.display()
            )));
        }
        self.events.info(format!(
            "Loaded {} start URLs from {}",
            urls.len(),
            input.display()
        ));

        let summary = self.run(urls).await;

        let updated_path = output_dir.join(UPDATED_FILE);
        file::write_rows(&updated_path, &summary.rows)?;

        let merged = contacts::merge_original_and_updated(original, summary.rows.clone());
        let merged_path = output_dir.join(MERGED_FILE);
        file::write_rows(&merged_path, &merged)?;

        self.events.info(format!(
            "Wrote {} and {}",
            updated_path.display(),
            merged_path.display()
        ));

        Ok(RunOutput {
            updated_path,
            merged_path,
            summary,
        })
    }
}
