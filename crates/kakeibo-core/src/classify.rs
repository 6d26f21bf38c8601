//! Category batch classification
//!
//! Maps transaction descriptions to categories through an [`AIClient`].
//! Descriptions are deduplicated and split into chunks of
//! `ClassifierConfig::batch_size`; each chunk becomes one request carrying a
//! numbered list, and the model must answer with a JSON object keyed by
//! number.
//!
//! A batch that fits in one chunk is classified inline. Larger batches fan out
//! onto a `JoinSet` bounded by a semaphore of `max_concurrency` permits. Every
//! dispatched chunk runs to completion even when a sibling fails: the set is
//! drained before anything is returned, so a failure never cancels in-flight
//! requests. Results are merged sequentially in chunk order after the join.
//!
//! Failure is all-or-nothing. If any chunk fails, [`CategoryClassifier::classify_batch`]
//! returns the error of the lowest-numbered failing chunk and discards the
//! rest. [`CategoryClassifier::classify_or_default`] is the ingestion-side
//! policy on top: it swaps a failed batch for the default category on every
//! description.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::ai::parsing::parse_category_response;
use crate::ai::{AIBackend, AIClient};
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::models::Category;
use crate::prompts::{Prompt, PromptId, PromptLibrary};

/// Description to category, keyed by the exact input string
pub type CategoryAssignment = HashMap<String, Category>;

/// Result of [`CategoryClassifier::classify_or_default`]
#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    pub assignment: CategoryAssignment,
    /// Set when the batch failed and every description got the default
    pub fallback_reason: Option<String>,
}

impl ClassificationOutcome {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

type ChunkResult = Result<Vec<(String, Category)>>;

/// Batch classifier over a classification backend
#[derive(Clone)]
pub struct CategoryClassifier {
    ai: AIClient,
    config: ClassifierConfig,
    prompt: Arc<Prompt>,
}

impl CategoryClassifier {
    /// Create a classifier using the prompt library's classification prompt
    pub fn new(ai: AIClient, config: ClassifierConfig) -> Result<Self> {
        let mut library = PromptLibrary::new();
        let prompt = library.get(PromptId::ClassifyCategories)?.clone();
        Self::with_prompt(ai, config, prompt)
    }

    /// Create a classifier with an explicit prompt
    pub fn with_prompt(ai: AIClient, config: ClassifierConfig, prompt: Prompt) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ai,
            config,
            prompt: Arc::new(prompt),
        })
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify descriptions, failing the whole batch if any chunk fails
    pub async fn classify_batch<S: AsRef<str>>(
        &self,
        descriptions: &[S],
    ) -> Result<CategoryAssignment> {
        let unique = unique_descriptions(descriptions);
        if unique.is_empty() {
            return Ok(CategoryAssignment::new());
        }

        let chunks: Vec<Vec<String>> = unique
            .chunks(self.config.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        debug!(
            descriptions = unique.len(),
            chunks = chunks.len(),
            backend = self.ai.kind(),
            model = self.ai.model(),
            "Classifying descriptions"
        );

        if let [chunk] = chunks.as_slice() {
            let pairs = classify_chunk(&self.ai, &self.prompt, chunk, self.config.default_category)
                .await?;
            return Ok(pairs.into_iter().collect());
        }

        self.classify_chunks(chunks).await
    }

    /// Classify descriptions, assigning the default category to all of them
    /// if the batch fails
    pub async fn classify_or_default<S: AsRef<str>>(
        &self,
        descriptions: &[S],
    ) -> ClassificationOutcome {
        match self.classify_batch(descriptions).await {
            Ok(assignment) => ClassificationOutcome {
                assignment,
                fallback_reason: None,
            },
            Err(e) => {
                if e.is_classification_failure() {
                    warn!(
                        "Classification failed, assigning {} to all descriptions: {}",
                        self.config.default_category, e
                    );
                } else {
                    error!(
                        "Unexpected classification error, assigning {} to all descriptions: {}",
                        self.config.default_category, e
                    );
                }
                ClassificationOutcome {
                    assignment: default_assignment(descriptions, self.config.default_category),
                    fallback_reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Fan chunks out on a bounded pool and merge once all have finished
    async fn classify_chunks(&self, chunks: Vec<Vec<String>>) -> Result<CategoryAssignment> {
        let chunk_count = chunks.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let ai = self.ai.clone();
            let prompt = Arc::clone(&self.prompt);
            let semaphore = Arc::clone(&semaphore);
            let default_category = self.config.default_category;

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        debug!(chunk = index, size = chunk.len(), "Dispatching chunk");
                        classify_chunk(&ai, &prompt, &chunk, default_category).await
                    }
                    Err(_) => Err(Error::Service("Classification worker pool closed".into())),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<ChunkResult>> = (0..chunk_count).map(|_| None).collect();
        let mut task_failure = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Err(ref e) = result {
                        warn!(chunk = index, "Chunk classification failed: {}", e);
                    }
                    results[index] = Some(result);
                }
                Err(e) => {
                    warn!("Chunk classification task aborted: {}", e);
                    task_failure.get_or_insert_with(|| {
                        Error::Service(format!("Classification task aborted: {}", e))
                    });
                }
            }
        }

        let mut assignment = CategoryAssignment::new();
        for result in results {
            match result {
                Some(Ok(pairs)) => assignment.extend(pairs),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(task_failure.take().unwrap_or_else(|| {
                        Error::Service("Classification task produced no result".into())
                    }))
                }
            }
        }

        info!(
            descriptions = assignment.len(),
            chunks = chunk_count,
            "Classified descriptions"
        );
        Ok(assignment)
    }
}

/// Drop blank descriptions and duplicates, keeping first-seen order
fn unique_descriptions<S: AsRef<str>>(descriptions: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    descriptions
        .iter()
        .map(|d| d.as_ref())
        .filter(|d| !d.trim().is_empty())
        .filter(|d| seen.insert(*d))
        .map(str::to_string)
        .collect()
}

/// Every non-blank description mapped to `category`
fn default_assignment<S: AsRef<str>>(descriptions: &[S], category: Category) -> CategoryAssignment {
    unique_descriptions(descriptions)
        .into_iter()
        .map(|d| (d, category))
        .collect()
}

/// Numbered list sent to the model, one description per line
fn numbered_list(chunk: &[String]) -> String {
    chunk
        .iter()
        .enumerate()
        .map(|(i, description)| format!("{}. {}", i + 1, description.replace('\n', " ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classify one chunk in a single request
async fn classify_chunk(
    ai: &AIClient,
    prompt: &Prompt,
    chunk: &[String],
    default_category: Category,
) -> ChunkResult {
    let labels = Category::all()
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");
    let descriptions = numbered_list(chunk);

    let mut vars = HashMap::new();
    vars.insert("categories", labels.as_str());
    vars.insert("descriptions", descriptions.as_str());

    let system_prompt = prompt.render_system(&vars);
    let user_prompt = prompt.render_user(&vars);

    let response = ai.classify(&system_prompt, &user_prompt, true).await?;
    let categories = parse_category_response(&response, chunk.len())?;

    Ok(chunk
        .iter()
        .zip(categories)
        .map(|(description, category)| {
            let category = category.unwrap_or_else(|| {
                debug!(description = %description, "Unknown category label, using default");
                default_category
            });
            (description.clone(), category)
        })
        .collect())
}
