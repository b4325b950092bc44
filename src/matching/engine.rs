// src/matching/engine.rs - Runs every client name through the matching pipeline against one document
use chrono::Utc;
use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use super::decision::{Decision, DecisionPolicy};
use super::document::DocumentIndex;
use super::false_positive::FalsePositiveFilter;
use super::keywords::{priority_words, HeuristicKeywordExtractor, KeywordExtractor};
use super::scorer::{ScoreEvidence, Scorer};
use super::variants::{generate_variants, NormalizedName};
use crate::models::matching::{
    MatchEvidence, MatchReason, MatchResult, MatchType, SkipReason, SkippedInput,
};
use crate::models::stats_models::{MatchRunReport, MatchRunSummary, RunStatus};
use crate::utils::config::MatchConfig;
use crate::utils::progress_bars::logging::MatchingLogger;
use crate::utils::progress_bars::progress_callback::ProgressCallback;
use crate::{update_detailed_progress, update_progress};

const MAX_EVIDENCE_PER_RESULT: usize = 10;

#[derive(Debug, Error)]
pub enum MatchEngineError {
    /// No document source at all, as opposed to an empty document.
    #[error("no document source supplied; a missing document cannot be told apart from a document without matches")]
    MissingDocument,
    #[error("failed to build a worker pool with {workers} threads")]
    WorkerPool {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Mutable state of one matching run, shared by every worker.
///
/// The cancellation flag and the counters are the only things workers write
/// besides their own result slot.
pub struct MatchRunContext {
    run_id: Uuid,
    cancelled: Arc<AtomicBool>,
    completed: AtomicUsize,
    total: AtomicUsize,
    false_positives_avoided: AtomicUsize,
    // one slot per evaluable input, in input order
    results: Mutex<Vec<Option<MatchResult>>>,
    progress_callback: Option<ProgressCallback>,
    logger: MatchingLogger,
}

impl Default for MatchRunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchRunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancelled: Arc::new(AtomicBool::new(false)),
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            false_positives_avoided: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
            progress_callback: None,
            logger: MatchingLogger::default(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Ask the run to stop. Clients already being evaluated finish; no new
    /// ones are started.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Handle for cancelling from another thread or a signal handler.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `(completed, total)` clients of the current run.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.completed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    pub fn false_positives_avoided(&self) -> usize {
        self.false_positives_avoided.load(Ordering::SeqCst)
    }

    pub fn add_false_positives_avoided(&self, count: usize) {
        self.false_positives_avoided.fetch_add(count, Ordering::SeqCst);
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<MatchResult>>> {
        // a panicking worker cannot leave a slot half-written
        self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, total: usize) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.false_positives_avoided.store(0, Ordering::SeqCst);
        let mut slots = self.slots();
        slots.clear();
        slots.resize(total, None);
    }

    fn record(&self, slot: usize, result: MatchResult) {
        self.logger.log_decision(&result);
        if let Some(entry) = self.slots().get_mut(slot) {
            *entry = Some(result);
        }
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        update_detailed_progress!(self.progress_callback, "Matching clients", completed, total);
    }

    /// Completed results in input order.
    fn take_results(&self) -> Vec<MatchResult> {
        std::mem::take(&mut *self.slots())
            .into_iter()
            .flatten()
            .collect()
    }
}

pub struct MatchEngine {
    config: MatchConfig,
    scorer: Scorer,
    filter: FalsePositiveFilter,
    policy: DecisionPolicy,
    keywords: Arc<dyn KeywordExtractor>,
    fallback_keywords: HeuristicKeywordExtractor,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        let fallback_keywords = HeuristicKeywordExtractor::new(config.priority_tie_break);
        Self {
            scorer: Scorer::new(),
            filter: FalsePositiveFilter::new(config.context_radius),
            policy: DecisionPolicy::from_config(&config),
            keywords: Arc::new(fallback_keywords.clone()),
            fallback_keywords,
            config,
        }
    }

    /// Replace the local keyword heuristic, e.g. with a remote extractor.
    /// The heuristic stays as the fallback.
    pub fn with_keyword_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.keywords = extractor;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Evaluate one client against an already-built index. Never fails;
    /// problems with the name or the document become the result's reason.
    pub fn evaluate_client(
        &self,
        raw_name: &str,
        index: &DocumentIndex,
        ctx: &MatchRunContext,
    ) -> MatchResult {
        let client_name = raw_name.trim();
        if index.is_empty() {
            return MatchResult::rejected(client_name, MatchReason::EmptyDocument);
        }

        let name = NormalizedName::from_raw(client_name);
        if name.is_too_short() {
            return MatchResult::rejected(client_name, MatchReason::NameTooShort);
        }
        if name.is_degenerate() {
            return MatchResult::rejected(client_name, MatchReason::DegenerateName);
        }

        let variants = generate_variants(&name.normalized);
        let priority = priority_words(self.keywords.as_ref(), &self.fallback_keywords, &name);
        let mut evidence = self.scorer.score(&name, &variants, index);
        let mut decision = self.policy.decide(&name, &evidence, &priority);

        if decision.found {
            let (screened, discarded) = self.filter.screen(evidence, index);
            evidence = screened;
            if discarded > 0 {
                ctx.add_false_positives_avoided(discarded);
                let rescreened = self.policy.decide(&name, &evidence, &priority);
                decision = if rescreened.found {
                    rescreened
                } else {
                    debug!("'{}' rejected after context screening", client_name);
                    Decision {
                        reason: MatchReason::FalsePositiveSuppressed,
                        ..rescreened
                    }
                };
            }
        }

        self.build_result(client_name, decision, &evidence, index)
    }

    fn build_result(
        &self,
        client_name: &str,
        decision: Decision,
        evidence: &ScoreEvidence,
        index: &DocumentIndex,
    ) -> MatchResult {
        let records = if decision.found {
            evidence_records(evidence, decision.match_type)
        } else {
            Vec::new()
        };
        let context = records
            .first()
            .map(|record| index.context_around(record.position, self.config.snippet_radius))
            .unwrap_or_default();

        MatchResult {
            client_name: client_name.to_string(),
            found: decision.found,
            confidence: decision.confidence,
            match_type: decision.match_type,
            matched_words: decision.matched_words,
            context,
            reason: decision.reason,
            fuzzy_score: evidence.fuzzy_best().map(|candidate| candidate.score),
            evidence: records,
        }
    }

    /// Match every name against `document`, in input order.
    ///
    /// Fails only when no document source is supplied at all, or when the
    /// worker pool cannot be created. Empty and whitespace-only names are
    /// reported in the skipped list.
    pub fn run(
        &self,
        names: &[String],
        document: Option<&str>,
        ctx: &MatchRunContext,
    ) -> Result<MatchRunReport, MatchEngineError> {
        let document = document.ok_or(MatchEngineError::MissingDocument)?;
        let started_at = Utc::now();
        let start = Instant::now();
        let logger = MatchingLogger::default();
        let workers = self.config.workers.max(1);
        logger.log_start(&ctx.run_id().to_string(), names.len(), workers);

        let mut pending: Vec<&str> = Vec::with_capacity(names.len());
        let mut skipped = Vec::new();
        for (i, raw) in names.iter().enumerate() {
            if raw.trim().is_empty() {
                skipped.push(SkippedInput {
                    index: i,
                    raw: raw.clone(),
                    reason: SkipReason::EmptyName,
                });
            } else {
                pending.push(raw.as_str());
            }
        }
        logger.log_data_quality_issue("empty or whitespace-only names skipped", skipped.len());

        update_progress!(ctx.progress_callback, "Indexing document");
        let index = DocumentIndex::build(document);
        logger.log_document_indexed(
            document.chars().count(),
            index.token_count(),
            index.word_set().len(),
        );
        if index.is_empty() {
            logger.log_warning("Document has no matchable text; every client will be reported as not found");
        }

        ctx.begin(pending.len());
        logger.log_phase(
            "Matching clients",
            Some(format!("{} clients", pending.len()).as_str()),
        );

        if workers <= 1 {
            for (slot, raw) in pending.iter().enumerate() {
                if ctx.is_cancelled() {
                    break;
                }
                let result = self.evaluate_client(raw, &index, ctx);
                ctx.record(slot, result);
            }
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("client-matcher-{}", i))
                .build()
                .map_err(|source| MatchEngineError::WorkerPool { workers, source })?;
            pool.install(|| {
                pending.par_iter().enumerate().for_each(|(slot, raw)| {
                    if ctx.is_cancelled() {
                        return;
                    }
                    let result = self.evaluate_client(raw, &index, ctx);
                    ctx.record(slot, result);
                });
            });
        }

        let results = ctx.take_results();
        let status = if results.len() < pending.len() {
            logger.log_cancelled(results.len(), pending.len());
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        let found = results.iter().filter(|result| result.found).count();
        let evaluated = results.len();
        logger.log_completion(found, evaluated);
        logger.log_performance_summary(ctx.false_positives_avoided(), skipped.len());

        let summary = MatchRunSummary {
            run_id: ctx.run_id(),
            started_at,
            finished_at: Utc::now(),
            status,
            total_names: names.len(),
            evaluated,
            found,
            not_found: evaluated - found,
            skipped: skipped.len(),
            success_rate: MatchRunSummary::success_rate(found, evaluated),
            false_positives_avoided: ctx.false_positives_avoided(),
            threshold: self.config.threshold,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };
        info!(
            "Run {} {}: {}/{} found",
            summary.run_id,
            status.as_str(),
            found,
            evaluated
        );

        Ok(MatchRunReport {
            summary,
            results,
            skipped,
        })
    }
}

/// Evidence behind an accepted verdict, the verdict's own strategy first.
fn evidence_records(evidence: &ScoreEvidence, verdict: Option<MatchType>) -> Vec<MatchEvidence> {
    let mut records = Vec::new();
    for hit in &evidence.substring {
        let strategy = if hit.is_full_form {
            MatchType::Exact
        } else {
            MatchType::PunctuationFree
        };
        records.extend(hit.occurrences.iter().map(|o| MatchEvidence {
            position: o.offset,
            matched_variant: hit.variant.clone(),
            strategy,
        }));
    }
    for hit in &evidence.word_overlap.matched {
        records.extend(hit.occurrences.iter().map(|o| MatchEvidence {
            position: o.offset,
            matched_variant: hit.form.clone(),
            strategy: MatchType::WordOverlap,
        }));
    }
    for hit in &evidence.sequential {
        records.extend(hit.occurrences.iter().map(|o| MatchEvidence {
            position: o.offset,
            matched_variant: format!("{} {}", hit.first, hit.second),
            strategy: MatchType::SequentialWords,
        }));
    }
    for candidate in &evidence.fuzzy {
        records.push(MatchEvidence {
            position: candidate.occurrence.offset,
            matched_variant: candidate.window.clone(),
            strategy: MatchType::Fuzzy,
        });
    }

    // stable sort keeps fuzzy candidates best-first
    records.sort_by_key(|record| {
        let own = Some(record.strategy) == verdict;
        let position = if record.strategy == MatchType::Fuzzy {
            0
        } else {
            record.position
        };
        (!own, record.strategy, position)
    });
    records.truncate(MAX_EVIDENCE_PER_RESULT);
    records
}
