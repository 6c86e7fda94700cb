//! Recursive copybook analysis.
//!
//! Each document goes through the same steps: preprocess, parse, then
//! resolve the `COPY` references the parser found. Resolution is a
//! fork/join:
//!
//! 1. fork: a [`ResolutionTask`] is started for every reference, in order of
//!    appearance, before any of them is awaited;
//! 2. join: the tasks are awaited one after another, so a document blocks at
//!    most one worker while its copybooks are in flight;
//! 3. the resolved copybooks are analyzed in parallel on the pool and their
//!    contexts are merged into the parent left to right.
//!
//! Every failure becomes a diagnostic at the `COPY` site and the analysis
//! carries on with an empty context for that copybook. A failure inside a
//! nested copybook is reported a second time at the `COPY` statement of the
//! root document that led to it, with the nested site as related
//! information.

use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::base::constants::COPYBOOK_URI_SCHEME;
use crate::base::{Diagnostic, Location, LogicalName, RelatedInfo, codes};
use crate::bus::EventBus;
use crate::preprocessor::{LineTransformation, Pipeline, SourceFormat, preprocess};
use crate::semantic::{
    CobolSemanticParser, CopybookReference, ParserConfig, SemanticContext, SemanticParser,
    SymbolKind,
};

use super::config::{AnalyzerConfig, DedupPolicy};
use super::error::AnalyzerError;
use super::task::{PendingTask, Resolution, ResolutionTask};

/// URI used for a copybook whose provider did not report one.
pub fn copybook_uri(name: &LogicalName) -> String {
    format!("{COPYBOOK_URI_SCHEME}{name}")
}

/// Resolves copybooks over an [`EventBus`] and builds merged semantic
/// contexts for documents and copybooks.
pub struct CopybookAnalyzer {
    bus: EventBus,
    transformation: Arc<dyn LineTransformation>,
    parser: Arc<dyn SemanticParser>,
    config: AnalyzerConfig,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for CopybookAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopybookAnalyzer")
            .field("bus", &self.bus)
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish_non_exhaustive()
    }
}

impl CopybookAnalyzer {
    /// Analyzer with the standard preprocessing pipeline and parser.
    pub fn new(bus: EventBus, config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let pipeline = Pipeline::standard(config.debug_lines_as_code);
        Self::with_components(
            bus,
            config,
            Arc::new(pipeline),
            Arc::new(CobolSemanticParser),
        )
    }

    pub fn with_components(
        bus: EventBus,
        config: AnalyzerConfig,
        transformation: Arc<dyn LineTransformation>,
        parser: Arc<dyn SemanticParser>,
    ) -> Result<Self, AnalyzerError> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|index| format!("copybook-worker-{index}"));
        if let Some(threads) = config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        Ok(Self {
            bus,
            transformation,
            parser,
            config,
            pool,
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Resolve a copybook by name and analyze it with everything it includes.
    ///
    /// Never fails: a missing or broken copybook yields a context holding
    /// the corresponding diagnostic.
    pub fn analyze_copybook(
        &self,
        name: &LogicalName,
        format: SourceFormat,
        config: &ParserConfig,
    ) -> SemanticContext {
        self.analyze_copybook_with_cancel(name, format, config, &CancellationToken::new())
    }

    pub fn analyze_copybook_with_cancel(
        &self,
        name: &LogicalName,
        format: SourceFormat,
        config: &ParserConfig,
        cancel: &CancellationToken,
    ) -> SemanticContext {
        tracing::debug!(copybook = %name, ?format, "analyzing copybook");
        let reference = CopybookReference {
            name: name.clone(),
            location: Location::document_start(copybook_uri(name)),
        };
        self.pool.install(|| {
            let run = AnalysisRun::new(self, format, config, cancel, 1);
            let contexts = run.resolve_references(std::slice::from_ref(&reference), &[], None);
            SemanticContext::merge_all(contexts)
        })
    }

    /// Analyze a document the editor already holds, resolving its copybooks.
    pub fn analyze_document(
        &self,
        uri: &str,
        text: &str,
        format: SourceFormat,
        config: &ParserConfig,
    ) -> SemanticContext {
        self.analyze_document_with_cancel(uri, text, format, config, &CancellationToken::new())
    }

    pub fn analyze_document_with_cancel(
        &self,
        uri: &str,
        text: &str,
        format: SourceFormat,
        config: &ParserConfig,
        cancel: &CancellationToken,
    ) -> SemanticContext {
        tracing::debug!(uri, ?format, "analyzing document");
        self.pool.install(|| {
            let run = AnalysisRun::new(self, format, config, cancel, 0);
            match run.process_document(uri, text, &[], None) {
                Ok(context) => context,
                Err(err) => {
                    tracing::warn!(uri, error = %err, "document could not be analyzed");
                    SemanticContext::from_diagnostic(
                        Diagnostic::error(
                            Location::document_start(uri),
                            format!("Document could not be analyzed: {err}"),
                        )
                        .with_code(codes::UNREADABLE_SOURCE),
                    )
                }
            }
        })
    }
}

/// A reference that is either settled already or waiting on the bus.
enum Planned<'r> {
    Settled(SemanticContext),
    Pending(&'r CopybookReference, PendingTask),
}

/// A reference ready for the parallel phase.
enum Joined<'r> {
    Settled(SemanticContext),
    Answered(&'r CopybookReference, Resolution),
}

/// State shared by every document of one analysis call.
struct AnalysisRun<'a> {
    analyzer: &'a CopybookAnalyzer,
    format: SourceFormat,
    config: &'a ParserConfig,
    cancel: &'a CancellationToken,
    /// Length of the include chain of the root document: 0 for an editor
    /// document, 1 for a copybook analyzed by name.
    root_depth: usize,
    /// Names already claimed by a reference under [`DedupPolicy::Shared`].
    claimed: Mutex<FxHashSet<LogicalName>>,
}

impl<'a> AnalysisRun<'a> {
    fn new(
        analyzer: &'a CopybookAnalyzer,
        format: SourceFormat,
        config: &'a ParserConfig,
        cancel: &'a CancellationToken,
        root_depth: usize,
    ) -> Self {
        Self {
            analyzer,
            format,
            config,
            cancel,
            root_depth,
            claimed: Mutex::new(FxHashSet::default()),
        }
    }

    /// Preprocess, parse and resolve one document. `chain` holds the
    /// copybooks that include it, outermost first. `site` is the `COPY`
    /// statement of the root document it was reached through, `None` for the
    /// root document itself.
    fn process_document(
        &self,
        uri: &str,
        text: &str,
        chain: &[LogicalName],
        site: Option<&Location>,
    ) -> Result<SemanticContext, AnalyzerError> {
        let preprocessed = preprocess(
            self.analyzer.transformation.as_ref(),
            uri,
            text,
            self.format,
        )?;
        let output =
            self.analyzer
                .parser
                .parse(uri, &preprocessed.result, self.format, self.config)?;

        let mut context = SemanticContext::new();
        context.extend_diagnostics(preprocessed.errors);
        context.merge_from(output.context);
        for child in self.resolve_references(&output.references, chain, site) {
            context.merge_from(child);
        }
        Ok(context)
    }

    /// Resolve `references` and return one context per reference that
    /// contributes, in reference order.
    fn resolve_references(
        &self,
        references: &[CopybookReference],
        chain: &[LogicalName],
        site: Option<&Location>,
    ) -> Vec<SemanticContext> {
        let mut planned = Vec::with_capacity(references.len());
        for reference in references {
            if let Some(outcome) = self.plan(reference, chain, site) {
                planned.push(outcome);
            }
        }

        let joined: Vec<Joined<'_>> = planned
            .into_iter()
            .map(|plan| match plan {
                Planned::Settled(context) => Joined::Settled(context),
                Planned::Pending(reference, task) => {
                    Joined::Answered(reference, task.wait(self.cancel))
                }
            })
            .collect();

        joined
            .into_par_iter()
            .map(|item| match item {
                Joined::Settled(context) => context,
                Joined::Answered(reference, resolution) => {
                    self.graft(reference, resolution, chain, site)
                }
            })
            .collect()
    }

    /// Start a task for `reference`, or settle it without one.
    fn plan<'r>(
        &self,
        reference: &'r CopybookReference,
        chain: &[LogicalName],
        site: Option<&Location>,
    ) -> Option<Planned<'r>> {
        let name = &reference.name;

        if chain.contains(name) {
            tracing::warn!(copybook = %name, "circular copybook inclusion");
            let path = chain
                .iter()
                .chain(std::iter::once(name))
                .map(LogicalName::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Some(Planned::Settled(failure(
                reference,
                site,
                codes::CIRCULAR_COPYBOOK,
                format!("Circular copybook inclusion: {path}"),
            )));
        }

        if chain.len() >= self.analyzer.config.max_depth {
            tracing::warn!(copybook = %name, depth = chain.len(), "copybook nesting too deep");
            return Some(Planned::Settled(failure(
                reference,
                site,
                codes::COPYBOOK_TOO_DEEP,
                format!(
                    "Copybook {name} exceeds the maximum nesting depth of {}",
                    self.analyzer.config.max_depth
                ),
            )));
        }

        if self.analyzer.config.dedup == DedupPolicy::Shared
            && !self.claimed.lock().insert(name.clone())
        {
            tracing::trace!(copybook = %name, "copybook already resolved in this run");
            return None;
        }

        if self.cancel.is_cancelled() {
            return Some(Planned::Settled(cancelled(reference, site)));
        }

        let task = ResolutionTask::new(name.clone())
            .start(&self.analyzer.bus, self.analyzer.config.resolution_timeout);
        Some(Planned::Pending(reference, task))
    }

    /// Turn a finished task into the context it contributes.
    fn graft(
        &self,
        reference: &CopybookReference,
        resolution: Resolution,
        chain: &[LogicalName],
        site: Option<&Location>,
    ) -> SemanticContext {
        let name = &reference.name;
        match resolution {
            Resolution::Resolved { content, uri } => {
                let uri = uri.unwrap_or_else(|| copybook_uri(name).into());
                let mut child_chain = chain.to_vec();
                child_chain.push(name.clone());
                let child_site = match chain.len().cmp(&self.root_depth) {
                    std::cmp::Ordering::Less => None,
                    std::cmp::Ordering::Equal => Some(&reference.location),
                    std::cmp::Ordering::Greater => site,
                };

                match self.process_document(&uri, &content, &child_chain, child_site) {
                    Ok(mut context) => {
                        context.define(
                            SymbolKind::Copybook,
                            name.as_str(),
                            Location::document_start(uri),
                        );
                        context
                    }
                    Err(err) => {
                        tracing::warn!(
                            copybook = %name,
                            error = %err,
                            "copybook could not be analyzed"
                        );
                        failure(
                            reference,
                            site,
                            codes::COPYBOOK_BROKEN,
                            format!("Copybook {name} could not be analyzed: {err}"),
                        )
                    }
                }
            }
            Resolution::NotFound => {
                tracing::warn!(copybook = %name, "copybook not found");
                failure(
                    reference,
                    site,
                    codes::COPYBOOK_NOT_FOUND,
                    format!("Copybook not found: {name}"),
                )
            }
            Resolution::TimedOut => {
                tracing::warn!(
                    copybook = %name,
                    timeout = ?self.analyzer.config.resolution_timeout,
                    "copybook resolution timed out"
                );
                failure(
                    reference,
                    site,
                    codes::COPYBOOK_TIMEOUT,
                    format!(
                        "Copybook {name} was not resolved within {:?}",
                        self.analyzer.config.resolution_timeout
                    ),
                )
            }
            Resolution::Cancelled => cancelled(reference, site),
        }
    }
}

/// The failure diagnostic at the `COPY` site, repeated at the root
/// document's `site` when the reference sits in a nested copybook.
fn failure(
    reference: &CopybookReference,
    site: Option<&Location>,
    code: &str,
    message: String,
) -> SemanticContext {
    let diagnostic = Diagnostic::error(reference.location.clone(), message)
        .with_code(code)
        .with_related(RelatedInfo {
            location: Location::document_start(copybook_uri(&reference.name)),
            message: format!("copybook {}", reference.name).into(),
        });
    reported(reference, site, diagnostic)
}

fn cancelled(reference: &CopybookReference, site: Option<&Location>) -> SemanticContext {
    tracing::debug!(copybook = %reference.name, "copybook resolution cancelled");
    let diagnostic = Diagnostic::info(
        reference.location.clone(),
        format!("Resolution of copybook {} was cancelled", reference.name),
    )
    .with_code(codes::COPYBOOK_CANCELLED);
    reported(reference, site, diagnostic)
}

fn reported(
    reference: &CopybookReference,
    site: Option<&Location>,
    diagnostic: Diagnostic,
) -> SemanticContext {
    let surfaced = site.map(|site| {
        let mut surfaced = diagnostic.clone().with_related(RelatedInfo {
            location: reference.location.clone(),
            message: format!("COPY {} in an included copybook", reference.name).into(),
        });
        surfaced.location = site.clone();
        surfaced
    });
    let mut context = SemanticContext::from_diagnostic(diagnostic);
    context.extend_diagnostics(surfaced);
    context
}
