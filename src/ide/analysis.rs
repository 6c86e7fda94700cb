//! AnalysisHost and Analysis: document state for IDE features.
//!
//! The `AnalysisHost` owns the analyzer and the open documents and hands
//! out `Analysis` snapshots for querying.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = AnalysisHost::new(analyzer);
//! let diagnostics = host.set_file_content("file:///MAIN.cbl", text).to_vec();
//!
//! let analysis = host.analysis();
//! let hover = analysis.hover("file:///MAIN.cbl", line, col);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::base::Diagnostic;
use crate::copybook::CopybookAnalyzer;
use crate::preprocessor::SourceFormat;
use crate::semantic::{ParserConfig, SemanticContext};

use super::{
    GotoResult, HoverResult, ReferenceResult, find_references, goto_definition, hover,
};

#[derive(Debug)]
struct FileAnalysis {
    text: String,
    context: SemanticContext,
}

/// Cancels whichever analysis the host is currently running.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    in_flight: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.in_flight.lock().cancel();
    }
}

/// Owns all mutable state for the IDE layer.
#[derive(Debug)]
pub struct AnalysisHost {
    analyzer: CopybookAnalyzer,
    format: SourceFormat,
    parser_config: ParserConfig,
    files: FxHashMap<Arc<str>, FileAnalysis>,
    in_flight: Arc<Mutex<CancellationToken>>,
}

impl AnalysisHost {
    pub fn new(analyzer: CopybookAnalyzer) -> Self {
        Self {
            analyzer,
            format: SourceFormat::default(),
            parser_config: ParserConfig::default(),
            files: FxHashMap::default(),
            in_flight: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser_config = config;
        self
    }

    pub fn analyzer(&self) -> &CopybookAnalyzer {
        &self.analyzer
    }

    /// Analyze `text` as the new content of `uri`, copybooks included.
    ///
    /// Returns the document's diagnostics.
    pub fn set_file_content(&mut self, uri: &str, text: &str) -> &[Diagnostic] {
        let context = self.run(uri, text);
        tracing::debug!(
            uri,
            symbols = context.symbol_count(),
            diagnostics = context.diagnostics().len(),
            "document analyzed"
        );
        let file = FileAnalysis {
            text: text.to_string(),
            context,
        };
        self.files
            .entry(Arc::from(uri))
            .insert_entry(file)
            .into_mut()
            .context
            .diagnostics()
    }

    /// Analyze every open document again, e.g. after copybooks changed on disk.
    pub fn reanalyze_all(&mut self) {
        let uris: Vec<Arc<str>> = self.files.keys().cloned().collect();
        for uri in uris {
            let Some(text) = self.files.get(&uri).map(|file| file.text.clone()) else {
                continue;
            };
            let context = self.run(&uri, &text);
            if let Some(file) = self.files.get_mut(&uri) {
                file.context = context;
            }
        }
    }

    /// Returns whether the document was open.
    pub fn remove_file(&mut self, uri: &str) -> bool {
        self.files.remove(uri).is_some()
    }

    pub fn has_file(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            in_flight: self.in_flight.clone(),
        }
    }

    /// Get a snapshot for queries.
    pub fn analysis(&self) -> Analysis<'_> {
        Analysis { files: &self.files }
    }

    fn run(&self, uri: &str, text: &str) -> SemanticContext {
        let cancel = CancellationToken::new();
        *self.in_flight.lock() = cancel.clone();
        self.analyzer.analyze_document_with_cancel(
            uri,
            text,
            self.format,
            &self.parser_config,
            &cancel,
        )
    }
}

/// A read-only view of the analyzed documents.
pub struct Analysis<'a> {
    files: &'a FxHashMap<Arc<str>, FileAnalysis>,
}

impl<'a> Analysis<'a> {
    /// Merged context of a document and its copybooks.
    pub fn context(&self, uri: &str) -> Option<&'a SemanticContext> {
        self.files.get(uri).map(|file| &file.context)
    }

    pub fn diagnostics(&self, uri: &str) -> &'a [Diagnostic] {
        self.context(uri)
            .map(SemanticContext::diagnostics)
            .unwrap_or_default()
    }

    pub fn hover(&self, uri: &str, line: u32, col: u32) -> Option<HoverResult> {
        let file = self.files.get(uri)?;
        hover(&file.context, &file.text, uri, line, col)
    }

    pub fn goto_definition(&self, uri: &str, line: u32, col: u32) -> GotoResult {
        match self.files.get(uri) {
            Some(file) => goto_definition(&file.context, &file.text, uri, line, col),
            None => GotoResult::empty(),
        }
    }

    pub fn find_references(
        &self,
        uri: &str,
        line: u32,
        col: u32,
        include_declaration: bool,
    ) -> ReferenceResult {
        match self.files.get(uri) {
            Some(file) => find_references(
                &file.context,
                &file.text,
                uri,
                line,
                col,
                include_declaration,
            ),
            None => ReferenceResult::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LogicalName, codes};
    use crate::bus::{EventBus, Subscription};
    use crate::copybook::AnalyzerConfig;
    use crate::project::MemoryCopybookProvider;
    use crate::semantic::SymbolKind;

    const URI: &str = "file:///work/MAIN.cbl";

    const MAIN: &str = "       DATA DIVISION.\n\
                        \x20      WORKING-STORAGE SECTION.\n\
                        \x20      COPY CUSTREC.\n\
                        \x20      PROCEDURE DIVISION.\n\
                        \x20      MAIN-PARA.\n\
                        \x20          DISPLAY CUST-ID.\n\
                        \x20          PERFORM MAIN-PARA.\n";

    fn host(provider: Arc<MemoryCopybookProvider>) -> (AnalysisHost, Subscription) {
        let bus = EventBus::new();
        let attached = provider.attach(&bus);
        let analyzer =
            CopybookAnalyzer::new(bus, AnalyzerConfig::default().with_worker_threads(2)).unwrap();
        (AnalysisHost::new(analyzer), attached)
    }

    fn custrec() -> Arc<MemoryCopybookProvider> {
        Arc::new(MemoryCopybookProvider::new().with_copybook(
            LogicalName::new("CUSTREC").unwrap(),
            "       01  CUSTOMER-RECORD.\n           05  CUST-ID PIC 9(6).\n",
        ))
    }

    #[test]
    fn test_set_file_content_returns_diagnostics() {
        let (mut host, _attached) = host(Arc::new(MemoryCopybookProvider::new()));
        let diagnostics = host.set_file_content(URI, MAIN);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some(codes::COPYBOOK_NOT_FOUND));
        assert!(host.has_file(URI));
    }

    #[test]
    fn test_hover_resolves_copybook_symbols() {
        let (mut host, _attached) = host(custrec());
        assert!(host.set_file_content(URI, MAIN).is_empty());

        let analysis = host.analysis();
        let result = analysis.hover(URI, 5, 22).unwrap();
        assert_eq!(&*result.name, "CUST-ID");
        assert!(result.contents.contains("copybook:///CUSTREC:2:16"));
    }

    #[test]
    fn test_goto_copybook_from_copy_statement() {
        let (mut host, _attached) = host(custrec());
        host.set_file_content(URI, MAIN);

        let result = host.analysis().goto_definition(URI, 2, 14);
        assert_eq!(result.targets.len(), 1);
        assert_eq!(result.targets[0].kind, SymbolKind::Copybook);
        assert_eq!(&*result.targets[0].location.uri, "copybook:///CUSTREC");
    }

    #[test]
    fn test_find_paragraph_references() {
        let (mut host, _attached) = host(custrec());
        host.set_file_content(URI, MAIN);

        let result = host.analysis().find_references(URI, 4, 9, true);
        assert_eq!(result.len(), 2);
        assert_eq!(result.references[0].location.span.start.line, 4);
        assert_eq!(result.references[1].location.span.start.line, 6);
    }

    #[test]
    fn test_reanalyze_picks_up_new_copybooks() {
        let provider = Arc::new(MemoryCopybookProvider::new());
        let (mut host, _attached) = host(provider.clone());
        assert_eq!(host.set_file_content(URI, MAIN).len(), 1);

        provider.insert(
            LogicalName::new("CUSTREC").unwrap(),
            "       01  CUST-ID PIC 9(6).\n",
        );
        host.reanalyze_all();
        assert!(host.analysis().diagnostics(URI).is_empty());
    }

    #[test]
    fn test_remove_file() {
        let (mut host, _attached) = host(custrec());
        host.set_file_content(URI, MAIN);
        assert!(host.remove_file(URI));
        assert!(!host.remove_file(URI));
        assert_eq!(host.file_count(), 0);
        assert!(host.analysis().hover(URI, 5, 22).is_none());
    }
}
