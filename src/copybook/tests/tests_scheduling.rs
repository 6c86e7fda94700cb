#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::base::{LogicalName, Severity, codes};
use crate::bus::{EventBus, EventKind};
use crate::copybook::{AnalyzerConfig, CopybookAnalyzer};
use crate::preprocessor::SourceFormat;
use crate::project::MemoryCopybookProvider;
use crate::semantic::{ParserConfig, SemanticContext, SymbolKind};

const ROOT: &str = "file:///work/MAIN.cbl";

fn name(raw: &str) -> LogicalName {
    LogicalName::new(raw).unwrap()
}

/// A provider holding `BOOK-1..=count`, each defining `VAR-n`.
fn numbered_books(count: usize) -> MemoryCopybookProvider {
    (1..=count).fold(MemoryCopybookProvider::new(), |provider, n| {
        provider.with_copybook(
            name(&format!("BOOK-{n}")),
            format!("       01  VAR-{n} PIC X({n}).\n"),
        )
    })
}

fn copy_all(count: usize) -> String {
    let mut text = String::from("       WORKING-STORAGE SECTION.\n");
    for n in 1..=count {
        text.push_str(&format!("       COPY BOOK-{n}.\n"));
    }
    text
}

fn analyzer_on(bus: EventBus, config: AnalyzerConfig) -> CopybookAnalyzer {
    CopybookAnalyzer::new(bus, config.with_worker_threads(4)).unwrap()
}

fn analyze(analyzer: &CopybookAnalyzer, text: &str) -> SemanticContext {
    analyzer.analyze_document(ROOT, text, SourceFormat::Fixed, &ParserConfig::default())
}

#[test]
fn test_deferred_answers_are_awaited_concurrently() {
    let delay = Duration::from_millis(200);
    let bus = EventBus::new();
    let provider = Arc::new(numbered_books(5).deferred(delay));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(bus, AnalyzerConfig::default());

    let started = Instant::now();
    let context = analyze(&analyzer, &copy_all(5));
    let elapsed = started.elapsed();

    assert_eq!(context.defined_names(SymbolKind::Variable).len(), 5);
    assert!(context.diagnostics().is_empty());
    assert!(elapsed >= delay);
    assert!(elapsed < delay * 4, "siblings were awaited one by one: {elapsed:?}");
}

#[test]
fn test_fetch_results_reach_only_their_task() {
    let bus = EventBus::new();
    let provider = Arc::new(numbered_books(12).deferred(Duration::from_millis(10)));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(bus, AnalyzerConfig::default());

    let context = analyze(&analyzer, &copy_all(12));

    for n in 1..=12 {
        let entry = context
            .symbol(SymbolKind::Variable, &format!("VAR-{n}"))
            .unwrap();
        let uris: Vec<&str> = entry.definitions.iter().map(|l| &*l.uri).collect();
        assert_eq!(uris, vec![format!("copybook:///BOOK-{n}")]);
    }
}

#[test]
fn test_concurrent_analyses_share_one_bus() {
    let bus = EventBus::new();
    let provider = Arc::new(numbered_books(6).deferred(Duration::from_millis(5)));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(bus.clone(), AnalyzerConfig::default());

    thread::scope(|scope| {
        let handles: Vec<_> = (1..=6)
            .map(|n| {
                let analyzer = &analyzer;
                scope.spawn(move || {
                    analyzer.analyze_copybook(
                        &name(&format!("BOOK-{n}")),
                        SourceFormat::Fixed,
                        &ParserConfig::default(),
                    )
                })
            })
            .collect();

        for (index, handle) in handles.into_iter().enumerate() {
            let context = handle.join().unwrap();
            let n = index + 1;
            assert_eq!(
                context.defined_names(SymbolKind::Variable),
                vec![format!("VAR-{n}")]
            );
        }
    });

    assert_eq!(bus.subscriber_count(EventKind::FetchResult), 0);
}

#[test]
fn test_cancellation_ends_pending_waits() {
    let bus = EventBus::new();
    let provider = Arc::new(MemoryCopybookProvider::new().with_silent(name("SLOW")));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(
        bus,
        AnalyzerConfig::default().with_resolution_timeout(Duration::from_secs(30)),
    );
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        canceller.cancel();
    });

    let started = Instant::now();
    let context = analyzer.analyze_document_with_cancel(
        ROOT,
        "       COPY SLOW.\n",
        SourceFormat::Fixed,
        &ParserConfig::default(),
        &cancel,
    );
    handle.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    let diagnostics = context.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::COPYBOOK_CANCELLED));
    assert_eq!(diagnostics[0].severity, Severity::Info);
}

#[test]
fn test_cancelled_run_starts_no_tasks() {
    let bus = EventBus::new();
    let provider = Arc::new(numbered_books(3));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(bus, AnalyzerConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let context = analyzer.analyze_document_with_cancel(
        ROOT,
        &copy_all(3),
        SourceFormat::Fixed,
        &ParserConfig::default(),
        &cancel,
    );

    assert_eq!(provider.request_count(), 0);
    assert_eq!(context.defined_names(SymbolKind::Variable).len(), 0);
    assert_eq!(context.diagnostics().len(), 3);
    assert!(
        context
            .diagnostics()
            .iter()
            .all(|d| d.code.as_deref() == Some(codes::COPYBOOK_CANCELLED))
    );
}

#[test]
fn test_panicking_observer_does_not_break_resolution() {
    let bus = EventBus::new();
    let _faulty = bus.subscribe(EventKind::ScanRequest, |_| panic!("observer failure"));
    let provider = Arc::new(numbered_books(2));
    let _attached = provider.attach(&bus);
    let analyzer = analyzer_on(bus, AnalyzerConfig::default());

    let context = analyze(&analyzer, &copy_all(2));

    assert_eq!(
        context.defined_names(SymbolKind::Variable),
        vec!["VAR-1", "VAR-2"]
    );
}

#[test]
fn test_single_worker_pool_still_completes() {
    let bus = EventBus::new();
    let provider = Arc::new(
        numbered_books(3)
            .with_copybook(name("OUTER"), "       COPY BOOK-1.\n       COPY BOOK-2.\n")
            .deferred(Duration::from_millis(20)),
    );
    let _attached = provider.attach(&bus);
    let analyzer =
        CopybookAnalyzer::new(bus, AnalyzerConfig::default().with_worker_threads(1)).unwrap();

    let context = analyze(&analyzer, "       COPY OUTER.\n       COPY BOOK-3.\n");

    assert_eq!(
        context.defined_names(SymbolKind::Variable),
        vec!["VAR-1", "VAR-2", "VAR-3"]
    );
    assert!(context.diagnostics().is_empty());
}
