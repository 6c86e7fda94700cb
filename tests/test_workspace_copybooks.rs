#![allow(clippy::unwrap_used)]
//! Copybooks served from a workspace folder, queried through the IDE layer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use cobol_lsp::base::codes;
use cobol_lsp::bus::Subscription;
use cobol_lsp::ide::AnalysisHost;
use cobol_lsp::project::WorkspaceCopybookProvider;
use cobol_lsp::{AnalyzerConfig, CopybookAnalyzer, EventBus, SymbolKind};

const MAIN_URI: &str = "file:///work/src/MAIN.cbl";

const MAIN: &str = "       IDENTIFICATION DIVISION.\n\
                    \x20      PROGRAM-ID. MAIN.\n\
                    \x20      DATA DIVISION.\n\
                    \x20      WORKING-STORAGE SECTION.\n\
                    \x20      COPY EMPREC.\n\
                    \x20      PROCEDURE DIVISION.\n\
                    \x20      0100-MAIN.\n\
                    \x20          DISPLAY EMP-NAME.\n\
                    \x20          GO TO 0100-MAIN.\n";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

struct Workspace {
    host: AnalysisHost,
    provider: Arc<WorkspaceCopybookProvider>,
    _attached: Subscription,
}

fn host_for(root: &Path) -> Workspace {
    let bus = EventBus::new();
    let provider = Arc::new(WorkspaceCopybookProvider::new());
    provider.scan_workspace(&[root.to_path_buf()]);
    let attached = provider.attach(&bus);
    let analyzer = CopybookAnalyzer::new(bus, AnalyzerConfig::default()).unwrap();
    Workspace {
        host: AnalysisHost::new(analyzer),
        provider,
        _attached: attached,
    }
}

#[test]
fn test_copybooks_from_workspace_folder() {
    let workspace = TempDir::new().unwrap();
    write(
        workspace.path(),
        "COPYBOOKS/EMPREC.cpy",
        "       01  EMPLOYEE.\n           05  EMP-NAME PIC X(30).\n           COPY EMPADDR.\n",
    );
    write(
        workspace.path(),
        "COPYBOOKS/common/empaddr.cpy",
        "           05  EMP-CITY PIC X(20).\n",
    );

    let mut ws = host_for(workspace.path());
    let diagnostics = ws.host.set_file_content(MAIN_URI, MAIN);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let analysis = ws.host.analysis();
    let context = analysis.context(MAIN_URI).unwrap();
    assert_eq!(
        context.defined_names(SymbolKind::Variable),
        vec!["EMP-CITY", "EMP-NAME", "EMPLOYEE"]
    );
    assert_eq!(context.defined_names(SymbolKind::Paragraph), vec!["0100-MAIN"]);

    let goto = analysis.goto_definition(MAIN_URI, 7, 22);
    assert_eq!(goto.targets.len(), 1);
    let target = &goto.targets[0].location;
    assert!(target.uri.starts_with("file://"));
    assert!(target.uri.ends_with("COPYBOOKS/EMPREC.cpy"));
    assert_eq!(target.span.start.line, 1);

    let copybook = analysis.goto_definition(MAIN_URI, 4, 14);
    assert!(copybook.targets[0].location.uri.ends_with("EMPREC.cpy"));

    let hover = analysis.hover(MAIN_URI, 7, 22).unwrap();
    assert!(hover.contents.contains("EMPREC.cpy:2:16"));

    let references = analysis.find_references(MAIN_URI, 6, 8, true);
    assert_eq!(references.len(), 2);
}

#[test]
fn test_copybook_added_after_rescan() {
    let workspace = TempDir::new().unwrap();
    fs::create_dir_all(workspace.path().join("COPYBOOKS")).unwrap();

    let mut ws = host_for(workspace.path());
    let diagnostics = ws.host.set_file_content(MAIN_URI, MAIN).to_vec();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::COPYBOOK_NOT_FOUND));
    assert_eq!(diagnostics[0].location.span.start.line, 4);

    write(
        workspace.path(),
        "COPYBOOKS/EMPREC.cbl",
        "       01  EMPLOYEE.\n           05  EMP-NAME PIC X(30).\n",
    );
    ws.provider.scan_workspace(&[workspace.path().to_path_buf()]);
    ws.host.reanalyze_all();

    assert!(ws.host.analysis().diagnostics(MAIN_URI).is_empty());
}

#[test]
fn test_documents_are_analyzed_independently() {
    let workspace = TempDir::new().unwrap();
    write(workspace.path(), "COPYBOOKS/EMPREC.cpy", "       01  EMPLOYEE.\n");

    let mut ws = host_for(workspace.path());
    ws.host.set_file_content(MAIN_URI, MAIN);
    ws.host
        .set_file_content("file:///work/src/OTHER.cbl", "       COPY NOPE.\n");

    let analysis = ws.host.analysis();
    assert!(analysis.diagnostics(MAIN_URI).is_empty());
    assert_eq!(analysis.diagnostics("file:///work/src/OTHER.cbl").len(), 1);
    assert_eq!(ws.host.file_count(), 2);
}
