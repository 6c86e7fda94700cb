//! Find references implementation.

use crate::base::Location;
use crate::semantic::{SemanticContext, SymbolKind};

use super::cursor::symbols_at;

/// Result of a find-references request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceResult {
    pub references: Vec<Reference>,
    /// Whether definitions were included.
    pub include_declaration: bool,
}

impl ReferenceResult {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

/// A reference to a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub location: Location,
    /// Whether this is the definition (vs a usage).
    pub is_definition: bool,
    pub kind: SymbolKind,
}

/// Every occurrence of the symbol at `line`/`col`, definitions first.
pub fn find_references(
    context: &SemanticContext,
    text: &str,
    uri: &str,
    line: u32,
    col: u32,
    include_declaration: bool,
) -> ReferenceResult {
    let mut references = Vec::new();
    for (key, entry) in symbols_at(context, text, uri, line, col) {
        if include_declaration {
            references.extend(entry.definitions.iter().map(|location| Reference {
                location: location.clone(),
                is_definition: true,
                kind: key.kind,
            }));
        }
        references.extend(entry.usages.iter().map(|location| Reference {
            location: location.clone(),
            is_definition: false,
            kind: key.kind,
        }));
    }
    ReferenceResult {
        references,
        include_declaration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;

    const URI: &str = "file:///MAIN.cbl";

    fn paragraph_context() -> SemanticContext {
        let mut context = SemanticContext::new();
        context.define(SymbolKind::Paragraph, "INIT", Location::new(URI, Span::on_line(8, 7, 4)));
        for line in [5, 2] {
            let location = Location::new(URI, Span::on_line(line, 19, 4));
            context.add_usage(SymbolKind::Paragraph, "INIT", location);
        }
        context
    }

    #[test]
    fn test_references_with_declaration() {
        let result = find_references(&paragraph_context(), "", URI, 8, 8, true);
        assert_eq!(result.len(), 3);
        assert!(result.references[0].is_definition);
        let lines: Vec<u32> = result
            .references
            .iter()
            .map(|r| r.location.span.start.line)
            .collect();
        assert_eq!(lines, vec![8, 2, 5]);
    }

    #[test]
    fn test_references_without_declaration() {
        let result = find_references(&paragraph_context(), "", URI, 2, 20, false);
        assert_eq!(result.len(), 2);
        assert!(result.references.iter().all(|r| !r.is_definition));
    }

    #[test]
    fn test_no_symbol_no_references() {
        let result = find_references(&SemanticContext::new(), "", URI, 0, 0, true);
        assert!(result.is_empty());
    }
}
