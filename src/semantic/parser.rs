//! Semantic parsing: preprocessed text in, semantic context out.

use thiserror::Error;

use crate::base::{Diagnostic, Location, LogicalName, Span, codes};
use crate::preprocessor::SourceFormat;

use super::context::{SemanticContext, SymbolKind};
use super::lexer::{Lexeme, Token, tokenize};

/// Parser configuration carried through every nested copybook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Record `PERFORM`/`GO TO` targets as paragraph usages.
    pub collect_usages: bool,
    /// Warn about level numbers outside 01-49, 66, 77, 88.
    pub strict_levels: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            collect_usages: true,
            strict_levels: true,
        }
    }
}

/// A `COPY` statement found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopybookReference {
    pub name: LogicalName,
    /// Location of the copybook name in the including document.
    pub location: Location,
}

/// Result of parsing one document on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub context: SemanticContext,
    /// Nested references, in order of appearance.
    pub references: Vec<CopybookReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parser gave up on {uri}: {message}")]
    Aborted { uri: String, message: String },
}

/// Turns preprocessed text into a [`ParseOutput`].
///
/// Implementations see one document at a time and know nothing about how
/// copybooks are resolved.
pub trait SemanticParser: Send + Sync {
    fn parse(
        &self,
        uri: &str,
        text: &str,
        format: SourceFormat,
        config: &ParserConfig,
    ) -> Result<ParseOutput, ParseError>;
}

/// Reserved words that can stand alone as a sentence.
const SENTENCE_KEYWORDS: &[&str] = &[
    "AUTHOR",
    "CONTINUE",
    "DATE-COMPILED",
    "DATE-WRITTEN",
    "EJECT",
    "ELSE",
    "END-CALL",
    "END-COMPUTE",
    "END-EVALUATE",
    "END-EXEC",
    "END-IF",
    "END-PERFORM",
    "END-READ",
    "END-SEARCH",
    "END-STRING",
    "END-WRITE",
    "EXIT",
    "GOBACK",
    "INSTALLATION",
    "PROGRAM-ID",
    "REMARKS",
    "SECURITY",
    "SKIP1",
    "SKIP2",
    "SKIP3",
    "STOP",
];

/// Sections of the environment and data divisions.
const DIVISION_SECTIONS: &[&str] = &[
    "COMMUNICATION",
    "CONFIGURATION",
    "FILE",
    "INPUT-OUTPUT",
    "LINKAGE",
    "LOCAL-STORAGE",
    "REPORT",
    "SCREEN",
    "WORKING-STORAGE",
];

/// Words that may follow a level number in place of a data name.
const DATA_CLAUSES: &[&str] = &[
    "BLANK",
    "FILLER",
    "JUST",
    "JUSTIFIED",
    "OCCURS",
    "PIC",
    "PICTURE",
    "REDEFINES",
    "SIGN",
    "SYNC",
    "SYNCHRONIZED",
    "USAGE",
    "VALUE",
    "VALUES",
];

/// Words after `PERFORM` that do not name a procedure.
const PERFORM_OPTIONS: &[&str] = &["UNTIL", "VARYING", "WITH", "TEST", "FOREVER"];

/// Area A spans columns 8-11, 0-indexed 7-10, in reference format.
const AREA_A_END: u32 = 10;

fn is_keyword(lexeme: &Lexeme<'_>, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lexeme.text.eq_ignore_ascii_case(k))
}

fn is_valid_level(level: u32) -> bool {
    matches!(level, 1..=49 | 66 | 77 | 88)
}

/// Default parser: data entries, paragraphs, sections and `COPY` statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct CobolSemanticParser;

impl SemanticParser for CobolSemanticParser {
    fn parse(
        &self,
        uri: &str,
        text: &str,
        format: SourceFormat,
        config: &ParserConfig,
    ) -> Result<ParseOutput, ParseError> {
        let lexemes = tokenize(text);
        let mut walker = Walker {
            uri,
            format,
            config,
            lexemes: &lexemes,
            output: ParseOutput::default(),
            in_procedure: false,
        };
        walker.run();
        Ok(walker.output)
    }
}

struct Walker<'a, 'src> {
    uri: &'a str,
    format: SourceFormat,
    config: &'a ParserConfig,
    lexemes: &'a [Lexeme<'src>],
    output: ParseOutput,
    in_procedure: bool,
}

impl<'a, 'src> Walker<'a, 'src> {
    fn run(&mut self) {
        let mut sentence_start = true;
        let mut index = 0;

        while index < self.lexemes.len() {
            let lexeme = self.lexemes[index];

            if lexeme.token.is_none() {
                self.output.context.add_diagnostic(
                    Diagnostic::warning(
                        self.location(&lexeme),
                        format!("Unexpected character '{}'", lexeme.text),
                    )
                    .with_code(codes::UNEXPECTED_CHARACTER),
                );
                index += 1;
                continue;
            }

            if lexeme.is_word("COPY") {
                index = self.copy_statement(index);
                sentence_start = true;
                continue;
            }

            if lexeme.is_word("DIVISION") && index > 0 {
                self.in_procedure = self.lexemes[index - 1].is_word("PROCEDURE");
            }

            if sentence_start {
                self.sentence(index);
            }
            if self.config.collect_usages {
                self.procedure_usages(index);
            }

            sentence_start = lexeme.is_separator();
            index += 1;
        }
    }

    fn location(&self, lexeme: &Lexeme<'_>) -> Location {
        Location::new(self.uri, Span::on_line(lexeme.line, lexeme.column, lexeme.len()))
    }

    fn peek(&self, index: usize) -> Option<&'a Lexeme<'src>> {
        self.lexemes.get(index)
    }

    /// `COPY name [OF|IN library] [REPLACING ...] .` starting at `index`.
    /// Returns the index after the statement.
    fn copy_statement(&mut self, index: usize) -> usize {
        let copy = self.lexemes[index];
        let mut next = index + 1;

        let name = self
            .peek(next)
            .filter(|l| matches!(l.token, Some(Token::Word | Token::Integer | Token::Literal)))
            .copied();
        let Some(name_lexeme) = name else {
            self.output.context.add_diagnostic(
                Diagnostic::error(self.location(&copy), "COPY statement is missing a copybook name")
                    .with_code(codes::MISSING_COPYBOOK_NAME),
            );
            return self.skip_past_separator(next);
        };
        next += 1;

        match LogicalName::new(name_lexeme.text) {
            Ok(name) => {
                let location = self.location(&name_lexeme);
                self.output
                    .context
                    .add_usage(SymbolKind::Copybook, name.as_str(), location.clone());
                self.output
                    .references
                    .push(CopybookReference { name, location });
            }
            Err(err) => {
                self.output.context.add_diagnostic(
                    Diagnostic::error(
                        self.location(&name_lexeme),
                        format!("Invalid copybook name: {err}"),
                    )
                    .with_code(codes::MISSING_COPYBOOK_NAME),
                );
            }
        }

        if self
            .peek(next)
            .is_some_and(|l| l.is_word("OF") || l.is_word("IN"))
        {
            next += 2;
        }

        match self.peek(next) {
            Some(l) if l.is_separator() => next + 1,
            Some(l) if l.is_word("REPLACING") => self.skip_past_separator(next),
            _ => next,
        }
    }

    fn skip_past_separator(&self, mut index: usize) -> usize {
        while let Some(lexeme) = self.peek(index) {
            index += 1;
            if lexeme.is_separator() {
                break;
            }
        }
        index
    }

    /// Definitions that can only start a sentence.
    fn sentence(&mut self, index: usize) {
        let first = self.lexemes[index];
        let second = self.peek(index + 1).copied();
        let third = self.peek(index + 2).copied();

        if !self.in_procedure && first.token == Some(Token::Integer) {
            if let Ok(level) = first.text.parse::<u32>() {
                self.data_entry(&first, level, second);
                return;
            }
        }

        if !first.is_name() || !self.in_area_a(&first) {
            return;
        }

        match (second, third) {
            (Some(s), Some(t))
                if s.is_word("SECTION")
                    && t.is_separator()
                    && !is_keyword(&first, DIVISION_SECTIONS) =>
            {
                let location = self.location(&first);
                self.output
                    .context
                    .define(SymbolKind::Section, first.text, location);
            }
            (Some(s), _)
                if s.is_separator()
                    && !is_keyword(&first, SENTENCE_KEYWORDS)
                    && (self.in_procedure || first.token == Some(Token::Word)) =>
            {
                let location = self.location(&first);
                self.output
                    .context
                    .define(SymbolKind::Paragraph, first.text, location);
            }
            _ => {}
        }
    }

    fn data_entry(&mut self, level_lexeme: &Lexeme<'_>, level: u32, name: Option<Lexeme<'_>>) {
        if !is_valid_level(level) {
            if self.config.strict_levels {
                self.output.context.add_diagnostic(
                    Diagnostic::warning(
                        self.location(level_lexeme),
                        format!("Invalid level number {level}"),
                    )
                    .with_code(codes::INVALID_LEVEL_NUMBER),
                );
            }
            return;
        }

        let name =
            name.filter(|n| n.token == Some(Token::Word) && !is_keyword(n, DATA_CLAUSES));
        if let Some(name) = name {
            let location = self.location(&name);
            self.output
                .context
                .define(SymbolKind::Variable, name.text, location);
        }
    }

    /// `PERFORM x [THRU y]` and `GO [TO] x`.
    fn procedure_usages(&mut self, index: usize) {
        let lexeme = self.lexemes[index];

        let mut targets = Vec::new();
        if lexeme.is_word("PERFORM") {
            if let Some(target) = self
                .peek(index + 1)
                .filter(|l| l.is_name() && !is_keyword(l, PERFORM_OPTIONS))
            {
                // `PERFORM 3 TIMES` repeats an inline block.
                let repeats = target.token == Some(Token::Integer)
                    && self.peek(index + 2).is_some_and(|l| l.is_word("TIMES"));
                if !repeats {
                    targets.push(*target);
                    if let Some(end) = self
                        .peek(index + 2)
                        .filter(|l| l.is_word("THRU") || l.is_word("THROUGH"))
                        .and_then(|_| self.peek(index + 3))
                        .filter(|l| l.is_name())
                    {
                        targets.push(*end);
                    }
                }
            }
        } else if lexeme.is_word("GO") {
            let mut at = index + 1;
            if self.peek(at).is_some_and(|l| l.is_word("TO")) {
                at += 1;
            }
            if let Some(target) = self.peek(at).filter(|l| l.is_name()) {
                targets.push(*target);
            }
        }

        for target in targets {
            let location = self.location(&target);
            self.output
                .context
                .add_usage(SymbolKind::Paragraph, target.text, location);
        }
    }

    fn in_area_a(&self, lexeme: &Lexeme<'_>) -> bool {
        match self.format {
            SourceFormat::Fixed | SourceFormat::Variable => lexeme.column <= AREA_A_END,
            SourceFormat::Free => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "file:///test.cbl";

    fn parse(text: &str) -> ParseOutput {
        CobolSemanticParser
            .parse(URI, text, SourceFormat::Fixed, &ParserConfig::default())
            .unwrap()
    }

    #[test]
    fn test_data_entries_define_variables() {
        let out = parse(
            "       01  CUSTOMER-RECORD.\n\
             \x20          05  CUST-ID      PIC 9(6).\n\
             \x20          05  FILLER       PIC X(4).\n\
             \x20          05  CUST-NAME    PIC X(30).\n\
             \x20          88  IS-VIP       VALUE 'Y'.",
        );
        assert_eq!(
            out.context.defined_names(SymbolKind::Variable),
            vec!["CUST-ID", "CUST-NAME", "CUSTOMER-RECORD", "IS-VIP"]
        );
        assert!(out.context.diagnostics().is_empty());
        assert!(out.references.is_empty());
    }

    #[test]
    fn test_variable_location() {
        let out = parse("       01  CUSTOMER-RECORD.");
        let entry = out
            .context
            .symbol(SymbolKind::Variable, "CUSTOMER-RECORD")
            .unwrap();
        let def = entry.definitions.iter().next().unwrap();
        assert_eq!(def.span, Span::on_line(0, 11, 15));
    }

    #[test]
    fn test_invalid_level_warns() {
        let out = parse("       50  ODD-ITEM PIC X.");
        assert!(out.context.defined_names(SymbolKind::Variable).is_empty());
        assert_eq!(
            out.context.diagnostics()[0].code.as_deref(),
            Some(codes::INVALID_LEVEL_NUMBER)
        );

        let relaxed = CobolSemanticParser
            .parse(
                URI,
                "       50  ODD-ITEM PIC X.",
                SourceFormat::Fixed,
                &ParserConfig {
                    strict_levels: false,
                    ..ParserConfig::default()
                },
            )
            .unwrap();
        assert!(relaxed.context.diagnostics().is_empty());
    }

    #[test]
    fn test_copy_references_in_order() {
        let out = parse(
            "       01  REC.\n\
             \x20          COPY CUSTREC.\n\
             \x20          COPY 'addr' OF MYLIB.\n\
             \x20          COPY CUSTREC REPLACING ==A== BY ==B==.\n\
             \x20      01  AFTER-COPY.",
        );
        let names: Vec<&str> = out.references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["CUSTREC", "ADDR", "CUSTREC"]);
        assert_eq!(out.references[0].location.span, Span::on_line(1, 16, 7));

        let copybook = out.context.symbol(SymbolKind::Copybook, "CUSTREC").unwrap();
        assert_eq!(copybook.usages.len(), 2);
        assert!(out
            .context
            .symbol(SymbolKind::Variable, "AFTER-COPY")
            .is_some());
    }

    #[test]
    fn test_copy_without_name() {
        let out = parse("           COPY.");
        assert!(out.references.is_empty());
        assert_eq!(
            out.context.diagnostics()[0].code.as_deref(),
            Some(codes::MISSING_COPYBOOK_NAME)
        );
    }

    #[test]
    fn test_paragraphs_sections_and_usages() {
        let out = parse(
            "       PROCEDURE DIVISION.\n\
             \x20      MAIN-LOGIC SECTION.\n\
             \x20      100-START.\n\
             \x20          PERFORM 200-WORK THRU 200-EXIT.\n\
             \x20          PERFORM 3 TIMES\n\
             \x20              DISPLAY 'X'\n\
             \x20          END-PERFORM.\n\
             \x20          GO TO 100-START.\n\
             \x20      200-WORK.\n\
             \x20          EXIT.\n\
             \x20      200-EXIT.\n\
             \x20          GOBACK.",
        );
        let ctx = &out.context;
        assert_eq!(ctx.defined_names(SymbolKind::Section), vec!["MAIN-LOGIC"]);
        assert_eq!(
            ctx.defined_names(SymbolKind::Paragraph),
            vec!["100-START", "200-EXIT", "200-WORK"]
        );
        assert_eq!(
            ctx.symbol(SymbolKind::Paragraph, "100-START").unwrap().usages.len(),
            1
        );
        assert_eq!(
            ctx.symbol(SymbolKind::Paragraph, "200-EXIT").unwrap().usages.len(),
            1
        );
        assert!(ctx.symbol(SymbolKind::Paragraph, "3").is_none());
    }

    #[test]
    fn test_data_sections_are_not_user_sections() {
        let out = parse("       WORKING-STORAGE SECTION.\n       01  WS-A PIC X.");
        assert!(out.context.defined_names(SymbolKind::Section).is_empty());
        assert_eq!(out.context.defined_names(SymbolKind::Variable), vec!["WS-A"]);
    }

    #[test]
    fn test_area_b_words_are_not_paragraphs() {
        let out = parse("       PROCEDURE DIVISION.\n                NOT-A-PARA.");
        assert!(out.context.defined_names(SymbolKind::Paragraph).is_empty());
    }

    #[test]
    fn test_identification_paragraphs_are_reserved() {
        let out = parse(
            "       IDENTIFICATION DIVISION.\n       PROGRAM-ID. MAIN.\n       AUTHOR. ME.",
        );
        assert!(out.context.defined_names(SymbolKind::Paragraph).is_empty());
    }

    #[test]
    fn test_usages_can_be_disabled() {
        let out = CobolSemanticParser
            .parse(
                URI,
                "       PROCEDURE DIVISION.\n           PERFORM X-PARA.",
                SourceFormat::Fixed,
                &ParserConfig {
                    collect_usages: false,
                    ..ParserConfig::default()
                },
            )
            .unwrap();
        assert_eq!(out.context.symbol_count(), 0);
    }
}
