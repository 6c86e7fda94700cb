//! Logos-based tokenizer for preprocessed COBOL text.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\f\r,;]+")]
pub enum Token {
    #[regex(r"[0-9]+", priority = 3)]
    Integer,

    #[regex(r"[A-Za-z0-9][A-Za-z0-9_-]*")]
    Word,

    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    Literal,

    #[token(".")]
    Period,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[=<>+*/:&]+")]
    Operator,
}

/// A token with its text and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    /// `None` for characters the lexer does not recognize.
    pub token: Option<Token>,
    pub text: &'a str,
    pub line: u32,
    pub column: u32,
    /// A period followed by a space or end of line ends a sentence.
    pub separator: bool,
}

impl Lexeme<'_> {
    pub fn len(&self) -> u32 {
        self.text.chars().count() as u32
    }

    pub fn is_word(&self, keyword: &str) -> bool {
        self.token == Some(Token::Word) && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_separator(&self) -> bool {
        self.token == Some(Token::Period) && self.separator
    }

    /// Words and integers can both name things (`0100.` is a paragraph).
    pub fn is_name(&self) -> bool {
        matches!(self.token, Some(Token::Word | Token::Integer))
    }
}

/// Tokenize `text` line by line.
pub fn tokenize(text: &str) -> Vec<Lexeme<'_>> {
    let mut lexemes = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let mut lexer = Token::lexer(line);
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            let token = result.ok();
            let separator = token == Some(Token::Period)
                && line[span.end..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace);
            lexemes.push(Lexeme {
                token,
                text: lexer.slice(),
                line: number as u32,
                column: line[..span.start].chars().count() as u32,
                separator,
            });
        }
    }
    lexemes
}
