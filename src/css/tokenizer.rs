//! logos-based CSS tokenizer.
//!
//! The lexer itself only classifies characters. [`Tokenizer`] layers the
//! stateful parts on top: block nesting (so a closer is only a block end when
//! it matches the innermost open block), comment suppression and offsets.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `12px` as [`TokenKind::Dimension`] beats `12` as `Number`)
//! 2. For equal length matches, higher priority wins
//!
//! Input that no rule accepts comes back from logos as an error and is turned
//! into a single [`TokenKind::Delimiter`] token (`>`, `+`, `~`, `*`, `.` ...).

use logos::{Lexer, Logos};

/// Skip to the end of a `/* ... */` comment. An unterminated comment runs to
/// the end of input.
fn comment(lex: &mut Lexer<TokenKind>) {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(rest.len()),
    }
}

/// CSS token type.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Run of whitespace.
    #[regex(r"[ \t\n\r\f]+")]
    Whitespace,

    /// `/* ... */`. Only surfaced by comment-preserving reads.
    #[token("/*", comment)]
    Comment,

    /// Identifier: `div`, `-webkit-box`, `--custom`.
    #[regex(r"(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*")]
    Ident,

    /// Identifier immediately followed by `(`: `has(`, `rgb(`. Opens a block.
    #[regex(r"(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*\(")]
    Function,

    /// `@media`, `@import`.
    #[regex(r"@(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*")]
    AtKeyword,

    /// `#name`.
    #[regex(r"#([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])+")]
    Hash,

    /// Quoted string, either quote style.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,

    /// `12`, `-0.5`, `+3`.
    #[regex(r"[+-]?([0-9]+|[0-9]*\.[0-9]+)")]
    Number,

    /// `50%`.
    #[regex(r"[+-]?([0-9]+|[0-9]*\.[0-9]+)%")]
    Percentage,

    /// `12px`, `1.5em`.
    #[regex(r"[+-]?([0-9]+|[0-9]*\.[0-9]+)(--|-?([a-zA-Z_]|[^\x00-\x7F]|\\[^\n\r\f]))([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\n\r\f])*")]
    Dimension,

    /// `:`
    #[token(":")]
    Colon,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `,`
    #[token(",")]
    Comma,

    /// `(`
    #[token("(")]
    LeftParenthesis,

    /// `)`
    #[token(")")]
    RightParenthesis,

    /// `[`
    #[token("[")]
    LeftBracket,

    /// `]`
    #[token("]")]
    RightBracket,

    /// `{`
    #[token("{")]
    LeftBrace,

    /// `}`
    #[token("}")]
    RightBrace,

    /// `<!--`
    #[token("<!--")]
    Cdo,

    /// `-->`
    #[token("-->")]
    Cdc,

    /// Any other single code point.
    Delimiter,

    /// End of input. Never produced by the lexer itself.
    Eof,
}

impl TokenKind {
    /// The closer that ends a block opened by this kind, if it opens one.
    fn block_closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::LeftParenthesis | TokenKind::Function => Some(TokenKind::RightParenthesis),
            TokenKind::LeftBracket => Some(TokenKind::RightBracket),
            TokenKind::LeftBrace => Some(TokenKind::RightBrace),
            _ => None,
        }
    }

    fn is_closer(self) -> bool {
        matches!(
            self,
            TokenKind::RightParenthesis | TokenKind::RightBracket | TokenKind::RightBrace
        )
    }
}

/// Structural role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Ordinary token.
    NotBlock,
    /// Opens `()`, `[]`, `{}` or a function.
    BlockStart,
    /// Closes the innermost open block.
    BlockEnd,
}

/// A token with its source text. Cheap to copy; borrows the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    kind: TokenKind,
    block_type: BlockType,
    text: &'a str,
    offset: usize,
}

impl<'a> Token<'a> {
    pub(crate) fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            block_type: BlockType::NotBlock,
            text: "",
            offset,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// The exact source text of the token, including quotes and prefixes.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the token's first character.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Whether this is the single-character delimiter `c`.
    pub fn is_delimiter(&self, c: char) -> bool {
        self.kind == TokenKind::Delimiter && self.text.chars().eq(std::iter::once(c))
    }

    /// Function name without the trailing `(`; identifier text otherwise.
    pub fn name(&self) -> &'a str {
        match self.kind {
            TokenKind::Function => self.text.strip_suffix('(').unwrap_or(self.text),
            TokenKind::AtKeyword | TokenKind::Hash => &self.text[1..],
            _ => self.text,
        }
    }
}

/// Stateful scanner producing one token at a time.
pub struct Tokenizer<'a> {
    source: &'a str,
    lexer: Lexer<'a, TokenKind>,
    /// Byte offset of `lexer`'s input within `source`.
    base: usize,
    /// Expected closers of the currently open blocks, innermost last.
    block_stack: Vec<TokenKind>,
    prev_offset: usize,
    token_count: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_offset(source, 0)
    }

    /// Start scanning at byte `offset`, which must lie on a char boundary.
    /// Block nesting starts empty.
    pub fn with_offset(source: &'a str, offset: usize) -> Self {
        Self {
            source,
            lexer: TokenKind::lexer(&source[offset..]),
            base: offset,
            block_stack: Vec::new(),
            prev_offset: offset,
            token_count: 0,
        }
    }

    /// Current scan position: the offset just past the last token produced.
    pub fn offset(&self) -> usize {
        self.base + self.lexer.span().end
    }

    /// Scan position before the most recent tokenize call.
    pub fn previous_offset(&self) -> usize {
        self.prev_offset
    }

    /// Number of tokens produced so far, comments included.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Zero-copy view of `length` bytes at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or splits a character.
    pub fn string_range_at(&self, start: usize, length: usize) -> &'a str {
        &self.source[start..start + length]
    }

    /// Next token, skipping comments.
    pub fn tokenize_single(&mut self) -> Token<'a> {
        self.prev_offset = self.offset();
        loop {
            let token = self.next_token();
            if token.kind != TokenKind::Comment {
                return token;
            }
        }
    }

    /// Next token, comments included.
    pub fn tokenize_single_with_comments(&mut self) -> Token<'a> {
        self.prev_offset = self.offset();
        self.next_token()
    }

    /// Tokenize the rest of the input (comments skipped). The trailing EOF
    /// token is not included.
    pub fn tokenize_to_eof(&mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.tokenize_single();
            if token.is_eof() {
                return tokens;
            }
            tokens.push(token);
        }
    }

    fn next_token(&mut self) -> Token<'a> {
        let Some(result) = self.lexer.next() else {
            return Token::eof(self.source.len());
        };
        let kind = result.unwrap_or(TokenKind::Delimiter);
        let offset = self.base + self.lexer.span().start;
        let block_type = self.classify(kind);
        self.token_count += 1;
        Token {
            kind,
            block_type,
            text: self.lexer.slice(),
            offset,
        }
    }

    fn classify(&mut self, kind: TokenKind) -> BlockType {
        if let Some(closer) = kind.block_closer() {
            self.block_stack.push(closer);
            return BlockType::BlockStart;
        }
        if kind.is_closer() && self.block_stack.last() == Some(&kind) {
            self.block_stack.pop();
            return BlockType::BlockEnd;
        }
        BlockType::NotBlock
    }
}
