//! Pull-based token cursor with one token of lookahead.
//!
//! [`TokenStream`] wraps a [`Tokenizer`] and buffers at most one token. The
//! public consume operations never step over a block boundary: a block is
//! entered through [`TokenStream::block`] and everything up to its closer is
//! skipped when the returned guard drops. Inside a block, [`TokenStream::peek`]
//! reports the closer and [`TokenStream::at_end`] turns true, so parsers can
//! loop on `!at_end()` without tracking nesting themselves.
//!
//! Comment handling is a type parameter: [`Processed`] streams never see
//! comments, [`Raw`] streams get them as ordinary tokens.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::css::tokenizer::{BlockType, Token, TokenKind, Tokenizer};

/// Chooses which tokenizer read a stream uses.
pub trait CommentMode {
    fn tokenize<'a>(tokenizer: &mut Tokenizer<'a>) -> Token<'a>;
}

/// Comments are dropped by the tokenizer.
#[derive(Debug)]
pub enum Processed {}

/// Comments are kept as [`TokenKind::Comment`] tokens.
#[derive(Debug)]
pub enum Raw {}

impl CommentMode for Processed {
    fn tokenize<'a>(tokenizer: &mut Tokenizer<'a>) -> Token<'a> {
        tokenizer.tokenize_single()
    }
}

impl CommentMode for Raw {
    fn tokenize<'a>(tokenizer: &mut Tokenizer<'a>) -> Token<'a> {
        tokenizer.tokenize_single_with_comments()
    }
}

/// Token stream that keeps comments.
pub type RawTokenStream<'a> = TokenStream<'a, Raw>;

/// Token cursor over a borrowed source buffer.
pub struct TokenStream<'a, M: CommentMode = Processed> {
    tokenizer: Tokenizer<'a>,
    next: Token<'a>,
    has_look_ahead: bool,
    /// Offset just past the last consumed token.
    offset: usize,
    _mode: PhantomData<M>,
}

impl<'a, M: CommentMode> TokenStream<'a, M> {
    pub fn new(source: &'a str) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            // Placeholder only; `has_look_ahead` is false until the first read.
            next: Token::eof(0),
            has_look_ahead: false,
            offset: 0,
            _mode: PhantomData,
        }
    }

    /// Whether a token is currently buffered.
    pub fn has_look_ahead(&self) -> bool {
        self.has_look_ahead
    }

    fn look_ahead(&mut self) {
        debug_assert!(!self.has_look_ahead);
        self.next = M::tokenize(&mut self.tokenizer);
        self.has_look_ahead = true;
    }

    /// Buffer the next token if nothing is buffered yet.
    pub fn ensure_look_ahead(&mut self) {
        if !self.has_look_ahead {
            self.look_ahead();
        }
    }

    /// The next token, without consuming it.
    pub fn peek(&mut self) -> Token<'a> {
        self.ensure_look_ahead();
        self.next
    }

    /// True at end of input, and inside a block when the next token closes it.
    pub fn at_end(&mut self) -> bool {
        self.ensure_look_ahead();
        self.unchecked_at_end()
    }

    fn unchecked_at_end(&self) -> bool {
        self.next.is_eof() || self.next.block_type() == BlockType::BlockEnd
    }

    /// Consume one token.
    ///
    /// The token must not open or close a block; use [`TokenStream::block`]
    /// or [`TokenStream::consume_component_value`] for those.
    pub fn consume(&mut self) -> Token<'a> {
        self.ensure_look_ahead();
        self.unchecked_consume()
    }

    fn unchecked_consume(&mut self) -> Token<'a> {
        debug_assert!(self.has_look_ahead);
        debug_assert_ne!(self.next.block_type(), BlockType::BlockStart);
        debug_assert_ne!(self.next.block_type(), BlockType::BlockEnd);
        self.unchecked_consume_internal()
    }

    /// Consume the buffered token whatever its block type.
    fn unchecked_consume_internal(&mut self) -> Token<'a> {
        debug_assert!(self.has_look_ahead);
        self.has_look_ahead = false;
        self.offset = self.tokenizer.offset();
        self.next
    }

    fn consume_internal(&mut self) -> Token<'a> {
        self.ensure_look_ahead();
        self.unchecked_consume_internal()
    }

    /// Consume every whitespace token at the cursor.
    pub fn consume_whitespace(&mut self) {
        while self.peek().kind() == TokenKind::Whitespace {
            self.unchecked_consume();
        }
    }

    /// Consume one token, then any whitespace after it. Returns the first
    /// token.
    pub fn consume_including_whitespace(&mut self) -> Token<'a> {
        let result = self.consume();
        self.consume_whitespace();
        result
    }

    /// Consume a comment if one is next.
    ///
    /// Must be called with nothing buffered. Returns true if a comment was
    /// consumed. Otherwise the token read is kept as lookahead, so a
    /// following [`peek`](Self::peek) or [`consume`](Self::consume) sees it
    /// without reading again.
    pub fn consume_comment_or_nothing(&mut self) -> bool {
        debug_assert!(!self.has_look_ahead);
        let token = self.tokenizer.tokenize_single_with_comments();
        if token.kind() != TokenKind::Comment {
            self.next = token;
            self.has_look_ahead = true;
            return false;
        }
        self.has_look_ahead = false;
        self.offset = self.tokenizer.offset();
        true
    }

    /// Consume a single component value: one token, or a whole balanced
    /// block when the next token opens one.
    pub fn consume_component_value(&mut self) {
        self.ensure_look_ahead();
        self.unchecked_consume_component_value();
    }

    /// [`consume_component_value`](Self::consume_component_value) with a
    /// token already buffered.
    ///
    /// Stops early at EOF when the block is never closed.
    pub fn unchecked_consume_component_value(&mut self) {
        debug_assert!(self.has_look_ahead);
        let mut nesting_level = 0usize;
        loop {
            let token = self.unchecked_consume_internal();
            match token.block_type() {
                BlockType::BlockStart => nesting_level += 1,
                BlockType::BlockEnd => nesting_level = nesting_level.saturating_sub(1),
                BlockType::NotBlock => {}
            }
            if nesting_level == 0 || self.peek().is_eof() {
                break;
            }
        }
    }

    /// Skip the rest of the block the cursor is in, closer included.
    ///
    /// The buffered token counts as already inside the block. The remaining
    /// tokens are read straight from the tokenizer without buffering. Stops
    /// at EOF when the block is never closed.
    pub fn unchecked_skip_to_end_of_block(&mut self) {
        debug_assert!(self.has_look_ahead);
        self.has_look_ahead = false;
        let mut nesting_level = 1usize;
        match self.next.block_type() {
            BlockType::BlockStart => nesting_level += 1,
            BlockType::BlockEnd => nesting_level -= 1,
            BlockType::NotBlock => {}
        }
        while nesting_level != 0 {
            let token = self.tokenizer.tokenize_single();
            match token.block_type() {
                _ if token.is_eof() => break,
                BlockType::BlockStart => nesting_level += 1,
                BlockType::BlockEnd => nesting_level -= 1,
                BlockType::NotBlock => {}
            }
        }
        self.offset = self.tokenizer.offset();
    }

    /// Consume component values until the next token has one of `kinds` or
    /// the stream (or current block) ends.
    pub fn consume_until_peeked_type_is(&mut self, kinds: &[TokenKind]) {
        while !self.at_end() && !kinds.contains(&self.next.kind()) {
            self.unchecked_consume_component_value();
        }
    }

    /// Enter the block opened by the next token.
    ///
    /// The guard derefs to the stream. When it drops, the rest of the block
    /// is skipped, so the stream always ends up just after the closer.
    pub fn block(&mut self) -> BlockGuard<'_, 'a, M> {
        let start = self.consume_internal();
        debug_assert_eq!(start.block_type(), BlockType::BlockStart);
        BlockGuard { stream: self }
    }

    /// Offset just past the last consumed token.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset where the buffered token starts scanning (before any comments
    /// skipped in front of it).
    pub fn look_ahead_offset(&self) -> usize {
        self.tokenizer.previous_offset()
    }

    /// Number of tokens read from the source so far.
    pub fn token_count(&self) -> usize {
        self.tokenizer.token_count()
    }

    /// Zero-copy view into the source buffer.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn string_range_at(&self, start: usize, length: usize) -> &'a str {
        self.tokenizer.string_range_at(start, length)
    }
}

/// Scope of one block. See [`TokenStream::block`].
pub struct BlockGuard<'s, 'a, M: CommentMode> {
    stream: &'s mut TokenStream<'a, M>,
}

impl<'a, M: CommentMode> Deref for BlockGuard<'_, 'a, M> {
    type Target = TokenStream<'a, M>;

    fn deref(&self) -> &Self::Target {
        self.stream
    }
}

impl<M: CommentMode> DerefMut for BlockGuard<'_, '_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream
    }
}

impl<M: CommentMode> Drop for BlockGuard<'_, '_, M> {
    fn drop(&mut self) {
        self.stream.ensure_look_ahead();
        self.stream.unchecked_skip_to_end_of_block();
    }
}
