//! Recursive descent selector parser.
//!
//! Parses selector lists (`div > p, .note`) and relative selector lists (the
//! argument of `:has()`) into [`Selector`] chains. Runs on a
//! [`TokenStream`], so comments are already gone and `:has(` arguments are
//! read inside a block scope that always ends up past the closing `)`.

use tracing::debug;

use crate::css::model::*;
use crate::css::token_stream::TokenStream;
use crate::css::tokenizer::{Token, TokenKind};

/// Errors from selector parsing. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("empty selector in :has() argument at position {position}")]
    EmptyArgument { position: usize },
    #[error(":has() nested inside :has() at position {position}")]
    NestedHas { position: usize },
    #[error("selector has more than {limit} compounds")]
    TooManyCompounds { limit: usize },
}

/// Parser limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Most compounds allowed in one complex selector. At least one is
    /// always accepted.
    pub max_compounds: usize,
    /// Whether `:has()` may appear inside a `:has()` argument.
    pub allow_nested_has: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_compounds: 32,
            allow_nested_has: false,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_compounds(mut self, max_compounds: usize) -> Self {
        self.max_compounds = max_compounds;
        self
    }

    pub fn with_nested_has(mut self, allow: bool) -> Self {
        self.allow_nested_has = allow;
        self
    }
}

/// Parse a comma separated selector list with default limits.
pub fn parse_selector_list(input: &str) -> Result<Vec<Selector>, ParseError> {
    parse_selector_list_with(input, &ParserConfig::default())
}

/// Parse a comma separated selector list.
pub fn parse_selector_list_with(
    input: &str,
    config: &ParserConfig,
) -> Result<Vec<Selector>, ParseError> {
    parse(input, config, false)
}

/// Parse a relative selector list, the argument grammar of `:has()`.
/// A selector without a leading combinator is a descendant relation.
pub fn parse_relative_selector_list(
    input: &str,
    config: &ParserConfig,
) -> Result<Vec<Selector>, ParseError> {
    parse(input, config, true)
}

fn parse(input: &str, config: &ParserConfig, relative: bool) -> Result<Vec<Selector>, ParseError> {
    let mut stream = TokenStream::new(input);
    let mut parser = Parser {
        config,
        has_depth: 0,
    };
    let result = parser.selector_list(&mut stream, relative).and_then(|list| {
        let token = stream.peek();
        if token.is_eof() {
            Ok(list)
        } else {
            Err(unexpected(token, "expected end of selector list"))
        }
    });
    if let Err(error) = &result {
        debug!(%error, input, relative, "selector parse failed");
    }
    result
}

fn unexpected(token: Token<'_>, expected: &str) -> ParseError {
    if token.is_eof() {
        return ParseError::UnexpectedEof(expected.to_string());
    }
    ParseError::UnexpectedToken {
        position: token.offset(),
        message: format!("{expected}, got {:?} '{}'", token.kind(), token.text()),
    }
}

/// Recursive descent parser state.
struct Parser<'c> {
    config: &'c ParserConfig,
    /// How many `:has(` arguments enclose the cursor.
    has_depth: usize,
}

impl Parser<'_> {
    /// Parse selectors separated by commas, up to the end of the stream or
    /// of the enclosing block.
    fn selector_list(
        &mut self,
        stream: &mut TokenStream<'_>,
        relative: bool,
    ) -> Result<Vec<Selector>, ParseError> {
        let mut selectors = Vec::new();

        stream.consume_whitespace();
        selectors.push(self.complex_selector(stream, relative)?);

        while !stream.at_end() {
            let token = stream.peek();
            if token.kind() != TokenKind::Comma {
                return Err(unexpected(token, "expected ',' between selectors"));
            }
            stream.consume_including_whitespace();
            selectors.push(self.complex_selector(stream, relative)?);
        }

        Ok(selectors)
    }

    /// Parse compounds joined by combinators, e.g. `div > p.note`. For a
    /// relative selector an optional leading combinator comes first.
    ///
    /// Whitespace between compounds is the descendant combinator unless an
    /// explicit `>`, `+` or `~` follows it.
    fn complex_selector(
        &mut self,
        stream: &mut TokenStream<'_>,
        relative: bool,
    ) -> Result<Selector, ParseError> {
        if stream.at_end() || stream.peek().kind() == TokenKind::Comma {
            let token = stream.peek();
            return Err(if relative && !token.is_eof() {
                ParseError::EmptyArgument {
                    position: token.offset(),
                }
            } else {
                unexpected(token, "expected selector")
            });
        }

        let leading = if relative {
            self.combinator(stream)
        } else {
            None
        };
        let mut compounds = vec![(self.compound_selector(stream)?, RelationType::SubSelector)];

        loop {
            let had_whitespace = stream.peek().kind() == TokenKind::Whitespace;
            stream.consume_whitespace();
            if stream.at_end() || stream.peek().kind() == TokenKind::Comma {
                break;
            }

            let combinator = match self.combinator(stream) {
                Some(combinator) => combinator,
                None if had_whitespace => RelationType::Descendant,
                None => return Err(unexpected(stream.peek(), "expected combinator")),
            };
            if compounds.len() >= self.config.max_compounds {
                return Err(ParseError::TooManyCompounds {
                    limit: self.config.max_compounds,
                });
            }
            compounds.push((self.compound_selector(stream)?, combinator));
        }

        Ok(match leading {
            Some(leading) => Selector::relative(leading, compounds),
            None if relative => Selector::relative(RelationType::Descendant, compounds),
            None => Selector::from_compounds(compounds),
        })
    }

    /// Consume an explicit combinator and the whitespace after it.
    fn combinator(&mut self, stream: &mut TokenStream<'_>) -> Option<RelationType> {
        let token = stream.peek();
        let relation = if token.is_delimiter('>') {
            RelationType::Child
        } else if token.is_delimiter('+') {
            RelationType::DirectAdjacent
        } else if token.is_delimiter('~') {
            RelationType::IndirectAdjacent
        } else {
            return None;
        };
        stream.consume_including_whitespace();
        Some(relation)
    }

    /// Parse a compound selector: simple selectors with no whitespace between
    /// them, e.g. `p.note:has(> a)`. A type or universal selector may only
    /// come first.
    fn compound_selector(
        &mut self,
        stream: &mut TokenStream<'_>,
    ) -> Result<Vec<SelectorComponent>, ParseError> {
        let mut components = Vec::new();

        loop {
            let token = stream.peek();
            let component = match token.kind() {
                TokenKind::Ident if components.is_empty() => {
                    stream.consume();
                    SelectorComponent::Type(token.text().to_string())
                }
                TokenKind::Delimiter if token.is_delimiter('*') && components.is_empty() => {
                    stream.consume();
                    SelectorComponent::Universal
                }
                TokenKind::Hash => {
                    stream.consume();
                    SelectorComponent::Id(token.name().to_string())
                }
                TokenKind::Delimiter if token.is_delimiter('.') => {
                    stream.consume();
                    let name = stream.peek();
                    if name.kind() != TokenKind::Ident {
                        return Err(unexpected(name, "expected class name after '.'"));
                    }
                    stream.consume();
                    SelectorComponent::Class(name.text().to_string())
                }
                TokenKind::Colon => {
                    stream.consume();
                    self.pseudo_class(stream)?
                }
                _ => break,
            };
            components.push(component);
        }

        if components.is_empty() {
            return Err(unexpected(stream.peek(), "expected selector"));
        }
        Ok(components)
    }

    /// Parse what follows a `:`.
    fn pseudo_class(
        &mut self,
        stream: &mut TokenStream<'_>,
    ) -> Result<SelectorComponent, ParseError> {
        let token = stream.peek();
        match token.kind() {
            TokenKind::Ident => {
                stream.consume();
                let name = token.text().to_ascii_lowercase();
                Ok(if name == "scope" {
                    SelectorComponent::Scope
                } else {
                    SelectorComponent::PseudoClass(name)
                })
            }
            TokenKind::Function if token.name().eq_ignore_ascii_case("has") => {
                self.has_argument(stream)
            }
            _ => Err(unexpected(token, "expected pseudo-class name after ':'")),
        }
    }

    /// Parse `has(` ... `)`; the function token is next.
    fn has_argument(
        &mut self,
        stream: &mut TokenStream<'_>,
    ) -> Result<SelectorComponent, ParseError> {
        let position = stream.peek().offset();
        if self.has_depth > 0 && !self.config.allow_nested_has {
            return Err(ParseError::NestedHas { position });
        }

        let mut block = stream.block();
        self.has_depth += 1;
        let arguments = self.selector_list(&mut *block, true);
        self.has_depth -= 1;
        let arguments = arguments?;

        if block.peek().is_eof() {
            return Err(ParseError::UnexpectedEof(
                "expected ')' to close :has(".into(),
            ));
        }
        Ok(SelectorComponent::Has(arguments))
    }
}
