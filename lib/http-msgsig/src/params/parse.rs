//!
//! Parsers for the structured `Signature` and `Signature-Input` header values
//!
//! Both headers are dictionaries of `id=value` members. The parsers only accept the subset of structured fields
//! the signature scheme needs and reject everything else.
//!

use super::{Component, SignatureParams, REQUEST_TARGET};
use http::HeaderName;
use logos::{Lexer, Logos, Span};
use miette::{Diagnostic, SourceSpan};
use std::{iter::Peekable, slice};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Logos, PartialEq)]
enum TokenTy {
    #[regex(r"[a-z*][a-z0-9_\-.*]*")]
    Key,

    #[regex(r#""([ !#-\[\]-~]|\\["\\])*""#)]
    String,

    #[regex(r"-?[0-9]+")]
    Integer,

    #[regex(r":[A-Za-z0-9+/=]*:")]
    ByteSequence,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("=")]
    Equals,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,
}

#[derive(Debug)]
struct Token {
    pub ty: TokenTy,
    pub span: Span,
}

impl Token {
    fn parse(input: &str) -> Result<Vec<Token>, ParseError> {
        Lexer::<'_, TokenTy>::new(input)
            .spanned()
            .map(|(ty, span)| match ty {
                Ok(ty) => Ok(Token { ty, span }),
                Err(()) => Err(ParseError::new(ParseErrorKind::InvalidToken, span)),
            })
            .collect()
    }
}

/// What went wrong while parsing
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ParseErrorKind {
    /// Input contains characters that can't start any token
    #[error("Invalid token")]
    InvalidToken,

    /// Token isn't allowed at this position
    #[error("Unexpected token")]
    UnexpectedToken,

    /// Input ended prematurely
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// List member without content
    #[error("Empty list member")]
    EmptyMember,

    /// Member or parameter isn't followed by `=`
    #[error("Missing '=' separator")]
    MissingSeparator,

    /// Parameters don't start with the covered component list
    #[error("Missing covered component list")]
    MissingComponents,

    /// Covered component list has no entries
    #[error("Covered component list is empty")]
    EmptyComponents,

    /// Derived component other than `@request-target`
    #[error("Unsupported covered component")]
    UnsupportedComponent,

    /// Covered component isn't a valid header name
    #[error("Invalid header name")]
    InvalidHeaderName,

    /// Parameter name isn't known
    #[error("Unknown signature parameter")]
    UnknownParameter,

    /// Parameter was specified more than once
    #[error("Duplicate signature parameter")]
    DuplicateParameter,

    /// The mandatory `keyid` parameter is missing
    #[error("Missing 'keyid' parameter")]
    MissingKeyId,

    /// Parameter value has to be a string
    #[error("Expected a quoted string")]
    ExpectedString,

    /// Parameter value has to be an integer
    #[error("Expected an integer")]
    ExpectedInteger,

    /// Integer is negative or too large
    #[error("Integer out of range")]
    InvalidInteger,

    /// Signature value has to be a `:base64:` byte sequence
    #[error("Expected a byte sequence")]
    ExpectedByteSequence,
}

/// Parse error pointing at the offending part of the input
#[derive(Clone, Debug, Diagnostic, Eq, Error, PartialEq)]
#[error("{kind}")]
#[diagnostic(code(http_msgsig::parse))]
pub struct ParseError {
    kind: ParseErrorKind,

    #[label("here")]
    span: SourceSpan,
}

impl ParseError {
    fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }

    /// What went wrong
    #[must_use]
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Location of the error in the parsed input
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// Shift the span by `offset` bytes
    ///
    /// Used to make errors of a member value point into the complete header
    #[must_use]
    pub fn offset_by(self, offset: usize) -> Self {
        Self {
            kind: self.kind,
            span: (self.span.offset() + offset, self.span.len()).into(),
        }
    }
}

/// Member of a dictionary header
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Member<'a> {
    /// Signature ID
    pub id: &'a str,

    /// Raw value of the member
    pub value: &'a str,

    /// Byte offset of the value inside of the header
    pub offset: usize,
}

fn trim_whitespace(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|token| token.ty != TokenTy::Whitespace)
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|token| token.ty != TokenTy::Whitespace)
        .map_or(start, |idx| idx + 1);

    &tokens[start..end]
}

fn member<'a>(
    input: &'a str,
    segment: &[Token],
    position: usize,
) -> Result<Member<'a>, ParseError> {
    let [key, rest @ ..] = trim_whitespace(segment) else {
        return Err(ParseError::new(
            ParseErrorKind::EmptyMember,
            position..position,
        ));
    };

    if key.ty != TokenTy::Key {
        return Err(ParseError::new(
            ParseErrorKind::UnexpectedToken,
            key.span.clone(),
        ));
    }

    let value = match rest {
        [] => {
            return Err(ParseError::new(
                ParseErrorKind::MissingSeparator,
                key.span.clone(),
            ))
        }
        [separator, ..] if separator.ty != TokenTy::Equals => {
            return Err(ParseError::new(
                ParseErrorKind::MissingSeparator,
                separator.span.clone(),
            ))
        }
        [separator] => {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEnd,
                separator.span.end..separator.span.end,
            ))
        }
        [_, value @ ..] => value,
    };

    let start = value[0].span.start;
    let end = value[value.len() - 1].span.end;

    Ok(Member {
        id: &input[key.span.clone()],
        value: &input[start..end],
        offset: start,
    })
}

/// Split a dictionary header into its members
///
/// Commas inside of quoted strings don't split members
pub fn members(input: &str) -> Result<Vec<Member<'_>>, ParseError> {
    let tokens = Token::parse(input)?;

    let mut members = Vec::new();
    let mut remaining = tokens.as_slice();
    let mut position = 0;
    loop {
        let end = remaining
            .iter()
            .position(|token| token.ty == TokenTy::Comma)
            .unwrap_or(remaining.len());
        let (segment, rest) = remaining.split_at(end);

        members.push(member(input, segment, position)?);

        let Some((comma, rest)) = rest.split_first() else {
            break;
        };
        position = comma.span.end;
        remaining = rest;
    }

    Ok(members)
}

fn unquote(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut unquoted = String::with_capacity(inner.len());

    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            // The lexer only lets `\"` and `\\` through
            if let Some(escaped) = chars.next() {
                unquoted.push(escaped);
            }
        } else {
            unquoted.push(ch);
        }
    }

    unquoted
}

struct Cursor<'a> {
    input: &'a str,
    tokens: Peekable<slice::Iter<'a, Token>>,
}

impl<'a> Cursor<'a> {
    fn end(&self) -> Span {
        self.input.len()..self.input.len()
    }

    fn next_or_end(&mut self) -> Result<&'a Token, ParseError> {
        self.tokens
            .next()
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnexpectedEnd, self.end()))
    }

    fn text(&self, token: &Token) -> &'a str {
        &self.input[token.span.clone()]
    }

    fn string(&self, token: &Token) -> Result<String, ParseError> {
        if token.ty == TokenTy::String {
            Ok(unquote(self.text(token)))
        } else {
            Err(ParseError::new(
                ParseErrorKind::ExpectedString,
                token.span.clone(),
            ))
        }
    }

    fn integer(&self, token: &Token) -> Result<u64, ParseError> {
        if token.ty != TokenTy::Integer {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedInteger,
                token.span.clone(),
            ));
        }

        self.text(token)
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, token.span.clone()))
    }

    fn component(&self, token: &Token) -> Result<Component, ParseError> {
        let name = unquote(self.text(token));
        if name == REQUEST_TARGET {
            return Ok(Component::RequestTarget);
        }

        if name.starts_with('@') {
            return Err(ParseError::new(
                ParseErrorKind::UnsupportedComponent,
                token.span.clone(),
            ));
        }

        HeaderName::from_bytes(name.as_bytes())
            .map(Component::Header)
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidHeaderName, token.span.clone()))
    }

    fn components(&mut self) -> Result<Vec<Component>, ParseError> {
        let open = match self.tokens.next() {
            Some(token) if token.ty == TokenTy::OpenParen => token,
            Some(token) => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingComponents,
                    token.span.clone(),
                ))
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingComponents,
                    self.end(),
                ))
            }
        };

        let mut components = Vec::new();
        let mut separated = true;
        let close = loop {
            let token = self.next_or_end()?;
            match token.ty {
                TokenTy::CloseParen => break token,
                TokenTy::Whitespace => separated = true,
                TokenTy::String if separated => {
                    components.push(self.component(token)?);
                    separated = false;
                }
                _ => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedToken,
                        token.span.clone(),
                    ))
                }
            }
        };

        if components.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::EmptyComponents,
                open.span.start..close.span.end,
            ));
        }

        Ok(components)
    }
}

/// Parse the value of a `Signature-Input` member into signature parameters
///
/// ```text
/// ("date" "@request-target");keyid="key1";alg="hmac-sha256";expires=1618884475
/// ```
pub fn params(input: &str) -> Result<SignatureParams, ParseError> {
    let tokens = Token::parse(input)?;
    let mut cursor = Cursor {
        input,
        tokens: tokens.iter().peekable(),
    };

    let mut params = SignatureParams::new(String::new(), cursor.components()?);
    let mut key_id = None;
    let mut seen = Vec::new();

    while let Some(token) = cursor.tokens.next() {
        if token.ty != TokenTy::Semicolon {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.span.clone(),
            ));
        }

        let name = cursor.next_or_end()?;
        if name.ty != TokenTy::Key {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                name.span.clone(),
            ));
        }

        if cursor
            .tokens
            .next_if(|token| token.ty == TokenTy::Equals)
            .is_none()
        {
            return Err(ParseError::new(
                ParseErrorKind::MissingSeparator,
                name.span.clone(),
            ));
        }
        let value = cursor.next_or_end()?;

        let name_str = cursor.text(name);
        if seen.contains(&name_str) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateParameter,
                name.span.clone(),
            ));
        }
        seen.push(name_str);

        match name_str {
            "keyid" => key_id = Some(cursor.string(value)?),
            "alg" => params.algorithm = Some(cursor.string(value)?),
            "created" => params.created = Some(cursor.integer(value)?),
            "expires" => params.expires = Some(cursor.integer(value)?),
            "nonce" => params.nonce = Some(cursor.string(value)?),
            "tag" => params.tag = Some(cursor.string(value)?),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::UnknownParameter,
                    name.span.clone(),
                ))
            }
        }
    }

    params.key_id =
        key_id.ok_or_else(|| ParseError::new(ParseErrorKind::MissingKeyId, 0..input.len()))?;

    Ok(params)
}

/// Extract the Base64 payload of a `:base64:` byte sequence, without the surrounding colons
pub fn byte_sequence(input: &str) -> Result<&str, ParseError> {
    let tokens = Token::parse(input)?;
    match tokens.as_slice() {
        [token] if token.ty == TokenTy::ByteSequence => {
            Ok(&input[token.span.start + 1..token.span.end - 1])
        }
        [token, ..] if token.ty != TokenTy::ByteSequence => Err(ParseError::new(
            ParseErrorKind::ExpectedByteSequence,
            token.span.clone(),
        )),
        [_, extra, ..] => Err(ParseError::new(
            ParseErrorKind::UnexpectedToken,
            extra.span.clone(),
        )),
        [] => Err(ParseError::new(ParseErrorKind::ExpectedByteSequence, 0..0)),
        // A single token is either a byte sequence or not; both are handled above
        [_] => unreachable!(),
    }
}
