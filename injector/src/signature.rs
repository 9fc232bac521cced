//! Reads dependency names out of a factory's declaration text.
//!
//! The parser is lexical: it never evaluates the text. It understands three
//! declaration shapes:
//!
//! - classes, whose dependencies are the `constructor(...)` parameters (none
//!   if there is no constructor);
//! - anything with a parenthesized parameter list (functions, methods,
//!   parenthesized arrows);
//! - single-identifier arrows (`x => ...`).
//!
//! A block comment directly before a parameter marks it optional:
//! `(a, /* optional */ b)` yields `a` and `b?`.

use crate::core::Dependency;
use crate::error::ParseError;

/// The declaration form the parameter list was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationShape {
  Class,
  Parenthesized,
  BareArrow,
}

/// The result of parsing a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
  pub shape: DeclarationShape,
  pub dependencies: Vec<Dependency>,
}

/// Parses `text` into its shape and ordered dependency list.
pub fn parse_signature(text: &str) -> Result<Signature, ParseError> {
  // Lexing stops at the first malformed token. That only matters if the
  // parameter list could not be found in the tokens read before it.
  let (tokens, lex_error) = tokenize(text);
  let (shape, params) = match locate_parameters(&tokens) {
    Ok(found) => found,
    Err(err) => return Err(lex_error.unwrap_or(err)),
  };
  let dependencies = match params {
    Parameters::None => Vec::new(),
    Parameters::Single(name) => vec![Dependency::required(name)],
    Parameters::List(range) => split_parameters(&tokens[range])?,
  };
  Ok(Signature {
    shape,
    dependencies,
  })
}

/// Parses `text` and returns only the dependency list.
pub fn extract_dependency_names(text: &str) -> Result<Vec<Dependency>, ParseError> {
  parse_signature(text).map(|signature| signature.dependencies)
}

// --- Lexing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  Ident,
  Punct,
  Arrow,
  Comment,
  Literal,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
  kind: Kind,
  text: &'a str,
}

impl Token<'_> {
  fn is_punct(&self, c: &str) -> bool {
    self.kind == Kind::Punct && self.text == c
  }

  fn is_ident(&self, name: &str) -> bool {
    self.kind == Kind::Ident && self.text == name
  }

  fn opens(&self) -> bool {
    self.kind == Kind::Punct && matches!(self.text, "(" | "[" | "{")
  }

  fn closes(&self) -> bool {
    self.kind == Kind::Punct && matches!(self.text, ")" | "]" | "}")
  }
}

fn is_ident_start(c: char) -> bool {
  c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$'
}

/// Splits `text` into tokens, stopping at the first unterminated comment or
/// literal. The tokens read so far are returned alongside the error.
fn tokenize(text: &str) -> (Vec<Token<'_>>, Option<ParseError>) {
  let mut tokens: Vec<Token<'_>> = Vec::new();
  let mut pos = 0;

  while let Some(c) = text[pos..].chars().next() {
    let rest = &text[pos..];
    let start = pos;

    if c.is_whitespace() {
      pos += c.len_utf8();
      continue;
    }

    if rest.starts_with("//") {
      pos += rest.find('\n').unwrap_or(rest.len());
      continue;
    }

    if rest.starts_with("/*") {
      let Some(end) = rest[2..].find("*/") else {
        return (tokens, Some(unterminated("block comment", start)));
      };
      pos += end + 4;
      tokens.push(Token {
        kind: Kind::Comment,
        text: &text[start..pos],
      });
      continue;
    }

    let kind = if rest.starts_with("=>") {
      pos += 2;
      Kind::Arrow
    } else if matches!(c, '"' | '\'' | '`') {
      let Some(len) = quoted_len(rest, c) else {
        return (tokens, Some(unterminated("string literal", start)));
      };
      pos += len;
      Kind::Literal
    } else if c == '/' && regex_allowed(&tokens) {
      let Some(len) = regex_len(rest) else {
        return (tokens, Some(unterminated("regular expression", start)));
      };
      pos += len;
      Kind::Literal
    } else if is_ident_start(c) {
      pos += rest
        .find(|ch: char| !is_ident_continue(ch))
        .unwrap_or(rest.len());
      Kind::Ident
    } else if c.is_ascii_digit() {
      pos += rest
        .find(|ch: char| !(ch.is_alphanumeric() || ch == '.' || ch == '_'))
        .unwrap_or(rest.len());
      Kind::Literal
    } else {
      pos += c.len_utf8();
      Kind::Punct
    };

    tokens.push(Token {
      kind,
      text: &text[start..pos],
    });
  }

  (tokens, None)
}

fn unterminated(what: &'static str, offset: usize) -> ParseError {
  ParseError::Unterminated { what, offset }
}

/// Byte length of the quoted literal at the start of `rest`, quotes included.
fn quoted_len(rest: &str, quote: char) -> Option<usize> {
  let mut escaped = false;
  for (offset, c) in rest.char_indices().skip(1) {
    if escaped {
      escaped = false;
    } else if c == '\\' {
      escaped = true;
    } else if c == quote {
      return Some(offset + c.len_utf8());
    }
  }
  None
}

/// Keywords after which a `/` starts a regular expression, not a division.
const REGEX_KEYWORDS: &[&str] = &[
  "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
  "else", "yield", "await",
];

/// Whether a `/` following `tokens` opens a regular expression literal.
fn regex_allowed(tokens: &[Token<'_>]) -> bool {
  match tokens.iter().rev().find(|t| t.kind != Kind::Comment) {
    None => true,
    Some(token) => match token.kind {
      Kind::Arrow => true,
      Kind::Punct => !matches!(token.text, ")" | "]" | "}"),
      Kind::Ident => REGEX_KEYWORDS.contains(&token.text),
      Kind::Literal | Kind::Comment => false,
    },
  }
}

/// Byte length of the regular expression literal at the start of `rest`,
/// slashes and flags included. Regular expressions never span lines.
fn regex_len(rest: &str) -> Option<usize> {
  let mut escaped = false;
  let mut in_class = false;
  for (offset, c) in rest.char_indices().skip(1) {
    match c {
      '\n' => return None,
      _ if escaped => escaped = false,
      '\\' => escaped = true,
      '[' => in_class = true,
      ']' => in_class = false,
      '/' if !in_class => {
        let end = offset + 1;
        let flags = rest[end..]
          .find(|ch: char| !ch.is_alphanumeric())
          .unwrap_or(rest.len() - end);
        return Some(end + flags);
      }
      _ => {}
    }
  }
  None
}

// --- Shape detection ---

enum Parameters<'a> {
  None,
  Single(&'a str),
  /// Token range strictly inside the parentheses.
  List(std::ops::Range<usize>),
}

fn locate_parameters<'a>(
  tokens: &[Token<'a>],
) -> Result<(DeclarationShape, Parameters<'a>), ParseError> {
  let significant: Vec<usize> = (0..tokens.len())
    .filter(|&i| tokens[i].kind != Kind::Comment)
    .collect();

  let Some(&first) = significant.first() else {
    return Err(ParseError::NoParameterList);
  };

  if tokens[first].is_ident("class") {
    return locate_constructor(tokens, &significant[1..])
      .map(|params| (DeclarationShape::Class, params));
  }

  let mut previous: Option<usize> = None;
  for &i in &significant {
    let token = &tokens[i];
    if token.is_punct("(") {
      let close = matching_close(tokens, i)?;
      return Ok((DeclarationShape::Parenthesized, Parameters::List(i + 1..close)));
    }
    if token.kind == Kind::Arrow {
      return match previous.map(|p| &tokens[p]) {
        Some(param) if param.kind == Kind::Ident => {
          Ok((DeclarationShape::BareArrow, Parameters::Single(param.text)))
        }
        _ => Err(ParseError::NoParameterList),
      };
    }
    if token.is_punct("{") {
      break;
    }
    previous = Some(i);
  }

  Err(ParseError::NoParameterList)
}

/// Finds `constructor(...)` directly inside the class body.
fn locate_constructor<'a>(
  tokens: &[Token<'a>],
  significant: &[usize],
) -> Result<Parameters<'a>, ParseError> {
  // The heritage clause may contain calls (`extends mixin(Base)`), so the
  // body is the first brace outside any parentheses.
  let mut depth = 0usize;
  let mut body = None;
  for (n, &i) in significant.iter().enumerate() {
    let token = &tokens[i];
    if depth == 0 && token.is_punct("{") {
      body = Some(n);
      break;
    }
    if token.opens() {
      depth += 1;
    } else if token.closes() {
      depth = depth.checked_sub(1).ok_or(ParseError::Unbalanced)?;
    }
  }
  let body = body.ok_or(ParseError::NoParameterList)?;

  let members = &significant[body + 1..];
  let mut depth = 1usize;
  for (n, &i) in members.iter().enumerate() {
    let token = &tokens[i];
    if depth == 1 && token.is_ident("constructor") {
      if let Some(&next) = members.get(n + 1) {
        if tokens[next].is_punct("(") {
          let close = matching_close(tokens, next)?;
          return Ok(Parameters::List(next + 1..close));
        }
      }
    }
    if token.opens() {
      depth += 1;
    } else if token.closes() {
      depth -= 1;
      if depth == 0 {
        return Ok(Parameters::None);
      }
    }
  }

  Err(ParseError::Unbalanced)
}

/// Index of the token closing the bracket opened at `open`.
fn matching_close(tokens: &[Token<'_>], open: usize) -> Result<usize, ParseError> {
  let mut depth = 0usize;
  for (i, token) in tokens.iter().enumerate().skip(open) {
    if token.opens() {
      depth += 1;
    } else if token.closes() {
      depth = depth.checked_sub(1).ok_or(ParseError::Unbalanced)?;
      if depth == 0 {
        return Ok(i);
      }
    }
  }
  Err(ParseError::Unbalanced)
}

// --- Parameters ---

fn split_parameters(tokens: &[Token<'_>]) -> Result<Vec<Dependency>, ParseError> {
  let mut dependencies = Vec::new();
  let mut depth = 0usize;
  let mut start = 0;

  for (i, token) in tokens.iter().enumerate() {
    if token.opens() {
      depth += 1;
    } else if token.closes() {
      depth = depth.checked_sub(1).ok_or(ParseError::Unbalanced)?;
    } else if depth == 0 && token.is_punct(",") {
      dependencies.extend(parameter(&tokens[start..i])?);
      start = i + 1;
    }
  }
  dependencies.extend(parameter(&tokens[start..])?);

  Ok(dependencies)
}

fn parameter(segment: &[Token<'_>]) -> Result<Option<Dependency>, ParseError> {
  let mut name = None;
  let mut annotated = false;

  for token in segment {
    match token.kind {
      Kind::Comment => annotated |= name.is_none(),
      Kind::Ident if name.is_none() => name = Some(token.text),
      _ => {
        let text: Vec<&str> = segment
          .iter()
          .filter(|t| t.kind != Kind::Comment)
          .map(|t| t.text)
          .collect();
        return Err(ParseError::UnsupportedParameter(text.join(" ")));
      }
    }
  }

  Ok(name.map(|name| {
    if annotated {
      Dependency::optional(name)
    } else {
      Dependency::required(name)
    }
  }))
}
