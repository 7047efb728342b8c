//! Requirement line parsing
//!
//! Parses a single manifest line in PEP 508 form:
//!
//! ```text
//! name [extras] (version-spec | @ url)? (; marker)?
//! ```
//!
//! Examples:
//! - `requests`
//! - `requests[socks]>=2.31.0,<3`
//! - `urllib3 (>=2.0.0)`
//! - `pip @ https://example.com/pip-24.0-py3-none-any.whl`
//! - `tomli>=1.1.0; python_version < "3.11"`

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("Empty requirement")]
    Empty,

    #[error("Invalid package name '{0}'")]
    InvalidName(String),

    #[error("Missing closing ']' for extras")]
    UnclosedExtras,

    #[error("Invalid extra name '{0}'")]
    InvalidExtra(String),

    #[error("Missing closing ')' for version specifier")]
    UnclosedSpecifier,

    #[error("Invalid version specifier '{0}'")]
    InvalidSpecifier(String),

    #[error("Expected URL after '@'")]
    MissingUrl,

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Invalid environment marker: {0}")]
    InvalidMarker(String),

    #[error("Unexpected text '{0}'")]
    Trailing(String),
}

/// A parsed requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name as written
    pub name: String,
    /// Requested extras, e.g. `socks` in `requests[socks]`
    pub extras: Vec<String>,
    /// Version constraint clauses joined with `,` (empty when unconstrained)
    pub specifier: String,
    /// Direct reference for `name @ url` requirements
    pub url: Option<String>,
    /// Environment marker expression after `;`
    pub marker: Option<String>,
}

impl Requirement {
    /// Parse a requirement expression
    pub fn parse(input: &str) -> Result<Self, RequirementError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RequirementError::Empty);
        }

        let name_len = input
            .find(|c: char| !is_name_char(c))
            .unwrap_or(input.len());
        let name = &input[..name_len];
        if !is_identifier(name) {
            let shown = input.split_whitespace().next().unwrap_or(input);
            return Err(RequirementError::InvalidName(shown.to_string()));
        }
        let mut rest = input[name_len..].trim_start();

        let mut extras = Vec::new();
        if let Some(after) = rest.strip_prefix('[') {
            let Some((inner, tail)) = after.split_once(']') else {
                return Err(RequirementError::UnclosedExtras);
            };
            extras = parse_extras(inner)?;
            rest = tail.trim_start();
        }

        let mut specifier = String::new();
        let mut url = None;

        if let Some(after) = rest.strip_prefix('@') {
            let after = after.trim_start();
            let end = after.find(char::is_whitespace).unwrap_or(after.len());
            let candidate = &after[..end];
            if candidate.is_empty() {
                return Err(RequirementError::MissingUrl);
            }
            if !is_url(candidate) {
                return Err(RequirementError::InvalidUrl(candidate.to_string()));
            }
            url = Some(candidate.to_string());
            rest = after[end..].trim_start();
        } else if let Some(after) = rest.strip_prefix('(') {
            let Some((inner, tail)) = after.split_once(')') else {
                return Err(RequirementError::UnclosedSpecifier);
            };
            specifier = parse_specifier(inner)?;
            rest = tail.trim_start();
        } else {
            let end = rest.find(';').unwrap_or(rest.len());
            specifier = parse_specifier(&rest[..end])?;
            rest = &rest[end..];
        }

        let marker = match rest.strip_prefix(';') {
            Some(expr) => Some(parse_marker(expr)?),
            None if rest.is_empty() => None,
            None => return Err(RequirementError::Trailing(rest.to_string())),
        };

        Ok(Requirement {
            name: name.to_string(),
            extras,
            specifier,
            url,
            marker,
        })
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
        } else {
            write!(f, "{}", self.specifier)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Names and extras: alphanumerics with `.`, `_`, `-` inside
fn is_identifier(s: &str) -> bool {
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().last()) else {
        return false;
    };
    first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric() && s.chars().all(is_name_char)
}

fn is_url(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && !rest.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn parse_extras(inner: &str) -> Result<Vec<String>, RequirementError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|extra| {
            let extra = extra.trim();
            if is_identifier(extra) {
                Ok(extra.to_string())
            } else {
                Err(RequirementError::InvalidExtra(extra.to_string()))
            }
        })
        .collect()
}

/// Comparison operators, longest first so prefixes don't shadow them
const VERSION_OPERATORS: [&str; 8] = ["===", "~=", "==", "!=", "<=", ">=", "<", ">"];

/// Validate a comma-separated specifier set, returning it with whitespace removed
fn parse_specifier(spec: &str) -> Result<String, RequirementError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Ok(String::new());
    }

    let mut clauses = Vec::new();
    for clause in spec.split(',') {
        let clause = clause.trim();
        let invalid = || RequirementError::InvalidSpecifier(clause.to_string());

        let op = VERSION_OPERATORS
            .iter()
            .find(|op| clause.starts_with(**op))
            .ok_or_else(invalid)?;
        let version = clause[op.len()..].trim();

        let valid = match *op {
            "===" => !version.is_empty() && !version.contains(char::is_whitespace),
            "==" | "!=" => match version.strip_suffix(".*") {
                // Wildcards only apply to a plain release
                Some(prefix) => parse_version(prefix)
                    .is_some_and(|v| !v.has_qualifiers && !v.has_local),
                None => parse_version(version).is_some(),
            },
            "~=" => parse_version(version)
                .is_some_and(|v| v.release_segments >= 2 && !v.has_local),
            _ => parse_version(version).is_some_and(|v| !v.has_local),
        };
        if !valid {
            return Err(invalid());
        }
        clauses.push(format!("{}{}", op, version));
    }

    Ok(clauses.join(","))
}

/// Shape of a version that passed [`parse_version`]
struct VersionShape {
    release_segments: usize,
    /// Any pre, post or dev segment
    has_qualifiers: bool,
    has_local: bool,
}

const PRE_LABELS: [&str; 8] = ["alpha", "beta", "preview", "pre", "a", "b", "c", "rc"];
const POST_LABELS: [&str; 3] = ["post", "rev", "r"];
const DEV_LABELS: [&str; 1] = ["dev"];
const SEPARATORS: [char; 3] = ['-', '_', '.'];

/// PEP 440 version check:
/// `[v][N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`, case-insensitive, with
/// the alternate spellings and separators pip accepts
fn parse_version(version: &str) -> Option<VersionShape> {
    let lower = version.to_ascii_lowercase();
    let mut rest = lower.strip_prefix('v').unwrap_or(&lower);

    if let Some((epoch, tail)) = rest.split_once('!') {
        if epoch.is_empty() || !epoch.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest = tail;
    }

    let mut release_segments = 0;
    loop {
        let digits = leading_digits(rest);
        if digits == 0 {
            return None;
        }
        release_segments += 1;
        rest = &rest[digits..];
        match rest.strip_prefix('.') {
            Some(tail) if leading_digits(tail) > 0 => rest = tail,
            _ => break,
        }
    }

    let mut has_qualifiers = false;

    if let Some(tail) = strip_qualifier(rest, &PRE_LABELS) {
        rest = tail;
        has_qualifiers = true;
    }

    // Post release: `-N` or `[sep]post[sep]N`
    let implicit_post = rest
        .strip_prefix('-')
        .filter(|tail| leading_digits(tail) > 0);
    if let Some(tail) = implicit_post {
        rest = &tail[leading_digits(tail)..];
        has_qualifiers = true;
    } else if let Some(tail) = strip_qualifier(rest, &POST_LABELS) {
        rest = tail;
        has_qualifiers = true;
    }

    if let Some(tail) = strip_qualifier(rest, &DEV_LABELS) {
        rest = tail;
        has_qualifiers = true;
    }

    let mut has_local = false;
    if let Some(local) = rest.strip_prefix('+') {
        let valid = local
            .split(SEPARATORS)
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return None;
        }
        has_local = true;
        rest = "";
    }

    if !rest.is_empty() {
        return None;
    }

    Some(VersionShape {
        release_segments,
        has_qualifiers,
        has_local,
    })
}

fn leading_digits(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())
}

/// Strip `[sep]label[sep]N*` for the first matching label
fn strip_qualifier<'a>(s: &'a str, labels: &[&str]) -> Option<&'a str> {
    let unseparated = s.strip_prefix(SEPARATORS).unwrap_or(s);
    let label = labels.iter().find(|label| unseparated.starts_with(**label))?;
    let tail = &unseparated[label.len()..];
    let tail = tail.strip_prefix(SEPARATORS).unwrap_or(tail);
    Some(&tail[leading_digits(tail)..])
}

/// Environment marker variables accepted on the left or right of a comparison
const MARKER_VARIABLES: [&str; 18] = [
    "python_version",
    "python_full_version",
    "os_name",
    "sys_platform",
    "platform_release",
    "platform_system",
    "platform_version",
    "platform_machine",
    "platform_python_implementation",
    "implementation_name",
    "implementation_version",
    "extra",
    // Legacy spellings still accepted by pip
    "os.name",
    "sys.platform",
    "platform.version",
    "platform.machine",
    "platform.python_implementation",
    "python_implementation",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum MarkerToken {
    Open,
    Close,
    Str,
    Var,
    Op,
    And,
    Or,
}

fn parse_marker(expr: &str) -> Result<String, RequirementError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(RequirementError::InvalidMarker(
            "expected expression after ';'".to_string(),
        ));
    }

    let tokens = tokenize_marker(expr)?;
    let mut parser = MarkerParser {
        tokens: &tokens,
        pos: 0,
    };
    parser.or_expr()?;
    if parser.pos != tokens.len() {
        return Err(RequirementError::InvalidMarker(format!(
            "unexpected token in '{}'",
            expr
        )));
    }
    Ok(expr.to_string())
}

fn tokenize_marker(expr: &str) -> Result<Vec<MarkerToken>, RequirementError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(MarkerToken::Open);
            }
            ')' => {
                chars.next();
                tokens.push(MarkerToken::Close);
            }
            '\'' | '"' => {
                chars.next();
                let closed = chars.by_ref().any(|(_, ch)| ch == c);
                if !closed {
                    return Err(RequirementError::InvalidMarker(format!(
                        "unterminated string in '{}'",
                        expr
                    )));
                }
                tokens.push(MarkerToken::Str);
            }
            '<' | '>' | '=' | '!' | '~' => {
                let op = VERSION_OPERATORS
                    .iter()
                    .find(|op| expr[start..].starts_with(**op))
                    .ok_or_else(|| {
                        RequirementError::InvalidMarker(format!(
                            "invalid operator in '{}'",
                            expr
                        ))
                    })?;
                for _ in 0..op.len() {
                    chars.next();
                }
                tokens.push(MarkerToken::Op);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &expr[start..end];
                match word {
                    "and" => tokens.push(MarkerToken::And),
                    "or" => tokens.push(MarkerToken::Or),
                    "in" => tokens.push(MarkerToken::Op),
                    "not" => {
                        let followed_by_in = expr[end..].trim_start().starts_with("in")
                            && !expr[end..]
                                .trim_start()
                                .chars()
                                .nth(2)
                                .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                        if !followed_by_in {
                            return Err(RequirementError::InvalidMarker(format!(
                                "expected 'in' after 'not' in '{}'",
                                expr
                            )));
                        }
                        while chars.peek().is_some_and(|(_, ch)| ch.is_whitespace()) {
                            chars.next();
                        }
                        chars.next();
                        chars.next();
                        tokens.push(MarkerToken::Op);
                    }
                    _ if MARKER_VARIABLES.contains(&word) => tokens.push(MarkerToken::Var),
                    _ => {
                        return Err(RequirementError::InvalidMarker(format!(
                            "unknown marker variable '{}'",
                            word
                        )));
                    }
                }
            }
            _ => {
                return Err(RequirementError::InvalidMarker(format!(
                    "unexpected character '{}' in '{}'",
                    c, expr
                )));
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent over marker tokens; only checks structure
struct MarkerParser<'a> {
    tokens: &'a [MarkerToken],
    pos: usize,
}

impl MarkerParser<'_> {
    fn peek(&self) -> Option<&MarkerToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&MarkerToken> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<(), RequirementError> {
        self.and_expr()?;
        while self.peek() == Some(&MarkerToken::Or) {
            self.pos += 1;
            self.and_expr()?;
        }
        Ok(())
    }

    fn and_expr(&mut self) -> Result<(), RequirementError> {
        self.atom()?;
        while self.peek() == Some(&MarkerToken::And) {
            self.pos += 1;
            self.atom()?;
        }
        Ok(())
    }

    fn atom(&mut self) -> Result<(), RequirementError> {
        if self.peek() == Some(&MarkerToken::Open) {
            self.pos += 1;
            self.or_expr()?;
            return match self.advance() {
                Some(MarkerToken::Close) => Ok(()),
                _ => Err(RequirementError::InvalidMarker(
                    "missing closing ')'".to_string(),
                )),
            };
        }
        self.value()?;
        match self.advance() {
            Some(MarkerToken::Op) => {}
            _ => {
                return Err(RequirementError::InvalidMarker(
                    "expected comparison operator".to_string(),
                ));
            }
        }
        self.value()
    }

    fn value(&mut self) -> Result<(), RequirementError> {
        match self.advance() {
            Some(MarkerToken::Str | MarkerToken::Var) => Ok(()),
            _ => Err(RequirementError::InvalidMarker(
                "expected marker variable or quoted string".to_string(),
            )),
        }
    }
}
