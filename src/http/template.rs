//! URI templates (a subset of RFC 6570).
//!
//! Supported expressions:
//! - `{id}` / `{a,b}`: simple string expansion. Variables are required.
//! - `{?a,b}`: form-style query. Absent variables are left out.
//! - `{&a,b}`: query continuation. Absent variables are left out.

use crate::content::Parameters;
use crate::error::ComposerError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Query,
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression { operator: Operator, names: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, ComposerError> {
        let mut parts = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    parts.push(Part::Literal(rest.to_string()));
                    break;
                }
                Some(idx) if rest[idx..].starts_with('}') => {
                    return Err(ComposerError::InvalidTemplate(format!(
                        "unmatched '}}' in '{}'",
                        template
                    )));
                }
                Some(open) => {
                    if open > 0 {
                        parts.push(Part::Literal(rest[..open].to_string()));
                    }
                    let close = rest[open..].find('}').map(|i| open + i).ok_or_else(|| {
                        ComposerError::InvalidTemplate(format!("unclosed '{{' in '{}'", template))
                    })?;
                    parts.push(parse_expression(&rest[open + 1..close], template)?);
                    rest = &rest[close + 1..];
                }
            }
        }

        Ok(Self {
            template: template.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// All variable names, in declaration order.
    pub fn variables(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Expression { names, .. } => Some(names.iter().map(String::as_str)),
                Part::Literal(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn expand(&self, parameters: &Parameters) -> Result<String, ComposerError> {
        let mut out = String::with_capacity(self.template.len());
        let mut missing = Vec::new();

        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression {
                    operator: Operator::Simple,
                    names,
                } => {
                    let mut values = Vec::with_capacity(names.len());
                    for name in names {
                        match parameters.get_string(name) {
                            Some(value) => values.push(urlencoding::encode(value).into_owned()),
                            None => missing.push(name.clone()),
                        }
                    }
                    out.push_str(&values.join(","));
                }
                Part::Expression { operator, names } => {
                    let pairs: Vec<String> = names
                        .iter()
                        .filter_map(|name| {
                            parameters
                                .get_string(name)
                                .map(|value| format!("{}={}", name, urlencoding::encode(value)))
                        })
                        .collect();
                    if !pairs.is_empty() {
                        out.push(if *operator == Operator::Query { '?' } else { '&' });
                        out.push_str(&pairs.join("&"));
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(out)
        } else {
            Err(ComposerError::MissingTemplateVariables(missing))
        }
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_expression(expression: &str, template: &str) -> Result<Part, ComposerError> {
    let (operator, body) = match expression.chars().next() {
        Some('?') => (Operator::Query, &expression[1..]),
        Some('&') => (Operator::Continuation, &expression[1..]),
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => (Operator::Simple, expression),
        _ => {
            return Err(ComposerError::InvalidTemplate(format!(
                "unsupported expression '{{{}}}' in '{}'",
                expression, template
            )))
        }
    };

    let names: Vec<String> = body.split(',').map(|name| name.trim().to_string()).collect();
    if names.iter().any(|name| !is_valid_name(name)) {
        return Err(ComposerError::InvalidTemplate(format!(
            "invalid variable name in '{{{}}}' of '{}'",
            expression, template
        )));
    }
    Ok(Part::Expression { operator, names })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
