//! A small text template language for rendering packages
//!
//! Supported actions:
//!
//! - `{{.Field.Sub}}`, `{{.}}`, `{{$.Field}}`, `{{$var.Field}}`: print a value
//! - `{{if .Flag}} ... {{else}} ... {{end}}`, `{{if not .Flag}}`
//! - `{{range .List}} ... {{else}} ... {{end}}`, `{{range $var := .List}}`
//! - `{{/* comment */}}`
//!
//! `{{-` trims whitespace before an action and `-}}` trims whitespace after it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

static ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(-?)(.*?)(-?)\}\}").expect("valid action regex"));

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").expect("valid variable regex"));

#[derive(Debug, Clone, PartialEq)]
enum Root {
    /// Current value (`.`)
    Dot,
    /// Top-level data (`$`)
    Data,
    /// Range variable (`$name`)
    Var(String),
}

#[derive(Debug, Clone, PartialEq)]
struct FieldPath {
    raw: String,
    root: Root,
    fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Print(FieldPath),
    If {
        negate: bool,
        condition: FieldPath,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        variable: Option<String>,
        list: FieldPath,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Action(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Terminator {
    Else,
    End,
}

/// A parsed template program
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse a template program; malformed programs fail with `TemplateError`
    pub fn parse(name: &str, source: &str) -> Result<Self> {
        let mut parser = Parser {
            name,
            tokens: tokenize(name, source)?,
            pos: 0,
        };

        let (nodes, terminator) = parser.parse_block()?;
        match terminator {
            Some(Terminator::Else) => return Err(parser.error("unexpected {{else}}")),
            Some(Terminator::End) => return Err(parser.error("unexpected {{end}}")),
            None => {}
        }

        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against any serializable model
    pub fn render_model<T: Serialize>(&self, model: &T) -> Result<String> {
        self.render(&serde_json::to_value(model)?)
    }

    /// Render against a JSON value; missing fields fail with `BindingError`
    pub fn render(&self, data: &Value) -> Result<String> {
        let mut out = String::new();
        let mut scope = Scope {
            template: &self.name,
            data,
            vars: Vec::new(),
        };
        scope.render_nodes(&self.nodes, data, &mut out)?;
        Ok(out)
    }
}

fn tokenize(name: &str, source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    let mut trim_next = false;

    for captures in ACTION.captures_iter(source) {
        let (Some(whole), Some(body)) = (captures.get(0), captures.get(2)) else {
            continue;
        };

        let mut text = &source[last..whole.start()];
        if trim_next {
            text = text.trim_start();
        }
        if captures.get(1).map_or(false, |m| !m.as_str().is_empty()) {
            text = text.trim_end();
        }
        check_unclosed(name, text)?;
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        tokens.push(Token::Action(body.as_str().trim().to_string()));
        trim_next = captures.get(3).map_or(false, |m| !m.as_str().is_empty());
        last = whole.end();
    }

    let mut text = &source[last..];
    if trim_next {
        text = text.trim_start();
    }
    check_unclosed(name, text)?;
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }

    Ok(tokens)
}

fn check_unclosed(name: &str, text: &str) -> Result<()> {
    if text.contains("{{") {
        return Err(Error::TemplateError {
            template: name.to_string(),
            message: "unclosed action".to_string(),
        });
    }
    Ok(())
}

struct Parser<'a> {
    name: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::TemplateError {
            template: self.name.to_string(),
            message: message.into(),
        }
    }

    /// Parse nodes until `else`, `end` or end of input
    fn parse_block(&mut self) -> Result<(Vec<Node>, Option<Terminator>)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;

            let action = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Action(action) => action,
            };

            if action.starts_with("/*") {
                if !action.ends_with("*/") {
                    return Err(self.error("unclosed comment"));
                }
                continue;
            }

            match action.as_str() {
                "else" => return Ok((nodes, Some(Terminator::Else))),
                "end" => return Ok((nodes, Some(Terminator::End))),
                _ => {}
            }

            if let Some(rest) = action.strip_prefix("if ") {
                nodes.push(self.parse_if(rest.trim())?);
            } else if let Some(rest) = action.strip_prefix("range ") {
                nodes.push(self.parse_range(rest.trim())?);
            } else if action.starts_with('.') || action.starts_with('$') {
                nodes.push(Node::Print(self.parse_path(&action)?));
            } else {
                return Err(self.error(format!("unknown action {{{{{}}}}}", action)));
            }
        }

        Ok((nodes, None))
    }

    fn parse_if(&mut self, expression: &str) -> Result<Node> {
        let (negate, expression) = match expression.strip_prefix("not ") {
            Some(rest) => (true, rest.trim()),
            None => (false, expression),
        };
        let condition = self.parse_path(expression)?;
        let (then, otherwise) = self.parse_branches("if")?;

        Ok(Node::If {
            negate,
            condition,
            then,
            otherwise,
        })
    }

    fn parse_range(&mut self, expression: &str) -> Result<Node> {
        let (variable, expression) = match expression.split_once(":=") {
            Some((variable, rest)) => {
                let variable = variable.trim();
                if !VARIABLE.is_match(variable) {
                    return Err(self.error(format!("invalid range variable '{}'", variable)));
                }
                (Some(variable[1..].to_string()), rest.trim())
            }
            None => (None, expression),
        };
        let list = self.parse_path(expression)?;
        let (body, otherwise) = self.parse_branches("range")?;

        Ok(Node::Range {
            variable,
            list,
            body,
            otherwise,
        })
    }

    fn parse_branches(&mut self, action: &str) -> Result<(Vec<Node>, Vec<Node>)> {
        let (first, terminator) = self.parse_block()?;
        match terminator {
            Some(Terminator::End) => Ok((first, Vec::new())),
            Some(Terminator::Else) => match self.parse_block()? {
                (second, Some(Terminator::End)) => Ok((first, second)),
                (_, Some(Terminator::Else)) => {
                    Err(self.error(format!("{} has more than one else", action)))
                }
                (_, None) => Err(self.error(format!("unclosed {}", action))),
            },
            None => Err(self.error(format!("unclosed {}", action))),
        }
    }

    fn parse_path(&self, expression: &str) -> Result<FieldPath> {
        let invalid = || self.error(format!("invalid field path '{}'", expression));

        if expression.is_empty() || expression.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let (root, rest) = if expression == "." {
            (Root::Dot, "")
        } else if let Some(rest) = expression.strip_prefix("$.") {
            (Root::Data, rest)
        } else if expression == "$" {
            (Root::Data, "")
        } else if let Some(rest) = expression.strip_prefix('$') {
            let (variable, fields) = rest.split_once('.').unwrap_or((rest, ""));
            (Root::Var(variable.to_string()), fields)
        } else if let Some(rest) = expression.strip_prefix('.') {
            (Root::Dot, rest)
        } else {
            return Err(invalid());
        };

        let fields: Vec<String> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('.').map(str::to_string).collect()
        };
        if fields.iter().any(|f| f.is_empty()) {
            return Err(invalid());
        }

        Ok(FieldPath {
            raw: expression.to_string(),
            root,
            fields,
        })
    }
}

struct Scope<'a> {
    template: &'a str,
    data: &'a Value,
    vars: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    fn render_nodes(&mut self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Print(path) => {
                    let value = self.lookup(path, dot)?;
                    out.push_str(&display(&value));
                }
                Node::If {
                    negate,
                    condition,
                    then,
                    otherwise,
                } => {
                    let truthy = is_truthy(&self.lookup(condition, dot)?) != *negate;
                    self.render_nodes(if truthy { then } else { otherwise }, dot, out)?;
                }
                Node::Range {
                    variable,
                    list,
                    body,
                    otherwise,
                } => {
                    let items = match self.lookup(list, dot)? {
                        Value::Array(items) => items,
                        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                        Value::Null => Vec::new(),
                        _ => {
                            return Err(Error::TemplateError {
                                template: self.template.to_string(),
                                message: format!("range can't iterate over {}", list.raw),
                            })
                        }
                    };

                    if items.is_empty() {
                        self.render_nodes(otherwise, dot, out)?;
                        continue;
                    }

                    for item in &items {
                        if let Some(name) = variable {
                            self.vars.push((name.clone(), item.clone()));
                        }
                        let result = self.render_nodes(body, item, out);
                        if variable.is_some() {
                            self.vars.pop();
                        }
                        result?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, path: &FieldPath, dot: &Value) -> Result<Value> {
        let mut current = match &path.root {
            Root::Dot => dot,
            Root::Data => self.data,
            Root::Var(name) => self
                .vars
                .iter()
                .rev()
                .find(|(var, _)| var == name)
                .map(|(_, value)| value)
                .ok_or_else(|| self.missing(path))?,
        };

        for field in &path.fields {
            current = current
                .as_object()
                .and_then(|map| map.get(field))
                .ok_or_else(|| self.missing(path))?;
        }

        Ok(current.clone())
    }

    fn missing(&self, path: &FieldPath) -> Error {
        Error::BindingError {
            template: self.template.to_string(),
            path: path.raw.clone(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
