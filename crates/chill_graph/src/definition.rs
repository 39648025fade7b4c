// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions read from script sources.
//!
//! A definition is a script whose socket declarations are found by pattern:
//!
//! ```text
//! input("radius", "scalar", 1.0, 0.0, 10.0)
//! param("label", "string", "hello")
//! output("shape", "shape", true)
//! emit(shape)
//! ```
//!
//! `param` declares a data-only input, the optional third `output` argument
//! marks it emitable, and any `emit(` call makes the node an emitter. A
//! declaration must start its line, optionally as an assignment; whatever
//! follows its closing parenthesis is ignored. A declaration that cannot be
//! read is logged and skipped.

use crate::io_type::IoType;
use crate::processor::Processor;
use crate::socket::{ArgValue, Input, Output};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:local[ \t]+)?[A-Za-z_][A-Za-z0-9_]*[ \t]*=[ \t]*)?(input|param|output)[ \t]*\((.*)$",
    )
        .unwrap_or_else(|e| unreachable!("invalid declaration pattern: {e}"))
});

static EMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bemit[ \t]*\(").unwrap_or_else(|e| unreachable!("invalid emit pattern: {e}"))
});

/// Error reading one declaration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// String literal without closing quote
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Braced list without closing brace
    #[error("Unterminated list")]
    UnterminatedList,

    /// Declaration call without closing parenthesis on its line
    #[error("Unclosed declaration call")]
    UnclosedCall,

    /// Token that is not a literal
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),

    /// First argument is not a string
    #[error("Missing socket name")]
    MissingName,

    /// Second argument is not a known type
    #[error("Unknown socket type '{0}'")]
    UnknownType(String),
}

/// Parsed node definition
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    /// Node name
    pub name: String,
    /// Menu category (e.g. the folder it was found in)
    pub category: String,
    /// Declared inputs, in order
    pub inputs: Vec<Input>,
    /// Declared outputs, in order
    pub outputs: Vec<Output>,
    /// Whether the node calls `emit`
    pub emits: bool,
    /// Script body
    pub code: String,
    /// Declarations that were skipped
    pub skipped: usize,
}

impl NodeDefinition {
    /// Read a definition from its source
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let name = name.into();
        let mut definition = Self {
            name,
            category: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            emits: EMIT.is_match(source),
            code: source.to_string(),
            skipped: 0,
        };

        for captures in DECLARATION.captures_iter(source) {
            let keyword = &captures[1];
            let result = call_arguments(&captures[2])
                .and_then(parse_args)
                .and_then(|args| definition.declare(keyword, &args));
            if let Err(e) = result {
                tracing::warn!(
                    node = %definition.name,
                    declaration = %captures[0].trim(),
                    "skipping declaration: {e}"
                );
                definition.skipped += 1;
            }
        }
        definition
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    fn declare(&mut self, keyword: &str, args: &[ArgValue]) -> Result<(), DefinitionError> {
        let Some(ArgValue::Text(name)) = args.first() else {
            return Err(DefinitionError::MissingName);
        };
        let ty = match args.get(1) {
            Some(ArgValue::Text(ty)) => {
                IoType::from_name(ty).ok_or_else(|| DefinitionError::UnknownType(ty.clone()))?
            }
            Some(other) => return Err(DefinitionError::UnknownType(format!("{other:?}"))),
            None => IoType::Undef,
        };
        let rest = args.get(2..).unwrap_or_default();

        match keyword {
            "output" => {
                let mut output = Output::new(name.as_str(), ty);
                output.emitable = matches!(rest.first(), Some(ArgValue::Bool(true)));
                self.outputs.push(output);
            }
            _ => {
                let mut input = Input::from_args(name.as_str(), ty, rest);
                input.data_only = keyword == "param";
                self.inputs.push(input);
            }
        }
        Ok(())
    }

    /// Build a script processor with fresh copies of the declared sockets
    pub fn instantiate(&self) -> Processor {
        let mut p = Processor::script(self.name.clone(), self.code.clone());
        for input in &self.inputs {
            p.add_input(input.duplicate());
        }
        for output in &self.outputs {
            p.add_output(output.duplicate());
        }
        p.emit = self.emits;
        p
    }
}

/// Text between the opening parenthesis of a call and its matching close
fn call_arguments(rest: &str) -> Result<&str, DefinitionError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => return Ok(&rest[..i]),
            ')' => depth -= 1,
            _ => {}
        }
    }
    if quote.is_some() {
        Err(DefinitionError::UnterminatedString)
    } else {
        Err(DefinitionError::UnclosedCall)
    }
}

/// Parse a comma-separated argument list
pub fn parse_args(text: &str) -> Result<Vec<ArgValue>, DefinitionError> {
    let mut lexer = Lexer {
        chars: text.chars().collect(),
        pos: 0,
    };
    let args = lexer.list(None)?;
    lexer.skip_ws();
    match lexer.peek() {
        None => Ok(args),
        Some(c) => Err(DefinitionError::UnexpectedToken(c.to_string())),
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Values separated by commas, up to `close` (or end of input)
    fn list(&mut self, close: Option<char>) -> Result<Vec<ArgValue>, DefinitionError> {
        let mut values = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None if close.is_some() => return Err(DefinitionError::UnterminatedList),
                None => return Ok(values),
                Some(c) if Some(c) == close => {
                    self.pos += 1;
                    return Ok(values);
                }
                Some(_) => values.push(self.value()?),
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if Some(c) == close => {}
                None if close.is_none() => {}
                None => return Err(DefinitionError::UnterminatedList),
                Some(c) => return Err(DefinitionError::UnexpectedToken(c.to_string())),
            }
        }
    }

    fn value(&mut self) -> Result<ArgValue, DefinitionError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.string(q).map(ArgValue::Text)
            }
            Some('{') => {
                self.pos += 1;
                self.list(Some('}')).map(ArgValue::Array)
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
                {
                    self.pos += 1;
                }
                let word: String = self.chars[start..self.pos].iter().collect();
                match word.as_str() {
                    "true" => Ok(ArgValue::Bool(true)),
                    "false" => Ok(ArgValue::Bool(false)),
                    "nil" => Ok(ArgValue::Nil),
                    _ => word.parse::<f64>().map(ArgValue::Number).map_err(|_| {
                        let token = if word.is_empty() {
                            self.peek().map(String::from).unwrap_or_default()
                        } else {
                            word.clone()
                        };
                        DefinitionError::UnexpectedToken(token)
                    }),
                }
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, DefinitionError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    let escaped = self.peek().ok_or(DefinitionError::UnterminatedString)?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(DefinitionError::UnterminatedString)
    }
}

/// Registry of available node definitions
#[derive(Debug, Default)]
pub struct NodeLibrary {
    /// Registered definitions by name
    definitions: IndexMap<String, NodeDefinition>,
}

impl NodeLibrary {
    /// Create a new empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any with the same name
    pub fn register(&mut self, definition: NodeDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Option<&NodeDefinition> {
        self.definitions.get(name)
    }

    /// All definitions
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values()
    }

    /// Definitions in a category
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a NodeDefinition> {
        self.definitions.values().filter(move |d| d.category == category)
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Create a processor from a definition name
    pub fn instantiate(&self, name: &str) -> Option<Processor> {
        self.get(name).map(NodeDefinition::instantiate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::SocketValue;

    const SPHERE: &str = r#"
radius = input("radius", "scalar", 1.0, 0.0, 10.0)
center = input('center', "vec3", {0, 0, 1})
param("label", "string", "a \"quoted\" name")
output("shape", "shape", true)
output("volume", "scalar")
emit(sphere(radius, center))
"#;

    #[test]
    fn test_parse_arguments() {
        let args = parse_args(r#""a", 1.5, -2, true, nil, {1, {"x"}}"#).unwrap();
        assert_eq!(
            args,
            vec![
                ArgValue::Text("a".into()),
                ArgValue::Number(1.5),
                ArgValue::Number(-2.0),
                ArgValue::Bool(true),
                ArgValue::Nil,
                ArgValue::Array(vec![
                    ArgValue::Number(1.0),
                    ArgValue::Array(vec![ArgValue::Text("x".into())]),
                ]),
            ]
        );
        assert_eq!(parse_args("").unwrap(), Vec::new());
        assert_eq!(parse_args("\"open"), Err(DefinitionError::UnterminatedString));
        assert_eq!(parse_args("{1, 2"), Err(DefinitionError::UnterminatedList));
    }

    #[test]
    fn test_parse_definition() {
        let def = NodeDefinition::parse("sphere", SPHERE);
        assert_eq!(def.skipped, 0);
        assert!(def.emits);

        let names: Vec<&str> = def.inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["radius", "center", "label"]);
        assert!(def.inputs[2].data_only);
        assert_eq!(def.inputs[1].literal(), "{0.0, 0.0, 1.0}");
        match def.inputs[0].value() {
            SocketValue::Scalar(n) => assert_eq!((n.get(), n.min(), n.max()), (1.0, 0.0, 10.0)),
            other => panic!("unexpected value {other:?}"),
        }

        assert_eq!(def.outputs.len(), 2);
        assert!(def.outputs[0].emitable);
        assert!(!def.outputs[1].emitable);
    }

    #[test]
    fn test_malformed_declarations_skipped() {
        let def = NodeDefinition::parse(
            "broken",
            "input(\"a\", \"teapot\")\ninput(42)\ninput(\"ok\", \"int\", 3)\noutput(\"o\", \"shape\"\n",
        );
        assert_eq!(def.skipped, 3);
        assert_eq!(def.inputs.len(), 1);
        assert!(def.outputs.is_empty());
    }

    #[test]
    fn test_text_after_declaration_ignored() {
        let def = NodeDefinition::parse(
            "offset",
            "x = input(\"a\", \"scalar\") + f(1)\noutput(\"o\", \"string\", false) -- note (sic)\nparam(\"p)\", \"int\", max(1, 2));\n",
        );
        assert_eq!(def.skipped, 1);
        let names: Vec<&str> = def.inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a"]);
        assert_eq!(def.outputs.len(), 1);
        assert_eq!(call_arguments("\"p)\", \"int\") + 1"), Ok("\"p)\", \"int\""));
        assert_eq!(call_arguments("\"a\", (1"), Err(DefinitionError::UnclosedCall));
    }

    #[test]
    fn test_instantiate_gets_fresh_sockets() {
        let def = NodeDefinition::parse("sphere", SPHERE);
        let a = def.instantiate();
        let b = def.instantiate();
        assert!(a.emit);
        assert_eq!(a.inputs().len(), 3);
        assert_ne!(a.inputs()[0].id, b.inputs()[0].id);
        assert_eq!(a.inputs()[0].owner(), Some(a.id));
    }

    #[test]
    fn test_declarations_round_trip_through_scripts() {
        let def = NodeDefinition::parse("sphere", SPHERE);
        let p = def.instantiate();
        let script = p.to_script();
        let reparsed = NodeDefinition::parse("sphere", &script);

        assert_eq!(reparsed.skipped, 0);
        assert_eq!(reparsed.inputs.len(), def.inputs.len());
        for (a, b) in reparsed.inputs.iter().zip(&def.inputs) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.value(), b.value());
            assert_eq!(a.data_only, b.data_only);
        }
        assert_eq!(reparsed.outputs[0].emitable, def.outputs[0].emitable);
    }

    #[test]
    fn test_library_lookup() {
        let mut library = NodeLibrary::new();
        library.register(NodeDefinition::parse("sphere", SPHERE).with_category("primitives"));
        library.register(NodeDefinition::parse("union", "output(\"s\", \"shape\")"));

        assert_eq!(library.len(), 2);
        assert_eq!(library.in_category("primitives").count(), 1);
        assert!(library.instantiate("sphere").is_some());
        assert!(library.instantiate("cube").is_none());
    }
}
