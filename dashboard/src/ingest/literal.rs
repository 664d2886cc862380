//! Structured-literal reader for `.py` inputs.
//!
//! The file is never executed. It must contain a top-level binding
//! `data = <literal>`, where the literal is a dict or list written with
//! Python literal syntax: strings in either quote style, numbers,
//! `True`/`False`/`None`/`nan`, tuples, `#` comments and trailing commas.
//! The literal may be wrapped in a single constructor call such as
//! `pd.DataFrame({...})`. The parsed value goes through the same layouts as
//! the JSON reader.
//!
//! When the file binds `data` more than once, the last binding wins.

use std::path::Path;

use serde_json::{Map, Number, Value};

use super::json::table_from_json;
use super::{IngestError, InputFormat};
use crate::table::Table;

const BINDING: &str = "data";

/// Deepest container nesting accepted in a literal.
const MAX_DEPTH: usize = 128;

pub fn read_literal(path: &Path) -> Result<Table, IngestError> {
    let source = std::fs::read_to_string(path)?;
    let value = parse_data_binding(&source)?;
    table_from_json(value, InputFormat::Literal)
}

/// Locate the `data = ...` binding and parse its literal.
pub(crate) fn parse_data_binding(source: &str) -> Result<Value, IngestError> {
    let expression = find_binding(source).ok_or(IngestError::MissingVariable)?;
    let mut parser = LiteralParser::new(expression);
    parser
        .parse_binding()
        .map_err(|e| IngestError::parse(InputFormat::Literal, e))
}

/// Text after the `=` of the last top-level `data = ` line.
fn find_binding(source: &str) -> Option<&str> {
    let mut found = None;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix(BINDING) {
            let trimmed = rest.trim_start_matches([' ', '\t']);
            if let Some(after) = trimmed.strip_prefix('=') {
                if !after.starts_with('=') {
                    let start = offset + (line.len() - after.len());
                    found = Some(&source[start..]);
                }
            }
        }
        offset += line.len();
    }
    found
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    /// Optional `ctor(` prefix, then one dict or list literal.
    fn parse_binding(&mut self) -> Result<Value, String> {
        self.skip_trivia();
        let checkpoint = self.pos;
        let wrapped = match self.peek() {
            Some(c) if is_ident_start(c) => {
                let name = self.identifier();
                self.skip_trivia();
                if self.peek() == Some('(') {
                    self.bump();
                    true
                } else {
                    self.pos = checkpoint;
                    if !matches!(name, "None" | "True" | "False" | "nan") {
                        return Err(format!("unsupported expression `{}`", name));
                    }
                    false
                }
            }
            _ => false,
        };

        let value = self.value()?;
        if !matches!(value, Value::Object(_) | Value::Array(_)) {
            return Err("data must be a dict or list literal".to_string());
        }

        if wrapped {
            self.skip_trivia();
            if self.peek() == Some(',') {
                self.bump();
                self.skip_trivia();
            }
            self.expect(')')?;
        }
        Ok(value)
    }

    fn value(&mut self) -> Result<Value, String> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.nested(|p| p.dict()),
            Some('[') => self.nested(|p| p.sequence('[', ']')),
            Some('(') => self.nested(|p| p.sequence('(', ')')),
            Some('\'') | Some('"') => self.string().map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if is_ident_start(c) => {
                let name = self.identifier();
                match name {
                    "None" | "nan" | "NaN" | "inf" => Ok(Value::Null),
                    "True" => Ok(Value::Bool(true)),
                    "False" => Ok(Value::Bool(false)),
                    other => Err(format!(
                        "unsupported expression `{}` at offset {}",
                        other, self.pos
                    )),
                }
            }
            Some(c) => Err(format!("unexpected character `{}` at offset {}", c, self.pos)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, String>,
    ) -> Result<Value, String> {
        if self.depth >= MAX_DEPTH {
            return Err("literal nested too deeply".to_string());
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn dict(&mut self) -> Result<Value, String> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(true) => "True".to_string(),
                Value::Bool(false) => "False".to_string(),
                other => return Err(format!("unsupported dict key {}", other)),
            };
            self.skip_trivia();
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.separator('}')?;
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value, String> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.separator(close)?;
        }
    }

    /// After an element: either `,` or the closing bracket (left unconsumed).
    fn separator(&mut self, close: char) -> Result<(), String> {
        self.skip_trivia();
        match self.peek() {
            Some(',') => {
                self.bump();
                Ok(())
            }
            Some(c) if c == close => Ok(()),
            Some(c) => Err(format!(
                "expected `,` or `{}`, found `{}` at offset {}",
                close, c, self.pos
            )),
            None => Err(format!("unterminated literal, expected `{}`", close)),
        }
    }

    fn string(&mut self) -> Result<String, String> {
        let quote = self.bump().ok_or("unexpected end of input")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err("unterminated string literal".to_string()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err("unterminated string literal".to_string()),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-') {
                self.bump();
            } else {
                break;
            }
        }
        let raw: String = self.src[start..self.pos].chars().filter(|&c| c != '_').collect();

        if let Ok(i) = raw.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        match raw.parse::<f64>() {
            Ok(f) => Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
            Err(_) => Err(format!("invalid number `{}` at offset {}", raw, start)),
        }
    }

    /// Dotted identifier, e.g. `pd.DataFrame`.
    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.bump();
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '\\' {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(format!(
                "expected `{}`, found `{}` at offset {}",
                expected, c, self.pos
            )),
            None => Err(format!("expected `{}`, found end of input", expected)),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_plain_dict_literal() {
        let value = parse_data_binding("data = {'a': [1, 2], \"b\": ['x', 'y']}\n").unwrap();
        assert_eq!(value, json!({"a": [1, 2], "b": ["x", "y"]}));
    }

    #[test]
    fn test_constructor_wrapper_and_python_tokens() {
        let source = r#"
import pandas as pd

# sample frame
data = pd.DataFrame({
    'score': [1.5, None, 3],   # trailing comment
    'ok': (True, False, True),
})
print(data)
"#;
        let value = parse_data_binding(source).unwrap();
        assert_eq!(
            value,
            json!({"score": [1.5, null, 3], "ok": [true, false, true]})
        );
    }

    #[test]
    fn test_last_binding_wins() {
        let value = parse_data_binding("data = [{'a': 1}]\ndata = [{'a': 2}]\n").unwrap();
        assert_eq!(value, json!([{"a": 2}]));
    }

    #[test]
    fn test_comparison_is_not_binding() {
        let result = parse_data_binding("data == 3\n");
        assert!(matches!(result, Err(IngestError::MissingVariable)));
    }

    #[test]
    fn test_missing_binding() {
        let result = parse_data_binding("frame = {'a': [1]}\n");
        assert!(matches!(result, Err(IngestError::MissingVariable)));
    }

    #[test]
    fn test_code_is_rejected() {
        let result = parse_data_binding("data = load_frame('x.csv')\n");
        assert!(matches!(result, Err(IngestError::Parse { .. })));

        let result = parse_data_binding("data = __import__('os').system('true')\n");
        assert!(matches!(result, Err(IngestError::Parse { .. })));

        let result = parse_data_binding("data = {'a': [open('x')]}\n");
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let source = format!("data = {}", "[".repeat(200_000));
        match parse_data_binding(&source) {
            Err(IngestError::Parse { message, .. }) => {
                assert_eq!(message, "literal nested too deeply")
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let within = format!("data = {}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_data_binding(&within).is_ok());
    }

    #[test]
    fn test_scalar_binding_rejected() {
        let result = parse_data_binding("data = 42\n");
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn test_string_escapes() {
        let value = parse_data_binding(r#"data = {'q': ['it\'s', "say \"hi\""]}"#).unwrap();
        assert_eq!(value, json!({"q": ["it's", "say \"hi\""]}));
    }

    #[test]
    fn test_numeric_forms() {
        let value = parse_data_binding("data = {'n': [1_000, -2, 3.5e2, nan]}").unwrap();
        assert_eq!(value, json!({"n": [1000, -2, 350.0, null]}));
    }

    #[test]
    fn test_read_literal_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frame.py");
        std::fs::write(&path, "data = {'age': [31, 47], 'city': ['Lyon', 'Oslo']}\n").unwrap();

        let table = read_literal(&path).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("age").unwrap().column_type(), ColumnType::Int64);
        assert_eq!(table.column("city").unwrap().column_type(), ColumnType::Text);
    }
}
