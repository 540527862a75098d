//! USDA (ASCII) layer reader.
//!
//! Line-oriented reader for the parts of a layer the viewer needs: the
//! header metadata block (time range, frame rate, up axis) and the prim
//! hierarchy with simple attribute values. Anything it does not understand
//! is skipped by brace depth.
//!
//! # Supported Syntax
//!
//! - `#usda 1.0` header followed by an optional `( ... )` metadata block
//! - `def|over|class [Type] "Name" [( metadata )] { ... }`
//! - scalar, tuple, tuple-array, token and string attribute values
//! - `name.timeSamples = { time: value, ... }`
//! - `rel`, `variantSet` and other blocks are skipped

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;
use usdview_math::{DVec3, UpAxis};

use super::types::*;
use crate::tokens::Tokens;

/// Errors that can occur during USDA parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Missing `#usda` header")]
    MissingHeader,

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unexpected end of file")]
    UnexpectedEof,

    #[error("Invalid number format: {0}")]
    InvalidNumber(String),

    #[error("Unclosed block starting at line {0}")]
    UnclosedBlock(usize),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Attribute qualifiers that may precede the type name.
const QUALIFIERS: &[&str] = &["uniform", "custom", "varying", "config"];

/// Attribute types holding three components.
const VEC3_TYPES: &[&str] = &[
    "double3", "float3", "half3", "int3", "point3f", "point3d", "point3h", "normal3f",
    "normal3d", "vector3f", "vector3d", "color3f", "color3d", "texCoord3f",
];

/// Attribute types holding a single number.
const SCALAR_TYPES: &[&str] = &[
    "double", "float", "half", "int", "uint", "int64", "uint64", "timecode", "bool",
];

/// USDA layer parser.
pub struct UsdaParser<'t> {
    lines: VecDeque<(usize, String)>,
    tokens: &'t Tokens,
}

impl<'t> UsdaParser<'t> {
    /// Create a new parser from file contents.
    pub fn new(content: &str, tokens: &'t Tokens) -> Self {
        let lines: VecDeque<_> = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, s.to_string()))
            .collect();

        Self { lines, tokens }
    }

    /// Parse the whole layer.
    pub fn parse(&mut self) -> ParseResult<Layer> {
        let metadata = self.parse_header()?;

        let mut root_prims = Vec::new();
        while let Some((line_num, line)) = self.next_content_line() {
            let trimmed = line.trim();
            if is_prim_header(trimmed) {
                root_prims.push(self.parse_def(trimmed, "", line_num)?);
            } else if opens_block(trimmed) {
                self.skip_block(line_num)?;
            }
        }

        Ok(Layer {
            metadata,
            root_prims,
        })
    }

    /// Pop the next line that is neither blank nor a comment.
    fn next_content_line(&mut self) -> Option<(usize, String)> {
        while let Some((num, line)) = self.lines.pop_front() {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                return Some((num, line));
            }
        }
        None
    }

    /// Peek at the next content line without consuming it.
    fn peek_content_line(&mut self) -> Option<&str> {
        while let Some((_, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.pop_front();
            } else {
                break;
            }
        }
        self.lines.front().map(|(_, line)| line.trim())
    }

    /// Parse `#usda 1.0` and the optional layer metadata block.
    fn parse_header(&mut self) -> ParseResult<LayerMetadata> {
        let first = loop {
            match self.lines.pop_front() {
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((_, line)) => break line,
                None => return Err(ParseError::MissingHeader),
            }
        };
        if !first.trim_start_matches('\u{feff}').trim().starts_with("#usda") {
            return Err(ParseError::MissingHeader);
        }

        let mut metadata = LayerMetadata::default();

        let opens_metadata = matches!(self.peek_content_line(), Some(l) if l.starts_with('('));
        if !opens_metadata {
            return Ok(metadata);
        }

        let Some((start_line, line)) = self.next_content_line() else {
            return Ok(metadata);
        };
        let entries = self.collect_metadata_block(line.trim(), start_line)?;
        for (key, value) in entries {
            apply_layer_metadata(&mut metadata, &key, &value, start_line)?;
        }

        Ok(metadata)
    }

    /// Collect `key = value` entries of a `( ... )` block whose opening line
    /// is `first`. Multi-line strings, arrays and dictionaries are folded
    /// into a single value.
    fn collect_metadata_block(
        &mut self,
        first: &str,
        start_line: usize,
    ) -> ParseResult<Vec<(String, String)>> {
        let inner_first = first.strip_prefix('(').unwrap_or(first).trim();

        // Single-line block: ( key = value )
        if let Some(inner) = inner_first.strip_suffix(')') {
            return Ok(parse_inline_entries(inner));
        }

        let mut raw_lines: Vec<String> = Vec::new();
        if !inner_first.is_empty() {
            raw_lines.push(inner_first.to_string());
        }

        let mut in_triple_quote = inner_first.matches("\"\"\"").count() % 2 == 1;
        loop {
            let Some((_, line)) = self.lines.pop_front() else {
                return Err(ParseError::UnclosedBlock(start_line));
            };
            let trimmed = line.trim();
            if !in_triple_quote && trimmed.starts_with(')') {
                break;
            }
            if trimmed.matches("\"\"\"").count() % 2 == 1 {
                in_triple_quote = !in_triple_quote;
            }
            raw_lines.push(line);
        }

        Ok(fold_entries(&raw_lines))
    }

    /// Parse a `def Type "Name" ... { ... }` block.
    fn parse_def(&mut self, line: &str, parent_path: &str, start_line: usize) -> ParseResult<PrimSpec> {
        let mut words = line.splitn(2, char::is_whitespace);
        let keyword = words.next().unwrap_or_default();
        let rest = words.next().unwrap_or_default();
        let specifier = Specifier::from_keyword(keyword).ok_or_else(|| ParseError::Parse {
            line: start_line,
            message: format!("expected prim specifier, found `{keyword}`"),
        })?;

        let (quote_start, quote_end) = match rest.find('"') {
            Some(start) => match rest[start + 1..].find('"') {
                Some(len) => (start, start + 1 + len),
                None => {
                    return Err(ParseError::Parse {
                        line: start_line,
                        message: "unterminated prim name".to_string(),
                    })
                }
            },
            None => {
                return Err(ParseError::Parse {
                    line: start_line,
                    message: "missing prim name".to_string(),
                })
            }
        };
        let type_name = rest[..quote_start].trim();
        let name = &rest[quote_start + 1..quote_end];
        let mut after = rest[quote_end + 1..].trim().to_string();

        let path = if parent_path.is_empty() {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_path, name)
        };

        let mut prim = PrimSpec {
            path,
            name: name.to_string(),
            specifier,
            type_name: self.tokens.resolve(type_name),
            metadata: BTreeMap::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        };

        // Metadata on its own line: def Xform "Name"\n(\n ... \n)
        if after.is_empty() && matches!(self.peek_content_line(), Some(l) if l.starts_with('(')) {
            if let Some((_, next)) = self.next_content_line() {
                after = next.trim().to_string();
            }
        }

        if after.starts_with('(') {
            after = self.consume_prim_metadata(&mut prim, &after, start_line)?;
        }

        // Opening brace on its own line
        if after.is_empty() {
            match self.next_content_line() {
                Some((_, next)) if next.trim().starts_with('{') => after = next.trim().to_string(),
                Some((num, next)) => {
                    return Err(ParseError::Parse {
                        line: num,
                        message: format!("expected '{{', found `{}`", next.trim()),
                    })
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        let Some(body) = after.strip_prefix('{') else {
            return Err(ParseError::Parse {
                line: start_line,
                message: format!("expected '{{' after prim `{}`", prim.path),
            });
        };

        // Whole body on one line: def Sphere "S" { double radius = 2 }
        if let Some(inline) = body.trim().strip_suffix('}') {
            let inline = inline.trim();
            if !inline.is_empty() {
                self.parse_attribute(&mut prim, inline, start_line)?;
            }
            return Ok(prim);
        }

        self.parse_prim_body(&mut prim, start_line)?;
        Ok(prim)
    }

    /// Consume a prim metadata block beginning at `text` and return
    /// whatever follows the closing parenthesis.
    fn consume_prim_metadata(
        &mut self,
        prim: &mut PrimSpec,
        text: &str,
        start_line: usize,
    ) -> ParseResult<String> {
        // Inline: ( kind = "component" ) {
        let mut depth = paren_delta(text);
        if depth <= 0 {
            if let Some(close) = text.rfind(')') {
                let inner = &text[1..close];
                for (key, value) in parse_inline_entries(inner) {
                    prim.metadata.insert(key, strip_quotes(&value).to_string());
                }
                return Ok(text[close + 1..].trim().to_string());
            }
        }

        let inner_first = text[1..].trim();
        let mut raw_lines = Vec::new();
        if !inner_first.is_empty() {
            raw_lines.push(inner_first.to_string());
        }

        let remainder = loop {
            let Some((_, line)) = self.lines.pop_front() else {
                return Err(ParseError::UnclosedBlock(start_line));
            };
            depth += paren_delta(&line);
            if depth <= 0 {
                let trimmed = line.trim();
                let after_close = trimmed
                    .rfind(')')
                    .map(|i| trimmed[i + 1..].trim().to_string())
                    .unwrap_or_default();
                break after_close;
            }
            raw_lines.push(line);
        };

        for (key, value) in fold_entries(&raw_lines) {
            prim.metadata.insert(key, strip_quotes(&value).to_string());
        }

        Ok(remainder)
    }

    /// Parse attributes and child prims until the closing brace.
    fn parse_prim_body(&mut self, prim: &mut PrimSpec, start_line: usize) -> ParseResult<()> {
        loop {
            let Some((line_num, line)) = self.next_content_line() else {
                return Err(ParseError::UnclosedBlock(start_line));
            };
            let trimmed = line.trim();

            if trimmed.starts_with('}') {
                return Ok(());
            }

            if is_prim_header(trimmed) {
                let child = self.parse_def(trimmed, &prim.path, line_num)?;
                prim.children.push(child);
                continue;
            }

            if trimmed.starts_with("rel ") {
                if trimmed.contains('[') && !trimmed.contains(']') {
                    self.collect_until_balanced(trimmed, '[', ']', line_num)?;
                }
                continue;
            }

            if trimmed.contains('=') {
                self.parse_attribute(prim, trimmed, line_num)?;
            } else if opens_block(trimmed) {
                self.skip_block(line_num)?;
            }
        }
    }

    /// Parse one attribute assignment; may consume continuation lines.
    fn parse_attribute(&mut self, prim: &mut PrimSpec, line: &str, line_num: usize) -> ParseResult<()> {
        let Some((lhs, rhs)) = line.split_once('=') else {
            return Ok(());
        };

        let words: Vec<&str> = lhs
            .split_whitespace()
            .filter(|w| !QUALIFIERS.contains(w))
            .collect();
        let (type_name, full_name) = match words.as_slice() {
            [type_name, name] => (*type_name, *name),
            _ => {
                // Not an attribute (e.g. variant selections); skip any block it opens
                if opens_block(rhs.trim()) {
                    self.skip_block(line_num)?;
                }
                return Ok(());
            }
        };

        let rhs = rhs.trim();

        if let Some(name) = full_name.strip_suffix(".timeSamples") {
            let content = self.collect_until_balanced(rhs, '{', '}', line_num)?;
            let samples = parse_time_samples(type_name, &content)?;
            prim.attributes
                .insert(name.to_string(), AttrValue::TimeSamples(samples));
            return Ok(());
        }

        if full_name.contains(".connect") {
            return Ok(());
        }

        let raw = if rhs.starts_with('[') {
            self.collect_until_balanced(rhs, '[', ']', line_num)?
        } else if rhs.starts_with('{') {
            // Dictionaries are not interpreted
            self.collect_until_balanced(rhs, '{', '}', line_num)?;
            return Ok(());
        } else {
            rhs.to_string()
        };

        if is_blocked(&raw) {
            log::debug!("Skipping blocked attribute {} at line {}", full_name, line_num);
            return Ok(());
        }

        let value = parse_value(type_name, &raw)?;
        prim.attributes.insert(full_name.to_string(), value);
        Ok(())
    }

    /// Return `first` plus any following lines needed to balance `open`/`close`.
    fn collect_until_balanced(
        &mut self,
        first: &str,
        open: char,
        close: char,
        start_line: usize,
    ) -> ParseResult<String> {
        let mut content = first.to_string();
        let mut depth = delta(first, open, close);

        while depth > 0 {
            match self.lines.pop_front() {
                Some((_, line)) => {
                    depth += delta(&line, open, close);
                    content.push(' ');
                    content.push_str(line.trim());
                }
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }

        Ok(content)
    }

    /// Skip a `{ ... }` block whose opening line was already consumed.
    fn skip_block(&mut self, start_line: usize) -> ParseResult<()> {
        let mut depth = 1;

        while depth > 0 {
            match self.lines.pop_front() {
                Some((_, line)) => {
                    depth += line.matches('{').count();
                    depth -= line.matches('}').count();
                }
                None => return Err(ParseError::UnclosedBlock(start_line)),
            }
        }

        Ok(())
    }
}

/// Parse USDA content into a layer.
pub fn parse_usda(content: &str, tokens: &Tokens) -> ParseResult<Layer> {
    UsdaParser::new(content, tokens).parse()
}

fn is_prim_header(line: &str) -> bool {
    let keyword = line.split_whitespace().next().unwrap_or_default();
    Specifier::from_keyword(keyword).is_some() && line.contains('"')
}

fn opens_block(line: &str) -> bool {
    delta(line, '{', '}') > 0
}

/// Net count of `open` minus `close` outside of quoted strings.
fn delta(line: &str, open: char, close: char) -> i32 {
    let mut depth = 0;
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == open && !in_quotes => depth += 1,
            c if c == close && !in_quotes => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn paren_delta(line: &str) -> i32 {
    delta(line, '(', ')')
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

/// Split on `sep` when not nested inside brackets, parentheses or quotes.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' | '[' | '{' if !in_quotes => depth += 1,
            ')' | ']' | '}' if !in_quotes => depth -= 1,
            c if c == sep && depth == 0 && !in_quotes => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Entries of a single-line metadata block, separated by `;`.
fn parse_inline_entries(inner: &str) -> Vec<(String, String)> {
    split_top_level(inner, ';')
        .into_iter()
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Fold raw block lines into `key = value` entries, joining continuation
/// lines of multi-line strings, arrays and dictionaries.
fn fold_entries(lines: &[String]) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut open = 0i32;
    let mut in_triple_quote = false;

    for line in lines {
        let trimmed = line.trim();

        if let Some((_, value)) = current.as_mut() {
            if open > 0 || in_triple_quote {
                value.push('\n');
                value.push_str(trimmed);
                open += delta(trimmed, '[', ']') + delta(trimmed, '{', '}');
                if trimmed.matches("\"\"\"").count() % 2 == 1 {
                    in_triple_quote = !in_triple_quote;
                }
                if open <= 0 && !in_triple_quote {
                    entries.extend(current.take());
                }
                continue;
            }
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.split_whitespace().last().unwrap_or_default().to_string();
        let value = value.trim().to_string();

        open = delta(&value, '[', ']') + delta(&value, '{', '}');
        in_triple_quote = value.matches("\"\"\"").count() % 2 == 1;

        if open > 0 || in_triple_quote {
            current = Some((key, value));
        } else {
            entries.push((key, value));
        }
    }

    entries.extend(current);
    entries
}

fn apply_layer_metadata(
    metadata: &mut LayerMetadata,
    key: &str,
    value: &str,
    line: usize,
) -> ParseResult<()> {
    match key {
        "startTimeCode" => metadata.start_time_code = Some(parse_number(value)?),
        "endTimeCode" => metadata.end_time_code = Some(parse_number(value)?),
        "framesPerSecond" => metadata.frames_per_second = Some(parse_number(value)?),
        "timeCodesPerSecond" => metadata.time_codes_per_second = Some(parse_number(value)?),
        "metersPerUnit" => metadata.meters_per_unit = Some(parse_number(value)?),
        "defaultPrim" => metadata.default_prim = Some(strip_quotes(value).to_string()),
        "doc" => metadata.doc = Some(strip_quotes(value).to_string()),
        "upAxis" => {
            metadata.up_axis = Some(match strip_quotes(value) {
                "Y" => UpAxis::Y,
                "Z" => UpAxis::Z,
                other => {
                    return Err(ParseError::Parse {
                        line,
                        message: format!("unsupported upAxis `{other}`"),
                    })
                }
            })
        }
        other => log::trace!("Ignoring layer metadata `{}`", other),
    }
    Ok(())
}

fn parse_number(s: &str) -> ParseResult<f64> {
    let word = s.split_whitespace().next().unwrap_or_default();
    match word {
        "true" => return Ok(1.0),
        "false" => return Ok(0.0),
        _ => {}
    }
    word.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(word.to_string()))
}

/// Parse `(x, y, z)`.
fn parse_tuple(s: &str) -> ParseResult<DVec3> {
    let inner = s
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| ParseError::InvalidNumber(s.to_string()))?;

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }
    Ok(DVec3::new(
        parse_number(parts[0])?,
        parse_number(parts[1])?,
        parse_number(parts[2])?,
    ))
}

/// Parse `[(x, y, z), ...]`.
fn parse_tuple_array(s: &str) -> ParseResult<Vec<DVec3>> {
    let start = s.find('[').map(|i| i + 1).unwrap_or(0);
    let end = s.rfind(']').unwrap_or(s.len());
    let inner = &s[start..end];

    split_top_level(inner, ',')
        .into_iter()
        .map(parse_tuple)
        .collect()
}

fn parse_value(type_name: &str, raw: &str) -> ParseResult<AttrValue> {
    let raw = raw.trim();

    if let Some(base) = type_name.strip_suffix("[]") {
        if VEC3_TYPES.contains(&base) {
            return Ok(AttrValue::Vec3Array(parse_tuple_array(raw)?));
        }
        return Ok(AttrValue::Other(raw.to_string()));
    }

    if VEC3_TYPES.contains(&type_name) {
        return Ok(AttrValue::Vec3(parse_tuple(raw)?));
    }

    if SCALAR_TYPES.contains(&type_name) {
        return Ok(AttrValue::Scalar(parse_number(raw)?));
    }

    match type_name {
        "token" | "string" => {
            let value = split_top_level(raw, ' ').first().copied().unwrap_or_default();
            Ok(AttrValue::Token(strip_quotes(value).to_string()))
        }
        "asset" => Ok(AttrValue::Token(raw.trim_matches('@').to_string())),
        _ => Ok(AttrValue::Other(raw.to_string())),
    }
}

fn parse_time_samples(type_name: &str, content: &str) -> ParseResult<Vec<(f64, AttrValue)>> {
    let start = content.find('{').map(|i| i + 1).unwrap_or(0);
    let end = content.rfind('}').unwrap_or(content.len());

    let mut samples = Vec::new();
    for entry in split_top_level(&content[start..end], ',') {
        let (time, value) = entry
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidNumber(entry.to_string()))?;
        if is_blocked(value) {
            continue;
        }
        samples.push((parse_number(time)?, parse_value(type_name, value)?));
    }
    Ok(samples)
}

/// A `None` value blocks the attribute or sample.
fn is_blocked(raw: &str) -> bool {
    raw.trim() == "None"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Layer {
        let tokens = Tokens::new();
        parse_usda(content, &tokens).unwrap()
    }

    #[test]
    fn test_missing_header() {
        let tokens = Tokens::new();
        let result = parse_usda("def Xform \"World\" {\n}\n", &tokens);
        assert!(matches!(result, Err(ParseError::MissingHeader)));
    }

    #[test]
    fn test_parse_layer_metadata() {
        let layer = parse(
            r#"#usda 1.0
(
    defaultPrim = "World"
    doc = """Generated for
the viewer"""
    endTimeCode = 120
    framesPerSecond = 24
    metersPerUnit = 0.01
    startTimeCode = 0
    subLayers = [
        @./anim.usda@
    ]
    customLayerData = {
        string creator = "test"
    }
    upAxis = "Z"
)
"#,
        );

        let m = &layer.metadata;
        assert_eq!(m.start_time_code, Some(0.0));
        assert_eq!(m.end_time_code, Some(120.0));
        assert_eq!(m.frames_per_second, Some(24.0));
        assert_eq!(m.meters_per_unit, Some(0.01));
        assert_eq!(m.up_axis, Some(UpAxis::Z));
        assert_eq!(m.default_prim.as_deref(), Some("World"));
        assert_eq!(m.doc.as_deref(), Some("Generated for\nthe viewer"));
        assert!(layer.root_prims.is_empty());
    }

    #[test]
    fn test_parse_nested_prims() {
        let layer = parse(
            r#"#usda 1.0

def Xform "World" (
    kind = "assembly"
)
{
    double3 xformOp:translate = (1, 2, 3)
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Cube "Box"
    {
        double size = 4
    }

    def Sphere "Ball" { double radius = 0.5 }

    def "Typeless" {
    }
}
"#,
        );

        assert_eq!(layer.root_prims.len(), 1);
        let world = &layer.root_prims[0];
        assert_eq!(world.path, "/World");
        assert_eq!(world.type_name.as_str(), "Xform");
        assert_eq!(world.metadata.get("kind").map(String::as_str), Some("assembly"));
        assert_eq!(
            world.attribute("xformOp:translate").and_then(AttrValue::as_vec3),
            Some(DVec3::new(1.0, 2.0, 3.0))
        );

        let paths: Vec<_> = world.children.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/World/Box", "/World/Ball", "/World/Typeless"]);
        assert_eq!(
            world.children[0].attribute("size").and_then(AttrValue::as_scalar),
            Some(4.0)
        );
        assert_eq!(
            world.children[1].attribute("radius").and_then(AttrValue::as_scalar),
            Some(0.5)
        );
        assert!(world.children[2].type_name.is_empty());
    }

    #[test]
    fn test_parse_multiline_array_and_time_samples() {
        let layer = parse(
            r#"#usda 1.0
def Mesh "Cube"
{
    point3f[] points = [
        (-0.5, -0.5, -0.5), (0.5, -0.5, -0.5),
        (0.5, 0.5, 0.5), (-0.5, 0.5, 0.5)
    ]
    float xformOp:rotateY.timeSamples = {
        0: 0,
        120: 360,
    }
    rel material:binding = </Materials/Orange>
}
"#,
        );

        let cube = &layer.root_prims[0];
        let points = cube.attribute("points").and_then(AttrValue::as_vec3_array).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[2], DVec3::new(0.5, 0.5, 0.5));

        match cube.attribute("xformOp:rotateY") {
            Some(AttrValue::TimeSamples(samples)) => {
                assert_eq!(samples.len(), 2);
                assert_eq!(samples[1].0, 120.0);
                assert_eq!(samples[1].1, AttrValue::Scalar(360.0));
            }
            other => panic!("Expected time samples, got {:?}", other),
        }
        assert!(cube.is_animated());
    }

    #[test]
    fn test_blocked_values_are_dropped() {
        let layer = parse(
            r#"#usda 1.0
def Cube "Box"
{
    float3[] extent = None
    double size = 3
    double3 xformOp:translate.timeSamples = {
        0: (0, 0, 0),
        10: None,
        20: (2, 0, 0),
    }
}
"#,
        );

        let cube = &layer.root_prims[0];
        assert!(cube.attribute("extent").is_none());
        assert_eq!(cube.attribute("size").and_then(AttrValue::as_scalar), Some(3.0));

        match cube.attribute("xformOp:translate") {
            Some(AttrValue::TimeSamples(samples)) => {
                let times: Vec<f64> = samples.iter().map(|(t, _)| *t).collect();
                assert_eq!(times, vec![0.0, 20.0]);
            }
            other => panic!("Expected time samples, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_variant_sets() {
        let layer = parse(
            r#"#usda 1.0
def Xform "Asset" (
    variants = {
        string shading = "red"
    }
    prepend variantSets = "shading"
)
{
    variantSet "shading" = {
        "red" {
            color3f[] primvars:displayColor = [(1, 0, 0)]
        }
    }
    double3 xformOp:translate = (0, 1, 0)
}
"#,
        );

        let asset = &layer.root_prims[0];
        assert!(asset.children.is_empty());
        assert_eq!(
            asset.attribute("xformOp:translate").and_then(AttrValue::as_vec3),
            Some(DVec3::new(0.0, 1.0, 0.0))
        );
    }

    #[test]
    fn test_unclosed_prim_is_an_error() {
        let tokens = Tokens::new();
        let result = parse_usda("#usda 1.0\ndef Xform \"World\" {\n", &tokens);
        assert!(matches!(result, Err(ParseError::UnclosedBlock(2))));
    }

    #[test]
    fn test_invalid_number() {
        let tokens = Tokens::new();
        let result = parse_usda("#usda 1.0\n(\n    startTimeCode = soon\n)\n", &tokens);
        assert!(matches!(result, Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_type_names_resolve_through_table() {
        let tokens = Tokens::new();
        let layer = parse_usda("#usda 1.0\ndef Mesh \"M\" {\n}\n", &tokens).unwrap();
        assert_eq!(layer.root_prims[0].type_name, tokens.mesh);
    }
}
