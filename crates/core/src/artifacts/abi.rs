use eyre::{Context, Result};
use serde::Serialize;
use serde_json::{
    ser::{Formatter, PrettyFormatter},
    Serializer, Value,
};
use std::io::{self, Write};

/// Solidity ABI represented as JSON values
pub type Abi = Vec<Value>;

/// Indentation used for the ABI array inside an ABI document
const INDENT: &[u8] = b"    ";

/// What an artifact's `abi` field holds
#[derive(Debug, PartialEq)]
pub enum AbiField<'a> {
    /// Field absent, `null`, or an empty array
    Empty,
    /// Non-empty array of interface entries
    Entries(&'a Abi),
    /// Field present with a non-array value; carries the JSON type name
    Invalid(&'static str),
}

/// Looks up the `abi` field of a parsed artifact
pub fn abi_field(artifact: &Value) -> AbiField<'_> {
    match artifact.get("abi") {
        None | Some(Value::Null) => AbiField::Empty,
        Some(Value::Array(entries)) if entries.is_empty() => AbiField::Empty,
        Some(Value::Array(entries)) => AbiField::Entries(entries),
        Some(other) => AbiField::Invalid(json_type_name(other)),
    }
}

/// Renders the canonical ABI document
///
/// The wrapper is written as fixed text around the pretty-printed array so
/// the bytes only change when the array itself does.
pub fn render_abi_document(abi: &[Value]) -> Result<String> {
    let mut body = Vec::new();
    let formatter = AsciiFormatter(PrettyFormatter::with_indent(INDENT));
    let mut serializer = Serializer::with_formatter(&mut body, formatter);
    abi.serialize(&mut serializer)
        .wrap_err("Failed to serialize ABI")?;
    let body = String::from_utf8(body).wrap_err("Serialized ABI is not valid UTF-8")?;

    Ok(format!("{{\n\"abi\" :\n{body}\n}}"))
}

/// Pretty formatter that writes every non-ASCII character (and DEL) as a
/// `\uXXXX` escape, UTF-16 surrogate pairs included
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
