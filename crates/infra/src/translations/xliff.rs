//! Minimal XLIFF 1.2 reader and writer
//!
//! Only the parts the tooling touches are modelled: root and `<file>`
//! attributes and the trans-units of the body. `<header>` and `<note>`
//! elements are skipped on read and therefore dropped on write.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use sha2::{Digest, Sha256};

use super::error::{TranslationError, TranslationResult};

/// Translation unit id derived from its source text.
///
/// First seven characters of the base64 encoded SHA-256 digest with `/`
/// replaced by `.` and `+` by `_`.
pub fn generate_id(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    STANDARD
        .encode(digest)
        .chars()
        .take(7)
        .map(|c| match c {
            '/' => '.',
            '+' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransUnit {
    pub id: String,
    pub resname: Option<String>,
    pub source: String,
    /// `None` when the unit has no `<target>` element
    pub target: Option<String>,
    pub target_state: Option<String>,
}

impl TransUnit {
    pub fn has_target(&self) -> bool {
        self.target.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XliffDocument {
    pub root_attributes: Vec<(String, String)>,
    pub file_attributes: Vec<(String, String)>,
    pub units: Vec<TransUnit>,
}

#[derive(Clone, Copy)]
enum Field {
    Source,
    Target,
}

fn xml_error(file: &Path, err: impl Display) -> TranslationError {
    TranslationError::Xml { file: file.to_path_buf(), message: err.to_string() }
}

fn collect_attributes(
    file: &Path,
    attributes: Attributes,
) -> TranslationResult<Vec<(String, String)>> {
    attributes
        .map(|attr| {
            let attr = attr.map_err(|e| xml_error(file, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| xml_error(file, e))?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

fn set_attribute(attributes: &mut Vec<(String, String)>, name: &str, value: &str) {
    match attributes.iter_mut().find(|(k, _)| k == name) {
        Some(entry) => entry.1 = value.to_string(),
        None => attributes.push((name.to_string(), value.to_string())),
    }
}

impl XliffDocument {
    pub fn load(path: &Path) -> TranslationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// `file` is only used for error messages.
    pub fn parse(content: &str, file: &Path) -> TranslationResult<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut document = XliffDocument::default();
        let mut unit: Option<TransUnit> = None;
        let mut field: Option<Field> = None;
        let mut seen_root = false;

        loop {
            match reader.read_event().map_err(|e| xml_error(file, e))? {
                Event::Start(e) => match e.name().as_ref() {
                    b"xliff" => {
                        seen_root = true;
                        document.root_attributes = collect_attributes(file, e.attributes())?;
                    }
                    b"file" => document.file_attributes = collect_attributes(file, e.attributes())?,
                    b"header" | b"note" => {
                        reader.read_to_end(e.name()).map_err(|err| xml_error(file, err))?;
                    }
                    b"trans-unit" => unit = Some(start_unit(file, e.attributes())?),
                    b"source" if unit.is_some() => field = Some(Field::Source),
                    b"target" => {
                        if let Some(current) = unit.as_mut() {
                            let attrs = collect_attributes(file, e.attributes())?;
                            current.target = Some(String::new());
                            current.target_state = attribute(&attrs, "state").map(str::to_string);
                            field = Some(Field::Target);
                        }
                    }
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"target" => {
                        if let Some(current) = unit.as_mut() {
                            let attrs = collect_attributes(file, e.attributes())?;
                            current.target = Some(String::new());
                            current.target_state = attribute(&attrs, "state").map(str::to_string);
                        }
                    }
                    b"source" => {}
                    b"trans-unit" => document.units.push(start_unit(file, e.attributes())?),
                    _ => {}
                },
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| xml_error(file, e))?;
                    append(&mut unit, field, &value);
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    append(&mut unit, field, &value);
                }
                Event::End(e) => match e.name().as_ref() {
                    b"source" | b"target" => field = None,
                    b"trans-unit" => {
                        if let Some(done) = unit.take() {
                            document.units.push(done);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(xml_error(file, "missing <xliff> root element"));
        }
        Ok(document)
    }

    pub fn save(&self, path: &Path) -> TranslationResult<()> {
        let bytes = self.to_bytes(path)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn to_bytes(&self, file: &Path) -> TranslationResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        emit(&mut writer, file, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(&mut writer, file, Event::Start(start("xliff", &self.root_attributes)))?;
        emit(&mut writer, file, Event::Start(start("file", &self.file_attributes)))?;
        emit(&mut writer, file, Event::Start(BytesStart::new("body")))?;

        for unit in &self.units {
            let mut attrs = vec![("id".to_string(), unit.id.clone())];
            if let Some(resname) = &unit.resname {
                attrs.push(("resname".to_string(), resname.clone()));
            }
            emit(&mut writer, file, Event::Start(start("trans-unit", &attrs)))?;
            write_text(&mut writer, file, "source", &[], &unit.source)?;
            if let Some(target) = &unit.target {
                let state: Vec<(String, String)> = unit
                    .target_state
                    .iter()
                    .map(|s| ("state".to_string(), s.clone()))
                    .collect();
                write_text(&mut writer, file, "target", &state, target)?;
            }
            emit(&mut writer, file, Event::End(BytesEnd::new("trans-unit")))?;
        }

        emit(&mut writer, file, Event::End(BytesEnd::new("body")))?;
        emit(&mut writer, file, Event::End(BytesEnd::new("file")))?;
        emit(&mut writer, file, Event::End(BytesEnd::new("xliff")))?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn target_language(&self) -> Option<&str> {
        attribute(&self.file_attributes, "target-language")
    }

    pub fn set_file_attribute(&mut self, name: &str, value: &str) {
        set_attribute(&mut self.file_attributes, name, value);
    }
}

fn start_unit(file: &Path, attributes: Attributes) -> TranslationResult<TransUnit> {
    let attrs = collect_attributes(file, attributes)?;
    Ok(TransUnit {
        id: attribute(&attrs, "id").unwrap_or_default().to_string(),
        resname: attribute(&attrs, "resname").map(str::to_string),
        ..TransUnit::default()
    })
}

fn append(unit: &mut Option<TransUnit>, field: Option<Field>, value: &str) {
    let (Some(unit), Some(field)) = (unit.as_mut(), field) else {
        return;
    };
    match field {
        Field::Source => unit.source.push_str(value),
        Field::Target => unit.target.get_or_insert_with(String::new).push_str(value),
    }
}

fn start<'a>(name: &'a str, attributes: &'a [(String, String)]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn emit(writer: &mut Writer<Vec<u8>>, file: &Path, event: Event<'_>) -> TranslationResult<()> {
    writer.write_event(event).map_err(|e| xml_error(file, e))
}

fn write_text(
    writer: &mut Writer<Vec<u8>>,
    file: &Path,
    name: &str,
    attributes: &[(String, String)],
    text: &str,
) -> TranslationResult<()> {
    if text.is_empty() {
        return emit(writer, file, Event::Empty(start(name, attributes)));
    }
    emit(writer, file, Event::Start(start(name, attributes)))?;
    emit(writer, file, Event::Text(BytesText::new(text)))?;
    emit(writer, file, Event::End(BytesEnd::new(name)))
}

/// Domain and locale from `messages.de.xlf`.
pub fn split_file_name(path: &Path) -> Option<(String, String)> {
    let name = path.file_name()?.to_str()?;
    let mut parts = name.split('.');
    let domain = parts.next()?.to_string();
    let locale = parts.next()?.to_string();
    parts.next()?;
    Some((domain, locale))
}

/// Sibling file of `path` with `locale` in place of its own locale.
pub fn sibling_for_locale(path: &Path, locale: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let (_, own) = split_file_name(path)?;
    let replaced = name.replacen(&format!(".{own}."), &format!(".{locale}."), 1);
    Some(path.with_file_name(replaced))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGES_DE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2" version="1.2">
  <file source-language="en" target-language="de" datatype="plaintext" original="messages.en.xlf">
    <header>
      <tool tool-id="kimai" tool-name="kimai"/>
    </header>
    <body>
      <trans-unit id="abc" resname="login">
        <source>login</source>
        <target>Anmelden</target>
      </trans-unit>
      <trans-unit id="def">
        <source>Save &amp; close</source>
        <target state="needs-translation"/>
        <note>unused</note>
      </trans-unit>
    </body>
  </file>
</xliff>"#;

    #[test]
    fn generate_id_matches_known_values() {
        let id = generate_id("login");
        assert_eq!(id.len(), 7);
        assert!(!id.contains('/') && !id.contains('+'));
        assert_eq!(id, generate_id("login"));
        assert_ne!(id, generate_id("logout"));
    }

    #[test]
    fn parses_units_and_attributes() {
        let doc = XliffDocument::parse(MESSAGES_DE, Path::new("messages.de.xlf")).unwrap();

        assert_eq!(doc.target_language(), Some("de"));
        assert_eq!(doc.units.len(), 2);
        assert_eq!(doc.units[0].resname.as_deref(), Some("login"));
        assert_eq!(doc.units[0].target.as_deref(), Some("Anmelden"));
        assert_eq!(doc.units[1].source, "Save & close");
        assert_eq!(doc.units[1].target.as_deref(), Some(""));
        assert_eq!(doc.units[1].target_state.as_deref(), Some("needs-translation"));
        assert!(!doc.units[1].has_target());
    }

    #[test]
    fn written_document_reads_back() {
        let path = Path::new("messages.de.xlf");
        let mut doc = XliffDocument::parse(MESSAGES_DE, path).unwrap();
        doc.set_file_attribute("original", "messages.en.xlf");

        let bytes = doc.to_bytes(path).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("<header>"));
        assert!(text.contains("Save &amp; close"));

        let again = XliffDocument::parse(&text, path).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn rejects_non_xliff_content() {
        let err = XliffDocument::parse("<html></html>", Path::new("x.de.xlf")).unwrap_err();
        assert!(matches!(err, TranslationError::Xml { .. }));
    }

    #[test]
    fn file_name_helpers() {
        let path = Path::new("/t/validators.pt_BR.xliff");
        assert_eq!(
            split_file_name(path),
            Some(("validators".to_string(), "pt_BR".to_string()))
        );
        assert_eq!(sibling_for_locale(path, "pt"), Some(PathBuf::from("/t/validators.pt.xliff")));
        assert_eq!(split_file_name(Path::new("README")), None);
    }
}
