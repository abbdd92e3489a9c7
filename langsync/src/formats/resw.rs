//! Support for Windows `.resw` resource files.
//!
//! Only `<data>` elements with a `<value>` are modelled. Everything before the first
//! `<data>` element (XML declaration, `<root>`, schema and `<resheader>` elements) is kept
//! verbatim as the file header. Later children of `<root>` that are not modelled
//! (`<metadata>`, `<assembly>`, comments, `<data>` without a value) are kept verbatim in
//! place, and modelled `<data>` elements keep their attributes. The `<comment>` child of
//! each `<data>` element carries the entry's status marker.

use std::{
    collections::{HashMap, VecDeque},
    fs::File,
    io::{BufRead, Read, Write},
    path::Path,
};

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    error::Error,
    traits::Parser,
    types::{Entry, EntryStatus, LocaleStore},
};

/// Header used for files that do not exist yet.
pub const DEFAULT_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <resheader name="version">
    <value>2.0</value>
  </resheader>
  <resheader name="reader">
    <value>System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
  </resheader>
  <resheader name="writer">
    <value>System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089</value>
  </resheader>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Raw XML preceding the first `<data>` element.
    pub header: String,
    /// Children of `<root>` from the first `<data>` element on, in file order.
    pub nodes: Vec<Node>,
}

/// A child of `<root>` after the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Data(DataElement),
    /// Any other element, comment or value-less `<data>`, kept byte for byte.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataElement {
    pub name: String,
    /// Attributes other than `name`, in file order.
    pub attributes: Vec<(String, String)>,
    pub value: String,
    pub comment: Option<String>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            nodes: Vec::new(),
        }
    }
}

impl Format {
    /// Builds a new file image for `store` with the default header.
    pub fn from_store(store: &LocaleStore) -> Self {
        let mut format = Self::default();
        format.apply_store(store);
        format
    }

    pub fn data_elements(&self) -> impl Iterator<Item = &DataElement> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Data(element) => Some(element),
            Node::Raw(_) => None,
        })
    }

    pub fn into_store(self, language: impl Into<String>) -> LocaleStore {
        LocaleStore::with_entries(
            language,
            self.data_elements().map(DataElement::to_entry).collect(),
        )
    }

    /// Makes the `<data>` elements match `store`.
    ///
    /// Elements whose key is still in `store` are updated in place and keep their
    /// attributes; the others are removed. New entries are appended in store order. Raw
    /// nodes are never touched.
    pub fn apply_store(&mut self, store: &LocaleStore) {
        let mut by_key: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for (index, entry) in store.entries.iter().enumerate() {
            by_key.entry(entry.key.as_str()).or_default().push_back(index);
        }
        let mut written = vec![false; store.entries.len()];

        self.nodes.retain_mut(|node| match node {
            Node::Raw(_) => true,
            Node::Data(element) => {
                let index = by_key
                    .get_mut(element.name.as_str())
                    .and_then(VecDeque::pop_front);
                match index {
                    Some(index) => {
                        written[index] = true;
                        element.update(&store.entries[index]);
                        true
                    }
                    None => false,
                }
            }
        });

        for (entry, done) in store.entries.iter().zip(written) {
            if !done {
                self.nodes.push(Node::Data(DataElement::from_entry(entry)));
            }
        }
    }

    fn parse(content: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(content);
        let mut header_end = None;
        let mut nodes = Vec::new();

        loop {
            let start = reader.buffer_position() as usize;
            let in_body = header_end.is_some();
            match reader.read_event()? {
                Event::Start(ref e) if e.name().as_ref() == b"data" => {
                    header_end.get_or_insert(start);
                    let element = parse_data_element(e, &mut reader)?;
                    let end = reader.buffer_position() as usize;
                    nodes.push(match element {
                        Some(element) => Node::Data(element),
                        // no <value>, nothing to track
                        None => Node::Raw(content[start..end].to_string()),
                    });
                }
                Event::Empty(ref e) if e.name().as_ref() == b"data" => {
                    header_end.get_or_insert(start);
                    let end = reader.buffer_position() as usize;
                    nodes.push(Node::Raw(content[start..end].to_string()));
                }
                Event::End(ref e) if e.name().as_ref() == b"root" => {
                    header_end.get_or_insert(start);
                    break;
                }
                Event::Start(ref e) if in_body => {
                    reader.read_to_end(e.name())?;
                    let end = reader.buffer_position() as usize;
                    nodes.push(Node::Raw(content[start..end].to_string()));
                }
                Event::Empty(_) | Event::Comment(_) | Event::CData(_) | Event::PI(_) if in_body => {
                    let end = reader.buffer_position() as usize;
                    nodes.push(Node::Raw(content[start..end].to_string()));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let header = match header_end {
            Some(end) => content[..end].to_string(),
            None => content.to_string(),
        };
        Ok(Format { header, nodes })
    }
}

impl Parser for Format {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse(&content)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(self.header.trim_end().as_bytes())?;
        let mut xml_writer = Writer::new(&mut writer);

        for node in &self.nodes {
            xml_writer.write_event(Event::Text(BytesText::new("\n  ")))?;
            let element = match node {
                Node::Raw(raw) => {
                    xml_writer.get_mut().write_all(raw.as_bytes())?;
                    continue;
                }
                Node::Data(element) => element,
            };

            let mut start = BytesStart::new("data");
            start.push_attribute(("name", element.name.as_str()));
            for (key, value) in &element.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            xml_writer.write_event(Event::Start(start))?;

            write_child(&mut xml_writer, "value", &element.value)?;
            if let Some(comment) = &element.comment {
                write_child(&mut xml_writer, "comment", comment)?;
            }

            xml_writer.write_event(Event::Text(BytesText::new("\n  ")))?;
            xml_writer.write_event(Event::End(BytesEnd::new("data")))?;
        }

        xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
        xml_writer.write_event(Event::End(BytesEnd::new("root")))?;
        xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
        Ok(())
    }

    /// Override default file reading to strip a BOM and decode UTF-16 files.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;

        Self::parse(&decoded)
    }
}

impl DataElement {
    fn to_entry(&self) -> Entry {
        Entry {
            key: self.name.clone(),
            value: self.value.clone(),
            // Free-form translator notes are not status markers.
            status: self
                .comment
                .as_deref()
                .and_then(|c| c.parse::<EntryStatus>().ok()),
        }
    }

    fn from_entry(entry: &Entry) -> Self {
        DataElement {
            name: entry.key.clone(),
            attributes: vec![("xml:space".to_string(), "preserve".to_string())],
            value: entry.value.clone(),
            comment: entry.status.as_ref().map(EntryStatus::to_string),
        }
    }

    /// A translator note survives until the entry gets a status.
    fn update(&mut self, entry: &Entry) {
        self.value = entry.value.clone();
        match &entry.status {
            Some(status) => self.comment = Some(status.to_string()),
            None => {
                let is_marker = self
                    .comment
                    .as_deref()
                    .is_some_and(|c| c.parse::<EntryStatus>().is_ok());
                if is_marker {
                    self.comment = None;
                }
            }
        }
    }
}

fn write_child<W: Write>(xml_writer: &mut Writer<W>, tag: &str, text: &str) -> Result<(), Error> {
    xml_writer.write_event(Event::Text(BytesText::new("\n    ")))?;
    xml_writer.write_event(Event::Start(BytesStart::new(tag)))?;
    xml_writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    xml_writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn parse_data_element(
    e: &BytesStart,
    xml_reader: &mut Reader<&[u8]>,
) -> Result<Option<DataElement>, Error> {
    let mut name = None;
    let mut attributes = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::DataMismatch(e.to_string()))?;
        let value = attr.unescape_value()?.to_string();
        if attr.key.as_ref() == b"name" {
            name = Some(value);
        } else {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            attributes.push((key, value));
        }
    }
    let name = name.ok_or_else(|| Error::InvalidResource("data tag missing 'name'".to_string()))?;

    let mut value = None;
    let mut comment = None;
    loop {
        match xml_reader.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == b"value" => {
                value = Some(read_text(xml_reader, b"value")?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"value" => value = Some(String::new()),
            Event::Start(ref e) if e.name().as_ref() == b"comment" => {
                comment = Some(read_text(xml_reader, b"comment")?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"comment" => {
                comment = Some(String::new())
            }
            Event::End(ref e) if e.name().as_ref() == b"data" => break,
            Event::Eof => {
                return Err(Error::InvalidResource(format!(
                    "unexpected EOF inside data '{}'",
                    name
                )));
            }
            _ => {}
        }
    }

    Ok(value.map(|value| DataElement {
        name,
        attributes,
        value,
        comment,
    }))
}

/// Collects the text content of the element `tag` up to its end tag.
fn read_text(xml_reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String, Error> {
    let mut text = String::new();
    loop {
        match xml_reader.read_event()? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::End(ref e) if e.name().as_ref() == tag => return Ok(text),
            Event::Eof => {
                return Err(Error::InvalidResource(format!(
                    "unexpected EOF inside <{}>",
                    String::from_utf8_lossy(tag)
                )));
            }
            _ => {}
        }
    }
}
