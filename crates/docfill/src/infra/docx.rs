//! Office Open XML (`.docx`) packages reduced to what a merge needs.
//!
//! A package is held as its raw zip entries plus the main document part split
//! into opaque markup and top-level paragraphs. Paragraphs expose plain text;
//! only paragraphs whose text was edited are re-serialized, everything else is
//! written back byte-for-byte.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::errors::FillError;

/// Main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Extension expected for saved documents.
pub const DOCX_EXTENSION: &str = "docx";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_CLOSE: &str = "<w:sectPr/></w:body></w:document>";

/// A loaded word-processing document.
#[derive(Debug, Clone)]
pub struct Document {
    origin: PathBuf,
    entries: Vec<PackageEntry>,
    body: Vec<Chunk>,
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    compression: CompressionMethod,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
enum Chunk {
    Markup(String),
    Paragraph(Paragraph),
}

/// A top-level `w:p` element of the main document part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    source: String,
    open_tag: String,
    properties: Option<String>,
    run_properties: Option<String>,
    text: String,
    edited: bool,
}

impl Paragraph {
    /// Concatenated run text; tabs and breaks appear as `\t` and `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the paragraph text. The paragraph is rewritten as a single run
    /// carrying the formatting of its first run.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.edited = true;
        }
    }

    /// Whether the paragraph will be re-serialized on write.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    fn write_xml(&self, out: &mut String) {
        if !self.edited {
            out.push_str(&self.source);
            return;
        }
        out.push_str(&self.open_tag);
        if let Some(properties) = &self.properties {
            out.push_str(properties);
        }
        write_run(out, self.run_properties.as_deref(), &self.text);
        out.push_str("</w:p>");
    }
}

impl Document {
    /// Open the package at `path`.
    pub fn open(path: &Path) -> Result<Self, FillError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FillError::TemplateNotFound(path.to_path_buf()),
            _ => FillError::io(format!("open {}", path.display()), err),
        })?;
        Self::from_reader(file, path)
    }

    /// Read a package from any seekable source; `origin` is used in messages.
    pub fn from_reader<R: Read + Seek>(reader: R, origin: &Path) -> Result<Self, FillError> {
        let mut archive =
            ZipArchive::new(reader).map_err(|err| zip_error(origin, "read package", err))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|err| zip_error(origin, "read package entry", err))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let compression = file.compression();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(|err| {
                FillError::io(format!("read {name} from {}", origin.display()), err)
            })?;
            entries.push(PackageEntry {
                name,
                compression,
                data,
            });
        }

        let part = entries
            .iter()
            .find(|entry| entry.name == DOCUMENT_PART)
            .ok_or_else(|| {
                FillError::invalid_document(origin, format!("package has no {DOCUMENT_PART}"))
            })?;
        let xml = std::str::from_utf8(&part.data)
            .map_err(|err| FillError::invalid_document(origin, err))?;
        let body = parse_body(xml).map_err(|err| FillError::invalid_document(origin, err))?;

        Ok(Self {
            origin: origin.to_path_buf(),
            entries,
            body,
        })
    }

    /// Build a minimal package with one plain paragraph per item.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Result<Self, FillError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(DOCUMENT_OPEN);
        for paragraph in paragraphs {
            xml.push_str("<w:p>");
            write_run(&mut xml, None, paragraph.as_ref());
            xml.push_str("</w:p>");
        }
        xml.push_str(DOCUMENT_CLOSE);

        let origin = PathBuf::from("<new document>");
        let body = parse_body(&xml).map_err(|err| FillError::invalid_document(&origin, err))?;
        let part = |name: &str, contents: &str| PackageEntry {
            name: name.to_string(),
            compression: CompressionMethod::Deflated,
            data: format!("{XML_DECLARATION}{contents}").into_bytes(),
        };

        Ok(Self {
            origin,
            entries: vec![
                part("[Content_Types].xml", CONTENT_TYPES),
                part("_rels/.rels", ROOT_RELS),
                PackageEntry {
                    name: DOCUMENT_PART.to_string(),
                    compression: CompressionMethod::Deflated,
                    data: Vec::new(),
                },
            ],
            body,
        })
    }

    /// Where the package was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|chunk| match chunk {
            Chunk::Paragraph(paragraph) => Some(paragraph),
            Chunk::Markup(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.iter_mut().filter_map(|chunk| match chunk {
            Chunk::Paragraph(paragraph) => Some(paragraph),
            Chunk::Markup(_) => None,
        })
    }

    /// Plain text of every paragraph in document order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs()
            .map(|paragraph| paragraph.text().to_string())
            .collect()
    }

    /// Current XML of the main document part.
    pub fn document_xml(&self) -> String {
        let mut xml = String::new();
        for chunk in &self.body {
            match chunk {
                Chunk::Markup(markup) => xml.push_str(markup),
                Chunk::Paragraph(paragraph) => paragraph.write_xml(&mut xml),
            }
        }
        xml
    }

    /// Serialize the package into `writer`; `target` is used in messages.
    pub fn write_to<W: Write + Seek>(&self, writer: W, target: &Path) -> Result<W, FillError> {
        let document_xml = self.document_xml();
        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);
            zip.start_file(entry.name.as_str(), options)
                .map_err(|err| zip_error(target, "write package entry", err))?;
            let data = if entry.name == DOCUMENT_PART {
                document_xml.as_bytes()
            } else {
                entry.data.as_slice()
            };
            zip.write_all(data).map_err(|err| {
                FillError::io(format!("write {} to {}", entry.name, target.display()), err)
            })?;
        }
        zip.finish()
            .map_err(|err| zip_error(target, "finish package", err))
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FillError> {
        let cursor = self.write_to(Cursor::new(Vec::new()), &self.origin)?;
        Ok(cursor.into_inner())
    }
}

fn zip_error(path: &Path, operation: &str, err: ZipError) -> FillError {
    match err {
        ZipError::Io(source) => FillError::io(format!("{operation} {}", path.display()), source),
        other => FillError::invalid_document(path, other),
    }
}

fn write_run(out: &mut String, run_properties: Option<&str>, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str("<w:r>");
    if let Some(properties) = run_properties {
        out.push_str(properties);
    }
    for (line_index, line) in text.split('\n').enumerate() {
        if line_index > 0 {
            out.push_str("<w:br/>");
        }
        for (piece_index, piece) in line.split('\t').enumerate() {
            if piece_index > 0 {
                out.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                out.push_str(r#"<w:t xml:space="preserve">"#);
                out.push_str(&escape(piece));
                out.push_str("</w:t>");
            }
        }
    }
    out.push_str("</w:r>");
}

fn parse_body(xml: &str) -> Result<Vec<Chunk>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut chunks = Vec::new();
    let mut cursor = 0;
    let mut current: Option<ParagraphBuilder> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Eof => break,
            Event::Start(tag) if tag.name().as_ref() == b"w:p" => match current.as_mut() {
                Some(builder) => builder.nested += 1,
                None => {
                    if start > cursor {
                        chunks.push(Chunk::Markup(xml[cursor..start].to_string()));
                    }
                    current = Some(ParagraphBuilder::new(start, &xml[start..end]));
                }
            },
            Event::End(tag) if tag.name().as_ref() == b"w:p" => {
                if let Some(mut builder) = current.take() {
                    if builder.nested > 0 {
                        builder.nested -= 1;
                        current = Some(builder);
                    } else {
                        let source = &xml[builder.start..end];
                        chunks.push(Chunk::Paragraph(builder.finish(source)));
                        cursor = end;
                    }
                }
            }
            other => {
                if let Some(builder) = current.as_mut() {
                    builder.observe(other, start, end, xml)?;
                }
            }
        }
    }

    if cursor < xml.len() {
        chunks.push(Chunk::Markup(xml[cursor..].to_string()));
    }
    Ok(chunks)
}

struct ParagraphBuilder {
    start: usize,
    open_tag: String,
    nested: usize,
    open_runs: usize,
    seen_first_run: bool,
    in_text: bool,
    properties_start: Option<usize>,
    properties: Option<String>,
    run_properties_start: Option<usize>,
    run_properties: Option<String>,
    text: String,
}

impl ParagraphBuilder {
    fn new(start: usize, open_tag: &str) -> Self {
        Self {
            start,
            open_tag: open_tag.to_string(),
            nested: 0,
            open_runs: 0,
            seen_first_run: false,
            in_text: false,
            properties_start: None,
            properties: None,
            run_properties_start: None,
            run_properties: None,
            text: String::new(),
        }
    }

    fn wants_properties(&self) -> bool {
        self.nested == 0 && self.open_runs == 0 && self.properties.is_none()
    }

    /// Only the paragraph's first run contributes formatting.
    fn wants_run_properties(&self) -> bool {
        self.open_runs > 0 && !self.seen_first_run && self.run_properties.is_none()
    }

    fn observe(
        &mut self,
        event: Event<'_>,
        start: usize,
        end: usize,
        xml: &str,
    ) -> Result<(), quick_xml::Error> {
        match event {
            Event::Start(tag) => match tag.name().as_ref() {
                b"w:pPr" if self.wants_properties() => self.properties_start = Some(start),
                b"w:r" => self.open_runs += 1,
                b"w:rPr" if self.wants_run_properties() => self.run_properties_start = Some(start),
                b"w:t" if self.open_runs > 0 => self.in_text = true,
                _ => {}
            },
            Event::End(tag) => match tag.name().as_ref() {
                b"w:pPr" => {
                    if let Some(from) = self.properties_start.take() {
                        self.properties = Some(xml[from..end].to_string());
                    }
                }
                b"w:r" => {
                    self.open_runs = self.open_runs.saturating_sub(1);
                    if self.open_runs == 0 {
                        self.seen_first_run = true;
                    }
                }
                b"w:rPr" => {
                    if let Some(from) = self.run_properties_start.take() {
                        self.run_properties = Some(xml[from..end].to_string());
                    }
                }
                b"w:t" => self.in_text = false,
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"w:pPr" if self.wants_properties() => {
                    self.properties = Some(xml[start..end].to_string());
                }
                b"w:rPr" if self.wants_run_properties() => {
                    self.run_properties = Some(xml[start..end].to_string());
                }
                b"w:tab" if self.open_runs > 0 => self.text.push('\t'),
                b"w:br" | b"w:cr" if self.open_runs > 0 => self.text.push('\n'),
                _ => {}
            },
            Event::Text(text) if self.in_text => self.text.push_str(&text.unescape()?),
            Event::CData(data) if self.in_text => {
                self.text.push_str(&String::from_utf8_lossy(&data));
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self, source: &str) -> Paragraph {
        Paragraph {
            source: source.to_string(),
            open_tag: self.open_tag,
            properties: self.properties,
            run_properties: self.run_properties,
            text: self.text,
            edited: false,
        }
    }
}
