//! The SVG template document: parsed once, written back with generated groups appended to the root.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use rust_embed::RustEmbed;
use svgtypes::{Length, LengthUnit};
use tracing::{debug, warn};

use crate::constants::{BUILTIN_TEMPLATE_NAME, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use crate::error::{MapError, Result};
use crate::markers::SvgElement;
use crate::projection::CanvasSize;
use crate::utils::ensure_parent_dir;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

const INDENT: &str = "  ";

/// A parsed template, kept as its event stream so untouched content is written back verbatim.
#[derive(Debug, Clone)]
pub struct SvgTemplate {
    name: String,
    events: Vec<Event<'static>>,
    root_index: usize,
    root_end_index: usize,
    root_name: String,
    canvas: CanvasSize,
}

impl SvgTemplate {
    /// Reads and parses a template file. Non-UTF-8 files are decoded with the encoding named
    /// in their XML declaration.
    pub fn load(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| MapError::template_parse(&name, e))?;
        let text = decode_template(&bytes).map_err(|reason| MapError::template_parse(&name, reason))?;
        Self::parse(&text, name)
    }

    /// The world frame template compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let name = format!("<builtin {}>", BUILTIN_TEMPLATE_NAME);
        let file = Asset::get(BUILTIN_TEMPLATE_NAME)
            .ok_or_else(|| MapError::template_parse(&name, "template is not embedded"))?;
        let text = std::str::from_utf8(&file.data).map_err(|e| MapError::template_parse(&name, e))?;
        Self::parse(text, name)
    }

    /// Parses template text. `name` only labels error messages.
    pub fn parse(text: &str, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut reader = Reader::from_str(text);
        let mut events = Vec::new();
        let mut depth = 0usize;
        let mut root: Option<(usize, String, CanvasSize)> = None;
        let mut root_end_index = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                MapError::template_parse(&name, format!("{} (at byte {})", e, reader.error_position()))
            })?;

            match &event {
                Event::Eof => break,
                Event::Start(start) | Event::Empty(start) => {
                    check_attributes(start).map_err(|reason| MapError::template_parse(&name, reason))?;

                    if depth == 0 {
                        if root.is_some() {
                            return Err(MapError::template_parse(&name, "more than one root element"));
                        }
                        let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                        if start.local_name().as_ref() != b"svg" {
                            return Err(MapError::template_parse(
                                &name,
                                format!("root element is <{}>, expected <svg>", qname),
                            ));
                        }
                        root = Some((events.len(), qname, canvas_size(start)));
                        if matches!(event, Event::Empty(_)) {
                            root_end_index = Some(events.len());
                        }
                    }
                    if matches!(event, Event::Start(_)) {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| MapError::template_parse(&name, "unmatched closing tag"))?;
                    if depth == 0 {
                        root_end_index = Some(events.len());
                    }
                }
                Event::Text(text) if depth == 0 => {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(MapError::template_parse(&name, "text outside the root element"));
                    }
                }
                _ => {}
            }
            events.push(event.into_owned());
        }

        let Some((root_index, root_name, canvas)) = root else {
            return Err(MapError::template_parse(&name, "document has no root element"));
        };
        let Some(root_end_index) = root_end_index.filter(|_| depth == 0) else {
            return Err(MapError::template_parse(
                &name,
                format!("unexpected end of document inside <{}>", root_name),
            ));
        };

        debug!(
            "parsed template {} ({} events, canvas {}x{})",
            name,
            events.len(),
            canvas.width,
            canvas.height
        );

        Ok(SvgTemplate {
            name,
            events,
            root_index,
            root_end_index,
            root_name,
            canvas,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name of the root element, e.g. `svg` or `svg:svg`.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Serializes the template with `groups` appended as the last children of the root.
    pub fn render(&self, groups: &[SvgElement]) -> io::Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        write_event(&mut writer, Event::Text(BytesText::new("\n")))?;

        // Generated elements reuse the root's namespace prefix
        let prefix = self
            .root_name
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or("");

        let mut leading = true;
        for (index, event) in self.events.iter().enumerate() {
            if leading {
                match event {
                    Event::Decl(_) => continue,
                    Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
                    _ => leading = false,
                }
            }

            if index != self.root_end_index {
                write_event(&mut writer, event.clone())?;
                continue;
            }

            if let Event::Empty(start) = event {
                debug_assert_eq!(index, self.root_index);
                write_event(&mut writer, Event::Start(start.clone()))?;
            }
            for group in groups {
                write_event(&mut writer, Event::Text(BytesText::new("\n")))?;
                write_element(&mut writer, group, prefix, 0)?;
            }
            write_event(&mut writer, Event::Text(BytesText::new("\n")))?;
            match event {
                Event::Empty(_) => {
                    write_event(&mut writer, Event::End(BytesEnd::new(self.root_name.as_str())))?
                }
                _ => write_event(&mut writer, event.clone())?,
            }
        }

        Ok(writer.into_inner())
    }

    /// Renders and writes the document, creating missing parent directories first.
    pub fn write_to(&self, groups: &[SvgElement], output: &Path) -> Result<()> {
        let to_error = |source| MapError::OutputWrite {
            path: output.to_path_buf(),
            source,
        };

        let bytes = self.render(groups).map_err(to_error)?;
        ensure_parent_dir(output).map_err(to_error)?;
        fs::write(output, bytes).map_err(to_error)
    }
}

fn decode_template(bytes: &[u8]) -> std::result::Result<Cow<'_, str>, String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let utf8_error = match std::str::from_utf8(bytes) {
        Ok(text) => return Ok(Cow::Borrowed(text)),
        Err(e) => e,
    };

    let label = declared_encoding(bytes).ok_or_else(|| {
        format!("template is not valid UTF-8 and declares no encoding ({})", utf8_error)
    })?;
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| format!("unsupported template encoding {:?}", label))?;
    debug!("decoding template as {}", encoding.name());
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| format!("template is not valid {} despite its declaration", encoding.name()))
}

fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).ok()? {
            Event::Decl(decl) => {
                let label = decl.encoding()?.ok()?;
                return Some(String::from_utf8_lossy(&label).into_owned());
            }
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
            _ => return None,
        }
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> io::Result<()> {
    writer.write_event(event).map_err(io::Error::other)
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &SvgElement,
    prefix: &str,
    depth: usize,
) -> io::Result<()> {
    let tag = if prefix.is_empty() {
        element.tag.to_string()
    } else {
        format!("{}:{}", prefix, element.tag)
    };

    let mut start = BytesStart::new(tag.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((*key, value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    if let Some(text) = &element.text {
        write_event(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        let indent = format!("\n{}", INDENT.repeat(depth + 1));
        write_event(writer, Event::Text(BytesText::new(&indent)))?;
        write_element(writer, child, prefix, depth + 1)?;
    }
    if !element.children.is_empty() {
        let indent = format!("\n{}", INDENT.repeat(depth));
        write_event(writer, Event::Text(BytesText::new(&indent)))?;
    }
    write_event(writer, Event::End(BytesEnd::new(tag.as_str())))
}

fn check_attributes(start: &BytesStart<'_>) -> std::result::Result<(), String> {
    for attr in start.attributes() {
        attr.map_err(|e| {
            format!(
                "malformed attribute on <{}>: {}",
                String::from_utf8_lossy(start.name().as_ref()),
                e
            )
        })?;
    }
    Ok(())
}

fn canvas_size(root: &BytesStart<'_>) -> CanvasSize {
    CanvasSize {
        width: dimension(root, "width", DEFAULT_CANVAS_WIDTH),
        height: dimension(root, "height", DEFAULT_CANVAS_HEIGHT),
    }
}

fn dimension(root: &BytesStart<'_>, key: &str, default: f64) -> f64 {
    let Ok(Some(attr)) = root.try_get_attribute(key) else {
        debug!("template has no {}, using {}", key, default);
        return default;
    };

    let raw = String::from_utf8_lossy(&attr.value);
    match parse_length(&raw) {
        Some(value) => value,
        None => {
            warn!("template {} {:?} is not a pixel length, using {}", key, raw, default);
            default
        }
    }
}

/// Parses a root width/height: a positive number, optionally suffixed with `px`.
pub fn parse_length(value: &str) -> Option<f64> {
    let length = Length::from_str(value.trim()).ok()?;
    match length.unit {
        LengthUnit::None | LengthUnit::Px if length.number.is_finite() && length.number > 0.0 => {
            Some(length.number)
        }
        _ => None,
    }
}
