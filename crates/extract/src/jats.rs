//! Streaming JATS reader.
//!
//! Denylisted inline tags are treated as transparent, so their text merges
//! into the surrounding run. Paragraph and title elements are selected when
//! they sit directly under `abstract`, or anywhere below a `sec` that is a
//! direct child of `body`. Element ancestry is tracked on an explicit stack
//! of surviving elements, which keeps selection correct after stripping.
//!
//! Malformed input never fails: unmatched end tags are ignored, a mismatched
//! end tag closes up to the nearest open element of that name, and the first
//! syntax error ends the read with whatever was collected so far.

use std::collections::HashSet;

use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesText, Event};
use quick_xml::reader::Reader;
use tracing::warn;

use crate::config::{ExtractConfig, TextFidelity};

struct Frame {
    name: Vec<u8>,
    collector: Option<usize>,
}

#[derive(Default)]
struct Collector {
    text: String,
    /// FirstRun only: the first fragment is complete.
    sealed: bool,
}

struct Walk<'c> {
    fidelity: TextFidelity,
    strip: HashSet<&'c [u8]>,
    stack: Vec<Frame>,
    collectors: Vec<Collector>,
}

impl<'c> Walk<'c> {
    fn new(cfg: &'c ExtractConfig) -> Self {
        Self {
            fidelity: cfg.fidelity,
            strip: cfg.strip_tags.iter().map(|t| t.as_bytes()).collect(),
            stack: Vec::new(),
            collectors: Vec::new(),
        }
    }

    fn is_stripped(&self, name: &[u8]) -> bool {
        self.strip.contains(name)
    }

    fn is_selected(&self, name: &[u8]) -> bool {
        if name != b"p" && name != b"title" {
            return false;
        }
        if self
            .stack
            .last()
            .is_some_and(|parent| parent.name == b"abstract")
        {
            return true;
        }
        self.stack
            .windows(2)
            .any(|pair| pair[0].name == b"body" && pair[1].name == b"sec")
    }

    fn open(&mut self, name: &[u8]) {
        self.boundary();
        let collector = if self.is_selected(name) {
            self.collectors.push(Collector::default());
            Some(self.collectors.len() - 1)
        } else {
            None
        };
        self.stack.push(Frame {
            name: name.to_vec(),
            collector,
        });
    }

    fn close(&mut self, name: &[u8]) {
        let Some(pos) = self.stack.iter().rposition(|f| f.name == name) else {
            return;
        };
        self.boundary();
        self.stack.truncate(pos);
    }

    /// A surviving element edge between two text fragments.
    fn boundary(&mut self) {
        if self.fidelity != TextFidelity::FirstRun {
            return;
        }
        for frame in &self.stack {
            if let Some(idx) = frame.collector {
                let c = &mut self.collectors[idx];
                if !c.text.is_empty() {
                    c.sealed = true;
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for frame in &self.stack {
            if let Some(idx) = frame.collector {
                let c = &mut self.collectors[idx];
                if !c.sealed {
                    c.text.push_str(text);
                }
            }
        }
    }

    fn finish(self) -> Vec<String> {
        self.collectors
            .into_iter()
            .map(|c| c.text)
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}

/// Resolve entity references one at a time. Undefined named entities such
/// as `&nbsp;` are dropped without touching the rest of the run.
fn decode_text(e: &BytesText<'_>) -> String {
    let raw = String::from_utf8_lossy(e.as_ref());
    let resolved = unescape_with(&raw, |entity| {
        Some(resolve_predefined_entity(entity).unwrap_or(""))
    });
    match resolved {
        Ok(text) => text.into_owned(),
        // bare `&` or a broken character reference
        Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
    }
}

pub(crate) fn extract_jats(xml: &[u8], cfg: &ExtractConfig) -> Vec<String> {
    let mut reader = Reader::from_reader(xml);
    {
        let rc = reader.config_mut();
        rc.trim_text(false);
        rc.check_end_names = false;
        rc.allow_unmatched_ends = true;
    }

    let mut walk = Walk::new(cfg);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                if !walk.is_stripped(local.as_ref()) {
                    walk.open(local.as_ref());
                }
            }
            Ok(Event::End(e)) => {
                let local = e.local_name();
                if !walk.is_stripped(local.as_ref()) {
                    walk.close(local.as_ref());
                }
            }
            Ok(Event::Empty(e)) => {
                if !walk.is_stripped(e.local_name().as_ref()) {
                    walk.boundary();
                }
            }
            Ok(Event::Text(e)) => {
                let text = decode_text(&e);
                walk.text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                walk.text(&text);
            }
            Ok(Event::Comment(_)) | Ok(Event::PI(_)) => walk.boundary(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(
                    position = reader.error_position(),
                    error = %err,
                    "extract.xml_recovered"
                );
                break;
            }
        }
        buf.clear();
    }
    walk.finish()
}
