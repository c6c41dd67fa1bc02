//! Dump emitters.
//!
//! The text layout aligns values on 20-column tab stops:
//!
//! ```text
//! FLV header
//!
//! ## OFFSET           0
//! Signature           FLV
//! ```

use std::io::Write;

use flv::{BlockKind, Record, RecordBlock};

use crate::cli::OutputFormat;
use crate::error::Result;

const TAB_SIZE: usize = 20;

/// Receives record blocks in stream order.
pub trait Emitter {
    fn header(&mut self, block: &RecordBlock) -> Result<()>;

    fn tag(&mut self, block: &RecordBlock) -> Result<()>;

    /// Flush everything emitted so far. Called on success and on error.
    fn finish(&mut self) -> Result<()>;
}

pub fn emitter<'w>(format: OutputFormat, writer: Box<dyn Write + 'w>) -> Box<dyn Emitter + 'w> {
    match format {
        OutputFormat::Text => Box::new(TextEmitter::new(writer)),
        OutputFormat::Json => Box::new(JsonEmitter::new(writer)),
    }
}

/// Pad `line` with spaces to the next tab stop.
fn push_tab(line: &mut String) {
    let stop = (line.chars().count() / TAB_SIZE + 1) * TAB_SIZE;
    while line.chars().count() < stop {
        line.push(' ');
    }
}

fn format_record(record: &Record) -> String {
    let mut line = " ".repeat(record.depth as usize * TAB_SIZE);
    line.push_str(&record.label);
    push_tab(&mut line);
    line.push_str(&record.value.to_string());
    line
}

fn format_offset(offset: u64) -> String {
    let mut line = String::from("## OFFSET");
    push_tab(&mut line);
    line.push_str(&offset.to_string());
    line
}

pub struct TextEmitter<W: Write> {
    writer: W,
}

impl<W: Write> TextEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_records(&mut self, block: &RecordBlock) -> Result<()> {
        writeln!(self.writer, "{}", format_offset(block.offset))?;
        for record in &block.records {
            writeln!(self.writer, "{}", format_record(record))?;
            if matches!(block.kind, BlockKind::Tag { .. }) && record.label == "StreamID" {
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Emitter for TextEmitter<W> {
    fn header(&mut self, block: &RecordBlock) -> Result<()> {
        write!(self.writer, "FLV header\n\n")?;
        self.write_records(block)?;
        write!(self.writer, "\n\n")?;
        Ok(())
    }

    fn tag(&mut self, block: &RecordBlock) -> Result<()> {
        if let BlockKind::Tag { index } = block.kind {
            write!(self.writer, "\n\nTag No. {index}\n\n")?;
        }
        self.write_records(block)
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Streams one `{"header": ..., "tags": [...]}` document.
pub struct JsonEmitter<W: Write> {
    writer: W,
    opened: bool,
    tags: usize,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            opened: false,
            tags: 0,
        }
    }

    fn open(&mut self, header: Option<&RecordBlock>) -> Result<()> {
        write!(self.writer, "{{\"header\":")?;
        serde_json::to_writer(&mut self.writer, &header)?;
        write!(self.writer, ",\"tags\":[")?;
        self.opened = true;
        Ok(())
    }
}

impl<W: Write> Emitter for JsonEmitter<W> {
    fn header(&mut self, block: &RecordBlock) -> Result<()> {
        self.open(Some(block))
    }

    fn tag(&mut self, block: &RecordBlock) -> Result<()> {
        if !self.opened {
            self.open(None)?;
        }
        if self.tags > 0 {
            write!(self.writer, ",")?;
        }
        writeln!(self.writer)?;
        serde_json::to_writer(&mut self.writer, block)?;
        self.tags += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.opened {
            self.open(None)?;
        }
        writeln!(self.writer, "]}}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use flv::RecordValue;

    #[test]
    fn test_record_alignment() {
        assert_eq!(
            format_record(&Record::new("Signature", "FLV")),
            "Signature           FLV"
        );
        assert_eq!(
            format_record(&Record::new("keyframe[0]", 0.0).nested(2)),
            format!("{}keyframe[0]         0.0", " ".repeat(40))
        );
        assert_eq!(format_offset(13), "## OFFSET           13");
    }

    #[test]
    fn test_long_label_moves_to_next_stop() {
        let record = Record::new("a_very_long_property_name", RecordValue::Unsigned(1));
        let line = format_record(&record);
        assert_eq!(line.len(), 41);
        assert!(line.ends_with("     1"));
    }

    #[test]
    fn test_text_emitter_layout() {
        let header = RecordBlock {
            kind: BlockKind::FileHeader,
            offset: 0,
            records: vec![Record::new("Signature", "FLV")],
        };
        let tag = RecordBlock {
            kind: BlockKind::Tag { index: 1 },
            offset: 13,
            records: vec![
                Record::new("StreamID", 0u32),
                Record::new("PreviousTagSize", 13u32),
            ],
        };

        let mut out = Vec::new();
        {
            let mut emitter = TextEmitter::new(&mut out);
            emitter.header(&header).unwrap();
            emitter.tag(&tag).unwrap();
            emitter.finish().unwrap();
        }

        let expected = "FLV header\n\n\
            ## OFFSET           0\n\
            Signature           FLV\n\
            \n\n\
            \n\nTag No. 1\n\n\
            ## OFFSET           13\n\
            StreamID            0\n\
            \n\
            PreviousTagSize     13\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_json_emitter() {
        let header = RecordBlock {
            kind: BlockKind::FileHeader,
            offset: 0,
            records: vec![Record::new("Version", 1u8)],
        };

        let mut out = Vec::new();
        {
            let mut emitter = JsonEmitter::new(&mut out);
            emitter.header(&header).unwrap();
            emitter.finish().unwrap();
        }

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["header"]["kind"], "file_header");
        assert_eq!(value["header"]["records"][0]["label"], "Version");
        assert_eq!(value["header"]["records"][0]["value"], 1);
        assert_eq!(value["tags"], serde_json::json!([]));
    }

    #[test]
    fn test_json_emitter_streams_tags() {
        let header = RecordBlock {
            kind: BlockKind::FileHeader,
            offset: 0,
            records: vec![Record::new("Signature", "FLV")],
        };
        let tag = |index: u32, offset: u64| RecordBlock {
            kind: BlockKind::Tag { index },
            offset,
            records: vec![Record::new("TagType", "Audio")],
        };

        let mut out = Vec::new();
        {
            let mut emitter = JsonEmitter::new(&mut out);
            emitter.header(&header).unwrap();
            emitter.tag(&tag(1, 13)).unwrap();
            emitter.tag(&tag(2, 40)).unwrap();
            emitter.finish().unwrap();
        }

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["header"]["records"][0]["value"], "FLV");
        assert_eq!(value["tags"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["tags"][0]["kind"], "tag");
        assert_eq!(value["tags"][0]["index"], 1);
        assert_eq!(value["tags"][1]["offset"], 40);
    }

    #[test]
    fn test_json_emitter_without_header() {
        let mut out = Vec::new();
        JsonEmitter::new(&mut out).finish().unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!({ "header": null, "tags": [] }));
    }
}
