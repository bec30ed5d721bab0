use std::io::Read;

use bytes::Buf;
use tracing::{debug, info, warn};

use super::catalog;
use super::stream::ByteStream;
use super::template::{Field, Template, TemplateSystem};
use super::{Context, Error};
use crate::hexdump::HexDump;

pub const SET_HEADER_SIZE: usize = 4;
pub const RECORD_HEADER_SIZE: usize = 4;
pub const FIELD_SPEC_SIZE: usize = 4;
pub const OPTIONS_HEADER_SIZE: usize = 6;
/// Trailing bytes of an options template set too short to hold anything.
pub const OPTIONS_PADDING: usize = 2;

pub const TEMPLATE_SET_ID: u16 = 0;
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetHeader {
    /// 0 for template sets, 1 for options template sets, data flow sets
    /// carry the id of their template, which is 256 or above.
    pub id: u16,

    /// Total length of the set, this header included.
    pub length: u16,
}

impl SetHeader {
    pub fn decode(buf: &[u8; SET_HEADER_SIZE]) -> Self {
        let mut buf = &buf[..];

        SetHeader {
            id: buf.get_u16(),
            length: buf.get_u16(),
        }
    }

    /// Length of the set without its header.
    #[inline]
    pub fn body_length(&self) -> usize {
        (self.length as usize).saturating_sub(SET_HEADER_SIZE)
    }
}

/// What happened to a template record found in a template set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateState {
    /// Parsed and added to the cache.
    Stored,
    /// Parsed, but the cache is full.
    Dropped,
    /// The id is cached already, fields are skipped without parsing.
    Seen,
    /// The set ends in the middle of the record.
    Truncated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateRecord {
    pub id: u16,
    pub field_count: u16,
    /// Sum of the field lengths, only known when the fields are parsed.
    pub record_length: Option<u16>,
    pub state: TemplateState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionsTemplateRecord {
    pub id: u16,
    pub scope_length: u16,
    pub options_length: u16,
}

#[derive(Debug, PartialEq)]
pub enum FlowSet {
    Template {
        records: Vec<TemplateRecord>,
        /// Bytes of the body walked over, might exceed `length` if a record
        /// claims more fields than the set holds.
        consumed: usize,
        length: usize,
    },
    OptionsTemplate {
        records: Vec<OptionsTemplateRecord>,
        consumed: usize,
        length: usize,
    },
    Data {
        template_id: u16,
        length: usize,
        /// Whole records in the set. Without a known template this is an
        /// estimate of one.
        records: usize,
        /// Bytes after the last whole record.
        remainder: usize,
        /// `remainder` is too large to be alignment padding.
        padding_anomaly: bool,
        template: Option<Template>,
    },
    /// A set id in 2..=255 showed up, which most likely means the message
    /// declared more records than it carries. The set header is pushed back
    /// into the stream and nothing else is read.
    Unexpected { set_id: u16 },
}

impl FlowSet {
    /// How many records this set contributes towards the record count
    /// declared in the message header.
    pub fn records(&self) -> usize {
        match self {
            FlowSet::Template { .. } | FlowSet::Unexpected { .. } => 0,
            FlowSet::OptionsTemplate { records, .. } => records.len(),
            FlowSet::Data { records, .. } => *records,
        }
    }

    /// True if nothing was decoded from the set, which ends the message it
    /// belongs to. Template sets count as empty only when no bytes of their
    /// body were walked.
    pub fn is_empty(&self) -> bool {
        match self {
            FlowSet::Template { consumed, .. } => *consumed == 0,
            FlowSet::Unexpected { .. } => true,
            _ => self.records() == 0,
        }
    }
}

/// Whether the bytes walked in a set body disagree with its length, allowing
/// for `slack` bytes of trailing padding.
fn length_mismatch(consumed: usize, length: usize, slack: usize) -> bool {
    consumed > length || length - consumed > slack
}

/// Reads a set header and the set it announces.
pub fn read_set<R: Read>(stream: &mut ByteStream<R>, cx: &mut Context) -> Result<FlowSet, Error> {
    let mut buf = [0u8; SET_HEADER_SIZE];
    stream.read_exact(&mut buf)?;

    if cx.debug {
        debug!(message = "set header", offset = stream.position(), dump = %HexDump(&buf));
    }

    decode_set(stream, SetHeader::decode(&buf), cx)
}

pub fn decode_set<R: Read>(
    stream: &mut ByteStream<R>,
    header: SetHeader,
    cx: &mut Context,
) -> Result<FlowSet, Error> {
    match header.id {
        TEMPLATE_SET_ID => {
            info!(
                message = "template set",
                set_id = header.id,
                length = header.length
            );

            let body = read_body(stream, header.body_length(), cx.debug)?;
            let (records, consumed) = decode_template_records(&body, cx);
            if length_mismatch(consumed, body.len(), 0) {
                warn!(
                    message = "read the wrong length",
                    consumed,
                    expected = body.len()
                );
            }

            Ok(FlowSet::Template {
                records,
                consumed,
                length: body.len(),
            })
        }
        OPTIONS_TEMPLATE_SET_ID => {
            info!(
                message = "options template set",
                set_id = header.id,
                length = header.length
            );

            let body = read_body(stream, header.body_length(), cx.debug)?;
            let (records, consumed) = decode_options_template_records(&body);
            if length_mismatch(consumed, body.len(), OPTIONS_PADDING) {
                warn!(
                    message = "read the wrong length",
                    consumed,
                    expected = body.len()
                );
            }

            Ok(FlowSet::OptionsTemplate {
                records,
                consumed,
                length: body.len(),
            })
        }
        set_id @ 2..=255 => {
            stream.rewind(SET_HEADER_SIZE)?;

            warn!(
                message = "unexpected set id before full record count",
                set_id,
                length = header.length
            );

            Ok(FlowSet::Unexpected { set_id })
        }
        template_id => {
            info!(
                message = "data flow set",
                set_id = template_id,
                length = header.length
            );

            let body = read_body(stream, header.body_length(), cx.debug)?;
            let template = cx.templates.get(template_id).copied();
            let (records, remainder) = count_data_records(body.len(), template.as_ref());
            let padding_anomaly = remainder > cx.padding_tolerance;
            if padding_anomaly {
                warn!(
                    message = "unusual byte padding on flow record",
                    template_id,
                    remainder
                );
            }

            info!(message = "found records", template_id, records);

            Ok(FlowSet::Data {
                template_id,
                length: body.len(),
                records,
                remainder,
                padding_anomaly,
                template,
            })
        }
    }
}

fn read_body<R: Read>(
    stream: &mut ByteStream<R>,
    length: usize,
    dump: bool,
) -> Result<Vec<u8>, Error> {
    let offset = stream.position();
    let body = stream.read_vec(length)?;

    if dump {
        debug!(message = "set body", offset, length, dump = %HexDump(&body));
    }

    Ok(body)
}

/// Walks the template records of a template set body, storing the unseen
/// ones. Returns the records and how many bytes were walked over.
pub fn decode_template_records(body: &[u8], cx: &mut Context) -> (Vec<TemplateRecord>, usize) {
    let mut pos = 0;
    let mut records = Vec::new();

    while pos < body.len() {
        if body.len() - pos < RECORD_HEADER_SIZE {
            warn!(
                message = "trailing bytes too short for a template record",
                offset = pos,
                length = body.len()
            );
            break;
        }

        let mut buf = &body[pos..];
        let id = buf.get_u16();
        let field_count = buf.get_u16();
        pos += RECORD_HEADER_SIZE;

        info!(message = "template record", template_id = id, field_count);

        if cx.templates.get(id).is_some() {
            pos += FIELD_SPEC_SIZE * field_count as usize;

            info!(
                message = "template already seen",
                template_id = id,
                offset = pos,
                length = body.len()
            );

            records.push(TemplateRecord {
                id,
                field_count,
                record_length: None,
                state: TemplateState::Seen,
            });
            continue;
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for index in 0..field_count {
            if body.len() - pos < FIELD_SPEC_SIZE {
                break;
            }

            let mut buf = &body[pos..];
            let field = Field {
                typ: buf.get_u16(),
                length: buf.get_u16(),
            };
            pos += FIELD_SPEC_SIZE;

            info!(
                message = "template field",
                index,
                field = catalog::display_name(field.typ),
                id = field.typ,
                length = field.length
            );

            fields.push(field);
        }

        if fields.len() < field_count as usize {
            warn!(
                message = "template record truncated",
                template_id = id,
                field_count,
                parsed = fields.len()
            );

            records.push(TemplateRecord {
                id,
                field_count,
                record_length: None,
                state: TemplateState::Truncated,
            });
            break;
        }

        let template = Template::from_fields(id, &fields);
        let state = if cx.templates.add(template) {
            info!(
                message = "template stored",
                template_id = id,
                record_length = template.record_length
            );

            TemplateState::Stored
        } else {
            debug!(message = "template cache is full", template_id = id);

            TemplateState::Dropped
        };

        info!(
            message = "template done",
            template_id = id,
            offset = pos,
            length = body.len()
        );

        records.push(TemplateRecord {
            id,
            field_count,
            record_length: Some(template.record_length),
            state,
        });
    }

    (records, pos)
}

/// Walks the options template records of an options template set body.
/// Their fields are skipped, options templates are not needed to walk data
/// flow sets. Returns the records and how many bytes were walked over.
pub fn decode_options_template_records(body: &[u8]) -> (Vec<OptionsTemplateRecord>, usize) {
    let mut pos = 0;
    let mut records = Vec::new();

    // the last two bytes might be padding, and are too short to be another
    // record anyway
    while pos + OPTIONS_PADDING < body.len() {
        if body.len() - pos < OPTIONS_HEADER_SIZE {
            warn!(
                message = "trailing bytes too short for an options template record",
                offset = pos,
                length = body.len()
            );
            break;
        }

        let mut buf = &body[pos..];
        let record = OptionsTemplateRecord {
            id: buf.get_u16(),
            scope_length: buf.get_u16(),
            options_length: buf.get_u16(),
        };

        info!(
            message = "options template record",
            template_id = record.id,
            scope_length = record.scope_length,
            options_length = record.options_length
        );

        pos += OPTIONS_HEADER_SIZE + record.scope_length as usize + record.options_length as usize;
        records.push(record);
    }

    (records, pos)
}

/// Counts the whole records of a data flow set body and the bytes left
/// after them.
///
/// Without a usable template the set is assumed to hold exactly one record.
/// That is a guess, nothing on the wire backs it.
pub fn count_data_records(length: usize, template: Option<&Template>) -> (usize, usize) {
    match template {
        Some(template) if template.record_length > 0 => {
            let record_length = template.record_length as usize;
            (length / record_length, length % record_length)
        }
        _ => (1, 0),
    }
}
