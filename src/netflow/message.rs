use std::io::Read;

use bytes::Buf;
use tracing::{debug, info, warn};

use super::decode::{FlowSet, read_set};
use super::stream::ByteStream;
use super::{Context, Error};
use crate::hexdump::HexDump;

pub const HEADER_SIZE: usize = 20;
pub const NETFLOW_V9_VERSION: u16 = 9;

/// NetFlow v9 packet header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    /// Total number of records in the packet, as claimed by the exporter.
    pub count: u16,
    /// Milliseconds since the exporting device booted.
    pub system_uptime: u32,
    pub unix_seconds: u32,
    pub sequence_number: u32,
    /// Observation domain of the exporter.
    pub source_id: u32,
}

impl Header {
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &buf[..];

        Header {
            version: buf.get_u16(),
            count: buf.get_u16(),
            system_uptime: buf.get_u32(),
            unix_seconds: buf.get_u32(),
            sequence_number: buf.get_u32(),
            source_id: buf.get_u32(),
        }
    }
}

#[derive(Debug)]
pub struct Message {
    pub header: Header,

    /// Bytes skipped before the header was found.
    pub skipped: usize,

    pub flow_sets: Vec<FlowSet>,

    /// Records accumulated over all flow sets, might exceed the count
    /// declared in the header.
    pub records: usize,

    /// False if the message was abandoned before the declared count was
    /// reached.
    pub complete: bool,
}

/// Finds the next message header, sliding forward one byte at a time for at
/// most `max_attempts` offsets. Returns the header and how many bytes were
/// skipped to get there.
pub fn sync_header<R: Read>(
    stream: &mut ByteStream<R>,
    max_attempts: usize,
    dump: bool,
) -> Result<(Header, usize), Error> {
    let mut buf = [0u8; HEADER_SIZE];

    for skipped in 0..max_attempts {
        stream.read_exact(&mut buf)?;

        let header = Header::decode(&buf);
        if header.version == NETFLOW_V9_VERSION {
            if dump {
                debug!(
                    message = "message header",
                    offset = stream.position() - HEADER_SIZE as u64,
                    dump = %HexDump(&buf)
                );
            }

            return Ok((header, skipped));
        }

        stream.rewind(HEADER_SIZE - 1)?;
    }

    Err(Error::HeaderNotFound {
        attempts: max_attempts,
    })
}

/// Reads one message, its header and the flow sets following it, until the
/// declared record count is satisfied.
pub fn read_message<R: Read>(
    stream: &mut ByteStream<R>,
    cx: &mut Context,
    max_resync: usize,
) -> Result<Message, Error> {
    let (header, skipped) = sync_header(stream, max_resync, cx.debug)?;

    if skipped > 0 {
        warn!(
            message = "skipped bytes looking for a header",
            skipped,
            offset = stream.position() - HEADER_SIZE as u64
        );
    }

    info!(
        message = "message header",
        version = header.version,
        count = header.count,
        uptime = header.system_uptime,
        export = header.unix_seconds,
        sequence = header.sequence_number,
        source_id = header.source_id,
    );

    let target = header.count as usize;
    let mut records = 0;
    let mut complete = true;
    let mut flow_sets = Vec::new();

    while records < target {
        let set = read_set(stream, cx)?;

        if set.is_empty() {
            warn!(
                message = "bailed before the declared number of records was read",
                records,
                count = target
            );

            complete = false;
            flow_sets.push(set);
            break;
        }

        records += set.records();
        flow_sets.push(set);
    }

    Ok(Message {
        header,
        skipped,
        flow_sets,
        records,
        complete,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use testify::netflow::{data_set, message_header, set, template_set};

    use super::*;
    use crate::netflow::template::{TemplateCache, TemplateSystem};

    fn context(templates: &mut TemplateCache) -> Context<'_> {
        Context {
            templates,
            padding_tolerance: 4,
            debug: false,
        }
    }

    #[test]
    fn decode_header() {
        let buf = [
            0x00, 0x09, 0x00, 0x03, 0x00, 0x00, 0x03, 0xe8, 0x65, 0x53, 0xf1, 0x00, 0x00, 0x00,
            0x00, 0x2a, 0x00, 0x00, 0x00, 0x07,
        ];
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(message_header(3, 42).len(), HEADER_SIZE);

        let header = Header::decode(&buf);

        assert_eq!(
            header,
            Header {
                version: 9,
                count: 3,
                system_uptime: 1000,
                unix_seconds: 0x6553f100,
                sequence_number: 42,
                source_id: 7,
            }
        );
    }

    #[test]
    fn resync_within_limit() {
        for garbage in [0usize, 1, 5, 127] {
            let mut data = vec![0xffu8; garbage];
            data.extend(message_header(0, 1));

            let mut stream = ByteStream::new(Cursor::new(data));
            let (header, skipped) = sync_header(&mut stream, 128, false).unwrap();

            assert_eq!(header.sequence_number, 1);
            assert_eq!(skipped, garbage);
            assert_eq!(stream.position(), (garbage + HEADER_SIZE) as u64);
        }
    }

    #[test]
    fn resync_gives_up() {
        let mut data = vec![0xffu8; 128];
        data.extend(message_header(0, 1));

        let mut stream = ByteStream::new(Cursor::new(data));
        let err = sync_header(&mut stream, 128, false).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { attempts: 128 }));
    }

    #[test]
    fn resync_hits_eof() {
        let mut stream = ByteStream::new(Cursor::new(vec![0xffu8; 20]));
        let err = sync_header(&mut stream, 128, false).unwrap_err();
        assert!(matches!(err, Error::Eof));
    }

    #[test]
    fn template_and_data() {
        let mut data = message_header(1, 1);
        data.extend(template_set(256, &[(8, 4), (7, 2)]));
        data.extend(data_set(256, &[0x11; 12]));

        let mut templates = TemplateCache::default();
        let mut cx = context(&mut templates);
        let mut stream = ByteStream::new(Cursor::new(data));
        let message = read_message(&mut stream, &mut cx, 128).unwrap();

        assert_eq!(message.skipped, 0);
        assert_eq!(message.records, 2);
        assert!(message.complete);
        assert_eq!(message.flow_sets.len(), 2);
        assert_eq!(message.flow_sets[1].records(), 2);
        assert_eq!(templates.get(256).unwrap().record_length, 6);
    }

    #[test]
    fn abandoned_on_unexpected_set_id() {
        // declares 5 records, carries 2 and then the next message starts
        let mut data = message_header(5, 1);
        data.extend(template_set(256, &[(1, 4)]));
        data.extend(data_set(256, &[0; 8]));
        data.extend(message_header(1, 2));
        data.extend(data_set(256, &[0; 4]));

        let mut templates = TemplateCache::default();
        let mut cx = context(&mut templates);
        let mut stream = ByteStream::new(Cursor::new(data));

        let first = read_message(&mut stream, &mut cx, 128).unwrap();
        assert!(!first.complete);
        assert_eq!(first.records, 2);
        assert_eq!(
            first.flow_sets.last(),
            Some(&FlowSet::Unexpected { set_id: 9 })
        );

        // the rewound header is found right away
        let second = read_message(&mut stream, &mut cx, 128).unwrap();
        assert_eq!(second.skipped, 0);
        assert_eq!(second.header.sequence_number, 2);
        assert_eq!(second.records, 1);
        assert!(second.complete);
    }

    #[test]
    fn abandoned_on_empty_set() {
        let mut data = message_header(3, 1);
        data.extend(template_set(256, &[(1, 4), (2, 4), (4, 2)]));
        // shorter than one record
        data.extend(data_set(256, &[0; 6]));
        data.extend(set(0, &[]));
        data.extend(message_header(1, 2));
        data.extend(data_set(256, &[0; 10]));

        let mut templates = TemplateCache::default();
        let mut cx = context(&mut templates);
        let mut stream = ByteStream::new(Cursor::new(data));

        let first = read_message(&mut stream, &mut cx, 128).unwrap();
        assert!(!first.complete);
        assert_eq!(first.records, 0);
        assert_eq!(first.flow_sets.len(), 2);
        assert_eq!(cx.templates.get(256).unwrap().record_length, 10);

        // the empty template set is skipped over while looking for a header
        let second = read_message(&mut stream, &mut cx, 128).unwrap();
        assert_eq!(second.skipped, 4);
        assert_eq!(second.header.sequence_number, 2);
        assert_eq!(second.records, 1);
        assert!(second.complete);
    }

    #[test]
    fn zeros_end_the_message() {
        let mut data = message_header(2, 1);
        data.extend([0u8; 12]);
        data.extend(message_header(0, 2));

        let mut templates = TemplateCache::default();
        let mut cx = context(&mut templates);
        let mut stream = ByteStream::new(Cursor::new(data));

        // zeros read as a template set of length 0
        let first = read_message(&mut stream, &mut cx, 128).unwrap();
        assert!(!first.complete);
        assert_eq!(
            first.flow_sets,
            vec![FlowSet::Template {
                records: vec![],
                consumed: 0,
                length: 0,
            }]
        );

        let second = read_message(&mut stream, &mut cx, 128).unwrap();
        assert_eq!(second.skipped, 8);
        assert_eq!(second.header.sequence_number, 2);
    }

    #[test]
    fn empty_message() {
        let mut data = message_header(0, 1);
        data.extend(message_header(0, 2));

        let mut templates = TemplateCache::default();
        let mut cx = context(&mut templates);
        let mut stream = ByteStream::new(Cursor::new(data));

        let first = read_message(&mut stream, &mut cx, 128).unwrap();
        assert!(first.flow_sets.is_empty());
        let second = read_message(&mut stream, &mut cx, 128).unwrap();
        assert_eq!(second.header.sequence_number, 2);
    }
}
