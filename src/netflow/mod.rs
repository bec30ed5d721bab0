//! NetFlow v9 stream decoding.
//!
//! https://www.rfc-editor.org/rfc/rfc3954

pub mod catalog;
mod decode;
mod message;
mod stream;
pub mod template;

use std::io::Read;

pub use decode::{
    FlowSet, OptionsTemplateRecord, SetHeader, TemplateRecord, TemplateState, read_set,
};
pub use message::{Header, Message, read_message};
pub use stream::ByteStream;
use template::TemplateCache;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("end of stream")]
    Eof,

    #[error(transparent)]
    Io(std::io::Error),

    #[error("failed to find a NetFlow v9 header within {attempts} bytes")]
    HeaderNotFound { attempts: usize },

    #[error("cannot rewind {requested} bytes, only {available} retained")]
    Rewind { requested: usize, available: usize },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of templates remembered for the whole run.
    pub template_capacity: usize,

    /// How many single byte steps are taken looking for a message header
    /// before giving up.
    pub max_resync: usize,

    /// Bytes left over after the last whole record of a data flow set that
    /// are accepted as alignment padding.
    pub padding_tolerance: usize,

    /// Dump raw bytes of every header and set.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            template_capacity: template::DEFAULT_CAPACITY,
            max_resync: 128,
            padding_tolerance: 4,
            debug: false,
        }
    }
}

pub struct Context<'a> {
    pub templates: &'a mut TemplateCache,
    pub padding_tolerance: usize,
    pub debug: bool,
}

/// Decoder walks a stream of back to back NetFlow v9 messages, keeping the
/// templates it learns along the way.
pub struct Decoder<R> {
    stream: ByteStream<R>,
    templates: TemplateCache,
    config: Config,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R, config: Config) -> Self {
        Decoder {
            stream: ByteStream::new(reader),
            templates: TemplateCache::with_capacity(config.template_capacity),
            config,
        }
    }

    #[inline]
    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Absolute offset of the next byte to be decoded.
    #[inline]
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn next_message(&mut self) -> Result<Message, Error> {
        let mut cx = Context {
            templates: &mut self.templates,
            padding_tolerance: self.config.padding_tolerance,
            debug: self.config.debug,
        };

        read_message(&mut self.stream, &mut cx, self.config.max_resync)
    }

    /// Decodes messages until the stream is exhausted and returns how many
    /// were decoded. Anything but the end of stream is fatal.
    pub fn run(&mut self) -> Result<usize, Error> {
        let mut messages = 0;

        loop {
            match self.next_message() {
                Ok(_message) => messages += 1,
                Err(Error::Eof) => return Ok(messages),
                Err(err) => return Err(err),
            }
        }
    }
}
