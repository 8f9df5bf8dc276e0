// SPDX-License-Identifier: CEPL-1.0
use crate::error::StreamError;
use crate::event::{Event, EventTag};
use crate::wire;
use bytemuck::Pod;
use gfxtrace_render::DeviceApi;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::trace;

/// "APITRACE" read as a little-endian integer.
pub const MAGIC: u64 = u64::from_le_bytes(*b"APITRACE");

pub struct TraceWriter<W: Write> {
    inner: W,
}

impl TraceWriter<BufWriter<File>> {
    /// Creates (truncating) a trace file and writes its header.
    pub fn create(path: &Path, api: DeviceApi) -> io::Result<Self> {
        let mut writer = TraceWriter::new(BufWriter::new(File::create(path)?));
        writer.write_header(api)?;
        Ok(writer)
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(inner: W) -> Self {
        TraceWriter { inner }
    }

    pub fn write_header(&mut self, api: DeviceApi) -> io::Result<()> {
        self.write_pod(&MAGIC)?;
        self.write_pod(&(api as u32))
    }

    pub fn write_event(&mut self, event: &Event) -> io::Result<()> {
        event.encode(&mut self.inner)
    }

    pub fn write_pod<T: Pod>(&mut self, value: &T) -> io::Result<()> {
        wire::write_pod(&mut self.inner, value)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

pub struct TraceReader<R: Read> {
    inner: R,
    api: DeviceApi,
    events: u64,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, StreamError> {
        TraceReader::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> TraceReader<R> {
    /// Reads and validates the header.
    pub fn new(mut inner: R) -> Result<Self, StreamError> {
        let magic: u64 = wire::read_pod(&mut inner)?;
        if magic != MAGIC {
            return Err(StreamError::BadMagic(magic));
        }
        let tag: u32 = wire::read_pod(&mut inner)?;
        let api = DeviceApi::try_from(tag).map_err(StreamError::UnknownBackend)?;
        Ok(TraceReader {
            inner,
            api,
            events: 0,
        })
    }

    pub fn api(&self) -> DeviceApi {
        self.api
    }

    /// Number of events decoded so far.
    pub fn events_read(&self) -> u64 {
        self.events
    }

    /// Next event, or `None` when the stream ends cleanly on an event boundary.
    pub fn next_event(&mut self) -> Result<Option<Event>, StreamError> {
        let Some(raw) = self.read_tag()? else {
            return Ok(None);
        };
        let tag = EventTag::try_from(raw).map_err(StreamError::UnknownTag)?;
        let event = Event::decode_payload(tag, &mut self.inner)?;
        self.events += 1;
        trace!(event = tag.name(), index = self.events, "decoded");
        Ok(Some(event))
    }

    fn read_tag(&mut self) -> Result<Option<u32>, StreamError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_ne_bytes(buf))),
            _ => Err(StreamError::Truncated),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for TraceReader<R> {
    type Item = Result<Event, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfxtrace_render::Resource;
    use std::io::Cursor;

    fn header(api: DeviceApi) -> Vec<u8> {
        let mut w = TraceWriter::new(Vec::new());
        w.write_header(api).unwrap();
        w.into_inner()
    }

    #[test]
    fn magic_spells_apitrace_on_disk() {
        let bytes = header(DeviceApi::D3D11);
        if cfg!(target_endian = "little") {
            assert_eq!(&bytes[..8], b"APITRACE");
        }
        assert_eq!(bytes.len(), 12);
        let reader = TraceReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.api(), DeviceApi::D3D11);
    }

    #[test]
    fn bad_magic_and_backend_are_rejected() {
        let mut bytes = header(DeviceApi::OpenGL);
        bytes[0] ^= 0xff;
        assert!(matches!(
            TraceReader::new(Cursor::new(bytes)),
            Err(StreamError::BadMagic(_))
        ));

        let mut bytes = header(DeviceApi::OpenGL);
        bytes[8..12].copy_from_slice(&0x1234u32.to_ne_bytes());
        assert!(matches!(
            TraceReader::new(Cursor::new(bytes)),
            Err(StreamError::UnknownBackend(0x1234))
        ));
    }

    #[test]
    fn clean_end_partial_tag_and_unknown_tag() {
        let mut w = TraceWriter::new(Cursor::new(header(DeviceApi::Vulkan)));
        w.inner.set_position(12);
        w.write_event(&Event::DestroyResource { handle: Resource(9) }).unwrap();
        let bytes = w.into_inner().into_inner();

        let mut r = TraceReader::new(Cursor::new(bytes.clone())).unwrap();
        assert_eq!(
            r.next_event().unwrap(),
            Some(Event::DestroyResource { handle: Resource(9) })
        );
        assert!(r.next_event().unwrap().is_none());
        assert_eq!(r.events_read(), 1);

        let mut partial = bytes.clone();
        partial.extend_from_slice(&[1, 0]);
        let mut r = TraceReader::new(Cursor::new(partial)).unwrap();
        r.next_event().unwrap();
        assert!(matches!(r.next_event(), Err(StreamError::Truncated)));

        let mut unknown = bytes;
        unknown.extend_from_slice(&999u32.to_ne_bytes());
        let mut r = TraceReader::new(Cursor::new(unknown)).unwrap();
        r.next_event().unwrap();
        assert!(matches!(r.next_event(), Err(StreamError::UnknownTag(999))));
    }
}
