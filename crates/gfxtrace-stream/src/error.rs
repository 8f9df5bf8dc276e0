// SPDX-License-Identifier: CEPL-1.0
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("trace i/o: {0}")]
    Io(#[from] io::Error),
    #[error("trace ends in the middle of an event")]
    Truncated,
    #[error("bad trace magic {0:#018x}")]
    BadMagic(u64),
    #[error("unknown graphics backend {0:#x}")]
    UnknownBackend(u32),
    #[error("unknown event tag {0}")]
    UnknownTag(u32),
    #[error("unknown {kind} value {value}")]
    UnknownDiscriminant { kind: &'static str, value: u32 },
    #[error("recorded string is not UTF-8")]
    InvalidString(#[source] std::string::FromUtf8Error),
}

impl StreamError {
    /// Maps a short `read_exact` to `Truncated`, keeping other I/O failures.
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StreamError::Truncated
        } else {
            StreamError::Io(e)
        }
    }

    pub(crate) fn discriminant(kind: &'static str) -> impl FnOnce(u32) -> Self {
        move |value| StreamError::UnknownDiscriminant { kind, value }
    }
}
