// SPDX-License-Identifier: CEPL-1.0
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open trace file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("trace write failed: {0}")]
    Write(#[from] io::Error),
}
