// SPDX-License-Identifier: CEPL-1.0
use crate::context::{ReplayContext, ReplayStats};
use crate::error::ReplayError;
use crate::registry::HandleRegistry;
use gfxtrace_render::*;
use gfxtrace_stream::{Event, TraceReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, error, info};

/// How a call to [`Replayer::play_frame`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEnd {
    /// A frame boundary was reached; more events may follow.
    Presented,
    /// The stream ended cleanly.
    EndOfStream,
}

/// Plays a trace against a live application one frame at a time.
pub struct Replayer<R: Read = BufReader<File>> {
    reader: TraceReader<R>,
    ctx: ReplayContext,
    finished: bool,
}

impl Replayer<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let reader = TraceReader::open(path).map_err(|source| ReplayError::Open {
            path: path.to_owned(),
            source,
        })?;
        info!(path = %path.display(), api = %reader.api(), "trace opened");
        Ok(Self::from_trace(reader))
    }
}

impl<R: Read> Replayer<R> {
    /// Reads the header from `inner`.
    pub fn from_reader(inner: R) -> Result<Self, ReplayError> {
        Ok(Self::from_trace(TraceReader::new(inner)?))
    }

    fn from_trace(reader: TraceReader<R>) -> Self {
        Replayer {
            ctx: ReplayContext::new(reader.api()),
            reader,
            finished: false,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.ctx.set_strict(strict);
        self
    }

    /// Backend the trace was recorded on.
    pub fn api(&self) -> DeviceApi {
        self.ctx.api()
    }

    pub fn stats(&self) -> ReplayStats {
        self.ctx.stats()
    }

    pub fn registry(&self) -> &HandleRegistry {
        self.ctx.registry()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies events up to and including the next frame boundary.
    ///
    /// A decode failure ends playback: the partially applied frame is not presented and later
    /// calls report [`FrameEnd::EndOfStream`].
    pub fn play_frame(&mut self, app: &mut dyn Application) -> Result<FrameEnd, ReplayError> {
        if self.finished {
            return Ok(FrameEnd::EndOfStream);
        }
        loop {
            match self.reader.next_event() {
                Ok(Some(event)) => {
                    let boundary = matches!(event, Event::Present);
                    self.ctx.apply(app, event);
                    if boundary {
                        self.ctx.stats.frames += 1;
                        return Ok(FrameEnd::Presented);
                    }
                }
                Ok(None) => {
                    self.finished = true;
                    debug!(events = self.reader.events_read(), "end of trace");
                    return Ok(FrameEnd::EndOfStream);
                }
                Err(e) => {
                    self.finished = true;
                    error!(%e, after = self.reader.events_read(), "trace stream broken");
                    return Err(e.into());
                }
            }
        }
    }

    /// One host frame: plays the next trace frame into the current back buffer, then runs the
    /// effects and presents.
    pub fn step(&mut self, app: &mut dyn Application) -> Result<FrameEnd, ReplayError> {
        let back_buffer = app.current_back_buffer();
        app.command_list().barrier(&[Barrier {
            resource: back_buffer,
            old_state: ResourceUsage::PRESENT,
            new_state: ResourceUsage::RENDER_TARGET,
        }]);
        let end = self.play_frame(app)?;
        app.command_list().barrier(&[Barrier {
            resource: back_buffer,
            old_state: ResourceUsage::RENDER_TARGET,
            new_state: ResourceUsage::PRESENT,
        }]);
        app.update_effects();
        app.present().map_err(ReplayError::Present)?;
        Ok(end)
    }

    /// Destroys every object created by the replay.
    pub fn release(&mut self, app: &mut dyn Application) {
        self.ctx.release_all(app.device());
    }
}
