// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use gfxtrace_capture::{CaptureLayer, Recorder};
use gfxtrace_core::{config::DEFAULT_CONFIG_FILE, init_tracing, load_cfg, GfxtraceCfg, ReplayCfg};
use gfxtrace_render::{Application, DeviceApi};
use gfxtrace_render_gl::GlApplication;
use gfxtrace_render_null::HeadlessApplication;
use gfxtrace_replay::{FrameEnd, ReplayError, Replayer};
use gfxtrace_stream::TraceWriter;
use tracing::{error, info, warn};

use gfxtrace_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

const EXIT_BACKEND: u8 = 1;
const EXIT_TRACE: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a recorded graphics API trace", long_about = None)]
struct Args {
    /// Trace to play; `replay.default_trace` from the config when omitted
    trace: Option<PathBuf>,
    /// Replay against the journal backend without opening a window
    #[arg(long)]
    headless: bool,
    /// Stop playing after this many frames
    #[arg(long)]
    frames: Option<u64>,
    /// Record the replay itself into this trace file
    #[arg(long)]
    capture: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

/// Exit status for a failed run: trace problems are 2, everything else is a backend problem.
fn exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ReplayError>() {
        Some(ReplayError::Present(_)) | None => EXIT_BACKEND,
        Some(_) => EXIT_TRACE,
    }
}

fn open_capture(path: &Path, api: DeviceApi) -> Result<Arc<Recorder>> {
    let writer = TraceWriter::create(path, api)
        .with_context(|| format!("cannot create capture file {}", path.display()))?;
    info!(path = %path.display(), %api, "re-capturing replay");
    Ok(Arc::new(Recorder::from_writer(api, writer)))
}

fn frame_limit_reached(replayer: &Replayer, limit: Option<u64>) -> bool {
    limit.is_some_and(|n| replayer.stats().frames >= n)
}

fn log_summary(replayer: &Replayer, headless: Option<&HeadlessApplication>) {
    let stats = replayer.stats();
    info!(
        frames = stats.frames,
        events = stats.events,
        skipped = stats.skipped,
        failures = stats.failures,
        "replay finished"
    );
    if let Some(app) = headless {
        for (call, count) in app.null_device().call_counts() {
            info!(call, count, "calls");
        }
    }
}

fn pump(replayer: &mut Replayer, app: &mut dyn Application, limit: Option<u64>) -> Result<()> {
    while !frame_limit_reached(replayer, limit) {
        if replayer.step(app)? == FrameEnd::EndOfStream {
            break;
        }
    }
    replayer.release(app);
    Ok(())
}

fn run_headless(mut replayer: Replayer, args: &Args, cfg: &ReplayCfg) -> Result<()> {
    let app = HeadlessApplication::new(replayer.api(), cfg.headless_back_buffers);
    info!(api = %replayer.api(), back_buffers = cfg.headless_back_buffers, "headless playback");

    match &args.capture {
        Some(path) => {
            let recorder = open_capture(path, replayer.api())?;
            let mut layer = CaptureLayer::new(app, recorder);
            pump(&mut replayer, &mut layer, args.frames)?;
            log_summary(&replayer, Some(layer.inner()));
            info!(events = layer.recorder().events_written(), "capture written");
        }
        None => {
            let mut app = app;
            pump(&mut replayer, &mut app, args.frames)?;
            log_summary(&replayer, Some(&app));
        }
    }
    Ok(())
}

enum Target {
    Gl(Box<GlApplication>),
    Captured(Box<CaptureLayer<GlApplication>>),
}

impl Target {
    fn app(&mut self) -> &mut dyn Application {
        match self {
            Target::Gl(app) => app.as_mut(),
            Target::Captured(layer) => layer.as_mut(),
        }
    }

    fn gl(&mut self) -> &mut GlApplication {
        match self {
            Target::Gl(app) => app.as_mut(),
            Target::Captured(layer) => layer.inner_mut(),
        }
    }
}

struct Player {
    replayer: Replayer,
    cfg: ReplayCfg,
    capture: Option<PathBuf>,
    frame_limit: Option<u64>,

    window: Option<Window>,
    target: Option<Target>,
    exit: Option<u8>,

    paused: bool,
    frames: u32,
    last_fps_instant: Instant,
}

impl Player {
    fn create_target(&self, window: &Window) -> Result<Target> {
        let size = window.inner_size();
        let gl = GlApplication::new(
            window,
            window,
            size.width.max(1),
            size.height.max(1),
            self.cfg.vsync,
        )
        .context("GL init")?;
        Ok(match &self.capture {
            Some(path) => {
                let recorder = open_capture(path, self.replayer.api())?;
                Target::Captured(Box::new(CaptureLayer::new(gl, recorder)))
            }
            None => Target::Gl(Box::new(gl)),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{e:#}");
        self.exit = Some(exit_code(&e));
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(target) = &mut self.target {
            self.replayer.release(target.app());
        }
        log_summary(&self.replayer, None);
        self.target = None;
        self.window = None;
        event_loop.exit();
    }

    fn render(&mut self) -> Result<()> {
        let Some(target) = &mut self.target else {
            return Ok(());
        };
        let app = target.app();
        if self.replayer.is_finished() || frame_limit_reached(&self.replayer, self.frame_limit) {
            // nothing left to play; keep the last image on screen
            app.update_effects();
            app.present().map_err(|e| anyhow!("present: {e}"))?;
            return Ok(());
        }
        if self.replayer.step(app)? == FrameEnd::EndOfStream {
            info!(frames = self.replayer.stats().frames, "trace exhausted");
        }
        Ok(())
    }
}

impl ApplicationHandler for Player {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop
                .create_window(Window::default_attributes().with_title(&self.cfg.window_title))
            {
                Ok(w) => w,
                Err(e) => return self.fail(event_loop, anyhow!("create_window: {e}")),
            };
            match self.create_target(&window) {
                Ok(target) => self.target = Some(target),
                Err(e) => return self.fail(event_loop, e),
            }
            info!(api = %self.replayer.api(), vsync = self.cfg.vsync, "backend = gl");
            self.window = Some(window);
        }

        event_loop.set_control_flow(if self.cfg.vsync {
            ControlFlow::Wait
        } else {
            ControlFlow::Poll
        });
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.shutdown(event_loop);
            }

            WindowEvent::Resized(size) => {
                self.paused = size.width == 0 || size.height == 0;
                info!(width = size.width, height = size.height, paused = self.paused, "resized");
                if !self.paused {
                    if let Some(target) = &mut self.target {
                        target.gl().resize(size.width, size.height);
                    }
                }
            }

            WindowEvent::Occluded(occluded) => {
                self.paused = occluded;
                info!(occluded, "occlusion changed");
            }

            WindowEvent::RedrawRequested => {
                if self.paused || self.exit.is_some() {
                    return;
                }
                match self.render() {
                    Ok(()) => self.frames = self.frames.saturating_add(1),
                    Err(e) => self.fail(event_loop, e),
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.paused {
            event_loop.set_control_flow(ControlFlow::Wait);
            self.frames = 0;
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_fps_instant) >= Duration::from_secs(1) {
            info!("fps ~ {}", self.frames);
            self.frames = 0;
            self.last_fps_instant = now;
        }
    }
}

fn run_windowed(replayer: Replayer, args: &Args, cfg: &GfxtraceCfg) -> Result<u8> {
    if replayer.api() != DeviceApi::OpenGL {
        bail!(
            "no native backend for {} traces; use --headless",
            replayer.api()
        );
    }
    let event_loop: EventLoop<()> = EventLoop::new().context("event loop")?;
    let mut player = Player {
        replayer,
        cfg: cfg.replay.clone(),
        capture: args.capture.clone(),
        frame_limit: args.frames,
        window: None,
        target: None,
        exit: None,
        paused: false,
        frames: 0,
        last_fps_instant: Instant::now(),
    };
    event_loop.run_app(&mut player).context("event loop")?;
    Ok(player.exit.unwrap_or(0))
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let cfg = load_cfg(&args.config);

    // keep an injected capture layer from hooking the player's own device
    std::env::set_var("RESHADE_DISABLE_LOADING_CHECK", "1");
    std::env::set_var("RESHADE_DISABLE_GRAPHICS_HOOK", "1");

    let trace = args
        .trace
        .clone()
        .unwrap_or_else(|| cfg.replay.default_trace.clone());
    let replayer = match Replayer::open(&trace) {
        Ok(r) => r.with_strict(cfg.replay.strict),
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_TRACE);
        }
    };
    if args.capture.as_deref() == Some(trace.as_path()) {
        warn!(path = %trace.display(), "capture target is the trace being played");
    }

    let result = if args.headless {
        run_headless(replayer, &args, &cfg.replay).map(|()| 0)
    } else {
        run_windowed(replayer, &args, &cfg)
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
