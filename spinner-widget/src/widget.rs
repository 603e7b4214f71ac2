use anyhow::{ensure, Result};
use std::sync::mpsc::Receiver;
use tracing::{debug, info};
use wayland_client::protocol::{wl_shm, wl_subsurface, wl_surface};
use wayland_client::QueueHandle;

use crate::animation::Rotation;
use crate::config::SpinnerConfig;
use crate::layout::Layout;
use crate::renderer::SpinnerRenderer;
use crate::timer::{FrameTimer, Tick};
use crate::wayland::{AppState, ShmBuffer};

/// Animated ring-of-circles spinner embedded as a child surface of a parent
/// the caller owns.
///
/// All methods are meant to be called from the thread running the Wayland
/// event loop; the frame timer lives on its own thread and only posts ticks
/// back over a channel.
pub struct ProgressIndicator {
    qh: QueueHandle<AppState>,
    shm: wl_shm::WlShm,
    surface: wl_surface::WlSurface,
    subsurface: wl_subsurface::WlSubsurface,
    config: SpinnerConfig,

    layout: Option<Layout>,
    renderer: Option<SpinnerRenderer>,
    buffer: Option<ShmBuffer>,
    side_length: u32,

    rotation: Rotation,
    timer: Option<FrameTimer>,
    ticks: Option<Receiver<Tick>>,
}

impl ProgressIndicator {
    /// Creates the spinner's child surface inside `parent`. The widget is
    /// not visible until [`set_position`] and [`paint`] have run.
    ///
    /// [`set_position`]: ProgressIndicator::set_position
    /// [`paint`]: ProgressIndicator::paint
    pub fn new(
        app: &AppState,
        qh: &QueueHandle<AppState>,
        parent: &wl_surface::WlSurface,
        config: SpinnerConfig,
    ) -> Result<Self> {
        ensure!(config.position_count >= 1, "spinner needs at least one position slot");

        let surface = app.create_child_surface(qh);
        let subsurface = app.create_subsurface(qh, &surface, parent);
        // desync: the spinner presents frames without waiting on parent commits
        subsurface.set_desync();

        info!(
            positions = config.position_count,
            fps = config.frames_per_second,
            "progress indicator created"
        );

        Ok(Self {
            qh: qh.clone(),
            shm: app.shm().clone(),
            surface,
            subsurface,
            rotation: Rotation::new(config.position_count),
            config,
            layout: None,
            renderer: None,
            buffer: None,
            side_length: 0,
            timer: None,
            ticks: None,
        })
    }

    /// Moves the widget to `(x, y)` within its parent and resizes it to a
    /// `side_length` square, recomputing the layout and reallocating the
    /// presentation buffer.
    pub fn set_position(&mut self, x: i32, y: i32, side_length: u32) -> Result<()> {
        self.layout = Some(Layout::compute(side_length, self.config.position_count));
        self.renderer = Some(SpinnerRenderer::new(side_length, side_length, &self.config)?);

        if let Some(old) = self.buffer.take() {
            old.destroy();
        }
        self.buffer = Some(ShmBuffer::new(&self.shm, &self.qh, side_length, side_length)?);

        self.subsurface.set_position(x, y);
        self.side_length = side_length;

        debug!(x, y, side_length, "spinner repositioned");
        Ok(())
    }

    /// Starts the animation. Idempotent: a second call rewinds the rotation
    /// instead of spawning another timer.
    pub fn start(&mut self) -> Result<()> {
        if self.timer.is_none() {
            let (timer, ticks) = FrameTimer::spawn(self.config.frames_per_second)?;
            self.timer = Some(timer);
            self.ticks = Some(ticks);
            info!(fps = self.config.frames_per_second, "spinner animation started");
        }
        self.rotation.start();
        Ok(())
    }

    /// Drains pending timer ticks, advancing the rotation one slot each.
    /// Returns true when a repaint is due.
    pub fn pump(&mut self) -> bool {
        let Some(ticks) = &self.ticks else {
            return false;
        };

        let mut dirty = false;
        while ticks.try_recv().is_ok() {
            self.rotation.advance();
            dirty = true;
        }
        dirty && self.layout.is_some()
    }

    /// Composes and presents one frame. A paint request arriving before the
    /// widget has been positioned is a no-op.
    pub fn paint(&mut self) -> Result<()> {
        let (Some(layout), Some(renderer), Some(buffer)) =
            (self.layout.as_ref(), self.renderer.as_mut(), self.buffer.as_mut())
        else {
            return Ok(());
        };

        let frame = renderer.render(layout, &self.rotation);
        buffer.write_rgba(frame)?;

        self.surface.attach(Some(buffer.wl_buffer()), 0, 0);
        self.surface.damage_buffer(0, 0, self.side_length as i32, self.side_length as i32);
        self.surface.commit();
        Ok(())
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        // the timer thread must be gone before its target surface is
        self.timer.take();
        self.ticks.take();

        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.subsurface.destroy();
        self.surface.destroy();
        debug!("progress indicator destroyed");
    }
}
