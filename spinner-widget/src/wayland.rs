use anyhow::{ensure, Context, Result};
use memmap2::MmapMut;
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_layer, delegate_output, delegate_registry,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    registry_handlers,
    shell::wlr_layer::{
        KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
        LayerSurfaceConfigure,
    },
};
use std::fs::File;
use std::os::fd::AsFd;
use wayland_client::{
    globals::registry_queue_init,
    protocol::{wl_buffer, wl_output, wl_shm, wl_shm_pool, wl_subcompositor, wl_subsurface, wl_surface},
    Connection, Dispatch, EventQueue, Proxy, QueueHandle,
};

pub struct WaylandContext {
    pub wl_surface: wl_surface::WlSurface,
    pub layer_surface: Option<LayerSurface>,
}

/// Wayland-side state for a host embedding the spinner: registry handling,
/// the parent layer surface, and the globals the widget draws through.
pub struct AppState {
    pub registry_state: RegistryState,
    output_state: OutputState,
    compositor_state: CompositorState,
    layer_shell: LayerShell,
    shm: wl_shm::WlShm,
    subcompositor: wl_subcompositor::WlSubcompositor,

    pub context: Option<WaylandContext>,
    pub configured: bool,
}

impl AppState {
    pub fn new() -> Result<(Self, Connection, EventQueue<Self>)> {
        let conn = Connection::connect_to_env().context("failed to connect to Wayland")?;
        let (globals, event_queue) =
            registry_queue_init(&conn).context("failed to initialize registry")?;
        let qh = event_queue.handle();

        let registry_state = RegistryState::new(&globals);
        let output_state = OutputState::new(&globals, &qh);
        let compositor_state =
            CompositorState::bind(&globals, &qh).context("wl_compositor not available")?;
        let layer_shell = LayerShell::bind(&globals, &qh).context("layer_shell not available")?;
        let shm = bind_global::<wl_shm::WlShm>(&registry_state, &qh, "wl_shm")?;
        let subcompositor = bind_global::<wl_subcompositor::WlSubcompositor>(
            &registry_state,
            &qh,
            "wl_subcompositor",
        )?;

        Ok((
            Self {
                registry_state,
                output_state,
                compositor_state,
                layer_shell,
                shm,
                subcompositor,
                context: None,
                configured: false,
            },
            conn,
            event_queue,
        ))
    }

    /// Creates the parent surface for the demo host: a centered overlay
    /// layer surface of the given size.
    pub fn create_layer_surface(&mut self, qh: &QueueHandle<Self>, width: u32, height: u32) {
        let wl_surface = self.compositor_state.create_surface(qh);

        let layer_surface = self.layer_shell.create_layer_surface(
            qh,
            wl_surface.clone(),
            Layer::Top,
            Some("progress-spinner"),
            None,
        );

        layer_surface.set_keyboard_interactivity(KeyboardInteractivity::None);
        layer_surface.set_size(width, height);

        wl_surface.commit();

        self.context = Some(WaylandContext {
            wl_surface,
            layer_surface: Some(layer_surface),
        });
    }

    pub fn parent_surface(&self) -> Option<&wl_surface::WlSurface> {
        self.context.as_ref().map(|context| &context.wl_surface)
    }

    pub fn shm(&self) -> &wl_shm::WlShm {
        &self.shm
    }

    pub fn create_child_surface(&self, qh: &QueueHandle<Self>) -> wl_surface::WlSurface {
        self.compositor_state.create_surface(qh)
    }

    pub fn create_subsurface(
        &self,
        qh: &QueueHandle<Self>,
        surface: &wl_surface::WlSurface,
        parent: &wl_surface::WlSurface,
    ) -> wl_subsurface::WlSubsurface {
        self.subcompositor.get_subsurface(surface, parent, qh, ())
    }
}

fn bind_global<I>(
    registry: &RegistryState,
    qh: &QueueHandle<AppState>,
    interface: &'static str,
) -> Result<I>
where
    I: Proxy + 'static,
    AppState: Dispatch<I, ()>,
{
    let global = registry
        .globals()
        .find(|global| global.interface == interface)
        .with_context(|| format!("{interface} not available"))?;

    let version = global.version.min(1);
    registry
        .bind_specific(qh, global.name, version..=version, ())
        .with_context(|| format!("failed to bind {interface}"))
}

/// A single wl_shm buffer backed by an anonymous mapped file.
///
/// Frames composed off-screen are copied in with [`write_rgba`], which also
/// converts tiny-skia's RGBA byte order to ARGB8888.
///
/// [`write_rgba`]: ShmBuffer::write_rgba
pub struct ShmBuffer {
    _file: File,
    pool: wl_shm_pool::WlShmPool,
    buffer: wl_buffer::WlBuffer,
    mmap: MmapMut,
}

impl ShmBuffer {
    pub fn new(
        shm: &wl_shm::WlShm,
        qh: &QueueHandle<AppState>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        ensure!(width > 0 && height > 0, "zero-sized shm buffer");
        let stride = width * 4;
        let size = stride * height;

        let file = tempfile::tempfile().context("failed to create shm backing file")?;
        file.set_len(u64::from(size)).context("failed to size shm backing file")?;

        let pool = shm.create_pool(file.as_fd(), size as i32, qh, ());
        let buffer = pool.create_buffer(
            0,
            width as i32,
            height as i32,
            stride as i32,
            wl_shm::Format::Argb8888,
            qh,
            (),
        );

        let mmap = unsafe { MmapMut::map_mut(&file) }.context("failed to map shm backing file")?;

        Ok(Self { _file: file, pool, buffer, mmap })
    }

    pub fn wl_buffer(&self) -> &wl_buffer::WlBuffer {
        &self.buffer
    }

    /// Copies a full premultiplied-RGBA frame into the buffer, swizzling to
    /// the ARGB8888 little-endian layout wl_shm expects.
    pub fn write_rgba(&mut self, pixels: &[u8]) -> Result<()> {
        ensure!(
            pixels.len() == self.mmap.len(),
            "frame is {} bytes but the buffer holds {}",
            pixels.len(),
            self.mmap.len()
        );

        for i in (0..pixels.len()).step_by(4) {
            self.mmap[i] = pixels[i + 2];
            self.mmap[i + 1] = pixels[i + 1];
            self.mmap[i + 2] = pixels[i];
            self.mmap[i + 3] = pixels[i + 3];
        }
        self.mmap.flush().context("failed to flush shm buffer")?;
        Ok(())
    }

    /// Fills the buffer with one opaque color.
    pub fn fill(&mut self, color: tiny_skia::Color) -> Result<()> {
        let c = color.to_color_u8();
        for px in self.mmap.chunks_exact_mut(4) {
            px[0] = c.blue();
            px[1] = c.green();
            px[2] = c.red();
            px[3] = c.alpha();
        }
        self.mmap.flush().context("failed to flush shm buffer")?;
        Ok(())
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
        self.pool.destroy();
    }
}

impl CompositorHandler for AppState {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
    }
}

impl OutputHandler for AppState {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }
}

impl LayerShellHandler for AppState {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.context = None;
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        _configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if let Some(context) = &self.context {
            context.wl_surface.commit();
        }
        self.configured = true;
    }
}

delegate_compositor!(AppState);
delegate_output!(AppState);
delegate_layer!(AppState);

delegate_registry!(AppState);

impl ProvidesRegistryState for AppState {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }
    registry_handlers![OutputState];
}

impl Dispatch<wl_shm::WlShm, ()> for AppState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_shm::WlShm,
        _event: wl_shm::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, ()> for AppState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_shm_pool::WlShmPool,
        _event: wl_shm_pool::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for AppState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_buffer::WlBuffer,
        _event: wl_buffer::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_subcompositor::WlSubcompositor, ()> for AppState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_subcompositor::WlSubcompositor,
        _event: wl_subcompositor::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_subsurface::WlSubsurface, ()> for AppState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_subsurface::WlSubsurface,
        _event: wl_subsurface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}
