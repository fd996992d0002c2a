//! The host-embedding session interface: a handful of functions an
//! embedding host (an interactive 3-D editor's render-engine plugin) calls
//! across the process boundary with opaque integer handles. Mirrors the
//! shape of the teacher engine's own render-engine glue — `new`/`free`/
//! `update`/`render` driven by the host's dependency graph — generalized to
//! this renderer's scene/settings types.

use crate::archive::{self, ArchiveNode};
use crate::descriptor::SceneDescriptor;
use crate::error::{NumericWarnings, RenderError};
use crate::Result;
use lumen_film::{BufferSink, FilmSink, OriginConvention};
use lumen_integrator::RenderSettings;
use lumen_scene::{Scene, SceneBuilder};
use slotmap::{new_key_type, SlotMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

new_key_type! {
    struct SessionKey;
}

/// An opaque handle the host holds across the embedding boundary. Carries
/// no information the host can interpret; internally it's a `slotmap` key
/// packed into a `u64` via `KeyData::as_ffi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

/// A render-region restriction for interactive (viewport) renders. Its
/// presence is what distinguishes an interactive preview session from a
/// final full-frame render, per the embedding contract.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Stores the host's base resource paths. No side effects on render state
/// — this just remembers where to resolve relative archive/texture paths
/// from later.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub install_path: PathBuf,
    pub resource_path: PathBuf,
    pub user_path: PathBuf,
    pub headless: bool,
}

struct Session {
    scene: Scene,
    settings: RenderSettings,
    region: Option<Region>,
    preview: bool,
    cancel: AtomicBool,
    frame_counter: AtomicU64,
    numeric_warnings: NumericWarnings,
}

/// The renderer's embedding-facing entry point: owns the opaque handle
/// table and the host's resource configuration. One `Engine` per host
/// process.
pub struct Engine {
    config: EngineConfig,
    sessions: parking_lot::Mutex<SlotMap<SessionKey, Session>>,
}

impl Engine {
    /// `init(path, resource_path, user_path, headless)`: stores the
    /// resource base paths. No side effects on render state.
    #[must_use]
    pub fn init(install_path: &Path, resource_path: &Path, user_path: &Path, headless: bool) -> Self {
        Engine {
            config: EngineConfig {
                install_path: install_path.to_path_buf(),
                resource_path: resource_path.to_path_buf(),
                user_path: user_path.to_path_buf(),
                headless,
            },
            sessions: parking_lot::Mutex::new(SlotMap::with_key()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `create(engine, prefs, data, region, preview_flag)`: builds a scene
    /// from the parsed descriptor and its already-loaded archives (archive
    /// file I/O is the host's job; this renderer only walks the in-memory
    /// tree), then registers a new session and returns its handle.
    /// Interactive vs. final-frame mode is selected by the presence of
    /// `region`.
    ///
    /// # Errors
    /// Returns [`RenderError::Geometry`] if the descriptor's archives
    /// produce a scene with an undefined material reference.
    pub fn create(
        &self,
        prefs: RenderSettings,
        descriptor: &SceneDescriptor,
        archives: &[ArchiveNode],
        region: Option<Region>,
        preview_flag: bool,
    ) -> Result<SessionHandle> {
        let scene = build_scene(descriptor, archives, &region)?;

        let session = Session {
            scene,
            settings: prefs,
            region,
            preview: preview_flag,
            cancel: AtomicBool::new(false),
            frame_counter: AtomicU64::new(0),
            numeric_warnings: NumericWarnings::new(),
        };

        let key = self.sessions.lock().insert(session);
        Ok(SessionHandle(key.data().as_ffi()))
    }

    /// `reset(handle, data)`: rebuilds the scene from a freshly re-evaluated
    /// descriptor/archive set. Safe to call repeatedly (e.g. once per
    /// dependency-graph update in an interactive session).
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has been freed,
    /// or a geometry error from rebuilding the scene.
    pub fn reset(
        &self,
        handle: SessionHandle,
        descriptor: &SceneDescriptor,
        archives: &[ArchiveNode],
    ) -> Result<()> {
        let scene = build_scene(descriptor, archives, &None)?;
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(key_from_handle(handle)).ok_or(RenderError::UnknownHandle)?;
        session.scene = scene;
        session.cancel.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// `render(handle, depsgraph)`: renders the session's current scene
    /// synchronously, returning once every tile has been delivered to
    /// `sink`. The host's cooperative thread state is saved and restored
    /// around the (potentially long) render call so the host can still
    /// make progress on its own thread.
    ///
    /// Holds the session table's lock for the whole render, which means a
    /// concurrent `free`/`reset`/`create` on a *different* handle blocks
    /// behind it too — acceptable for the single-session-at-a-time host
    /// this interface targets, but a multi-session host driving
    /// overlapping renders would want each session's scene behind its own
    /// `Arc` so the table lock can be released before the worker loop
    /// starts.
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has been freed.
    pub fn render(&self, handle: SessionHandle, sink: &(dyn FilmSink + Sync)) -> Result<()> {
        let _handoff = HostThreadHandoff::enter();

        let sessions = self.sessions.lock();
        let session = sessions.get(key_from_handle(handle)).ok_or(RenderError::UnknownHandle)?;
        session.numeric_warnings.begin_tile();
        let frame_seed = session.frame_counter.fetch_add(1, Ordering::Relaxed);
        let (image_width, image_height) = region_dimensions(&session.scene, session.region.as_ref());

        lumen_xpu::render(
            &session.scene,
            session.scene.camera(),
            &session.settings,
            image_width,
            image_height,
            sink,
            &session.cancel,
            frame_seed,
        );
        Ok(())
    }

    /// Requests cancellation of an in-flight render on `handle`. Observed
    /// only at tile boundaries; in-flight tiles complete before the
    /// worker loop exits.
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has been freed.
    pub fn cancel(&self, handle: SessionHandle) -> Result<()> {
        let sessions = self.sessions.lock();
        let session = sessions.get(key_from_handle(handle)).ok_or(RenderError::UnknownHandle)?;
        session.cancel.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// `free(handle)`: releases the session. Double-free is a no-op error,
    /// not a panic.
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has already been
    /// freed.
    pub fn free(&self, handle: SessionHandle) -> Result<()> {
        self.sessions
            .lock()
            .remove(key_from_handle(handle))
            .map(|_| ())
            .ok_or(RenderError::UnknownHandle)
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether `handle` was created (or last reset) as an interactive
    /// preview session rather than a final-frame render.
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has been freed.
    pub fn is_preview(&self, handle: SessionHandle) -> Result<bool> {
        let sessions = self.sessions.lock();
        sessions.get(key_from_handle(handle)).map(|s| s.preview).ok_or(RenderError::UnknownHandle)
    }

    /// Total numeric-degeneracy warnings recorded across `handle`'s
    /// renders so far.
    ///
    /// # Errors
    /// Returns [`RenderError::UnknownHandle`] if `handle` has been freed.
    pub fn numeric_warning_count(&self, handle: SessionHandle) -> Result<u64> {
        let sessions = self.sessions.lock();
        sessions
            .get(key_from_handle(handle))
            .map(|s| s.numeric_warnings.total())
            .ok_or(RenderError::UnknownHandle)
    }
}

fn key_from_handle(handle: SessionHandle) -> SessionKey {
    SessionKey::from(slotmap::KeyData::from_ffi(handle.0))
}

/// Convenience sink constructor matching this renderer's own coordinate
/// convention, sized to the session's effective render region.
#[must_use]
pub fn new_buffer_sink(width: u32, height: u32, origin: OriginConvention) -> BufferSink {
    BufferSink::new(width, height, origin)
}

fn region_dimensions(scene: &Scene, region: Option<&Region>) -> (u32, u32) {
    if let Some(region) = region {
        (region.width, region.height)
    } else {
        (scene.camera().film_width, scene.camera().film_height)
    }
}

fn build_scene(descriptor: &SceneDescriptor, archives: &[ArchiveNode], region: &Option<Region>) -> Result<Scene> {
    let mut builder = SceneBuilder::new();

    let mut material_names = Vec::new();
    for node in &descriptor.materials {
        let id = builder.add_material(node.compile());
        if let Some(name) = &node.name {
            material_names.push((name.clone(), id));
        }
    }
    if material_names.is_empty() {
        builder.add_material(archive::default_material());
    }

    for archive_node in archives {
        let imported = archive::import(archive_node);
        for imported_mesh in imported.meshes {
            let id = builder.next_mesh_id();
            if let Some(mesh) = imported_mesh.finalize(id, &material_names) {
                builder.add_mesh(mesh);
            }
        }
    }

    let film_width = region.as_ref().map_or(512, |r| r.width);
    let film_height = region.as_ref().map_or(512, |r| r.height);
    let camera = descriptor.camera.to_camera(film_width, film_height);

    builder.build(camera).map_err(RenderError::from)
}

/// RAII guard modelling the host's cooperative-thread handoff: acquired
/// just before entering the (possibly long) native render call, released
/// when the call returns, so the host's own message loop can resume making
/// progress meanwhile. There is no real host thread to hand off to in this
/// renderer's own process, so this only logs the transition; an embedding
/// host wires its actual thread-state save/restore calls into the same two
/// points.
struct HostThreadHandoff;

impl HostThreadHandoff {
    fn enter() -> Self {
        log::debug!("render: yielding host thread state");
        HostThreadHandoff
    }
}

impl Drop for HostThreadHandoff {
    fn drop(&mut self) {
        log::debug!("render: restoring host thread state");
    }
}
