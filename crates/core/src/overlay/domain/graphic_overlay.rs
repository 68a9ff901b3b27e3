use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::canvas::Canvas;
use super::graphic::Graphic;
use super::overlay_transform::{Facing, OverlayTransform};

/// Handle returned by [`GraphicOverlay::add`] for later removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphicId(u64);

/// Marks an overlay as needing a redraw. Cheap to clone and safe to use
/// from any thread.
#[derive(Clone, Debug)]
pub struct Invalidator(Arc<AtomicBool>);

impl Invalidator {
    pub fn post_invalidate(&self) {
        self.0.store(true, Ordering::Release);
    }
}

struct OverlayState {
    graphics: Vec<(GraphicId, Arc<dyn Graphic>)>,
    preview_width: u32,
    preview_height: u32,
    facing: Facing,
}

/// The layer drawn above a camera preview: an ordered set of graphics plus
/// the camera geometry needed to map detector coordinates onto the view.
pub struct GraphicOverlay {
    state: Mutex<OverlayState>,
    dirty: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl GraphicOverlay {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OverlayState {
                graphics: Vec::new(),
                preview_width: 0,
                preview_height: 0,
                facing: Facing::Back,
            }),
            dirty: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn invalidator(&self) -> Invalidator {
        Invalidator(self.dirty.clone())
    }

    pub fn post_invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns whether a redraw was requested since the last call, and
    /// clears the request.
    pub fn take_invalidated(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn add(&self, graphic: Arc<dyn Graphic>) -> GraphicId {
        let id = GraphicId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.state().graphics.push((id, graphic));
        self.post_invalidate();
        id
    }

    /// Returns false when `id` is not on this overlay.
    pub fn remove(&self, id: GraphicId) -> bool {
        let removed = {
            let mut state = self.state();
            let before = state.graphics.len();
            state.graphics.retain(|(gid, _)| *gid != id);
            state.graphics.len() != before
        };
        if removed {
            self.post_invalidate();
        }
        removed
    }

    pub fn clear(&self) {
        self.state().graphics.clear();
        self.post_invalidate();
    }

    pub fn len(&self) -> usize {
        self.state().graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records the size of the frames detection runs on and the camera
    /// facing, which determine how coordinates are scaled and mirrored.
    pub fn set_camera_info(&self, preview_width: u32, preview_height: u32, facing: Facing) {
        {
            let mut state = self.state();
            state.preview_width = preview_width;
            state.preview_height = preview_height;
            state.facing = facing;
        }
        self.post_invalidate();
    }

    pub fn transform_for(&self, view_width: u32, view_height: u32) -> OverlayTransform {
        let state = self.state();
        OverlayTransform::new(
            state.preview_width,
            state.preview_height,
            view_width,
            view_height,
            state.facing,
        )
    }

    /// Draws every graphic in insertion order. The graphic list is
    /// snapshotted first so graphics may be added or removed concurrently.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let transform = self.transform_for(canvas.width(), canvas.height());
        let graphics: Vec<Arc<dyn Graphic>> =
            self.state().graphics.iter().map(|(_, g)| g.clone()).collect();
        for graphic in graphics {
            graphic.draw(canvas, &transform);
        }
    }
}

impl Default for GraphicOverlay {
    fn default() -> Self {
        Self::new()
    }
}
