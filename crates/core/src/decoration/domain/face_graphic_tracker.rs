use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::overlay::domain::graphic_overlay::{GraphicId, GraphicOverlay};
use crate::shared::face::Face;

use super::decoration::Decoration;
use super::face_graphic::{DecorationStyle, FaceGraphic};

/// Keeps one [`FaceGraphic`] on the overlay per tracked face id.
///
/// New ids get a graphic, known ids have their face replaced, and ids that
/// stop appearing are removed from the overlay.
pub struct FaceGraphicTracker {
    overlay: Arc<GraphicOverlay>,
    decoration: Decoration,
    style: DecorationStyle,
    graphics: HashMap<u32, (GraphicId, Arc<FaceGraphic>)>,
}

impl FaceGraphicTracker {
    pub fn new(overlay: Arc<GraphicOverlay>, decoration: Decoration, style: DecorationStyle) -> Self {
        Self {
            overlay,
            decoration,
            style,
            graphics: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn graphic(&self, id: u32) -> Option<Arc<FaceGraphic>> {
        self.graphics.get(&id).map(|(_, g)| g.clone())
    }

    /// Applies one detection pass.
    pub fn sync(&mut self, faces: &[Face]) {
        let seen: HashSet<u32> = faces.iter().map(|f| f.id).collect();
        let missing: Vec<u32> = self
            .graphics
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        for id in missing {
            self.on_missing(id);
        }

        for face in faces {
            match self.graphics.get(&face.id) {
                Some((_, graphic)) => graphic.update_face(face.clone()),
                None => self.on_new_item(face),
            }
        }
    }

    /// Removes every graphic this tracker added.
    pub fn clear(&mut self) {
        for (_, (gid, graphic)) in self.graphics.drain() {
            graphic.clear_face();
            self.overlay.remove(gid);
        }
    }

    fn on_new_item(&mut self, face: &Face) {
        let graphic = Arc::new(FaceGraphic::new(
            &self.overlay,
            self.decoration.clone(),
            self.style,
        ));
        graphic.set_id(face.id);
        graphic.update_face(face.clone());
        let gid = self.overlay.add(graphic.clone());
        log::debug!("Face {} appeared", face.id);
        self.graphics.insert(face.id, (gid, graphic));
    }

    fn on_missing(&mut self, id: u32) {
        if let Some((gid, _)) = self.graphics.remove(&id) {
            self.overlay.remove(gid);
            log::debug!("Face {id} lost");
        }
    }
}
