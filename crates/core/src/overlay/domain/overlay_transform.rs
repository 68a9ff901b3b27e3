/// Which camera produced the preview. Front-camera previews are mirrored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    #[default]
    Back,
    Front,
}

/// Maps source (detector) coordinates to view (overlay) coordinates.
///
/// The view may be a different size than the frames the detector saw;
/// front-facing previews are additionally mirrored horizontally. A zero
/// preview size means the camera size is unknown and scaling is identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayTransform {
    preview_width: u32,
    preview_height: u32,
    view_width: u32,
    view_height: u32,
    facing: Facing,
}

impl OverlayTransform {
    pub fn new(
        preview_width: u32,
        preview_height: u32,
        view_width: u32,
        view_height: u32,
        facing: Facing,
    ) -> Self {
        Self {
            preview_width,
            preview_height,
            view_width,
            view_height,
            facing,
        }
    }

    /// Source and view coincide.
    pub fn identity(width: u32, height: u32) -> Self {
        Self::new(width, height, width, height, Facing::Back)
    }

    pub fn width_scale_factor(&self) -> f64 {
        if self.preview_width == 0 {
            1.0
        } else {
            self.view_width as f64 / self.preview_width as f64
        }
    }

    pub fn height_scale_factor(&self) -> f64 {
        if self.preview_height == 0 {
            1.0
        } else {
            self.view_height as f64 / self.preview_height as f64
        }
    }

    pub fn scale_x(&self, horizontal: f64) -> f64 {
        horizontal * self.width_scale_factor()
    }

    pub fn scale_y(&self, vertical: f64) -> f64 {
        vertical * self.height_scale_factor()
    }

    pub fn translate_x(&self, x: f64) -> f64 {
        match self.facing {
            Facing::Front => self.view_width as f64 - self.scale_x(x),
            Facing::Back => self.scale_x(x),
        }
    }

    pub fn translate_y(&self, y: f64) -> f64 {
        self.scale_y(y)
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }
}
