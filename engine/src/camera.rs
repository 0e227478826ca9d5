use util::Rect;

use crate::{ecs::*, prelude::*};

impl Camera {
    /// Cells shown by the camera when it's at `pos`, centered on it.
    pub fn frame(&self, pos: IVec2) -> Rect {
        let min = pos - ivec2(self.width / 2, self.height / 2);
        Rect::sized(min, [self.width, self.height])
    }

    pub fn in_frame(&self, pos: IVec2, p: impl Into<IVec2>) -> bool {
        self.frame(pos).contains(p)
    }

    /// Grid position under a screen position.
    pub fn screen_to_cells(&self, pos: IVec2, s: impl Into<IVec2>) -> IVec2 {
        s.into() + self.frame(pos).min()
    }

    /// Screen position of a grid position, may be outside the screen.
    pub fn cells_to_screen(&self, pos: IVec2, p: impl Into<IVec2>) -> IVec2 {
        p.into() - self.frame(pos).min()
    }
}

impl Entity {
    /// Frame of a placed camera entity.
    pub fn camera_frame(&self, r: &impl AsRef<Runtime>) -> Option<Rect> {
        let camera = self.get::<Camera>(r)?;
        Some(camera.frame(self.pos(r)?))
    }
}

impl Runtime {
    /// Unplaced camera sized by the settings.
    pub fn spawn_camera(&mut self) -> Entity {
        let (width, height) =
            (self.settings.camera_width, self.settings.camera_height);
        self.spawn((Camera { width, height },))
    }

    /// What the observers see through a camera, `None` if the camera is not
    /// placed.
    pub fn camera_view(&self, camera: Entity) -> Option<(Rect, util::Mask)> {
        let frame = camera.camera_frame(self)?;
        Some((frame, self.render_visibility(frame)))
    }
}
