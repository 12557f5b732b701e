use crate::{
    core::{PoseTransform, Stage},
    surface::Surface,
};

/// One keyframe: a 2D transform plus an optional stage-aligned doodle layer.
///
/// `Clone` is a structural deep copy (the doodle owns its pixel buffer), so
/// duplicating a frame never aliases the original's doodle.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoseFrame {
    pub transform: PoseTransform,
    /// Freehand annotation raster, pixel-aligned 1:1 with the stage, or
    /// `None` if the frame was never drawn on.
    #[serde(skip)]
    pub doodle: Option<Surface>,
}

impl PoseFrame {
    /// Default pose for a stage: centered, unit scale, no rotation, no doodle.
    pub fn default_for(stage: Stage) -> Self {
        Self {
            transform: PoseTransform::centered(stage),
            doodle: None,
        }
    }
}

/// Ordered list of pose frames plus the index of the frame being edited.
///
/// Invariant: `active` is a valid index whenever `frames` is non-empty;
/// it is meaningless (and ignored) when the sequence is empty.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AnimationSequence {
    frames: Vec<PoseFrame>,
    active: usize,
}

impl AnimationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn frame(&self, index: usize) -> Option<&PoseFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[PoseFrame] {
        &self.frames
    }

    pub fn active_frame(&self) -> Option<&PoseFrame> {
        self.frames.get(self.active)
    }

    pub fn active_frame_mut(&mut self) -> Option<&mut PoseFrame> {
        self.frames.get_mut(self.active)
    }

    /// Append a default pose for `stage` and make it active.
    pub fn add_frame(&mut self, stage: Stage) {
        self.push(PoseFrame::default_for(stage));
    }

    /// Append a deep copy of the active frame and make it active.
    /// No-op when the sequence is empty.
    pub fn duplicate_active(&mut self) {
        let Some(frame) = self.active_frame() else {
            return;
        };
        self.push(frame.clone());
    }

    fn push(&mut self, frame: PoseFrame) {
        self.frames.push(frame);
        self.active = self.frames.len() - 1;
    }

    /// Remove the frame at `index`; no-op when empty.
    ///
    /// The active index is then re-clamped to `max(0, active - 1)`
    /// regardless of which index was removed (observed editor behavior:
    /// deletion always steps the selection back by one).
    pub fn delete_frame(&mut self, index: usize) {
        if self.frames.is_empty() || index >= self.frames.len() {
            return;
        }
        self.frames.remove(index);
        self.active = self.active.saturating_sub(1);
    }

    /// Select the frame to edit and render. Caller guarantees validity.
    pub fn set_active(&mut self, index: usize) {
        debug_assert!(index < self.frames.len());
        self.active = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::new(640, 360).unwrap()
    }

    #[test]
    fn add_frame_appends_and_activates() {
        let mut seq = AnimationSequence::new();
        assert!(seq.is_empty());
        seq.add_frame(stage());
        seq.add_frame(stage());
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.active_index(), 1);
        let f = seq.active_frame().unwrap();
        assert_eq!(f.transform.translation, stage().center());
        assert_eq!(f.transform.scale, 1.0);
        assert!(f.doodle.is_none());
    }

    #[test]
    fn duplicate_of_empty_is_noop() {
        let mut seq = AnimationSequence::new();
        seq.duplicate_active();
        assert!(seq.is_empty());
    }

    #[test]
    fn duplicate_is_a_deep_copy() {
        let mut seq = AnimationSequence::new();
        seq.add_frame(stage());
        seq.active_frame_mut().unwrap().doodle = Some(Surface::new(640, 360));
        seq.duplicate_active();
        assert_eq!(seq.active_index(), 1);

        // Painting on the duplicate must not touch the original's layer.
        seq.active_frame_mut()
            .unwrap()
            .doodle
            .as_mut()
            .unwrap()
            .put_pixel(5, 5, [255, 0, 0, 255]);
        let original = seq.frame(0).unwrap().doodle.as_ref().unwrap();
        assert_eq!(original.pixel(5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn delete_only_frame_empties_the_sequence() {
        let mut seq = AnimationSequence::new();
        seq.add_frame(stage());
        seq.delete_frame(0);
        assert!(seq.is_empty());
        assert!(seq.active_frame().is_none());
        // Deleting again stays a no-op.
        seq.delete_frame(0);
        assert!(seq.is_empty());
    }

    #[test]
    fn delete_reclamps_active_back_by_one() {
        let mut seq = AnimationSequence::new();
        seq.add_frame(stage());
        seq.add_frame(stage());
        seq.add_frame(stage());
        assert_eq!(seq.active_index(), 2);
        seq.delete_frame(2);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.active_index(), 1);
    }

    #[test]
    fn delete_first_of_two_steps_active_to_zero() {
        let mut seq = AnimationSequence::new();
        seq.add_frame(stage());
        seq.add_frame(stage());
        seq.set_active(1);
        seq.delete_frame(0);
        assert_eq!(seq.active_index(), 0);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn set_active_selects_frame() {
        let mut seq = AnimationSequence::new();
        seq.add_frame(stage());
        seq.add_frame(stage());
        seq.set_active(0);
        assert_eq!(seq.active_index(), 0);
    }
}
