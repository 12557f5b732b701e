use kurbo::Point;

use crate::{
    brush::{BrushSettings, BrushTool, stroke_segment},
    core::{PoseTransform, Stage},
    error::FlipcutResult,
    processing::{ProcessingParameters, process},
    sequence::AnimationSequence,
    surface::Surface,
};

/// Gesture tool, resolved once at pointer-down and fixed for the drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Move,
    Rotate,
    Scale,
    Draw,
    Erase,
}

/// Modifier keys held at pointer-down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Tool {
    /// Exclusive priority: rotate > scale > draw > erase-toggle > move.
    pub fn resolve(mods: Modifiers, eraser_active: bool) -> Self {
        if mods.shift {
            Tool::Rotate
        } else if mods.ctrl {
            Tool::Scale
        } else if mods.alt {
            Tool::Draw
        } else if eraser_active {
            Tool::Erase
        } else {
            Tool::Move
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    tool: Tool,
    prev: Point,
}

/// The whole editing session: source and derived cutout, the frame
/// sequence, current parameter/brush settings, and transient drag state.
///
/// Pointer positions are stage pixel coordinates; mapping from display
/// space (on-screen scaling of the output surface) is the caller's concern.
#[derive(Debug)]
pub struct EditorSession {
    pub stage: Stage,
    pub sequence: AnimationSequence,
    pub processing: ProcessingParameters,
    pub brush: BrushSettings,
    source: Option<Surface>,
    cutout: Option<Surface>,
    drag: Option<DragState>,
}

impl EditorSession {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            sequence: AnimationSequence::new(),
            processing: ProcessingParameters::default(),
            brush: BrushSettings::default(),
            source: None,
            cutout: None,
            drag: None,
        }
    }

    pub fn source(&self) -> Option<&Surface> {
        self.source.as_ref()
    }

    /// The currently derived cutout, shared read-only across all frames.
    pub fn cutout(&self) -> Option<&Surface> {
        self.cutout.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Replace the source image and regenerate the cutout. The prior
    /// source and cutout are discarded.
    pub fn set_source(&mut self, source: Surface) {
        self.source = Some(source);
        self.reprocess();
    }

    /// Drop the source; the session degrades to a renderable blank state.
    pub fn clear_source(&mut self) {
        self.source = None;
        self.cutout = None;
    }

    /// Install new processing parameters and rebuild the cutout from the
    /// untouched source (never from a previous cutout).
    pub fn set_processing(&mut self, params: ProcessingParameters) -> FlipcutResult<()> {
        params.validate()?;
        self.processing = params;
        self.reprocess();
        Ok(())
    }

    pub fn set_brush(&mut self, brush: BrushSettings) -> FlipcutResult<()> {
        brush.validate()?;
        self.brush = brush;
        Ok(())
    }

    fn reprocess(&mut self) {
        self.cutout = self
            .source
            .as_ref()
            .map(|src| process(src, &self.processing));
    }

    /// Idle -> Dragging: record the start position and resolve the tool
    /// for this gesture. Re-pressing mid-drag restarts the gesture.
    pub fn pointer_down(&mut self, pos: Point, mods: Modifiers) {
        let eraser_active = self.brush.tool == BrushTool::Erase;
        self.drag = Some(DragState {
            tool: Tool::resolve(mods, eraser_active),
            prev: pos,
        });
    }

    /// Apply one pointer-move delta to the active frame.
    ///
    /// No-op unless a drag is in progress and the sequence is non-empty.
    /// Deltas always target the *current* active frame: if the selection
    /// changes mid-drag, the newly active frame silently receives the
    /// remaining deltas.
    pub fn pointer_move(&mut self, pos: Point) {
        let Some(drag) = self.drag else {
            return;
        };
        if self.sequence.is_empty() {
            return;
        }
        let p = drag.prev;

        match drag.tool {
            Tool::Move => {
                let f = self.sequence.active_frame_mut().expect("non-empty");
                f.transform.translation += pos - p;
            }
            Tool::Rotate => {
                let f = self.sequence.active_frame_mut().expect("non-empty");
                let t = f.transform.translation;
                let a1 = (p - t).atan2();
                let a2 = (pos - t).atan2();
                f.transform.rotation += a2 - a1;
            }
            Tool::Scale => {
                let f = self.sequence.active_frame_mut().expect("non-empty");
                let t = f.transform.translation;
                let d1 = (p - t).hypot();
                let d2 = (pos - t).hypot();
                // Pivot coincides with the drag start: skip this tick
                // rather than divide by zero.
                if d1 > 0.0 {
                    f.transform.scale =
                        PoseTransform::clamp_scale(f.transform.scale * (d2 / d1));
                }
            }
            Tool::Draw | Tool::Erase => {
                let stage = self.stage;
                let mut brush = self.brush;
                brush.tool = if drag.tool == Tool::Erase {
                    BrushTool::Erase
                } else {
                    BrushTool::Draw
                };
                let f = self.sequence.active_frame_mut().expect("non-empty");
                let layer = f
                    .doodle
                    .get_or_insert_with(|| Surface::stage_sized(stage));
                stroke_segment(layer, p, pos, &brush);
            }
        }

        self.drag = Some(DragState {
            tool: drag.tool,
            prev: pos,
        });
    }

    /// Dragging -> Idle (pointer up, cancel, or leaving the surface).
    /// All incremental mutations are kept; there is nothing to roll back.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Drop the active frame's doodle layer. No-op when the sequence is
    /// empty or the frame has no doodle.
    pub fn clear_active_doodle(&mut self) {
        if let Some(f) = self.sequence.active_frame_mut() {
            f.doodle = None;
        }
    }
}
