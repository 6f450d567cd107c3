use log::trace;
use winit::keyboard::ModifiersState;

use super::mapper::{CanvasRect, CellMapper};
use crate::engine::Pattern;

/// Modifier keys that select what a click does.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Modifiers {
    /// Cmd on macOS, Ctrl elsewhere.
    pub platform: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn from_state(state: ModifiersState) -> Self {
        let platform = if cfg!(target_os = "macos") {
            state.super_key()
        } else {
            state.control_key()
        };

        Self {
            platform,
            shift: state.shift_key(),
        }
    }

    /// The preset a click stamps, if any. The platform modifier is checked
    /// first, so holding both stamps a glider.
    pub fn stamp_pattern(self) -> Option<Pattern> {
        if self.platform {
            Some(Pattern::Glider)
        } else if self.shift {
            Some(Pattern::Pulsar)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Edit {
    Toggle { row: u32, col: u32 },
    Stamp { pattern: Pattern, row: u32, col: u32 },
    Paint { row: u32, col: u32 },
}

/// Something that applies cell edits to the current universe and redraws.
pub trait EditTarget {
    fn apply_edit(&mut self, edit: Edit);
}

#[derive(Clone, Copy, Debug)]
struct Press {
    cell: (u32, u32),
    painted: bool,
}

/// Pointer state machine: discrete clicks, pattern stamps, drag-paint.
///
/// A press on the canvas starts a drag. Painting begins once the pointer
/// leaves the pressed cell; from then on every move sets the cell under the
/// pointer alive. A release that follows a press without any painting is a
/// click. A release anywhere ends the drag.
#[derive(Clone, Debug)]
pub struct InteractionController {
    mapper: CellMapper,
    press: Option<Press>,
}

impl InteractionController {
    pub fn new(mapper: CellMapper) -> Self {
        Self {
            mapper,
            press: None,
        }
    }

    pub fn mapper(&self) -> &CellMapper {
        &self.mapper
    }

    pub fn dragging(&self) -> bool {
        self.press.is_some()
    }

    /// Returns whether the press landed on the canvas.
    pub fn pointer_down(
        &mut self,
        pointer: [f64; 2],
        rect: CanvasRect,
    ) -> bool {
        if !rect.contains(pointer[0], pointer[1]) {
            return false;
        }

        let cell = self.mapper.to_cell(pointer, rect);
        trace!("pointer down at {:?}", cell);
        self.press = Some(Press {
            cell,
            painted: false,
        });
        true
    }

    pub fn pointer_move(
        &mut self,
        pointer: [f64; 2],
        rect: CanvasRect,
        target: &mut impl EditTarget,
    ) -> Option<Edit> {
        let press = self.press.as_mut()?;

        if !rect.contains(pointer[0], pointer[1]) {
            return None;
        }

        let (row, col) = self.mapper.to_cell(pointer, rect);

        if !press.painted {
            if (row, col) == press.cell {
                return None;
            }
            press.painted = true;
            let (press_row, press_col) = press.cell;
            target.apply_edit(Edit::Paint {
                row: press_row,
                col: press_col,
            });
        }

        let edit = Edit::Paint { row, col };
        target.apply_edit(edit);
        Some(edit)
    }

    /// Ends any drag. Returns the click edit when the release completes a
    /// press that did not paint.
    pub fn pointer_up(
        &mut self,
        pointer: [f64; 2],
        rect: CanvasRect,
        modifiers: Modifiers,
        target: &mut impl EditTarget,
    ) -> Option<Edit> {
        let press = self.press.take()?;

        if press.painted || !rect.contains(pointer[0], pointer[1]) {
            return None;
        }

        let cell = self.mapper.to_cell(pointer, rect);
        Some(self.click(cell, modifiers, target))
    }

    /// Drops the drag without treating it as a click (e.g. focus lost).
    pub fn cancel(&mut self) {
        self.press = None;
    }

    /// Flips the cell, or stamps a preset when a modifier is held.
    pub fn click(
        &mut self,
        (row, col): (u32, u32),
        modifiers: Modifiers,
        target: &mut impl EditTarget,
    ) -> Edit {
        let edit = match modifiers.stamp_pattern() {
            Some(pattern) => Edit::Stamp { pattern, row, col },
            None => Edit::Toggle { row, col },
        };
        target.apply_edit(edit);
        edit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        edits: Vec<Edit>,
    }

    impl EditTarget for Recorder {
        fn apply_edit(&mut self, edit: Edit) {
            self.edits.push(edit);
        }
    }

    const NONE: Modifiers = Modifiers {
        platform: false,
        shift: false,
    };

    // 10x10 grid, 4px cells: canvas 51x51 shown at identity scale.
    fn setup() -> (InteractionController, CanvasRect, Recorder) {
        let mapper = CellMapper::new(10, 10, 4);
        let rect = CanvasRect::new(0.0, 0.0, 51.0, 51.0);
        (InteractionController::new(mapper), rect, Recorder::default())
    }

    #[test]
    fn mapper_matches_the_grid() {
        let (input, _, _) = setup();
        assert_eq!(input.mapper().canvas_size(), [51, 51]);
    }

    #[test]
    fn plain_click_toggles_once() {
        let (mut input, rect, mut target) = setup();

        assert!(input.pointer_down([12.0, 7.0], rect));
        let edit = input.pointer_up([12.0, 7.0], rect, NONE, &mut target);

        assert_eq!(edit, Some(Edit::Toggle { row: 1, col: 2 }));
        assert_eq!(target.edits, vec![Edit::Toggle { row: 1, col: 2 }]);
        assert!(!input.dragging());
    }

    #[test]
    fn jitter_inside_the_pressed_cell_is_still_a_click() {
        let (mut input, rect, mut target) = setup();

        input.pointer_down([12.0, 7.0], rect);
        assert_eq!(input.pointer_move([13.0, 8.0], rect, &mut target), None);
        input.pointer_up([13.0, 8.0], rect, NONE, &mut target);

        assert_eq!(target.edits, vec![Edit::Toggle { row: 1, col: 2 }]);
    }

    #[test]
    fn drag_paints_every_visited_cell_and_skips_the_click() {
        let (mut input, rect, mut target) = setup();

        input.pointer_down([2.0, 2.0], rect);
        input.pointer_move([7.0, 2.0], rect, &mut target);
        input.pointer_move([12.0, 2.0], rect, &mut target);
        let up = input.pointer_up([12.0, 2.0], rect, NONE, &mut target);

        assert_eq!(up, None);
        assert_eq!(
            target.edits,
            vec![
                Edit::Paint { row: 0, col: 0 },
                Edit::Paint { row: 0, col: 1 },
                Edit::Paint { row: 0, col: 2 },
            ]
        );
    }

    #[test]
    fn moves_without_a_press_do_nothing() {
        let (mut input, rect, mut target) = setup();
        assert_eq!(input.pointer_move([30.0, 30.0], rect, &mut target), None);
        assert!(target.edits.is_empty());
    }

    #[test]
    fn release_outside_the_canvas_ends_the_drag() {
        let (mut input, rect, mut target) = setup();

        input.pointer_down([2.0, 2.0], rect);
        input.pointer_move([7.0, 2.0], rect, &mut target);
        let up = input.pointer_up([500.0, 500.0], rect, NONE, &mut target);

        assert_eq!(up, None);
        assert!(!input.dragging());
        assert_eq!(input.pointer_move([12.0, 2.0], rect, &mut target), None);
        assert_eq!(target.edits.len(), 2);
    }

    #[test]
    fn presses_outside_the_canvas_are_ignored() {
        let (mut input, _, mut target) = setup();
        let rect = CanvasRect::new(20.0, 20.0, 51.0, 51.0);

        assert!(!input.pointer_down([5.0, 5.0], rect));
        assert_eq!(
            input.pointer_up([5.0, 5.0], rect, NONE, &mut target),
            None
        );
        assert!(target.edits.is_empty());
    }

    #[test]
    fn modifiers_select_the_stamp_with_platform_first() {
        let (mut input, _, mut target) = setup();
        let both = Modifiers {
            platform: true,
            shift: true,
        };
        let shift = Modifiers {
            platform: false,
            shift: true,
        };

        assert_eq!(
            input.click((4, 4), both, &mut target),
            Edit::Stamp {
                pattern: Pattern::Glider,
                row: 4,
                col: 4
            }
        );
        assert_eq!(
            input.click((4, 4), shift, &mut target),
            Edit::Stamp {
                pattern: Pattern::Pulsar,
                row: 4,
                col: 4
            }
        );
    }

    #[test]
    fn cancel_drops_the_pending_click() {
        let (mut input, rect, mut target) = setup();

        input.pointer_down([2.0, 2.0], rect);
        input.cancel();
        assert_eq!(
            input.pointer_up([2.0, 2.0], rect, NONE, &mut target),
            None
        );
        assert!(target.edits.is_empty());
    }
}
