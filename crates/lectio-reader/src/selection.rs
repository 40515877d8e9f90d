//! Host-side selection and context-menu state, one tracker per pane.
//!
//! Touch gestures and bridge events drive a small state machine that decides
//! when the floating action menu (highlight, copy, share, search, comment)
//! is raised, where it sits, and whether it is bound to an existing
//! highlight. The placement math is pure and has no rendering dependency.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Fixed margin the menu keeps from every screen edge.
pub const MENU_MARGIN: f32 = 8.0;
/// Vertical jump applied when the menu flips below the touch point, large
/// enough that menu and selection handle do not visually overlap.
pub const MENU_FLIP_JUMP: f32 = 56.0;

/// Compute the action-menu origin for a touch point.
///
/// The menu is midpoint-centered on the touch x and presented above the
/// touch point; both axes clamp to [`MENU_MARGIN`], and a menu that would
/// overlap the top edge flips below the touch point plus [`MENU_FLIP_JUMP`].
#[must_use]
pub fn menu_position(touch: Point, menu: Size, viewport: Size) -> Point {
    let max_x = (viewport.width - menu.width - MENU_MARGIN).max(MENU_MARGIN);
    let x = (touch.x - menu.width / 2.0).clamp(MENU_MARGIN, max_x);

    let above = touch.y - menu.height - MENU_MARGIN;
    let y = if above < MENU_MARGIN {
        touch.y + MENU_FLIP_JUMP
    } else {
        above
    };
    let max_y = (viewport.height - menu.height - MENU_MARGIN).max(MENU_MARGIN);
    Point::new(x, y.clamp(MENU_MARGIN, max_y))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// A selection is active. `highlight_id` is bound when the selection is
    /// an existing highlight being re-opened (supports removal, not just
    /// recolor) rather than a fresh range.
    Active { highlight_id: Option<u64> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuChange {
    Show(Point),
    Hide,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    state: SelectionState,
    editing: bool,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The highlight the current selection is bound to, if it re-opened an
    /// existing one.
    #[must_use]
    pub fn bound_highlight(&self) -> Option<u64> {
        match self.state {
            SelectionState::Active { highlight_id } => highlight_id,
            SelectionState::Idle => None,
        }
    }

    /// Long-press: enters `Active` from `Idle`; while already `Active` it
    /// re-raises the menu at the new coordinates without a state change.
    pub fn long_press(&mut self, touch: Point, menu: Size, viewport: Size) -> Option<MenuChange> {
        if self.editing {
            return None;
        }
        if self.state == SelectionState::Idle {
            self.state = SelectionState::Active { highlight_id: None };
        }
        Some(MenuChange::Show(menu_position(touch, menu, viewport)))
    }

    /// Native text-selection start behaves like a long-press.
    pub fn native_selection_started(
        &mut self,
        touch: Point,
        menu: Size,
        viewport: Size,
    ) -> Option<MenuChange> {
        self.long_press(touch, menu, viewport)
    }

    /// Bind an existing highlight that was tapped (ids are > 0), so its
    /// menu offers removal instead of only recolor. Returns whether the
    /// binding took effect.
    pub fn bind_highlight(&mut self, highlight_id: u64) -> bool {
        if highlight_id == 0 || self.editing {
            return false;
        }
        self.state = SelectionState::Active {
            highlight_id: Some(highlight_id),
        };
        true
    }

    /// An existing highlight was tapped with known touch coordinates; binds
    /// it and re-raises the menu at the touch point.
    pub fn highlight_tapped(
        &mut self,
        highlight_id: u64,
        touch: Point,
        menu: Size,
        viewport: Size,
    ) -> Option<MenuChange> {
        if !self.bind_highlight(highlight_id) {
            return None;
        }
        Some(MenuChange::Show(menu_position(touch, menu, viewport)))
    }

    /// Single tap elsewhere. Returns `true` when a selection finished, in
    /// which case the menu hides and the host clears the native selection.
    pub fn tap_elsewhere(&mut self) -> bool {
        if self.state == SelectionState::Idle {
            return false;
        }
        self.state = SelectionState::Idle;
        true
    }

    /// An editable field took focus; the menu is suppressed until blur.
    pub fn editing_started(&mut self) -> MenuChange {
        self.editing = true;
        self.state = SelectionState::Idle;
        MenuChange::Hide
    }

    pub fn editing_finished(&mut self) {
        self.editing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MENU_FLIP_JUMP, MENU_MARGIN, MenuChange, Point, SelectionState, SelectionTracker, Size,
        menu_position,
    };

    const MENU: Size = Size::new(240.0, 44.0);
    const VIEWPORT: Size = Size::new(400.0, 800.0);

    #[test]
    fn menu_is_midpoint_centered_when_room_allows() {
        let pos = menu_position(Point::new(200.0, 400.0), MENU, VIEWPORT);
        assert!((pos.x - 80.0).abs() < f32::EPSILON);
        assert!((pos.y - (400.0 - MENU.height - MENU_MARGIN)).abs() < f32::EPSILON);
    }

    #[test]
    fn menu_clamps_at_the_left_edge_and_never_goes_negative() {
        let pos = menu_position(Point::new(3.0, 400.0), MENU, VIEWPORT);
        assert!((pos.x - MENU_MARGIN).abs() < f32::EPSILON);
        assert!(pos.x >= 0.0);
    }

    #[test]
    fn menu_clamps_at_the_right_edge() {
        let pos = menu_position(Point::new(398.0, 400.0), MENU, VIEWPORT);
        let max_x = VIEWPORT.width - MENU.width - MENU_MARGIN;
        assert!((pos.x - max_x).abs() < f32::EPSILON);
    }

    #[test]
    fn menu_flips_below_when_it_would_overlap_the_top_edge() {
        let touch = Point::new(200.0, 30.0);
        let pos = menu_position(touch, MENU, VIEWPORT);
        assert!((pos.y - (touch.y + MENU_FLIP_JUMP)).abs() < f32::EPSILON);
    }

    #[test]
    fn long_press_activates_and_repeat_press_moves_the_menu_without_state_change() {
        let mut tracker = SelectionTracker::new();
        let first = tracker.long_press(Point::new(100.0, 300.0), MENU, VIEWPORT);
        assert!(matches!(first, Some(MenuChange::Show(_))));
        assert_eq!(
            tracker.state(),
            SelectionState::Active { highlight_id: None }
        );

        let second = tracker.long_press(Point::new(250.0, 500.0), MENU, VIEWPORT);
        let Some(MenuChange::Show(pos)) = second else {
            panic!("expected re-raised menu");
        };
        assert!((pos.y - (500.0 - MENU.height - MENU_MARGIN)).abs() < f32::EPSILON);
        assert_eq!(
            tracker.state(),
            SelectionState::Active { highlight_id: None }
        );
    }

    #[test]
    fn tapping_an_existing_highlight_binds_its_id() {
        let mut tracker = SelectionTracker::new();
        tracker.highlight_tapped(4, Point::new(120.0, 300.0), MENU, VIEWPORT);
        assert_eq!(tracker.bound_highlight(), Some(4));

        // Id zero is the renderer's "no highlight" marker.
        let mut idle = SelectionTracker::new();
        assert!(idle
            .highlight_tapped(0, Point::new(120.0, 300.0), MENU, VIEWPORT)
            .is_none());
        assert_eq!(idle.state(), SelectionState::Idle);
    }

    #[test]
    fn tap_elsewhere_finishes_the_selection_exactly_once() {
        let mut tracker = SelectionTracker::new();
        tracker.long_press(Point::new(100.0, 300.0), MENU, VIEWPORT);
        assert!(tracker.tap_elsewhere());
        assert!(!tracker.tap_elsewhere());
        assert_eq!(tracker.state(), SelectionState::Idle);
    }

    #[test]
    fn menu_is_suppressed_while_editing() {
        let mut tracker = SelectionTracker::new();
        assert_eq!(tracker.editing_started(), MenuChange::Hide);
        assert!(tracker
            .long_press(Point::new(100.0, 300.0), MENU, VIEWPORT)
            .is_none());

        tracker.editing_finished();
        assert!(tracker
            .long_press(Point::new(100.0, 300.0), MENU, VIEWPORT)
            .is_some());
    }
}
