use uuid::Uuid;

use super::*;

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_select() {
    assert_eq!(Tool::default(), Tool::Select);
}

#[test]
fn tool_names_round_trip() {
    for tool in Tool::ALL {
        assert_eq!(Tool::from_name(tool.name()), Some(tool));
    }
}

#[test]
fn unknown_tool_name_is_none() {
    assert_eq!(Tool::from_name("lasso"), None);
}

#[test]
fn drag_shapes_and_placements_are_disjoint() {
    for tool in Tool::ALL {
        assert!(!(tool.is_drag_shape() && tool.is_placement()), "{tool:?}");
    }
    assert!(Tool::Circle.is_drag_shape());
    assert!(Tool::Sticky.is_placement());
    assert!(!Tool::Freehand.is_drag_shape());
    assert!(!Tool::Select.is_placement());
}

// =============================================================
// Modifiers / Key
// =============================================================

#[test]
fn command_accepts_ctrl_or_meta() {
    assert!(Modifiers { ctrl: true, ..Default::default() }.command());
    assert!(Modifiers { meta: true, ..Default::default() }.command());
    assert!(!Modifiers { shift: true, ..Default::default() }.command());
}

#[test]
fn key_match_ignores_case() {
    assert!(Key("Z".into()).is("z"));
    assert!(!Key("y".into()).is("z"));
}

// =============================================================
// InteractionState
// =============================================================

#[test]
fn default_state_is_idle() {
    let state = InteractionState::default();
    assert!(state.is_idle());
    assert_eq!(state.name(), "idle");
}

#[test]
fn draft_id_only_for_preview_gestures() {
    let id = Uuid::new_v4();
    assert_eq!(InteractionState::DrawingFreehand { id, points: Vec::new() }.draft_id(), Some(id));
    assert_eq!(
        InteractionState::DraggingShapePreview { id, anchor: Point::new(0.0, 0.0) }.draft_id(),
        Some(id)
    );
    assert_eq!(InteractionState::EditingText { id }.draft_id(), None);
    assert_eq!(InteractionState::Panning { last_screen: Point::new(0.0, 0.0) }.draft_id(), None);
}

#[test]
fn ui_state_starts_on_select() {
    let ui = UiState::default();
    assert_eq!(ui.tool, Tool::Select);
    assert!(!ui.space_held);
}
