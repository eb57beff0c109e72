//! Board shell seams: identity, board metadata, plan generation, uploads.
//!
//! The shell around the canvas (sign-in, board lookup, the AI planner, the
//! upload service) lives outside this crate. These are the narrow points
//! where it plugs in.

#[cfg(test)]
#[path = "shell_test.rs"]
mod shell_test;

use replica::presence::UserInfo;
use tracing::{debug, info};

pub use replica::board::{BoardMeta, session_id_for};

use crate::camera::Point;
use crate::doc::Shape;
use crate::engine::{Action, EngineCore};
use crate::scene::SceneSurface;

// =============================================================
// Identity
// =============================================================

/// Source of the signed-in user. `None` means an anonymous editor, which can
/// still draw.
pub trait Identity {
    fn current_user(&self) -> Option<UserInfo>;
}

/// No one is signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Identity for Anonymous {
    fn current_user(&self) -> Option<UserInfo> {
        None
    }
}

impl Identity for UserInfo {
    fn current_user(&self) -> Option<UserInfo> {
        Some(self.clone())
    }
}

/// Build an engine stamped with whoever `identity` reports.
#[must_use]
pub fn engine_for(identity: &dyn Identity) -> EngineCore {
    EngineCore::with_user(identity.current_user())
}

// =============================================================
// Plan generation
// =============================================================

/// Text of every sticky note and text box, one per line, bottom to top.
#[must_use]
pub fn extract_board_text(scene: &SceneSurface) -> String {
    scene
        .ordered()
        .into_iter()
        .filter_map(|obj| match &obj.shape {
            Shape::Text { text, .. } => Some(text.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the planner collaborator receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub board_id: String,
    pub board_name: String,
    pub board_text: String,
}

/// Trigger and callback slot for plan generation. The returned plan is
/// handed to the callback as-is; nothing on the board changes.
#[derive(Default)]
pub struct PlanSlot {
    on_plan: Option<Box<dyn FnMut(String)>>,
}

impl PlanSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the callback, replacing any previous one.
    pub fn on_plan(&mut self, callback: impl FnMut(String) + 'static) {
        self.on_plan = Some(Box::new(callback));
    }

    /// Snapshot the board text for the planner.
    #[must_use]
    pub fn generate(&self, meta: &BoardMeta, scene: &SceneSurface) -> PlanRequest {
        let board_text = extract_board_text(scene);
        info!(board_id = %meta.id, chars = board_text.len(), "shell: plan requested");
        PlanRequest {
            board_id: meta.id.clone(),
            board_name: meta.name.clone(),
            board_text,
        }
    }

    /// Hand a finished plan to the callback. Returns `false` if none is set.
    pub fn deliver(&mut self, plan: String) -> bool {
        match self.on_plan.as_mut() {
            Some(callback) => {
                callback(plan);
                true
            }
            None => {
                debug!("shell: plan arrived with no callback installed");
                false
            }
        }
    }
}

impl std::fmt::Debug for PlanSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanSlot")
            .field("on_plan", &self.on_plan.is_some())
            .finish()
    }
}

// =============================================================
// Uploads
// =============================================================

/// Place an uploaded image with its top-left at a screen point.
pub fn place_uploaded_image(engine: &mut EngineCore, url: &str, screen: Point, width: f64, height: f64) -> Vec<Action> {
    let world = engine.camera().screen_to_world(screen);
    engine.place_image(url, world, width, height)
}
