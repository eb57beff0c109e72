//! Collaborative canvas for the trip-planning board.
//!
//! Compiled to WebAssembly for the browser (with the `web` feature) and as a
//! plain library for native tests. The engine turns pointer and keyboard
//! events into shapes on a local scene, writes committed shapes into a
//! [`replica::client::Replica`], and rebuilds the scene from whatever the
//! replica converges to. Peers' cursors are drawn from presence.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction state machine, [`engine::EngineCore`] and the web `Engine` |
//! | [`doc`] | `DrawableObject`, shape geometry, serialized wire form |
//! | [`factory`] | Default shapes per tool, sticky-note groups |
//! | [`scene`] | Scene surface: objects, z-order, selection, groups, camera |
//! | [`sync`] | Scene to replica writes and replica to scene materialization |
//! | [`presence`] | Cursor and selection presence, remote cursor glyphs |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Tools, input event types, gesture states |
//! | [`hit`] | Hit-testing against board objects |
//! | [`render`] | Display list built from the scene |
//! | `paint` | Display list onto a `CanvasRenderingContext2d` (`web` only) |
//! | [`shell`] | Identity, board metadata, plan generation, uploads |
//! | [`consts`] | Shared numeric constants (zoom limits, thresholds, defaults) |
//! | [`error`] | Error type and grepable codes |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod factory;
pub mod hit;
pub mod input;
#[cfg(feature = "web")]
pub mod paint;
pub mod presence;
pub mod render;
pub mod scene;
pub mod shell;
pub mod sync;

pub use error::CanvasError;
