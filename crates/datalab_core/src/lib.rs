pub mod activation;
pub mod backprop;
pub mod clock;
pub mod config;
pub mod controller;
pub mod descent;
pub mod error;
pub mod presentation;
pub mod recurrent;
pub mod statistics;
/// The `datalab_core` crate provides the numeric engine behind the interactive
/// data-science demos. It has no notion of a page or a canvas: widgets drive it
/// through a controller and draw whatever primitives it hands back.
///
/// Key components:
/// - **Kernel**: pure functions (`activation`, `vector`, `statistics`, and the
///   `descent`, `backprop` and `recurrent` step functions).
/// - **Trajectory**: the append-only history of step results.
/// - **Controller**: manual stepping, batch training and clock-driven auto-play.
/// - **Presentation**: trajectory to points/lines/labels for an external renderer.
pub mod traits;
pub mod trajectory;
pub mod vector;

pub use error::{DemoError, Result};
