//! Host protocol for GEM-style render plugins.
//!
//! - [`GemPlugin`] is the lifecycle the host drives an instance through.
//! - [`GemState`] carries the current frame's [`PixBlock`] down the chain.
//! - [`Atom`] is a message argument; [`ExtTexture`] parses the
//!   `extTexture` message.
//! - [`ShapeBase`] holds the size and line width every shape shares.

pub mod atom;
pub mod image;
pub mod log;
pub mod plugin;
pub mod shape;
pub mod state;
pub mod texture;

pub use atom::Atom;
pub use image::{ColorFormat, ImageStruct, PixBlock};
pub use plugin::{dispatch_message, ClassInfo, GemPlugin};
pub use shape::ShapeBase;
pub use state::GemState;
pub use texture::{ExtTexture, TextureTarget};
