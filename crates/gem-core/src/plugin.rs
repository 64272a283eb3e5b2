//! The lifecycle interface a host drives each plugin instance through.
//!
//! The host creates an instance, calls [`GemPlugin::start_rendering`] once its
//! GL context exists, [`GemPlugin::render`] once per frame, and
//! [`GemPlugin::stop_rendering`] before the context goes away. All calls come
//! from the host's render thread.

use anyhow::Result;

use crate::atom::Atom;
use crate::state::GemState;

/// Static description of a plugin class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    /// Name the host registers the class under.
    pub name: &'static str,
    pub description: &'static str,
}

pub trait GemPlugin {
    fn class_info(&self) -> ClassInfo;

    /// The host's GL context is current and rendering is about to begin.
    fn start_rendering(&mut self) {}

    /// Render one frame.
    fn render(&mut self, state: &mut GemState);

    /// Rendering stopped; GL resources must be released now.
    fn stop_rendering(&mut self) {}

    /// Handle a message sent to the instance.
    ///
    /// Errors are reported by the caller on the host console.
    fn message(&mut self, selector: &str, args: &[Atom]) -> Result<()> {
        let _ = args;
        anyhow::bail!("{}: no method for '{selector}'", self.class_info().name)
    }
}

/// Deliver a message and report a failure the way the host console would.
/// Returns whether the message was accepted.
pub fn dispatch_message<P: GemPlugin + ?Sized>(plugin: &mut P, selector: &str, args: &[Atom]) -> bool {
    match plugin.message(selector, args) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(class = plugin.class_info().name, "{e:#}");
            false
        }
    }
}
