//! Addon hook for extensions loaded into a terminal.

use crate::terminal::TerminalHandle;

/// An extension attached with `Terminal::load_addon`.
///
/// Addons are typically cheap handles the host keeps a clone of, so the host
/// can keep calling into the addon after the terminal owns it.
pub trait Addon: Send {
    /// Unique name; a terminal loads at most one addon per name.
    fn name(&self) -> &'static str;

    /// Called once when loaded. The handle does not keep the terminal alive.
    fn activate(&mut self, terminal: TerminalHandle);

    /// Called when the terminal is disposed.
    fn dispose(&mut self);
}
