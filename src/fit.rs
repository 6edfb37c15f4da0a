//! Fit addon: size the terminal grid to its container.
//!
//! `fit()` before the engine is ready records a single pending retry that
//! runs when the terminal becomes ready, measuring the container at that
//! moment.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use termshim_terminal::{
    Addon, ContainerMetrics, ReadyOutcome, ReadyPhase, Subscription, TerminalError,
    TerminalHandle,
};

/// Width reserved for the viewport scrollbar when scrollback is enabled.
pub const DEFAULT_SCROLLBAR_WIDTH: f64 = 14.0;

pub const MINIMUM_COLS: u16 = 2;
pub const MINIMUM_ROWS: u16 = 1;

/// Grid dimensions that fit a container, or `None` if it cannot be measured.
pub fn grid_size(metrics: &ContainerMetrics, scrollbar_width: f64) -> Option<(u16, u16)> {
    if metrics.cell_width <= 0.0 || metrics.cell_height <= 0.0 {
        return None;
    }
    let available_width = (metrics.width - metrics.horizontal_padding - scrollbar_width).max(0.0);
    let available_height = (metrics.height - metrics.vertical_padding).max(0.0);
    if !available_width.is_finite() || !available_height.is_finite() {
        return None;
    }

    let cols = (available_width / metrics.cell_width).floor().min(f64::from(u16::MAX)) as u16;
    let rows = (available_height / metrics.cell_height).floor().min(f64::from(u16::MAX)) as u16;
    Some((cols.max(MINIMUM_COLS), rows.max(MINIMUM_ROWS)))
}

#[derive(Default)]
struct FitState {
    terminal: Option<TerminalHandle>,
    /// A retry is waiting for the ready notification.
    pending: bool,
    retry: Option<Subscription>,
    scrollbar_width: f64,
}

/// Resizes the terminal to fill its container.
///
/// A cheap handle: keep a clone after passing one to `Terminal::load_addon`.
#[derive(Clone)]
pub struct FitAddon {
    state: Arc<Mutex<FitState>>,
}

impl std::fmt::Debug for FitAddon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FitAddon")
            .field("attached", &state.terminal.is_some())
            .field("pending", &state.pending)
            .finish()
    }
}

impl Default for FitAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl FitAddon {
    pub fn new() -> Self {
        Self::with_scrollbar_width(DEFAULT_SCROLLBAR_WIDTH)
    }

    pub fn with_scrollbar_width(scrollbar_width: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(FitState {
                scrollbar_width,
                ..FitState::default()
            })),
        }
    }

    /// Whether a fit is waiting for the terminal to become ready.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    /// Cols/rows the container would fit, without applying them.
    ///
    /// `None` when not attached, no container is open, or it cannot be
    /// measured.
    pub fn propose_dimensions(&self) -> Option<(u16, u16)> {
        let (terminal, scrollbar_width) = {
            let state = self.state.lock();
            (state.terminal.clone()?, state.scrollbar_width)
        };
        Self::propose_for(&terminal, scrollbar_width)
    }

    fn propose_for(terminal: &TerminalHandle, scrollbar_width: f64) -> Option<(u16, u16)> {
        let metrics = terminal.container_metrics()?;
        let scrollback = terminal.options()?.scrollback();
        let reserved = if scrollback == 0 { 0.0 } else { scrollbar_width };
        grid_size(&metrics, reserved)
    }

    /// Resize the terminal to its container.
    ///
    /// Before readiness this schedules one retry for the ready transition;
    /// further calls while it is pending do nothing.
    pub fn fit(&self) -> Result<(), TerminalError> {
        let terminal = {
            let mut state = self.state.lock();
            let Some(terminal) = state.terminal.clone() else {
                log::debug!("fit() called before the addon was loaded");
                return Ok(());
            };

            match terminal.phase() {
                ReadyPhase::Ready | ReadyPhase::Notifying => {
                    let scrollbar_width = state.scrollbar_width;
                    drop(state);
                    return Self::apply(&terminal, scrollbar_width);
                }
                ReadyPhase::Disposed => return Err(TerminalError::Disposed),
                ReadyPhase::Failed => {
                    log::warn!("fit() ignored: terminal engine failed to load");
                    return Ok(());
                }
                ReadyPhase::Constructing | ReadyPhase::Loading | ReadyPhase::Flushing => {
                    if state.pending {
                        log::trace!("fit() already pending until ready");
                        return Ok(());
                    }
                    state.pending = true;
                    terminal
                }
            }
        };

        // The callback may run inside on_ready, so no lock is held here.
        let weak: Weak<Mutex<FitState>> = Arc::downgrade(&self.state);
        let registration = terminal.on_ready(move |outcome| {
            if let Some(state) = weak.upgrade() {
                FitAddon { state }.run_pending(outcome);
            }
        });

        let mut state = self.state.lock();
        match registration {
            Ok(subscription) => {
                if state.pending {
                    log::debug!("Terminal not ready; fit deferred until ready");
                    state.retry = Some(subscription);
                }
                Ok(())
            }
            Err(e) => {
                state.pending = false;
                Err(e)
            }
        }
    }

    fn run_pending(&self, outcome: &ReadyOutcome) {
        let (terminal, scrollbar_width) = {
            let mut state = self.state.lock();
            if !state.pending {
                return;
            }
            state.pending = false;
            state.retry = None;
            (state.terminal.clone(), state.scrollbar_width)
        };

        match (outcome, terminal) {
            (Ok(()), Some(terminal)) => {
                if let Err(e) = Self::apply(&terminal, scrollbar_width) {
                    log::warn!("Deferred fit failed: {}", e);
                }
            }
            (Ok(()), None) => {}
            (Err(failure), _) => log::warn!("Deferred fit dropped: {}", failure),
        }
    }

    fn apply(terminal: &TerminalHandle, scrollbar_width: f64) -> Result<(), TerminalError> {
        let Some((cols, rows)) = Self::propose_for(terminal, scrollbar_width) else {
            log::debug!("Container cannot be measured; fit skipped");
            return Ok(());
        };
        log::debug!("Fitting terminal to container: {}x{}", cols, rows);
        terminal.resize(cols, rows)
    }

    fn cancel_pending(&self) {
        let retry = {
            let mut state = self.state.lock();
            state.pending = false;
            state.retry.take()
        };
        if let Some(mut retry) = retry {
            log::debug!("Cancelling pending fit");
            retry.dispose();
        }
    }
}

impl Addon for FitAddon {
    fn name(&self) -> &'static str {
        "fit"
    }

    fn activate(&mut self, terminal: TerminalHandle) {
        self.state.lock().terminal = Some(terminal);
    }

    fn dispose(&mut self) {
        self.cancel_pending();
        self.state.lock().terminal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(width: f64, height: f64) -> ContainerMetrics {
        ContainerMetrics {
            width,
            height,
            horizontal_padding: 0.0,
            vertical_padding: 0.0,
            cell_width: 10.0,
            cell_height: 20.0,
        }
    }

    #[test]
    fn test_grid_size_floors_to_whole_cells() {
        assert_eq!(grid_size(&metrics(805.0, 490.0), 0.0), Some((80, 24)));
    }

    #[test]
    fn test_grid_size_reserves_scrollbar_and_padding() {
        let m = ContainerMetrics {
            horizontal_padding: 6.0,
            vertical_padding: 20.0,
            ..metrics(820.0, 500.0)
        };
        assert_eq!(grid_size(&m, 14.0), Some((80, 24)));
    }

    #[test]
    fn test_grid_size_minimums() {
        assert_eq!(grid_size(&metrics(5.0, 5.0), 14.0), Some((2, 1)));
    }

    #[test]
    fn test_grid_size_unmeasurable() {
        let m = ContainerMetrics {
            cell_width: 0.0,
            ..metrics(800.0, 480.0)
        };
        assert_eq!(grid_size(&m, 0.0), None);
    }

    #[test]
    fn test_detached_addon_is_inert() {
        let addon = FitAddon::new();
        assert!(addon.fit().is_ok());
        assert!(!addon.is_pending());
        assert_eq!(addon.propose_dimensions(), None);
    }
}
