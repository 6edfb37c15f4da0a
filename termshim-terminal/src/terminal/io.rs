//! Output, input, resize and row access.

use std::borrow::Cow;

use termshim_config::{OptionName, OptionValue, Subscription};

use super::{Inner, Terminal};
use crate::engine::{Engine, HyperlinkSpan};
use crate::error::TerminalError;
use crate::readiness::ReadyPhase;
use crate::write_queue::WriteCallback;

/// Feed one payload to the engine, translating bare `\n` when `convertEol`
/// is set.
pub(crate) fn commit_write(engine: &mut dyn Engine, data: &[u8], convert_eol: bool) {
    let data = if convert_eol {
        convert_line_endings(data)
    } else {
        Cow::Borrowed(data)
    };
    log::trace!("Writing {} byte(s) to engine", data.len());
    engine.write(&data);
}

fn convert_line_endings(data: &[u8]) -> Cow<'_, [u8]> {
    let bare_newlines = data
        .iter()
        .enumerate()
        .filter(|(i, byte)| **byte == b'\n' && (*i == 0 || data[i - 1] != b'\r'))
        .count();
    if bare_newlines == 0 {
        return Cow::Borrowed(data);
    }

    let mut converted = Vec::with_capacity(data.len() + bare_newlines);
    for (i, byte) in data.iter().enumerate() {
        if *byte == b'\n' && (i == 0 || data[i - 1] != b'\r') {
            converted.push(b'\r');
        }
        converted.push(*byte);
    }
    Cow::Owned(converted)
}

impl Terminal {
    /// Write output to the terminal.
    ///
    /// Never blocks. Before readiness the payload is queued; afterwards it is
    /// applied immediately. Fails only after `dispose()`.
    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<(), TerminalError> {
        self.inner.write(data.as_ref().to_vec(), None)
    }

    /// Write output and run `callback` once it has been applied to the engine.
    ///
    /// Callbacks run in the order their writes were issued. A write discarded
    /// by `dispose()` never runs its callback.
    pub fn write_with_callback<F>(
        &self,
        data: impl AsRef<[u8]>,
        callback: F,
    ) -> Result<(), TerminalError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .write(data.as_ref().to_vec(), Some(Box::new(callback)))
    }

    pub fn write_str(&self, data: &str) -> Result<(), TerminalError> {
        self.write(data.as_bytes())
    }

    /// Write a line followed by `\r\n`.
    pub fn writeln(&self, line: &str) -> Result<(), TerminalError> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.inner.write(data, None)
    }

    /// Number of writes still waiting for the engine.
    pub fn pending_write_count(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Payloads still waiting for the engine, in issue order. After a load
    /// failure this is the output that never reached an engine.
    pub fn pending_writes(&self) -> Vec<Vec<u8>> {
        self.inner
            .state
            .lock()
            .queue
            .payloads()
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Feed host keystrokes (already encoded) to `on_data` listeners.
    ///
    /// Dropped while `disableStdin` is set.
    pub fn input(&self, data: &str) {
        if self.is_disposed() {
            log::warn!("Input to a disposed terminal ignored");
            return;
        }
        if self.inner.options.disable_stdin() {
            log::trace!("stdin disabled; dropping {} byte(s) of input", data.len());
            return;
        }
        self.inner.data.emit(data);
    }

    /// Subscribe to data produced by [`Terminal::input`].
    pub fn on_data<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.data.subscribe(listener)
    }

    /// Change the terminal size. Stored immediately; the engine is resized
    /// once (now if ready, otherwise at the ready transition).
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), TerminalError> {
        self.inner.resize(cols, rows)
    }

    /// Current `(cols, rows)` from the option store.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.inner.options.cols(), self.inner.options.rows())
    }

    /// Per-cell code points of a viewport row, or `None` before readiness.
    pub fn row_codepoints(&self, row: usize) -> Option<Vec<u32>> {
        let state = self.inner.state.lock();
        if !state.gate.phase().is_live() {
            return None;
        }
        state.engine.as_ref()?.row_codepoints(row)
    }

    /// Explicit hyperlinks on a viewport row; empty before readiness.
    pub fn hyperlinks(&self, row: usize) -> Vec<HyperlinkSpan> {
        let state = self.inner.state.lock();
        if !state.gate.phase().is_live() {
            return Vec::new();
        }
        state
            .engine
            .as_ref()
            .map(|engine| engine.hyperlinks(row))
            .unwrap_or_default()
    }
}

impl Inner {
    pub(crate) fn write(
        &self,
        data: Vec<u8>,
        callback: Option<WriteCallback>,
    ) -> Result<(), TerminalError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.gate.phase() {
            ReadyPhase::Disposed => {
                log::warn!("Write of {} byte(s) to a disposed terminal ignored", data.len());
                Err(TerminalError::Disposed)
            }
            phase if phase.is_live() => {
                let convert_eol = self.options.convert_eol();
                if let Some(engine) = state.engine.as_deref_mut() {
                    commit_write(engine, &data, convert_eol);
                }
                drop(guard);
                if let Some(callback) = callback {
                    callback();
                }
                Ok(())
            }
            ReadyPhase::Failed => {
                log::warn!(
                    "Engine failed to load; retaining write of {} byte(s) unapplied",
                    data.len()
                );
                state.queue.push(data, callback);
                Ok(())
            }
            phase => {
                log::trace!("Queueing write of {} byte(s) ({:?})", data.len(), phase);
                state.queue.push(data, callback);
                Ok(())
            }
        }
    }

    pub(crate) fn resize(&self, cols: u16, rows: u16) -> Result<(), TerminalError> {
        if cols == 0 || rows == 0 {
            return Err(TerminalError::InvalidDimensions { cols, rows });
        }
        if self.phase() == ReadyPhase::Disposed {
            return Err(TerminalError::Disposed);
        }
        if self.options.cols() == cols && self.options.rows() == rows {
            return Ok(());
        }

        log::info!("Resizing terminal to: {}x{}", cols, rows);
        self.options.batch(|batch| {
            batch.set(OptionName::Cols.as_str(), OptionValue::from(cols))?;
            batch.set(OptionName::Rows.as_str(), OptionValue::from(rows))
        })?;
        Ok(())
    }
}
