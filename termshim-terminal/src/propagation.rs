//! Option propagation: pushing stored option values into the live engine.
//!
//! Every option write lands in the `OptionsStore` first. The terminal then
//! hands the changed keys to a [`Propagator`], which either defers them (engine
//! not ready) or applies them by option name. Propagation is idempotent per
//! option: a value equal to the last one applied is skipped.

use std::collections::{BTreeSet, HashMap};

use termshim_config::{OptionKey, OptionName, OptionValue, TerminalOptions};

use crate::engine::Engine;
use crate::error::PropagationError;

/// How a change to an option reaches live behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationKind {
    /// Collapsed into a single engine resize per batch.
    Resize,
    /// Forwarded through the engine option interface.
    Engine,
    /// Read by the shim itself on each use; nothing to push.
    Local,
    /// Stored, but needs a render pipeline rebuild that is not modelled.
    Unsupported,
    /// Host extension with no behaviour attached.
    Inert,
}

pub fn classify(key: &OptionKey) -> PropagationKind {
    let Some(name) = key.known() else {
        return PropagationKind::Inert;
    };
    match name {
        OptionName::Cols | OptionName::Rows => PropagationKind::Resize,
        OptionName::CursorBlink
        | OptionName::CursorStyle
        | OptionName::DisableStdin
        | OptionName::WindowsMode
        | OptionName::Scrollback => PropagationKind::Engine,
        OptionName::ConvertEol | OptionName::AllowProposedApi => PropagationKind::Local,
        OptionName::Theme
        | OptionName::FontSize
        | OptionName::FontFamily
        | OptionName::LineHeight
        | OptionName::LetterSpacing => PropagationKind::Unsupported,
    }
}

/// Tracks what has been applied to the engine and what is still deferred.
#[derive(Debug, Default)]
pub struct Propagator {
    applied: HashMap<OptionName, OptionValue>,
    applied_size: Option<(u16, u16)>,
    deferred: BTreeSet<OptionName>,
}

impl Propagator {
    /// A propagator for a freshly constructed terminal.
    ///
    /// Engines are created at the construction size, so that size counts as
    /// applied. Every engine-backed option is pushed at the first
    /// reconciliation.
    pub fn with_initial_sync(initial: &TerminalOptions) -> Self {
        let deferred = OptionName::ALL
            .into_iter()
            .filter(|name| classify(&OptionKey::Known(*name)) == PropagationKind::Engine)
            .collect();
        Self {
            applied_size: Some((initial.cols, initial.rows)),
            deferred,
            ..Self::default()
        }
    }

    /// Remember changed keys until the engine is ready.
    pub fn defer<'a>(&mut self, keys: impl IntoIterator<Item = &'a OptionKey>) {
        for key in keys {
            if let Some(name) = key.known() {
                self.deferred.insert(name);
            }
        }
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Apply everything deferred so far.
    pub fn reconcile(
        &mut self,
        engine: &mut dyn Engine,
        options: &TerminalOptions,
    ) -> Vec<PropagationError> {
        let keys: Vec<OptionKey> = std::mem::take(&mut self.deferred)
            .into_iter()
            .map(OptionKey::Known)
            .collect();
        log::debug!("Reconciling {} deferred option(s)", keys.len());
        self.apply(engine, &keys, options)
    }

    /// Apply one batch of changed keys, reading values from `options`.
    ///
    /// A failure for one option never stops the rest of the batch; failures
    /// and unsupported options are logged and returned.
    pub fn apply(
        &mut self,
        engine: &mut dyn Engine,
        keys: &[OptionKey],
        options: &TerminalOptions,
    ) -> Vec<PropagationError> {
        let mut problems = Vec::new();
        let mut resize_requested = false;

        for key in keys {
            match classify(key) {
                PropagationKind::Resize => resize_requested = true,
                PropagationKind::Engine => {
                    let Some(name) = key.known() else { continue };
                    if let Err(e) = self.apply_engine_option(engine, name, options) {
                        log::error!("{}", e);
                        problems.push(e);
                    }
                }
                PropagationKind::Local => {
                    log::trace!("Option '{}' is read on use; nothing to propagate", key);
                }
                PropagationKind::Unsupported => {
                    let Some(name) = key.known() else { continue };
                    let warning = PropagationError::UnsupportedAtRuntime(name);
                    log::warn!("{}", warning);
                    problems.push(warning);
                }
                PropagationKind::Inert => {
                    log::trace!("Extension option '{}' stored without propagation", key);
                }
            }
        }

        if resize_requested && let Err(e) = self.apply_size(engine, options) {
            log::error!("{}", e);
            problems.push(e);
        }

        problems
    }

    fn apply_engine_option(
        &mut self,
        engine: &mut dyn Engine,
        name: OptionName,
        options: &TerminalOptions,
    ) -> Result<(), PropagationError> {
        let value = options.value_of(name);
        if self.applied.get(&name) == Some(&value) {
            log::trace!("Option '{}' already applied with {}", name, value);
            return Ok(());
        }

        log::debug!("Propagating option '{}' = {}", name, value);
        engine
            .set_option(name.as_str(), &value)
            .map_err(|source| PropagationError::Engine { name, source })?;
        self.applied.insert(name, value);
        Ok(())
    }

    fn apply_size(
        &mut self,
        engine: &mut dyn Engine,
        options: &TerminalOptions,
    ) -> Result<(), PropagationError> {
        let size = (options.cols, options.rows);
        if self.applied_size == Some(size) {
            return Ok(());
        }

        log::info!("Resizing engine to {}x{}", size.0, size.1);
        engine
            .resize(size.0, size.1)
            .map_err(|source| PropagationError::Engine {
                name: OptionName::Cols,
                source,
            })?;
        self.applied_size = Some(size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HyperlinkSpan;
    use crate::error::EngineError;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingEngine {
        resizes: Vec<(u16, u16)>,
        options: Vec<(String, OptionValue)>,
        reject: Option<&'static str>,
    }

    impl Engine for RecordingEngine {
        fn write(&mut self, _data: &[u8]) {}

        fn resize(&mut self, cols: u16, rows: u16) -> Result<(), EngineError> {
            self.resizes.push((cols, rows));
            Ok(())
        }

        fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<(), EngineError> {
            if self.reject == Some(name) {
                return Err(EngineError::Option {
                    name: name.to_string(),
                    reason: "rejected".to_string(),
                });
            }
            self.options.push((name.to_string(), value.clone()));
            Ok(())
        }

        fn hyperlinks(&self, _row: usize) -> Vec<HyperlinkSpan> {
            Vec::new()
        }

        fn row_codepoints(&self, _row: usize) -> Option<Vec<u32>> {
            None
        }
    }

    fn keys(names: &[&str]) -> Vec<OptionKey> {
        names.iter().map(|name| OptionKey::parse(name)).collect()
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify(&OptionKey::parse("rows")), PropagationKind::Resize);
        assert_eq!(classify(&OptionKey::parse("windowsMode")), PropagationKind::Engine);
        assert_eq!(classify(&OptionKey::parse("convertEol")), PropagationKind::Local);
        assert_eq!(classify(&OptionKey::parse("theme")), PropagationKind::Unsupported);
        assert_eq!(classify(&OptionKey::parse("whatever")), PropagationKind::Inert);
    }

    #[test]
    fn test_cols_and_rows_collapse_into_one_resize() {
        let mut engine = RecordingEngine::default();
        let mut propagator = Propagator::default();
        let options = TerminalOptions {
            cols: 100,
            rows: 30,
            ..TerminalOptions::default()
        };

        let problems = propagator.apply(&mut engine, &keys(&["cols", "rows"]), &options);
        assert!(problems.is_empty());
        assert_eq!(engine.resizes, vec![(100, 30)]);
    }

    #[test]
    fn test_same_value_applied_once() {
        let mut engine = RecordingEngine::default();
        let mut propagator = Propagator::default();
        let options = TerminalOptions {
            cursor_blink: true,
            ..TerminalOptions::default()
        };

        propagator.apply(&mut engine, &keys(&["cursorBlink"]), &options);
        propagator.apply(&mut engine, &keys(&["cursorBlink"]), &options);
        assert_eq!(engine.options, vec![("cursorBlink".to_string(), json!(true))]);
    }

    #[test]
    fn test_failure_does_not_block_batch() {
        let mut engine = RecordingEngine {
            reject: Some("cursorBlink"),
            ..RecordingEngine::default()
        };
        let mut propagator = Propagator::default();
        let options = TerminalOptions::default();

        let problems = propagator.apply(
            &mut engine,
            &keys(&["cursorBlink", "windowsMode", "fontSize"]),
            &options,
        );

        assert_eq!(problems.len(), 2);
        assert!(matches!(
            problems[0],
            PropagationError::Engine {
                name: OptionName::CursorBlink,
                ..
            }
        ));
        assert!(matches!(
            problems[1],
            PropagationError::UnsupportedAtRuntime(OptionName::FontSize)
        ));
        assert_eq!(engine.options, vec![("windowsMode".to_string(), json!(false))]);
    }

    #[test]
    fn test_initial_sync_pushes_engine_backed_options() {
        let mut engine = RecordingEngine::default();
        let options = TerminalOptions::default();
        let mut propagator = Propagator::with_initial_sync(&options);

        let problems = propagator.reconcile(&mut engine, &options);
        assert!(problems.is_empty());
        assert!(engine.resizes.is_empty());
        assert_eq!(engine.options.len(), 5);
        assert_eq!(propagator.deferred_count(), 0);
    }

    #[test]
    fn test_initial_sync_resizes_when_size_changed_before_ready() {
        let mut engine = RecordingEngine::default();
        let mut propagator = Propagator::with_initial_sync(&TerminalOptions::default());
        propagator.defer(&keys(&["cols"]));

        let options = TerminalOptions {
            cols: 120,
            ..TerminalOptions::default()
        };
        propagator.reconcile(&mut engine, &options);
        assert_eq!(engine.resizes, vec![(120, 24)]);
    }

    #[test]
    fn test_deferred_unsupported_option_warns_at_reconcile() {
        let mut engine = RecordingEngine::default();
        let mut propagator = Propagator::default();
        propagator.defer(&keys(&["theme", "someExtension"]));
        assert_eq!(propagator.deferred_count(), 1);

        let problems = propagator.reconcile(&mut engine, &TerminalOptions::default());
        assert!(matches!(
            problems.as_slice(),
            [PropagationError::UnsupportedAtRuntime(OptionName::Theme)]
        ));
    }
}
