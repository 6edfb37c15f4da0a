//! Observable options store.
//!
//! `OptionsStore` is a cheap-to-clone handle over one shared `TerminalOptions`.
//! Every write goes through [`OptionsStore::batch`], which commits the changes
//! atomically and then notifies listeners with the whole batch. Reads never
//! wait on anything but the store lock, so a value is observable immediately
//! after it is written.
//!
//! The store lock is never held while listeners run; listeners may read or
//! write the store re-entrantly.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::ConfigError;
use crate::options::{OptionKey, OptionName, OptionValue, TerminalOptions};
use crate::subscription::Subscription;
use crate::types::{CursorStyle, Theme};

/// A single committed option write.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionChange {
    pub key: OptionKey,
    pub value: OptionValue,
}

type ChangeListener = Arc<dyn Fn(&[OptionChange]) + Send + Sync>;

struct StoreInner {
    options: TerminalOptions,
    listeners: Vec<(u64, ChangeListener)>,
    next_listener_id: u64,
}

/// Shared, observable option store.
#[derive(Clone)]
pub struct OptionsStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl std::fmt::Debug for OptionsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("OptionsStore")
            .field("options", &inner.options)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl Default for OptionsStore {
    fn default() -> Self {
        Self::new(TerminalOptions::default())
    }
}

/// Working set handed to [`OptionsStore::batch`].
///
/// Writes are staged on a copy of the options and committed together; an
/// error from any write discards the whole batch.
pub struct OptionsBatch<'a> {
    options: &'a mut TerminalOptions,
    changes: Vec<OptionChange>,
}

impl OptionsBatch<'_> {
    /// Stage a write by wire name.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        let key = self.options.assign(name, value.clone())?;
        self.changes.push(OptionChange { key, value });
        Ok(())
    }

    /// Read through the staged state.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.options.get(name)
    }
}

impl OptionsStore {
    pub fn new(options: TerminalOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                options,
                listeners: Vec::new(),
                next_listener_id: 1,
            })),
        }
    }

    /// Copy of every current value.
    pub fn snapshot(&self) -> TerminalOptions {
        self.inner.lock().options.clone()
    }

    /// Read an option by wire name.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.inner.lock().options.get(name)
    }

    /// Write an option by wire name.
    ///
    /// Unknown names are stored as extensions and never fail; declared names
    /// fail only on a type mismatch, leaving the store untouched.
    pub fn set(&self, name: &str, value: OptionValue) -> Result<(), ConfigError> {
        self.batch(|batch| batch.set(name, value))
    }

    /// Apply several writes with a single notification.
    ///
    /// The closure must not call back into this store; it only sees the
    /// staged batch.
    pub fn batch<F>(&self, stage: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut OptionsBatch<'_>) -> Result<(), ConfigError>,
    {
        let (changes, listeners) = {
            let mut inner = self.inner.lock();
            let mut working = inner.options.clone();
            let mut batch = OptionsBatch {
                options: &mut working,
                changes: Vec::new(),
            };
            stage(&mut batch)?;
            let OptionsBatch { changes, .. } = batch;
            if changes.is_empty() {
                return Ok(());
            }
            inner.options = working;
            (changes, inner.listeners.clone())
        };

        for change in &changes {
            log::debug!("Option '{}' set to {}", change.key, change.value);
        }

        for (id, listener) in listeners {
            // A listener disposed by an earlier one in this pass must not run.
            if self.is_listening(id) {
                listener(&changes);
            }
        }
        Ok(())
    }

    /// Register a listener for committed batches.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[OptionChange]) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<StoreInner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Drop every listener. Used when the owning terminal is disposed.
    pub fn clear_listeners(&self) {
        self.inner.lock().listeners.clear();
    }

    fn is_listening(&self, id: u64) -> bool {
        self.inner
            .lock()
            .listeners
            .iter()
            .any(|(listener_id, _)| *listener_id == id)
    }

    /// Commit a typed field write. The field is assigned directly, so a value
    /// with no JSON form (a non-finite float) is still stored as written.
    fn set_known<F>(&self, name: OptionName, assign: F)
    where
        F: FnOnce(&mut TerminalOptions),
    {
        let staged = self.batch(|batch| {
            assign(&mut *batch.options);
            let value = batch.options.value_of(name);
            batch.changes.push(OptionChange {
                key: OptionKey::Known(name),
                value,
            });
            Ok(())
        });
        if let Err(e) = staged {
            log::error!("Failed to set option '{}': {}", name, e);
        }
    }
}

macro_rules! typed_accessors {
    ($( $(#[$doc:meta])* $field:ident, $setter:ident => $name:ident: $ty:ty; )*) => {
        #[allow(clippy::clone_on_copy)]
        impl OptionsStore {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> $ty {
                    self.inner.lock().options.$field.clone()
                }

                pub fn $setter(&self, value: $ty) {
                    self.set_known(OptionName::$name, move |options| options.$field = value);
                }
            )*
        }
    };
}

typed_accessors! {
    /// Terminal width in columns.
    cols, set_cols => Cols: u16;
    /// Terminal height in rows.
    rows, set_rows => Rows: u16;
    cursor_blink, set_cursor_blink => CursorBlink: bool;
    cursor_style, set_cursor_style => CursorStyle: CursorStyle;
    /// When set, host keystrokes are dropped instead of emitted.
    disable_stdin, set_disable_stdin => DisableStdin: bool;
    windows_mode, set_windows_mode => WindowsMode: bool;
    convert_eol, set_convert_eol => ConvertEol: bool;
    allow_proposed_api, set_allow_proposed_api => AllowProposedApi: bool;
    scrollback, set_scrollback => Scrollback: usize;
    font_size, set_font_size => FontSize: f32;
    font_family, set_font_family => FontFamily: String;
    line_height, set_line_height => LineHeight: f32;
    letter_spacing, set_letter_spacing => LetterSpacing: f32;
    theme, set_theme => Theme: Theme;
}
