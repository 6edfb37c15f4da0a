//! Default values for terminal-behaviour settings.

pub fn cols() -> u16 {
    80
}

pub fn rows() -> u16 {
    24
}

pub fn scrollback() -> usize {
    1000
}
