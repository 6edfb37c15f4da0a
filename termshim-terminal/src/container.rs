//! Host container the terminal is attached to with `Terminal::open`.

/// Pixel measurements of the host container at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerMetrics {
    /// Content-box width in pixels
    pub width: f64,
    /// Content-box height in pixels
    pub height: f64,
    /// Left + right padding of the terminal element
    pub horizontal_padding: f64,
    /// Top + bottom padding of the terminal element
    pub vertical_padding: f64,
    /// Rendered cell width in pixels
    pub cell_width: f64,
    /// Rendered cell height in pixels
    pub cell_height: f64,
}

/// Something that can be measured on demand.
///
/// Returns `None` while the container is detached or hidden.
pub trait Container: Send + Sync {
    fn metrics(&self) -> Option<ContainerMetrics>;
}
