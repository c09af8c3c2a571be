//! Array-index trait for fieldless enums, derived via `#[derive(ParamIndex)]`.

/// An enum whose variants each map to a fixed array slot.
pub trait Indexed: Into<usize> {
    /// Number of variants, i.e. the required array length.
    const COUNT: usize;
}
