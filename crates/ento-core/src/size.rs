/// The `size` form declared on a [`FieldImpl`](crate::FieldImpl).
///
/// Mirrors the two surface forms a field author can write: a bare integer
/// (`size = 50`), which means "at most this many, no declared minimum", and a
/// `[min, max]` pair, which is a precise range used by `Numeric` as
/// `(precision, scale)` and by `String` as a `CHAR`/`VARCHAR` length bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeSpec {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl SizeSpec {
    pub const NONE: SizeSpec = SizeSpec {
        min: None,
        max: None,
    };

    /// `size = n` form: `max = n, min = 0`.
    pub fn max(n: usize) -> Self {
        SizeSpec {
            min: Some(0),
            max: Some(n),
        }
    }

    /// `size = [min, max]` form: a precise range.
    pub fn range(min: usize, max: usize) -> Self {
        SizeSpec {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_none(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}
