use serde::Serialize;

/// Outcome of one aggregation.
///
/// `Empty` means the view was computed and no record was eligible for it,
/// which callers render as a "no data" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewResult<T> {
    Empty,
    NonEmpty(T),
}

impl<T> ViewResult<T> {
    /// `Empty` when `is_empty(&data)` holds
    pub fn from_data(data: T, is_empty: impl FnOnce(&T) -> bool) -> Self {
        if is_empty(&data) {
            ViewResult::Empty
        } else {
            ViewResult::NonEmpty(data)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ViewResult::Empty)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewResult::Empty => None,
            ViewResult::NonEmpty(data) => Some(data),
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            ViewResult::Empty => None,
            ViewResult::NonEmpty(data) => Some(data),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ViewResult::Empty => None,
            ViewResult::NonEmpty(data) => Some(data),
        }
    }
}
