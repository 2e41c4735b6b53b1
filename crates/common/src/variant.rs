//! Product variant selection.

use serde::{Deserialize, Serialize};

/// The (color, size) selection distinguishing otherwise-identical lines.
///
/// Two cart lines for the same product merge only when their variants are
/// equal field-for-field; a missing selection is itself a distinct value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    /// Selected color, if the product offers color options.
    pub color: Option<String>,
    /// Selected size, if the product offers size options.
    pub size: Option<String>,
}

impl Variant {
    /// A selection with neither color nor size.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a variant from optional color and size selections.
    pub fn new(color: Option<String>, size: Option<String>) -> Self {
        Self { color, size }
    }

    /// True when neither color nor size was selected.
    pub fn is_none(&self) -> bool {
        self.color.is_none() && self.size.is_none()
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.color, &self.size) {
            (Some(c), Some(s)) => write!(f, "{c}/{s}"),
            (Some(c), None) => write!(f, "{c}"),
            (None, Some(s)) => write!(f, "{s}"),
            (None, None) => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_field_wise() {
        let red_xl = Variant::new(Some("Red".into()), Some("XL".into()));
        let red = Variant::new(Some("Red".into()), None);
        assert_ne!(red_xl, red);
        assert_eq!(red_xl, Variant::new(Some("Red".into()), Some("XL".into())));
        assert_ne!(red, Variant::none());
    }

    #[test]
    fn display_labels() {
        assert_eq!(
            Variant::new(Some("Red".into()), Some("XL".into())).to_string(),
            "Red/XL"
        );
        assert_eq!(Variant::new(None, Some("M".into())).to_string(), "M");
        assert_eq!(Variant::none().to_string(), "-");
    }
}
