use strum::{Display, EnumString, IntoStaticStr};

/// Camera presets exposed by `set_view`.
///
/// The wire codes follow the host's numeric-keypad shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ViewKind {
    /// Looking along -Y.
    Front,
    /// Looking down -Z.
    Top,
    /// Looking along -X.
    Right,
    /// Axonometric view.
    Isometric,
}

impl ViewKind {
    /// Maps a keypad code (`"1"`, `"2"`, `"3"`, `"7"`) to a view.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Self::Front),
            "2" => Some(Self::Top),
            "3" => Some(Self::Right),
            "7" => Some(Self::Isometric),
            _ => None,
        }
    }

    /// Name reported back to clients.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}
