//! Canonical shape for macro source.
//!
//! Normalization trims the code, adds any missing standard import and
//! appends the recompute/fit-view trailer when the macro never refreshes the
//! view itself. Running it twice gives the same text as running it once.

/// Text stored for a macro with no body.
pub const DEFAULT_HEADER: &str = "# FreeCAD Macro\n";

/// Import lines every macro is expected to carry, paired with the substring
/// that marks them as already present.
const STANDARD_IMPORTS: [(&str, &str); 4] = [
    ("import FreeCAD", "import FreeCAD as App"),
    ("import FreeCADGui", "import FreeCADGui as Gui"),
    ("import Part", "import Part"),
    ("import math", "import math"),
];

/// Either marker means the macro already drives the view.
const VIEW_REFRESH_MARKERS: [&str; 2] = ["Gui.activeDocument", "Gui.SendMsgToActiveView"];

const TRAILER: [&str; 4] = [
    "if App.ActiveDocument:",
    "    App.ActiveDocument.recompute()",
    "    Gui.activeDocument().activeView().viewAxometric()",
    "    Gui.SendMsgToActiveView(\"ViewFit\")",
];

/// Outcome of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMacro {
    /// The normalized source, always ending in a newline.
    pub code: String,
    /// Import lines that were inserted.
    pub added_imports: Vec<&'static str>,
    /// Whether the view trailer was appended.
    pub appended_trailer: bool,
}

impl NormalizedMacro {
    /// Returns `true` when normalization changed more than whitespace.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added_imports.is_empty() || self.appended_trailer
    }
}

/// Rewrites macro source into its canonical shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Creates a normalizer with the standard FreeCAD imports and trailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalizes `code`.
    ///
    /// Empty input, or input holding only the default header, yields
    /// [`DEFAULT_HEADER`] unchanged.
    #[must_use]
    pub fn normalize(&self, code: &str) -> NormalizedMacro {
        let trimmed = code.trim();
        if trimmed.is_empty() || trimmed == DEFAULT_HEADER.trim_end() {
            return NormalizedMacro {
                code: DEFAULT_HEADER.to_owned(),
                added_imports: Vec::new(),
                appended_trailer: false,
            };
        }

        let lines: Vec<&str> = trimmed.lines().collect();
        let added_imports: Vec<&'static str> = STANDARD_IMPORTS
            .iter()
            .filter(|(marker, _)| !lines.iter().any(|line| line.contains(marker)))
            .map(|(_, import)| *import)
            .collect();
        let appended_trailer = !lines
            .iter()
            .any(|line| VIEW_REFRESH_MARKERS.iter().any(|m| line.contains(m)));

        let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 10);
        if !added_imports.is_empty() {
            out.extend(added_imports.iter().copied());
            out.push("");
        }
        out.extend(lines.iter().copied());
        if appended_trailer {
            out.push("");
            out.extend(TRAILER);
        }

        let mut normalized = out.join("\n");
        normalized.push('\n');

        NormalizedMacro {
            code: normalized,
            added_imports,
            appended_trailer,
        }
    }
}
