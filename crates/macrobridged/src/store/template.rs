use serde::Deserialize;
use strum::{Display, EnumString};

use macrobridge_syntax::DEFAULT_HEADER;

/// Starting content for a newly created macro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateKind {
    /// Header comment only.
    #[default]
    Default,
    /// Header, `FreeCAD` import and the active document binding.
    Basic,
    /// As [`TemplateKind::Basic`] plus `import Part`.
    Part,
    /// As [`TemplateKind::Basic`] plus `import Sketcher`.
    Sketch,
}

impl TemplateKind {
    /// Source text written for this template.
    #[must_use]
    pub fn contents(self) -> String {
        let extra_import = match self {
            Self::Default => return DEFAULT_HEADER.to_owned(),
            Self::Basic => "",
            Self::Part => "import Part\n",
            Self::Sketch => "import Sketcher\n",
        };
        format!("{DEFAULT_HEADER}import FreeCAD as App\n{extra_import}doc = App.ActiveDocument\n")
    }
}
