use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Recognize `<<macro/>>` self-closing syntax and synthesize close tokens
    pub self_close_macros: bool,
    /// Lex and classify macro call arguments
    pub parse_arguments: bool,
    /// Validate classified arguments against definition parameter formats
    pub validate_parameters: bool,
    /// Emit diagnostics for macro names with no definition
    pub unrecognized_diagnostics: bool,
    /// Attach fuzzy "did you mean" hints to unrecognized/deprecated macros
    pub suggestions: bool,
    /// Warn when a link/image argument names a passage that does not exist
    pub passage_warnings: bool,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/twixt/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.twixt",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("self_close_macros", false)?
            .set_default("parse_arguments", true)?
            .set_default("validate_parameters", true)?
            .set_default("unrecognized_diagnostics", true)?
            .set_default("suggestions", true)?
            .set_default("passage_warnings", true)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            self_close_macros: false,
            parse_arguments: true,
            validate_parameters: true,
            unrecognized_diagnostics: true,
            suggestions: true,
            passage_warnings: true,
        }
    }
}
