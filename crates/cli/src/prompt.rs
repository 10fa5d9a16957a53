use std::io::{BufRead, Write};

use provisioner::{model, ModelChoice, Selection, SelectionError};

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("No answer given (end of input)")]
    Eof,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("Invalid number of instances '{0}', expected a whole number of at least 1")]
    InvalidCount(String),
    #[error("A config URL only applies to choice 5, got choice '{0}'")]
    UrlWithKnownModel(String),
}

/// Asks the operator questions on `output`, reading one line per answer from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompter<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(PromptError::Eof);
        }

        Ok(answer.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Menu answer from `preset` or the operator, asking for the URL on a custom choice.
    ///
    /// A `custom_url` alone implies the custom entry, along with any other entry it is rejected.
    pub fn select_model(
        &mut self,
        preset: Option<&str>,
        custom_url: Option<&str>,
    ) -> Result<ModelChoice, PromptError> {
        let answer = match (preset, custom_url) {
            (Some(preset), _) => preset.to_string(),
            (None, Some(_)) => "5".to_string(),
            (None, None) => {
                let menu = model::menu();
                write!(self.output, "{menu}")?;
                self.ask("Enter your choice (1-5): ")?
            },
        };

        match Selection::parse(&answer)? {
            Selection::Known(_) if custom_url.is_some() => {
                Err(PromptError::UrlWithKnownModel(answer.trim().to_string()))
            },
            Selection::Known(model) => Ok(ModelChoice::Known(model)),
            Selection::Custom => {
                let url = match custom_url {
                    Some(url) => url.to_string(),
                    None => self.ask("Enter the config URL: ")?,
                };
                Ok(ModelChoice::custom(&url)?)
            },
        }
    }

    pub fn instance_count(&mut self, preset: Option<u32>) -> Result<u32, PromptError> {
        let answer = match preset {
            Some(count) => count.to_string(),
            None => self.ask("How many instances do you want to create? ")?,
        };

        match answer.trim().parse::<u32>() {
            Ok(count) if count >= 1 => Ok(count),
            _ => Err(PromptError::InvalidCount(answer.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use provisioner::KNOWN_MODELS;

    use super::*;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), vec![])
    }

    #[test]
    fn select_model_should_show_menu_and_read_choice() {
        let mut p = prompter("3\n");

        let choice = p.select_model(None, None).unwrap();

        assert_eq!(choice.config_url(), KNOWN_MODELS[2].config_url);
        let shown = String::from_utf8(p.into_output()).unwrap();
        assert!(shown.contains("1) Qwen 1.5 0.5B Chat"));
        assert!(shown.ends_with("Enter your choice (1-5): "));
    }

    #[test]
    fn select_model_should_ask_url_for_custom_choice() {
        let mut p = prompter("5\nhttps://cfg.test/config.json\r\n");

        let choice = p.select_model(None, None).unwrap();

        assert_eq!(
            choice,
            ModelChoice::Custom("https://cfg.test/config.json".into())
        );
    }

    #[test]
    fn select_model_should_reject_out_of_range_choice() {
        let mut p = prompter("7\n");

        let err = p.select_model(None, None).unwrap_err();

        assert!(matches!(
            err,
            PromptError::Selection(SelectionError::InvalidChoice(c)) if c == "7"
        ));
    }

    #[test]
    fn select_model_should_use_presets_without_reading() {
        let mut p = prompter("");

        let known = p.select_model(Some("2"), None).unwrap();
        let custom = p
            .select_model(None, Some("https://cfg.test/x.json"))
            .unwrap();

        assert_eq!(known.config_url(), KNOWN_MODELS[1].config_url);
        assert_eq!(custom.config_url(), "https://cfg.test/x.json");
        assert!(p.into_output().is_empty());
    }

    #[test]
    fn select_model_should_reject_url_with_a_known_choice() {
        let mut p = prompter("");

        let err = p
            .select_model(Some("1"), Some("https://cfg.test/x.json"))
            .unwrap_err();
        let custom = p
            .select_model(Some("5"), Some("https://cfg.test/x.json"))
            .unwrap();

        assert!(matches!(err, PromptError::UrlWithKnownModel(c) if c == "1"));
        assert_eq!(custom.config_url(), "https://cfg.test/x.json");
    }

    #[test]
    fn select_model_should_fail_on_closed_input() {
        let mut p = prompter("");

        assert!(matches!(p.select_model(None, None), Err(PromptError::Eof)));
    }

    #[test]
    fn instance_count_should_parse_positive_numbers_only() {
        assert_eq!(prompter("4\n").instance_count(None).unwrap(), 4);
        assert_eq!(prompter("").instance_count(Some(2)).unwrap(), 2);

        for input in ["0\n", "-2\n", "two\n", "\n", "1.5\n"] {
            assert!(
                matches!(
                    prompter(input).instance_count(None),
                    Err(PromptError::InvalidCount(_))
                ),
                "input {input:?}"
            );
        }
        assert!(matches!(
            prompter("").instance_count(Some(0)),
            Err(PromptError::InvalidCount(c)) if c == "0"
        ));
    }
}
