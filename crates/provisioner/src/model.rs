use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownModel {
    pub name: &'static str,
    pub config_url: &'static str,
}

/// Menu entries 1 to 4, in menu order.
pub static KNOWN_MODELS: [KnownModel; 4] = [
    KnownModel {
        name: "Qwen 1.5 0.5B Chat",
        config_url:
            "https://raw.githubusercontent.com/GaiaNet-AI/node-configs/main/qwen-1.5-0.5b-chat/config.json",
    },
    KnownModel {
        name: "Phi-3 Mini Instruct 4k",
        config_url:
            "https://raw.githubusercontent.com/GaiaNet-AI/node-configs/main/phi-3-mini-instruct-4k/config.json",
    },
    KnownModel {
        name: "Llama 3 8B Instruct",
        config_url:
            "https://raw.githubusercontent.com/GaiaNet-AI/node-configs/main/llama-3-8b-instruct/config.json",
    },
    KnownModel {
        name: "Gemma 2 9B Instruct",
        config_url:
            "https://raw.githubusercontent.com/GaiaNet-AI/node-configs/main/gemma-2-9b-it/config.json",
    },
];

/// Menu entry asking for a custom config URL.
pub const CUSTOM_SELECTION: u8 = 5;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectionError {
    #[error("Invalid choice '{0}', expected a number between 1 and 5")]
    InvalidChoice(String),
    #[error("Custom config URL can't be empty")]
    EmptyUrl,
}

/// A parsed menu answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Known(&'static KnownModel),
    Custom,
}

impl Selection {
    pub fn parse(input: &str) -> Result<Self, SelectionError> {
        let choice = input
            .trim()
            .parse::<u8>()
            .map_err(|_| SelectionError::InvalidChoice(input.trim().to_string()))?;

        match choice {
            CUSTOM_SELECTION => Ok(Selection::Custom),
            1..=4 => Ok(Selection::Known(&KNOWN_MODELS[usize::from(choice) - 1])),
            _ => Err(SelectionError::InvalidChoice(input.trim().to_string())),
        }
    }
}

/// The model config every instance of a run is initialized with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    Known(&'static KnownModel),
    Custom(String),
}

impl ModelChoice {
    /// Custom config URL, taken as typed apart from surrounding whitespace.
    pub fn custom(url: &str) -> Result<Self, SelectionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SelectionError::EmptyUrl);
        }

        Ok(ModelChoice::Custom(url.to_string()))
    }

    pub fn config_url(&self) -> &str {
        match self {
            ModelChoice::Known(model) => model.config_url,
            ModelChoice::Custom(url) => url,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Known(model) => write!(f, "{}", model.name),
            ModelChoice::Custom(url) => write!(f, "custom config ({url})"),
        }
    }
}

/// Text of the model menu shown to the operator.
pub fn menu() -> String {
    let mut menu = String::from("Select a model configuration:\n");
    for (i, model) in KNOWN_MODELS.iter().enumerate() {
        menu.push_str(&format!("  {}) {}\n", i + 1, model.name));
    }
    menu.push_str(&format!("  {CUSTOM_SELECTION}) Custom config URL\n"));
    menu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_one_to_four_should_map_to_known_urls() {
        for (i, model) in KNOWN_MODELS.iter().enumerate() {
            let selection = Selection::parse(&(i + 1).to_string()).unwrap();
            let Selection::Known(known) = selection else {
                panic!("expected a known model for {}", i + 1);
            };

            assert_eq!(known.config_url, model.config_url);
            assert_eq!(ModelChoice::Known(known).config_url(), model.config_url);
        }
    }

    #[test]
    fn selection_one_should_be_qwen() {
        let Selection::Known(model) = Selection::parse(" 1\n").unwrap() else {
            panic!("1 is a known model");
        };

        assert_eq!(model.name, "Qwen 1.5 0.5B Chat");
        assert!(model.config_url.ends_with("/qwen-1.5-0.5b-chat/config.json"));
    }

    #[test]
    fn selection_five_should_ask_for_custom_url() {
        assert_eq!(Selection::parse("5").unwrap(), Selection::Custom);

        let choice = ModelChoice::custom("https://example.test/my/config.json\n").unwrap();
        assert_eq!(choice.config_url(), "https://example.test/my/config.json");
    }

    #[test]
    fn selection_out_of_range_should_fail() {
        for input in ["0", "6", "-1", "abc", "", "1.5", "300"] {
            assert_eq!(
                Selection::parse(input).unwrap_err(),
                SelectionError::InvalidChoice(input.to_string()),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn custom_url_should_not_be_empty() {
        assert_eq!(ModelChoice::custom("  ").unwrap_err(), SelectionError::EmptyUrl);
    }

    #[test]
    fn menu_should_list_all_choices() {
        let menu = menu();

        assert!(menu.contains("1) Qwen 1.5 0.5B Chat"));
        assert!(menu.contains("4) Gemma 2 9B Instruct"));
        assert!(menu.contains("5) Custom config URL"));
    }
}
