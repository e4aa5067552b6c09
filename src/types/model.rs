use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A chat-completion model identifier.
///
/// This can be a predefined model or a custom string for models this crate
/// does not know about (fine-tunes, other providers behind a compatible API).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Known chat-completion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// GPT-3.5 Turbo
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,

    /// GPT-4
    #[serde(rename = "gpt-4")]
    Gpt4,

    /// GPT-4 Turbo
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,

    /// GPT-4o
    #[serde(rename = "gpt-4o")]
    Gpt4o,

    /// GPT-4o mini
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl KnownModel {
    const ALL: [KnownModel; 5] = [
        KnownModel::Gpt35Turbo,
        KnownModel::Gpt4,
        KnownModel::Gpt4Turbo,
        KnownModel::Gpt4o,
        KnownModel::Gpt4oMini,
    ];

    /// The identifier sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Gpt35Turbo => "gpt-3.5-turbo",
            KnownModel::Gpt4 => "gpt-4",
            KnownModel::Gpt4Turbo => "gpt-4-turbo",
            KnownModel::Gpt4o => "gpt-4o",
            KnownModel::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Gpt35Turbo)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{}", known_model),
            Model::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    /// Parse a model name, preferring a known model when the name matches one.
    ///
    /// # Errors
    ///
    /// Returns an error string if the name is empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("model name must not be empty".to_string());
        }
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str() == s)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Gpt35Turbo);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gpt-3.5-turbo""#);

        let model = Model::Known(KnownModel::Gpt4oMini);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""gpt-4o-mini""#);
    }

    #[test]
    fn custom_model_serialization() {
        let model = Model::Custom("my-fine-tune".to_string());
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""my-fine-tune""#);
    }

    #[test]
    fn model_deserialization() {
        let model: Model = serde_json::from_str(r#""gpt-4o""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Gpt4o));

        let model: Model = serde_json::from_str(r#""llama3""#).unwrap();
        assert_eq!(model, Model::Custom("llama3".to_string()));
    }

    #[test]
    fn parse() {
        assert_eq!(
            "gpt-4".parse::<Model>(),
            Ok(Model::Known(KnownModel::Gpt4))
        );
        assert_eq!(
            " mistral-large ".parse::<Model>(),
            Ok(Model::Custom("mistral-large".to_string()))
        );
        assert!("".parse::<Model>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Model::default().to_string(), "gpt-3.5-turbo");
        assert_eq!(Model::Custom("x".to_string()).to_string(), "x");
    }
}
