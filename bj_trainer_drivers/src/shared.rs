use std::fs;
use std::path::{Path, PathBuf};

use bj_trainer::{RuleConfig, TrainerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up in the home directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".bj_trainer.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown rule mode: {0}")]
    RuleMode(#[from] serde::de::value::Error),

    #[error(transparent)]
    Rule(#[from] TrainerError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rule: ConfigRule,
    #[serde(default)]
    pub shoe_simulator: ConfigShoeSimulator,
    #[serde(default)]
    pub trainer: ConfigTrainer,
}

/// Table rules as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRule {
    /// `h17` or `s17`.
    pub dealer_on_soft17: String,
    /// `das` or `ndas`.
    pub double_after_split: String,
    /// `surrender` or `nosurrender`.
    pub surrender: String,
    pub number_of_decks: u8,
    pub max_bet: Option<u32>,
    /// Steps separated by `-` or `,`, e.g. `"1-2-4"`.
    pub custom_progression: Option<String>,
}

impl Default for ConfigRule {
    fn default() -> Self {
        ConfigRule {
            dealer_on_soft17: String::from("h17"),
            double_after_split: String::from("das"),
            surrender: String::from("nosurrender"),
            number_of_decks: 6,
            max_bet: None,
            custom_progression: None,
        }
    }
}

impl TryInto<RuleConfig> for ConfigRule {
    type Error = serde::de::value::Error;

    fn try_into(self) -> Result<RuleConfig, Self::Error> {
        let rules = RuleConfig {
            dealer_soft17: self.dealer_on_soft17.parse()?,
            double_after_split: self.double_after_split.parse()?,
            surrender: self.surrender.parse()?,
            number_of_decks: self.number_of_decks,
            max_bet: self.max_bet,
            custom_progression: self
                .custom_progression
                .as_deref()
                .map(parse_progression)
                .unwrap_or_default(),
        };

        Ok(rules)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigShoeSimulator {
    pub shoes: u32,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ConfigShoeSimulator {
    fn default() -> Self {
        ConfigShoeSimulator {
            shoes: 1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigTrainer {
    /// Pause before the dealer's cards are shown. Display only.
    pub reveal_delay_ms: u64,
    pub seed: Option<u64>,
}

impl Default for ConfigTrainer {
    fn default() -> Self {
        ConfigTrainer {
            reveal_delay_ms: 600,
            seed: None,
        }
    }
}

impl Config {
    /// Validated rules for the trainer.
    pub fn rules(&self) -> Result<RuleConfig, ConfigError> {
        let rules: RuleConfig = self.rule.clone().try_into()?;
        rules.validate()?;
        Ok(rules)
    }
}

/// Reads a betting progression, keeping only positive whole numbers.
/// `"1-3-2-6"`, `"1, 3, 2, 6"` and `"1,x,3"` (giving `[1, 3]`) are all
/// accepted.
pub fn parse_progression(text: &str) -> Vec<u32> {
    text.split(|c: char| c == ',' || c == '-')
        .filter_map(|step| step.trim().parse::<u32>().ok())
        .filter(|&step| step > 0)
        .collect()
}

pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(filename).map_err(|source| ConfigError::Io {
        path: filename.to_path_buf(),
        source,
    })?;
    parse_config_str(&content)
}

/// Loads the given file, or `~/.bj_trainer.yml` when none is given. A
/// missing default file means built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return parse_config_from_file(path);
    }
    match home::home_dir().map(|dir| dir.join(DEFAULT_CONFIG_FILE)) {
        Some(default_path) if default_path.is_file() => {
            log::info!("using config {}", default_path.display());
            parse_config_from_file(&default_path)
        }
        _ => {
            log::info!("no config file found, using default rules");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bj_trainer::{DealerSoft17, DoubleAfterSplit, SurrenderPolicy};

    fn get_typical_config_rule() -> ConfigRule {
        ConfigRule {
            dealer_on_soft17: String::from("s17"),
            double_after_split: String::from("ndas"),
            surrender: String::from("surrender"),
            number_of_decks: 2,
            max_bet: Some(50),
            custom_progression: Some(String::from("1-2-4")),
        }
    }

    #[test]
    fn can_convert_rule() {
        let config_rule = get_typical_config_rule();
        let converted_rule: RuleConfig = config_rule.try_into().unwrap();
        assert_eq!(converted_rule.dealer_soft17, DealerSoft17::Stand);
        assert_eq!(
            converted_rule.double_after_split,
            DoubleAfterSplit::NotAllowed
        );
        assert_eq!(converted_rule.surrender, SurrenderPolicy::Late);
        assert_eq!(converted_rule.number_of_decks, 2);
        assert_eq!(converted_rule.max_bet, Some(50));
        assert_eq!(converted_rule.custom_progression, vec![1, 2, 4]);
    }

    #[test]
    fn should_return_error_when_converting_rule() {
        let mut config_rule = get_typical_config_rule();
        config_rule.surrender = String::from("early");
        let convert_result: Result<RuleConfig, serde::de::value::Error> = config_rule.try_into();
        assert!(convert_result.is_err());
    }

    #[test]
    fn progression_text_keeps_positive_steps() {
        assert_eq!(parse_progression("1-3-2-6"), vec![1, 3, 2, 6]);
        assert_eq!(parse_progression(" 1, 2 ,4 "), vec![1, 2, 4]);
        assert_eq!(parse_progression("1,x,0,3"), vec![1, 3]);
        assert!(parse_progression("").is_empty());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = parse_config_str("rule:\n  number_of_decks: 8\n").unwrap();
        assert_eq!(config.rule.number_of_decks, 8);
        assert_eq!(config.rule.dealer_on_soft17, "h17");
        assert_eq!(config.shoe_simulator.shoes, 1);
        assert_eq!(config.trainer.reveal_delay_ms, 600);

        let rules = config.rules().unwrap();
        assert!(rules.dealer_hits_soft_17());
        assert!(rules.das_allowed());
        assert!(!rules.surrender_allowed());
        assert_eq!(rules.max_bet, None);
    }

    #[test]
    fn full_config_parses() {
        let yaml = "\
rule:
  dealer_on_soft17: s17
  double_after_split: das
  surrender: surrender
  number_of_decks: 1
  max_bet: 20
  custom_progression: '1-1-2-3'
shoe_simulator:
  shoes: 25
  seed: 9
trainer:
  reveal_delay_ms: 0
";
        let config = parse_config_str(yaml).unwrap();
        assert_eq!(config.shoe_simulator.shoes, 25);
        assert_eq!(config.shoe_simulator.seed, Some(9));
        assert_eq!(config.trainer.reveal_delay_ms, 0);
        let rules = config.rules().unwrap();
        assert_eq!(rules.custom_progression, vec![1, 1, 2, 3]);
        assert_eq!(rules.max_bet, Some(20));
    }

    #[test]
    fn invalid_rules_are_reported() {
        let config = parse_config_str("rule:\n  number_of_decks: 12\n").unwrap();
        assert!(matches!(
            config.rules(),
            Err(ConfigError::Rule(TrainerError::InvalidConfig(_)))
        ));

        let config = parse_config_str("rule:\n  dealer_on_soft17: maybe\n").unwrap();
        assert!(matches!(config.rules(), Err(ConfigError::RuleMode(_))));

        assert!(parse_config_str("rule: [1, 2").is_err());
    }
}
