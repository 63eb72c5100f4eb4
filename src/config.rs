//! Loading service configuration (quiz sizes, scoring, storage and an
//! optional item bank) from TOML.
//!
//! Every section is optional; see `AppConfig` for the schema:
//!
//! ```toml
//! [quiz]
//! default_count = 20
//! max_count = 50
//!
//! [scoring]
//! word = 10
//! sentence = 15
//! streak = 5
//! accuracy = 2
//!
//! [mastery]
//! threshold_percent = 70
//!
//! [leaderboard]
//! max_page_size = 100
//!
//! [storage]
//! data_path = "data/users.json"
//!
//! [[sentences]]
//! id = 101
//! prompt = "我是学生。"
//! correct = "I am a student"
//! options = ["I am a student", "I am a teacher", "He is a student", "I am a doctor"]
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::QuizItem;
use crate::stats::{ScoreWeights, Scoring};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub quiz: QuizCfg,
  #[serde(default)]
  pub scoring: ScoreWeights,
  #[serde(default)]
  pub mastery: MasteryCfg,
  #[serde(default)]
  pub leaderboard: LeaderboardCfg,
  #[serde(default)]
  pub storage: StorageCfg,
  #[serde(default)]
  pub words: Vec<ItemCfg>,
  #[serde(default)]
  pub sentences: Vec<ItemCfg>,
}

impl AppConfig {
  pub fn scoring(&self) -> Scoring {
    Scoring { weights: self.scoring, mastery_threshold_percent: self.mastery.threshold_percent }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizCfg {
  /// Questions per quiz when the request does not say.
  pub default_count: usize,
  /// Upper bound on a requested count.
  pub max_count: usize,
}

impl Default for QuizCfg {
  fn default() -> Self {
    Self { default_count: 20, max_count: 50 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MasteryCfg {
  pub threshold_percent: u32,
}

impl Default for MasteryCfg {
  fn default() -> Self {
    Self { threshold_percent: 70 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LeaderboardCfg {
  pub max_page_size: usize,
}

impl Default for LeaderboardCfg {
  fn default() -> Self {
    Self { max_page_size: 100 }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct StorageCfg {
  /// JSON snapshot of all users; in-memory only when unset.
  pub data_path: Option<String>,
}

/// Bank entry accepted in TOML. Pinyin is derived from the prompt when omitted.
#[derive(Clone, Debug, Deserialize)]
pub struct ItemCfg {
  pub id: u32,
  pub prompt: String,
  #[serde(default)]
  pub pinyin: Option<String>,
  pub correct: String,
  pub options: Vec<String>,
}

impl ItemCfg {
  pub fn to_item(&self) -> QuizItem {
    QuizItem {
      id: self.id,
      prompt: self.prompt.clone(),
      pinyin: self.pinyin.clone().unwrap_or_default(),
      correct_text: self.correct.clone(),
      options: self.options.clone(),
    }
  }
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load `AppConfig` from QUIZ_CONFIG_PATH, falling back to defaults on any
/// IO/parse error. DATA_PATH overrides `[storage] data_path`.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "hsk_quiz", %path, words = cfg.words.len(), sentences = cfg.sentences.len(), "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "hsk_quiz", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "hsk_quiz", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };

  if let Ok(path) = std::env::var("DATA_PATH") {
    if !path.trim().is_empty() {
      cfg.storage.data_path = Some(path);
    }
  }
  cfg
}
