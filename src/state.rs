//! Application state: item pools, scoring, user store and per-learner quiz rounds.
//!
//! This module owns:
//!   - the word and sentence pools (config bank first, then built-in seeds)
//!   - the single `Scoring` value every stats computation uses
//!   - the user store (in-memory or JSON-backed)
//!   - one `QuizRound` per (user, item kind), kept until the learner's
//!     session ends

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_config_from_env, AppConfig, ItemCfg};
use crate::domain::{ItemKind, QuizItem};
use crate::error::StoreError;
use crate::pinyin::ensure_pinyin;
use crate::quiz::{locate_correct, QuizRound};
use crate::seeds::{seed_sentences, seed_words};
use crate::stats::Scoring;
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub scoring: Scoring,
    pub words: Arc<Vec<QuizItem>>,
    pub sentences: Arc<Vec<QuizItem>>,
    pub store: UserStore,
    pub rounds: Arc<RwLock<HashMap<(String, ItemKind), QuizRound>>>,
}

impl AppState {
    /// Build state from env: load config, merge pools, open the user store.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, StoreError> {
        let config = load_config_from_env();
        let store = match &config.storage.data_path {
            Some(path) => UserStore::open(path)?,
            None => {
                info!(target: "hsk_quiz", "No data path configured; user store is in-memory only.");
                UserStore::in_memory()
            }
        };
        Ok(Self::new(config, store))
    }

    pub fn new(config: AppConfig, store: UserStore) -> Self {
        let words = build_pool(ItemKind::Words, &config.words, seed_words());
        let sentences = build_pool(ItemKind::Sentences, &config.sentences, seed_sentences());
        let scoring = config.scoring();
        info!(
            target: "hsk_quiz",
            word = scoring.weights.word,
            sentence = scoring.weights.sentence,
            streak = scoring.weights.streak,
            accuracy = scoring.weights.accuracy,
            mastery_percent = scoring.mastery_threshold_percent,
            version = crate::stats::SCORING_VERSION,
            "Scoring configured"
        );

        Self {
            config,
            scoring,
            words: Arc::new(words),
            sentences: Arc::new(sentences),
            store,
            rounds: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn pool(&self, kind: ItemKind) -> &[QuizItem] {
        match kind {
            ItemKind::Words => &self.words,
            ItemKind::Sentences => &self.sentences,
        }
    }

    pub fn find_item(&self, kind: ItemKind, id: u32) -> Option<&QuizItem> {
        self.pool(kind).iter().find(|it| it.id == id)
    }

    /// Drop every quiz round of `user_id`: exclusion sets and any quiz
    /// awaiting submission. Returns how many rounds were dropped.
    pub async fn end_session(&self, user_id: &str) -> usize {
        let mut rounds = self.rounds.write().await;
        let before = rounds.len();
        rounds.retain(|(owner, _), _| owner != user_id);
        before - rounds.len()
    }
}

/// Config bank items first, then seeds whose id is not taken. Malformed items
/// are kept (quiz building reports them) but logged here.
fn build_pool(kind: ItemKind, bank: &[ItemCfg], seeds: Vec<QuizItem>) -> Vec<QuizItem> {
    let mut pool: Vec<QuizItem> = Vec::with_capacity(bank.len() + seeds.len());
    let mut ids: HashSet<u32> = HashSet::new();

    for cfg in bank {
        if !ids.insert(cfg.id) {
            warn!(target: "quiz", %kind, id = cfg.id, "Skipping bank item: duplicate id.");
            continue;
        }
        let mut item = cfg.to_item();
        ensure_pinyin(&mut item);
        pool.push(item);
    }
    let bank_count = pool.len();

    let mut seed_count = 0;
    for item in seeds {
        if ids.insert(item.id) {
            pool.push(item);
            seed_count += 1;
        }
    }

    let malformed = pool
        .iter()
        .filter(|it| locate_correct(it.id, &it.options, &it.correct_text).is_err())
        .count();
    if malformed > 0 {
        error!(target: "quiz", %kind, malformed, "Pool contains items whose answer is not among the options");
    }
    info!(target: "quiz", %kind, local_bank = bank_count, seed = seed_count, "Startup pool inventory");
    pool
}
