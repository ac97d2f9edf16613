use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{json, to_value, Value};
use std::path::PathBuf;
use tagwise_core::{
    CorrectionBackend, CorrectionFilter, CorrectionId, CorrectionPatch, MatchType, NewCorrection,
};
use tagwise_learn::{parse_seed_toml, CorrectionStore};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Teach a pattern, creating a rule or reinforcing the existing one.
    Learn {
        pattern: String,
        #[arg(long, default_value = "contains")]
        match_type: MatchType,
        /// Repeat for several tags; order is kept.
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        entity_id: Option<String>,
        #[arg(long)]
        entity_name: Option<String>,
    },
    /// Show the rule that would categorize a description.
    Match {
        description: String,
        #[arg(long, default_value_t = 0.0)]
        min_confidence: f64,
    },
    Get {
        id: CorrectionId,
    },
    List {
        #[arg(long)]
        min_confidence: Option<f64>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Edit fields directly. Does not reinforce or prune.
    Update {
        id: CorrectionId,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
        #[arg(long, allow_negative_numbers = true)]
        confidence: Option<f64>,
        #[arg(long)]
        entity_id: Option<String>,
        #[arg(long)]
        entity_name: Option<String>,
        #[arg(long, conflicts_with_all = ["entity_id", "entity_name"])]
        clear_entity: bool,
    },
    /// Feedback on a suggestion: positive if accepted, negative if overridden.
    Adjust {
        id: CorrectionId,
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },
    Delete {
        id: CorrectionId,
    },
    /// Teach every `[[correction]]` in a TOML file.
    Seed {
        file: PathBuf,
    },
}

pub async fn run<B: CorrectionBackend>(
    store: &CorrectionStore<B>,
    command: Command,
) -> Result<Value> {
    let output = match command {
        Command::Learn {
            pattern,
            match_type,
            tags,
            entity_id,
            entity_name,
        } => {
            let input =
                NewCorrection::new(pattern, match_type, tags).with_entity(entity_id, entity_name);
            to_value(store.create_or_update(input).await?)?
        }
        Command::Match {
            description,
            min_confidence,
        } => to_value(store.find_match(&description, min_confidence).await?)?,
        Command::Get { id } => to_value(store.get(id).await?)?,
        Command::List {
            min_confidence,
            limit,
            offset,
        } => {
            let filter = CorrectionFilter {
                min_confidence,
                limit,
                offset,
            };
            to_value(store.list(filter).await?)?
        }
        Command::Update {
            id,
            tags,
            clear_tags,
            confidence,
            entity_id,
            entity_name,
            clear_entity,
        } => {
            let patch = CorrectionPatch {
                tags: if clear_tags {
                    Some(Vec::new())
                } else {
                    Some(tags).filter(|t| !t.is_empty())
                },
                confidence,
                entity_id: if clear_entity { Some(None) } else { entity_id.map(Some) },
                entity_name: if clear_entity { Some(None) } else { entity_name.map(Some) },
            };
            to_value(store.update(id, patch).await?)?
        }
        Command::Adjust { id, delta } => to_value(store.adjust_confidence(id, delta).await?)?,
        Command::Delete { id } => {
            store.delete(id).await?;
            json!({ "deleted": id })
        }
        Command::Seed { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading seed file {}", file.display()))?;
            let seeds = parse_seed_toml(&raw)
                .with_context(|| format!("parsing seed file {}", file.display()))?;
            to_value(store.seed(seeds).await?)?
        }
    };
    Ok(output)
}
