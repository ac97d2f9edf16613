use serde::Deserialize;
use tagwise_core::NewCorrection;

#[derive(Deserialize)]
struct SeedFile {
    #[serde(default, rename = "correction")]
    corrections: Vec<NewCorrection>,
}

/// Parses a list of corrections to teach, written as a `[[correction]]`
/// array of tables:
///
/// ```toml
/// [[correction]]
/// pattern = "WOOLWORTHS"
/// match_type = "contains"
/// tags = ["Groceries"]
/// ```
pub fn parse_seed_toml(content: &str) -> Result<Vec<NewCorrection>, toml::de::Error> {
    let file: SeedFile = toml::from_str(content)?;
    Ok(file.corrections)
}
