use crate::config::types::{Config, HarvesterConfig, OutputConfig, SourceConfig, TierConfig};
use crate::crawler::SelectorParser;
use crate::url::page_url;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_output_config(&config.output)?;
    validate_tiers(&config.tiers)?;

    if config.locations.path.is_empty() {
        return Err(ConfigError::Validation(
            "locations.path cannot be empty".to_string(),
        ));
    }

    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawl pacing limits
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.detail_concurrency < 1 || config.detail_concurrency > 50 {
        return Err(ConfigError::Validation(format!(
            "detail_concurrency must be between 1 and 50, got {}",
            config.detail_concurrency
        )));
    }

    if config.detail_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "detail_timeout_ms must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("database_path", &config.database_path),
        ("summary_path", &config.summary_path),
        ("stats_path", &config.stats_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates that each threshold set is ordered
fn validate_tiers(tiers: &TierConfig) -> Result<(), ConfigError> {
    for (name, set) in [("crawl", &tiers.crawl), ("report", &tiers.report)] {
        if set.high < set.medium {
            return Err(ConfigError::Validation(format!(
                "tiers.{}: high ({}) must be >= medium ({})",
                name, set.high, set.medium
            )));
        }
    }

    Ok(())
}

/// Validates source entries
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for source in sources {
        if source.name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }

        if source.page_size < 1 {
            return Err(ConfigError::Validation(format!(
                "source '{}': page_size must be >= 1",
                source.name
            )));
        }

        if source.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "source '{}': max_pages must be >= 1",
                source.name
            )));
        }

        validate_catalog_url(source)?;

        if source.selectors.tile.trim().is_empty() || source.selectors.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}': tile and name selectors are required",
                source.name
            )));
        }

        SelectorParser::from_config(&source.selectors).map_err(|e| {
            ConfigError::Validation(format!("source '{}': {}", source.name, e))
        })?;
    }

    Ok(())
}

/// Checks that the template paginates and renders to an http(s) URL
fn validate_catalog_url(source: &SourceConfig) -> Result<(), ConfigError> {
    let url = page_url(&source.catalog_url, source.first_page, source.page_size).map_err(|e| {
        ConfigError::InvalidUrl(format!("source '{}': {}", source.name, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "source '{}': catalog URL must use http or https, got '{}'",
            source.name,
            url.scheme()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{
        DetailLabels, HttpConfig, LocationsConfig, SelectorConfig,
    };
    use crate::inventory::SourceKind;
    use crate::reconcile::TierThresholds;

    fn source(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            kind: SourceKind::New,
            catalog_url: "https://dealer.example/new?page={page}".to_string(),
            page_size: 24,
            first_page: 0,
            max_pages: None,
            enrich: true,
            default_make: None,
            category_segment: None,
            selectors: SelectorConfig {
                tile: ".tile".to_string(),
                name: ".name".to_string(),
                ..SelectorConfig::default()
            },
            detail_labels: DetailLabels::default(),
        }
    }

    fn config(sources: Vec<SourceConfig>) -> Config {
        Config {
            harvester: HarvesterConfig::default(),
            http: HttpConfig::default(),
            output: OutputConfig {
                database_path: "inventory.db".to_string(),
                summary_path: "summary.md".to_string(),
                stats_path: "stats.json".to_string(),
            },
            locations: LocationsConfig {
                path: "locations.toml".to_string(),
            },
            tiers: TierConfig::default(),
            sources,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&config(vec![source("new"), source("used")])).is_ok());
    }

    #[test]
    fn test_requires_a_source() {
        assert!(validate(&config(vec![])).is_err());
    }

    #[test]
    fn test_rejects_duplicate_source_names() {
        let result = validate(&config(vec![source("new"), source("new")]));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let mut s = source("new");
        s.catalog_url = "https://dealer.example/new".to_string();
        assert!(matches!(
            validate(&config(vec![s])),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut s = source("new");
        s.catalog_url = "ftp://dealer.example/new?page={page}".to_string();
        assert!(matches!(
            validate(&config(vec![s])),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut s = source("new");
        s.page_size = 0;
        assert!(validate(&config(vec![s])).is_err());
    }

    #[test]
    fn test_rejects_missing_tile_selector() {
        let mut s = source("new");
        s.selectors.tile = "  ".to_string();
        assert!(validate(&config(vec![s])).is_err());
    }

    #[test]
    fn test_rejects_inverted_tiers() {
        let mut cfg = config(vec![source("new")]);
        cfg.tiers.report = TierThresholds { high: 10, medium: 20 };
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_concurrency() {
        let mut cfg = config(vec![source("new")]);
        cfg.harvester.detail_concurrency = 0;
        assert!(validate(&cfg).is_err());

        cfg.harvester.detail_concurrency = 51;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_invalid_selector() {
        let mut s = source("used");
        s.selectors.badges = Some(".badge[".to_string());
        let result = validate(&config(vec![source("new"), s]));
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("'used'")));
    }
}
