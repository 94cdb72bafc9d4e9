//! Command implementations
//!
//! Each command renders into a `String` before printing so the output can be
//! tested without capturing stdout.

use anyhow::Context;
use bddap_config::{CliArgs, Config, ConfigError, Settings};
use bddap_llm::{BackendSpec, Endpoint, resolve_backend_spec};
use bddap_spec::{Feature, FeatureCategory, SpecSource, Specification, find_feature};
use bddap_utils::error::BddapError;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Settings keys in display order
const SETTING_KEYS: &[&str] = &[
    "conversations_per_persona",
    "user_messages_per_simulated_conversation",
    "max_artifacts_after_dimensionality_reduction",
    "artifact_variability_generation",
    "max_concurrency",
    "call_timeout_secs",
];

#[derive(Debug, Serialize)]
struct ParsedFile {
    path: PathBuf,
    specification: Specification,
}

/// Parse every path (file or directory) into one entry per file.
fn parse_paths(paths: &[PathBuf]) -> Result<Vec<ParsedFile>, BddapError> {
    let mut parsed = Vec::new();
    for path in paths {
        for (file, result) in SpecSource::from_path(path).parse_each()? {
            parsed.push(ParsedFile {
                path: file,
                specification: result?,
            });
        }
    }
    debug!(files = parsed.len(), "Parsed specification paths");
    Ok(parsed)
}

pub fn parse(paths: &[PathBuf], json: bool) -> Result<(), BddapError> {
    let parsed = parse_paths(paths)?;
    let output = if json {
        serde_json::to_string_pretty(&parsed).context("serializing specifications")?
    } else {
        render_summary(&parsed)
    };
    println!("{output}");
    Ok(())
}

pub fn find(
    paths: &[PathBuf],
    name: &str,
    category: FeatureCategory,
    json: bool,
) -> Result<(), BddapError> {
    let specs: Vec<Specification> = parse_paths(paths)?
        .into_iter()
        .map(|p| p.specification)
        .collect();
    let feature = find_feature(&specs, name, category)?;

    let output = if json {
        serde_json::to_string_pretty(feature).context("serializing feature")?
    } else {
        render_feature(feature)
    };
    println!("{output}");
    Ok(())
}

pub fn config(cli_args: &CliArgs, json: bool) -> Result<(), BddapError> {
    let config = Config::discover(cli_args)?;
    let backend = resolve_backend_spec(&config.llm, |key| std::env::var(key).ok());

    let output = if json {
        render_config_json(&config, &backend).context("serializing configuration")?
    } else {
        render_config(&config, &backend)
    };
    println!("{output}");
    Ok(())
}

fn threshold_suffix(threshold: Option<f64>) -> String {
    threshold.map_or_else(String::new, |t| format!(" (threshold {t:.1})"))
}

fn render_feature(feature: &Feature) -> String {
    let mut out = format!("Feature: {} [{}]\n", feature.name, feature.category);
    if !feature.background.is_empty() {
        out.push_str(&format!("  Background: {}\n", feature.background));
    }
    for scenario in &feature.scenarios {
        out.push_str(&format!(
            "  Scenario: {}{}\n",
            scenario.description,
            threshold_suffix(scenario.threshold)
        ));
        for line in &scenario.content {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out.trim_end().to_string()
}

fn render_summary(parsed: &[ParsedFile]) -> String {
    if parsed.is_empty() {
        return "No .feature files found".to_string();
    }

    let mut out = String::new();
    for file in parsed {
        out.push_str(&format!("{}\n", file.path.display()));
        if file.specification.is_empty() {
            out.push_str("  (no features)\n");
        }
        for feature in &file.specification.features {
            out.push_str(&format!(
                "  {} [{}] - {} scenario(s)\n",
                feature.name,
                feature.category,
                feature.scenarios.len()
            ));
            for scenario in &feature.scenarios {
                out.push_str(&format!(
                    "    - {}{}\n",
                    scenario.description,
                    threshold_suffix(scenario.threshold)
                ));
            }
        }
    }
    out.trim_end().to_string()
}

fn setting_value(settings: &Settings, key: &str) -> String {
    match key {
        "conversations_per_persona" => settings.conversations_per_persona.to_string(),
        "user_messages_per_simulated_conversation" => {
            settings.user_messages_per_simulated_conversation.to_string()
        }
        "max_artifacts_after_dimensionality_reduction" => settings
            .max_artifacts_after_dimensionality_reduction
            .to_string(),
        "artifact_variability_generation" => settings.artifact_variability_generation.to_string(),
        "max_concurrency" => settings.max_concurrency.to_string(),
        "call_timeout_secs" => settings
            .call_timeout
            .map_or_else(|| "none".to_string(), |d| d.as_secs().to_string()),
        _ => String::new(),
    }
}

fn describe_endpoint(endpoint: &Endpoint) -> String {
    match endpoint {
        Endpoint::OpenAi { base_url } => format!("openai ({base_url})"),
        Endpoint::Azure {
            instance,
            deployment,
            api_version,
        } => format!(
            "azure-openai (instance {instance}, deployment {deployment}, api-version {api_version})"
        ),
    }
}

fn render_config(config: &Config, backend: &Result<BackendSpec, ConfigError>) -> String {
    let settings = config.settings();
    let mut out = String::from("[autoprompter]\n");
    for key in SETTING_KEYS {
        out.push_str(&format!(
            "  {key} = {}  ({})\n",
            setting_value(&settings, key),
            config.source_of(key)
        ));
    }

    out.push_str("\n[llm]\n");
    match backend {
        Ok(spec) => {
            out.push_str(&format!(
                "  provider = {}  ({})\n",
                describe_endpoint(&spec.endpoint),
                config.source_of("llm.provider")
            ));
            out.push_str(&format!(
                "  model = {}  ({})\n",
                spec.model,
                config.source_of("llm.model")
            ));
            out.push_str(&format!(
                "  variability = {}  ({})\n",
                spec.temperature,
                config.source_of("llm.variability")
            ));
        }
        Err(e) => out.push_str(&format!("  not configured: {e}\n")),
    }
    out.trim_end().to_string()
}

fn render_config_json(
    config: &Config,
    backend: &Result<BackendSpec, ConfigError>,
) -> Result<String, serde_json::Error> {
    let sources: serde_json::Map<String, serde_json::Value> = SETTING_KEYS
        .iter()
        .copied()
        .chain(["llm.provider", "llm.model", "llm.variability"])
        .map(|key| (key.to_string(), config.source_of(key).to_string().into()))
        .collect();

    let llm = match backend {
        Ok(spec) => serde_json::json!({
            "provider": describe_endpoint(&spec.endpoint),
            "model": spec.model,
            "variability": spec.temperature,
        }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };

    serde_json::to_string_pretty(&serde_json::json!({
        "settings": config.settings(),
        "llm": llm,
        "sources": sources,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bddap_config::ConfigSource;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_specs(dir: &Path) {
        fs::write(
            dir.join("poem.feature"),
            "Feature: Poem Generation [Artifact]\nScenario: rhymes (1/2)\nThen it rhymes\n",
        )
        .unwrap();
        fs::write(dir.join("chat.feature"), "Feature: Chat [Conversation]\n").unwrap();
    }

    #[test]
    fn test_parse_paths_directory_and_file() {
        let temp = TempDir::new().unwrap();
        write_specs(temp.path());

        let parsed = parse_paths(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].path.ends_with("chat.feature"));

        let parsed = parse_paths(&[temp.path().join("poem.feature")]).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_summary_lists_features_and_thresholds() {
        let temp = TempDir::new().unwrap();
        write_specs(temp.path());
        let summary = render_summary(&parse_paths(&[temp.path().to_path_buf()]).unwrap());

        assert!(summary.contains("Chat [Conversation] - 0 scenario(s)"));
        assert!(summary.contains("Poem Generation [Artifact] - 1 scenario(s)"));
        assert!(summary.contains("- rhymes (threshold 5.0)"));
    }

    #[test]
    fn test_summary_of_empty_directory() {
        let temp = TempDir::new().unwrap();
        let parsed = parse_paths(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(render_summary(&parsed), "No .feature files found");
    }

    #[test]
    fn test_render_feature_shows_background_scenarios_and_steps() {
        let spec = bddap_spec::parse_str(
            "Feature: Poem Chat [Conversation]\nBackground: chatting about poems\nScenario: stays on topic (7/10)\nGiven a subject\nThen the poem is about it\n",
        );
        let out = render_feature(&spec.features[0]);

        assert_eq!(
            out,
            "Feature: Poem Chat [Conversation]\n  Background: chatting about poems\n  Scenario: stays on topic (threshold 7.0)\n    Given a subject\n    Then the poem is about it"
        );
    }

    #[test]
    fn test_find_missing_feature_maps_to_exit_code() {
        let temp = TempDir::new().unwrap();
        write_specs(temp.path());
        let err = find(
            &[temp.path().to_path_buf()],
            "Poem Generation",
            FeatureCategory::Conversation,
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_exit_code().as_i32(), 5);
    }

    #[test]
    fn test_render_config_shows_sources() {
        let mut config = Config::builder().conversations_per_persona(3).build().unwrap();
        config
            .source_attribution
            .insert("max_concurrency".to_string(), ConfigSource::Cli);
        let backend = Err(ConfigError::MissingRequired("API key".to_string()));

        let out = render_config(&config, &backend);
        assert!(out.contains("conversations_per_persona = 3  (programmatic)"));
        assert!(out.contains("max_concurrency = 1  (cli)"));
        assert!(out.contains("call_timeout_secs = none  (default)"));
        assert!(out.contains("not configured"));
    }

    #[test]
    fn test_render_config_json() {
        let config = Config::default();
        let backend = Ok(BackendSpec {
            endpoint: Endpoint::OpenAi {
                base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            },
            api_key: "sk-never-printed".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            max_tokens: None,
        });

        let out = render_config_json(&config, &backend).unwrap();
        assert!(!out.contains("sk-never-printed"));
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["settings"]["conversations_per_persona"], 5);
        assert_eq!(json["llm"]["model"], "gpt-4o");
        assert_eq!(json["sources"]["llm.model"], "default");
    }
}
