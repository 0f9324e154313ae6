//! Configuration for graph construction and query behavior.
//!
//! Load order: `.city/config.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keyed_index::DEFAULT_BUCKETS;

const CITY_DIR: &str = ".city";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub index: IndexConfig,
    pub graph: GraphConfig,
    pub routing: RoutingConfig,
}

/// Keyed index sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Starting bucket count, rounded up to the next prime.
    pub initial_buckets: usize,
}

/// Graph shape and vertex classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Store one-way edges only (no mirror edge).
    pub directed: bool,
    /// Hard cap on vertex count. Unbounded when absent.
    pub max_vertices: Option<usize>,
    /// Id prefix that marks a vertex as a transit stop when its kind is not
    /// given explicitly.
    pub stop_prefix: String,
}

/// Shortest-path and nearest-query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub strategy: PathStrategy,
    /// Default number of results for k-nearest queries.
    pub nearest_limit: usize,
}

/// How Dijkstra selects the next vertex to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Linear scan over all unvisited vertices, O(V²).
    #[default]
    Dense,
    /// Binary heap frontier, O((V+E) log V).
    Heap,
}

impl std::str::FromStr for PathStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" => Ok(Self::Dense),
            "heap" => Ok(Self::Heap),
            other => Err(format!("unknown path strategy: {other}")),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            directed: false,
            max_vertices: None,
            stop_prefix: "stop_".to_string(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: PathStrategy::Dense,
            nearest_limit: 5,
        }
    }
}

/// Path to the config file for a given project root.
pub fn config_file(project_root: &Path) -> PathBuf {
    project_root.join(CITY_DIR).join(CONFIG_FILE)
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var) {
        match v.parse() {
            Ok(n) => *target = n,
            Err(_) => tracing::warn!(var, value = %v, "ignoring unparsable override"),
        }
    }
}

impl CityConfig {
    /// Load config from `.city/config.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = config_file(project_root);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override("CITY_INITIAL_BUCKETS", &mut config.index.initial_buckets);
        env_override("CITY_DIRECTED", &mut config.graph.directed);
        env_override("CITY_STOP_PREFIX", &mut config.graph.stop_prefix);
        env_override("CITY_PATH_STRATEGY", &mut config.routing.strategy);
        env_override("CITY_NEAREST_LIMIT", &mut config.routing.nearest_limit);
        if let Ok(v) = std::env::var("CITY_MAX_VERTICES") {
            match v.parse() {
                Ok(n) => config.graph.max_vertices = Some(n),
                Err(_) => tracing::warn!(value = %v, "ignoring unparsable CITY_MAX_VERTICES"),
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.initial_buckets < 2 {
            anyhow::bail!(
                "index.initial_buckets ({}) must be at least 2",
                self.index.initial_buckets
            );
        }
        if self.graph.max_vertices == Some(0) {
            anyhow::bail!("graph.max_vertices must be greater than 0 when set");
        }
        if self.graph.stop_prefix.is_empty() {
            anyhow::bail!("graph.stop_prefix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CityConfig::default();
        assert_eq!(config.index.initial_buckets, DEFAULT_BUCKETS);
        assert!(!config.graph.directed);
        assert_eq!(config.graph.max_vertices, None);
        assert_eq!(config.graph.stop_prefix, "stop_");
        assert_eq!(config.routing.strategy, PathStrategy::Dense);
        assert_eq!(config.routing.nearest_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
[graph]
directed = true
max_vertices = 500

[routing]
strategy = "heap"
"#;
        let config: CityConfig = toml::from_str(toml_str).unwrap();
        assert!(config.graph.directed);
        assert_eq!(config.graph.max_vertices, Some(500));
        assert_eq!(config.routing.strategy, PathStrategy::Heap);
        // Defaults for unspecified fields
        assert_eq!(config.graph.stop_prefix, "stop_");
        assert_eq!(config.index.initial_buckets, DEFAULT_BUCKETS);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = CityConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.graph.stop_prefix, "stop_");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".city");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[index]\ninitial_buckets = 1\n").unwrap();

        let err = CityConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("initial_buckets"));
    }

    #[test]
    fn test_load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".city");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[graph]\nstop_prefix = \"bus_\"\n\n[routing]\nnearest_limit = 3\n",
        )
        .unwrap();

        let config = CityConfig::load(tmp.path()).unwrap();
        assert_eq!(config.graph.stop_prefix, "bus_");
        assert_eq!(config.routing.nearest_limit, 3);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("HEAP".parse::<PathStrategy>(), Ok(PathStrategy::Heap));
        assert_eq!("dense".parse::<PathStrategy>(), Ok(PathStrategy::Dense));
        assert!("astar".parse::<PathStrategy>().is_err());
    }
}
