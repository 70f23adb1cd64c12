use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::{validate_clusters, ClusterSpec, ResolvedBot};
use crate::error::Result;
use crate::identity::generate_prefix;

/// Cluster list document: `{"clusters": [{"name": "..."}, ...]}`
#[derive(Debug, Deserialize)]
struct ClusterDocument {
    #[serde(default)]
    clusters: Vec<ClusterEntry>,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    name: String,
}

/// Load the dotenv bundle file, overriding variables already set in the process.
///
/// A missing or unreadable file is logged and ignored.
pub fn load_env_file(path: &Path) {
    match dotenvy::from_path_override(path) {
        Ok(()) => info!("📦 Loaded environment bundle from {}", path.display()),
        Err(e) => warn!(
            "⚠️  Could not load environment bundle {}: {}",
            path.display(),
            e
        ),
    }
}

/// Load clusters from `path`, resolving details from the process environment.
pub fn load_clusters_from_env(path: &Path) -> Result<Vec<ResolvedBot>> {
    load_clusters(path, |name| std::env::var(name).ok(), &mut rand::thread_rng())
}

/// Load and resolve the cluster list.
///
/// * Missing or malformed document: logged, returns an empty fleet.
/// * Missing, malformed or short details for one cluster: that cluster is skipped.
/// * Validation failure: the whole batch is rejected with
///   [`FleetError::InvalidConfig`](crate::FleetError::InvalidConfig).
///
/// `lookup` maps a cluster name to its JSON details bundle. One identity
/// prefix is drawn from `rng` and shared by every resolved bot.
pub fn load_clusters<F, R>(path: &Path, lookup: F, rng: &mut R) -> Result<Vec<ResolvedBot>>
where
    F: Fn(&str) -> Option<String>,
    R: Rng + ?Sized,
{
    info!("📋 Loading configuration from {}", path.display());

    let document = match read_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            error!("❌ Error loading JSON file {}: {}", path.display(), e);
            return Ok(Vec::new());
        }
    };

    let specs: Vec<ClusterSpec> = document
        .clusters
        .iter()
        .filter_map(|entry| resolve_entry(&entry.name, &lookup))
        .collect();

    let prefix = generate_prefix(rng);
    let bots: Vec<ResolvedBot> = specs.into_iter().map(|s| s.resolve(&prefix)).collect();

    validate_clusters(&bots)?;

    info!("✅ Loaded {} bots", bots.len());
    Ok(bots)
}

fn read_document(path: &Path) -> Result<ClusterDocument> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn resolve_entry<F>(name: &str, lookup: &F) -> Option<ClusterSpec>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        warn!("⚠️  Skipping cluster {}: no details in environment", name);
        return None;
    };

    let details: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            error!("❌ Error decoding JSON for {}, skipping: {}", name, e);
            return None;
        }
    };

    let spec = details
        .as_array()
        .and_then(|items| ClusterSpec::from_details(name, items));
    if spec.is_none() {
        warn!("⚠️  Skipping cluster {} due to missing details", name);
    }
    spec
}
