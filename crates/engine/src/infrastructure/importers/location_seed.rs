//! Location tree seeding from a nested JSON document.
//!
//! ```json
//! [{ "name": "USA", "children": [{ "name": "California", "children": [] }] }]
//! ```
//!
//! Levels follow nesting depth. A node may carry an explicit `type`, which
//! must agree with its depth. Seeding is idempotent: a node whose name
//! already exists under the same parent reuses the stored row.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use roomcraft_domain::{Location, LocationId, LocationLevel, LocationName};
use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::infrastructure::ports::{ClockPort, LocationRepo, RepoError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Seed file not found: {0}")]
    SeedFileNotFound(PathBuf),

    #[error("Invalid seed node '{name}': {reason}")]
    InvalidNode { name: String, reason: String },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedNode {
    pub name: String,
    #[serde(rename = "type", default)]
    pub level: Option<String>,
    #[serde(default)]
    pub children: Vec<SeedNode>,
}

/// Counts reported after a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub existing: usize,
}

pub struct LocationSeedImporter {
    repo: Arc<dyn LocationRepo>,
    clock: Arc<dyn ClockPort>,
}

impl LocationSeedImporter {
    pub fn new(repo: Arc<dyn LocationRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { repo, clock }
    }

    pub async fn import_file(&self, path: &Path) -> Result<SeedReport, ImportError> {
        if !fs::try_exists(path).await? {
            return Err(ImportError::SeedFileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).await?;
        let nodes: Vec<SeedNode> = serde_json::from_str(&content)?;
        let report = self.import(&nodes).await?;
        tracing::info!(
            path = %path.display(),
            created = report.created,
            existing = report.existing,
            "Location seed imported"
        );
        Ok(report)
    }

    /// Parents are always written before their children.
    pub async fn import(&self, roots: &[SeedNode]) -> Result<SeedReport, ImportError> {
        let mut report = SeedReport::default();
        let mut pending: Vec<(&SeedNode, LocationLevel, Option<LocationId>)> = roots
            .iter()
            .rev()
            .map(|node| (node, LocationLevel::Country, None))
            .collect();

        while let Some((node, level, parent_id)) = pending.pop() {
            let id = self.upsert(node, level, parent_id, &mut report).await?;

            if node.children.is_empty() {
                continue;
            }
            let Some(child_level) = level.child() else {
                return Err(ImportError::InvalidNode {
                    name: node.name.clone(),
                    reason: format!("a {} cannot have children", level),
                });
            };
            pending.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, child_level, Some(id))),
            );
        }

        Ok(report)
    }

    async fn upsert(
        &self,
        node: &SeedNode,
        level: LocationLevel,
        parent_id: Option<LocationId>,
        report: &mut SeedReport,
    ) -> Result<LocationId, ImportError> {
        let invalid = |reason: String| ImportError::InvalidNode {
            name: node.name.clone(),
            reason,
        };

        if let Some(declared) = &node.level {
            let declared: LocationLevel = declared.parse().map_err(|e| invalid(format!("{}", e)))?;
            if declared != level {
                return Err(invalid(format!(
                    "declared as {} but nested at {} depth",
                    declared, level
                )));
            }
        }
        let name = LocationName::new(node.name.as_str()).map_err(|e| invalid(e.to_string()))?;

        let siblings = self.repo.list_locations(level, parent_id).await?;
        if let Some(existing) = siblings
            .iter()
            .find(|l| l.parent_id == parent_id && l.name == name)
        {
            report.existing += 1;
            return Ok(existing.id);
        }

        let location = Location::new(name, level, parent_id, self.clock.now());
        self.repo.save_location(&location).await?;
        report.created += 1;
        Ok(location.id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::MockClockPort;
    use crate::test_fixtures::{fixed_now, InMemoryLocationRepo};

    fn parse(json: &str) -> Vec<SeedNode> {
        serde_json::from_str(json).expect("seed json")
    }

    fn importer(repo: Arc<InMemoryLocationRepo>) -> LocationSeedImporter {
        LocationSeedImporter::new(
            repo,
            Arc::new(FixedClock(Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"))),
        )
    }

    const SEED: &str = r#"[
        {"name": "USA", "children": [
            {"name": "California", "type": "state", "children": [
                {"name": "Los Angeles", "children": [{"name": "Downtown"}]}
            ]}
        ]},
        {"name": "Canada"}
    ]"#;

    #[tokio::test]
    async fn nesting_assigns_levels_and_parents() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let report = importer(repo.clone()).import(&parse(SEED)).await.expect("import");
        assert_eq!(report, SeedReport { created: 5, existing: 0 });

        let countries = repo
            .list_locations(LocationLevel::Country, None)
            .await
            .expect("list");
        let names: Vec<_> = countries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Canada", "USA"]);

        let usa = countries.iter().find(|l| l.name.as_str() == "USA").expect("usa");
        let states = repo
            .list_locations(LocationLevel::State, Some(usa.id))
            .await
            .expect("list");
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name.as_str(), "California");

        let localities = repo
            .list_locations(LocationLevel::Locality, None)
            .await
            .expect("list");
        assert_eq!(localities[0].name.as_str(), "Downtown");
    }

    #[tokio::test]
    async fn created_rows_are_stamped_from_the_clock() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let mut clock = MockClockPort::new();
        clock.expect_now().times(1).returning(fixed_now);

        let importer = LocationSeedImporter::new(repo.clone(), Arc::new(clock));
        importer
            .import(&parse(r#"[{"name": "Canada"}]"#))
            .await
            .expect("import");

        let countries = repo
            .list_locations(LocationLevel::Country, None)
            .await
            .expect("list");
        assert_eq!(countries[0].created_at, fixed_now());
        assert_eq!(countries[0].updated_at, fixed_now());
    }

    #[tokio::test]
    async fn reimport_reuses_existing_rows() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let importer = importer(repo.clone());
        importer.import(&parse(SEED)).await.expect("first");
        let report = importer.import(&parse(SEED)).await.expect("second");

        assert_eq!(report, SeedReport { created: 0, existing: 5 });
        assert_eq!(repo.len(), 5);
    }

    #[tokio::test]
    async fn declared_level_must_match_depth() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let nodes = parse(r#"[{"name": "USA", "children": [{"name": "LA", "type": "city"}]}]"#);
        let err = importer(repo).import(&nodes).await.expect_err("mismatch");
        assert!(matches!(err, ImportError::InvalidNode { ref name, .. } if name == "LA"));
    }

    #[tokio::test]
    async fn localities_cannot_nest() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let nodes = parse(
            r#"[{"name":"A","children":[{"name":"B","children":[{"name":"C","children":[
                {"name":"D","children":[{"name":"E"}]}]}]}]}]"#,
        );
        let err = importer(repo).import(&nodes).await.expect_err("too deep");
        assert!(matches!(err, ImportError::InvalidNode { ref name, .. } if name == "D"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let err = importer(repo)
            .import_file(&dir.path().join("absent.json"))
            .await
            .expect_err("missing");
        assert!(matches!(err, ImportError::SeedFileNotFound(_)));
    }

    #[tokio::test]
    async fn file_import_reads_json() {
        let repo = Arc::new(InMemoryLocationRepo::new());
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).expect("write");

        let report = importer(repo).import_file(&path).await.expect("import");
        assert_eq!(report.created, 5);
    }
}
