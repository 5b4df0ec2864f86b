use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Acquire;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

use super::{GameRecord, GameSource, IngestError, Parsed, SkipReason, SourceTag};
use crate::database_ops::db::Db;
use crate::database_ops::games::{upsert_game, UpsertOutcome};

/// Where an import run draws its commit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// One transaction for the whole batch; each record runs in its own
    /// savepoint so a failing record is rolled back alone.
    PerRun,
    /// Every record commits on its own.
    PerRecord,
}

impl CommitPolicy {
    /// Policy each source has historically been imported with.
    pub fn default_for(tag: SourceTag) -> Self {
        match tag {
            SourceTag::Lis1 => CommitPolicy::PerRun,
            SourceTag::Lis2 => CommitPolicy::PerRecord,
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommitPolicy::PerRun => "per-run",
            CommitPolicy::PerRecord => "per-record",
        })
    }
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-run" | "run" => Ok(CommitPolicy::PerRun),
            "per-record" | "record" => Ok(CommitPolicy::PerRecord),
            other => Err(format!("unknown commit policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub source: SourceTag,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    /// One line per skipped element, in source order.
    pub warnings: Vec<String>,
}

impl ImportSummary {
    fn new(source: SourceTag) -> Self {
        Self {
            source,
            created: 0,
            updated: 0,
            skipped: 0,
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, reason: SkipReason) {
        // Importers print `warnings` to stderr; debug only here.
        debug!(source = %self.source, game_id = reason.game_id(), "{reason}");
        self.skipped += 1;
        self.warnings.push(reason.to_string());
    }

    fn count(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }

    /// Closing line printed by the importer for its source.
    pub fn report_line(&self) -> String {
        match self.source {
            SourceTag::Lis1 => format!(
                "Successfully imported {} new games, updated {} existing games, and skipped {} games.",
                self.created, self.updated, self.skipped
            ),
            SourceTag::Lis2 => format!(
                "Successfully imported {} new games and updated {} existing games",
                self.created, self.updated
            ),
        }
    }
}

/// Load `source` and upsert every record it yields.
///
/// Fatal source errors return before any write. Per-record problems (invalid
/// elements, failed upserts) are counted as skips and never abort the run.
pub async fn run_import<S>(
    db: &Db,
    source: &S,
    policy: CommitPolicy,
) -> Result<ImportSummary, IngestError>
where
    S: GameSource + ?Sized,
{
    let started = Instant::now();
    info!(source = %source.tag(), location = source.location(), %policy, "import started");
    let items = source.load().await?;
    let mut summary = ImportSummary::new(source.tag());

    match policy {
        CommitPolicy::PerRun => {
            let mut tx = db.pool.begin().await?;
            for item in items {
                let Some((id, record)) = accept(&mut summary, item) else {
                    continue;
                };
                let mut savepoint = (&mut *tx).begin().await?;
                match upsert_game(&mut savepoint, &id, &record, Utc::now()).await {
                    Ok(outcome) => {
                        savepoint.commit().await?;
                        summary.count(outcome);
                    }
                    Err(e) => {
                        savepoint.rollback().await?;
                        summary.skip(save_failed(id, e));
                    }
                }
            }
            tx.commit().await?;
        }
        CommitPolicy::PerRecord => {
            let mut conn = db.pool.acquire().await?;
            for item in items {
                let Some((id, record)) = accept(&mut summary, item) else {
                    continue;
                };
                match upsert_game(&mut conn, &id, &record, Utc::now()).await {
                    Ok(outcome) => summary.count(outcome),
                    Err(e) => summary.skip(save_failed(id, e)),
                }
            }
        }
    }

    info!(
        source = %summary.source,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "import finished"
    );
    Ok(summary)
}

fn accept(summary: &mut ImportSummary, item: Parsed) -> Option<(String, GameRecord)> {
    match item {
        Ok(record) => Some((record.composite_id(), record)),
        Err(reason) => {
            summary.skip(reason);
            None
        }
    }
}

fn save_failed(game_id: String, e: sqlx::Error) -> SkipReason {
    SkipReason::SaveFailed {
        game_id,
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::games::{count_games, get_game};
    use crate::ingestion::listado1::tests::game_xml;
    use crate::ingestion::listado2::{parse_body, tests::game_json};
    use crate::ingestion::{listado1, Listado1File};
    use async_trait::async_trait;
    use serde_json::json;

    /// In-memory stand-in for a source, fed with pre-parsed items.
    struct Fixed {
        tag: SourceTag,
        items: Vec<Parsed>,
    }

    #[async_trait]
    impl GameSource for Fixed {
        fn tag(&self) -> SourceTag {
            self.tag
        }

        fn location(&self) -> &str {
            "fixture"
        }

        async fn load(&self) -> Result<Vec<Parsed>, IngestError> {
            Ok(self.items.clone())
        }
    }

    fn xml_source(tag: SourceTag, doc: &str) -> Fixed {
        Fixed {
            tag,
            items: listado1::parse_document(doc).unwrap(),
        }
    }

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("listado1-{}.xml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn xml_run_counts_created_and_skipped() {
        let db = Db::in_memory().await.unwrap();
        let doc = format!(
            "<games>{}{}</games>",
            game_xml(Some("1"), &[], "2024-01-02"),
            game_xml(Some("2"), &["genre"], "2024-01-02"),
        );
        let path = write_temp(&doc);
        let summary = run_import(&db, &Listado1File::new(&path), CommitPolicy::PerRun)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((summary.created, summary.updated, summary.skipped), (1, 0, 1));
        assert_eq!(
            summary.warnings,
            vec!["Skipping game ID '2': Missing fields: genre".to_string()]
        );
        assert_eq!(
            summary.report_line(),
            "Successfully imported 1 new games, updated 0 existing games, and skipped 1 games."
        );
        assert!(get_game(&db, "LIS1-1").await.unwrap().is_some());
        assert!(get_game(&db, "LIS1-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reimporting_updates_instead_of_duplicating() {
        let db = Db::in_memory().await.unwrap();
        let doc = format!(
            "<games>{}{}</games>",
            game_xml(Some("1"), &[], "2024-01-02"),
            game_xml(Some("2"), &[], "2024-02-03"),
        );
        let first = run_import(&db, &xml_source(SourceTag::Lis1, &doc), CommitPolicy::PerRun)
            .await
            .unwrap();
        assert_eq!((first.created, first.updated), (2, 0));
        let second = run_import(&db, &xml_source(SourceTag::Lis1, &doc), CommitPolicy::PerRun)
            .await
            .unwrap();
        assert_eq!((second.created, second.updated), (0, 2));
        assert_eq!(count_games(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn same_local_id_from_both_sources_coexists() {
        let db = Db::in_memory().await.unwrap();
        let doc = format!("<games>{}</games>", game_xml(Some("42"), &[], "2024-01-02"));
        run_import(&db, &xml_source(SourceTag::Lis1, &doc), CommitPolicy::PerRun)
            .await
            .unwrap();
        let json_items = Fixed {
            tag: SourceTag::Lis2,
            items: parse_body(&json!([game_json(json!("42"), "Other")]).to_string()).unwrap(),
        };
        run_import(&db, &json_items, CommitPolicy::PerRecord)
            .await
            .unwrap();

        assert_eq!(count_games(&db).await.unwrap(), 2);
        assert_eq!(get_game(&db, "LIS1-42").await.unwrap().unwrap().source, "LIS1");
        assert_eq!(get_game(&db, "LIS2-42").await.unwrap().unwrap().title, "Other");
    }

    #[tokio::test]
    async fn json_run_skips_malformed_element() {
        let db = Db::in_memory().await.unwrap();
        let mut broken = game_json(json!("2"), "Broken");
        broken.as_object_mut().unwrap().remove("publisher");
        let body = json!([game_json(json!("1"), "A"), broken, game_json(json!("3"), "C")]);
        let source = Fixed {
            tag: SourceTag::Lis2,
            items: parse_body(&body.to_string()).unwrap(),
        };

        let summary = run_import(&db, &source, CommitPolicy::PerRecord)
            .await
            .unwrap();
        assert_eq!((summary.created, summary.updated, summary.skipped), (2, 0, 1));
        assert_eq!(
            summary.report_line(),
            "Successfully imported 2 new games and updated 0 existing games"
        );
        assert!(get_game(&db, "LIS2-2").await.unwrap().is_none());
        assert_eq!(count_games(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn fatal_source_error_writes_nothing() {
        let db = Db::in_memory().await.unwrap();
        let path = write_temp("<games><game><id>1</id></games>");
        let err = run_import(&db, &Listado1File::new(&path), CommitPolicy::PerRun)
            .await
            .unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, IngestError::ParseError { .. }));
        assert_eq!(count_games(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_upsert_is_skipped_without_losing_the_batch() {
        let db = Db::in_memory().await.unwrap();
        // Reject one title at the storage layer to force a per-record failure.
        sqlx::raw_sql(
            "CREATE TRIGGER reject_cursed BEFORE INSERT ON games \
             WHEN NEW.title = 'Cursed' BEGIN SELECT RAISE(ABORT, 'cursed title'); END;",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        let mut cursed: GameRecord = listado1::parse_document(&format!(
            "<games>{}</games>",
            game_xml(Some("2"), &[], "2024-01-02")
        ))
        .unwrap()
        .remove(0)
        .unwrap();
        cursed.title = "Cursed".into();

        for policy in [CommitPolicy::PerRun, CommitPolicy::PerRecord] {
            let doc = format!("<games>{}</games>", game_xml(Some("1"), &[], "2024-01-02"));
            let mut items = listado1::parse_document(&doc).unwrap();
            items.push(Ok(cursed.clone()));
            let source = Fixed {
                tag: SourceTag::Lis1,
                items,
            };
            let summary = run_import(&db, &source, policy).await.unwrap();
            assert_eq!(summary.skipped, 1, "{policy}");
            assert!(summary.warnings[0].starts_with("Error saving game ID 'LIS1-2'"));
        }
        assert_eq!(count_games(&db).await.unwrap(), 1);
    }

    #[test]
    fn commit_policy_parses_and_defaults() {
        assert_eq!("per-run".parse::<CommitPolicy>(), Ok(CommitPolicy::PerRun));
        assert_eq!("Per-Record".parse::<CommitPolicy>(), Ok(CommitPolicy::PerRecord));
        assert!("sometimes".parse::<CommitPolicy>().is_err());
        assert_eq!(CommitPolicy::default_for(SourceTag::Lis1), CommitPolicy::PerRun);
        assert_eq!(CommitPolicy::default_for(SourceTag::Lis2), CommitPolicy::PerRecord);
    }
}
