/// Background export of action history to disk
///
/// Each pass writes, per user, every action recorded since the user's
/// export cursor: a JSONL file of the raw records, a summary document,
/// and `latest.json` pointing at both. The cursor only moves once all
/// three are on disk, so a failed pass is retried in full next time.
use crate::config::ExporterSettings;
use crate::error::{Result, ServerError};
use chrono::{DateTime, SecondsFormat, Utc};
use curator_core::{ActionKind, ActionRecord, Repositories, UserId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportLine<'a> {
    id: i64,
    created_at: DateTime<Utc>,
    action: ActionKind,
    guard_blocked: bool,
    track_id: &'a str,
    track_uri: Option<&'a str>,
    track_name: &'a str,
    artist_name: &'a str,
    album_name: Option<&'a str>,
    source_playlist_id: Option<&'a str>,
    source_playlist_name: Option<&'a str>,
}

impl<'a> From<&'a ActionRecord> for ExportLine<'a> {
    fn from(record: &'a ActionRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            action: record.action,
            guard_blocked: record.guard_blocked,
            track_id: &record.track_id,
            track_uri: record.track_uri.as_deref(),
            track_name: &record.track_name,
            artist_name: &record.artist_name,
            album_name: record.album_name.as_deref(),
            source_playlist_id: record.source_playlist_id.as_deref(),
            source_playlist_name: record.source_playlist_name.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetEntry {
    playlist_id: String,
    playlist_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TesterRemoval {
    track_id: String,
    track_uri: Option<String>,
    last_action: ActionKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetInsertion {
    track_id: String,
    track_uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSummary {
    generated_at: String,
    user_id: UserId,
    from_song_action_id_exclusive: i64,
    to_song_action_id_inclusive: i64,
    exported_count: usize,
    tester_playlist_id: Option<String>,
    target_playlists: Vec<TargetEntry>,
    remove_from_tester: Vec<TesterRemoval>,
    ensure_in_targets: Vec<TargetInsertion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LatestExport<'a> {
    #[serde(flatten)]
    summary: &'a ExportSummary,
    actions_file: &'a str,
    summary_file: &'a str,
}

/// What one user's export pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBatch {
    pub from_exclusive: i64,
    pub to_inclusive: i64,
    pub exported: usize,
    pub actions_file: PathBuf,
    pub summary_file: PathBuf,
}

/// Latest action per track, ordered by action id
fn latest_per_track(actions: &[ActionRecord]) -> Vec<&ActionRecord> {
    let mut by_track: HashMap<&str, &ActionRecord> = HashMap::new();
    for action in actions {
        by_track
            .entry(action.track_id.as_str())
            .and_modify(|existing| {
                if action.id > existing.id {
                    *existing = action;
                }
            })
            .or_insert(action);
    }

    let mut latest: Vec<_> = by_track.into_values().collect();
    latest.sort_by_key(|a| a.id);
    latest
}

/// Filesystem-safe timestamp
fn file_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|e| ServerError::Internal(e.to_string()))?;
    bytes.push(b'\n');

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct ActionExporter {
    repos: Repositories,
    settings: ExporterSettings,
}

impl ActionExporter {
    pub fn new(repos: Repositories, settings: ExporterSettings) -> Self {
        Self { repos, settings }
    }

    /// Run a pass shortly after startup, then on the configured interval
    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(
            dir = %self.settings.dir.display(),
            interval_hours = self.settings.interval_hours,
            max_actions = self.settings.batch_limit(),
            "Action exporter enabled"
        );

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(self.settings.initial_delay_secs)).await;

            let mut ticker = tokio::time::interval(self.settings.interval());
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!("Action exporter pass failed: {}", e);
                }
            }
        })
    }

    /// Export every user once. A failure for one user does not stop the
    /// others; returns how many users had new records.
    pub async fn run_once(&self) -> Result<usize> {
        tokio::fs::create_dir_all(&self.settings.dir).await?;

        let mut exported = 0;
        for user in self.repos.users.get_all_users().await? {
            match self.export_user(user.id).await {
                Ok(Some(batch)) => {
                    exported += 1;
                    tracing::info!(
                        user_id = %user.id,
                        from = batch.from_exclusive,
                        to = batch.to_inclusive,
                        count = batch.exported,
                        "Exported actions"
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::error!(user_id = %user.id, "Export failed: {}", e),
            }
        }

        Ok(exported)
    }

    /// Export one user's new records, or `None` if there are none
    pub async fn export_user(&self, user_id: UserId) -> Result<Option<ExportBatch>> {
        let cursor = self.repos.export_cursors.get_export_cursor(user_id).await?;
        let actions = self
            .repos
            .actions
            .list_actions_since(user_id, cursor, self.settings.batch_limit())
            .await?;
        let Some(last) = actions.last() else {
            return Ok(None);
        };
        let to_id = last.id;

        let generated_at = Utc::now();
        let stamp = file_stamp(generated_at);
        let user_dir = self.settings.dir.join(format!("user-{user_id}"));
        tokio::fs::create_dir_all(&user_dir).await?;

        let actions_path = user_dir.join(format!("song-actions_{}-{to_id}_{stamp}.jsonl", cursor + 1));
        let summary_path = user_dir.join(format!("summary_{}-{to_id}_{stamp}.json", cursor + 1));

        let mut lines = String::new();
        for action in &actions {
            let line = serde_json::to_string(&ExportLine::from(action))
                .map_err(|e| ServerError::Internal(e.to_string()))?;
            lines.push_str(&line);
            lines.push('\n');
        }
        tokio::fs::write(&actions_path, lines).await?;

        let targets = self
            .repos
            .target_playlists
            .list_target_playlists(user_id)
            .await?;
        let latest = latest_per_track(&actions);

        let summary = ExportSummary {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            user_id,
            from_song_action_id_exclusive: cursor,
            to_song_action_id_inclusive: to_id,
            exported_count: actions.len(),
            tester_playlist_id: self.settings.tester_playlist_id.clone(),
            target_playlists: targets
                .into_iter()
                .map(|t| TargetEntry {
                    playlist_id: t.playlist_id,
                    playlist_name: t.playlist_name,
                })
                .collect(),
            remove_from_tester: latest
                .iter()
                .map(|a| TesterRemoval {
                    track_id: a.track_id.clone(),
                    track_uri: a.track_uri.clone(),
                    last_action: a.action,
                })
                .collect(),
            ensure_in_targets: latest
                .iter()
                .filter(|a| a.action == ActionKind::Like)
                .map(|a| TargetInsertion {
                    track_id: a.track_id.clone(),
                    track_uri: a.track_uri.clone(),
                })
                .collect(),
        };

        write_json_atomic(&summary_path, &summary).await?;

        let actions_file = file_name(&actions_path);
        let summary_file = file_name(&summary_path);
        write_json_atomic(
            &user_dir.join("latest.json"),
            &LatestExport {
                summary: &summary,
                actions_file: &actions_file,
                summary_file: &summary_file,
            },
        )
        .await?;

        self.repos
            .export_cursors
            .set_export_cursor(user_id, to_id)
            .await?;

        Ok(Some(ExportBatch {
            from_exclusive: cursor,
            to_inclusive: to_id,
            exported: actions.len(),
            actions_file: actions_path,
            summary_file: summary_path,
        }))
    }
}
