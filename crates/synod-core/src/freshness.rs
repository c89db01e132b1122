//! Knowledge freshness tracking
//!
//! Roles whose domain moves quickly carry `requires_freshness` in their
//! profile. Before dispatching to such a role, the tracker runs a best-effort
//! augmentation query, keeps only hits dated strictly after the last global
//! check, appends them to the role's persisted update record, and exposes the
//! fresh delta for prompt augmentation. No failure in this module is ever a
//! hard dependency of orchestration success.
//!
//! Persistence layout under the data directory:
//! - `knowledge/<role-id>.json`: append-only update record per role
//! - `knowledge/last_check`: RFC 3339 timestamp, whole-file overwrite
//!
//! Single-writer: there is no file locking. Two orchestration runs must not
//! share a data directory concurrently.

use crate::roles::{AgentRegistry, Role};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synod_search::SearchProvider;
use tracing::{debug, info, warn};

/// Maximum entries included in an augmented prompt
const MAX_PROMPT_ENTRIES: usize = 5;

/// One recorded knowledge update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Update title
    pub title: String,
    /// Source reference (URL)
    pub source: String,
    /// Publication date
    pub date: NaiveDate,
    /// Short summary
    pub summary: String,
}

/// Append-only per-role update record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeUpdateRecord {
    /// Role the record belongs to
    pub role: Role,
    /// Accumulated updates, oldest first
    pub entries: Vec<KnowledgeEntry>,
}

impl KnowledgeUpdateRecord {
    fn empty(role: Role) -> Self {
        Self {
            role,
            entries: Vec::new(),
        }
    }
}

/// Tracks whether each role's static knowledge needs augmentation
pub struct KnowledgeFreshnessTracker {
    registry: AgentRegistry,
    search: Option<Arc<dyn SearchProvider>>,
    data_dir: PathBuf,
}

impl KnowledgeFreshnessTracker {
    /// Create a tracker rooted at the given data directory
    #[must_use]
    pub fn new(registry: AgentRegistry, data_dir: impl AsRef<Path>) -> Self {
        Self {
            registry,
            search: None,
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Attach a search provider. Without one, every check is a no-op.
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    fn knowledge_dir(&self) -> PathBuf {
        self.data_dir.join("knowledge")
    }

    fn record_path(&self, role: Role) -> PathBuf {
        self.knowledge_dir().join(format!("{}.json", role.as_str()))
    }

    fn last_check_path(&self) -> PathBuf {
        self.knowledge_dir().join("last_check")
    }

    /// Load a role's update record, defaulting on missing or corrupt files
    #[must_use]
    pub fn load_record(&self, role: Role) -> KnowledgeUpdateRecord {
        let path = self.record_path(role);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return KnowledgeUpdateRecord::empty(role);
        };
        match serde_json::from_str::<KnowledgeUpdateRecord>(&content) {
            Ok(record) if record.role == role => record,
            _ => {
                warn!(role = %role, path = %path.display(), "unreadable update record, starting fresh");
                KnowledgeUpdateRecord::empty(role)
            }
        }
    }

    fn save_record(&self, record: &KnowledgeUpdateRecord) -> std::io::Result<()> {
        std::fs::create_dir_all(self.knowledge_dir())?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(self.record_path(record.role), json)
    }

    /// The persisted last-check timestamp, if any
    #[must_use]
    pub fn last_global_check(&self) -> Option<DateTime<Utc>> {
        let content = std::fs::read_to_string(self.last_check_path()).ok()?;
        DateTime::parse_from_rfc3339(content.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    fn save_last_check(&self, at: DateTime<Utc>) -> std::io::Result<()> {
        std::fs::create_dir_all(self.knowledge_dir())?;
        std::fs::write(self.last_check_path(), at.to_rfc3339())
    }

    /// Run a freshness check for one role and return the fresh delta.
    ///
    /// No-op for roles that do not require freshness and when no search
    /// provider is attached. Search and persistence failures are logged and
    /// swallowed: the caller proceeds with whatever cache exists.
    pub async fn check_for_updates(&self, role: Role) -> Vec<KnowledgeEntry> {
        let profile = self.registry.profile(role);
        if !profile.requires_freshness {
            return Vec::new();
        }
        let Some(search) = &self.search else {
            debug!(role = %role, "no search provider attached, skipping freshness check");
            return Vec::new();
        };

        // First run has no timestamp: the role's own cutoff bounds the window.
        let since = self
            .last_global_check()
            .map(|t| t.date_naive())
            .unwrap_or(profile.knowledge_cutoff);

        let hits = match search.search(profile.freshness_query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(role = %role, error = %e, "augmentation query failed, proceeding with cached knowledge");
                return Vec::new();
            }
        };

        let delta: Vec<KnowledgeEntry> = hits
            .into_iter()
            .filter_map(|hit| {
                let date = hit.date?;
                (date > since).then(|| KnowledgeEntry {
                    title: hit.title,
                    source: hit.url,
                    date,
                    summary: hit.snippet,
                })
            })
            .collect();

        if !delta.is_empty() {
            let mut record = self.load_record(role);
            record.entries.extend(delta.iter().cloned());
            if let Err(e) = self.save_record(&record) {
                warn!(role = %role, error = %e, "failed to persist update record");
            }
        }

        // Advance the window only after a successful search, so a failed run
        // re-queries the missed interval next time.
        if let Err(e) = self.save_last_check(Utc::now()) {
            warn!(error = %e, "failed to persist last-check timestamp");
        }

        info!(role = %role, fresh = delta.len(), since = %since, "freshness check complete");
        delta
    }

    /// Build the augmented role prompt: base prompt, at most the 5 most
    /// recent delta entries, and the knowledge-cutoff disclaimer.
    ///
    /// Roles without freshness tracking get the base prompt back unchanged.
    #[must_use]
    pub fn augmented_prompt(&self, role: Role, base_prompt: &str, recent: &[KnowledgeEntry]) -> String {
        let profile = self.registry.profile(role);
        if !profile.requires_freshness {
            return base_prompt.to_string();
        }

        let mut prompt = base_prompt.to_string();

        if !recent.is_empty() {
            let mut entries: Vec<&KnowledgeEntry> = recent.iter().collect();
            entries.sort_by_key(|e| std::cmp::Reverse(e.date));
            entries.truncate(MAX_PROMPT_ENTRIES);

            prompt.push_str("\n\n## Recent field updates\n");
            for entry in entries {
                prompt.push_str(&format!(
                    "- {} {} ({}): {}\n",
                    entry.date, entry.title, entry.source, entry.summary
                ));
            }
        }

        prompt.push_str(&format!(
            "\n\nYour built-in knowledge reflects a snapshot taken on {}. Developments \
             after that date may be missing or outdated; where the updates above \
             conflict with what you remember, trust the updates.",
            profile.knowledge_cutoff
        ));

        prompt
    }

    /// Start an orchestration run. The returned handle memoizes checks so
    /// each role is queried at most once per run.
    #[must_use]
    pub fn begin_run(&self) -> FreshnessRun<'_> {
        FreshnessRun {
            tracker: self,
            checked: HashMap::new(),
        }
    }
}

/// Per-run memoization handle for freshness checks
pub struct FreshnessRun<'a> {
    tracker: &'a KnowledgeFreshnessTracker,
    checked: HashMap<Role, Vec<KnowledgeEntry>>,
}

impl FreshnessRun<'_> {
    /// The fresh delta for a role, running the check on first request only
    pub async fn updates_for(&mut self, role: Role) -> &[KnowledgeEntry] {
        if !self.checked.contains_key(&role) {
            let delta = self.tracker.check_for_updates(role).await;
            self.checked.insert(role, delta);
        }
        self.checked.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSearch;
    use synod_search::SearchHit;
    use tempfile::TempDir;

    fn hit(title: &str, date: Option<NaiveDate>) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            date,
            snippet: format!("summary of {title}"),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(title: &str, date: NaiveDate) -> KnowledgeEntry {
        KnowledgeEntry {
            title: title.to_string(),
            source: format!("https://example.com/{title}"),
            date,
            summary: String::new(),
        }
    }

    #[test]
    fn test_record_round_trip_and_corrupt_default() {
        let dir = TempDir::new().unwrap();
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path());

        let record = KnowledgeUpdateRecord {
            role: Role::SecurityExpert,
            entries: vec![entry("cve-roundup", day(2026, 3, 1))],
        };
        tracker.save_record(&record).unwrap();

        let loaded = tracker.load_record(Role::SecurityExpert);
        assert_eq!(loaded.entries, record.entries);

        // Corrupt file falls back to empty
        std::fs::write(tracker.record_path(Role::SecurityExpert), "{not json").unwrap();
        assert!(tracker.load_record(Role::SecurityExpert).entries.is_empty());

        // Missing file falls back to empty
        assert!(tracker.load_record(Role::Researcher).entries.is_empty());
    }

    #[test]
    fn test_last_check_round_trip() {
        let dir = TempDir::new().unwrap();
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path());

        assert!(tracker.last_global_check().is_none());

        let now = Utc::now();
        tracker.save_last_check(now).unwrap();
        let loaded = tracker.last_global_check().unwrap();
        assert_eq!(loaded.timestamp(), now.timestamp());

        // Corrupt timestamp reads as absent
        std::fs::write(tracker.last_check_path(), "yesterday-ish").unwrap();
        assert!(tracker.last_global_check().is_none());
    }

    #[tokio::test]
    async fn test_check_skips_roles_without_freshness() {
        let dir = TempDir::new().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![]));
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path())
            .with_search(search.clone());

        let delta = tracker.check_for_updates(Role::CodeAnalyzer).await;
        assert!(delta.is_empty());
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_check_filters_strictly_after_last_check() {
        let dir = TempDir::new().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![
            hit("old-news", Some(day(2026, 1, 10))),
            hit("same-day", Some(day(2026, 2, 1))),
            hit("fresh-cve", Some(day(2026, 2, 5))),
            hit("undated", None),
        ])]));
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path())
            .with_search(search.clone());

        tracker
            .save_last_check(day(2026, 2, 1).and_hms_opt(9, 0, 0).unwrap().and_utc())
            .unwrap();

        let delta = tracker.check_for_updates(Role::SecurityExpert).await;
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].title, "fresh-cve");

        // Delta was appended to the persisted record
        let record = tracker.load_record(Role::SecurityExpert);
        assert_eq!(record.entries.len(), 1);

        // Timestamp advanced
        assert!(tracker.last_global_check().unwrap() > day(2026, 2, 1).and_hms_opt(9, 0, 0).unwrap().and_utc());
    }

    #[tokio::test]
    async fn test_first_run_filters_against_role_cutoff() {
        let dir = TempDir::new().unwrap();
        let registry = AgentRegistry::new();
        let cutoff = registry.profile(Role::Researcher).knowledge_cutoff;
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![
            hit("pre-cutoff", Some(cutoff - chrono::Days::new(10))),
            hit("post-cutoff", Some(cutoff + chrono::Days::new(10))),
        ])]));
        let tracker =
            KnowledgeFreshnessTracker::new(registry, dir.path()).with_search(search.clone());

        let delta = tracker.check_for_updates(Role::Researcher).await;
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].title, "post-cutoff");
    }

    #[tokio::test]
    async fn test_search_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![Err(
            synod_search::Error::Network("dns failure".to_string()),
        )]));
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path())
            .with_search(search.clone());

        let before = tracker.last_global_check();
        let delta = tracker.check_for_updates(Role::SecurityExpert).await;
        assert!(delta.is_empty());
        // Failed search must not advance the window
        assert_eq!(tracker.last_global_check(), before);
    }

    #[tokio::test]
    async fn test_stale_only_log_yields_no_updates_section() {
        // The role's record holds only entries dated before the last check;
        // the search returns nothing newer, so the delta is empty and the
        // augmented prompt omits the updates section entirely.
        let dir = TempDir::new().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![hit(
            "ancient-advisory",
            Some(day(2025, 6, 1)),
        )])]));
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path())
            .with_search(search.clone());

        let record = KnowledgeUpdateRecord {
            role: Role::SecurityExpert,
            entries: vec![entry("ancient-advisory", day(2025, 6, 1))],
        };
        tracker.save_record(&record).unwrap();
        tracker
            .save_last_check(day(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap().and_utc())
            .unwrap();

        let delta = tracker.check_for_updates(Role::SecurityExpert).await;
        assert!(delta.is_empty());

        let prompt = tracker.augmented_prompt(Role::SecurityExpert, "base", &delta);
        assert!(!prompt.contains("Recent field updates"));
        assert!(prompt.contains("snapshot taken on"));
    }

    #[test]
    fn test_augmented_prompt_caps_at_five_most_recent() {
        let dir = TempDir::new().unwrap();
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path());

        let recent: Vec<KnowledgeEntry> = (1..=8)
            .map(|d| entry(&format!("update-{d}"), day(2026, 3, d)))
            .collect();

        let prompt = tracker.augmented_prompt(Role::SecurityExpert, "base", &recent);
        assert!(prompt.contains("Recent field updates"));
        // The five most recent survive, the three oldest do not
        for d in 4..=8 {
            assert!(prompt.contains(&format!("update-{d}")), "missing update-{d}");
        }
        for d in 1..=3 {
            assert!(!prompt.contains(&format!("update-{d} ")), "update-{d} should be dropped");
        }
    }

    #[test]
    fn test_augmented_prompt_passthrough_for_static_roles() {
        let dir = TempDir::new().unwrap();
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path());
        let prompt = tracker.augmented_prompt(Role::CodeAnalyzer, "base prompt", &[]);
        assert_eq!(prompt, "base prompt");
    }

    #[tokio::test]
    async fn test_run_memoizes_per_role() {
        let dir = TempDir::new().unwrap();
        let search = Arc::new(ScriptedSearch::new(vec![Ok(vec![]), Ok(vec![])]));
        let tracker = KnowledgeFreshnessTracker::new(AgentRegistry::new(), dir.path())
            .with_search(search.clone());

        let mut run = tracker.begin_run();
        run.updates_for(Role::SecurityExpert).await;
        run.updates_for(Role::SecurityExpert).await;
        run.updates_for(Role::SecurityExpert).await;
        assert_eq!(search.calls(), 1);

        run.updates_for(Role::Researcher).await;
        assert_eq!(search.calls(), 2);

        // A new run checks again
        let mut second = tracker.begin_run();
        second.updates_for(Role::SecurityExpert).await;
        assert_eq!(search.calls(), 3);
    }
}
