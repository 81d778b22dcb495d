use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::tracking::entities::{Goal, GoalId, TimeEntry};

const GOALS_FILE: &str = "goals.jsonl";
const ENTRIES_FILE: &str = "entries.jsonl";

/// Interface for abstracting persistence of goals and their time entries. Every write touches a
/// single document, nothing here is transactional across documents.
pub trait EntryStore {
    fn insert_goal(&self, goal: &Goal) -> impl Future<Output = Result<()>>;

    fn find_goals(&self) -> impl Future<Output = Result<Vec<Goal>>>;

    fn find_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<Option<Goal>>>;

    /// Returns whether a goal was actually removed.
    fn delete_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<bool>>;

    fn insert_entry(&self, entry: &TimeEntry) -> impl Future<Output = Result<()>>;

    /// All entries in insertion order.
    fn find_entries(&self) -> impl Future<Output = Result<Vec<TimeEntry>>>;

    fn find_entries_by_goal(
        &self,
        goal_id: &GoalId,
    ) -> impl Future<Output = Result<Vec<TimeEntry>>>;

    /// Returns the number of removed entries.
    fn delete_entries_by_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<usize>>;
}

impl<T: Deref> EntryStore for T
where
    T::Target: EntryStore,
{
    fn insert_goal(&self, goal: &Goal) -> impl Future<Output = Result<()>> {
        self.deref().insert_goal(goal)
    }

    fn find_goals(&self) -> impl Future<Output = Result<Vec<Goal>>> {
        self.deref().find_goals()
    }

    fn find_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<Option<Goal>>> {
        self.deref().find_goal(goal_id)
    }

    fn delete_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<bool>> {
        self.deref().delete_goal(goal_id)
    }

    fn insert_entry(&self, entry: &TimeEntry) -> impl Future<Output = Result<()>> {
        self.deref().insert_entry(entry)
    }

    fn find_entries(&self) -> impl Future<Output = Result<Vec<TimeEntry>>> {
        self.deref().find_entries()
    }

    fn find_entries_by_goal(
        &self,
        goal_id: &GoalId,
    ) -> impl Future<Output = Result<Vec<TimeEntry>>> {
        self.deref().find_entries_by_goal(goal_id)
    }

    fn delete_entries_by_goal(&self, goal_id: &GoalId) -> impl Future<Output = Result<usize>> {
        self.deref().delete_entries_by_goal(goal_id)
    }
}

/// The main realization of [EntryStore]. Goals and entries live in two JSON lines files inside
/// one directory.
pub struct JsonEntryStore {
    dir: PathBuf,
}

impl JsonEntryStore {
    /// Prepares the directory and makes sure both files can be opened for writing. Use
    /// [open_store](super::connection::open_store) to get retries.
    pub async fn open(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        for name in [GOALS_FILE, ENTRIES_FILE] {
            File::options()
                .create(true)
                .append(true)
                .open(dir.join(name))
                .await?;
        }
        debug!("Opened store at {dir:?}");
        Ok(Self { dir })
    }

    /// Releases the store. Nothing is kept open between operations, so this only marks the end of
    /// the store's lifetime.
    pub fn close(self) {
        debug!("Closed store at {:?}", self.dir);
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn goals_path(&self) -> PathBuf {
        self.dir.join(GOALS_FILE)
    }

    fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }
}

impl EntryStore for JsonEntryStore {
    async fn insert_goal(&self, goal: &Goal) -> Result<()> {
        append_document(&self.goals_path(), goal).await
    }

    async fn find_goals(&self) -> Result<Vec<Goal>> {
        read_documents(&self.goals_path()).await
    }

    async fn find_goal(&self, goal_id: &GoalId) -> Result<Option<Goal>> {
        let goals: Vec<Goal> = read_documents(&self.goals_path()).await?;
        Ok(goals.into_iter().find(|v| &v.id == goal_id))
    }

    async fn delete_goal(&self, goal_id: &GoalId) -> Result<bool> {
        let removed = retain_documents(&self.goals_path(), |v: &Goal| &v.id != goal_id).await?;
        Ok(removed > 0)
    }

    async fn insert_entry(&self, entry: &TimeEntry) -> Result<()> {
        append_document(&self.entries_path(), entry).await
    }

    async fn find_entries(&self) -> Result<Vec<TimeEntry>> {
        read_documents(&self.entries_path()).await
    }

    async fn find_entries_by_goal(&self, goal_id: &GoalId) -> Result<Vec<TimeEntry>> {
        let entries: Vec<TimeEntry> = read_documents(&self.entries_path()).await?;
        Ok(entries
            .into_iter()
            .filter(|v| &v.goal_id == goal_id)
            .collect())
    }

    async fn delete_entries_by_goal(&self, goal_id: &GoalId) -> Result<usize> {
        retain_documents(&self.entries_path(), |v: &TimeEntry| &v.goal_id != goal_id).await
    }
}

/// Trimmed content of a raw line, `None` for blank lines.
fn document_line(line: &[u8]) -> Option<&[u8]> {
    let line = line.trim_ascii();
    (!line.is_empty()).then_some(line)
}

/// Parses one line. Lines that aren't valid UTF-8 or valid json are logged and skipped, a write
/// cut off by a crash leaves such a line behind.
fn parse_document<T: DeserializeOwned>(path: &Path, line: &[u8]) -> Option<T> {
    match serde_json::from_slice::<T>(line) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                "During parsing in path {:?} found illegal json string {}:  {e}",
                path,
                String::from_utf8_lossy(line)
            );
            None
        }
    }
}

async fn read_documents<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    async fn extract<T: DeserializeOwned>(path: &Path) -> std::io::Result<Vec<T>> {
        debug!("Reading {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let mut reader = BufReader::new(file);
        let mut line = vec![];
        let mut documents = vec![];
        while reader.read_until(b'\n', &mut line).await? > 0 {
            if let Some(document) = document_line(&line).and_then(|v| parse_document(path, v)) {
                documents.push(document);
            }
            line.clear();
        }

        reader.into_inner().unlock_async().await?;

        Ok(documents)
    }

    match extract(path).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(e.into()),
    }
}

async fn append_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let mut buffer = serde_json::to_vec(document)?;
    buffer.push(b'\n');

    let mut file = File::options().create(true).append(true).open(path).await?;
    file.lock_exclusive()?;
    let result = async {
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok::<_, std::io::Error>(())
    }
    .await;
    file.unlock_async().await?;
    result?;
    Ok(())
}

/// Rewrites the file keeping only documents accepted by `keep`. Lines that can't be parsed are
/// kept byte for byte. Returns the number of removed documents.
async fn retain_documents<T: DeserializeOwned>(
    path: &Path,
    mut keep: impl FnMut(&T) -> bool,
) -> Result<usize> {
    let mut file = match File::options().read(true).write(true).open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    file.lock_exclusive()?;
    let result = async {
        let mut content = vec![];
        file.read_to_end(&mut content).await?;

        let mut removed = 0;
        let mut kept = Vec::with_capacity(content.len());
        for line in content.split(|v| *v == b'\n').filter_map(document_line) {
            match parse_document::<T>(path, line) {
                Some(document) if !keep(&document) => removed += 1,
                _ => {
                    kept.extend_from_slice(line);
                    kept.push(b'\n');
                }
            }
        }

        if removed > 0 {
            file.set_len(0).await?;
            file.rewind().await?;
            file.write_all(&kept).await?;
            file.flush().await?;
        }
        Ok::<_, anyhow::Error>(removed)
    }
    .await;
    file.unlock_async().await?;
    result
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::tracking::aggregation::test_data::{entry, goal, moment};

    use super::{EntryStore, JsonEntryStore, ENTRIES_FILE};

    #[tokio::test]
    async fn test_store_goals_basic() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;

        assert!(store.find_goals().await?.is_empty());

        store.insert_goal(&goal("g1", 10.)).await?;
        store.insert_goal(&goal("g2", 5.)).await?;

        assert_eq!(store.find_goals().await?, vec![goal("g1", 10.), goal("g2", 5.)]);
        assert_eq!(store.find_goal(&"g2".into()).await?, Some(goal("g2", 5.)));
        assert_eq!(store.find_goal(&"g3".into()).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_delete_goal() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;
        store.insert_goal(&goal("g1", 10.)).await?;
        store.insert_goal(&goal("g2", 5.)).await?;

        assert!(store.delete_goal(&"g1".into()).await?);
        assert!(!store.delete_goal(&"g1".into()).await?);
        assert_eq!(store.find_goals().await?, vec![goal("g2", 5.)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_entries_by_goal() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;
        let entries = [
            entry("g1", "2023-06-01", 2., moment(1, 18)),
            entry("g2", "2023-06-01", 1., moment(1, 19)),
            entry("g1", "2023-06-02", 1.5, moment(2, 18)),
        ];
        for v in &entries {
            store.insert_entry(v).await?;
        }

        assert_eq!(store.find_entries().await?, entries.to_vec());
        assert_eq!(
            store.find_entries_by_goal(&"g1".into()).await?,
            vec![entries[0].clone(), entries[2].clone()]
        );

        assert_eq!(store.delete_entries_by_goal(&"g1".into()).await?, 2);
        assert_eq!(store.find_entries().await?, vec![entries[1].clone()]);
        assert_eq!(store.delete_entries_by_goal(&"g1".into()).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_skips_corrupted_lines() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;
        store
            .insert_entry(&entry("g1", "2023-06-01", 2., moment(1, 18)))
            .await?;

        {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(dir.path().join(ENTRIES_FILE))?;
            file.write_all(b"{\"id\":\"broken\",\"goa\n")?;
        }

        let entries = store.find_entries().await?;
        assert_eq!(entries.len(), 1);

        store
            .insert_entry(&entry("g2", "2023-06-02", 1., moment(2, 18)))
            .await?;
        assert_eq!(store.find_entries().await?.len(), 2);

        // Deleting keeps lines it can't read.
        assert_eq!(store.delete_entries_by_goal(&"g1".into()).await?, 1);
        let content = std::fs::read_to_string(dir.path().join(ENTRIES_FILE))?;
        assert!(content.contains("broken"));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_skips_lines_with_invalid_utf8() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;
        let first = entry("g1", "2023-06-01", 2., moment(1, 18));
        store.insert_entry(&first).await?;
        {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(dir.path().join(ENTRIES_FILE))?;
            file.write_all(b"{\"id\":\"\xff\xfe\"}\n")?;
        }
        let second = entry("g2", "2023-06-02", 1., moment(2, 18));
        store.insert_entry(&second).await?;

        assert_eq!(
            store.find_entries().await?,
            vec![first.clone(), second.clone()]
        );
        assert_eq!(
            store.find_entries_by_goal(&"g2".into()).await?,
            vec![second.clone()]
        );

        assert_eq!(store.delete_entries_by_goal(&"g1".into()).await?, 1);
        assert_eq!(store.find_entries().await?, vec![second]);
        let content = std::fs::read(dir.path().join(ENTRIES_FILE))?;
        assert!(content.windows(2).any(|v| v == b"\xff\xfe"));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_missing_files_read_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonEntryStore::open(dir.path().to_owned()).await?;
        std::fs::remove_file(dir.path().join(ENTRIES_FILE))?;

        assert!(store.find_entries().await?.is_empty());
        assert_eq!(store.delete_entries_by_goal(&"g1".into()).await?, 0);
        store.close();
        Ok(())
    }
}
