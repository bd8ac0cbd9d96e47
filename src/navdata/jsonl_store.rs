use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{NavPoint, NavStore};
use crate::models::SchemeCode;

/// NAV cache backed by per-scheme yearly JSONL files under
/// `navs/{scheme_code}/{year}.jsonl`.
///
/// Files are append-only: puts add lines for dates not yet present and never
/// rewrite existing ones. Reads dedup per date keeping the earliest line, so
/// a cached NAV stays fixed even if a duplicate ever sneaks in.
pub struct JsonlNavStore {
    base_path: PathBuf,
}

impl JsonlNavStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn scheme_dir(&self, scheme: SchemeCode) -> PathBuf {
        self.base_path.join("navs").join(scheme.to_string())
    }

    fn year_file(&self, scheme: SchemeCode, year: i32) -> PathBuf {
        self.scheme_dir(scheme).join(format!("{year:04}.jsonl"))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_jsonl<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Vec<T>> {
        let file = match fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to open file"),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut items = Vec::new();

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            if line.trim().is_empty() {
                continue;
            }
            let item: T = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse JSONL line: {line}"))?;
            items.push(item);
        }

        Ok(items)
    }

    async fn append_jsonl<T: serde::Serialize>(&self, path: &Path, items: &[T]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        self.ensure_dir(path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .context("Failed to open file for append")?;

        for item in items {
            let line = serde_json::to_string(item).context("Failed to serialize item")?;
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }

        Ok(())
    }

    /// Year shards present for a scheme, ascending.
    async fn list_years(&self, scheme: SchemeCode) -> Result<Vec<i32>> {
        let dir = self.scheme_dir(scheme);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to read NAV directory"),
        };

        let mut years = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(year) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i32>().ok())
            {
                years.push(year);
            }
        }

        years.sort_unstable();
        Ok(years)
    }

    /// One year shard as a date-keyed map, first line per date winning.
    async fn read_year(
        &self,
        scheme: SchemeCode,
        year: i32,
    ) -> Result<BTreeMap<NaiveDate, NavPoint>> {
        let points: Vec<NavPoint> = self.read_jsonl(&self.year_file(scheme, year)).await?;
        let mut by_date = BTreeMap::new();
        for point in points {
            by_date.entry(point.date).or_insert(point);
        }
        Ok(by_date)
    }
}

#[async_trait::async_trait]
impl NavStore for JsonlNavStore {
    async fn get_nav(&self, scheme: SchemeCode, date: NaiveDate) -> Result<Option<NavPoint>> {
        let points = self.read_year(scheme, date.year()).await?;
        Ok(points.get(&date).cloned())
    }

    async fn nav_on_or_before(
        &self,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<Option<NavPoint>> {
        let mut years = self.list_years(scheme).await?;
        years.retain(|y| *y <= date.year());

        // Walk year shards backwards until one has a point at or before the
        // requested date.
        for year in years.into_iter().rev() {
            let points = self.read_year(scheme, year).await?;
            if let Some((_, point)) = points.range(..=date).next_back() {
                return Ok(Some(point.clone()));
            }
        }
        Ok(None)
    }

    async fn get_all(&self, scheme: SchemeCode) -> Result<Vec<NavPoint>> {
        let years = self.list_years(scheme).await?;
        let mut all = Vec::new();
        for year in years {
            let points = self.read_year(scheme, year).await?;
            all.extend(points.into_values());
        }
        Ok(all)
    }

    async fn put_navs(&self, points: &[NavPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let mut grouped: BTreeMap<(SchemeCode, i32), Vec<NavPoint>> = BTreeMap::new();
        for point in points {
            grouped
                .entry((point.scheme_code, point.date.year()))
                .or_default()
                .push(point.clone());
        }

        for ((scheme, year), mut items) in grouped {
            let existing = self.read_year(scheme, year).await?;

            // Keep the first occurrence per date within the batch, drop
            // dates already on disk.
            items.sort_by_key(|p| p.date);
            let mut fresh: Vec<NavPoint> = Vec::with_capacity(items.len());
            for item in items {
                if existing.contains_key(&item.date) {
                    continue;
                }
                if fresh.last().map(|p: &NavPoint| p.date) == Some(item.date) {
                    continue;
                }
                fresh.push(item);
            }

            self.append_jsonl(&self.year_file(scheme, year), &fresh)
                .await?;
        }

        Ok(())
    }

    async fn coverage(&self, scheme: SchemeCode) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let years = self.list_years(scheme).await?;

        let mut first = None;
        for year in &years {
            let points = self.read_year(scheme, *year).await?;
            if let Some((date, _)) = points.first_key_value() {
                first = Some(*date);
                break;
            }
        }

        let mut last = None;
        for year in years.iter().rev() {
            let points = self.read_year(scheme, *year).await?;
            if let Some((date, _)) = points.last_key_value() {
                last = Some(*date);
                break;
            }
        }

        Ok(first.zip(last))
    }
}
