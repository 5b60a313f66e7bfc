//! In-memory music sheet store
//!
//! Genres and instruments are kept as shared name tables: a sheet stores ids
//! into them, and persisting a sheet reuses an existing entry with the same
//! name instead of creating a duplicate.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tokio::sync::RwLock;

use super::model::{MusicSheet, SheetInput, TagSet, MAX_TITLE_LEN};
use super::query::{SheetQuery, SortField, SortOrder};
use crate::producer::{RecordStore, StoreError};

/// Name table with stable ids
#[derive(Debug, Default)]
struct NameTable {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl NameTable {
    /// Get the id for `name`, inserting it if unseen
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn name(&self, id: u32) -> &str {
        self.names.get(id as usize).map(String::as_str).unwrap_or("")
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// Stored row; genres and instruments reference the name tables
#[derive(Debug)]
struct SheetRow {
    title: String,
    composer: String,
    year: i32,
    key: String,
    genre_ids: Vec<u32>,
    instrument_ids: Vec<u32>,
    music_file_url: String,
    user_id: u64,
}

#[derive(Debug, Default)]
struct CatalogInner {
    next_id: u64,
    sheets: BTreeMap<u64, SheetRow>,
    genres: NameTable,
    instruments: NameTable,
}

impl CatalogInner {
    /// Build a stored row, reusing existing genre and instrument names
    fn intern_row(&mut self, sheet: &MusicSheet) -> SheetRow {
        SheetRow {
            title: sheet.title.clone(),
            composer: sheet.composer.clone(),
            year: sheet.year,
            key: sheet.key.clone(),
            genre_ids: sheet.genres.iter().map(|g| self.genres.intern(g)).collect(),
            instrument_ids: sheet
                .instruments
                .iter()
                .map(|i| self.instruments.intern(i))
                .collect(),
            music_file_url: sheet.music_file_url.clone(),
            user_id: sheet.user_id,
        }
    }

    fn materialize(&self, id: u64, row: &SheetRow) -> MusicSheet {
        MusicSheet {
            id,
            title: row.title.clone(),
            composer: row.composer.clone(),
            year: row.year,
            key: row.key.clone(),
            genres: row
                .genre_ids
                .iter()
                .map(|&g| self.genres.name(g).to_string())
                .collect(),
            instruments: row
                .instrument_ids
                .iter()
                .map(|&i| self.instruments.name(i).to_string())
                .collect(),
            music_file_url: row.music_file_url.clone(),
            user_id: row.user_id,
        }
    }

    fn matches(
        &self,
        row: &SheetRow,
        query: &SheetQuery,
        genre_ids: &[u32],
        instrument_ids: &[u32],
    ) -> bool {
        // Title and composer filters are alternatives, not both required
        if query.title.is_some() || query.composer.is_some() {
            let title_hit = query
                .title
                .as_deref()
                .is_some_and(|t| !t.is_empty() && row.title.contains(t));
            let composer_hit = query
                .composer
                .as_deref()
                .is_some_and(|c| !c.is_empty() && row.composer.contains(c));
            if !title_hit && !composer_hit {
                return false;
            }
        }

        if !query.genres.is_empty() && !row.genre_ids.iter().any(|g| genre_ids.contains(g)) {
            return false;
        }

        if !query.instruments.is_empty()
            && !row.instrument_ids.iter().any(|i| instrument_ids.contains(i))
        {
            return false;
        }

        true
    }
}

/// Thread-safe in-memory catalogue of music sheets
///
/// Uses a `RwLock` so listings run concurrently; writes from the producer and
/// reads from request handlers never block each other for long.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogInner>,
}

impl InMemoryCatalog {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a sheet, returning its assigned id
    ///
    /// The `id` field of the input is ignored.
    pub async fn insert(&self, sheet: &MusicSheet) -> Result<u64, StoreError> {
        validate(sheet)?;

        let mut inner = self.inner.write().await;

        let row = inner.intern_row(sheet);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.sheets.insert(id, row);

        tracing::debug!(
            sheet_id = id,
            genres = inner.genres.len(),
            instruments = inner.instruments.len(),
            "Music sheet stored"
        );

        Ok(id)
    }

    /// Replace the editable fields of a stored sheet
    ///
    /// The merged sheet is validated before anything is written.
    pub async fn update(&self, id: u64, input: &SheetInput) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let mut sheet = match inner.sheets.get(&id) {
            Some(row) => inner.materialize(id, row),
            None => return Err(StoreError::NotFound(id)),
        };
        input.apply_to(&mut sheet);
        validate(&sheet)?;

        let row = inner.intern_row(&sheet);
        inner.sheets.insert(id, row);

        tracing::debug!(sheet_id = id, "Music sheet updated");
        Ok(())
    }

    /// Delete a sheet, returning whether it existed
    pub async fn delete(&self, id: u64) -> bool {
        let removed = self.inner.write().await.sheets.remove(&id).is_some();
        if removed {
            tracing::debug!(sheet_id = id, "Music sheet deleted");
        }
        removed
    }

    /// Get a sheet by id
    pub async fn get(&self, id: u64) -> Option<MusicSheet> {
        let inner = self.inner.read().await;
        inner.sheets.get(&id).map(|row| inner.materialize(id, row))
    }

    /// Filter, sort and page the catalogue
    ///
    /// Returns the requested page and the number of sheets matching the
    /// filters across all pages.
    pub async fn list(&self, query: &SheetQuery) -> (Vec<MusicSheet>, usize) {
        let inner = self.inner.read().await;

        // Names never stored cannot match anything
        let genre_ids: Vec<u32> = query.genres.iter().filter_map(|g| inner.genres.id(g)).collect();
        let instrument_ids: Vec<u32> = query
            .instruments
            .iter()
            .filter_map(|i| inner.instruments.id(i))
            .collect();

        let mut matched: Vec<(u64, &SheetRow)> = inner
            .sheets
            .iter()
            .filter(|(_, row)| inner.matches(row, query, &genre_ids, &instrument_ids))
            .map(|(&id, row)| (id, row))
            .collect();

        matched.sort_by(|(a_id, a), (b_id, b)| {
            let ord = match query.sort {
                SortField::Title => a.title.cmp(&b.title),
                SortField::Composer => a.composer.cmp(&b.composer),
                SortField::Year => a.year.cmp(&b.year),
            };
            let ord = match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            // Stable paging across equal keys
            if ord == Ordering::Equal {
                a_id.cmp(b_id)
            } else {
                ord
            }
        });

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .map(|(id, row)| inner.materialize(id, row))
            .collect();

        (page, total)
    }

    /// Distinct genres and instruments used by any stored sheet, sorted
    pub async fn tags(&self) -> TagSet {
        let inner = self.inner.read().await;

        let mut genres = BTreeSet::new();
        let mut instruments = BTreeSet::new();
        for row in inner.sheets.values() {
            genres.extend(row.genre_ids.iter().map(|&g| inner.genres.name(g)));
            instruments.extend(row.instrument_ids.iter().map(|&i| inner.instruments.name(i)));
        }

        TagSet {
            genres: genres.into_iter().map(String::from).collect(),
            instruments: instruments.into_iter().map(String::from).collect(),
        }
    }

    /// Number of stored sheets
    pub async fn len(&self) -> usize {
        self.inner.read().await.sheets.len()
    }

    /// Whether no sheets are stored
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sheets.is_empty()
    }
}

impl RecordStore<MusicSheet> for InMemoryCatalog {
    async fn persist(&self, record: &MusicSheet) -> Result<(), StoreError> {
        self.insert(record).await.map(|_| ())
    }
}

fn validate(sheet: &MusicSheet) -> Result<(), StoreError> {
    if sheet.title.trim().is_empty() {
        return Err(StoreError::Invalid("title is required".into()));
    }
    if sheet.title.chars().count() > MAX_TITLE_LEN {
        return Err(StoreError::Invalid(format!(
            "title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    if sheet.composer.trim().is_empty() {
        return Err(StoreError::Invalid("composer is required".into()));
    }
    if sheet.key.trim().is_empty() {
        return Err(StoreError::Invalid("key is required".into()));
    }
    if sheet
        .genres
        .iter()
        .chain(sheet.instruments.iter())
        .any(|name| name.trim().is_empty())
    {
        return Err(StoreError::Invalid("tag names must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;

    fn sheet(title: &str, composer: &str, year: i32, genres: &[&str], instruments: &[&str]) -> MusicSheet {
        MusicSheet {
            id: 0,
            title: title.into(),
            composer: composer.into(),
            year,
            key: "C".into(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            instruments: instruments.iter().map(|s| s.to_string()).collect(),
            music_file_url: "string".into(),
            user_id: 0,
        }
    }

    async fn seeded() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert(&sheet("Clair de Lune", "Debussy", 1905, &["Classical"], &["Piano"]))
            .await
            .unwrap();
        catalog
            .insert(&sheet("Blue Rondo", "Brubeck", 1959, &["Jazz"], &["Piano", "Drums"]))
            .await
            .unwrap();
        catalog
            .insert(&sheet("Asturias", "Albeniz", 1892, &["Classical"], &["Guitar"]))
            .await
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let catalog = InMemoryCatalog::new();
        let id = assert_ok!(
            catalog
                .insert(&sheet("Gymnopedie", "Satie", 1888, &["Classical"], &["Piano"]))
                .await
        );

        let stored = catalog.get(id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "Gymnopedie");
        assert_eq!(stored.genres, vec!["Classical"]);
        assert!(catalog.get(id + 1).await.is_none());
    }

    fn input(title: &str, genres: &[&str]) -> SheetInput {
        SheetInput {
            title: title.into(),
            composer: "Debussy".into(),
            year: 1890,
            key: "Db".into(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            instruments: vec!["Piano".into()],
            music_file_url: None,
            user_id: 0,
        }
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_reuses_tags() {
        let catalog = seeded().await;

        catalog
            .update(1, &input("Reverie", &["Jazz", "Impressionist"]))
            .await
            .unwrap();

        let stored = catalog.get(1).await.unwrap();
        assert_eq!(stored.title, "Reverie");
        assert_eq!(stored.key, "Db");
        assert_eq!(stored.genres, vec!["Jazz", "Impressionist"]);
        assert_eq!(stored.music_file_url, "string");

        // "Jazz" and "Piano" already existed; only "Impressionist" is new
        let inner = catalog.inner.read().await;
        assert_eq!(inner.genres.len(), 3);
        assert_eq!(inner.instruments.len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_or_invalid() {
        let catalog = seeded().await;

        let result = catalog.update(42, &input("Reverie", &[])).await;
        assert_eq!(result, Err(StoreError::NotFound(42)));

        let result = catalog.update(1, &input("", &[])).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert_eq!(catalog.get(1).await.unwrap().title, "Clair de Lune");
    }

    #[tokio::test]
    async fn test_delete() {
        let catalog = seeded().await;

        assert!(catalog.delete(2).await);
        assert!(!catalog.delete(2).await);
        assert!(catalog.get(2).await.is_none());
        assert_eq!(catalog.len().await, 2);

        let tags = catalog.tags().await;
        assert!(!tags.genres.contains(&"Jazz".to_string()));
    }

    #[tokio::test]
    async fn test_tag_names_are_reused() {
        let catalog = seeded().await;

        let inner = catalog.inner.read().await;
        assert_eq!(inner.genres.len(), 2);
        assert_eq!(inner.instruments.len(), 3);
    }

    #[tokio::test]
    async fn test_persist_rejects_invalid() {
        let catalog = InMemoryCatalog::new();
        let long_title = "x".repeat(MAX_TITLE_LEN + 1);

        let result = catalog
            .persist(&sheet(&long_title, "Anon", 2000, &[], &[]))
            .await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));

        let result = catalog.persist(&sheet("Untitled", " ", 2000, &[], &[])).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert!(catalog.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_sort_and_page() {
        let catalog = seeded().await;

        let query = SheetQuery {
            sort: SortField::Year,
            order: SortOrder::Desc,
            limit: 2,
            ..Default::default()
        };
        let (page, total) = catalog.list(&query).await;
        assert_eq!(total, 3);
        assert_eq!(
            page.iter().map(|s| s.year).collect::<Vec<_>>(),
            vec![1959, 1905]
        );

        let query = SheetQuery {
            page: 2,
            ..query
        };
        let (page, _) = catalog.list(&query).await;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Asturias");
    }

    #[tokio::test]
    async fn test_list_title_or_composer_filter() {
        let catalog = seeded().await;

        let query = SheetQuery {
            title: Some("Rondo".into()),
            composer: Some("Debussy".into()),
            ..Default::default()
        };
        let (page, total) = catalog.list(&query).await;

        assert_eq!(total, 2);
        assert_eq!(page[0].title, "Blue Rondo");
        assert_eq!(page[1].title, "Clair de Lune");
    }

    #[tokio::test]
    async fn test_list_genre_and_instrument_filters() {
        let catalog = seeded().await;

        let query = SheetQuery {
            genres: vec!["Classical".into()],
            instruments: vec!["Guitar".into(), "Harp".into()],
            ..Default::default()
        };
        let (page, total) = catalog.list(&query).await;
        assert_eq!(total, 1);
        assert_eq!(page[0].composer, "Albeniz");

        let query = SheetQuery {
            genres: vec!["Polka".into()],
            ..Default::default()
        };
        let (_, total) = catalog.list(&query).await;
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_tags_are_distinct_and_sorted() {
        let catalog = seeded().await;

        let tags = catalog.tags().await;
        assert_eq!(tags.genres, vec!["Classical", "Jazz"]);
        assert_eq!(tags.instruments, vec!["Drums", "Guitar", "Piano"]);
    }
}
