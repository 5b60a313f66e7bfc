//! Music sheet records

use serde::{Deserialize, Serialize};

/// Maximum title length accepted by the store
pub const MAX_TITLE_LEN: usize = 255;

/// A music sheet as generated, persisted and broadcast
///
/// Serialized with PascalCase field names; this is the shape pushed to
/// WebSocket clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MusicSheet {
    /// Store-assigned identifier, `0` before persistence
    pub id: u64,
    pub title: String,
    pub composer: String,
    pub year: i32,
    /// Musical key, e.g. `"Dm"`
    pub key: String,
    pub genres: Vec<String>,
    pub instruments: Vec<String>,
    /// Location of the uploaded score
    pub music_file_url: String,
    /// Owning user
    pub user_id: u64,
}

/// A music sheet as returned by the REST endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub id: u64,
    pub title: String,
    pub composer: String,
    pub year: i32,
    pub key: String,
    pub genres: Vec<String>,
    pub instruments: Vec<String>,
    pub music_file_url: String,
    pub user_id: u64,
}

impl From<MusicSheet> for SheetSummary {
    fn from(sheet: MusicSheet) -> Self {
        Self {
            id: sheet.id,
            title: sheet.title,
            composer: sheet.composer,
            year: sheet.year,
            key: sheet.key,
            genres: sheet.genres,
            instruments: sheet.instruments,
            music_file_url: sheet.music_file_url,
            user_id: sheet.user_id,
        }
    }
}

/// Request body for creating or updating a sheet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInput {
    pub title: String,
    pub composer: String,
    pub year: i32,
    pub key: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub instruments: Vec<String>,
    /// Left unchanged on update when absent
    #[serde(default)]
    pub music_file_url: Option<String>,
    #[serde(default)]
    pub user_id: u64,
}

impl SheetInput {
    /// Build a new, not yet persisted sheet
    pub fn to_sheet(&self) -> MusicSheet {
        MusicSheet {
            id: 0,
            title: self.title.clone(),
            composer: self.composer.clone(),
            year: self.year,
            key: self.key.clone(),
            genres: self.genres.clone(),
            instruments: self.instruments.clone(),
            music_file_url: self.music_file_url.clone().unwrap_or_default(),
            user_id: self.user_id,
        }
    }

    /// Overwrite the editable fields of an existing sheet
    ///
    /// The owner never changes, and the file URL only when one is given.
    pub fn apply_to(&self, sheet: &mut MusicSheet) {
        sheet.title = self.title.clone();
        sheet.composer = self.composer.clone();
        sheet.year = self.year;
        sheet.key = self.key.clone();
        sheet.genres = self.genres.clone();
        sheet.instruments = self.instruments.clone();
        if let Some(url) = &self.music_file_url {
            sheet.music_file_url = url.clone();
        }
    }
}

/// Distinct genre and instrument names in use
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSet {
    pub genres: Vec<String>,
    pub instruments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> MusicSheet {
        MusicSheet {
            id: 7,
            title: "Nocturne".into(),
            composer: "Chopin".into(),
            year: 1830,
            key: "C".into(),
            genres: vec!["Classical".into()],
            instruments: vec!["Piano".into()],
            music_file_url: "string".into(),
            user_id: 1,
        }
    }

    #[test]
    fn test_broadcast_shape_is_pascal_case() {
        let json = serde_json::to_value(sheet()).unwrap();

        assert_eq!(json["Id"], 7);
        assert_eq!(json["MusicFileUrl"], "string");
        assert_eq!(json["Genres"][0], "Classical");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_input_update_keeps_owner_and_missing_url() {
        let input: SheetInput = serde_json::from_value(serde_json::json!({
            "title": "Etude",
            "composer": "Chopin",
            "year": 1833,
            "key": "Am",
            "genres": ["Romantic"],
            "userId": 99
        }))
        .unwrap();

        let mut stored = sheet();
        input.apply_to(&mut stored);

        assert_eq!(stored.title, "Etude");
        assert_eq!(stored.genres, vec!["Romantic"]);
        assert!(stored.instruments.is_empty());
        assert_eq!(stored.music_file_url, "string");
        assert_eq!(stored.user_id, 1);
        assert_eq!(input.to_sheet().user_id, 99);
    }

    #[test]
    fn test_summary_shape_is_camel_case() {
        let json = serde_json::to_value(SheetSummary::from(sheet())).unwrap();

        assert_eq!(json["musicFileUrl"], "string");
        assert_eq!(json["userId"], 1);
    }
}
