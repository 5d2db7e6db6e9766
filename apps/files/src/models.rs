use std::collections::HashMap;

use serde::{ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, DisplayFromStr, PickFirst, SerializeAs};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// A stored course file as tracked by the entity store.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default, alias = "wrapper_type")]
    pub file_type: String,
    #[serde_as(as = "StudioDate")]
    #[serde(default)]
    pub date_added: Option<OffsetDateTime>,
    #[serde(default, alias = "locked")]
    pub lock_status: bool,
    #[serde(default, alias = "url")]
    pub external_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portable_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_locations: Option<Vec<UsageLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_status: Option<ActiveStatus>,
}

impl AssetRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            file_type: String::new(),
            date_added: None,
            lock_status: false,
            external_url: String::new(),
            portable_url: None,
            thumbnail: None,
            content_type: None,
            file_size: None,
            usage_locations: None,
            active_status: None,
        }
    }

    pub fn usage_count(&self) -> Option<usize> {
        self.usage_locations.as_ref().map(Vec::len)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStatus {
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn from_locations(locations: &[UsageLocation]) -> Self {
        if locations.is_empty() {
            Self::Inactive
        } else {
            Self::Active
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A place in the course outline that references an asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLocation {
    #[serde(alias = "displayLocation")]
    pub display_location: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetPage {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default, alias = "totalCount", alias = "total_count")]
    pub total_count: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetNamesPayload {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedAssetPayload {
    pub asset: AssetRecord,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsagePathsPayload {
    #[serde(default, alias = "usageLocations")]
    pub usage_locations: HashMap<String, Vec<UsageLocation>>,
}

/// Dates arrive either as RFC 3339 or in Studio's display form
/// (`Mar 01, 2024 at 10:15 UTC`). Anything else reads as missing so one odd
/// row cannot fail a page. Always written back as RFC 3339.
pub struct StudioDate;

impl<'de> DeserializeAs<'de, Option<OffsetDateTime>> for StudioDate {
    fn deserialize_as<D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(serde_json::Value::as_str).and_then(parse_studio_date))
    }
}

impl SerializeAs<Option<OffsetDateTime>> for StudioDate {
    fn serialize_as<S>(source: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match source {
            Some(value) => {
                let text = value.format(&Rfc3339).map_err(S::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }
}

pub(crate) fn parse_studio_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339).ok().or_else(|| {
        let display = format_description!("[month repr:short] [day], [year] at [hour]:[minute] UTC");
        PrimitiveDateTime::parse(raw, display)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

/// A local file the user picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

}

/// Fills in the presentation fields the server leaves blank or relative.
pub fn normalize_asset(mut asset: AssetRecord, studio_base_url: &str) -> AssetRecord {
    if asset.file_type.trim().is_empty() {
        asset.file_type =
            file_type_for(asset.content_type.as_deref(), &asset.display_name).to_string();
    } else {
        asset.file_type = asset.file_type.trim().to_lowercase();
    }

    if asset
        .thumbnail
        .as_deref()
        .map(|thumb| thumb.trim().is_empty())
        .unwrap_or(false)
    {
        asset.thumbnail = None;
    }

    if asset.external_url.starts_with('/') {
        asset.external_url = format!(
            "{}{}",
            studio_base_url.trim_end_matches('/'),
            asset.external_url
        );
    }

    asset
}

pub(crate) fn file_type_for(content_type: Option<&str>, display_name: &str) -> &'static str {
    let mime = content_type.unwrap_or_default().to_lowercase();
    let (top, sub) = mime.split_once('/').unwrap_or((mime.as_str(), ""));

    match top {
        "image" => return "image",
        "video" => return "video",
        "audio" => return "audio",
        _ => {}
    }

    match sub {
        "pdf" | "msword" | "plain" | "csv" | "rtf" => return "document",
        s if s.starts_with("vnd.openxmlformats") || s.starts_with("vnd.ms-") => {
            return "document"
        }
        "html" | "css" | "javascript" | "x-javascript" | "json" | "xml" | "x-python" => {
            return "code"
        }
        _ => {}
    }

    let extension = display_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => "image",
        "mp4" | "mov" | "webm" => "video",
        "mp3" | "wav" | "ogg" => "audio",
        "pdf" | "doc" | "docx" | "txt" | "csv" | "ppt" | "pptx" | "xls" | "xlsx" => "document",
        "html" | "css" | "js" | "json" | "xml" | "py" => "code",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn deserializes_server_payload_aliases() {
        let payload = json!({
            "id": "asset-v1:org+course+run+type@asset+block@notes.pdf",
            "display_name": "notes.pdf",
            "date_added": "2024-03-01T10:15:00Z",
            "locked": true,
            "url": "/asset-v1:org+course+run+type@asset+block@notes.pdf",
            "content_type": "application/pdf",
            "file_size": "2048",
            "thumbnail": ""
        });

        let record: AssetRecord = serde_json::from_value(payload).expect("valid record");
        assert!(record.lock_status);
        assert_eq!(record.file_size, Some(2048));
        assert!(record.date_added.is_some());
        assert_eq!(record.usage_count(), None);
    }

    #[test]
    fn page_tolerates_mixed_date_formats() {
        let payload = json!({
            "assets": [
                { "id": "a", "display_name": "a.pdf", "date_added": "2024-03-01T10:15:00Z" },
                { "id": "b", "display_name": "b.pdf", "date_added": "Mar 01, 2024 at 10:15 UTC" },
                { "id": "c", "display_name": "c.pdf", "date_added": "sometime last week" },
                { "id": "d", "display_name": "d.pdf", "date_added": null }
            ],
            "totalCount": 4
        });

        let page: AssetPage = serde_json::from_value(payload).expect("page decodes");
        let dates: Vec<_> = page.assets.iter().map(|asset| asset.date_added).collect();
        assert_eq!(
            dates,
            [
                Some(datetime!(2024-03-01 10:15 UTC)),
                Some(datetime!(2024-03-01 10:15 UTC)),
                None,
                None
            ]
        );
    }

    #[test]
    fn dates_serialize_as_rfc3339() {
        let mut record = AssetRecord::new("a", "a.pdf");
        record.date_added = parse_studio_date("Dec 24, 2023 at 08:05 UTC");
        let value = serde_json::to_value(&record).expect("serializes");
        assert_eq!(value["date_added"], "2023-12-24T08:05:00Z");
    }

    #[test]
    fn normalize_fills_type_thumbnail_and_url() {
        let mut record = AssetRecord::new("a1", "diagram.PNG");
        record.thumbnail = Some("  ".into());
        record.external_url = "/static/diagram.PNG".into();

        let record = normalize_asset(record, "https://studio.example.com/");
        assert_eq!(record.file_type, "image");
        assert_eq!(record.thumbnail, None);
        assert_eq!(
            record.external_url,
            "https://studio.example.com/static/diagram.PNG"
        );
    }

    #[test]
    fn content_type_beats_extension() {
        assert_eq!(file_type_for(Some("text/html"), "page.txt"), "code");
        assert_eq!(file_type_for(Some("application/pdf"), "notes"), "document");
        assert_eq!(file_type_for(None, "archive.tar"), "other");
    }

    #[test]
    fn usage_payload_accepts_camel_case() {
        let payload = json!({
            "usageLocations": {
                "a1": [{ "displayLocation": "Unit 1", "url": "/unit/1" }]
            }
        });
        let parsed: UsagePathsPayload = serde_json::from_value(payload).expect("valid payload");
        assert_eq!(parsed.usage_locations["a1"].len(), 1);
        assert_eq!(
            ActiveStatus::from_locations(&parsed.usage_locations["a1"]),
            ActiveStatus::Active
        );
    }
}
