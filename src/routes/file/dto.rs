use rocket::{
    http::ContentType,
    response::{self, Responder},
    FromForm, Request, Response,
};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, io::Cursor};
use uuid::Uuid;

/// A client-supplied parent reference. Clients may send a uuid, the root
/// sentinel (`0`, `"0"`, `null` or nothing at all), or garbage; the variants
/// keep those cases apart so the controller can answer each one precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentRef {
    #[default]
    Root,
    Id(Uuid),
    Invalid,
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParentRefVisitor;

        impl<'de> Visitor<'de> for ParentRefVisitor {
            type Value = ParentRef;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a file id, the root sentinel 0 or null")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(if value == 0 {
                    ParentRef::Root
                } else {
                    ParentRef::Invalid
                })
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(if value == 0 {
                    ParentRef::Root
                } else {
                    ParentRef::Invalid
                })
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                if value == "0" {
                    return Ok(ParentRef::Root);
                }

                Ok(match Uuid::parse_str(value) {
                    Ok(id) => ParentRef::Id(id),
                    Err(_) => ParentRef::Invalid,
                })
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ParentRef::Root)
            }
        }

        deserializer.deserialize_any(ParentRefVisitor)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatingFile {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub parent_id: ParentRef,
    #[serde(default)]
    pub is_public: bool,
    pub data: Option<String>,
}

#[derive(FromForm)]
pub struct ListQuery<'r> {
    #[field(name = "parentId")]
    pub parent_id: Option<&'r str>,
    pub page: Option<u32>,
}

/// Raw file content with a content type inferred from the file name.
pub struct FileContent {
    pub content_type: ContentType,
    pub bytes: Vec<u8>,
}

impl<'r> Responder<'r, 'static> for FileContent {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(self.content_type)
            .sized_body(self.bytes.len(), Cursor::new(self.bytes))
            .ok()
    }
}
