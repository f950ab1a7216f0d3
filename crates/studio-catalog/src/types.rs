//! Catalog entry types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use studio_core::{Color, StudioError};

/// Serde adapter storing a `Color` as `#rrggbb`
pub(crate) mod hex_color {
    use super::*;

    pub fn serialize<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&color.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
        let raw = String::deserialize(d)?;
        Color::from_hex_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// The five ways a backdrop can dress the stage
#[derive(Debug, Clone, PartialEq)]
pub enum BackdropKind {
    /// Flat background color; also tints the floor
    Color(Color),
    /// Equirectangular raster image used as background and environment
    StaticImage(String),
    /// Equirectangular HDR or EXR panorama
    HdrEnvironment(String),
    /// Muted looping video streamed into a live texture
    LoopingVideo(String),
    /// Secondary glTF scene placed around the subject
    Environment3D(String),
}

impl BackdropKind {
    pub fn tag(&self) -> BackdropKindTag {
        match self {
            BackdropKind::Color(_) => BackdropKindTag::Color,
            BackdropKind::StaticImage(_) => BackdropKindTag::Image,
            BackdropKind::HdrEnvironment(_) => BackdropKindTag::Hdr,
            BackdropKind::LoopingVideo(_) => BackdropKindTag::Video,
            BackdropKind::Environment3D(_) => BackdropKindTag::Environment3D,
        }
    }

    /// Source URL or path for asset-backed kinds
    pub fn source(&self) -> Option<&str> {
        match self {
            BackdropKind::Color(_) => None,
            BackdropKind::StaticImage(url)
            | BackdropKind::HdrEnvironment(url)
            | BackdropKind::LoopingVideo(url)
            | BackdropKind::Environment3D(url) => Some(url),
        }
    }

    fn from_parts(tag: BackdropKindTag, value: String) -> Result<Self, StudioError> {
        Ok(match tag {
            BackdropKindTag::Color => BackdropKind::Color(Color::from_hex_str(&value)?),
            BackdropKindTag::Image => BackdropKind::StaticImage(value),
            BackdropKindTag::Hdr => BackdropKind::HdrEnvironment(value),
            BackdropKindTag::Video => BackdropKind::LoopingVideo(value),
            BackdropKindTag::Environment3D => BackdropKind::Environment3D(value),
        })
    }

    fn value_string(&self) -> String {
        match self {
            BackdropKind::Color(c) => c.to_string(),
            other => other.source().unwrap_or_default().to_string(),
        }
    }
}

/// Payload-free discriminant of `BackdropKind`, as written in catalog tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackdropKindTag {
    #[serde(rename = "color")]
    Color,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "hdr")]
    Hdr,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "3d")]
    Environment3D,
}

impl fmt::Display for BackdropKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackdropKindTag::Color => "color",
            BackdropKindTag::Image => "image",
            BackdropKindTag::Hdr => "hdr",
            BackdropKindTag::Video => "video",
            BackdropKindTag::Environment3D => "3d",
        })
    }
}

/// A stage backdrop, predefined or user-imported
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BackdropRecord", into = "BackdropRecord")]
pub struct Backdrop {
    pub id: String,
    pub name: String,
    pub kind: BackdropKind,
    pub thumbnail: String,
}

/// Backdrops are identified by id
impl PartialEq for Backdrop {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Flat table row form of a backdrop
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackdropRecord {
    id: String,
    name: String,
    kind: BackdropKindTag,
    value: String,
    thumbnail: String,
}

impl TryFrom<BackdropRecord> for Backdrop {
    type Error = StudioError;

    fn try_from(r: BackdropRecord) -> Result<Self, Self::Error> {
        Ok(Backdrop {
            kind: BackdropKind::from_parts(r.kind, r.value).map_err(|e| {
                StudioError::CatalogError(format!("backdrop '{}': {}", r.id, e))
            })?,
            id: r.id,
            name: r.name,
            thumbnail: r.thumbnail,
        })
    }
}

impl From<Backdrop> for BackdropRecord {
    fn from(b: Backdrop) -> Self {
        BackdropRecord {
            kind: b.kind.tag(),
            value: b.kind.value_string(),
            id: b.id,
            name: b.name,
            thumbnail: b.thumbnail,
        }
    }
}

/// Wardrobe grouping, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitCategory {
    Suit,
    Hoodie,
    Tshirt,
    Accessory,
}

impl OutfitCategory {
    pub const ALL: [OutfitCategory; 4] = [
        OutfitCategory::Suit,
        OutfitCategory::Hoodie,
        OutfitCategory::Tshirt,
        OutfitCategory::Accessory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutfitCategory::Suit => "Suits",
            OutfitCategory::Hoodie => "Hoodies",
            OutfitCategory::Tshirt => "T-Shirts",
            OutfitCategory::Accessory => "Accessories",
        }
    }
}

/// A wardrobe item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
    pub id: String,
    pub name: String,
    pub category: OutfitCategory,
    pub prompt_modifier: String,
    pub thumbnail: String,
    #[serde(with = "hex_color")]
    pub default_tint: Color,
    pub material: String,
    pub texture: String,
    pub fit: String,
}

/// Outfits are identified by id
impl PartialEq for Outfit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A named palette swatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tint {
    pub name: String,
    #[serde(with = "hex_color")]
    pub hex: Color,
}

impl Tint {
    pub fn new(name: impl Into<String>, hex: Color) -> Self {
        Self {
            name: name.into(),
            hex,
        }
    }
}

/// Tints are identified by their hex value
impl PartialEq for Tint {
    fn eq(&self, other: &Self) -> bool {
        self.hex.to_hex() == other.hex.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_row_parses_color_payload() {
        let b: Backdrop = toml::from_str(
            r##"
id = "chroma-green"
name = "Chroma Green"
kind = "color"
value = "#00ff00"
thumbnail = "thumb.jpg"
"##,
        )
        .unwrap();
        assert_eq!(b.kind, BackdropKind::Color(Color::from_hex(0x00ff00)));
        assert_eq!(b.kind.tag(), BackdropKindTag::Color);
        assert!(b.kind.source().is_none());
    }

    #[test]
    fn backdrop_row_rejects_bad_color() {
        let err = toml::from_str::<Backdrop>(
            r##"
id = "bad"
name = "Bad"
kind = "color"
value = "green"
thumbnail = ""
"##,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn environment_3d_uses_short_tag() {
        let b: Backdrop = toml::from_str(
            r#"
id = "loft"
name = "Loft"
kind = "3d"
value = "scenes/loft.glb"
thumbnail = ""
"#,
        )
        .unwrap();
        assert_eq!(b.kind, BackdropKind::Environment3D("scenes/loft.glb".into()));
        assert_eq!(b.kind.tag().to_string(), "3d");
    }

    #[test]
    fn backdrop_serializes_back_to_row() {
        let b = Backdrop {
            id: "vid".into(),
            name: "Video".into(),
            kind: BackdropKind::LoopingVideo("clip.mp4".into()),
            thumbnail: "t".into(),
        };
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["value"], "clip.mp4");
    }

    #[test]
    fn tint_equality_is_by_hex() {
        let a = Tint::new("Gold", Color::from_hex(0xD4AF37));
        let b = Tint::new("Also Gold", Color::from_hex_str("#d4af37").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, Tint::new("Gold", Color::from_hex(0xC0C0C0)));
    }
}
