//! Rectangular image annotations: geometry, categories, sync status and
//! validation helpers shared by the editor, the API and the repositories.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Stroke and fill color applied to new annotations.
pub const DEFAULT_COLOR: &str = "#F59E0B";

/// Author recorded when the user has not identified themselves.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Maximum length of an annotation note, in characters.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Prefix of client-assigned ids that have not been replaced by a server id.
pub const LOCAL_ID_PREFIX: &str = "local-";

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A rectangle in image-space pixels.
///
/// Records held by the store always satisfy `width >= 0 && height >= 0`;
/// use [`Geometry::normalized`] to build one from signed drag extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    /// Build a rectangle from an anchor and signed extents, moving the anchor
    /// to the top-left corner when an extent is negative.
    pub fn normalized(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self { x, y, width, height }
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }

    /// The same rectangle moved so its top-left corner sits at `(x, y)`.
    pub fn moved_to(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

/// Validate that a geometry is finite and has non-negative extents.
pub fn validate_geometry(geometry: &Geometry) -> Result<(), CoreError> {
    let Geometry { x, y, width, height } = *geometry;
    if ![x, y, width, height].iter().all(|v| v.is_finite()) {
        return Err(CoreError::Validation(
            "annotation geometry must contain finite numbers".to_string(),
        ));
    }
    if !geometry.is_normalized() {
        return Err(CoreError::Validation(format!(
            "annotation width and height must be non-negative, got {width}x{height}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// What kind of note an annotation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    General,
    Transcription,
    Context,
    Question,
    Important,
    Translation,
}

/// All valid category strings.
const VALID_CATEGORY_STRINGS: &[&str] = &[
    "general",
    "transcription",
    "context",
    "question",
    "important",
    "translation",
];

impl Category {
    /// Return the category as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Transcription => "transcription",
            Self::Context => "context",
            Self::Question => "question",
            Self::Important => "important",
            Self::Translation => "translation",
        }
    }

    /// Parse a category from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "general" => Ok(Self::General),
            "transcription" => Ok(Self::Transcription),
            "context" => Ok(Self::Context),
            "question" => Ok(Self::Question),
            "important" => Ok(Self::Important),
            "translation" => Ok(Self::Translation),
            _ => Err(CoreError::Validation(format!(
                "Invalid category '{s}'. Must be one of: {}",
                VALID_CATEGORY_STRINGS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync status
// ---------------------------------------------------------------------------

/// Where a locally held annotation stands relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Created locally and never acknowledged by the server.
    Local,
    /// Changed locally since the last successful sync.
    Dirty,
    /// Matches what the server last acknowledged.
    Synced,
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// An annotation as exchanged with the REST collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: EntityId,
    /// `None` while the canvas works on an unsaved, local-only image.
    #[serde(default)]
    pub document_id: Option<EntityId>,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub text: String,
    pub color: String,
    pub category: Category,
    pub author: String,
    pub created_at: Timestamp,
}

/// The editable values of a rectangle waiting to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub geometry: Geometry,
    pub text: String,
    pub color: String,
    pub category: Category,
    pub author: String,
}

impl AnnotationDraft {
    /// A draft with the default note text, category, color and author.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            text: String::new(),
            color: DEFAULT_COLOR.to_string(),
            category: Category::default(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_geometry(&self.geometry)?;
        validate_text(&self.text)?;
        validate_color_hex(&self.color)
    }

    /// Turn the draft into a record. The note text is stored trimmed.
    pub fn into_annotation(
        self,
        id: EntityId,
        document_id: Option<EntityId>,
        created_at: Timestamp,
    ) -> Annotation {
        Annotation {
            id,
            document_id,
            geometry: self.geometry,
            text: self.text.trim().to_string(),
            color: self.color,
            category: self.category,
            author: self.author,
            created_at,
        }
    }
}

/// Generate a temporary client-side annotation id.
pub fn new_local_id() -> EntityId {
    format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4())
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate an annotation note: non-empty once trimmed and no longer than
/// [`MAX_TEXT_LENGTH`] characters.
pub fn validate_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation(
            "annotation text must not be empty".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(CoreError::Validation(format!(
            "annotation text is {len} characters, maximum is {MAX_TEXT_LENGTH}"
        )));
    }
    Ok(())
}

/// Validate that a color string matches `#RRGGBB` or `#RRGGBBAA` hex format.
pub fn validate_color_hex(color: &str) -> Result<(), CoreError> {
    let valid_length = color.len() == 7 || color.len() == 9;

    if !valid_length {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must be in #RRGGBB or #RRGGBBAA hex format"
        )));
    }

    if !color.starts_with('#') {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must start with '#'"
        )));
    }

    if !color[1..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must contain only hex digits after '#'"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
