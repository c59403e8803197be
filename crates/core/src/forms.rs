//! Model-backed forms.
//!
//! A form holds the raw submitted fields so it can be re-rendered with the
//! user's input, and [`ModelForm::validate`] turns it into the record a
//! service persists, or into per-field messages.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};
use yatube_db::entities::{group, post};

const INVALID_CHOICE: &str =
    "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
const INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, \
                             поврежден или не является изображением.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field (empty when the field is valid).
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another set of errors into this one.
    pub fn extend(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when there are no errors, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                out.add(&field, message);
            }
        }
        out
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A form bound to a model: validation yields the record to save.
pub trait ModelForm {
    /// What a valid form produces.
    type Record;
    /// Extra data validation needs (for example the allowed choices).
    type Context: ?Sized;

    /// Validate the submitted fields.
    fn validate(&self, ctx: &Self::Context) -> Result<Self::Record, FieldErrors>;
}

/// Post and comment bodies share these rules.
#[derive(Debug, Validate)]
struct TextInput {
    #[validate(
        length(min = 1, message = "Обязательное поле."),
        custom(function = "within_text_limit")
    )]
    text: String,
}

fn within_text_limit(text: &str) -> Result<(), ValidationError> {
    let len = text.chars().count() as u64;
    if len > post::MAX_TEXT_LENGTH {
        return Err(ValidationError::new("max_length").with_message(Cow::Owned(format!(
            "Убедитесь, что это значение содержит не более {} символов (сейчас {len}).",
            post::MAX_TEXT_LENGTH
        ))));
    }
    Ok(())
}

fn clean_text(raw: &str) -> Result<String, FieldErrors> {
    let input = TextInput {
        text: raw.trim().to_string(),
    };
    input.validate()?;
    Ok(input.text)
}

// ==================== Image ====================

/// A file field as received from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    /// Client-side file name.
    pub filename: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// A file input left empty still arrives as a part with no name and no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() && self.data.is_empty()
    }
}

/// An upload that decoded as an image.
#[derive(Debug, Clone)]
pub struct ValidImage {
    /// Client-side file name.
    pub filename: String,
    /// Detected format.
    pub format: ImageFormat,
    /// Raw bytes, stored unchanged.
    pub data: Vec<u8>,
}

impl ValidImage {
    /// MIME type of the detected format.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Canonical file extension of the detected format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Check that the bytes decode as an image.
pub fn verify_image(upload: &ImageUpload) -> Result<ValidImage, FieldErrors> {
    let invalid = || {
        let mut errors = FieldErrors::new();
        errors.add("image", INVALID_IMAGE);
        errors
    };

    let reader = ImageReader::new(Cursor::new(&upload.data))
        .with_guessed_format()
        .map_err(|_| invalid())?;
    let format = reader.format().ok_or_else(invalid)?;
    reader.decode().map_err(|_| invalid())?;

    Ok(ValidImage {
        filename: upload.filename.clone(),
        format,
        data: upload.data.clone(),
    })
}

// ==================== Post ====================

/// Submitted post fields.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    /// Post body.
    pub text: String,
    /// Selected group ID; empty means no group.
    pub group: Option<String>,
    /// Attached image, if a file was chosen.
    pub image: Option<ImageUpload>,
}

/// A valid post submission.
#[derive(Debug, Clone)]
pub struct PostRecord {
    /// Trimmed body.
    pub text: String,
    /// Group the post is filed under.
    pub group_id: Option<String>,
    /// New image; `None` keeps whatever the post already has.
    pub image: Option<ValidImage>,
}

impl PostForm {
    /// Initial values for editing an existing post.
    #[must_use]
    pub fn from_post(post: &post::Model) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.clone(),
            image: None,
        }
    }

    /// Selected group, with the empty choice folded into `None`.
    #[must_use]
    pub fn selected_group(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}

impl ModelForm for PostForm {
    type Record = PostRecord;
    type Context = [group::Model];

    fn validate(&self, groups: &[group::Model]) -> Result<PostRecord, FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = clean_text(&self.text).unwrap_or_else(|e| {
            errors.extend(e);
            String::new()
        });

        let group_id = match self.selected_group() {
            Some(id) if groups.iter().any(|g| g.id == id) => Some(id.to_string()),
            Some(_) => {
                errors.add("group", INVALID_CHOICE);
                None
            }
            None => None,
        };

        let image = match self.image.as_ref().filter(|upload| !upload.is_empty()) {
            Some(upload) => verify_image(upload).map_or_else(
                |e| {
                    errors.extend(e);
                    None
                },
                Some,
            ),
            None => None,
        };

        errors.into_result(PostRecord {
            text,
            group_id,
            image,
        })
    }
}

// ==================== Comment ====================

/// Submitted comment fields.
#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    /// Comment body.
    pub text: String,
}

/// A valid comment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    /// Trimmed body.
    pub text: String,
}

impl ModelForm for CommentForm {
    type Record = CommentRecord;
    type Context = ();

    fn validate(&self, _ctx: &()) -> Result<CommentRecord, FieldErrors> {
        clean_text(&self.text).map(|text| CommentRecord { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: "Тестовая группа".to_string(),
            slug: "test-slug".to_string(),
            description: String::new(),
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::new(2, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_post_form_valid() {
        let form = PostForm {
            text: "  Тестовый текст  ".to_string(),
            group: Some("g1".to_string()),
            image: None,
        };

        let record = form.validate(&[group("g1")]).unwrap();
        assert_eq!(record.text, "Тестовый текст");
        assert_eq!(record.group_id.as_deref(), Some("g1"));
        assert!(record.image.is_none());
    }

    #[test]
    fn test_post_form_blank_text_is_required() {
        let form = PostForm {
            text: "   ".to_string(),
            ..Default::default()
        };

        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.get("text"), ["Обязательное поле.".to_string()]);
    }

    #[test]
    fn test_post_form_text_limit_counts_chars() {
        let at_limit = PostForm {
            text: "ж".repeat(300),
            ..Default::default()
        };
        assert!(at_limit.validate(&[]).is_ok());

        let over = PostForm {
            text: "ж".repeat(301),
            ..Default::default()
        };
        let errors = over.validate(&[]).unwrap_err();
        assert!(errors.get("text")[0].contains("(сейчас 301)"));
    }

    #[test]
    fn test_post_form_unknown_group() {
        let form = PostForm {
            text: "text".to_string(),
            group: Some("missing".to_string()),
            image: None,
        };

        let errors = form.validate(&[group("g1")]).unwrap_err();
        assert_eq!(errors.get("group"), [INVALID_CHOICE.to_string()]);
        assert!(errors.get("text").is_empty());
    }

    #[test]
    fn test_post_form_empty_group_means_none() {
        let form = PostForm {
            text: "text".to_string(),
            group: Some(String::new()),
            image: None,
        };

        assert_eq!(form.validate(&[]).unwrap().group_id, None);
    }

    #[test]
    fn test_post_form_accepts_image() {
        let form = PostForm {
            text: "with picture".to_string(),
            group: None,
            image: Some(ImageUpload {
                filename: "small.png".to_string(),
                data: tiny_png(),
            }),
        };

        let image = form.validate(&[]).unwrap().image.unwrap();
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_post_form_rejects_non_image() {
        let form = PostForm {
            text: "with picture".to_string(),
            group: None,
            image: Some(ImageUpload {
                filename: "small.gif".to_string(),
                data: b"definitely not a gif".to_vec(),
            }),
        };

        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.get("image"), [INVALID_IMAGE.to_string()]);
    }

    #[test]
    fn test_post_form_collects_every_field_error() {
        let form = PostForm {
            text: String::new(),
            group: Some("missing".to_string()),
            image: None,
        };

        let errors = form.validate(&[]).unwrap_err();
        assert!(!errors.get("text").is_empty());
        assert!(!errors.get("group").is_empty());
    }

    #[test]
    fn test_empty_file_part_is_ignored() {
        let form = PostForm {
            text: "text".to_string(),
            group: None,
            image: Some(ImageUpload::default()),
        };

        assert!(form.validate(&[]).unwrap().image.is_none());
    }

    #[test]
    fn test_comment_form() {
        let ok = CommentForm {
            text: " Комментарий ".to_string(),
        };
        assert_eq!(ok.validate(&()).unwrap().text, "Комментарий");

        let blank = CommentForm::default();
        assert!(!blank.validate(&()).unwrap_err().get("text").is_empty());
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.add("text", "a");
        errors.add("group", "b");
        assert_eq!(errors.to_string(), "group: b; text: a");
    }
}
