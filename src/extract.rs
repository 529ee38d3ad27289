//! Extractors whose rejections render as the error envelope.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::StatusCode,
    Json,
};
use common::Price;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{ApiError, ApiResult, Severity};
use crate::uploads::UploadedFile;

/// JSON body that must also pass its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// A multipart body split into text fields and files.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) if !file_name.is_empty() => {
                    let bytes = field.bytes().await?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        bytes,
                    });
                }
                _ => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }
}

impl FormData {
    /// Trimmed value of a text field; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Files uploaded under `name`, in submission order.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == name);
        self.files = rest;
        taken
    }
}

/// Collects every bad form field before failing, like body validation does.
#[derive(Debug, Default)]
pub struct FormErrors(Vec<String>);

impl FormErrors {
    /// Records "required" when the field was not sent at all; a value that
    /// was sent but failed to parse has already been reported.
    pub fn required<T>(&mut self, form: &FormData, name: &str, value: Option<T>) -> Option<T> {
        if value.is_none() && form.text(name).is_none() {
            self.0.push(format!("{name}: This field is required"));
        }
        value
    }

    pub fn number<T: FromStr>(&mut self, form: &FormData, name: &str) -> Option<T> {
        let raw = form.text(name)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.0.push(format!("{name}: This field must be a number"));
                None
            }
        }
    }

    /// Non-negative whole number field.
    pub fn count(&mut self, form: &FormData, name: &str) -> Option<i32> {
        let value: i32 = self.number(form, name)?;
        if value < 0 {
            self.0.push(format!("{name}: This field must be greater than -1"));
            return None;
        }
        Some(value)
    }

    pub fn price(&mut self, form: &FormData, name: &str) -> Option<Price> {
        let raw = form.text(name)?;
        match raw.parse::<Price>() {
            Ok(price) => Some(price),
            Err(e) => {
                self.0.push(format!("{name}: {e}"));
                None
            }
        }
    }

    pub fn finish(mut self) -> ApiResult<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        self.0.sort();
        Err(ApiError::with_messages(StatusCode::BAD_REQUEST, Severity::Warn, self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn form(fields: &[(&str, &str)]) -> FormData {
        FormData {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: vec![
                UploadedFile {
                    field: "photos".into(),
                    file_name: "a.png".into(),
                    bytes: Bytes::from_static(b"a"),
                },
                UploadedFile {
                    field: "photo".into(),
                    file_name: "b.png".into(),
                    bytes: Bytes::from_static(b"b"),
                },
            ],
        }
    }

    #[test]
    fn blank_text_is_absent() {
        let form = form(&[("nama_produk", "  Kemeja "), ("slug", "   ")]);
        assert_eq!(form.text("nama_produk").as_deref(), Some("Kemeja"));
        assert_eq!(form.text("slug"), None);
    }

    #[test]
    fn files_are_taken_by_field() {
        let mut form = form(&[]);
        let photos = form.take_files("photos");
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].file_name, "a.png");
        assert_eq!(form.take_files("photos").len(), 0);
        assert_eq!(form.take_files("photo").len(), 1);
    }

    #[test]
    fn errors_are_collected_per_field() {
        let form = form(&[("stok", "-1"), ("harga_konsumen", "abc"), ("category_id", "x")]);
        let mut errors = FormErrors::default();
        let stok = errors.count(&form, "stok");
        assert_eq!(errors.required(&form, "stok", stok), None);
        assert_eq!(errors.price(&form, "harga_konsumen"), None);
        assert_eq!(errors.number::<i32>(&form, "category_id"), None);
        errors.required(&form, "nama_produk", form.text("nama_produk"));

        let err = errors.finish().unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.messages(),
            &[
                "category_id: This field must be a number".to_string(),
                "harga_konsumen: 'abc' is not a whole number".to_string(),
                "nama_produk: This field is required".to_string(),
                "stok: This field must be greater than -1".to_string(),
            ]
        );
    }
}
