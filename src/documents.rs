//! Reference documents: upload, listing and download

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::gateway::RequestGateway;

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_TAGS_CHARS: usize = 100;

/// A stored reading document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingDocument {
    pub docs_id: String,
    pub docs_owner: String,
    pub docs_title: String,
    #[serde(default)]
    pub docs_description: Option<String>,
    #[serde(default)]
    pub docs_tags: Option<String>,
    pub docs_file_path: String,
    pub uploaded_at: String,
}

/// Presigned link returned by `/download-document/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadLink {
    pub url: String,
}

/// Accepted file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Kind implied by a file name's extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if name.ends_with(".docx") {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A document ready to upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub title: String,
    pub description: String,
    pub tags: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(title: &str, file_name: &str, data: Vec<u8>) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            tags: String::new(),
            file_name: file_name.to_string(),
            data,
        }
    }

    /// Read the file at `path`, naming the upload after it
    pub async fn from_path(title: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| Error::validation("Please select a file."))?;
        let data = tokio::fs::read(path).await.map_err(Error::storage)?;
        Ok(Self::new(title, &file_name, data))
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tags.to_string();
        self
    }

    /// Check the upload before anything is sent
    pub fn validate(&self) -> Result<DocumentKind> {
        if self.file_name.trim().is_empty() {
            return Err(Error::validation("Please select a file."));
        }
        let kind = DocumentKind::from_file_name(&self.file_name)
            .ok_or_else(|| Error::validation("Only .pdf and .docx files are allowed."))?;
        if self.title.trim().is_empty() {
            return Err(Error::validation("Title is required."));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::validation("Title must be 100 characters or less."));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(Error::validation(
                "Description must be 500 characters or less.",
            ));
        }
        if self.tags.chars().count() > MAX_TAGS_CHARS {
            return Err(Error::validation("Tags must be 100 characters or less."));
        }
        Ok(kind)
    }

    fn into_form(self, kind: DocumentKind) -> Result<Form> {
        let file = Part::bytes(self.data)
            .file_name(self.file_name)
            .mime_str(kind.mime_type())?;
        Ok(Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("tags", self.tags)
            .part("file", file))
    }
}

/// Client for the document endpoints
pub struct DocumentsClient<'a> {
    gateway: &'a RequestGateway,
}

impl<'a> DocumentsClient<'a> {
    pub(crate) fn new(gateway: &'a RequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn upload(&self, upload: DocumentUpload) -> Result<()> {
        let kind = upload.validate()?;
        let form = upload.into_form(kind)?;
        self.gateway
            .post("/upload-reading-documents")
            .multipart(form)
            .execute_empty()
            .await
    }

    /// Documents uploaded by the current user
    pub async fn mine(&self) -> Result<Vec<ReadingDocument>> {
        self.gateway
            .get("/my-reading-documents")
            .execute::<Vec<ReadingDocument>>()
            .await
    }

    pub async fn download_url(&self, docs_id: &str) -> Result<String> {
        let link = self
            .gateway
            .get(&format!("/download-document/{}", docs_id))
            .execute::<DownloadLink>()
            .await?;
        Ok(link.url)
    }

    /// Fetch the document's bytes from the object store
    ///
    /// The presigned link carries its own authorization, so no bearer
    /// credential is sent to it.
    pub async fn download(&self, docs_id: &str) -> Result<Vec<u8>> {
        let url = self.download_url(docs_id).await?;
        let response = Fetch::get(self.gateway.http_client(), &url)
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::http(status, crate::fetch::error_detail(&text)));
        }

        Ok(response.bytes().await?.to_vec())
    }

    pub async fn delete(&self, docs_id: &str) -> Result<()> {
        self.gateway
            .delete(&format!("/delete-reading-document/{}", docs_id))
            .execute_empty()
            .await
    }
}
