use super::Context;
use crate::ThicketError;
use bytes::Bytes;
use std::path::Path;

/// A parsed `multipart/form-data` body.
///
/// Plain fields are kept as text, in the order they were sent.  Fields that
/// carry a file name are kept as [`FormFile`]s.  Everything is held in
/// memory, bounded by [`crate::Router::multipart_memory`].
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    values: Vec<(String, String)>,
    files: Vec<FormFile>,
}

impl MultipartForm {
    /// The first value of the given plain field.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every plain field, in the order they were sent.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The first file uploaded under the given field.
    pub fn file(&self, name: &str) -> Option<&FormFile> {
        self.files.iter().find(|f| f.field == name)
    }

    /// Every uploaded file, in the order they were sent.
    pub fn files(&self) -> &[FormFile] {
        &self.files
    }
}

/// A file uploaded through a multipart form.
#[derive(Debug, Clone)]
pub struct FormFile {
    field: String,
    file_name: String,
    content_type: Option<mime::Mime>,
    data: Bytes,
}

impl FormFile {
    /// The name of the form field the file was sent under.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The file name the client gave.  This is untrusted input; do not use
    /// it as a path without sanitizing it.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The content type the client gave for the file.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// The contents of the file.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The size of the file, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Context {
    /// Parses the request body as `multipart/form-data`.  The body is read
    /// on the first call, and the parsed form is kept for later calls.
    ///
    /// # Errors
    /// Fails with [`ThicketError::UnsupportedMediaType`] if the request is
    /// not `multipart/form-data` with a boundary; with
    /// [`ThicketError::PayloadTooLarge`] if the body exceeds the router's
    /// multipart limit; or with [`ThicketError::Multipart`] if the body is
    /// malformed.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/upload").post(thicket::handlers::future(|context| {
    ///     Box::pin(async move {
    ///         let form = context.multipart().await?;
    ///         let title = form.value("title").unwrap_or_default().to_owned();
    ///         context.text(http::StatusCode::OK, title);
    ///         Ok::<_, anyhow::Error>(())
    ///     })
    /// }))?;
    ///
    /// let body = "--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n--X--\r\n";
    /// let request = Request::post("/upload")?
    ///     .with_header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=X")?
    ///     .with_body(body);
    /// let response = http.handle(request).await?;
    /// assert_eq!(response.body(), b"hello");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn multipart(&mut self) -> Result<&MultipartForm, ThicketError> {
        if self.form.is_none() {
            let form = self.parse_multipart().await?;
            self.form = Some(form);
        }

        Ok(self.form.get_or_insert_with(MultipartForm::default))
    }

    /// The first file uploaded under the given field of the multipart form.
    /// See [`Context::multipart`].
    ///
    /// # Errors
    /// Fails with [`ThicketError::MissingFormFile`] if no file was sent
    /// under the field, and otherwise as [`Context::multipart`] does.
    pub async fn form_file(&mut self, name: &str) -> Result<FormFile, ThicketError> {
        self.multipart()
            .await?
            .file(name)
            .cloned()
            .ok_or_else(|| ThicketError::MissingFormFile(name.to_owned()))
    }

    /// Writes an uploaded file to the given path, creating missing parent
    /// directories (with mode `0o750` on Unix).  An existing file is
    /// replaced.
    ///
    /// # Errors
    /// Fails with [`ThicketError::SaveFile`] if a directory or the file
    /// cannot be written.
    pub async fn save_file<P: AsRef<Path>>(&self, file: &FormFile, dst: P) -> Result<(), ThicketError> {
        let dst = dst.as_ref();
        if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut builder = tokio::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            builder.mode(0o750);
            builder.create(parent).await.map_err(ThicketError::SaveFile)?;
        }

        tokio::fs::write(dst, &file.data)
            .await
            .map_err(ThicketError::SaveFile)?;
        log::debug!("saved upload {:?} to {}", file.file_name, dst.display());
        Ok(())
    }

    async fn parse_multipart(&mut self) -> Result<MultipartForm, ThicketError> {
        let ctype = self.request.content_type();
        let boundary = ctype
            .as_ref()
            .filter(|m| m.essence_str() == "multipart/form-data")
            .and_then(|m| m.get_param(mime::BOUNDARY))
            .map(|b| b.as_str().to_owned());
        let boundary = match boundary {
            Some(boundary) => boundary,
            None => return Err(ThicketError::UnsupportedMediaType(ctype)),
        };

        let limit = self.options.multipart_memory;
        let constraints = multer::Constraints::new()
            .size_limit(multer::SizeLimit::new().whole_stream(limit));
        let mut multipart =
            multer::Multipart::with_constraints(self.request.take_body(), boundary, constraints);

        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().cloned();
            let data = field.bytes().await.map_err(multipart_error)?;

            match file_name {
                Some(file_name) => form.files.push(FormFile {
                    field: name,
                    file_name,
                    content_type,
                    data,
                }),
                None => form
                    .values
                    .push((name, String::from_utf8_lossy(&data).into_owned())),
            }
        }

        Ok(form)
    }
}

fn multipart_error(error: multer::Error) -> ThicketError {
    match error {
        multer::Error::StreamSizeExceeded { limit } => {
            ThicketError::PayloadTooLarge(anyhow::anyhow!("multipart body exceeded {} bytes", limit))
        }
        error => ThicketError::Multipart(error),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::context_for;
    use super::*;
    use crate::Request;

    const BOUNDARY: &str = "thicket-boundary";

    fn upload_body() -> String {
        [
            "--thicket-boundary\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "holiday\r\n",
            "--thicket-boundary\r\n",
            "Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "sand and sun\r\n",
            "--thicket-boundary--\r\n",
        ]
        .concat()
    }

    fn upload_context(body: String) -> Context {
        let mut context = context_for("/upload");
        *context.request_mut() = Request::post("/upload")
            .unwrap()
            .with_header(
                http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .unwrap()
            .with_body(body);
        context
    }

    #[tokio::test]
    async fn parses_values_and_files() {
        let mut context = upload_context(upload_body());
        let form = context.multipart().await.unwrap();
        assert_eq!(form.value("title"), Some("holiday"));
        assert_eq!(form.values().count(), 1);
        assert_eq!(form.files().len(), 1);

        let file = context.form_file("upload").await.unwrap();
        assert_eq!(file.field(), "upload");
        assert_eq!(file.file_name(), "notes.txt");
        assert_eq!(file.content_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(&file.data()[..], b"sand and sun");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let mut context = upload_context(upload_body());
        let error = context.form_file("title").await.unwrap_err();
        assert!(matches!(error, ThicketError::MissingFormFile(ref name) if name == "title"));
    }

    #[tokio::test]
    async fn requires_multipart_content_type() {
        let mut context = context_for("/upload");
        *context.request_mut() = Request::post("/upload")
            .unwrap()
            .with_header(http::header::CONTENT_TYPE, "application/json")
            .unwrap()
            .with_body("{}");
        let error = context.multipart().await.unwrap_err();
        assert!(matches!(error, ThicketError::UnsupportedMediaType(Some(_))));
    }

    #[tokio::test]
    async fn limit_applies() {
        let mut context = upload_context(upload_body());
        context.options.multipart_memory = 16;
        let error = context.multipart().await.unwrap_err();
        assert!(matches!(error, ThicketError::PayloadTooLarge(_)), "{:?}", error);
    }

    #[tokio::test]
    async fn save_file_creates_directories() {
        let mut context = upload_context(upload_body());
        let file = context.form_file("upload").await.unwrap();

        let root = std::env::temp_dir().join(format!("thicket-upload-{}", std::process::id()));
        let dst = root.join("nested").join("dir").join("notes.txt");
        context.save_file(&file, &dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"sand and sun");

        std::fs::remove_dir_all(&root).unwrap();
    }
}
