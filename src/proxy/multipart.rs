//! Multipart form-data decoding and re-encoding.
//!
//! The inbound body is split into [`UploadPart`]s with `multer`, then
//! serialized again under a freshly generated boundary. Items larger than the
//! configured threshold are spooled to an anonymous temporary file while
//! decoding.

use std::convert::Infallible;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::proxy::error::TranslateError;

const BOUNDARY_LEN: usize = 30;
const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// One decoded item of a multipart body.
#[derive(Debug)]
pub enum UploadPart {
    /// A plain form field.
    Field { name: String, value: String },
    /// A file upload.
    File {
        field_name: String,
        file_name: String,
        content_type: Option<String>,
        data: PartData,
    },
}

/// Where the bytes of a file part live.
#[derive(Debug)]
pub enum PartData {
    Memory(Vec<u8>),
    /// Spooled to an unnamed temporary file, removed when dropped.
    Spooled { file: File, len: u64 },
}

impl PartData {
    /// Size of the part content in bytes.
    pub fn len(&self) -> u64 {
        match self {
            PartData::Memory(buf) => buf.len() as u64,
            PartData::Spooled { len, .. } => *len,
        }
    }

    /// True when the part has no content.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self, PartData::Spooled { .. })
    }

    async fn into_bytes(self) -> Result<Vec<u8>, TranslateError> {
        match self {
            PartData::Memory(buf) => Ok(buf),
            PartData::Spooled { mut file, len } => {
                file.rewind().await.map_err(spool_error)?;
                let mut buf = Vec::with_capacity(len as usize);
                file.read_to_end(&mut buf).await.map_err(spool_error)?;
                Ok(buf)
            }
        }
    }
}

fn spool_error(err: std::io::Error) -> TranslateError {
    TranslateError::Upload(format!("spooling failed: {err}"))
}

/// Accumulates one file part, moving it to disk past the threshold.
struct PartWriter<'a> {
    threshold: usize,
    dir: &'a Path,
    data: PartData,
}

impl<'a> PartWriter<'a> {
    fn new(threshold: usize, dir: &'a Path) -> Self {
        Self {
            threshold,
            dir,
            data: PartData::Memory(Vec::new()),
        }
    }

    async fn push(&mut self, chunk: &[u8]) -> Result<(), TranslateError> {
        match &mut self.data {
            PartData::Spooled { file, len } => {
                file.write_all(chunk).await.map_err(spool_error)?;
                *len += chunk.len() as u64;
            }
            PartData::Memory(buf) if buf.len() + chunk.len() <= self.threshold => {
                buf.extend_from_slice(chunk);
            }
            PartData::Memory(buf) => {
                let buffered = std::mem::take(buf);
                let mut file = File::from_std(tempfile::tempfile_in(self.dir).map_err(spool_error)?);
                file.write_all(&buffered).await.map_err(spool_error)?;
                file.write_all(chunk).await.map_err(spool_error)?;
                tracing::trace!(
                    dir = %self.dir.display(),
                    threshold = self.threshold,
                    "Upload item spooled to disk"
                );
                self.data = PartData::Spooled {
                    file,
                    len: (buffered.len() + chunk.len()) as u64,
                };
            }
        }
        Ok(())
    }

    async fn finish(mut self) -> Result<PartData, TranslateError> {
        if let PartData::Spooled { file, .. } = &mut self.data {
            file.flush().await.map_err(spool_error)?;
        }
        Ok(self.data)
    }
}

/// A decoded multipart body, ready to be re-serialized.
#[derive(Debug)]
pub struct MultipartBody {
    parts: Vec<UploadPart>,
    boundary: String,
}

impl MultipartBody {
    /// Build a body from already decoded parts under a fresh boundary.
    pub fn new(parts: Vec<UploadPart>) -> Self {
        Self {
            parts,
            boundary: generate_boundary(),
        }
    }

    /// Decode an inbound multipart body.
    ///
    /// Parts without a file name are form fields; everything else is a file
    /// part. File parts above `threshold` bytes are spooled into `spool_dir`.
    pub async fn decode(
        content_type: &str,
        body: Bytes,
        threshold: usize,
        spool_dir: &Path,
    ) -> Result<Self, TranslateError> {
        let boundary = multer::parse_boundary(content_type)?;
        let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut parts = Vec::new();
        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let Some(file_name) = field.file_name().map(str::to_owned) else {
                let value = field.text().await?;
                parts.push(UploadPart::Field { name, value });
                continue;
            };

            let content_type = field.content_type().map(ToString::to_string);
            let mut writer = PartWriter::new(threshold, spool_dir);
            while let Some(chunk) = field.chunk().await? {
                writer.push(&chunk).await?;
            }
            parts.push(UploadPart::File {
                field_name: name,
                file_name,
                content_type,
                data: writer.finish().await?,
            });
        }

        Ok(Self::new(parts))
    }

    /// The decoded parts, in arrival order.
    pub fn parts(&self) -> &[UploadPart] {
        &self.parts
    }

    /// The boundary used when re-encoding.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content type announcing the regenerated boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Serialize every part under this body's boundary.
    pub async fn encode(self) -> Result<Bytes, TranslateError> {
        let mut out = BytesMut::new();

        for part in self.parts {
            out.put_slice(b"--");
            out.put_slice(self.boundary.as_bytes());
            out.put_slice(b"\r\n");

            match part {
                UploadPart::Field { name, value } => {
                    out.put_slice(disposition(&name, None).as_bytes());
                    out.put_slice(b"\r\n");
                    out.put_slice(value.as_bytes());
                }
                UploadPart::File {
                    field_name,
                    file_name,
                    content_type,
                    data,
                } => {
                    out.put_slice(disposition(&field_name, Some(&file_name)).as_bytes());
                    out.put_slice(b"Content-Type: ");
                    out.put_slice(
                        content_type
                            .as_deref()
                            .unwrap_or(DEFAULT_FILE_CONTENT_TYPE)
                            .as_bytes(),
                    );
                    out.put_slice(b"\r\n\r\n");
                    out.put_slice(&data.into_bytes().await?);
                }
            }
            out.put_slice(b"\r\n");
        }

        out.put_slice(b"--");
        out.put_slice(self.boundary.as_bytes());
        out.put_slice(b"--\r\n");

        Ok(out.freeze())
    }
}

fn generate_boundary() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(BOUNDARY_LEN)
        .collect()
}

fn disposition(name: &str, file_name: Option<&str>) -> String {
    match file_name {
        Some(file_name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape_quoted(name),
            escape_quoted(file_name)
        ),
        None => format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quoted(name)
        ),
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INBOUND_BOUNDARY: &str = "----inbound-boundary-1234";

    fn inbound_content_type() -> String {
        format!("multipart/form-data; boundary={INBOUND_BOUNDARY}")
    }

    fn inbound_body(file_bytes: &[u8]) -> Bytes {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nQuarterly report\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\nfinance\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"report.bin\"\r\n\
                 Content-Type: application/pdf\r\n\r\n",
                b = INBOUND_BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(file_bytes);
        body.extend_from_slice(format!("\r\n--{INBOUND_BOUNDARY}--\r\n").as_bytes());
        Bytes::from(body)
    }

    async fn redecode(content_type: &str, body: Bytes) -> Vec<(String, Option<String>, Vec<u8>)> {
        let boundary = multer::parse_boundary(content_type).unwrap();
        let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);
        let mut out = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap().to_string();
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.unwrap().to_vec();
            out.push((name, file_name, bytes));
        }
        out
    }

    #[tokio::test]
    async fn test_decode_classifies_parts() {
        let body = MultipartBody::decode(
            &inbound_content_type(),
            inbound_body(b"%PDF-1.4 binary\x00\xff"),
            1024,
            &std::env::temp_dir(),
        )
        .await
        .unwrap();

        let parts = body.parts();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], UploadPart::Field { name, value } if name == "title" && value == "Quarterly report"));
        assert!(matches!(&parts[1], UploadPart::Field { name, value } if name == "tag" && value == "finance"));
        match &parts[2] {
            UploadPart::File {
                field_name,
                file_name,
                content_type,
                data,
            } => {
                assert_eq!(field_name, "upload");
                assert_eq!(file_name, "report.bin");
                assert_eq!(content_type.as_deref(), Some("application/pdf"));
                assert!(!data.is_spooled());
                assert_eq!(data.len(), 17);
            }
            other => panic!("expected file part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reencode_preserves_content_with_new_boundary() {
        let file_bytes = b"line one\r\n--not-a-boundary\r\n\x00\x01\x02".to_vec();
        let body = MultipartBody::decode(
            &inbound_content_type(),
            inbound_body(&file_bytes),
            1024,
            &std::env::temp_dir(),
        )
        .await
        .unwrap();

        let content_type = body.content_type();
        assert!(!content_type.contains(INBOUND_BOUNDARY));
        assert_eq!(body.boundary().len(), BOUNDARY_LEN);

        let encoded = body.encode().await.unwrap();
        let fields = redecode(&content_type, encoded).await;

        assert_eq!(
            fields,
            vec![
                ("title".to_string(), None, b"Quarterly report".to_vec()),
                ("tag".to_string(), None, b"finance".to_vec()),
                ("upload".to_string(), Some("report.bin".to_string()), file_bytes),
            ]
        );
    }

    #[tokio::test]
    async fn test_large_items_are_spooled() {
        let file_bytes: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
        let spool_dir = tempfile::tempdir().unwrap();

        let body = MultipartBody::decode(
            &inbound_content_type(),
            inbound_body(&file_bytes),
            64,
            spool_dir.path(),
        )
        .await
        .unwrap();

        match &body.parts()[2] {
            UploadPart::File { data, .. } => {
                assert!(data.is_spooled());
                assert_eq!(data.len(), file_bytes.len() as u64);
            }
            other => panic!("expected file part, got {other:?}"),
        }

        let content_type = body.content_type();
        let fields = redecode(&content_type, body.encode().await.unwrap()).await;
        assert_eq!(fields[2].2, file_bytes);
    }

    #[tokio::test]
    async fn test_missing_boundary_is_upload_error() {
        let err = MultipartBody::decode(
            "multipart/form-data",
            Bytes::from_static(b"irrelevant"),
            1024,
            &std::env::temp_dir(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TranslateError::Upload(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_upload_error() {
        let raw = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nvalue without end",
            b = INBOUND_BOUNDARY
        );
        let err = MultipartBody::decode(
            &inbound_content_type(),
            Bytes::from(raw),
            1024,
            &std::env::temp_dir(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "upload");
    }

    #[test]
    fn test_disposition_escapes_quotes() {
        assert_eq!(
            disposition("a\"b", Some("x\r\ny.txt")),
            "Content-Disposition: form-data; name=\"a%22b\"; filename=\"x%0D%0Ay.txt\"\r\n"
        );
    }
}
