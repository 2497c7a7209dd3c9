//! Typed client for the certificate backend.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{
    Participant, ParticipantDraft, ParticipantIds, RenderResponse, ResendRequest, Signer,
    check_body, decode_body,
};
use certcanvas_core::storage::{Design, DesignDraft, SaveMode};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Multipart field carrying an uploaded signature.
pub const SIGNATURE_FIELD: &str = "signature_image";

/// HTTP client for certificates, anchors, rendering, signatures and
/// participants. Failures are returned as [`ApiError`] and never retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self { http, config })
    }

    /// Build a client from `CERTCANVAS_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    async fn body(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(|e| {
            log::error!("Request failed: {e}");
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .and_then(|v| v.get("msg").and_then(|m| m.as_str()).map(str::to_owned))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            log::error!("HTTP {status}: {message}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(bytes.to_vec())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        decode_body(&self.body(request).await?)
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        check_body(&self.body(request).await?)
    }

    // Certificates

    /// `GET /certificate/{id}`
    pub async fn certificate(&self, id: &str) -> Result<Design, ApiError> {
        self.send(self.request(Method::GET, &format!("/certificate/{id}")))
            .await
    }

    /// `POST /certificate`
    pub async fn create_certificate(&self, draft: &DesignDraft) -> Result<Design, ApiError> {
        self.send(self.request(Method::POST, "/certificate").json(draft))
            .await
    }

    /// `PUT /certificate/{id}`, with `?autosave=true` for periodic saves.
    pub async fn update_certificate(
        &self,
        id: &str,
        draft: &DesignDraft,
        mode: SaveMode,
    ) -> Result<Design, ApiError> {
        let mut request = self
            .request(Method::PUT, &format!("/certificate/{id}"))
            .json(draft);
        if mode.is_autosave() {
            request = request.query(&[("autosave", "true")]);
        }
        self.send(request).await
    }

    /// `GET /certificate/anchor/{id}`: columns referenced by the design.
    pub async fn anchors(&self, id: &str) -> Result<Vec<String>, ApiError> {
        self.send(self.request(Method::GET, &format!("/certificate/anchor/{id}")))
            .await
    }

    /// `POST /certificate/render/{id}`
    pub async fn render(
        &self,
        id: &str,
        participant_ids: &[String],
    ) -> Result<RenderResponse, ApiError> {
        let body = ParticipantIds { participant_ids };
        self.send(
            self.request(Method::POST, &format!("/certificate/render/{id}"))
                .json(&body),
        )
        .await
    }

    // Signatures

    /// `GET /signature/status/{certificateId}`
    pub async fn signature_status(&self, certificate_id: &str) -> Result<Vec<Signer>, ApiError> {
        self.send(self.request(
            Method::GET,
            &format!("/signature/status/{certificate_id}"),
        ))
        .await
    }

    /// `POST /signature/resend`
    pub async fn resend_signature(
        &self,
        certificate_id: &str,
        signer_id: &str,
    ) -> Result<(), ApiError> {
        let body = ResendRequest {
            certificate_id,
            signer_id,
        };
        self.send_unit(self.request(Method::POST, "/signature/resend").json(&body))
            .await
    }

    /// `POST /signature/upload/{signerId}` with the image as multipart
    /// field `signature_image`.
    pub async fn upload_signature(
        &self,
        signer_id: &str,
        image: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<(), ApiError> {
        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part(SIGNATURE_FIELD, part);
        self.send_unit(
            self.request(Method::POST, &format!("/signature/upload/{signer_id}"))
                .multipart(form),
        )
        .await
    }

    // Participants

    /// `GET /participant?certificateId=...`
    pub async fn participants(&self, certificate_id: &str) -> Result<Vec<Participant>, ApiError> {
        self.send(
            self.request(Method::GET, "/participant")
                .query(&[("certificateId", certificate_id)]),
        )
        .await
    }

    /// `POST /participant`
    pub async fn create_participant(
        &self,
        draft: &ParticipantDraft,
    ) -> Result<Participant, ApiError> {
        self.send(self.request(Method::POST, "/participant").json(draft))
            .await
    }

    /// `PUT /participant/{id}`
    pub async fn update_participant(
        &self,
        id: &str,
        draft: &ParticipantDraft,
    ) -> Result<Participant, ApiError> {
        self.send(
            self.request(Method::PUT, &format!("/participant/{id}"))
                .json(draft),
        )
        .await
    }

    /// `DELETE /participant/{id}`
    pub async fn delete_participant(&self, id: &str) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, &format!("/participant/{id}")))
            .await
    }

    /// `POST /participant/revoke/{id}`
    pub async fn revoke_participant(&self, id: &str) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::POST, &format!("/participant/revoke/{id}")))
            .await
    }

    /// `POST /participant/distribute`: mark participants as distributed.
    pub async fn mark_distributed(&self, participant_ids: &[String]) -> Result<(), ApiError> {
        let body = ParticipantIds { participant_ids };
        self.send_unit(
            self.request(Method::POST, "/participant/distribute")
                .json(&body),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response and hand back the raw request.
    pub(crate) async fn serve_once(
        status: u16,
        content_type: &str,
        body: Vec<u8>,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let content_type = content_type.to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let head = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    pub(crate) fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub(crate) fn client(url: &str) -> ApiClient {
        ApiClient::new(ClientConfig::new(url)).unwrap()
    }

    fn json(value: serde_json::Value) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    #[tokio::test]
    async fn test_get_certificate() {
        let (url, server) = serve_once(
            200,
            "application/json",
            json(serde_json::json!({
                "success": true,
                "msg": "ok",
                "data": {
                    "id": "c1",
                    "name": "Award",
                    "design": "{}",
                    "archive_url": "https://files/c1.zip",
                    "updated_at": "2024-01-01"
                }
            })),
        )
        .await;

        let design = client(&url).certificate("c1").await.unwrap();
        assert_eq!(design.id, "c1");
        assert_eq!(design.name, "Award");
        assert_eq!(design.updated_at, "2024-01-01");
        assert_eq!(design.archive_url.as_deref(), Some("https://files/c1.zip"));
        assert!(server.await.unwrap().starts_with("GET /certificate/c1 "));
    }

    #[tokio::test]
    async fn test_autosave_flag() {
        let (url, server) = serve_once(
            200,
            "application/json",
            json(serde_json::json!({
                "success": true,
                "data": { "id": "c1", "name": "Award", "design": "{}", "updated_at": "2" }
            })),
        )
        .await;

        let saved = client(&url)
            .update_certificate("c1", &DesignDraft::scene("{}".into()), SaveMode::Autosave)
            .await
            .unwrap();
        assert_eq!(saved.updated_at, "2");
        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /certificate/c1?autosave=true "));
        assert!(request.contains(r#"{"design":"{}"}"#));
    }

    #[tokio::test]
    async fn test_http_error_uses_message() {
        init_logger();
        let (url, _server) = serve_once(
            404,
            "application/json",
            json(serde_json::json!({ "success": false, "msg": "Certificate not found" })),
        )
        .await;

        let err = client(&url).certificate("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Certificate not found"));
    }

    #[tokio::test]
    async fn test_rejected_envelope() {
        let (url, _server) = serve_once(
            200,
            "application/json",
            json(serde_json::json!({ "success": false, "msg": "Already revoked" })),
        )
        .await;

        let err = client(&url).revoke_participant("p1").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m == "Already revoked"));
    }

    #[tokio::test]
    async fn test_render_request_body() {
        let (url, server) = serve_once(
            200,
            "application/json",
            json(serde_json::json!({
                "results": [{ "participantId": "p1", "status": "success", "filePath": "/p1.pdf" }],
                "zipFilePath": "/all.zip"
            })),
        )
        .await;

        let ids = vec!["p1".to_string()];
        let response = client(&url).render("c1", &ids).await.unwrap();
        assert_eq!(response.results[0].file_path.as_deref(), Some("/p1.pdf"));
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /certificate/render/c1 "));
        assert!(request.contains(r#"{"participantIds":["p1"]}"#));
    }

    #[tokio::test]
    async fn test_signature_upload_is_multipart() {
        let (url, server) = serve_once(
            200,
            "application/json",
            json(serde_json::json!({ "success": true })),
        )
        .await;

        client(&url)
            .upload_signature("s1", vec![1, 2, 3], "signature.png", "image/png")
            .await
            .unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /signature/upload/s1 "));
        assert!(request.contains(r#"name="signature_image""#));
        assert!(request.to_ascii_lowercase().contains("multipart/form-data"));
    }
}
