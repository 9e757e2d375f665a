//! Content-sharing system adapter.
//!
//! Grants and revokes a downloader share on one root folder. The system
//! reports idempotent conflicts through an `errorKey` field rather than a
//! distinct status code.

use tracing::info;

use rollcall_core::config::ContentShareConfig;
use rollcall_core::{RecordHandle, Secret};
use rollcall_render::{PayloadContext, PayloadRenderer};

use crate::adapter::ContentShare;
use crate::context::RunContext;
use crate::error::DirectoryError;
use crate::http::{join, Auth, HttpClient, HttpRequest, HttpResponse, Method};

const SYSTEM: &str = "content share";

const SHARE: &str = "share";
const UNSHARE: &str = "unshare";

const ALREADY_SHARED: &str = "!csFolderAlreadyShared";
const NOT_SHARED: &str = "!csUserHasNotBeenShared";

pub struct ContentShareAdapter {
    http: HttpClient,
    tag: String,
    base_url: String,
    username: String,
    password: Secret,
    folder_id: String,
    renderer: PayloadRenderer,
}

impl ContentShareAdapter {
    pub fn from_config(config: &ContentShareConfig, http: HttpClient) -> Result<Self, DirectoryError> {
        let renderer = PayloadRenderer::new([
            (SHARE, config.share_template.as_str()),
            (UNSHARE, config.unshare_template.as_str()),
        ])?;
        Ok(Self {
            http,
            tag: config.tag.clone(),
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            folder_id: config.folder_id.clone(),
            renderer,
        })
    }

    fn auth(&self) -> Auth {
        Auth::Basic {
            username: self.username.clone(),
            password: self.password.expose().to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        join(&self.base_url, path)
    }
}

fn has_error_key(response: &HttpResponse, prefix: &str) -> bool {
    response
        .error_key()
        .is_some_and(|key| key.starts_with(prefix))
}

impl ContentShare for ContentShareAdapter {
    fn system(&self) -> &str {
        SYSTEM
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn sync_profiles(&self, _ctx: &RunContext) -> Result<(), DirectoryError> {
        let request = HttpRequest::new(
            "profile sync",
            Method::Post,
            self.url("/documents/integration/ecal"),
        )
        .query("IdcService", "SYNC_USERS_AND_ATTRIBUTES")
        .auth(self.auth())
        .json("{}".to_string());
        self.http.send(&request)?.accept(&request.operation, &[200])?;
        info!("content share profiles synchronized");
        Ok(())
    }

    fn find_by_key(&self, _ctx: &RunContext, email: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        let request = HttpRequest::new(
            "user search",
            Method::Get,
            self.url("/documents/api/1.2/users/search/items"),
        )
        .query("email", email)
        .auth(self.auth());
        let response = self
            .http
            .send_idempotent(&request)
            .and_then(|r| r.accept(&request.operation, &[200]))
            .map_err(|e| DirectoryError::lookup(SYSTEM, email, e))?;
        Ok(response.id_at("/items/0/id").map(RecordHandle::from))
    }

    fn grant(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        let body = self
            .renderer
            .render(SHARE, &PayloadContext::for_user_id(handle.as_str()))?;
        let request = HttpRequest::new(
            "folder share",
            Method::Post,
            self.url(&format!("/documents/api/1.2/shares/{}", self.folder_id)),
        )
        .auth(self.auth())
        .json(body);
        let response = self.http.send(&request)?;
        if response.status == 200 {
            return Ok(());
        }
        if has_error_key(&response, ALREADY_SHARED) {
            info!(user = %handle, "folder already shared");
            return Ok(());
        }
        Err(response.into_error(&request.operation))
    }

    fn revoke(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        let body = self
            .renderer
            .render(UNSHARE, &PayloadContext::for_user_id(handle.as_str()))?;
        let request = HttpRequest::new(
            "folder unshare",
            Method::Delete,
            self.url(&format!("/documents/api/1.2/shares/{}/user", self.folder_id)),
        )
        .auth(self.auth())
        .json(body);
        let response = self.http.send(&request)?;
        if response.status == 200 {
            return Ok(());
        }
        if has_error_key(&response, NOT_SHARED) {
            info!(user = %handle, "already unshared");
            return Ok(());
        }
        Err(response.into_error(&request.operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn error_key_prefix_match() {
        let r = response(400, r#"{"errorCode":"-32","errorKey":"!csFolderAlreadyShared,F123"}"#);
        assert!(has_error_key(&r, ALREADY_SHARED));
        assert!(!has_error_key(&r, NOT_SHARED));
        assert!(!has_error_key(&response(500, "oops"), ALREADY_SHARED));
    }
}
