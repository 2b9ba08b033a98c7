//! Panel API modules on top of the request client

use crate::{ClientResult, RequestClient};
use shared::{FileListResponse, LoginRequest, LoginResponse};

/// Panel API paths
pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const FILE_LIST: &str = "/file/list";
}

/// Auth endpoints
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: RequestClient,
}

impl AuthApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    /// Login with username and password.
    ///
    /// Only returns the token; storing it is up to the caller.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.client.post(paths::LOGIN, &request).await
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }
}

/// File endpoints
#[derive(Debug, Clone)]
pub struct FileApi {
    client: RequestClient,
}

impl FileApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ClientResult<FileListResponse> {
        self.client.get(paths::FILE_LIST).await
    }
}
