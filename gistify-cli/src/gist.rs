//! GitHub Gists implementation of [`SnippetClient`].
//!
//! One gist per local file: `POST /gists` to create, `PATCH /gists/{id}` to
//! replace the file content. A 404 on `PATCH` means the gist was deleted.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gistify_core::SnippetId;
use gistify_sync::{Credential, RemoteError, RemoteSnippet, SnippetClient};

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Environment override for the REST endpoint (GitHub Enterprise, tests).
pub const API_URL_ENV: &str = "GISTIFY_API_URL";

const USER_AGENT: &str = concat!("gistify/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct GistFileBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct CreateGistBody<'a> {
    description: &'a str,
    public: bool,
    files: BTreeMap<&'a str, GistFileBody<'a>>,
}

#[derive(Serialize)]
struct EditGistBody<'a> {
    files: BTreeMap<&'a str, GistFileBody<'a>>,
}

#[derive(Deserialize)]
struct GistResponse {
    id: String,
    html_url: String,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

/// Blocking GitHub Gists client.
pub struct GistClient {
    agent: ureq::Agent,
    base_url: String,
    auth_header: String,
}

impl GistClient {
    pub fn new(credential: &Credential, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: format!("Bearer {}", credential.expose()),
        }
    }

    /// Base URL from [`API_URL_ENV`], falling back to [`DEFAULT_API_URL`].
    pub fn from_env(credential: &Credential) -> Self {
        let base_url =
            std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(credential, base_url)
    }

    /// Resolve the login the token belongs to; fails early on a bad token.
    pub fn authenticated_user(&self) -> Result<String, RemoteError> {
        let response = self
            .request("GET", "/user")
            .call()
            .map_err(|e| map_error(e, None))?;
        let user: UserResponse = response
            .into_json()
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        Ok(user.login)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Authorization", &self.auth_header)
            .set("Accept", "application/vnd.github+json")
    }
}

impl SnippetClient for GistClient {
    fn create(
        &self,
        filename: &str,
        content: &str,
        is_public: bool,
    ) -> Result<RemoteSnippet, RemoteError> {
        let body = CreateGistBody {
            description: "",
            public: is_public,
            files: BTreeMap::from([(filename, GistFileBody { content })]),
        };
        let response = self
            .request("POST", "/gists")
            .send_json(&body)
            .map_err(|e| map_error(e, None))?;
        into_snippet(response)
    }

    fn update(
        &self,
        id: &SnippetId,
        filename: &str,
        content: &str,
    ) -> Result<RemoteSnippet, RemoteError> {
        let body = EditGistBody {
            files: BTreeMap::from([(filename, GistFileBody { content })]),
        };
        let response = self
            .request("PATCH", &format!("/gists/{id}"))
            .send_json(&body)
            .map_err(|e| map_error(e, Some(id)))?;
        into_snippet(response)
    }
}

fn into_snippet(response: ureq::Response) -> Result<RemoteSnippet, RemoteError> {
    let gist: GistResponse = response
        .into_json()
        .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
    Ok(RemoteSnippet {
        id: SnippetId::from(gist.id),
        url: gist.html_url,
    })
}

/// 404 is only meaningful when a gist id was addressed.
fn map_error(err: ureq::Error, id: Option<&SnippetId>) -> RemoteError {
    match err {
        ureq::Error::Status(404, _) if id.is_some() => RemoteError::NotFound {
            id: id.cloned().unwrap_or_default(),
        },
        ureq::Error::Status(status, response) => RemoteError::Status {
            status,
            message: error_message(response),
        },
        ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
    }
}

fn error_message(response: ureq::Response) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    let body = response.into_string().unwrap_or_default();
    serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body)
}
