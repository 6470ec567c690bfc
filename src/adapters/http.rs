use crate::adapters::session::{Session, SessionStore};
use crate::config::toml_config::ApiConfig;
use crate::core::{PlanSource, Storage};
use crate::domain::model::{Lot, Plan, Product, Stage};
use crate::utils::error::{FeedError, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Plan>),
    One(Plan),
}

/// Typed client for the farm backend. Adds the stored bearer token to every
/// request except those under a public path prefix.
pub struct ApiClient<S: Storage> {
    client: Client,
    base_url: String,
    public_paths: Vec<String>,
    sessions: SessionStore<S>,
}

impl<S: Storage> ApiClient<S> {
    pub fn new(config: &ApiConfig, sessions: SessionStore<S>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_paths: config.public_paths.clone(),
            sessions,
        })
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, "application/json");

        if self.is_public(path) {
            return Ok(builder);
        }

        match self.sessions.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => {
                tracing::debug!("No stored session for protected path {}", path);
                Err(FeedError::Unauthorized)
            }
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = FeedError::from_status(status.as_u16(), &body);
        if matches!(error, FeedError::Unauthorized) {
            tracing::warn!("🔒 Session rejected by the server, clearing stored token");
            if let Err(e) = self.sessions.clear().await {
                tracing::warn!("⚠️ Could not clear the stored session: {}", e);
            }
        }
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("GET {}", path);
        let response = self.send(self.request(Method::GET, path).await?).await?;
        Self::decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("{} {}", method, path);
        let builder = self.request(method, path).await?.json(body);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let response: LoginResponse = self
            .send_json(
                Method::POST,
                "/auth/login",
                &LoginRequest { username, password },
            )
            .await?;

        let session = Session {
            token: response.token,
            username: username.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.sessions.save(&session).await?;
        tracing::info!("🔑 Logged in as {}", username);
        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.sessions.clear().await
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        self.get_json("/planes").await
    }

    pub async fn get_plan(&self, plan_id: &str) -> Result<Plan> {
        self.get_json(&format!("/planes/{plan_id}")).await
    }

    /// The plan for an animal type, `None` when the backend has none.
    pub async fn plan_for_animal(&self, animal_id: &str) -> Result<Option<Plan>> {
        let found = match self
            .get_json::<OneOrMany>(&format!("/planes/animal/{animal_id}"))
            .await
        {
            Ok(found) => found,
            Err(FeedError::ApiError { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        match found {
            OneOrMany::One(plan) => Ok(Some(plan)),
            OneOrMany::Many(plans) => {
                if plans.len() > 1 {
                    tracing::warn!(
                        "⚠️ Animal {} has {} plans, using '{}'",
                        animal_id,
                        plans.len(),
                        plans[0].name
                    );
                }
                Ok(plans.into_iter().next())
            }
        }
    }

    pub async fn create_stage(&self, plan_id: &str, stage: &Stage) -> Result<Stage> {
        self.send_json(Method::POST, &format!("/planes/{plan_id}/etapas"), stage)
            .await
    }

    pub async fn update_stage(&self, stage: &Stage) -> Result<Stage> {
        let stage_id = stage.id.as_deref().ok_or_else(|| FeedError::InvalidStage {
            message: "cannot update a stage without an id".to_string(),
        })?;
        self.send_json(Method::PUT, &format!("/etapas/{stage_id}"), stage)
            .await
    }

    pub async fn delete_stage(&self, stage_id: &str) -> Result<()> {
        let path = format!("/etapas/{stage_id}");
        tracing::debug!("DELETE {}", path);
        self.send(self.request(Method::DELETE, &path).await?).await?;
        Ok(())
    }

    pub async fn list_lots(&self) -> Result<Vec<Lot>> {
        self.get_json("/lotes").await
    }

    pub async fn get_lot(&self, lot_id: &str) -> Result<Lot> {
        self.get_json(&format!("/lotes/{lot_id}")).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.get_json("/productos").await
    }
}

#[async_trait::async_trait]
impl<S: Storage> PlanSource for ApiClient<S> {
    async fn fetch_lots(&self) -> Result<Vec<Lot>> {
        self.list_lots().await
    }

    async fn fetch_plan_for_animal(&self, animal_id: &str) -> Result<Option<Plan>> {
        self.plan_for_animal(animal_id).await
    }

    async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.list_products().await
    }
}
