//! HTTP surface of the dashboard.

use crate::dashboard::dataset::Dataset;
use crate::dashboard::html::render_html;
use crate::dashboard::view::{run_dashboard, DashboardPage, Selections};
use crate::error::DashboardError;
use crate::frames::error::DataError;
use crate::i18n::Locale;
use crate::live::client::{TemperatureClient, DEFAULT_API_URL};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use bon::Builder;
use log::info;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

const DEFAULT_UPLOAD_NAME: &str = "upload.csv";

/// Settings for [`serve`].
#[derive(Debug, Clone, Builder)]
pub struct ServerConfig {
    #[builder(default = SocketAddr::from(([127, 0, 0, 1], 8501)))]
    pub bind: SocketAddr,
    #[builder(default = DEFAULT_API_URL.to_string(), into)]
    pub api_url: String,
    #[builder(default)]
    pub locale: Locale,
    #[builder(default = 64 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

/// State shared by all handlers. One dataset slot serves every visitor.
#[derive(Debug, Clone)]
pub struct AppState {
    dataset: Arc<RwLock<Option<Arc<Dataset>>>>,
    client: TemperatureClient,
    locale: Locale,
}

impl AppState {
    pub fn new(client: TemperatureClient, locale: Locale) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(None)),
            client,
            locale,
        }
    }

    /// Handle to the current dataset. The lock is released before returning.
    pub async fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().await.clone()
    }

    pub async fn replace_dataset(&self, dataset: Dataset) {
        *self.dataset.write().await = Some(Arc::new(dataset));
    }

    async fn render(&self, selections: Selections) -> DashboardPage {
        let dataset = self.dataset().await;
        let today = chrono::Local::now().date_naive();
        match run_dashboard(
            dataset,
            selections.clone(),
            &self.client,
            today,
            self.locale,
        )
        .await
        {
            Ok(page) => page,
            Err(e) => {
                let mut page = DashboardPage::empty(selections, self.locale);
                page.push_error(&e);
                page
            }
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(show_dashboard).post(apply_selections))
        .route("/upload", post(upload))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Binds `config.bind` and serves the dashboard until the process stops.
pub async fn serve(config: ServerConfig) -> Result<(), DashboardError> {
    let client = TemperatureClient::builder()
        .base_url(config.api_url.clone())
        .build();
    let app = router(AppState::new(client, config.locale), config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| DashboardError::Bind(config.bind, e))?;
    info!(
        "Dashboard listening on http://{} (locale {}, weather API {})",
        config.bind, config.locale, config.api_url
    );
    axum::serve(listener, app)
        .await
        .map_err(DashboardError::Serve)
}

async fn show_dashboard(State(state): State<AppState>) -> Html<String> {
    Html(render_html(&state.render(Selections::default()).await))
}

async fn apply_selections(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Html<String> {
    let selections = Selections::from_pairs(pairs);
    Html(render_html(&state.render(selections).await))
}

/// Replaces the dataset with the uploaded CSV. A rejected upload keeps the
/// previous dataset and is reported on the page.
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let stored = match read_upload(&mut multipart).await {
        Ok((name, bytes)) => prepare_upload(name, bytes).await.map_err(DashboardError::from),
        Err(e) => Err(e),
    };

    match stored {
        Ok(dataset) => {
            state.replace_dataset(dataset).await;
            Html(render_html(&state.render(Selections::default()).await)).into_response()
        }
        Err(e) => {
            let mut page = state.render(Selections::default()).await;
            page.push_error(&e);
            (StatusCode::BAD_REQUEST, Html(render_html(&page))).into_response()
        }
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), DashboardError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let bytes = field.bytes().await?;
        info!("Received upload '{}' ({} bytes)", name, bytes.len());
        return Ok((name, bytes.to_vec()));
    }
    Err(DashboardError::MissingUpload)
}

/// Parsing and preparation are CPU-bound, so they run on the blocking pool.
async fn prepare_upload(name: String, bytes: Vec<u8>) -> Result<Dataset, DataError> {
    tokio::task::spawn_blocking(move || Dataset::from_csv_bytes(name, bytes)).await?
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    dataset_loaded: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        dataset_loaded: state.dataset().await.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::test_support::spawn_fake_provider;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    const BOUNDARY: &str = "meteodash-test-boundary";

    fn app(client: TemperatureClient) -> Router {
        router(AppState::new(client, Locale::English), 1024 * 1024)
    }

    fn upload_request(csv: &str) -> Result<Request<Body>, axum::http::Error> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"observations.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
    }

    fn form_request(form: &str) -> Result<Request<Body>, axum::http::Error> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
    }

    async fn body_text(response: Response) -> Result<String, Box<dyn std::error::Error>> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    const CSV: &str = "city,timestamp,temperature,season\n\
                       London,2020-01-01,5.0,winter\n\
                       London,2020-01-02,6.0,winter\n\
                       Berlin,2020-01-01,1.0,winter\n\
                       Berlin,2020-01-02,2.0,winter\n";

    #[tokio::test]
    async fn test_index_before_upload() -> Result<(), Box<dyn std::error::Error>> {
        let response = app(TemperatureClient::default())
            .oneshot(Request::get("/").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await?.contains("Upload a CSV file to analyse."));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_then_select_city() -> Result<(), Box<dyn std::error::Error>> {
        let app = app(TemperatureClient::default());

        let response = app.clone().oneshot(upload_request(CSV)?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await?;
        assert!(html.contains("observations.csv"));
        assert!(html.contains("General information"));

        let response = app
            .clone()
            .oneshot(form_request("tab=city&mode=single&city=Berlin")?)
            .await?;
        let html = body_text(response).await?;
        assert!(html.contains("Coordinates of Berlin"));
        assert!(html.contains("Data for Berlin"));
        assert!(!html.contains("Data for London"));

        let response = app
            .oneshot(form_request("tab=city&mode=multiple&cities=Berlin&cities=London")?)
            .await?;
        let html = body_text(response).await?;
        assert!(html.contains("Data for Berlin"));
        assert!(html.contains("Data for London"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_upload_keeps_previous_dataset() -> Result<(), Box<dyn std::error::Error>> {
        let app = app(TemperatureClient::default());
        app.clone().oneshot(upload_request(CSV)?).await?;

        let response = app
            .clone()
            .oneshot(upload_request("city,timestamp,temperature\nLondon,2020-01-01,5.0\n")?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await?;
        assert!(html.contains("season"));
        // The page still shows the earlier upload.
        assert!(html.contains("observations.csv"));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty())?)
            .await?;
        let health: serde_json::Value = serde_json::from_str(&body_text(response).await?)?;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["dataset_loaded"], true);
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_without_file_field() -> Result<(), Box<dyn std::error::Error>> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))?;
        let response = app(TemperatureClient::default()).oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await?.contains("no &#39;file&#39; field"));
        Ok(())
    }

    #[tokio::test]
    async fn test_api_key_triggers_live_section() -> Result<(), Box<dyn std::error::Error>> {
        let client = TemperatureClient::builder()
            .base_url(spawn_fake_provider().await?)
            .build();
        let app = app(client);
        app.clone().oneshot(upload_request(CSV)?).await?;

        let response = app.oneshot(form_request("api_key=key")?).await?;
        let html = body_text(response).await?;
        assert!(html.contains("Current temperature in London: 30 °C"));
        assert!(html.contains("Current temperature in Berlin: 4.5 °C"));
        Ok(())
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::builder().build();
        assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], 8501)));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.locale, Locale::Russian);
        assert_eq!(config.max_upload_bytes, 64 * 1024 * 1024);
    }
}
