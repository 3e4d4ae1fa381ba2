//! In-process registry double served over real HTTP.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use verigov_lookup::config::ProviderConfig;
use verigov_lookup::providers::FieldMapping;

/// How the fake answers the next requests
#[derive(Debug, Clone)]
pub enum Behavior {
    /// publica.cnpj.ws layout, status "Ativa"
    Publica,
    /// BrasilAPI layout, status "BAIXADA"
    BrasilApi,
    Status(u16),
    /// Publica body after a delay
    Slow(Duration),
    /// 200 with an HTML body
    NotJson,
}

#[derive(Debug)]
struct RegistryState {
    behavior: Mutex<Behavior>,
    hits: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct FakeRegistry {
    addr: SocketAddr,
    state: Arc<RegistryState>,
}

impl FakeRegistry {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(RegistryState {
            behavior: Mutex::new(behavior),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/cnpj/:cnpj", get(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake registry");
        let addr = listener.local_addr().expect("fake registry address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake registry server");
        });

        Self { addr, state }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn url_template(&self) -> String {
        format!("http://{}/cnpj/{{cnpj}}", self.addr)
    }

    pub fn provider_config(&self, tag: &str, timeout_ms: u64) -> ProviderConfig {
        ProviderConfig {
            tag: tag.to_string(),
            url_template: self.url_template(),
            timeout_ms,
            mapping: FieldMapping::default(),
        }
    }
}

async fn handle(State(state): State<Arc<RegistryState>>, Path(cnpj): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let behavior = state.behavior.lock().unwrap().clone();

    match behavior {
        Behavior::Publica => Json(publica_body(&cnpj)).into_response(),
        Behavior::BrasilApi => Json(json!({
            "cnpj": cnpj,
            "razao_social": "EMPRESA FECHADA SA",
            "situacao_cadastral": 8,
            "descricao_situacao_cadastral": "BAIXADA",
            "data_inicio_atividade": "1999-12-31"
        }))
        .into_response(),
        Behavior::Status(code) => StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        Behavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(publica_body(&cnpj)).into_response()
        }
        Behavior::NotJson => (StatusCode::OK, "<html>maintenance</html>").into_response(),
    }
}

fn publica_body(cnpj: &str) -> serde_json::Value {
    json!({
        "razao_social": "EMPRESA ATIVA LTDA",
        "estabelecimento": {
            "cnpj": cnpj,
            "situacao_cadastral": "Ativa",
            "data_inicio_atividade": "2015-03-02T00:00:00Z"
        }
    })
}
