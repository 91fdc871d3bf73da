//! Truss Opt HTTP Server

use axum::{
    extract::Json,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

use truss_opt::prelude::*;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ModelData {
    material: Material,
    nodes: Vec<Node>,
    bars: Vec<Bar>,
    supports: Vec<SupportData>,
    #[serde(default)]
    node_loads: Vec<NodeLoadData>,
}

#[derive(Debug, Deserialize)]
struct SupportData {
    node: usize,
    /// Constrained local DOFs, 0 = x and 1 = y
    dofs: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct NodeLoadData {
    node: usize,
    #[serde(default)]
    fx: f64,
    #[serde(default)]
    fy: f64,
}

#[derive(Debug, Deserialize)]
struct DesignRequest {
    model: ModelData,
    areas: Vec<f64>,
    #[serde(default)]
    options: AnalysisOptions,
}

#[derive(Debug, Deserialize)]
struct HessianRequest {
    model: ModelData,
    areas: Vec<f64>,
    direction: Vec<f64>,
    #[serde(default)]
    options: AnalysisOptions,
}

#[derive(Debug, Deserialize)]
struct FullyStressedRequest {
    model: ModelData,
    areas: Vec<f64>,
    #[serde(default)]
    options: AnalysisOptions,
    #[serde(default)]
    fully_stressed: FullyStressedOptions,
}

#[derive(Debug, Serialize)]
struct AnalysisResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<T>,
}

#[derive(Debug, Serialize)]
struct EvaluateResult {
    response: Response,
    summary: EvaluationSummary,
}

#[derive(Debug, Serialize)]
struct GradientResult {
    compliance: Vec<f64>,
    mass: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct HessianResult {
    product: Vec<f64>,
}

fn build_model(data: ModelData) -> TrussResult<TrussModel> {
    let mut model = TrussModel::new(data.material);

    for node in data.nodes {
        model.add_node(node);
    }

    for bar in data.bars {
        model.add_bar(bar)?;
    }

    for sup in data.supports {
        model.add_support(sup.node, Support::from_dofs(&sup.dofs)?)?;
    }

    for load in data.node_loads {
        model.add_node_load(load.node, NodeLoad::new(load.fx, load.fy))?;
    }

    Ok(model)
}

fn respond<T: Serialize>(outcome: TrussResult<T>) -> (StatusCode, Json<AnalysisResponse<T>>) {
    match outcome {
        Ok(results) => (
            StatusCode::OK,
            Json(AnalysisResponse {
                success: true,
                error: None,
                results: Some(results),
            }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(AnalysisResponse {
                success: false,
                error: Some(e.to_string()),
                results: None,
            }),
        ),
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn evaluate(Json(request): Json<DesignRequest>) -> impl IntoResponse {
    respond(run_evaluate(request))
}

fn run_evaluate(request: DesignRequest) -> TrussResult<EvaluateResult> {
    let model = build_model(request.model)?;
    let state = TrussAnalysis::with_options(&model, request.options).solve(&request.areas)?;
    Ok(EvaluateResult {
        response: state.response(),
        summary: state.summary(),
    })
}

async fn gradient(Json(request): Json<DesignRequest>) -> impl IntoResponse {
    respond(run_gradient(request))
}

fn run_gradient(request: DesignRequest) -> TrussResult<GradientResult> {
    let model = build_model(request.model)?;
    let state = TrussAnalysis::with_options(&model, request.options).solve(&request.areas)?;
    Ok(GradientResult {
        compliance: state.compliance_gradient(),
        mass: state.mass_gradient(),
    })
}

async fn hessian_vector(Json(request): Json<HessianRequest>) -> impl IntoResponse {
    respond(run_hessian_vector(request))
}

fn run_hessian_vector(request: HessianRequest) -> TrussResult<HessianResult> {
    let model = build_model(request.model)?;
    let product = TrussAnalysis::with_options(&model, request.options)
        .hessian_vector_product(&request.areas, &request.direction)?;
    Ok(HessianResult { product })
}

async fn report(Json(request): Json<DesignRequest>) -> impl IntoResponse {
    respond(run_report(request))
}

fn run_report(request: DesignRequest) -> TrussResult<TrussReport> {
    let model = build_model(request.model)?;
    TrussAnalysis::with_options(&model, request.options).report(&request.areas)
}

async fn fully_stressed(Json(request): Json<FullyStressedRequest>) -> impl IntoResponse {
    respond(run_fully_stressed(request))
}

fn run_fully_stressed(request: FullyStressedRequest) -> TrussResult<FullyStressedDesign> {
    let model = build_model(request.model)?;
    TrussAnalysis::with_options(&model, request.options)
        .fully_stressed(&request.areas, &request.fully_stressed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/evaluate", post(evaluate))
        .route("/api/v1/gradient", post(gradient))
        .route("/api/v1/hessian-vector", post(hessian_vector))
        .route("/api/v1/report", post(report))
        .route("/api/v1/fully-stressed", post(fully_stressed))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8086));
    info!("Truss Opt Server listening on http://{}", addr);
    println!("Truss Opt Server listening on http://{}", addr);
    println!("  Health check:   GET  /health");
    println!("  Evaluate:       POST /api/v1/evaluate");
    println!("  Gradient:       POST /api/v1/gradient");
    println!("  Hessian-vector: POST /api/v1/hessian-vector");
    println!("  Report:         POST /api/v1/report");
    println!("  Fully-stressed: POST /api/v1/fully-stressed");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
