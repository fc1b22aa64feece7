use crate::application::use_cases::catalog_llm::{FixCategoryInput, FixSpecInput};
use crate::domain::catalog_row::{BatchRowOutput, CatalogRow};
use crate::domain::error::AppError;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info, warn};
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;
const MAX_BATCH_ROWS: u64 = 1000;
const JSON_LIMIT_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

// ---- request / response bodies ----

#[derive(Debug, Deserialize, Validate)]
pub struct PredictItemRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictItemResponse {
    pub item_pred: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FixCategoryRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub rag_categories: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FixCategoryResponse {
    pub category_fixed: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FixSpecRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[serde(default)]
    pub spec_pred: String,
    #[serde(default)]
    pub item_pred: String,
    #[serde(default)]
    pub category_fixed: String,
    #[serde(default)]
    pub spec_patterns: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FixSpecResponse {
    pub spec_pred_fixed: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveMultiItemsRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub spec_pred_fixed: String,
    #[serde(default)]
    pub category_fixed: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveMultiItemsResponse {
    pub spec_pred_remove_items: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateSpecRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub spec_pred_remove_items: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateSpecResponse {
    pub spec_pred_fixed_validated: String,
}

fn default_post_process() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct FixBatchRequest {
    #[validate(length(max = MAX_BATCH_ROWS, message = "too many rows in one batch"))]
    pub rows: Vec<CatalogRow>,
    #[serde(default = "default_post_process")]
    pub post_process: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

// ---- handlers ----

#[get("/health")]
async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model: data.catalog_llm.model().to_string(),
    })
}

#[post("/item/predict")]
async fn predict_item(data: web::Data<AppState>, req: web::Json<PredictItemRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    match data.catalog_llm.predict_item(&req.description).await {
        Ok(item_pred) => HttpResponse::Ok().json(PredictItemResponse { item_pred }),
        Err(e) => failed(&data, "Item prediction", e),
    }
}

#[post("/category/fix")]
async fn fix_category(data: web::Data<AppState>, req: web::Json<FixCategoryRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    let input = FixCategoryInput {
        description: &req.description,
        category: &req.category,
        item: &req.item,
        rag_categories: &req.rag_categories,
    };
    match data.catalog_llm.fix_category(input).await {
        Ok(category_fixed) => HttpResponse::Ok().json(FixCategoryResponse { category_fixed }),
        Err(e) => failed(&data, "Category fix", e),
    }
}

#[post("/spec/fix")]
async fn fix_spec(data: web::Data<AppState>, req: web::Json<FixSpecRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    let input = FixSpecInput {
        description: &req.description,
        spec_pred: &req.spec_pred,
        item_pred: &req.item_pred,
        category_fixed: &req.category_fixed,
        spec_patterns: &req.spec_patterns,
    };
    match data.catalog_llm.fix_spec(input).await {
        Ok(spec_pred_fixed) => HttpResponse::Ok().json(FixSpecResponse { spec_pred_fixed }),
        Err(e) => failed(&data, "Spec fix", e),
    }
}

#[post("/spec/remove-multi-items")]
async fn remove_multi_items(
    data: web::Data<AppState>,
    req: web::Json<RemoveMultiItemsRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    match data
        .catalog_llm
        .remove_multi_items(&req.description, &req.spec_pred_fixed, &req.category_fixed)
        .await
    {
        Ok(spec_pred_remove_items) => {
            HttpResponse::Ok().json(RemoveMultiItemsResponse { spec_pred_remove_items })
        }
        Err(e) => failed(&data, "Item de-duplication", e),
    }
}

#[post("/spec/validate")]
async fn validate_spec(data: web::Data<AppState>, req: web::Json<ValidateSpecRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    match data
        .catalog_llm
        .validate_spec(&req.description, &req.spec_pred_remove_items)
        .await
    {
        Ok(spec_pred_fixed_validated) => {
            HttpResponse::Ok().json(ValidateSpecResponse { spec_pred_fixed_validated })
        }
        Err(e) => failed(&data, "Spec validation", e),
    }
}

#[post("/pipeline/fix-row")]
async fn fix_row(data: web::Data<AppState>, row: web::Json<CatalogRow>) -> impl Responder {
    let result = data.batch.fix_one(&row).await;
    HttpResponse::Ok().json(result)
}

#[post("/pipeline/fix-batch")]
async fn fix_batch(data: web::Data<AppState>, req: web::Json<FixBatchRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return rejected(&data, AppError::from(e));
    }

    let FixBatchRequest { rows, post_process } = req.into_inner();
    let total = rows.len();
    add_log(
        &data.logs,
        "INFO",
        "Pipeline",
        &format!(
            "Fixing batch of {} rows (concurrency={} post_process={})",
            total,
            data.batch.concurrency(),
            post_process
        ),
    );

    let results = data.batch.fix_rows(rows).await;
    let changed = results
        .iter()
        .filter(|r| r.spec_changed || r.category_changed)
        .count();
    add_log(
        &data.logs,
        "INFO",
        "Pipeline",
        &format!("Batch done: {} of {} rows changed", changed, total),
    );

    let output: Vec<BatchRowOutput> = results
        .into_iter()
        .map(|result| BatchRowOutput::from_result(result, post_process))
        .collect();
    HttpResponse::Ok().json(output)
}

#[get("/logs")]
async fn get_logs(data: web::Data<AppState>) -> impl Responder {
    match data.logs.lock() {
        Ok(logs) => HttpResponse::Ok().json(&*logs),
        Err(_) => AppError::Internal("log buffer poisoned".to_string()).error_response(),
    }
}

fn rejected(data: &AppState, err: AppError) -> HttpResponse {
    warn!(error = %err, "Rejected request");
    add_log(&data.logs, "WARN", "HttpApi", &err.to_string());
    err.error_response()
}

fn failed(data: &AppState, what: &str, err: AppError) -> HttpResponse {
    error!(error = %err, "{} failed", what);
    add_log(
        &data.logs,
        "ERROR",
        "HttpApi",
        &format!("{} failed: {}", what, err),
    );
    err.error_response()
}

// ---- log buffer ----

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    // A poisoned buffer still holds valid entries.
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

// ---- server ----

/// Routes and extractor settings, shared by the server and the endpoint tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .service(health)
    .service(predict_item)
    .service(fix_category)
    .service(fix_spec)
    .service(remove_multi_items)
    .service(validate_spec)
    .service(fix_row)
    .service(fix_batch)
    .service(get_logs);
}

pub fn start_server(state: web::Data<AppState>, host: &str, port: u16) -> std::io::Result<Server> {
    info!(host, port, "Starting HTTP server");
    add_log(
        &state.logs,
        "INFO",
        "HttpApi",
        &format!("Listening on {}:{}", host, port),
    );

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
