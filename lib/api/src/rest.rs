use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use simrec_core::{
    CatalogEntry, Error, ItemId, RecommendOptions, Recommendation, SharedEngine,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Deserialize)]
struct RecommendQuery {
    top_n: Option<usize>,
    min_similarity: Option<f32>,
}

#[derive(Deserialize)]
struct BatchRequest {
    ids: Vec<ItemId>,
    top_n: Option<usize>,
    min_similarity: Option<f32>,
}

#[derive(Serialize)]
struct BatchItem {
    item_id: ItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Vec<Recommendation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `{"result": ..}` body; scores keep their `f32` rendering
#[derive(Serialize)]
struct ResultResponse<T> {
    result: T,
}

#[derive(Serialize)]
struct FeatureInfo {
    name: String,
    dim: usize,
    nnz: usize,
}

#[derive(Serialize)]
struct ItemInfo {
    item_id: ItemId,
    name: String,
    features: Vec<FeatureInfo>,
}

impl From<&CatalogEntry> for ItemInfo {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            item_id: entry.item_id,
            name: entry.name.clone(),
            features: entry
                .feature_vectors
                .iter()
                .map(|(name, v)| FeatureInfo {
                    name: name.clone(),
                    dim: v.dim(),
                    nnz: v.nnz(),
                })
                .collect(),
        }
    }
}

fn options(top_n: Option<usize>, min_similarity: Option<f32>) -> RecommendOptions {
    let defaults = RecommendOptions::default();
    RecommendOptions {
        top_n: top_n.unwrap_or(defaults.top_n),
        min_similarity: min_similarity.unwrap_or(defaults.min_similarity),
    }
}

/// Map an engine error to a response; data defects are logged, not echoed.
fn error_response(e: &Error) -> HttpResponse {
    match e {
        Error::UnknownItem(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        })),
        Error::InvalidQuery(_) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        })),
        Error::NotReady => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": e.to_string()
        })),
        _ => {
            error!(error = %e, "query failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal error"
            }))
        }
    }
}

fn batch_item_error(e: &Error) -> String {
    if e.is_user_facing() {
        e.to_string()
    } else {
        error!(error = %e, "batch query failed");
        "internal error".to_string()
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(engine: Arc<SharedEngine>, port: u16) -> std::io::Result<()> {
        info!(port, "starting HTTP server");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(engine.clone()))
                .configure(Self::routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/health", web::get().to(health))
            .route("/items/{item_id}", web::get().to(get_item))
            .route(
                "/items/{item_id}/recommendations",
                web::get().to(recommend),
            )
            .route("/recommendations/batch", web::post().to(recommend_batch));
    }
}

async fn health(engine: web::Data<Arc<SharedEngine>>) -> ActixResult<HttpResponse> {
    match engine.get() {
        Ok(engine) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "items": engine.catalog().len()
        }))),
        Err(_) => Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "loading"
        }))),
    }
}

async fn get_item(
    engine: web::Data<Arc<SharedEngine>>,
    path: web::Path<ItemId>,
) -> ActixResult<HttpResponse> {
    let item_id = path.into_inner();
    let engine = match engine.get() {
        Ok(e) => e,
        Err(e) => return Ok(error_response(&e)),
    };

    match engine.catalog().get(item_id) {
        Some(entry) => Ok(HttpResponse::Ok().json(ResultResponse {
            result: ItemInfo::from(entry),
        })),
        None => Ok(error_response(&Error::UnknownItem(item_id))),
    }
}

async fn recommend(
    engine: web::Data<Arc<SharedEngine>>,
    path: web::Path<ItemId>,
    query: web::Query<RecommendQuery>,
) -> ActixResult<HttpResponse> {
    let item_id = path.into_inner();
    let engine = match engine.get() {
        Ok(e) => e,
        Err(e) => return Ok(error_response(&e)),
    };

    match engine.recommend_with(item_id, &options(query.top_n, query.min_similarity)) {
        Ok(result) => Ok(HttpResponse::Ok().json(ResultResponse { result })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn recommend_batch(
    engine: web::Data<Arc<SharedEngine>>,
    req: web::Json<BatchRequest>,
) -> ActixResult<HttpResponse> {
    let engine = match engine.get() {
        Ok(e) => e,
        Err(e) => return Ok(error_response(&e)),
    };

    let opts = options(req.top_n, req.min_similarity);
    if let Err(e) = opts.validate() {
        return Ok(error_response(&e));
    }

    let ids = req.ids.clone();
    let results = web::block(move || engine.recommend_batch(&ids, &opts)).await?;

    let items: Vec<BatchItem> = req
        .ids
        .iter()
        .zip(results)
        .map(|(&item_id, result)| match result {
            Ok(recs) => BatchItem {
                item_id,
                result: Some(recs),
                error: None,
            },
            Err(e) => BatchItem {
                item_id,
                result: None,
                error: Some(batch_item_error(&e)),
            },
        })
        .collect();

    Ok(HttpResponse::Ok().json(ResultResponse { result: items }))
}
