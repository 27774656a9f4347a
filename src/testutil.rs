//! In-process stand-in for the upstream catalog API.

use axum::{
    Json, Router,
    extract::{Path, RawQuery, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    hits: Arc<AtomicUsize>,
    last_headers: Arc<Mutex<HashMap<String, String>>>,
    last_uri: Arc<Mutex<String>>,
}

pub struct FakeApi {
    pub base: String,
    recorder: Recorder,
}

impl FakeApi {
    pub async fn spawn() -> Self {
        let recorder = Recorder::default();
        let router = routes()
            .layer(middleware::from_fn_with_state(recorder.clone(), record))
            .with_state(recorder.clone());
        let base = serve(router).await;
        Self { base, recorder }
    }

    pub fn hits(&self) -> usize {
        self.recorder.hits.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> HashMap<String, String> {
        self.recorder.last_headers.lock().unwrap().clone()
    }

    pub fn last_uri(&self) -> String {
        self.recorder.last_uri.lock().unwrap().clone()
    }
}

pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on.
pub async fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    recorder.hits.fetch_add(1, Ordering::SeqCst);
    *recorder.last_uri.lock().unwrap() = request.uri().to_string();
    let headers = request
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    *recorder.last_headers.lock().unwrap() = headers;
    next.run(request).await
}

fn routes() -> Router<Recorder> {
    Router::new()
        .route("/api/mangas", get(list_mangas))
        .route("/api/mangas/search", get(search_mangas))
        .route("/api/mangas/{id}", get(get_manga))
        .route("/api/chapters/manga/{id}", get(chapter_page))
        .route("/api/chapters/manga/{id}/all", get(all_chapters))
        .route("/api/chapters/{id}", get(get_chapter))
        .route("/api/pages/chapter/{id}", get(page_page))
        .route("/api/pages/chapter/{id}/all", get(all_pages))
        .route("/api/genres/manga/{id}", get(|| async { Json(json!([{"id": 1, "name": "Action"}])) }))
        .route("/api/genres/search", get(|| async { Json(json!([manga(1, "Naruto")])) }))
        .route(
            "/api/metadata/manga/{id}",
            get(|| async { Json(json!([{"author": "Kishimoto"}])) }),
        )
        .route("/api/broken", get(|| async { "<html>gateway page</html>" }))
        .route("/api/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
}

pub fn manga(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "synopsis": "A ninja story",
        "imageUrl": format!("https://cdn.test/{id}.jpg"),
        "imageBase64": null,
        "mangaLink": format!("https://source.test/{id}"),
        "status": "Completo",
        "createdAt": "2024-01-01T00:00:00",
        "updatedAt": "2024-01-01T00:00:00",
        "genres": [],
        "totalChapters": 2
    })
}

fn chapter(id: i64) -> Value {
    json!({
        "id": id,
        "mangaId": 1,
        "chapterNumber": format!("Capitulo {id}"),
        "chapterLink": "",
        "chapterDate": "2024-01-01",
        "createdAt": "2024-01-01T00:00:00",
        "totalPages": 3
    })
}

fn page(id: i64, number: u32) -> Value {
    json!({
        "id": id,
        "pageNumber": number,
        "imageUrl": format!("https://cdn.test/p{id}.jpg"),
        "imageData": null,
        "chapterId": 10
    })
}

fn paginated(content: Vec<Value>, total_pages: u32, query: Option<String>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "totalPages": total_pages,
        "totalElements": total as u32 * total_pages,
        "size": 15,
        "number": 0,
        "first": true,
        "last": total_pages <= 1,
        "empty": total == 0,
        "query": query,
    })
}

async fn list_mangas(RawQuery(query): RawQuery) -> Json<Value> {
    Json(paginated(vec![manga(1, "Naruto"), manga(2, "Bleach")], 3, query))
}

async fn search_mangas(RawQuery(query): RawQuery) -> Json<Value> {
    Json(paginated(vec![manga(1, "Naruto")], 1, query))
}

async fn get_manga(Path(id): Path<i64>) -> Response {
    if id == 404 {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(manga(id, "Naruto")).into_response()
}

async fn chapter_page(RawQuery(query): RawQuery) -> Json<Value> {
    Json(paginated(vec![chapter(10), chapter(11)], 1, query))
}

async fn all_chapters() -> Json<Value> {
    Json(json!([chapter(10), chapter(11)]))
}

async fn get_chapter(Path(id): Path<i64>) -> Response {
    if id == 404 {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(chapter(id)).into_response()
}

async fn page_page(RawQuery(query): RawQuery) -> Json<Value> {
    Json(paginated(vec![page(1, 1), page(2, 2), page(3, 3)], 1, query))
}

async fn all_pages() -> Json<Value> {
    Json(json!([page(3, 3), page(1, 1), page(2, 2)]))
}
