use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub area: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub area: String,
}

#[derive(Deserialize)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub area: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Location>,
    pub meta: Meta,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    locations: BTreeMap<u64, Location>,
}

impl Store {
    fn insert(&mut self, input: NewLocation) -> Location {
        self.next_id += 1;
        let location = Location {
            id: self.next_id,
            name: input.name,
            area: input.area,
        };
        self.locations.insert(location.id, location.clone());
        location
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Failure bodies in the shape the back-office client classifies.
pub enum Failure {
    NotFound,
    Invalid(Vec<(&'static str, &'static str)>),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Location not found" })),
            )
                .into_response(),
            Failure::Invalid(fields) => {
                let message: Vec<_> = fields
                    .into_iter()
                    .map(|(field, message)| json!({ "field": field, "message": message }))
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "message": message })),
                )
                    .into_response()
            }
        }
    }
}

pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router whose store starts with `seed`, assigned ids 1, 2, ...
pub fn app_with(seed: Vec<NewLocation>) -> Router {
    let mut store = Store::default();
    for input in seed {
        store.insert(input);
    }
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Vec::new()).await
}

pub async fn run_with(listener: TcpListener, seed: Vec<NewLocation>) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, seeded = seed.len(), "mock list endpoint listening");
    }
    axum::serve(listener, app_with(seed)).await
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    pub name: Option<String>,
    pub areas: Vec<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    /// Parse a raw query string, accepting `area[]` repeated pairs.
    pub fn parse(raw: &str) -> Self {
        let mut params = ListParams::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "name" => params.name = Some(value.into_owned()),
                "area[]" | "area" => params.areas.push(value.into_owned()),
                "page" => params.page = value.parse().ok(),
                "perPage" => params.per_page = value.parse().ok(),
                _ => {}
            }
        }
        params
    }

    fn matches(&self, location: &Location) -> bool {
        let name_ok = self.name.as_deref().is_none_or(|needle| {
            location
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let area_ok = self.areas.is_empty() || self.areas.iter().any(|a| *a == location.area);
        name_ok && area_ok
    }
}

async fn list_locations(State(db): State<Db>, RawQuery(raw): RawQuery) -> Json<ListResponse> {
    let params = ListParams::parse(raw.as_deref().unwrap_or_default());
    debug!(?params, "list locations");
    let store = db.read().await;
    let matching: Vec<Location> = store
        .locations
        .values()
        .filter(|l| params.matches(l))
        .cloned()
        .collect();
    let total = matching.len() as u64;

    let (data, meta) = match params.page {
        Some(page) => {
            let page = page.max(1);
            let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
            let skip = (page as usize - 1) * per_page as usize;
            let data = matching.into_iter().skip(skip).take(per_page as usize).collect();
            (data, Meta { page, per_page, total })
        }
        None => (
            matching,
            Meta {
                page: 1,
                per_page: u32::try_from(total).unwrap_or(u32::MAX).max(1),
                total,
            },
        ),
    };
    Json(ListResponse { data, meta })
}

fn validate(name: Option<&str>, area: Option<&str>) -> Result<(), Failure> {
    let mut problems = Vec::new();
    if name.is_some_and(|n| n.trim().is_empty()) {
        problems.push(("name", "Name is required"));
    }
    if area.is_some_and(|a| a.trim().is_empty()) {
        problems.push(("area", "Area is required"));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Failure::Invalid(problems))
    }
}

async fn create_location(
    State(db): State<Db>,
    Json(input): Json<NewLocation>,
) -> Result<(StatusCode, Json<Location>), Failure> {
    validate(Some(&input.name), Some(&input.area))?;
    let location = db.write().await.insert(input);
    Ok((StatusCode::CREATED, Json(location)))
}

async fn get_location(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Location>, Failure> {
    let store = db.read().await;
    store.locations.get(&id).cloned().map(Json).ok_or(Failure::NotFound)
}

async fn update_location(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<LocationUpdate>,
) -> Result<Json<Location>, Failure> {
    let mut store = db.write().await;
    let location = store.locations.get_mut(&id).ok_or(Failure::NotFound)?;
    validate(input.name.as_deref(), input.area.as_deref())?;
    if let Some(name) = input.name {
        location.name = name;
    }
    if let Some(area) = input.area {
        location.area = area;
    }
    Ok(Json(location.clone()))
}

async fn delete_location(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store
        .locations
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Failure::NotFound)
}
