//! Generic request builder and response parser for one REST resource.
//!
//! # Design
//! Each back-office resource is a marker type implementing `Resource`, which
//! names its path and payload types. `ResourceClient<R>` holds only
//! `base_url`, and every operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes the
//! host's `HttpResponse`. No network access happens here.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::Query;
use crate::types::{Faq, FaqUpdate, Identified, Location, LocationUpdate, NewFaq, NewLocation, Page};

/// A REST collection with uniform list/get/create/update/delete operations.
pub trait Resource {
    /// Collection path relative to the API base, without slashes.
    const PATH: &'static str;

    type Record: Identified + DeserializeOwned;
    type Create: Serialize;
    type Update: Serialize;
}

/// Identity key of a resource's records.
pub type KeyOf<R> = <<R as Resource>::Record as Identified>::Key;

pub struct Locations;

impl Resource for Locations {
    const PATH: &'static str = "locations";
    type Record = Location;
    type Create = NewLocation;
    type Update = LocationUpdate;
}

pub struct Faqs;

impl Resource for Faqs {
    const PATH: &'static str = "faqs";
    type Record = Faq;
    type Create = NewFaq;
    type Update = FaqUpdate;
}

pub struct ResourceClient<R> {
    base_url: String,
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("base_url", &self.base_url)
            .field("path", &R::PATH)
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            resource: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, R::PATH)
    }

    fn record_url(&self, id: &KeyOf<R>) -> String {
        format!("{}/{}/{id}", self.base_url, R::PATH)
    }

    pub fn build_list(&self, query: &Query) -> HttpRequest {
        let mut url = self.collection_url();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.encode());
        }
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get(&self, id: &KeyOf<R>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.record_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, input: &R::Create) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.collection_url(),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_update(&self, id: &KeyOf<R>, input: &R::Update) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.record_url(id),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_delete(&self, id: &KeyOf<R>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.record_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Page<R::Record>, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        check_status(&response, 201)?;
        from_json(&response.body)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<R::Record, ApiError> {
        check_status(&response, 200)?;
        from_json(&response.body)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Anything but the expected status is classified from the body.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        Ok(())
    } else {
        Err(ApiError::from_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterState, PageRequest, QueryBuilder};

    fn locations() -> ResourceClient<Locations> {
        ResourceClient::new("http://localhost:3000/api")
    }

    #[test]
    fn build_list_without_query_has_no_question_mark() {
        let req = locations().build_list(&Query::default());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/locations");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_appends_encoded_query() {
        let query = QueryBuilder::build(
            &FilterState::new().with("name", "Dubai").with("area", ""),
            Some(PageRequest { page: 2, per_page: 10 }),
        );
        let req = locations().build_list(&query);
        assert_eq!(
            req.url,
            "http://localhost:3000/api/locations?name=Dubai&page=2&perPage=10"
        );
    }

    #[test]
    fn build_get_uses_record_key() {
        let req = ResourceClient::<Faqs>::new("http://x").build_get(&42);
        assert_eq!(req.url, "http://x/faqs/42");
    }

    #[test]
    fn build_create_sends_json() {
        let input = NewFaq {
            question: "Is there a fee?".to_string(),
            answer: "Two percent".to_string(),
            is_published: true,
        };
        let req = ResourceClient::<Faqs>::new("http://x").build_create(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.headers, json_headers());
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["isPublished"], true);
    }

    #[test]
    fn build_update_sends_only_present_fields() {
        let input = LocationUpdate {
            name: Some("JLT".to_string()),
            area: None,
        };
        let req = locations().build_update(&7, &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/api/locations/7");
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"JLT"}"#));
    }

    #[test]
    fn build_delete_has_no_body() {
        let req = locations().build_delete(&7);
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = ResourceClient::<Locations>::new("http://localhost:3000/").build_get(&1);
        assert_eq!(req.url, "http://localhost:3000/locations/1");
    }

    #[test]
    fn parse_list_reads_envelope() {
        let page = locations()
            .parse_list(HttpResponse::new(
                200,
                r#"{"data":[{"id":1,"name":"Marina","area":"Dubai"}],"meta":{"page":1,"perPage":10,"total":1}}"#,
            ))
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.per_page, 10);
    }

    #[test]
    fn parse_list_rejects_bare_array() {
        let err = locations().parse_list(HttpResponse::new(200, "[]")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_create_surfaces_validation() {
        let err = locations()
            .parse_create(HttpResponse::new(
                422,
                r#"{"message":[{"field":"name","message":"Name is required"}]}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref f) if f[0].field == "name"));
    }

    #[test]
    fn parse_get_not_found() {
        let err = locations().parse_get(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { message: None }));
    }

    #[test]
    fn parse_delete_expects_no_content() {
        assert!(locations().parse_delete(HttpResponse::new(204, "")).is_ok());
        let err = locations().parse_delete(HttpResponse::new(200, "")).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 200, .. }));
    }
}
