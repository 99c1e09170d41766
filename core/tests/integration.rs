//! End-to-end runs of the controller and resource adapter against the live
//! mock server.
//!
//! # Design
//! Starts the mock server on a random port, then performs every round trip
//! over real HTTP with ureq. The controller never sees the network; the test
//! plays the host, executing tickets and reporting responses back.

use std::sync::Arc;
use std::time::Duration;

use backoffice_core::{
    ApiError, ControllerConfig, Feedback, FilterState, HttpMethod, HttpRequest, HttpResponse,
    ListController, Locations, NewLocation, LocationUpdate, Outcome, PermissionSnapshot,
    ResourceClient,
};
use tokio::time::Instant;

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's status-code-as-error behavior so 4xx/5xx responses come
/// back as data for the core to classify.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.url).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.url).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.url).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.url).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.url).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.url).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse::new(status, body)
}

fn start_server(seed: Vec<mock_server::NewLocation>) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, seed).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn seed(count: usize) -> Vec<mock_server::NewLocation> {
    (1..=count)
        .map(|n| mock_server::NewLocation {
            name: if n % 5 == 0 {
                format!("Dubai Tower {n}")
            } else {
                format!("Residence {n}")
            },
            area: if n % 2 == 0 { "Dubai" } else { "Sharjah" }.to_string(),
        })
        .collect()
}

fn controller(base: &str, config: ControllerConfig, filters: FilterState) -> ListController<Locations> {
    ListController::new(
        ResourceClient::new(base),
        filters,
        config,
        Arc::new(PermissionSnapshot::new(["locations.view"])),
    )
}

#[test]
fn table_pages_through_results() {
    let base = start_server(seed(25));
    let mut c = controller(&base, ControllerConfig::table(), FilterState::new());

    let ticket = c.mount().unwrap();
    let outcome = c.on_response(ticket.epoch, execute(ticket.request));
    assert_eq!(outcome, Outcome::Applied { received: 10, added: 10 });
    assert_eq!(c.meta().total, 25);

    let ticket = c.on_page_change(3, 10).unwrap();
    assert!(ticket.request.url.ends_with("/locations?page=3&perPage=10"));
    c.on_response(ticket.epoch, execute(ticket.request));
    let ids: Vec<u64> = c.records().iter().map(|l| l.id).collect();
    assert_eq!(ids, (21..=25).collect::<Vec<_>>());
    assert_eq!(c.meta().page, 3);
    assert_eq!(c.meta().total, 25);
}

#[test]
fn debounced_search_then_filter_then_reset() {
    let base = start_server(seed(25));
    let mut c = controller(&base, ControllerConfig::table(), FilterState::new().with("name", ""));
    let ticket = c.mount().unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));

    let start = Instant::now();
    c.on_search("Dub", start);
    c.on_search("Dubai", start + Duration::from_millis(150));
    let ticket = c.poll(start + Duration::from_millis(650)).unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));
    assert_eq!(c.meta().total, 5);
    assert!(c.records().iter().all(|l| l.name.starts_with("Dubai Tower")));

    let ticket = c.on_filter_change("area", vec!["Dubai"]).unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));
    let ids: Vec<u64> = c.records().iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![10, 20]);

    let ticket = c.on_reset().unwrap();
    assert!(ticket.query.get("name").is_none());
    c.on_response(ticket.epoch, execute(ticket.request));
    assert_eq!(c.meta().total, 25);
    assert_eq!(c.records().len(), 10);
}

#[test]
fn picker_keeps_previous_options_across_searches() {
    let base = start_server(seed(25));
    let mut c = controller(&base, ControllerConfig::picker(), FilterState::new());

    let ticket = c.on_filter_change("name", "Residence 1").unwrap();
    assert!(!ticket.query.contains("page"));
    c.on_response(ticket.epoch, execute(ticket.request));
    let first: Vec<u64> = c.records().iter().map(|l| l.id).collect();
    assert!(first.contains(&1));

    let ticket = c.on_filter_change("name", "Tower").unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));
    let ids: Vec<u64> = c.records().iter().map(|l| l.id).collect();
    assert_eq!(&ids[..first.len()], &first[..]);
    assert!(ids.contains(&25));
}

#[test]
fn out_of_order_responses_keep_latest() {
    let base = start_server(seed(25));
    let mut c = controller(&base, ControllerConfig::table(), FilterState::new());

    let older = c.on_filter_change("area", vec!["Sharjah"]).unwrap();
    let newer = c.on_filter_change("area", vec!["Dubai"]).unwrap();
    let newer_response = execute(newer.request);
    let older_response = execute(older.request);

    assert!(matches!(c.on_response(newer.epoch, newer_response), Outcome::Applied { .. }));
    assert_eq!(c.on_response(older.epoch, older_response), Outcome::Stale);
    assert!(c.records().iter().all(|l| l.area == "Dubai"));
    assert_eq!(c.meta().total, 12);
}

#[test]
fn crud_lifecycle_with_post_save_refresh() {
    let base = start_server(Vec::new());
    let client: ResourceClient<Locations> = ResourceClient::new(&base);
    let mut c = controller(&base, ControllerConfig::table(), FilterState::new());
    let ticket = c.mount().unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));
    assert!(c.records().is_empty());

    // create, then reload the table
    let req = client
        .build_create(&NewLocation {
            name: "Arabian Ranches".to_string(),
            area: "Dubai".to_string(),
        })
        .unwrap();
    let created = client.parse_create(execute(req)).unwrap();
    let ticket = c.on_refresh().unwrap();
    c.on_response(ticket.epoch, execute(ticket.request));
    assert_eq!(c.records(), &[created.clone()]);

    // rejected edit maps to field annotations
    let req = client
        .build_update(
            &created.id,
            &LocationUpdate {
                name: Some(String::new()),
                area: None,
            },
        )
        .unwrap();
    let err = client.parse_update(execute(req)).unwrap_err();
    let Feedback::Fields(fields) = err.feedback() else {
        panic!("expected field errors, got {err:?}");
    };
    assert_eq!(fields["name"], vec!["Name is required"]);

    // delete, then fetch the record again
    let req = client.build_delete(&created.id);
    client.parse_delete(execute(req)).unwrap();
    let err = client.parse_get(execute(client.build_get(&created.id))).unwrap_err();
    assert_eq!(
        err,
        ApiError::NotFound {
            message: Some("Location not found".to_string()),
        }
    );
    assert_eq!(
        err.feedback(),
        Feedback::Notify("Location not found".to_string())
    );
}
