//! Integration tests for `ApiClient` against a wiremock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use assert2::{check, let_assert};
use satchel::{
    ApiClient, ClientConfig, Empty, Error, Form, IntoOutcome, MemoryTokenStore, Method, Outcome,
    QueryParams, Result, SessionState, TokenStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Student {
    id: u64,
    name: String,
}

/// Token store that counts how often it was cleared.
#[derive(Clone, Default)]
struct CountingStore {
    inner: MemoryTokenStore,
    clears: Arc<AtomicUsize>,
}

impl TokenStore for CountingStore {
    fn load(&self) -> Result<Option<String>> {
        self.inner.load()
    }

    fn save(&self, token: &str) -> Result<()> {
        self.inner.save(token)
    }

    fn clear(&self) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear()
    }
}

/// Token store holding a token it refuses to remove.
#[derive(Clone)]
struct StuckStore(String);

impl TokenStore for StuckStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }

    fn save(&self, _token: &str) -> Result<()> {
        Err(Error::token_store("read-only"))
    }

    fn clear(&self) -> Result<()> {
        Err(Error::token_store("read-only"))
    }
}

/// Routes the client asked to navigate to.
#[derive(Clone, Default)]
struct Visits(Arc<Mutex<Vec<String>>>);

impl Visits {
    fn routes(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl satchel::Navigator for Visits {
    fn navigate(&self, route: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(format!("{}/api", server.uri())).expect("config")
}

fn client(server: &MockServer, store: impl TokenStore + 'static) -> ApiClient {
    ApiClient::builder(config(server))
        .token_store(store)
        .without_logging()
        .build()
}

async fn received_header(server: &MockServer, name: &str) -> Option<String> {
    let requests = server.received_requests().await.expect("recording enabled");
    let request = requests.last().expect("one request");
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn get_decodes_json() {
    let server = MockServer::start().await;
    let student = Student {
        id: 7,
        name: "Ada".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/api/students/7/"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&student))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let fetched: Student = api.get("/students/7/").await.expect("student");
    check!(fetched == student);
}

#[tokio::test]
async fn empty_query_values_are_omitted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/students/"))
        .and(query_param("class_id", "12"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let params = QueryParams::new()
        .param("search", "")
        .param("grade", None::<u8>)
        .param("class_id", 12)
        .param("active", true);
    let _: Vec<Student> = api.get_query("/students/", &params).await.expect("list");

    let requests = server.received_requests().await.expect("recording enabled");
    let_assert!([request] = requests.as_slice());
    check!(request.url.query() == Some("class_id=12&active=true"));
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    let draft = json!({"name": "Grace", "class_id": 3});

    Mock::given(method("POST"))
        .and(path("/api/students/"))
        .and(header("content-type", "application/json"))
        .and(body_json(&draft))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "Grace"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let created: Student = api.post("/students/", &draft).await.expect("created");
    check!(created.id == 9);
}

#[tokio::test]
async fn put_patch_and_post_empty() {
    let server = MockServer::start().await;

    for verb in ["PUT", "PATCH"] {
        Mock::given(method(verb))
            .and(path("/api/students/9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "G"})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/api/students/9/archive/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"archived": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let body = json!({"name": "G"});
    let _: Student = api.put("/students/9/", &body).await.expect("put");
    let _: Student = api.patch("/students/9/", &body).await.expect("patch");
    let archived: Value = api.post_empty("/students/9/archive/").await.expect("post");
    check!(archived == json!({"archived": true}));
}

#[tokio::test]
async fn no_content_decodes_as_empty_object() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/students/9/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let deleted: Empty = api.delete("/students/9/").await.expect("delete");
    check!(deleted == Empty {});
    let deleted: Value = api.delete("/students/9/").await.expect("delete");
    check!(deleted == json!({}));
}

#[tokio::test]
async fn every_typed_call_accepts_no_content() {
    let server = MockServer::start().await;

    for verb in ["GET", "POST", "PUT", "PATCH"] {
        Mock::given(method(verb))
            .and(path("/api/attendance/3/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
    }

    let api = client(&server, MemoryTokenStore::new());
    let mark = json!({"present": true});
    let filter = QueryParams::new().param("day", "2026-10-05");

    let got: Empty = api.get("/attendance/3/").await.expect("get");
    check!(got == Empty {});
    let got: Value = api.get_query("/attendance/3/", &filter).await.expect("get_query");
    check!(got == json!({}));
    let got: Empty = api.post("/attendance/3/", &mark).await.expect("post");
    check!(got == Empty {});
    let got: Empty = api.post_empty("/attendance/3/").await.expect("post_empty");
    check!(got == Empty {});
    let got: Value = api.put("/attendance/3/", &mark).await.expect("put");
    check!(got == json!({}));
    let got: Empty = api.patch("/attendance/3/", &mark).await.expect("patch");
    check!(got == Empty {});
    let got: Vec<Student> = api.get_list("/attendance/3/", &filter).await.expect("list");
    check!(got.is_empty());
}

#[tokio::test]
async fn custom_call_merges_headers() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/enrollments/4/"))
        .and(query_param("notify", "false"))
        .and(header("if-match", "\"v3\""))
        .and(body_json(json!({"status": "withdrawn"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "withdrawn"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let updated: Value = api
        .request(Method::Patch, "/enrollments/4/")
        .query(&QueryParams::new().param("notify", false))
        .header("If-Match", "\"v3\"")
        .json(&json!({"status": "withdrawn"}))
        .send()
        .await
        .expect("patch");
    check!(updated["status"] == "withdrawn");
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn bearer_header_only_with_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());

    let _: Value = api.get("/me/").await.expect("anonymous");
    check!(received_header(&server, "authorization").await.is_none());

    api.set_token(Some("tok-abc")).expect("set token");
    check!(api.state() == SessionState::Authenticated);
    let _: Value = api.get("/me/").await.expect("signed in");
    check!(received_header(&server, "authorization").await.as_deref() == Some("Bearer tok-abc"));

    api.set_token(None).expect("sign out");
    check!(api.token().is_none());
    let _: Value = api.get("/me/").await.expect("signed out");
    check!(received_header(&server, "authorization").await.is_none());
}

#[tokio::test]
async fn token_survives_reload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me/"))
        .and(header("authorization", "Bearer persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryTokenStore::new();
    client(&server, store.clone())
        .set_token(Some("persisted"))
        .expect("set token");

    let reloaded = client(&server, store);
    check!(reloaded.token().as_deref() == Some("persisted"));
    let _: Value = reloaded.get("/me/").await.expect("me");
}

#[tokio::test]
async fn unauthorized_signs_out_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/invoices/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Authentication credentials were not provided."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = CountingStore::default();
    store.save("expired").expect("seed");
    let visits = Visits::default();

    let api = ApiClient::builder(config(&server))
        .token_store(store.clone())
        .navigator(visits.clone())
        .without_logging()
        .build();

    let_assert!(Err(err) = api.get::<Value>("/invoices/").await);
    check!(err.status() == Some(401));
    check!(err.is_unauthorized());
    check!(err.message() == Some("Authentication credentials were not provided."));

    check!(store.clears.load(Ordering::SeqCst) == 1);
    check!(visits.routes() == vec!["/login".to_string()]);
    check!(store.load().expect("load").is_none());
    check!(api.state() == SessionState::Unauthenticated);
}

#[tokio::test]
async fn unauthorized_download_and_list_sign_out_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    for (label, blob) in [("blob", true), ("list", false)] {
        let store = CountingStore::default();
        store.save("expired").expect("seed");
        let visits = Visits::default();
        let api = ApiClient::builder(config(&server))
            .token_store(store.clone())
            .navigator(visits.clone())
            .without_logging()
            .build();

        let err = if blob {
            api.get_blob("/reports/term.pdf").await.expect_err("blob 401")
        } else {
            api.get_list::<Student>("/students/", &QueryParams::new())
                .await
                .expect_err("list 401")
        };

        check!(err.is_unauthorized(), "{label}");
        check!(store.clears.load(Ordering::SeqCst) == 1, "{label}");
        check!(visits.routes() == vec!["/login".to_string()], "{label}");
        check!(api.token().is_none(), "{label}");
    }
}

#[tokio::test]
async fn unauthorized_stops_sending_token_even_if_store_keeps_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me/"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/public/terms/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, StuckStore("expired".to_string()));
    let_assert!(Err(err) = api.get::<Value>("/me/").await);
    check!(err.is_unauthorized());
    check!(api.token().is_none());
    check!(api.state() == SessionState::Unauthenticated);

    let _: Value = api.get("/public/terms/").await.expect("anonymous");
    check!(received_header(&server, "authorization").await.is_none());
}

#[tokio::test]
async fn empty_token_sends_no_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::with_token("old"));
    api.set_token(Some("")).expect("clear");
    check!(api.token().is_none());
    check!(api.state() == SessionState::Unauthenticated);

    let _: Value = api.get("/me/").await.expect("anonymous");
    check!(received_header(&server, "authorization").await.is_none());
}

#[tokio::test]
async fn unauthorized_uses_configured_login_route() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let visits = Visits::default();
    let config = ClientConfig::builder(server.uri())
        .login_route("/staff/sign-in")
        .build()
        .expect("config");
    let api = ApiClient::builder(config)
        .navigator(visits.clone())
        .without_logging()
        .build();

    let outcome = api.get::<Value>("/me/").await.into_outcome();
    let_assert!(Outcome::Unauthorized(err) = outcome);
    check!(err.message() == Some("Unauthorized"));
    check!(visits.routes() == vec!["/staff/sign-in".to_string()]);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn bad_request_uses_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/payments/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad input"})))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::with_token("tok"));
    let_assert!(Err(err) = api.post::<Value, _>("/payments/", &json!({"amount": -1})).await);

    check!(err.status() == Some(400));
    check!(err.message() == Some("bad input"));
    check!(err.payload() == Some(&json!({"detail": "bad input"})));
    // Only a 401 ends the session
    check!(api.token().as_deref() == Some("tok"));
}

#[tokio::test]
async fn html_error_page_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_raw("<html><body>Server Error (500)</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let_assert!(Err(err) = api.get::<Value>("/reports/").await);

    check!(err.status() == Some(500));
    check!(err.message() == Some("Internal Server Error"));
    check!(err.payload() == Some(&json!({})));
    let_assert!(Outcome::ServerError(_) = Err::<(), _>(err).into_outcome());
}

#[tokio::test]
async fn decode_error_reports_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/students/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "one", "name": "A"})))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let_assert!(
        Err(Error::JsonDeserialization { path, .. }) = api.get::<Student>("/students/1/").await
    );
    check!(path == "id");
}

#[tokio::test]
async fn connection_failure_is_not_http_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let config = ClientConfig::new(format!("http://127.0.0.1:{port}")).expect("config");
    let visits = Visits::default();
    let api = ApiClient::builder(config)
        .token_store(MemoryTokenStore::with_token("tok"))
        .navigator(visits.clone())
        .without_logging()
        .build();

    let_assert!(Err(err) = api.get::<Value>("/me/").await);
    check!(err.is_transport());
    check!(err.status().is_none());
    check!(api.token().as_deref() == Some("tok"));
    check!(visits.routes().is_empty());
}

// ============================================================================
// Uploads, downloads and lists
// ============================================================================

#[tokio::test]
async fn form_upload_is_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::with_token("tok"));
    let form = Form::new()
        .text("title", "Consent form")
        .file("file", "consent.pdf", b"%PDF-1.4".to_vec());

    let created: Value = api
        .request(Method::Post, "/documents/")
        .header("Content-Type", "application/json")
        .send_form(form)
        .await
        .expect("upload");
    check!(created == json!({"id": 5}));

    let content_type = received_header(&server, "content-type").await.expect("set");
    check!(content_type.starts_with("multipart/form-data; boundary="));

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    check!(body.contains("name=\"title\""));
    check!(body.contains("filename=\"consent.pdf\""));
    check!(body.contains("Content-Type: application/pdf"));
}

#[tokio::test]
async fn post_form_data_never_sends_json_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/imports/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let form = Form::new().file("roster", "roster.csv", "id,name\n1,Ada\n");
    let _: Empty = api.post_form_data("/imports/", form).await.expect("import");

    let content_type = received_header(&server, "content-type").await.expect("set");
    check!(!content_type.contains("application/json"));
}

#[tokio::test]
async fn blob_download_keeps_bytes() {
    let server = MockServer::start().await;
    let csv = "id,name\n1,Ada\n2,Grace\n";

    Mock::given(method("GET"))
        .and(path("/api/students/export/"))
        .and(query_param("format", "csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(csv, "text/csv")
                .insert_header("Content-Disposition", "attachment; filename=\"students.csv\""),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let blob = api
        .get_blob_query(
            "/students/export/",
            &QueryParams::new().param("format", "csv").param("class_id", ""),
        )
        .await
        .expect("download");

    check!(blob.data().as_ref() == csv.as_bytes());
    check!(blob.content_type() == Some("text/csv"));
    check!(blob.filename() == Some("students.csv"));
}

#[tokio::test]
async fn blob_download_error_is_typed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/term.pdf"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let_assert!(Err(err) = api.get_blob("/reports/term.pdf").await);
    check!(err.status() == Some(404));
    check!(err.message() == Some("Not found."));
}

#[tokio::test]
async fn lists_accept_every_envelope() {
    let server = MockServer::start().await;
    let students = json!([{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}]);

    Mock::given(method("GET"))
        .and(path("/api/paged/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"count": 2, "next": null, "previous": null, "results": students}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wrapped/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": students})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bare/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&students))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/null/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let none = QueryParams::new();
    for endpoint in ["/paged/", "/wrapped/", "/bare/"] {
        let list: Vec<Student> = api.get_list(endpoint, &none).await.expect("list");
        check!(list.len() == 2, "endpoint {endpoint}");
        check!(list[1].name == "Grace");
    }
    let empty: Vec<Student> = api.get_list("/null/", &none).await.expect("null list");
    check!(empty.is_empty());
}

#[tokio::test]
async fn list_decode_error_names_the_item() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/students/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"results": [{"id": 1, "name": "Ada"}, {"id": "two", "name": "Grace"}]}),
        ))
        .mount(&server)
        .await;

    let api = client(&server, MemoryTokenStore::new());
    let_assert!(
        Err(Error::JsonDeserialization { path, .. }) =
            api.get_list::<Student>("/students/", &QueryParams::new()).await
    );
    check!(path == "results[1].id");
}
