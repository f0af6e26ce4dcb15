//! Route table and request handlers.

use crate::error::{Error, Result};
use crate::session::{
    expired_session_cookie, require_login, safe_redirect_target, session_cookie, session_token,
    Session,
};
use crate::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Form, Json, Router};
use kok_data::edit::{build_edit_grid, EditGrid};
use kok_data::form::MeasurementForm;
use kok_data::{build_pivot, MeasurementFamily, PivotTable, Station, StationFilters};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

/// Station list with the filter choices derived from it.
#[derive(Debug, Serialize)]
pub struct StationIndex {
    pub stations: Vec<Station>,
    pub filters: StationFilters,
}

/// One station with its water and soil pivot tables.
#[derive(Debug, Serialize)]
pub struct StationDetail {
    pub station: Station,
    pub water: PivotTable,
    pub soil: PivotTable,
}

/// Pre-filled content of the edit form.
#[derive(Debug, Serialize)]
pub struct EditForm {
    pub station: Station,
    pub water: EditGrid,
    pub soil: EditGrid,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/add-station", post(add_station))
        .route("/edit-station/{code}", get(edit_station_form).post(edit_station))
        .route("/delete-station/{code}", delete(delete_station))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route("/", get(index))
        .route("/api/stations", get(api_stations))
        .route("/test", get(liveness))
        .route("/station/{code}", get(station_detail))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .merge(guarded)
        .layer(cors())
        .with_state(state)
}

/// Run a database call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(f)
        .await
        .map_err(anyhow::Error::from)?;
    Ok(joined?)
}

/// Any origin may call the API; preflight requests are answered here.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

// ───────────────────── Public ─────────────────────

async fn index(State(state): State<AppState>) -> Result<Json<StationIndex>> {
    let db = state.db.clone();
    let stations = blocking(move || db.query_stations()).await?;
    let filters = StationFilters::from_stations(&stations);
    Ok(Json(StationIndex { stations, filters }))
}

async fn api_stations(State(state): State<AppState>) -> Result<Json<Vec<Station>>> {
    let db = state.db.clone();
    Ok(Json(blocking(move || db.query_stations()).await?))
}

async fn liveness() -> &'static str {
    "kok-web is working!"
}

async fn station_detail(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StationDetail>> {
    let db = state.db.clone();
    let lookup = code.clone();
    let detail = blocking(move || {
        let Some(station) = db.query_station(&lookup)? else {
            return Ok(None);
        };
        let water = db.query_measurements(MeasurementFamily::Water, &lookup)?;
        let soil = db.query_measurements(MeasurementFamily::Soil, &lookup)?;
        Ok(Some(StationDetail {
            station,
            water: build_pivot(&water, MeasurementFamily::Water.is_unit_bearing()),
            soil: build_pivot(&soil, MeasurementFamily::Soil.is_unit_bearing()),
        }))
    })
    .await?;
    detail.map(Json).ok_or(Error::NotFound(code))
}

async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let db = state.db.clone();
    let username = form.username.clone();
    let user = blocking(move || db.query_user(&username)).await?;

    match user {
        Some(user) if user.password_matches(&form.password) => {
            let token = state.sessions.create(&user.username);
            log::info!("login: {} signed in", user.username);
            let target = safe_redirect_target(query.next.as_deref());
            Ok((
                [(header::SET_COOKIE, session_cookie(&token))],
                Redirect::to(target),
            )
                .into_response())
        }
        _ => {
            log::info!("login: rejected credentials for {}", form.username);
            Err(Error::Unauthorized(
                "invalid username or password".to_string(),
            ))
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = session_token(&headers).and_then(|t| state.sessions.remove(&t)) {
        log::info!("logout: {} signed out", session.username);
    }
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

// ───────────────────── Login required ─────────────────────

async fn add_station(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Value>> {
    let form = MeasurementForm::from_pairs(pairs);
    let fields = form.station_fields()?;
    if fields.station.is_empty() {
        return Err(Error::BadRequest("station code must not be empty".to_string()));
    }

    let db = state.db.clone();
    let code = fields.station.clone();
    blocking(move || {
        let water = form.records(MeasurementFamily::Water);
        let soil = form.records(MeasurementFamily::Soil);
        db.insert_station(&fields, &water, &soil)
    })
    .await?;
    log::info!("{} added station {}", session.username, code);
    Ok(success())
}

async fn edit_station_form(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<EditForm>> {
    let db = state.db.clone();
    let lookup = code.clone();
    let form = blocking(move || {
        let Some(station) = db.query_station(&lookup)? else {
            return Ok(None);
        };
        let water = db.query_measurements(MeasurementFamily::Water, &lookup)?;
        let soil = db.query_measurements(MeasurementFamily::Soil, &lookup)?;
        Ok(Some(EditForm {
            station,
            water: build_edit_grid(&water, MeasurementFamily::Water),
            soil: build_edit_grid(&soil, MeasurementFamily::Soil),
        }))
    })
    .await?;
    form.map(Json).ok_or(Error::NotFound(code))
}

async fn edit_station(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(code): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Value>> {
    let form = MeasurementForm::from_pairs(pairs);
    let fields = form.station_fields()?;
    if fields.station.is_empty() {
        return Err(Error::BadRequest("station code must not be empty".to_string()));
    }

    let db = state.db.clone();
    let lookup = code.clone();
    let updated = blocking(move || {
        let water = form.records(MeasurementFamily::Water);
        let soil = form.records(MeasurementFamily::Soil);
        db.update_station(&lookup, &fields, &water, &soil)
    })
    .await?;
    if !updated {
        return Err(Error::NotFound(code));
    }
    log::info!("{} edited station {}", session.username, code.trim());
    Ok(success())
}

async fn delete_station(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(code): Path<String>,
) -> Result<Json<Value>> {
    let db = state.db.clone();
    let lookup = code.clone();
    let removed = blocking(move || db.delete_station(&lookup)).await?;
    log::info!(
        "{} deleted station {} ({} rows)",
        session.username,
        code.trim(),
        removed
    );
    Ok(success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request, StatusCode};
    use kok_db::Database;
    use tower::ServiceExt;

    fn sample_state() -> AppState {
        let db = Database::new().unwrap();
        db.load_stations(
            "\
station,river,location,tambon,amphoe,province
KK01,Kok,Bridge,Rim Kok,Mueang,Chiang Rai
SA01,Sai,Border,Wiang Phang Kham,Mae Sai,Chiang Rai
",
        )
        .unwrap();
        db.load_measurements(
            MeasurementFamily::Water,
            "\
station,parameter,unit,check_number,value,numeric_value
KK01,pH,pH units,check 1,7.2,7.2
KK01,pH,pH units,check 2,,
KK01,DO,mg/L,check 1,5,5
",
        )
        .unwrap();
        db.load_measurements(
            MeasurementFamily::Soil,
            "station,parameter,check_number,value\nKK01,Pb,ครั้งที่ 1,12\n",
        )
        .unwrap();
        db.create_user("admin", "secret").unwrap();
        AppState::new(db)
    }

    async fn send(state: &AppState, req: Request<Body>) -> Response {
        router(state.clone()).oneshot(req).await.unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_request(method: Method, uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("kok_session={}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    const STATION_FORM: &str = "station=KK05&river=Kok&location=Pier&tambon=Rim+Kok\
&amphoe=Mueang&province=Chiang+Rai\
&parameter%5B%5D=pH&parameter%5B%5D=BOD&unit%5B%5D=-&unit%5B%5D=mg%2FL\
&check1%5B%5D=7.0&check1%5B%5D=%3C1&check2%5B%5D=7.1\
&soil_parameter%5B%5D=Pb&soil_check1%5B%5D=ND";

    #[tokio::test]
    async fn liveness_has_cors_headers() {
        let state = sample_state();
        let req = Request::builder()
            .uri("/test")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            HeaderValue::from_static("*")
        );
    }

    #[tokio::test]
    async fn preflight_for_guarded_delete_is_answered() {
        let state = sample_state();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/delete-station/KK01")
            .header(header::ORIGIN, "http://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .body(Body::empty())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            HeaderValue::from_static("*")
        );
        let methods = resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("DELETE"));
        assert!(state.db.query_station("KK01").unwrap().is_some());
    }

    #[tokio::test]
    async fn index_lists_stations_and_filters() {
        let state = sample_state();
        let body = json_body(send(&state, get("/")).await).await;
        assert_eq!(body["stations"].as_array().unwrap().len(), 2);
        assert_eq!(body["filters"]["rivers"], json!(["Kok", "Sai"]));
        assert_eq!(
            body["filters"]["location_hierarchy"]["Chiang Rai"]["Mueang"],
            json!(["Rim Kok"])
        );
    }

    #[tokio::test]
    async fn api_stations_returns_plain_list() {
        let state = sample_state();
        let body = json_body(send(&state, get("/api/stations")).await).await;
        assert_eq!(body[0]["station"], "KK01");
        assert_eq!(body[1]["station"], "SA01");
    }

    #[tokio::test]
    async fn station_detail_contains_pivots() {
        let state = sample_state();
        let resp = send(&state, get("/station/KK01")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;

        assert_eq!(body["station"]["river"], "Kok");
        assert_eq!(body["water"]["check_indices"], json!([1, 2]));
        assert_eq!(body["water"]["rows"][0]["parameter"], "DO");
        assert_eq!(body["water"]["rows"][0]["values"], json!(["5", null]));
        assert_eq!(body["water"]["rows"][0]["numeric_values"], json!([5.0, 0.0]));
        assert_eq!(body["water"]["rows"][1]["parameter"], "pH");
        assert_eq!(body["water"]["rows"][1]["unit"], "pH units");
        assert_eq!(body["soil"]["rows"][0]["parameter"], "Pb");
        assert_eq!(body["soil"]["rows"][0]["unit"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_station_is_404() {
        let state = sample_state();
        let resp = send(&state, get("/station/XX99")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "station not found: XX99");
    }

    #[tokio::test]
    async fn login_sets_cookie_and_redirects() {
        let state = sample_state();
        let resp = send(
            &state,
            form_request(
                Method::POST,
                "/login?next=/edit-station/KK01",
                "username=admin&password=secret",
                None,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/edit-station/KK01");
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("kok_session="));
        let token = cookie
            .trim_start_matches("kok_session=")
            .split(';')
            .next()
            .unwrap();
        assert_eq!(state.sessions.get(token).unwrap().username, "admin");
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let state = sample_state();
        let resp = send(
            &state,
            form_request(Method::POST, "/login", "username=admin&password=nope", None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_ends_session() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let req = Request::builder()
            .uri("/logout")
            .header(header::COOKIE, format!("kok_session={}", token))
            .body(Body::empty())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
        assert!(state.sessions.get(&token).is_none());
    }

    #[tokio::test]
    async fn guarded_routes_redirect_anonymous_users() {
        let state = sample_state();
        let resp = send(&state, get("/edit-station/KK01")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login?next=/edit-station/KK01");

        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/delete-station/KK01")
            .body(Body::empty())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(state.db.query_station("KK01").unwrap().is_some());
    }

    #[tokio::test]
    async fn add_station_stores_both_families() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let resp = send(
            &state,
            form_request(Method::POST, "/add-station", STATION_FORM, Some(&token)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({ "success": true }));

        let water = state
            .db
            .query_measurements(MeasurementFamily::Water, "KK05")
            .unwrap();
        assert_eq!(water.len(), 3);
        assert_eq!(water[1].parameter, "BOD");
        assert_eq!(water[1].raw_value.as_deref(), Some("<1"));
        assert_eq!(water[1].numeric_value, Some(0.0));
        assert_eq!(water[1].unit.as_deref(), Some("mg/L"));

        let soil = state
            .db
            .query_measurements(MeasurementFamily::Soil, "KK05")
            .unwrap();
        assert_eq!(soil.len(), 1);
        assert_eq!(soil[0].numeric_value, None);
    }

    #[tokio::test]
    async fn add_station_requires_station_fields() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let resp = send(
            &state,
            form_request(Method::POST, "/add-station", "station=KK06", Some(&token)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.db.query_station("KK06").unwrap().is_none());
    }

    #[tokio::test]
    async fn add_station_ignores_oversized_check_count() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let body = format!("{}&water_check_count={}", STATION_FORM, usize::MAX);
        let resp = send(
            &state,
            form_request(Method::POST, "/add-station", &body, Some(&token)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let water = state
            .db
            .query_measurements(MeasurementFamily::Water, "KK05")
            .unwrap();
        assert_eq!(water.len(), 3);
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let req = Request::builder()
            .uri("/edit-station/KK01")
            .header(header::COOKIE, format!("kok_session={}", token))
            .body(Body::empty())
            .unwrap();
        let body = json_body(send(&state, req).await).await;
        assert_eq!(body["station"]["station"], "KK01");
        assert_eq!(body["water"]["rows"][0]["parameter"], "pH");
        assert_eq!(body["water"]["rows"][0]["checks"]["1"], "7.2");
        assert_eq!(body["water"]["check_count"], 2);
        assert_eq!(body["soil"]["check_count"], 1);
    }

    #[tokio::test]
    async fn edit_station_replaces_records() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let resp = send(
            &state,
            form_request(Method::POST, "/edit-station/KK01", STATION_FORM, Some(&token)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert!(state.db.query_station("KK01").unwrap().is_none());
        let station = state.db.query_station("KK05").unwrap().unwrap();
        assert_eq!(station.fields.location, "Pier");
        let water = state
            .db
            .query_measurements(MeasurementFamily::Water, "KK05")
            .unwrap();
        assert_eq!(water.len(), 3);
    }

    #[tokio::test]
    async fn edit_unknown_station_is_404() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let resp = send(
            &state,
            form_request(Method::POST, "/edit-station/XX99", STATION_FORM, Some(&token)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(state.db.query_station("KK05").unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_station_removes_everything() {
        let state = sample_state();
        let token = state.sessions.create("admin");
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/delete-station/KK01")
            .header(header::COOKIE, format!("kok_session={}", token))
            .body(Body::empty())
            .unwrap();
        let resp = send(&state, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.db.query_station("KK01").unwrap().is_none());
        assert!(state
            .db
            .query_measurements(MeasurementFamily::Water, "KK01")
            .unwrap()
            .is_empty());
    }
}
