use std::collections::BTreeMap;
use std::sync::Mutex;

use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RosterConfig;
use crate::display::{schedule_rows, summarize, ScheduleRow, ScheduleSummary};
use crate::parser::{read_availability, AvailabilityTable};
use crate::schedule::{compile_blocks, generate_schedules, Person, SearchOutcome};

/// An uploaded poll and the schedules generated from it
pub struct Roster {
    pub table: AvailabilityTable,
    pub outcome: SearchOutcome,
}

pub struct AppState {
    /// Replaced as a whole on each upload
    pub roster: Mutex<Option<Roster>>,
    pub config: RosterConfig,
    pub admin_password: String,
}

impl AppState {
    pub fn new(config: RosterConfig, admin_password: String) -> Self {
        Self {
            roster: Mutex::new(None),
            config,
            admin_password,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Serialize)]
pub struct ScheduleListEntry {
    index: usize,
    score: f64,
    summary: ScheduleSummary,
}

#[derive(Serialize)]
pub struct ScheduleListResponse {
    block_count: usize,
    max_schedules: usize,
    capped: bool,
    schedules: Vec<ScheduleListEntry>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    index: usize,
    score: f64,
    rows: Vec<ScheduleRow>,
    summary: ScheduleSummary,
}

#[derive(Serialize, Default)]
pub struct PersonStats {
    eligible_blocks: u32,
    assigned_blocks: u32,
    schedules_featured: u32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    people: BTreeMap<Person, PersonStats>,
}

fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({"success": false, "error": message})
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(error_json("Invalid password")))
    }
}

// Admin CSV upload endpoint
async fn admin_upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.admin_password {
        warn!("Rejected upload with bad admin password");
        return Ok(HttpResponse::Unauthorized().json(error_json("Unauthorized")));
    }

    let table = match read_availability(body.as_ref(), &state.config.input) {
        Ok(table) => table,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(error_json(&format!("Failed to process CSV: {}", e))))
        }
    };

    // Search runs on the blocking pool
    let config = state.config.clone();
    let roster = web::block(move || {
        let outcome = generate_schedules(&table.slot_availability(), &config);
        Roster { table, outcome }
    })
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?;

    let message = match &roster.outcome {
        SearchOutcome::NoBlocks => "No valid hour blocks found.".to_string(),
        SearchOutcome::Generated {
            schedules,
            max_schedules,
            ..
        } => format!(
            "Generated {} schedules (max {}).",
            schedules.len(),
            max_schedules
        ),
    };
    info!("Upload processed: {}", message);

    *lock(&state.roster)? = Some(roster);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message
    })))
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("state lock poisoned"))
}

// Schedule list endpoint
async fn list_schedules(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = lock(&state.roster)?;
    let Some(Roster { table, outcome }) = roster.as_ref() else {
        return Ok(HttpResponse::NotFound().json(error_json("No data available")));
    };

    let SearchOutcome::Generated {
        schedules,
        block_count,
        max_schedules,
        capped,
    } = outcome
    else {
        return Ok(HttpResponse::NotFound().json(error_json("No valid hour blocks found.")));
    };

    let active = table.active_people();
    let entries = schedules
        .iter()
        .enumerate()
        .map(|(i, ranked)| ScheduleListEntry {
            index: i + 1,
            score: ranked.score,
            summary: summarize(&ranked.schedule, &active),
        })
        .collect();

    Ok(HttpResponse::Ok().json(ScheduleListResponse {
        block_count: *block_count,
        max_schedules: *max_schedules,
        capped: *capped,
        schedules: entries,
    }))
}

// Single schedule endpoint (1-based index)
async fn get_schedule(
    index: web::Path<usize>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let index = index.into_inner();
    let roster = lock(&state.roster)?;
    let Some(Roster { table, outcome }) = roster.as_ref() else {
        return Ok(HttpResponse::NotFound().json(error_json("Schedule not available")));
    };

    let Some(ranked) = index
        .checked_sub(1)
        .and_then(|i| outcome.schedules().get(i))
    else {
        return Ok(HttpResponse::NotFound().json(error_json("Schedule not available")));
    };

    Ok(HttpResponse::Ok().json(ScheduleResponse {
        index,
        score: ranked.score,
        rows: schedule_rows(&ranked.schedule),
        summary: summarize(&ranked.schedule, &table.active_people()),
    }))
}

// Stats endpoint
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = lock(&state.roster)?;
    let Some(Roster { table, outcome }) = roster.as_ref() else {
        return Ok(HttpResponse::NotFound().json(error_json("No data available")));
    };

    let mut people: BTreeMap<Person, PersonStats> = table
        .active_people()
        .into_iter()
        .map(|p| (p, PersonStats::default()))
        .collect();

    let blocks = compile_blocks(&table.slot_availability(), &state.config);
    for block in &blocks.blocks {
        for person in blocks.candidates(block) {
            people.entry(person.clone()).or_default().eligible_blocks += 1;
        }
    }

    for ranked in outcome.schedules() {
        for (person, count) in ranked.schedule.counts() {
            let stats = people.entry(person.to_string()).or_default();
            stats.assigned_blocks += count;
            stats.schedules_featured += 1;
        }
    }

    Ok(HttpResponse::Ok().json(StatsResponse { people }))
}

/// Registers the API routes on an app (shared with tests)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/upload", web::post().to(admin_upload))
        .route("/api/schedules", web::get().to(list_schedules))
        .route("/api/schedules/{index}", web::get().to(get_schedule))
        .route("/api/stats", web::get().to(get_stats));
}

pub async fn start_server(port: u16, config: RosterConfig, admin_password: String) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(config, admin_password));

    info!("Listening on http://0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    const POLL: &str = "\
time,Amy,Ben
2024-03-04 10:00:00,o,o
2024-03-04 10:15:00,o,o
2024-03-04 10:30:00,o,o
2024-03-04 10:45:00,o,o
";

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(RosterConfig::default(), "secret".to_string()))
    }

    #[actix_web::test]
    async fn test_upload_requires_password() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload(POLL)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_upload_then_fetch_schedule() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/schedules").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/upload")
            .insert_header(("X-Admin-Password", "secret"))
            .set_payload(POLL)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/schedules").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["block_count"], 1);
        assert_eq!(body["schedules"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get().uri("/api/schedules/2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rows"][0]["person"], "Ben");
        assert_eq!(body["summary"]["unscheduled"][0], "Amy");

        let req = test::TestRequest::get().uri("/api/schedules/3").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["people"]["Amy"]["eligible_blocks"], 1);
        assert_eq!(body["people"]["Amy"]["assigned_blocks"], 1);
    }

    #[actix_web::test]
    async fn test_login() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(serde_json::json!({"password": "wrong"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_reupload_replaces_table_and_schedules_together() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let second = "\
time,Cat
2024-03-05 10:00:00,o
2024-03-05 10:15:00,o
2024-03-05 10:30:00,o
2024-03-05 10:45:00,o
";
        for poll in [POLL, second] {
            let req = test::TestRequest::post()
                .uri("/api/upload")
                .insert_header(("X-Admin-Password", "secret"))
                .set_payload(poll)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/api/schedules").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let schedules = body["schedules"].as_array().unwrap();
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0]["summary"]["active"], 1);
        assert_eq!(schedules[0]["summary"]["scheduled"], 1);

        let req = test::TestRequest::get().uri("/api/schedules/1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rows"][0]["time"], "2024-03-05 10:00:00");
        assert_eq!(body["rows"][0]["person"], "Cat");

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let people = body["people"].as_object().unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(body["people"]["Cat"]["assigned_blocks"], 1);
    }
}
