//! Export class rosters as CSV files.
//!
//! Reads `SATCHEL_API_URL` (and optionally `SATCHEL_LOGIN_ROUTE`) from the
//! environment or a `.env` file. The session token is kept in
//! `ROSTER_DATA_DIR` (default `.roster-export`); when no token is stored the
//! tool signs in with `ROSTER_USERNAME` and `ROSTER_PASSWORD`.
//!
//! Every class gets one `<out>/<filename>.csv`. When `ROSTER_IMPORT_FILE` is
//! set, that CSV is uploaded to the student import endpoint first.

use std::path::{Path, PathBuf};

use satchel::prelude::*;
use tracing::{info, warn};

const DEFAULT_DATA_DIR: &str = ".roster-export";
const DEFAULT_OUT_DIR: &str = "rosters";

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Class {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ImportSummary {
    #[serde(default)]
    created: u64,
    #[serde(default)]
    updated: u64,
}

type DemoResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> DemoResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let data_dir = env_or("ROSTER_DATA_DIR", DEFAULT_DATA_DIR);
    let out_dir = PathBuf::from(env_or("ROSTER_OUT_DIR", DEFAULT_OUT_DIR));

    let api = ApiClient::builder(ClientConfig::from_env()?)
        .token_store(FileTokenStore::in_dir(&data_dir))
        .navigator(|route: &str| {
            warn!(route, "session expired; remove the stored token and sign in again");
        })
        .build();

    if api.state() == SessionState::Unauthenticated {
        sign_in(&api).await?;
    }

    if let Ok(file) = std::env::var("ROSTER_IMPORT_FILE") {
        import_students(&api, Path::new(&file)).await?;
    }

    let classes = match api
        .get_list::<Class>("/classes/", &QueryParams::new().param("active", true))
        .await
        .into_outcome()
    {
        Outcome::Success(classes) => classes,
        Outcome::Unauthorized(_) => {
            warn!("stored session was rejected, run again to sign in");
            return Ok(());
        }
        Outcome::Rejected(err) | Outcome::ServerError(err) | Outcome::Failed(err) => {
            return Err(err.into());
        }
    };

    std::fs::create_dir_all(&out_dir)?;
    for class in &classes {
        export_class(&api, class, &out_dir).await?;
    }

    info!(count = classes.len(), out = %out_dir.display(), "export finished");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roster_export=debug,satchel=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

// ============================================================================
// Steps
// ============================================================================

async fn sign_in(api: &ApiClient) -> DemoResult<()> {
    let credentials = Credentials {
        username: std::env::var("ROSTER_USERNAME")?,
        password: std::env::var("ROSTER_PASSWORD")?,
    };

    let login: LoginResponse = api.post("/auth/login/", &credentials).await?;
    api.set_token(Some(&login.token))?;
    info!(user = %credentials.username, "signed in");
    Ok(())
}

async fn import_students(api: &ApiClient, file: &Path) -> DemoResult<()> {
    let filename = file
        .file_name()
        .map_or_else(|| "students.csv".into(), |name| name.to_string_lossy());
    let form = Form::new()
        .text("dry_run", "false")
        .file("file", filename.into_owned(), std::fs::read(file)?);

    match api.post_form_data::<ImportSummary>("/students/import/", form).await {
        Ok(summary) => {
            info!(created = summary.created, updated = summary.updated, "students imported");
            Ok(())
        }
        Err(err) if err.status() == Some(400) => {
            // Row-level problems come back as the error payload
            warn!(message = ?err.message(), payload = ?err.payload(), "import rejected");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn export_class(api: &ApiClient, class: &Class, out_dir: &Path) -> DemoResult<()> {
    let params = QueryParams::new()
        .param("class_id", class.id)
        .param("format", "csv");
    let blob = api.get_blob_query("/students/export/", &params).await?;

    let filename = blob
        .filename()
        .map_or_else(|| format!("class-{}.csv", class.id), str::to_string);
    let target = out_dir.join(filename);
    std::fs::write(&target, blob.data())?;

    info!(class = %class.name, bytes = blob.len(), file = %target.display(), "roster exported");
    Ok(())
}
