use course_files_sync::config::{self, AppConfig};
use course_files_sync::table::{pagination, DEFAULT_SORT_KEY};
use course_files_sync::{AssetOrchestrator, ClientError, OperationKind, StudioClient};
use once_cell::sync::OnceCell;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

static APP_CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[tokio::main]
async fn main() {
    config::load_dotenv();
    init_logging();

    let config = APP_CONFIG.get_or_init(AppConfig::from_env);
    let course_arg = std::env::args().nth(1);
    let Some(course_id) = config.course_or_default(course_arg.as_deref()) else {
        error!("no course id given and STUDIO_DEFAULT_COURSE is unset");
        std::process::exit(2);
    };

    let client = match StudioClient::new(config.clone()) {
        Ok(client) => client,
        Err(err) => {
            report_client_error("failed to initialize studio client", &err);
            std::process::exit(1);
        }
    };
    info!(profile = ?config.profile, collection = ?config.collection, "studio client initialized");

    let orchestrator = AssetOrchestrator::new(client, config);
    orchestrator
        .fetch_first_page(&course_id, &[], DEFAULT_SORT_KEY)
        .await;

    let store = orchestrator.store();
    let loading = store.operation(OperationKind::Loading);
    let view = store.view();
    let pages = pagination::page_count(view.total_count, orchestrator.page_size());
    let paginated = pagination::shows_footer(view.total_count, orchestrator.page_size());
    info!(
        %course_id,
        status = ?loading.status,
        shown = view.len(),
        total = view.total_count,
        pages,
        paginated,
        "asset view ready"
    );
    for message in &loading.errors {
        warn!(%course_id, "{message}");
    }
    for row in store.rows() {
        info!(id = %row.id, name = %row.display_name, file_type = %row.file_type, locked = row.lock_status, "asset");
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn report_client_error(context: &str, err: &ClientError) {
    error!(%context, ?err, status = ?err.status(), "api bootstrap error");
}
