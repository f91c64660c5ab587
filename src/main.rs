use axum::{http::HeaderValue, Router};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chrono::NaiveDate;

use toolmarket::config::Config;
use toolmarket::db::{create_pool, init_db, queries, AppState};
use toolmarket::handlers;
use toolmarket::models::{Coupon, CreateMaterialSetting, CreateTenant, CreateTool};
use toolmarket::payments::PaymentGateway;

#[derive(Parser, Debug)]
#[command(name = "toolmarket")]
#[command(about = "Tenant-scoped licensing and payment reconciliation for a tool marketplace")]
struct Cli {
    /// Seed the database with dev data (tools, a demo tenant, material rates)
    #[arg(long)]
    seed: bool,

    /// Bind a routing domain to a tenant and exit. An empty domain clears it.
    #[arg(long, num_args = 2, value_names = ["TENANT_ID", "DOMAIN"])]
    bind_domain: Option<Vec<String>>,
}

/// Seeds the catalog with dev data. Skipped when tools already exist.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    if queries::get_tool_by_slug(&conn, "solar-quote")
        .expect("Failed to look up tools")
        .is_some()
    {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let solar = queries::create_tool(
        &conn,
        &CreateTool {
            slug: "solar-quote".to_string(),
            name: "Solar Quote".to_string(),
            price_cents: 4900,
            currency: "USD".to_string(),
            coupon: Some(Coupon {
                code: "SAVE10".to_string(),
                percent_off: 10,
                starts_on: None,
                ends_on: NaiveDate::from_ymd_opt(2030, 12, 31),
                usage_limit: 100,
                usage_count: 0,
                tenant_id: None,
            }),
        },
    )
    .expect("Failed to create solar-quote tool");

    let roof = queries::create_tool(
        &conn,
        &CreateTool {
            slug: "roof-estimator".to_string(),
            name: "Roof Estimator".to_string(),
            price_cents: 2900,
            currency: "USD".to_string(),
            coupon: None,
        },
    )
    .expect("Failed to create roof-estimator tool");

    let tenant = queries::create_tenant(
        &conn,
        &CreateTenant {
            name: "Demo Roofing".to_string(),
            contact_name: Some("Dev Owner".to_string()),
            contact_email: Some("owner@demo-roofing.local".to_string()),
        },
    )
    .expect("Failed to create demo tenant");

    queries::bind_tenant_domain(&conn, &tenant.id, Some("localhost"))
        .expect("Failed to bind demo tenant domain");

    for (name, material_rate, labor_rate) in [("Asphalt Shingle", 2.10, 1.40), ("Metal", 4.25, 2.00)] {
        queries::create_material_setting(
            &conn,
            &tenant.id,
            &CreateMaterialSetting {
                tool_id: Some(roof.id.clone()),
                name: name.to_string(),
                material_rate,
                labor_rate,
            },
        )
        .expect("Failed to create material setting");
    }

    tracing::info!("Tool: {} (id: {})", solar.slug, solar.id);
    tracing::info!("Tool: {} (id: {})", roof.slug, roof.id);
    tracing::info!("Tenant: {} (id: {}, domain: localhost)", tenant.slug, tenant.id);
    tracing::info!("============================================");

    println!();
    println!("--- COPY FROM HERE ---");
    println!("  tenant_id: {}", tenant.id);
    println!("  tool_slug: {}", solar.slug);
    println!("  coupon_code: SAVE10");
    println!("--- END COPY ---");
    println!();
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolmarket=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.payment.secret_key.is_none() {
        tracing::warn!("PAYMENT_SECRET_KEY not set: checkout links will be placeholders");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    if let Some(args) = cli.bind_domain {
        let (tenant_id, domain) = (&args[0], &args[1]);
        let conn = db_pool.get().expect("Failed to get connection");
        match queries::bind_tenant_domain(&conn, tenant_id, Some(domain.as_str())) {
            Ok(Some(tenant)) => println!(
                "Tenant {} ({}) domain: {}",
                tenant.slug,
                tenant.id,
                tenant.domain.as_deref().unwrap_or("(none)")
            ),
            Ok(None) => {
                eprintln!("Tenant not found: {}", tenant_id);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Failed to bind domain: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let state = AppState {
        db: db_pool,
        payments: PaymentGateway::new(config.payment.clone()),
        http_client: reqwest::Client::new(),
        webhook_hash: config.payment.webhook_hash.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set TOOLMARKET_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        // Public endpoints, tenant resolved from Host / X-Tenant-ID
        .merge(handlers::public::router(state.clone(), config.rate_limit))
        // Processor callbacks
        .merge(handlers::webhooks::router())
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Toolmarket server listening on {}", addr);

    // Connect info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
