use std::net::SocketAddr;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ride_broker_backend::{
    config::Config,
    core::feed::LocationFeed,
    entities::location::GeoPoint,
    entities::tenant::Tenant,
    entities::user::{User, UserRole},
    routes,
    store::Store,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_broker_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Build the store and the location feed
    let store = Arc::new(Store::new());
    let feed = Arc::new(LocationFeed::new(Arc::clone(&store), config.feed_tick));

    // Seed the default tenant and admin account if not present
    seed_defaults(&store).await;

    // Create app state
    let state = AppState {
        store,
        feed,
        config: config.clone(),
    };

    // Configure rate limiting: 100 requests per 60 seconds per IP
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(60)
            .burst_size(100)
            .finish()
            .unwrap(),
    );

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(GovernorLayer::new(governor_config));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Seed a default tenant and its admin account on first start
async fn seed_defaults(store: &Store) {
    let admin_email = "admin@ridebroker.io";

    if store.users.find(|user| user.email == admin_email).await.is_some() {
        return;
    }

    let tenant = Tenant {
        id: Uuid::new_v4(),
        name: "default".to_string(),
        markup_percent: None,
        center: GeoPoint {
            lat: 40.4168,
            lng: -3.7038,
        },
        service_radius_km: 50.0,
        base_fare: 3.0,
        per_km_rate: 1.4,
    };
    store.tenants.put(tenant.clone()).await;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(b"admin123", &salt)
        .expect("Failed to hash admin password")
        .to_string();

    let admin = User {
        id: Uuid::new_v4(),
        tenant_id: tenant.id,
        email: admin_email.to_string(),
        password_hash,
        name: "Admin".to_string(),
        phone: None,
        role: UserRole::Admin,
        created_at: Utc::now(),
    };
    store.users.put(admin).await;

    tracing::info!(tenant_id = %tenant.id, "Default tenant and admin account created: {}", admin_email);
}
