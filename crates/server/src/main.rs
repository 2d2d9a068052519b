//! Federation server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use plaza_common::Config;
use plaza_federation::handler::{
    ActorApState, CollectionState, GatewayState, NoteApState, WebfingerState, gateway_actor_handler,
    gateway_followers_handler, gateway_inbox_handler, gateway_outbox_handler, followers_handler,
    note_handler, outbox_handler, shared_inbox_handler, user_handler, user_inbox_handler,
    webfinger_handler,
};
use plaza_federation::inbox::InboxState;
use plaza_federation::middleware::{SignatureVerificationLayer, SignatureVerificationState};
use plaza_federation::resolver::Resolver;
use plaza_federation::security::ActivitySecurityChecker;
use plaza_federation::signature::HttpSignatureService;
use plaza_federation::{ApClient, RemoteActorCache};
use plaza_queue::{
    DeliverContext, DeliverJob, FollowerSyncer, JobExecutor, RetryConfig, SchedulerConfig, deliver_worker,
    run_scheduler,
};
use plaza_store::repositories::{
    ActorKeyRepository, ActorRepository, FollowRepository, NoteAttachmentRepository,
    NoteRepository, NoteTagRepository, OutboxItemRepository, PollRepository, PollVoteRepository,
    PortableGatewayRepository, ShareRepository,
};
use apalis::prelude::*;
use fred::interfaces::ClientLike;
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Wires [`FollowerSyncer`] into the scheduler's [`JobExecutor`] trait.
struct FollowersSyncExecutor {
    syncer: FollowerSyncer,
}

#[async_trait::async_trait]
impl JobExecutor for FollowersSyncExecutor {
    async fn followers_sync(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let outcomes = self.syncer.sync_all_local_actors(100).await?;
        Ok(outcomes.iter().map(|o| o.pruned as u64).sum())
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received SIGINT, initiating graceful shutdown");
        },
        () = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}

fn parse_threshold(raw: &Option<String>) -> Option<chrono::DateTime<chrono::Utc>> {
    raw.as_deref().and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok()).map(|dt| dt.with_timezone(&chrono::Utc))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "plaza=debug,tower_http=debug".into()))
        .init();

    info!("starting plaza federation server");

    let config = Config::load()?;

    let mut db_opts = ConnectOptions::new(&config.database.url);
    db_opts.max_connections(config.database.max_connections).min_connections(config.database.min_connections);
    let db = Database::connect(db_opts).await?;
    info!("connected to database");

    info!("running database migrations");
    plaza_store::migrate(&db).await?;
    info!("migrations completed");
    let db = Arc::new(db);

    let fred_config =
        fred::types::config::Config::from_url(&config.redis.url).expect("failed to parse redis url");
    let redis_client = fred::clients::Client::new(fred_config, None, None, None);
    redis_client.connect();
    redis_client.wait_for_connect().await.expect("failed to connect to redis");
    let redis_client = Arc::new(redis_client);
    info!("connected to redis");

    let apalis_redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("failed to create redis client for job queue");
    let apalis_redis_conn = redis::aio::ConnectionManager::new(apalis_redis_client)
        .await
        .expect("failed to connect job queue to redis");
    let deliver_storage = apalis_redis::RedisStorage::<DeliverJob>::new(apalis_redis_conn);
    info!("connected job queue to redis");

    let base_url = Url::parse(&config.server.url).expect("invalid server.url in config");
    let domain = base_url.host_str().expect("server.url must have a host").to_string();

    let actor_repo = ActorRepository::new(Arc::clone(&db));
    let actor_key_repo = ActorKeyRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let note_repo = NoteRepository::new(Arc::clone(&db));
    let attachment_repo = NoteAttachmentRepository::new(Arc::clone(&db));
    let tag_repo = NoteTagRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let poll_vote_repo = PollVoteRepository::new(Arc::clone(&db));
    let share_repo = ShareRepository::new(Arc::clone(&db));
    let gateway_repo = PortableGatewayRepository::new(Arc::clone(&db));
    let outbox_repo = OutboxItemRepository::new(Arc::clone(&db));

    let ap_client = ApClient::with_limits(
        &config.server.url,
        4,
        64,
        config.federation.max_response_bytes,
        usize::from(config.federation.max_redirects),
    );

    let cache = RemoteActorCache::new(Arc::clone(&redis_client));
    let resolver = Resolver::new(actor_repo.clone(), actor_key_repo.clone(), cache, ap_client.clone());

    let signature_service = HttpSignatureService::new(
        parse_threshold(&config.federation.rfc9421_threshold),
        parse_threshold(&config.federation.ed25519_threshold),
        config.federation.disable_integrity_proofs,
    );

    let security = ActivitySecurityChecker::from_config(Arc::clone(&redis_client), &config.throttle);

    let inbox_state = InboxState::new(
        actor_repo.clone(),
        actor_key_repo.clone(),
        follow_repo.clone(),
        note_repo.clone(),
        attachment_repo.clone(),
        tag_repo.clone(),
        poll_repo.clone(),
        poll_vote_repo.clone(),
        share_repo.clone(),
        resolver.clone(),
        ap_client.clone(),
        security.clone(),
        signature_service.clone(),
        base_url.clone(),
    );

    let signature_verification_state = SignatureVerificationState::new(
        resolver.clone(),
        actor_key_repo.clone(),
        signature_service.clone(),
        config.federation.enabled,
    );
    let signature_layer = SignatureVerificationLayer::new(signature_verification_state);

    let actor_state = ActorApState::new(actor_repo.clone(), actor_key_repo.clone(), base_url.clone());
    let note_state = NoteApState::new(note_repo.clone(), actor_repo.clone(), attachment_repo.clone(), tag_repo.clone(), base_url.clone());
    let collection_state = CollectionState::new(
        actor_repo.clone(),
        note_repo.clone(),
        attachment_repo.clone(),
        tag_repo.clone(),
        follow_repo.clone(),
        base_url.clone(),
    );
    let webfinger_state = WebfingerState::new(domain, base_url.clone(), actor_repo.clone());
    let gateway_state = GatewayState::new(actor_repo.clone(), follow_repo.clone(), gateway_repo.clone(), inbox_state.clone());

    let inbox_routes = Router::new()
        .route("/inbox/{user}", post(user_inbox_handler))
        .route("/inbox/nobody", post(shared_inbox_handler))
        .with_state(inbox_state)
        .layer(signature_layer);

    let app = Router::new()
        .merge(inbox_routes)
        .route("/.well-known/webfinger", get(webfinger_handler).with_state(webfinger_state))
        .route("/.well-known/apgateway/{did}/actor", get(gateway_actor_handler).with_state(gateway_state.clone()))
        .route("/.well-known/apgateway/{did}/actor/inbox", post(gateway_inbox_handler).with_state(gateway_state.clone()))
        .route("/.well-known/apgateway/{did}/actor/outbox", get(gateway_outbox_handler).with_state(gateway_state.clone()))
        .route("/.well-known/apgateway/{did}/actor/followers", get(gateway_followers_handler).with_state(gateway_state))
        .route("/user/{name}", get(user_handler).with_state(actor_state))
        .route("/followers/{name}", get(followers_handler).with_state(collection_state.clone()))
        .route("/outbox/{name}", get(outbox_handler).with_state(collection_state))
        .route("/post/{hash}", get(note_handler).with_state(note_state))
        .layer(TraceLayer::new_for_http());

    if config.federation.enabled {
        info!("starting outbox delivery worker");
        let deliver_ctx = DeliverContext::new(
            outbox_repo.clone(),
            actor_key_repo.clone(),
            ap_client.clone(),
            signature_service.clone(),
            RetryConfig::default(),
        );

        tokio::spawn(async move {
            let monitor =
                Monitor::new().register(WorkerBuilder::new("deliver").data(deliver_ctx).backend(deliver_storage).build_fn(deliver_worker));

            if let Err(e) = monitor.run().await {
                tracing::error!(error = %e, "outbox delivery worker failed");
            }
        });

        info!("starting follower sync scheduler");
        let syncer = FollowerSyncer::new(actor_repo.clone(), follow_repo.clone(), ap_client.clone());
        let executor = Arc::new(FollowersSyncExecutor { syncer });
        run_scheduler(SchedulerConfig::default(), executor).await;
    }

    let addr = SocketAddr::new(config.server.host.parse().expect("invalid server.host"), config.server.port);
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}
