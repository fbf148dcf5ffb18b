use dotenvy::dotenv;
use tracing::info;

use std::net::SocketAddr;
use todo_subscriptions::infra::{
    app::create_app,
    expiry_sweeper::run_expiry_sweep_loop,
    setup::{init_app_state, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    let subscription_use_cases = app_state.subscription_use_cases.clone();
    tokio::spawn(async move {
        run_expiry_sweep_loop(subscription_use_cases).await;
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
