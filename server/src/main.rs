use server::routes;
use server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8081".into())
        .parse()
        .expect("invalid PORT");

    let app = routes::app(AppState::default());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "whiteboard relay listening");
    axum::serve(listener, app).await.expect("server failed");
}
