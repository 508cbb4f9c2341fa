use dotenv::dotenv;
use realtor_listings::{config::Config, AppState};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init()?;

    let app_state = match AppState::init(config).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let result = app_state.db_client.check_connection().await;
    match &result {
        Ok(check) => {
            tracing::info!("DB 연결 테스트 성공: {}", check.now);
            if !check.property_table_exists {
                tracing::warn!("property 테이블이 존재하지 않습니다");
            }
        }
        Err(err) => tracing::error!("DB 테스트 에러: {}", err),
    }

    app_state.shutdown().await;
    result?;
    Ok(())
}
