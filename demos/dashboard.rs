use chrono::Utc;
use dotenv::dotenv;
use saint_analytics::*;
use std::sync::Arc;

/// Prints the comparative dashboard, sales trend and top basket pairs.
///
/// Usage: `cargo run --example dashboard --features http-client -- saint.json [connection_id]`
/// where connection id 0 (the default) consolidates every configured source.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "saint.json".to_string());
    let connection_id = args.next().map(|v| v.parse::<i64>()).transpose()?.unwrap_or(0);

    let config = EngineConfig::from_file(&config_path)?.with_env_overrides();
    config.validate()?;
    println!(
        "📂 Loaded {} source(s) from {}",
        config.sources.len(),
        config_path
    );

    let connector = Arc::new(SaintClient::from_config(&config)?);
    let engine = AnalyticsEngine::from_config(connector, config);
    let selection = SourceSelection::from_connection_id(connection_id);
    let user_id = 1;

    let today = Utc::now().date_naive();
    let periods = ReportingPeriods::default_for(today, engine.config().summary_lookback_days)?;
    let summary = engine.summary_for(selection, user_id, periods).await?;

    let current = &summary.current_period;
    println!("\n📊 Management summary {} .. {}", periods.current.start, periods.current.end);
    println!(
        "   Net sales:      {:>14.2}  ({:+.1}%)",
        current.total_net_sales, summary.total_net_sales_comparative.percentage_change
    );
    println!(
        "   Gross profit:   {:>14.2}  ({:+.1}%)",
        current.gross_profit, summary.gross_profit_comparative.percentage_change
    );
    println!(
        "   Average ticket: {:>14.2}  ({:+.1}%)",
        current.average_ticket, summary.average_ticket_comparative.percentage_change
    );
    println!(
        "   Receivables:    {:>14.2}  overdue {:.2} ({:.1}%)",
        current.total_receivables, current.overdue_receivables, current.receivable_percentage
    );
    println!("   VAT payable:    {:>14.2}", current.vat_payable);

    println!("\n🏆 Top clients");
    for item in &current.top5_clients_by_sales {
        println!("   {:<40} {:>14.2}", item.name, item.value);
    }

    let forecast_window = comparative::query_window(
        None,
        None,
        today,
        engine.config().forecast_lookback_days,
    )?;
    let forecast = engine.forecast_for(selection, user_id, forecast_window).await?;
    if forecast.is_empty() {
        println!("\n📈 Not enough daily sales for a trend");
    } else {
        println!(
            "\n📈 Sales trend over {} days: {:+.2} per day",
            forecast.historical_data.len(),
            forecast.slope
        );
        for point in forecast.project(7) {
            println!("   {}  {:>14.2}", point.date, point.sales);
        }
    }

    let pairs = engine.basket_for(selection, user_id, Some(periods.current)).await?;
    println!("\n🛒 Frequently bought together");
    for pair in pairs.iter().take(5) {
        println!(
            "   {} → {}  confidence {:.0}%  support {:.1}%",
            pair.item_a,
            pair.item_b,
            pair.confidence * 100.0,
            pair.support * 100.0
        );
    }

    Ok(())
}
