use chrono::NaiveDate;
use lstm_forecast::models::LstmModel;
use lstm_forecast::pipeline::{run_forecast, ForecastConfig};
use lstm_forecast::simulation::historical_performance;
use market_data::providers::SyntheticDataProvider;
use market_data::{daily_changes, DateRange, MarketDataProvider};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("LSTM Forecast: Stock Analysis Demo");
    println!("==================================\n");

    let ticker = "DEMO";
    let investment = 1000.0;

    // One year of synthetic daily closes with a mild upward drift
    let provider = SyntheticDataProvider::new(100.0, 0.08, 1.2).with_seed(42);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    )?;

    println!("Fetching data for {}...", ticker);
    let series = provider.fetch_price_series(ticker, &range)?;
    println!("Loaded {} daily closes\n", series.len());

    println!("Latest closes:");
    for point in series.points().iter().rev().take(5).rev() {
        println!("  {}  {:>8.2}", point.date, point.close);
    }

    let changes = daily_changes(&series);
    let mean_change = changes.iter().sum::<f64>() / changes.len() as f64;
    println!("\nAverage daily change: {:+.3}%", mean_change);

    // How the investment would have done over the observed history
    let past = historical_performance(investment, &series)?;
    println!("\nInvestment performance over the fetched history:");
    println!("  Initial investment: ${:>10.2}", past.initial_amount);
    println!("  Value at range end: ${:>10.2}", past.final_value);
    if past.is_gain() {
        println!("  Your investment gained value");
    } else {
        println!("  Your investment lost value");
    }

    // Forecast the next ten trading-calendar days
    let config = ForecastConfig::for_ticker(ticker)
        .with_range(range)
        .with_window_len(60)
        .with_horizon(10)
        .with_initial_investment(investment)
        .with_model(LstmModel::new(32, 20, 32, 0.05)?.with_seed(7));

    println!("\nTraining LSTM and forecasting {} days...", config.horizon);
    let outcome = run_forecast(&provider, &config)?;

    println!("\nForecasted prices:");
    if let Some(points) = outcome.forecast.dated_points() {
        for (i, (date, price)) in points.iter().enumerate() {
            println!("  Day {:>2} ({}): ${:.2}", i + 1, date, price);
        }
    }

    let sim = outcome.simulation;
    println!("\nProjection over the forecast horizon:");
    println!("  Last known close:   ${:>10.2}", outcome.last_close);
    println!("  Initial investment: ${:>10.2}", sim.initial_amount);
    println!("  Projected value:    ${:>10.2}", sim.final_value);
    println!("  Implied return:     {:+.2}%", sim.fractional_return * 100.0);

    Ok(())
}
