//! Pairs trading simulation.
//!
//! Replays synthetic mean-reverting price data through the engine, then
//! walks a stop-loss scenario tick by tick. Pass a TOML strategy file as the
//! first argument to override the development settings.

use pairs_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let strategy = match std::env::args().nth(1) {
        Some(path) => StrategyConfig::load(path)?,
        None => StrategyConfig::reverting(),
    };

    println!("Pairs Trading Engine Simulation");
    println!(
        "{} / {}, windows {}/{}, entry {}, exit {}\n",
        strategy.instrument_one,
        strategy.instrument_two,
        strategy.short_window,
        strategy.long_window,
        strategy.entry_zscore,
        strategy.exit_zscore
    );

    scenario_1_replay(&strategy)?;
    scenario_2_stop_loss(&strategy)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

/// Full backtest over an oscillating ratio.
fn scenario_1_replay(strategy: &StrategyConfig) -> Result<(), EngineError> {
    println!("Scenario 1: Replay Backtest\n");

    let history = oscillating_history(strategy, 400, 40);
    let source = ReplaySource::new(history, strategy.long_window)?;
    let engine = Engine::new(strategy.clone(), EngineConfig::default())?;
    let mut session = Session::new(engine, source);

    let stats = session.run()?;
    let engine = session.engine();

    println!("  Ticks: {}, pairs opened: {}, rejected: {}", stats.ticks, stats.pairs_opened, stats.rejected);
    println!("  Trades closed: {}", stats.trades_closed);

    let summary = PerformanceSummary::from_engine(engine, engine.last_quotes())?;
    for line in summary.to_string().lines() {
        println!("  {line}");
    }

    let returns = simple_returns(engine.value_series());
    if let Some((ts, worst)) = returns.iter().min_by_key(|(_, r)| *r) {
        println!("  Worst tick return: {}% at {}", (*worst * Decimal::ONE_HUNDRED).round_dp(4), ts);
    }
    println!("  Ledger residual: {}\n", engine.ledger_residual());
    Ok(())
}

/// A ratio dislocation opens a pair, then the long leg gaps through its stop.
fn scenario_2_stop_loss(strategy: &StrategyConfig) -> Result<(), EngineError> {
    println!("Scenario 2: Stop-Loss Unwind\n");

    let mut engine = Engine::new(strategy.clone(), EngineConfig::default())?;
    let seed = oscillating_history(strategy, strategy.long_window, 40);
    engine.initialize(&seed)?;

    let start = seed.len() as i64;
    let one = &strategy.instrument_one;
    let two = &strategy.instrument_two;

    let open = engine.tick(
        &Observation::new(one.clone(), dec!(100), Timestamp::from_millis(start)),
        &Observation::new(two.clone(), dec!(60), Timestamp::from_millis(start)),
    )?;
    println!("  {} drops to 60, zscore {:?}", two, open.zscore.map(|z| z.round_dp(4)));
    for trade in &open.opened {
        println!(
            "  Opened {} {} {} @ {} (cost {})",
            trade.id,
            trade.side,
            trade.symbol,
            trade.entry_price,
            trade.cost_basis()
        );
    }
    println!("  Cash after open: {}\n", engine.cash());

    let stop = engine.tick(
        &Observation::new(one.clone(), dec!(100), Timestamp::from_millis(start + 1)),
        &Observation::new(two.clone(), dec!(50), Timestamp::from_millis(start + 1)),
    )?;
    println!("  {} gaps to 50", two);
    for trade in &stop.stopped {
        println!(
            "  Closed {} {} {} @ {} ({:?}), pnl {}",
            trade.id,
            trade.side,
            trade.symbol,
            trade.exit_price.map_or(Decimal::ZERO, |p| p.value()),
            trade.close_reason,
            trade.realized_pnl.unwrap_or_else(Quote::zero)
        );
    }

    println!("  State: {:?}, open trades: {}", engine.state(), engine.open_positions().len());
    println!("  Cash: {}, residual: {}", engine.cash(), engine.ledger_residual());
    println!("  Events recorded: {}", engine.events().len());
    Ok(())
}

/// Instrument one flat at 100, instrument two on a triangle wave between 90
/// and 130, so the ratio reverts with the given period.
fn oscillating_history(strategy: &StrategyConfig, len: usize, period: usize) -> PairHistory {
    let half = period / 2;
    let mut one = Vec::with_capacity(len);
    let mut two = Vec::with_capacity(len);

    for i in 0..len {
        let phase = i % period;
        let step = if phase < half { phase } else { period - phase };
        let ts = Timestamp::from_millis(i as i64);
        one.push(Observation::new(strategy.instrument_one.clone(), dec!(100), ts));
        two.push(Observation::new(
            strategy.instrument_two.clone(),
            dec!(90) + Decimal::from(step as u64) * dec!(2),
            ts,
        ));
    }
    PairHistory::new(one, two)
}
