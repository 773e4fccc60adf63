//! Property-based tests over random price paths.
//!
//! These tests verify the engine's bookkeeping invariants hold whatever the
//! market does.

use pairs_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (5_000i64..=20_000i64).prop_map(|x| Decimal::new(x, 2)) // $50 to $200
}

fn path_strategy(len: usize) -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    proptest::collection::vec((price_strategy(), price_strategy()), len..len + 40)
}

fn proportion_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=60i64).prop_map(|x| Decimal::new(x, 2)) // 1% to 60% per leg
}

fn config(trade_proportion: Decimal, exit_zscore: Decimal) -> StrategyConfig {
    StrategyConfig {
        short_window: 2,
        long_window: 6,
        trade_proportion,
        entry_zscore: dec!(1.0),
        exit_zscore,
        ..StrategyConfig::development()
    }
}

fn observations(path: &[(Decimal, Decimal)], offset: usize) -> Vec<(Observation, Observation)> {
    path.iter()
        .enumerate()
        .map(|(i, (a, b))| {
            let ts = Timestamp::from_millis((offset + i) as i64);
            (Observation::new("AMZN", *a, ts), Observation::new("TSLA", *b, ts))
        })
        .collect()
}

fn seeded(config: StrategyConfig, seed: &[(Decimal, Decimal)]) -> Engine {
    let pairs = observations(seed, 0);
    let history = PairHistory::new(
        pairs.iter().map(|(a, _)| a.clone()).collect(),
        pairs.iter().map(|(_, b)| b.clone()).collect(),
    );
    let mut engine = Engine::new(config, EngineConfig::default()).unwrap();
    engine.initialize(&history).unwrap();
    engine
}

proptest! {
    /// Conservation residual is exactly zero after every tick.
    #[test]
    fn residual_always_zero(
        seed in path_strategy(6),
        path in path_strategy(20),
        proportion in proportion_strategy(),
        exit in (0i64..=90i64).prop_map(|x| Decimal::new(x, 2)),
    ) {
        let mut engine = seeded(config(proportion, exit), &seed[..6]);

        for (one, two) in observations(&path, 6) {
            match engine.tick(&one, &two) {
                Ok(_) => {}
                Err(e) => prop_assert!(e.is_insufficient_funds(), "unexpected error: {}", e),
            }
            // a short gapping up can push cash below zero; the books still balance
            prop_assert_eq!(engine.ledger_residual(), Quote::zero());
        }
    }

    /// The pair is fully open or fully absent between ticks.
    #[test]
    fn pair_is_atomic(
        seed in path_strategy(6),
        path in path_strategy(20),
        proportion in proportion_strategy(),
    ) {
        let mut engine = seeded(config(proportion, dec!(0.3)), &seed[..6]);

        for (one, two) in observations(&path, 6) {
            let _ = engine.tick(&one, &two);

            let longs = engine.longs().ledger().open_count();
            let shorts = engine.shorts().ledger().open_count();
            prop_assert!(longs <= 1 && shorts <= 1);
            prop_assert_eq!(longs, shorts);
            prop_assert_eq!(engine.has_open_pair(), longs == 1);

            let expected = if longs == 1 { EngineState::Tracking } else { EngineState::Idle };
            prop_assert_eq!(engine.state(), expected);
        }
    }

    /// Every trade id lives in exactly one place: open or closed, one ledger.
    #[test]
    fn trade_ids_are_unique_across_ledgers(
        seed in path_strategy(6),
        path in path_strategy(30),
    ) {
        let mut engine = seeded(config(dec!(0.05), dec!(0.5)), &seed[..6]);
        for (one, two) in observations(&path, 6) {
            engine.tick(&one, &two).unwrap();
        }

        let mut seen = HashSet::new();
        let all = engine
            .longs()
            .ledger()
            .open_trades()
            .chain(engine.longs().ledger().closed_trades())
            .chain(engine.shorts().ledger().open_trades())
            .chain(engine.shorts().ledger().closed_trades());
        for trade in all {
            prop_assert!(seen.insert(trade.id), "{} appears twice", trade.id);
            prop_assert_eq!(trade.is_open(), trade.realized_pnl.is_none());
        }
    }

    /// A stop-loss close only happens once the loss reached the stop.
    #[test]
    fn stopped_trades_are_marked_at_the_breach(
        seed in path_strategy(6),
        path in path_strategy(20),
    ) {
        let mut engine = seeded(config(dec!(0.05), dec!(0)), &seed[..6]);
        let stop = engine.strategy().stop_loss();

        for (one, two) in observations(&path, 6) {
            let report = engine.tick(&one, &two).unwrap();
            for trade in &report.stopped {
                let exit = trade.exit_price.unwrap();
                match trade.close_reason {
                    Some(CloseReason::StopLoss) => prop_assert!(trade.loss_fraction(exit) >= stop.fraction),
                    Some(CloseReason::PairUnwind) => {}
                    other => prop_assert!(false, "unexpected reason {:?}", other),
                }
            }
        }
    }

    /// Rolling std is never negative and z-score is defined whenever std > 0.
    #[test]
    fn indicator_stats_are_sane(ratios in proptest::collection::vec(price_strategy(), 6..40)) {
        let mut window = RollingWindow::new(6);
        for r in ratios {
            window.push(r);
        }
        let std = window.std().unwrap();
        prop_assert!(std >= Decimal::ZERO);

        let mean = window.mean().unwrap();
        let snapshot = IndicatorSnapshot::new(mean, mean, std);
        if std > Decimal::ZERO {
            prop_assert_eq!(snapshot.zscore().unwrap(), Decimal::ZERO);
        } else {
            prop_assert_eq!(snapshot.zscore(), Err(IndicatorError::DegenerateVariance));
        }
    }
}
