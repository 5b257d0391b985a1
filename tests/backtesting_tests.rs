// Integration tests for bar replay and parameter sweeps

mod common;

use common::{create_temp_dir, create_test_config, generate_test_bars, with_timestamps, write_json};
use ohlc_market_sim::{
    best_by_equity, load_bars, load_orders, sweep_limit_times, BarRecord, LotAccounting,
    Replay, ReplayOptions, ReplayOutcome, ScheduledOrder, Side, SimError,
};

fn grid_orders(bars: &[BarRecord]) -> Vec<ScheduledOrder> {
    // One buy at each bar's low and one sell at its high, so both sides touch
    bars.iter()
        .enumerate()
        .flat_map(|(i, bar)| {
            vec![
                ScheduledOrder { bar: i, side: Side::Buy, price: bar.low, amount: 5.0 },
                ScheduledOrder { bar: i, side: Side::Sell, price: bar.high, amount: 3.0 },
            ]
        })
        .collect()
}

#[test]
fn test_generated_bars_are_consistent() {
    let bars = generate_test_bars(0.50, 100, 0.01);

    assert_eq!(bars.len(), 100);
    for record in &bars {
        assert!(record.bar().inconsistency().is_none(), "bad bar {}", record.bar());
    }
    for pair in bars.windows(2) {
        assert_eq!(pair[0].close, pair[1].open);
    }
}

#[test]
fn test_replay_from_json_files() {
    let dir = create_temp_dir();
    let bars = with_timestamps(generate_test_bars(100.0, 50, 0.02), 15);
    let orders = grid_orders(&bars);
    let bars_path = write_json(dir.path(), "bars.json", &bars);
    let orders_path = write_json(dir.path(), "orders.json", &orders);

    let loaded_bars: Vec<BarRecord> = load_bars(&bars_path).expect("Failed to load bars");
    let loaded_orders: Vec<ScheduledOrder> = load_orders(&orders_path).expect("Failed to load orders");
    assert_eq!(loaded_bars.len(), 50);
    assert!(loaded_bars[0].timestamp.is_some());
    assert_eq!(loaded_orders.len(), 100);

    let engine = create_test_config().engine.build_engine::<f64>().expect("Failed to build engine");
    let outcome = Replay::new(&loaded_bars, &loaded_orders, ReplayOptions::quiet())
        .run(engine)
        .expect("Replay failed");

    let summary = &outcome.summary;
    assert_eq!(summary.bars, 50);
    assert_eq!(summary.orders_submitted, 100);
    assert_eq!(summary.orders_rejected, 0);
    assert!(summary.buy_fills > 0);

    let last_close = loaded_bars[49].close;
    let holdings = summary.final_holdings;
    let expected_equity = holdings.cash_amount + holdings.crypto_amount * last_close;
    assert!((summary.final_equity - expected_equity).abs() < 1e-9);
}

#[test]
fn test_consuming_lots_track_holdings() {
    let bars = generate_test_bars(100.0, 200, 0.02);
    let orders = grid_orders(&bars);

    let mut config = create_test_config();
    config.engine.lot_accounting = LotAccounting::Consuming;
    config.engine.start_cash = 10_000.0;
    let mut engine = config.engine.build_engine::<f64>().expect("Failed to build engine");

    for (i, record) in bars.iter().enumerate() {
        for scheduled in orders.iter().filter(|order| order.bar == i) {
            engine.submit(scheduled.side, scheduled.to_order()).expect("Order rejected");
        }
        engine.step_bar(record.bar()).expect("Bar rejected");

        let ledger = engine.ledger();
        let lot_total: f64 = ledger.lots().iter().map(|lot| lot.amount).sum();
        assert!((lot_total - ledger.total_held()).abs() < 1e-6);
        assert!(ledger.lots().iter().all(|lot| lot.amount > 0.0));
        assert!(ledger.cash() >= -1e-9);
    }
}

#[test]
fn test_replay_outcome_json_with_reports() {
    let bars = generate_test_bars(10.0, 20, 0.05);
    let orders = grid_orders(&bars);
    let engine = create_test_config().engine.build_engine::<f64>().expect("Failed to build engine");
    let options = ReplayOptions { keep_reports: true, ..ReplayOptions::quiet() };

    let outcome = Replay::new(&bars, &orders, options).run(engine).expect("Replay failed");
    assert_eq!(outcome.reports.len(), 20);
    assert_eq!(outcome.reports[19].bar_index, 19);

    let json = serde_json::to_string(&outcome).expect("Failed to serialize outcome");
    let parsed: ReplayOutcome = serde_json::from_str(&json).expect("Failed to parse outcome");
    assert_eq!(parsed.summary.bars, outcome.summary.bars);
    assert_eq!(parsed.summary.buy_fills, outcome.summary.buy_fills);
    assert_eq!(parsed.summary.sell_fills, outcome.summary.sell_fills);
    assert_eq!(parsed.reports.len(), 20);
    assert_eq!(parsed.reports[0].buy_fills.len(), outcome.reports[0].buy_fills.len());
}

#[test]
fn test_missing_and_empty_bar_files() {
    let dir = create_temp_dir();

    let err = load_bars::<f64, _>(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SimError::FileNotFound(_)));

    let empty: Vec<BarRecord> = Vec::new();
    let path = write_json(dir.path(), "empty.json", &empty);
    let err = load_bars::<f64, _>(&path).unwrap_err();
    assert!(matches!(err, SimError::Replay(_)));

    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "{ not json").expect("Failed to write fixture");
    let err = load_orders::<f64, _>(&path).unwrap_err();
    assert!(matches!(err, SimError::DataParse(_)));
}

#[test]
fn test_sweep_over_generated_series() {
    let bars = generate_test_bars(50.0, 80, 0.03);
    let orders = grid_orders(&bars);
    let limits = [1, 2, 5, 10];

    let results = sweep_limit_times(&create_test_config().engine, &bars, &orders, &limits)
        .expect("Sweep failed");

    assert_eq!(results.len(), limits.len());
    for (result, limit) in results.iter().zip(limits) {
        assert_eq!(result.limit_time, limit);
        assert_eq!(result.summary.bars, 80);
        assert_eq!(result.summary.orders_submitted, 160);
    }

    let best = best_by_equity(&results).expect("No sweep results");
    assert!(results
        .iter()
        .all(|result| result.summary.final_equity <= best.summary.final_equity));
}
