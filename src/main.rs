//! matchbook demo binary.
//!
//! With a path argument, runs a scenario file against a live orderbook and
//! checks its terminal assertion. Without arguments, runs a short built-in
//! order sequence and prints the resulting depth.

use std::env;
use std::fs;
use std::process::ExitCode;

use matchbook::scenario::Scenario;
use matchbook::{Order, Orderbook, OrderType, Side};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match env::args().nth(1) {
        Some(path) => run_scenario(&path),
        None => {
            run_demo();
            ExitCode::SUCCESS
        }
    }
}

fn run_scenario(path: &str) -> ExitCode {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("cannot read {path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let scenario = match Scenario::parse(&text) {
        Ok(scenario) => scenario,
        Err(error) => {
            eprintln!("cannot parse {path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let orderbook = Orderbook::new();
    scenario.apply(&orderbook);
    print_depth(&orderbook);

    if scenario.verify(&orderbook) {
        println!("result: OK");
        ExitCode::SUCCESS
    } else {
        println!(
            "result: MISMATCH (expected {} orders, {} bid levels, {} ask levels)",
            scenario.expected.order_count,
            scenario.expected.bid_levels,
            scenario.expected.ask_levels
        );
        ExitCode::FAILURE
    }
}

fn run_demo() {
    let orderbook = Orderbook::new();

    orderbook.add_order(Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10));
    orderbook.add_order(Order::new(OrderType::GoodTillCancel, 2, Side::Sell, 102, 5));
    orderbook.add_order(Order::new(OrderType::GoodTillCancel, 3, Side::Sell, 101, 7));

    let trades = orderbook.add_order(Order::new(OrderType::GoodTillCancel, 4, Side::Buy, 101, 4));
    for trade in &trades {
        println!(
            "trade: bid {} @ {} / ask {} @ {} x {}",
            trade.bid.order_id, trade.bid.price, trade.ask.order_id, trade.ask.price,
            trade.quantity()
        );
    }

    print_depth(&orderbook);
}

fn print_depth(orderbook: &Orderbook) {
    let levels = orderbook.levels();

    println!("orders resting: {}", orderbook.size());
    println!("bids ({} levels):", levels.bid_level_count());
    for level in &levels.bids {
        println!("  {} x {}", level.price, level.quantity);
    }
    println!("asks ({} levels):", levels.ask_level_count());
    for level in &levels.asks {
        println!("  {} x {}", level.price, level.quantity);
    }
}
