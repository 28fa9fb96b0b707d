//! Scripted scenario tests.
//!
//! Each file under `tests/scenarios/` is a scenario in the line-oriented
//! command format: `A`/`M`/`C` operations followed by a terminal
//! `R <orders> <bid_levels> <ask_levels>` assertion. The runner executes the
//! commands against a live [`Orderbook`] and checks the book's structural
//! invariants after every single command, then the terminal counts.

use std::fs;
use std::path::PathBuf;

use matchbook::scenario::{Command, Scenario};
use matchbook::{Order, Orderbook};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/scenarios")
        .join(name)
}

fn run_scenario_file(name: &str) {
    let path = scenario_path(name);
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("cannot read {}: {error}", path.display()));
    let scenario = Scenario::parse(&text)
        .unwrap_or_else(|error| panic!("cannot parse {name}: {error}"));

    let orderbook = Orderbook::new();

    for (step, command) in scenario.commands.iter().enumerate() {
        match *command {
            Command::Add {
                side,
                order_type,
                price,
                quantity,
                id,
            } => {
                orderbook.add_order(Order::new(order_type, id, side, price, quantity));
            }
            Command::Modify {
                id,
                side,
                price,
                quantity,
            } => {
                orderbook.modify_order(id, side, price, quantity);
            }
            Command::Cancel { id } => orderbook.cancel_order(id),
        }

        orderbook
            .check_consistency()
            .unwrap_or_else(|error| panic!("{name}, step {}: {error}", step + 1));
    }

    let levels = orderbook.levels();
    assert_eq!(
        orderbook.size(),
        scenario.expected.order_count,
        "{name}: resting order count"
    );
    assert_eq!(
        levels.bid_level_count(),
        scenario.expected.bid_levels,
        "{name}: bid level count"
    );
    assert_eq!(
        levels.ask_level_count(),
        scenario.expected.ask_levels,
        "{name}: ask level count"
    );
}

#[test]
fn scenario_match_good_till_cancel() {
    run_scenario_file("match_good_till_cancel.txt");
}

#[test]
fn scenario_match_fill_and_kill() {
    run_scenario_file("match_fill_and_kill.txt");
}

#[test]
fn scenario_match_fill_or_kill_hit() {
    run_scenario_file("match_fill_or_kill_hit.txt");
}

#[test]
fn scenario_match_fill_or_kill_miss() {
    run_scenario_file("match_fill_or_kill_miss.txt");
}

#[test]
fn scenario_cancel_success() {
    run_scenario_file("cancel_success.txt");
}

#[test]
fn scenario_modify_loses_priority() {
    run_scenario_file("modify_loses_priority.txt");
}

#[test]
fn scenario_match_market() {
    run_scenario_file("match_market.txt");
}
