//! Line-oriented scenario format.
//!
//! Scenarios script a sequence of book operations followed by a terminal
//! assertion, one per line:
//!
//! ```text
//! A <side> <type> <price> <quantity> <id>   add an order
//! M <id> <side> <price> <quantity>          modify an order
//! C <id>                                    cancel an order
//! R <all> <bid_levels> <ask_levels>         terminal result assertion
//! ```
//!
//! `<side>` is `B` or `S`; `<type>` is one of `GoodTillCancel`,
//! `FillAndKill`, `FillOrKill`, `GoodForDay`, `Market`. Integer fields are
//! decimal and must be non-negative.
//!
//! Lines whose leading token is not a known command are skipped. Within a
//! recognized command, bad integers and unknown side/type tokens are
//! errors. The `R` line must be the last non-empty line; an empty line
//! before it ends the scan with a missing-result error.

use thiserror::Error;

use crate::orderbook::Orderbook;
use crate::types::{Order, OrderId, OrderType, Price, Quantity, Side};

/// Scenario text that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("line {line}: invalid integer `{token}`")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: negative value `{token}`")]
    NegativeValue { line: usize, token: String },

    #[error("line {line}: unknown side `{token}`")]
    UnknownSide { line: usize, token: String },

    #[error("line {line}: unknown order type `{token}`")]
    UnknownOrderType { line: usize, token: String },

    #[error("line {line}: missing field")]
    MissingField { line: usize },

    #[error("line {line}: result line before the end of the scenario")]
    ResultNotLast { line: usize },

    #[error("scenario ended without a result line")]
    MissingResult,
}

/// One scripted book operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add {
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        id: OrderId,
    },
    Modify {
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Cancel {
        id: OrderId,
    },
}

/// The terminal `R` assertion: resting order count and per-side level
/// counts expected after all commands have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub order_count: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
}

/// A parsed scenario: commands plus the terminal expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub commands: Vec<Command>,
    pub expected: Expected,
}

impl Scenario {
    /// Parse scenario text.
    pub fn parse(input: &str) -> Result<Self, ScenarioError> {
        let mut commands = Vec::new();
        let mut lines = input.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = index + 1;

            if raw.trim().is_empty() {
                // An empty line ends the scenario before the result line.
                return Err(ScenarioError::MissingResult);
            }

            let mut fields = raw.split_whitespace();
            let head = fields.next().unwrap_or_default();

            match head {
                "A" => {
                    let side = parse_side(line, next_field(line, &mut fields)?)?;
                    let order_type = parse_order_type(line, next_field(line, &mut fields)?)?;
                    let price = parse_price(line, next_field(line, &mut fields)?)?;
                    let quantity = parse_quantity(line, next_field(line, &mut fields)?)?;
                    let id = parse_unsigned(line, next_field(line, &mut fields)?)?;
                    commands.push(Command::Add {
                        side,
                        order_type,
                        price,
                        quantity,
                        id,
                    });
                }
                "M" => {
                    let id = parse_unsigned(line, next_field(line, &mut fields)?)?;
                    let side = parse_side(line, next_field(line, &mut fields)?)?;
                    let price = parse_price(line, next_field(line, &mut fields)?)?;
                    let quantity = parse_quantity(line, next_field(line, &mut fields)?)?;
                    commands.push(Command::Modify {
                        id,
                        side,
                        price,
                        quantity,
                    });
                }
                "C" => {
                    let id = parse_unsigned(line, next_field(line, &mut fields)?)?;
                    commands.push(Command::Cancel { id });
                }
                "R" => {
                    let order_count = parse_unsigned(line, next_field(line, &mut fields)?)? as usize;
                    let bid_levels = parse_unsigned(line, next_field(line, &mut fields)?)? as usize;
                    let ask_levels = parse_unsigned(line, next_field(line, &mut fields)?)? as usize;

                    // The result must be the last non-empty line.
                    for (later_index, later) in lines {
                        if !later.trim().is_empty() {
                            return Err(ScenarioError::ResultNotLast {
                                line: later_index + 1,
                            });
                        }
                    }

                    return Ok(Self {
                        commands,
                        expected: Expected {
                            order_count,
                            bid_levels,
                            ask_levels,
                        },
                    });
                }
                // Unrecognized command token: skip the line.
                _ => continue,
            }
        }

        Err(ScenarioError::MissingResult)
    }

    /// Run every command against an orderbook, in order.
    pub fn apply(&self, orderbook: &Orderbook) {
        for command in &self.commands {
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
        }
    }

    /// True when the orderbook's final state matches the terminal assertion.
    pub fn verify(&self, orderbook: &Orderbook) -> bool {
        let levels = orderbook.levels();
        orderbook.size() == self.expected.order_count
            && levels.bid_level_count() == self.expected.bid_levels
            && levels.ask_level_count() == self.expected.ask_levels
    }
}

// ============================================================================
// Field parsing
// ============================================================================

fn next_field<'a>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<&'a str, ScenarioError> {
    fields.next().ok_or(ScenarioError::MissingField { line })
}

fn parse_unsigned(line: usize, token: &str) -> Result<u64, ScenarioError> {
    if token.starts_with('-') {
        return Err(ScenarioError::NegativeValue {
            line,
            token: token.to_string(),
        });
    }
    token.parse::<u64>().map_err(|_| ScenarioError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn parse_price(line: usize, token: &str) -> Result<Price, ScenarioError> {
    let value = parse_unsigned(line, token)?;
    Price::try_from(value).map_err(|_| ScenarioError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn parse_quantity(line: usize, token: &str) -> Result<Quantity, ScenarioError> {
    let value = parse_unsigned(line, token)?;
    Quantity::try_from(value).map_err(|_| ScenarioError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn parse_side(line: usize, token: &str) -> Result<Side, ScenarioError> {
    match token {
        "B" => Ok(Side::Buy),
        "S" => Ok(Side::Sell),
        _ => Err(ScenarioError::UnknownSide {
            line,
            token: token.to_string(),
        }),
    }
}

fn parse_order_type(line: usize, token: &str) -> Result<OrderType, ScenarioError> {
    match token {
        "GoodTillCancel" => Ok(OrderType::GoodTillCancel),
        "FillAndKill" => Ok(OrderType::FillAndKill),
        "FillOrKill" => Ok(OrderType::FillOrKill),
        "GoodForDay" => Ok(OrderType::GoodForDay),
        "Market" => Ok(OrderType::Market),
        _ => Err(ScenarioError::UnknownOrderType {
            line,
            token: token.to_string(),
        }),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
