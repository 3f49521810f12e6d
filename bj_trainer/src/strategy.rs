use serde::Serialize;

use crate::{
    hand::{hand_total, is_pair},
    Action, Card, Rank, RuleConfig,
};

/// One cell of a basic strategy chart. When `fallback` is set, the primary
/// action is only taken if the rules and the hand allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChartCell {
    pub primary: Action,
    pub fallback: Option<Action>,
}

const fn cell(primary: Action, fallback: Option<Action>) -> ChartCell {
    ChartCell { primary, fallback }
}

const H: ChartCell = cell(Action::Hit, None);
const S: ChartCell = cell(Action::Stand, None);
const P: ChartCell = cell(Action::Split, None);
const D: ChartCell = cell(Action::Double, Some(Action::Hit));
const DS: ChartCell = cell(Action::Double, Some(Action::Stand));
const PH: ChartCell = cell(Action::Split, Some(Action::Hit));
const RH: ChartCell = cell(Action::Surrender, Some(Action::Hit));

impl ChartCell {
    /// Chart notation: `H`, `S`, `D`, `Ds`, `P`, `Ph`, `Rh`.
    pub fn code(&self) -> &'static str {
        match (self.primary, self.fallback) {
            (Action::Hit, _) => "H",
            (Action::Stand, _) => "S",
            (Action::Double, Some(Action::Stand)) => "Ds",
            (Action::Double, _) => "D",
            (Action::Split, Some(Action::Hit)) => "Ph",
            (Action::Split, _) => "P",
            (Action::Surrender, _) => "Rh",
        }
    }

    pub fn is_compound(&self) -> bool {
        self.code().len() > 1
    }
}

// Columns are the dealer up card: 2, 3, 4, 5, 6, 7, 8, 9, T, A.
type Row = [ChartCell; 10];

const HARD_MIN: u8 = 4;
#[rustfmt::skip]
static HARD_CHART: [Row; 18] = [
    [H, H, H, H, H, H, H, H, H, H], // 4
    [H, H, H, H, H, H, H, H, H, H],
    [H, H, H, H, H, H, H, H, H, H],
    [H, H, H, H, H, H, H, H, H, H],
    [H, H, H, H, H, H, H, H, H, H], // 8
    [H, D, D, D, D, H, H, H, H, H],
    [D, D, D, D, D, D, D, D, H, H],
    [D, D, D, D, D, D, D, D, D, D], // 11
    [H, H, S, S, S, H, H, H, H, H],
    [S, S, S, S, S, H, H, H, H, H],
    [S, S, S, S, S, H, H, H, H, H],
    [S, S, S, S, S, H, H, H, RH, H],
    [S, S, S, S, S, H, H, RH, RH, RH], // 16
    [S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S], // 21
];

const SOFT_MIN: u8 = 13;
#[rustfmt::skip]
static SOFT_CHART: [Row; 9] = [
    [H, H, H, D, D, H, H, H, H, H], // A,2
    [H, H, H, D, D, H, H, H, H, H],
    [H, H, D, D, D, H, H, H, H, H],
    [H, H, D, D, D, H, H, H, H, H],
    [H, D, D, D, D, H, H, H, H, H], // A,6
    [DS, DS, DS, DS, DS, S, S, H, H, H],
    [S, S, S, S, DS, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S], // A,T
];

// Indexed by pair value: 2..=10, then Aces.
#[rustfmt::skip]
static PAIR_CHART: [Row; 10] = [
    [PH, PH, P, P, P, P, H, H, H, H], // 2,2
    [PH, PH, P, P, P, P, H, H, H, H],
    [H, H, H, PH, PH, H, H, H, H, H],
    [D, D, D, D, D, D, D, D, H, H],
    [PH, P, P, P, P, H, H, H, H, H],
    [P, P, P, P, P, P, H, H, H, H],
    [P, P, P, P, P, P, P, P, P, P],
    [P, P, P, P, P, S, P, P, S, S],
    [S, S, S, S, S, S, S, S, S, S], // T,T
    [P, P, P, P, P, P, P, P, P, P], // A,A
];

/// Which of the three tables a hand is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Hard,
    Soft,
    Pair,
}

fn column(dealer_up: Rank) -> usize {
    (dealer_up.value() - 2) as usize
}

fn hard_cell(total: u8, col: usize) -> ChartCell {
    total
        .checked_sub(HARD_MIN)
        .and_then(|row| HARD_CHART.get(row as usize))
        .map_or(H, |row| row[col])
}

fn soft_cell(total: u8, col: usize) -> ChartCell {
    total
        .checked_sub(SOFT_MIN)
        .and_then(|row| SOFT_CHART.get(row as usize))
        .map_or(H, |row| row[col])
}

fn pair_cell(pair_value: u8, col: usize) -> ChartCell {
    pair_value
        .checked_sub(2)
        .and_then(|row| PAIR_CHART.get(row as usize))
        .map_or(H, |row| row[col])
}

/// Reads the chart cell for a hand without applying any rule variation.
/// Totals of 21 or more always stand.
pub fn lookup(cards: &[Card], dealer_up: Card) -> ChartCell {
    let total = hand_total(cards);
    if total.total >= 21 {
        return S;
    }
    let col = column(dealer_up.rank);
    if is_pair(cards) {
        pair_cell(cards[0].rank_value(), col)
    } else if total.soft {
        soft_cell(total.total, col)
    } else {
        hard_cell(total.total, col)
    }
}

/// Collapses a chart cell into the single action that is correct for a hand
/// of `card_count` cards under `rules`.
pub fn resolve(cell: ChartCell, card_count: usize, from_split: bool, rules: &RuleConfig) -> Action {
    let fallback = cell.fallback.unwrap_or(Action::Hit);
    match cell.primary {
        Action::Split if cell.fallback.is_some() && !rules.das_allowed() => fallback,
        Action::Double if card_count > 2 || (from_split && !rules.das_allowed()) => fallback,
        Action::Surrender if card_count > 2 || from_split || !rules.surrender_allowed() => {
            fallback
        }
        primary => primary,
    }
}

/// The optimal action for a hand. Pure: the same inputs always give the same
/// answer.
pub fn correct_action(
    cards: &[Card],
    dealer_up: Card,
    rules: &RuleConfig,
    from_split: bool,
) -> Action {
    resolve(lookup(cards, dealer_up), cards.len(), from_split, rules)
}

/// One cell of a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartEntry {
    pub dealer_up: Rank,
    pub raw: ChartCell,
    /// What a fresh two-card hand should do under the chart's rules.
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub cells: Vec<ChartEntry>,
}

/// The full basic strategy chart for a set of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyChart {
    pub hard: Vec<ChartRow>,
    pub soft: Vec<ChartRow>,
    pub pairs: Vec<ChartRow>,
}

static DEALER_COLUMNS: [Rank; 10] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Ace,
];

fn chart_row(label: String, rules: &RuleConfig, read: impl Fn(usize) -> ChartCell) -> ChartRow {
    let cells = DEALER_COLUMNS
        .iter()
        .map(|&dealer_up| {
            let raw = read(column(dealer_up));
            ChartEntry {
                dealer_up,
                raw,
                action: resolve(raw, 2, false, rules),
            }
        })
        .collect();
    ChartRow { label, cells }
}

/// Hard rows 17 down to 5, soft rows A,9 down to A,2, pair rows A,A then
/// T,T down to 2,2.
pub fn strategy_chart(rules: &RuleConfig) -> StrategyChart {
    let hard = (5..=17)
        .rev()
        .map(|total| chart_row(total.to_string(), rules, |col| hard_cell(total, col)))
        .collect();
    let soft = (2..=9)
        .rev()
        .map(|kicker: u8| {
            let label = format!("A,{}", kicker);
            chart_row(label, rules, |col| soft_cell(11 + kicker, col))
        })
        .collect();
    let pairs = std::iter::once(11)
        .chain((2..=10).rev())
        .map(|value: u8| {
            let symbol = match value {
                11 => "A".to_string(),
                10 => "T".to_string(),
                v => v.to_string(),
            };
            let label = format!("{},{}", symbol, symbol);
            chart_row(label, rules, |col| pair_cell(value, col))
        })
        .collect();
    StrategyChart { hard, soft, pairs }
}

impl ChartKind {
    fn title(self) -> &'static str {
        match self {
            ChartKind::Hard => "Hard totals",
            ChartKind::Soft => "Soft totals",
            ChartKind::Pair => "Pairs",
        }
    }
}

impl StrategyChart {
    pub fn rows(&self, kind: ChartKind) -> &[ChartRow] {
        match kind {
            ChartKind::Hard => &self.hard,
            ChartKind::Soft => &self.soft,
            ChartKind::Pair => &self.pairs,
        }
    }
}

impl std::fmt::Display for StrategyChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for kind in [ChartKind::Hard, ChartKind::Soft, ChartKind::Pair] {
            writeln!(f, "{}", kind.title())?;
            write!(f, "{:>5}", "")?;
            for rank in DEALER_COLUMNS {
                write!(f, " {:>3}", rank.symbol())?;
            }
            writeln!(f)?;
            for row in self.rows(kind) {
                write!(f, "{:>5}", row.label)?;
                for entry in &row.cells {
                    write!(f, " {:>3}", entry.raw.code())?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
