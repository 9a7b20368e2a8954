use std::{cmp::Ordering, fmt::Write, str::FromStr};

use aggregator::{aggregate_by_sector, find_sector, sector_allocation};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color, Table};
use domain::{Holding, PeRatio, SectorAllocation, SectorSummary};
use piechart::{Chart, Color as SliceColor, Data};
use thiserror::Error;

use crate::fetcher::DashboardState;

const LOADING: &str = "Loading portfolio...";
const BAR_WIDTH: usize = 30;
const SLICE_COLORS: [SliceColor; 7] = [
    SliceColor::Blue,
    SliceColor::Green,
    SliceColor::Yellow,
    SliceColor::Cyan,
    SliceColor::Purple,
    SliceColor::Red,
    SliceColor::White,
];

/// Holdings table columns, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Symbol,
    Exchange,
    Sector,
    Quantity,
    PurchasePrice,
    Investment,
    Cmp,
    PresentValue,
    GainLoss,
    GainLossPercent,
    PeRatio,
    Eps,
    LatestNetIncome,
    PortfolioPercent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortParseError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("unknown sort direction: {0}")]
    UnknownDirection(String),
}

impl FromStr for SortKey {
    type Err = SortParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = match value.trim().to_ascii_lowercase().as_str() {
            "symbol" => SortKey::Symbol,
            "exchange" => SortKey::Exchange,
            "sector" => SortKey::Sector,
            "quantity" | "qty" => SortKey::Quantity,
            "purchaseprice" => SortKey::PurchasePrice,
            "investment" => SortKey::Investment,
            "cmp" => SortKey::Cmp,
            "presentvalue" => SortKey::PresentValue,
            "gainloss" => SortKey::GainLoss,
            "gainlosspercent" => SortKey::GainLossPercent,
            "peratio" | "pe" => SortKey::PeRatio,
            "eps" => SortKey::Eps,
            "latestnetincome" => SortKey::LatestNetIncome,
            "portfoliopercent" => SortKey::PortfolioPercent,
            _ => return Err(SortParseError::UnknownColumn(value.to_string())),
        };
        Ok(key)
    }
}

/// Accepts `column` or `column:asc|desc`, e.g. `presentValue:desc`.
impl FromStr for SortSpec {
    type Err = SortParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (column, direction) = value.split_once(':').unwrap_or((value, "asc"));
        let direction = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Ascending,
            "desc" => SortDirection::Descending,
            other => return Err(SortParseError::UnknownDirection(other.to_string())),
        };
        Ok(Self {
            key: column.parse()?,
            direction,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub sort: Option<SortSpec>,
    pub sector: Option<String>,
}

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_value(holding: &Holding, key: SortKey) -> SortValue<'_> {
    let parsed = |text: &str| text.trim().parse::<f64>().ok();
    match key {
        SortKey::Symbol => SortValue::Text(&holding.symbol),
        SortKey::Exchange => SortValue::Text(&holding.exchange),
        SortKey::Sector => SortValue::Text(&holding.sector),
        SortKey::Quantity => SortValue::Number(holding.quantity),
        SortKey::PurchasePrice => SortValue::Number(holding.purchase_price),
        SortKey::Investment => SortValue::Number(holding.investment),
        SortKey::Cmp => SortValue::Number(holding.cmp),
        SortKey::PresentValue => SortValue::Number(holding.present_value),
        SortKey::GainLoss => SortValue::Number(holding.gain_loss),
        SortKey::GainLossPercent => parsed(&holding.gain_loss_percent)
            .map(SortValue::Number)
            .unwrap_or(SortValue::Text(&holding.gain_loss_percent)),
        SortKey::PeRatio => match &holding.pe_ratio {
            PeRatio::Value(value) => SortValue::Number(*value),
            PeRatio::Unavailable(label) => SortValue::Text(label),
        },
        SortKey::Eps => SortValue::Number(holding.eps),
        SortKey::LatestNetIncome => SortValue::Text(&holding.latest_net_income),
        SortKey::PortfolioPercent => parsed(&holding.portfolio_percent)
            .map(SortValue::Number)
            .unwrap_or(SortValue::Text(&holding.portfolio_percent)),
    }
}

fn compare(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        // numbers before markers like "N/A"
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Stable sort by one column; ties keep snapshot order in both directions.
pub fn sort_holdings(holdings: &[Holding], spec: SortSpec) -> Vec<&Holding> {
    let mut rows: Vec<&Holding> = holdings.iter().collect();
    rows.sort_by(|a, b| {
        let ordering = compare(&sort_value(a, spec.key), &sort_value(b, spec.key));
        match spec.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    rows
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

fn signed(text: String, gain: bool) -> Cell {
    let color = if gain { Color::Green } else { Color::Red };
    Cell::new(text).set_alignment(CellAlignment::Right).fg(color)
}

pub fn holdings_table(rows: &[&Holding]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header(&[
        "Symbol",
        "Exchange",
        "Sector",
        "Qty",
        "Purchase Price",
        "Investment",
        "CMP",
        "Present Value",
        "Gain/Loss",
        "Gain %",
        "P/E",
        "EPS",
        "Net Income",
        "% Portfolio",
    ]));

    for holding in rows {
        table.add_row(vec![
            Cell::new(&holding.symbol),
            Cell::new(&holding.exchange),
            Cell::new(&holding.sector),
            Cell::new(holding.quantity).set_alignment(CellAlignment::Right),
            number(holding.purchase_price),
            number(holding.investment),
            number(holding.cmp),
            number(holding.present_value),
            signed(format!("{:.2}", holding.gain_loss), holding.is_gain()),
            Cell::new(&holding.gain_loss_percent).set_alignment(CellAlignment::Right),
            Cell::new(&holding.pe_ratio).set_alignment(CellAlignment::Right),
            Cell::new(holding.eps).set_alignment(CellAlignment::Right),
            Cell::new(&holding.latest_net_income),
            Cell::new(format!("{}%", holding.portfolio_percent)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn sector_table(summaries: &[&SectorSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header(&[
        "Sector",
        "Total Investment",
        "Total Present Value",
        "Gain/Loss %",
    ]));
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.sector),
            number(summary.investment),
            number(summary.present_value),
            signed(format!("{}%", summary.gain_loss_percent), summary.is_gain()),
        ]);
    }
    table
}

pub fn allocation_table(allocation: &[SectorAllocation]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Sector", "Present Value", "Share"]));
    for slice in allocation {
        table.add_row(vec![
            Cell::new(&slice.sector),
            number(slice.present_value),
            Cell::new(format!("{:.2}%", slice.share)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Pie of each sector's present value. Empty or worthless portfolios get a note instead.
pub fn allocation_chart(allocation: &[SectorAllocation]) -> String {
    if allocation.iter().all(|slice| slice.present_value <= 0.0) {
        return "No allocation data\n".to_string();
    }
    let data: Vec<Data> = allocation
        .iter()
        .enumerate()
        .map(|(i, slice)| Data {
            label: slice.sector.clone(),
            value: slice.present_value.max(0.0) as f32,
            color: Some(SLICE_COLORS[i % SLICE_COLORS.len()].into()),
            fill: '•',
        })
        .collect();

    let mut buf = Vec::new();
    if let Err(err) = Chart::new()
        .legend(true)
        .radius(7)
        .aspect_ratio(3)
        .draw_into(&mut buf, &data)
    {
        return format!("allocation chart unavailable: {err}\n");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Horizontal bars of each sector's gain/loss percentage, scaled to the largest magnitude.
/// Gains draw with `█`, losses with `░`.
pub fn gain_loss_bars(summaries: &[SectorSummary]) -> String {
    let percents: Vec<f64> = summaries
        .iter()
        .map(|s| s.gain_loss_percent.parse::<f64>().unwrap_or(0.0))
        .collect();
    let widest = summaries.iter().map(|s| s.sector.len()).max().unwrap_or(0);
    let peak = percents.iter().fold(0.0_f64, |acc, pct| acc.max(pct.abs()));

    let mut out = String::new();
    for (summary, pct) in summaries.iter().zip(&percents) {
        let len = if peak > 0.0 {
            ((pct.abs() / peak) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let glyph = if summary.is_gain() { "█" } else { "░" };
        let _ = writeln!(
            out,
            "{:<widest$} | {:<bar$} {}%",
            summary.sector,
            glyph.repeat(len),
            summary.gain_loss_percent,
            bar = BAR_WIDTH,
        );
    }
    out
}

/// Renders the whole dashboard for one state. Sector figures are rebuilt from the holdings on
/// every call.
pub fn render_view(state: &DashboardState, options: &ViewOptions) -> String {
    if state.loading {
        return LOADING.to_string();
    }

    let summaries = aggregate_by_sector(&state.holdings);
    let allocation = sector_allocation(&summaries);
    let mut out = String::from("Stock Analysis Dashboard\n");

    // Writing into a String cannot fail.
    if let Some(updated) = state.last_updated {
        let _ = writeln!(out, "Updated {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(err) = &state.last_error {
        let _ = writeln!(out, "Last refresh failed: {err}");
    }

    let _ = writeln!(out, "\nSector Summary");
    let selected: Vec<&SectorSummary> = match options.sector.as_deref() {
        Some(sector) => find_sector(&summaries, sector).into_iter().collect(),
        None => summaries.iter().collect(),
    };
    let _ = match (options.sector.as_deref(), selected.is_empty()) {
        (Some(sector), true) => writeln!(out, "No holdings in sector {sector}"),
        _ => writeln!(out, "{}", sector_table(&selected)),
    };

    let _ = writeln!(out, "\nSector Allocation");
    out.push_str(&allocation_chart(&allocation));
    let _ = writeln!(out, "{}", allocation_table(&allocation));

    let _ = writeln!(out, "\nSector Gain/Loss %");
    out.push_str(&gain_loss_bars(&summaries));

    let rows = match options.sort {
        Some(spec) => sort_holdings(&state.holdings, spec),
        None => state.holdings.iter().collect(),
    };
    let _ = writeln!(out, "\nHoldings");
    let _ = writeln!(out, "{}", holdings_table(&rows));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn holding(symbol: &str, sector: &str, investment: f64, present_value: f64) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            sector: sector.to_string(),
            purchase_price: investment / 10.0,
            quantity: 10.0,
            investment,
            cmp: present_value / 10.0,
            present_value,
            gain_loss: present_value - investment,
            gain_loss_percent: format!("{:.2}", (present_value - investment) / investment * 100.0),
            pe_ratio: PeRatio::Value(21.5),
            eps: 3.2,
            latest_net_income: "120 Cr".to_string(),
            portfolio_percent: "10.00".to_string(),
        }
    }

    fn loaded(holdings: Vec<Holding>) -> DashboardState {
        DashboardState {
            holdings: Arc::new(holdings),
            loading: false,
            last_updated: None,
            last_error: None,
        }
    }

    fn symbols(rows: &[&Holding]) -> Vec<String> {
        rows.iter().map(|h| h.symbol.clone()).collect()
    }

    #[test]
    fn parses_sort_specs() {
        assert_eq!(
            "presentValue:desc".parse::<SortSpec>(),
            Ok(SortSpec {
                key: SortKey::PresentValue,
                direction: SortDirection::Descending,
            })
        );
        assert_eq!(
            "symbol".parse::<SortSpec>(),
            Ok(SortSpec {
                key: SortKey::Symbol,
                direction: SortDirection::Ascending,
            })
        );
        assert_eq!(
            "volume".parse::<SortSpec>(),
            Err(SortParseError::UnknownColumn("volume".to_string()))
        );
        assert!(matches!(
            "cmp:sideways".parse::<SortSpec>(),
            Err(SortParseError::UnknownDirection(_))
        ));
    }

    #[test]
    fn sorts_numeric_columns_numerically() {
        let holdings = vec![
            holding("A", "Tech", 100.0, 900.0),
            holding("B", "Tech", 100.0, 95.0),
            holding("C", "Tech", 100.0, 1000.0),
        ];
        let spec = SortSpec {
            key: SortKey::PresentValue,
            direction: SortDirection::Descending,
        };
        assert_eq!(symbols(&sort_holdings(&holdings, spec)), vec!["C", "A", "B"]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let holdings = vec![
            holding("ONGC", "Energy", 10.0, 12.0),
            holding("INFY", "Tech", 10.0, 12.0),
            holding("BPCL", "Energy", 10.0, 12.0),
        ];
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let spec = SortSpec {
                key: SortKey::Investment,
                direction,
            };
            assert_eq!(
                symbols(&sort_holdings(&holdings, spec)),
                vec!["ONGC", "INFY", "BPCL"]
            );
        }
    }

    #[test]
    fn unavailable_pe_sorts_after_numbers() {
        let mut loss_maker = holding("PAYTM", "Financials", 100.0, 60.0);
        loss_maker.pe_ratio = PeRatio::Unavailable("N/A".to_string());
        let holdings = vec![loss_maker, holding("HDFC", "Financials", 100.0, 110.0)];
        let spec = SortSpec {
            key: SortKey::PeRatio,
            direction: SortDirection::Ascending,
        };
        assert_eq!(symbols(&sort_holdings(&holdings, spec)), vec!["HDFC", "PAYTM"]);
    }

    #[test]
    fn loading_state_renders_placeholder() {
        let view = render_view(&DashboardState::default(), &ViewOptions::default());
        assert_eq!(view, LOADING);
    }

    #[test]
    fn renders_sector_summary_and_holdings() {
        let state = loaded(vec![
            holding("INFY", "Tech", 100.0, 150.0),
            holding("TCS", "Tech", 50.0, 40.0),
            holding("ONGC", "Energy", 80.0, 60.0),
        ]);
        let view = render_view(&state, &ViewOptions::default());
        assert!(view.contains("Sector Summary"));
        assert!(view.contains("26.67%"));
        assert!(view.contains("-25.00%"));
        assert!(view.contains("190.00"));
        assert!(view.contains("INFY"));
        assert!(view.contains("-20.00"));
        assert!(view.contains("10.00%"));
    }

    #[test]
    fn selected_sector_filters_summary_table() {
        let state = loaded(vec![
            holding("INFY", "Tech", 100.0, 150.0),
            holding("ONGC", "Energy", 80.0, 60.0),
        ]);
        let options = ViewOptions {
            sort: None,
            sector: Some("Energy".to_string()),
        };
        let view = render_view(&state, &options);
        let summary = view
            .split("Sector Allocation")
            .next()
            .expect("summary section");
        assert!(summary.contains("Energy"));
        assert!(!summary.contains("Tech"));

        let options = ViewOptions {
            sort: None,
            sector: Some("Utilities".to_string()),
        };
        assert!(render_view(&state, &options).contains("No holdings in sector Utilities"));
    }

    #[test]
    fn failed_refresh_is_reported_alongside_stale_data() {
        let mut state = loaded(vec![holding("INFY", "Tech", 100.0, 150.0)]);
        state.last_error = Some("portfolio request failed".to_string());
        let view = render_view(&state, &ViewOptions::default());
        assert!(view.contains("Last refresh failed: portfolio request failed"));
        assert!(view.contains("INFY"));
    }

    #[test]
    fn renders_allocation_pie_and_gain_loss_bars() {
        let state = loaded(vec![
            holding("INFY", "Tech", 100.0, 150.0),
            holding("ONGC", "Energy", 80.0, 60.0),
        ]);
        let view = render_view(&state, &ViewOptions::default());

        let allocation = view.find("Sector Allocation").expect("allocation section");
        let bars = view.find("Sector Gain/Loss %").expect("bar section");
        let holdings = view.find("\nHoldings").expect("holdings section");
        assert!(allocation < bars && bars < holdings);
        assert!(view[allocation..bars].contains('•'));

        let bar_lines: Vec<&str> = view[bars..holdings].lines().skip(1).collect();
        assert_eq!(bar_lines.len(), 2);
        assert!(bar_lines[0].starts_with("Tech"));
        assert!(bar_lines[0].ends_with("50.00%"));
        assert_eq!(bar_lines[0].matches('█').count(), BAR_WIDTH);
        assert!(bar_lines[1].starts_with("Energy"));
        assert!(bar_lines[1].ends_with("-25.00%"));
        assert_eq!(bar_lines[1].matches('░').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn empty_portfolio_has_no_pie() {
        let view = render_view(&loaded(Vec::new()), &ViewOptions::default());
        assert!(view.contains("No allocation data"));
        assert!(!view.contains('•'));
    }
}
