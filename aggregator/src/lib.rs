use std::collections::HashMap;

use domain::{Holding, SectorAllocation, SectorBreakdown, SectorSummary};

/// Groups holdings by sector, summing invested and present value per sector.
///
/// Sectors come out in the order they first appear in `holdings`. The gain/loss percentage is
/// always recomputed from the sums, never copied from a holding.
pub fn aggregate_by_sector(holdings: &[Holding]) -> Vec<SectorSummary> {
    let mut order: Vec<(&str, f64, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for holding in holdings {
        let slot = *index.entry(holding.sector.as_str()).or_insert_with(|| {
            order.push((holding.sector.as_str(), 0.0, 0.0));
            order.len() - 1
        });
        let entry = &mut order[slot];
        entry.1 += holding.investment;
        entry.2 += holding.present_value;
    }

    order
        .into_iter()
        .map(|(sector, investment, present_value)| SectorSummary {
            sector: sector.to_string(),
            investment,
            present_value,
            gain_loss_percent: gain_loss_percent(investment, present_value),
        })
        .collect()
}

/// `((present - invested) / invested) * 100` to two decimals, `"0.00"` for zero investment.
pub fn gain_loss_percent(investment: f64, present_value: f64) -> String {
    if investment == 0.0 {
        return "0.00".to_string();
    }
    format_percent((present_value - investment) / investment * 100.0)
}

/// Two-decimal rendering where exact midpoints round away from zero.
///
/// `{:.2}` already rounds the exact binary value correctly, so only true midpoints need care. A
/// double sits exactly halfway between two hundredths only when it is an odd multiple of 1/8.
pub fn format_percent(value: f64) -> String {
    let eighths = value.abs() * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        let cents = (value * 100.0).round();
        return format!("{:.2}", cents / 100.0);
    }
    format!("{value:.2}")
}

/// Each sector's share of the total present value, for the allocation chart.
pub fn sector_allocation(summaries: &[SectorSummary]) -> Vec<SectorAllocation> {
    let total: f64 = summaries.iter().map(|s| s.present_value).sum();
    summaries
        .iter()
        .map(|summary| SectorAllocation {
            sector: summary.sector.clone(),
            present_value: summary.present_value,
            share: if total > 0.0 {
                summary.present_value / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

pub fn find_sector<'a>(summaries: &'a [SectorSummary], sector: &str) -> Option<&'a SectorSummary> {
    summaries.iter().find(|summary| summary.sector == sector)
}

pub fn breakdown(holdings: &[Holding]) -> SectorBreakdown {
    let sectors = aggregate_by_sector(holdings);
    let allocation = sector_allocation(&sectors);
    SectorBreakdown {
        sectors,
        allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::PeRatio;
    use std::collections::HashSet;

    fn holding(symbol: &str, sector: &str, investment: f64, present_value: f64) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            sector: sector.to_string(),
            purchase_price: investment,
            quantity: 1.0,
            investment,
            cmp: present_value,
            present_value,
            gain_loss: present_value - investment,
            gain_loss_percent: "999.99".to_string(),
            pe_ratio: PeRatio::Value(20.0),
            eps: 1.0,
            latest_net_income: "1 Cr".to_string(),
            portfolio_percent: "0.00".to_string(),
        }
    }

    fn sample() -> Vec<Holding> {
        vec![
            holding("INFY", "Tech", 100.0, 120.0),
            holding("ONGC", "Energy", 80.0, 60.0),
            holding("TCS", "Tech", 40.0, 50.0),
            holding("HDFC", "Financials", 300.0, 330.0),
            holding("RELIANCE", "Energy", 20.0, 25.0),
        ]
    }

    #[test]
    fn merges_same_sector_into_one_summary() {
        let input = vec![
            holding("A", "Tech", 100.0, 150.0),
            holding("B", "Tech", 50.0, 40.0),
        ];
        let out = aggregate_by_sector(&input);
        assert_eq!(
            out,
            vec![SectorSummary {
                sector: "Tech".to_string(),
                investment: 150.0,
                present_value: 190.0,
                gain_loss_percent: "26.67".to_string(),
            }]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate_by_sector(&[]).is_empty());
    }

    #[test]
    fn zero_investment_reports_zero_percent() {
        let out = aggregate_by_sector(&[holding("X", "Energy", 0.0, 0.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sector, "Energy");
        assert_eq!(out[0].investment, 0.0);
        assert_eq!(out[0].present_value, 0.0);
        assert_eq!(out[0].gain_loss_percent, "0.00");

        let out = aggregate_by_sector(&[holding("Y", "Gift", 0.0, 75.0)]);
        assert_eq!(out[0].gain_loss_percent, "0.00");
    }

    #[test]
    fn single_holding_percent_is_recomputed() {
        let out = aggregate_by_sector(&[holding("ONGC", "Energy", 80.0, 60.0)]);
        assert_eq!(out[0].investment, 80.0);
        assert_eq!(out[0].present_value, 60.0);
        assert_eq!(out[0].gain_loss_percent, "-25.00");
    }

    #[test]
    fn sectors_follow_first_appearance_without_duplicates() {
        let input = sample();
        let out = aggregate_by_sector(&input);
        let names: Vec<_> = out.iter().map(|s| s.sector.as_str()).collect();
        assert_eq!(names, vec!["Tech", "Energy", "Financials"]);

        let distinct: HashSet<_> = input.iter().map(|h| h.sector.as_str()).collect();
        let produced: HashSet<_> = names.iter().copied().collect();
        assert_eq!(produced, distinct);
        assert_eq!(produced.len(), names.len());
    }

    #[test]
    fn sums_match_input_per_sector() {
        let input = sample();
        for summary in aggregate_by_sector(&input) {
            let members = input.iter().filter(|h| h.sector == summary.sector);
            let (inv, pv) = members.fold((0.0, 0.0), |(i, p), h| {
                (i + h.investment, p + h.present_value)
            });
            assert_eq!(summary.investment, inv);
            assert_eq!(summary.present_value, pv);
        }
    }

    #[test]
    fn totals_are_order_independent_but_order_is_stable() {
        let input = sample();
        let mut reversed = input.clone();
        reversed.reverse();

        let forward = aggregate_by_sector(&input);
        let backward = aggregate_by_sector(&reversed);

        let names: Vec<_> = backward.iter().map(|s| s.sector.as_str()).collect();
        assert_eq!(names, vec!["Energy", "Financials", "Tech"]);

        for summary in &forward {
            let other = find_sector(&backward, &summary.sector).expect("sector present");
            assert_eq!(summary.investment, other.investment);
            assert_eq!(summary.present_value, other.present_value);
            assert_eq!(summary.gain_loss_percent, other.gain_loss_percent);
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        let input = sample();
        assert_eq!(aggregate_by_sector(&input), aggregate_by_sector(&input));
    }

    #[test]
    fn allocation_shares_sum_to_hundred() {
        let summaries = aggregate_by_sector(&sample());
        let allocation = sector_allocation(&summaries);
        assert_eq!(allocation.len(), summaries.len());
        let total: f64 = allocation.iter().map(|a| a.share).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(allocation[0].sector, "Tech");
        assert!((allocation[0].share - 170.0 / 585.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn allocation_of_worthless_portfolio_is_zero() {
        let summaries = aggregate_by_sector(&[holding("X", "Energy", 0.0, 0.0)]);
        let allocation = sector_allocation(&summaries);
        assert_eq!(allocation[0].share, 0.0);
    }

    #[test]
    fn find_sector_returns_selected_summary() {
        let summaries = aggregate_by_sector(&sample());
        let energy = find_sector(&summaries, "Energy").expect("energy present");
        assert_eq!(energy.investment, 100.0);
        assert_eq!(energy.present_value, 85.0);
        assert_eq!(energy.gain_loss_percent, "-15.00");
        assert!(!energy.is_gain());
        assert!(find_sector(&summaries, "Utilities").is_none());
    }

    #[test]
    fn breakdown_bundles_sectors_and_allocation() {
        let out = breakdown(&sample());
        assert_eq!(out.sectors.len(), 3);
        assert_eq!(out.allocation.len(), 3);
        let json = serde_json::to_value(&out).expect("serialize");
        assert_eq!(json["sectors"][0]["gainLossPercent"], "21.43");
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        assert_eq!(gain_loss_percent(800.0, 801.0), "0.13");
        assert_eq!(gain_loss_percent(8000.0, 8010.0), "0.13");
        assert_eq!(gain_loss_percent(100.0, 101.125), "1.13");
        assert_eq!(format_percent(0.625), "0.63");
        assert_eq!(format_percent(-0.125), "-0.13");
        assert_eq!(format_percent(12.345), "12.35");
        assert_eq!(format_percent(2.5), "2.50");
        assert_eq!(format_percent(-25.0), "-25.00");
    }
}
