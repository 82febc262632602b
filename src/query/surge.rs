//! Surge Calculator (C8): demand/supply ratio ladder.
//!
//! `surge_for_cell` is the single point of truth for the pricing rule;
//! `calculate_surge` is a thin per-cell fan-out over it. Both the Read
//! API's point lookup and its bulk map endpoint go through `calculate_surge`
//! so the two code paths can never disagree (the concern spec §1 raises
//! about precomputed vs. on-demand divergence).

use std::collections::HashMap;

/// Ratio (orders per driver) to price multiplier: `[0,1) -> 1.0`,
/// `[1,2) -> 1.2`, `[2,3) -> 1.5`, `[3,inf) -> 2.0`. Checked from the top
/// down; the first threshold the ratio meets or exceeds wins.
const RATIO_LADDER: &[(f64, f64)] = &[(3.0, 2.0), (2.0, 1.5), (1.0, 1.2)];

/// Computes the surge price for one cell's demand/supply counts. A cell
/// with no drivers reporting is treated as `ratio = 0`, not a division by
/// zero, landing it in the lowest ladder rung like any other low-demand
/// cell (Design Notes open question 2: supply-zero-with-orders yields
/// multiplier 1.0).
pub fn surge_for_cell(order_count: i64, driver_count: i64, base_price: f64) -> f64 {
    if order_count <= 0 {
        return base_price;
    }

    let ratio = if driver_count > 0 {
        order_count as f64 / driver_count as f64
    } else {
        0.0
    };

    let multiplier = RATIO_LADDER
        .iter()
        .find(|(threshold, _)| ratio >= *threshold)
        .map(|(_, m)| *m)
        .unwrap_or(1.0);

    base_price * multiplier
}

/// Computes surge prices for every cell present in the order map, including
/// cells with zero orders (priced at `base_price` via `surge_for_cell`).
/// Supply-only cells (drivers present, no order-map entry at all) carry no
/// surge signal and are omitted from the result.
pub fn calculate_surge(
    order_counts: &HashMap<String, i64>,
    driver_counts: &HashMap<String, i64>,
    base_price: f64,
) -> HashMap<String, f64> {
    order_counts
        .iter()
        .map(|(cell_id, &order_count)| {
            let driver_count = driver_counts.get(cell_id).copied().unwrap_or(0);
            (cell_id.clone(), surge_for_cell(order_count, driver_count, base_price))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_demand_is_base_price() {
        assert_eq!(surge_for_cell(0, 10, 10.0), 10.0);
    }

    #[test]
    fn no_supply_with_demand_is_lowest_rung() {
        assert_eq!(surge_for_cell(5, 0, 10.0), 10.0);
    }

    #[test]
    fn ratio_ladder_boundaries() {
        assert_eq!(surge_for_cell(9, 10, 10.0), 10.0); // ratio 0.9 -> [0,1)
        assert_eq!(surge_for_cell(10, 10, 10.0), 12.0); // ratio 1.0 -> [1,2)
        assert_eq!(surge_for_cell(19, 10, 10.0), 12.0); // ratio 1.9 -> [1,2)
        assert_eq!(surge_for_cell(20, 10, 10.0), 15.0); // ratio 2.0 -> [2,3)
        assert_eq!(surge_for_cell(29, 10, 10.0), 15.0); // ratio 2.9 -> [2,3)
        assert_eq!(surge_for_cell(30, 10, 10.0), 20.0); // ratio 3.0 -> [3,inf)
        assert_eq!(surge_for_cell(100, 10, 10.0), 20.0);
    }

    #[test]
    fn bulk_and_point_queries_agree() {
        let mut orders = HashMap::new();
        orders.insert("cellA".to_string(), 20);
        orders.insert("cellB".to_string(), 0);
        let mut drivers = HashMap::new();
        drivers.insert("cellA".to_string(), 10);
        drivers.insert("cellC".to_string(), 5);

        let bulk = calculate_surge(&orders, &drivers, 10.0);
        assert_eq!(bulk.len(), 2);
        assert_eq!(bulk["cellA"], surge_for_cell(20, 10, 10.0));
        assert_eq!(bulk["cellB"], surge_for_cell(0, 0, 10.0));
        assert!(!bulk.contains_key("cellC"));
    }

    /// §8 scenario 4: a cell present in the order map with zero orders is
    /// priced at base_price, not omitted; a cell absent from the order map
    /// entirely (supply-only) is omitted regardless of driver count.
    #[test]
    fn present_with_zero_orders_is_included_absent_cell_is_not() {
        let mut orders = HashMap::new();
        orders.insert("A".to_string(), 0);
        let mut drivers = HashMap::new();
        drivers.insert("A".to_string(), 5);
        drivers.insert("B".to_string(), 3);

        let surge = calculate_surge(&orders, &drivers, 10.0);
        assert_eq!(surge.len(), 1);
        assert_eq!(surge["A"], 10.0);
        assert!(!surge.contains_key("B"));
    }
}
