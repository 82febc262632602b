//! End-to-end test of the pure fold: raw fields -> parsed event -> H3 cell
//! -> bucket key -> surge price, without a live store. Exercises the same
//! path `StreamAggregator::handle` takes internally, minus the store call.

use std::collections::HashMap;

use surge_pricing_backend::h3_index::cells_for;
use surge_pricing_backend::models::{time_key, DriverPositionEvent, OrderEvent};
use surge_pricing_backend::query::{calculate_surge, surge_for_cell};
use surge_pricing_backend::stream::aggregator::bucket_key;

fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn driver_and_order_events_fold_into_agreeing_surge_price() {
    let resolutions = [7u8, 8, 9];

    let driver_fields = fields(&[
        ("driver_id", "d1"),
        ("latitude", "-19.9191"),
        ("longitude", "-43.9378"),
        ("timestamp", "2024-05-01T12:34:10"),
    ]);
    let driver = DriverPositionEvent::parse(&driver_fields).unwrap();
    let driver_cells = cells_for(driver.latitude, driver.longitude, &resolutions).unwrap();
    let driver_minute = time_key(&driver.timestamp).unwrap();

    let order_fields = fields(&[
        ("order_id", "o1"),
        ("customer_id", "c1"),
        ("order_value", "42.00"),
        ("latitude", "-19.9191"),
        ("longitude", "-43.9378"),
        ("timestamp", "2024-05-01T12:34:40"),
    ]);
    let order = OrderEvent::parse(&order_fields).unwrap();
    let order_cells = cells_for(order.latitude, order.longitude, &resolutions).unwrap();
    let order_minute = time_key(&order.timestamp).unwrap();

    // Same location, same minute: the two events land in the same bucket
    // at every resolution.
    assert_eq!(driver_minute, order_minute);
    for res in resolutions {
        assert_eq!(
            bucket_key("driver_count_by_region", driver_minute, res),
            bucket_key("driver_count_by_region", order_minute, res)
        );
        assert_eq!(driver_cells[&res], order_cells[&res]);
    }

    let cell = driver_cells[&8].clone();
    let mut driver_counts = HashMap::new();
    driver_counts.insert(cell.clone(), 1i64);
    let mut order_counts = HashMap::new();
    order_counts.insert(cell.clone(), 1i64);

    let prices = calculate_surge(&order_counts, &driver_counts, 10.0);
    assert_eq!(prices[&cell], surge_for_cell(1, 1, 10.0));
}

#[test]
fn malformed_coordinates_reject_before_reaching_the_store() {
    let f = fields(&[
        ("driver_id", "d1"),
        ("latitude", "999.0"),
        ("longitude", "-43.9378"),
        ("timestamp", "2024-05-01T12:34:10"),
    ]);
    let driver = DriverPositionEvent::parse(&f).unwrap();
    assert!(cells_for(driver.latitude, driver.longitude, &[7]).is_err());
}
