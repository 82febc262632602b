//! H3 Indexer (C2): a pure function from `(lat, lon)` to an H3 cell id at
//! each configured resolution. No state, no I/O.

use std::collections::HashMap;

use h3o::{LatLng, Resolution};

use crate::error::HandlerError;

/// Maps `(latitude, longitude)` to one H3 cell id per requested resolution.
///
/// The only error surface is invalid numeric input (NaN, out-of-range
/// latitude/longitude, or a resolution outside H3's 0..=15 hierarchy), which
/// the caller should treat as a malformed-event failure for the message
/// being processed (spec §4.1).
pub fn cells_for(
    latitude: f64,
    longitude: f64,
    resolutions: &[u8],
) -> Result<HashMap<u8, String>, HandlerError> {
    let coord = LatLng::new(latitude, longitude).map_err(|e| {
        HandlerError::Malformed(format!(
            "invalid coordinates ({latitude}, {longitude}): {e}"
        ))
    })?;

    let mut cells = HashMap::with_capacity(resolutions.len());
    for &res in resolutions {
        let resolution = Resolution::try_from(res).map_err(|e| {
            HandlerError::Malformed(format!("invalid H3 resolution {res}: {e}"))
        })?;
        let cell = coord.to_cell(resolution);
        cells.insert(res, cell.to_string());
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_one_cell_per_resolution() {
        let cells = cells_for(-19.9191, -43.9378, &[7, 8, 9]).unwrap();
        assert_eq!(cells.len(), 3);
        assert!(cells.contains_key(&7));
        assert!(cells.contains_key(&8));
        assert!(cells.contains_key(&9));
    }

    #[test]
    fn same_point_is_deterministic() {
        let a = cells_for(-19.9191, -43.9378, &[9]).unwrap();
        let b = cells_for(-19.9191, -43.9378, &[9]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn nearby_points_at_coarse_resolution_share_a_cell() {
        let a = cells_for(-19.91910, -43.93780, &[7]).unwrap();
        let b = cells_for(-19.91911, -43.93781, &[7]).unwrap();
        assert_eq!(a[&7], b[&7]);
    }

    #[test]
    fn invalid_latitude_is_malformed() {
        assert!(cells_for(f64::NAN, 0.0, &[7]).is_err());
        assert!(cells_for(200.0, 0.0, &[7]).is_err());
    }
}
