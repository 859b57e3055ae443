//! Coordinate adapter: (ra,dec) <-> (az,alt) conversions plus a small static
//! catalog of solar-system bodies and named stars. The `Controller` treats
//! this module purely as a collaborator behind the four pure functions
//! described in the design: every call takes an explicit observer/time and
//! holds no hidden state.

mod catalog;
mod moon;
mod planets;
mod sun;

pub use catalog::{SkyObject, CATALOG};

use crate::astro_math::{
    calculate_alt_from_ha_dec, calculate_az_from_ha_dec, calculate_ha_dec_from_alt_az,
    calculate_hour_angle, calculate_local_sidereal_time, modulo, Degrees, Hours,
};
use chrono::{DateTime, Utc};

/// Observer location. Longitude/latitude are stored in degrees (east
/// positive) for direct use with `astro_math`; the wire protocol's
/// `LOCATION` command carries radians and is converted at the boundary in
/// `controller`.
#[derive(Debug, Copy, Clone)]
pub struct Observer {
    pub longitude_deg: Degrees,
    pub latitude_deg: Degrees,
    pub elevation_m: f64,
}

/// Julian Day for `when`, good to millisecond precision.
pub(crate) fn julian_day(when: DateTime<Utc>) -> f64 {
    use chrono::TimeZone;
    let jdref = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
    let diff = when.signed_duration_since(jdref);
    2451545.0 + diff.num_milliseconds() as f64 / 86_400_000.0
}

pub(crate) fn days_since_j2000(when: DateTime<Utc>) -> f64 {
    julian_day(when) - 2451545.0
}

/// Mean obliquity of the ecliptic at `when`, in degrees.
pub(crate) fn obliquity_deg(when: DateTime<Utc>) -> f64 {
    23.439 - 0.0000004 * days_since_j2000(when)
}

/// Convert ecliptic (lon, lat) in degrees to equatorial (ra hours, dec deg).
pub(crate) fn equatorial_from_ecliptic(
    lon_deg: f64,
    lat_deg: f64,
    obliquity_deg: f64,
) -> (Hours, Degrees) {
    let l = lon_deg.to_radians();
    let b = lat_deg.to_radians();
    let e = obliquity_deg.to_radians();

    let ra = (l.sin() * e.cos() - b.tan() * e.sin()).atan2(l.cos());
    let dec = (b.sin() * e.cos() + b.cos() * e.sin() * l.sin()).asin();

    (modulo(crate::astro_math::rad_to_hours(ra), 24.0), crate::astro_math::rad_to_deg(dec))
}

/// Convert (ra hours, dec deg) to (az deg, alt deg) for `observer` at `when`.
pub fn compute_azalt(ra_hours: Hours, dec_deg: Degrees, observer: &Observer, when: DateTime<Utc>) -> (Degrees, Degrees) {
    let ha = calculate_hour_angle(when, observer.longitude_deg, ra_hours);
    let alt = calculate_alt_from_ha_dec(ha, dec_deg, observer.latitude_deg);
    let az = calculate_az_from_ha_dec(ha, dec_deg, observer.latitude_deg);
    (az, alt)
}

/// Convert (az deg, alt deg) to (ra hours, dec deg) for `observer` at `when`.
/// `alt_deg` is clamped to `[-90,90]` before conversion: it is fed live motor
/// angles, which can otherwise wander outside the domain
/// `calculate_ha_dec_from_alt_az` requires and panic.
pub fn radec_of(az_deg: Degrees, alt_deg: Degrees, observer: &Observer, when: DateTime<Utc>) -> (Hours, Degrees) {
    let alt_deg = alt_deg.clamp(-90.0, 90.0);
    let (ha, dec) = calculate_ha_dec_from_alt_az(alt_deg, az_deg, observer.latitude_deg);
    let lst = calculate_local_sidereal_time(when, observer.longitude_deg);
    let ra = modulo(lst - ha, 24.0);
    (ra, dec)
}

/// Bodies above the horizon for `observer` at `when`, as (catalog index,
/// name) pairs, in catalog order.
pub fn visible_objects(observer: &Observer, when: DateTime<Utc>) -> Vec<(usize, &'static str)> {
    CATALOG
        .iter()
        .enumerate()
        .filter_map(|(i, obj)| {
            let (ra, dec) = obj.radec(when);
            let (_az, alt) = compute_azalt(ra, dec, observer, when);
            if alt > 0.0 {
                Some((i, obj.name()))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn azalt_radec_roundtrip() {
        let observer = Observer {
            longitude_deg: -1.0,
            latitude_deg: 51.5,
            elevation_m: 50.0,
        };
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap();

        let ra = 5.5;
        let dec = 20.0;
        let (az, alt) = compute_azalt(ra, dec, &observer, when);
        let (ra2, dec2) = radec_of(az, alt, &observer, when);

        assert!((ra - ra2).abs() < 1e-6 || (ra - ra2).abs() > 23.999_99);
        assert!((dec - dec2).abs() < 1e-6);
    }

    #[test]
    fn visible_objects_only_lists_positive_altitude() {
        let observer = Observer {
            longitude_deg: 0.0,
            latitude_deg: 51.47,
            elevation_m: 15.0,
        };
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let visible = visible_objects(&observer, when);
        for (i, _) in &visible {
            let obj = &CATALOG[*i];
            let (ra, dec) = obj.radec(when);
            let (_, alt) = compute_azalt(ra, dec, &observer, when);
            assert!(alt > 0.0);
        }
    }
}
