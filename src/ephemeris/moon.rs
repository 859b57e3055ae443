//! Low-precision lunar position: mean elements plus the handful of largest
//! perturbation terms, good to a few arcminutes — enough to know whether the
//! Moon is above the horizon, not for sub-arcsecond astrometry.

use super::{days_since_j2000, equatorial_from_ecliptic, obliquity_deg};
use crate::astro_math::{modulo, Degrees, Hours};
use chrono::{DateTime, Utc};

pub fn radec(when: DateTime<Utc>) -> (Hours, Degrees) {
    let d = days_since_j2000(when);

    let l0 = modulo(218.316 + 13.176396 * d, 360.0); // mean longitude
    let m = modulo(134.963 + 13.064993 * d, 360.0); // mean anomaly
    let f = modulo(93.272 + 13.229350 * d, 360.0); // argument of latitude

    let lon = modulo(l0 + 6.289 * m.to_radians().sin(), 360.0);
    let lat = 5.128 * f.to_radians().sin();

    equatorial_from_ecliptic(lon, lat, obliquity_deg(when))
}
