//! Low-precision Sun position, adapted from the USNO approximate formula
//! (accurate to about 1 arcminute within two centuries of J2000).

use super::{days_since_j2000, equatorial_from_ecliptic, obliquity_deg};
use crate::astro_math::{modulo, Degrees, Hours};
use chrono::{DateTime, Utc};

pub fn radec(when: DateTime<Utc>) -> (Hours, Degrees) {
    let d = days_since_j2000(when);

    let g = modulo(357.529 + 0.98560028 * d, 360.0);
    let q = modulo(280.459 + 0.98564736 * d, 360.0);
    let l = modulo(
        q + 1.915 * g.to_radians().sin() + 0.020 * (2.0 * g).to_radians().sin(),
        360.0,
    );

    equatorial_from_ecliptic(l, 0.0, obliquity_deg(when))
}
