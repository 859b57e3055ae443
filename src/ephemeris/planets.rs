//! Two-body Keplerian heliocentric elements with linear secular rates — the
//! widely used compact "approximate position of the planets" scheme, good
//! to a fraction of a degree over the coming decades.

use super::{days_since_j2000, equatorial_from_ecliptic, obliquity_deg};
use crate::astro_math::{modulo, Degrees, Hours};
use chrono::{DateTime, Utc};

#[derive(Debug, Copy, Clone)]
pub struct Elements {
    pub n0: f64,
    pub n_rate: f64,
    pub i0: f64,
    pub i_rate: f64,
    pub w0: f64,
    pub w_rate: f64,
    pub a: f64,
    pub e0: f64,
    pub e_rate: f64,
    pub m0: f64,
    pub m_rate: f64,
}

impl Elements {
    const fn new(
        n0: f64,
        n_rate: f64,
        i0: f64,
        i_rate: f64,
        w0: f64,
        w_rate: f64,
        a: f64,
        e0: f64,
        e_rate: f64,
        m0: f64,
        m_rate: f64,
    ) -> Self {
        Self {
            n0,
            n_rate,
            i0,
            i_rate,
            w0,
            w_rate,
            a,
            e0,
            e_rate,
            m0,
            m_rate,
        }
    }

    fn at(&self, d: f64) -> (f64, f64, f64, f64, f64, f64) {
        (
            modulo(self.n0 + self.n_rate * d, 360.0),
            self.i0 + self.i_rate * d,
            modulo(self.w0 + self.w_rate * d, 360.0),
            self.a,
            self.e0 + self.e_rate * d,
            modulo(self.m0 + self.m_rate * d, 360.0),
        )
    }
}

pub const EARTH: Elements = Elements::new(
    0.0,
    0.0,
    0.0,
    0.0,
    282.9404,
    4.70935e-5,
    1.000000,
    0.016709,
    -1.151e-9,
    356.0470,
    0.9856002585,
);

pub const MERCURY: Elements = Elements::new(
    48.3313,
    3.24587e-5,
    7.0047,
    5.00e-8,
    29.1241,
    1.01444e-5,
    0.387098,
    0.205635,
    5.59e-10,
    168.6562,
    4.0923344368,
);

pub const VENUS: Elements = Elements::new(
    76.6799,
    2.46590e-5,
    3.3946,
    2.75e-8,
    54.8910,
    1.38374e-5,
    0.723330,
    0.006773,
    -1.302e-9,
    48.0052,
    1.6021302244,
);

pub const MARS: Elements = Elements::new(
    49.5574,
    2.11081e-5,
    1.8497,
    -1.78e-8,
    286.5016,
    2.92961e-5,
    1.523688,
    0.093405,
    2.516e-9,
    18.6021,
    0.5240207766,
);

pub const JUPITER: Elements = Elements::new(
    100.4542,
    2.76854e-5,
    1.3030,
    -1.557e-7,
    273.8777,
    1.64505e-5,
    5.20256,
    0.048498,
    4.469e-9,
    19.8950,
    0.0830853001,
);

pub const SATURN: Elements = Elements::new(
    113.6634,
    2.38980e-5,
    2.4886,
    -1.081e-7,
    339.3939,
    2.97661e-5,
    9.55475,
    0.055546,
    -9.499e-9,
    316.9670,
    0.0334442282,
);

/// Eccentric anomaly via Newton's method on Kepler's equation. A handful of
/// iterations is plenty at the eccentricities involved here.
fn eccentric_anomaly(m_deg: f64, e: f64) -> f64 {
    let m = m_deg.to_radians();
    let mut ecc = m + e * m.sin() * (1.0 + e * m.cos());
    for _ in 0..8 {
        let delta = ecc - e * ecc.sin() - m;
        let derivative = 1.0 - e * ecc.cos();
        ecc -= delta / derivative;
    }
    ecc
}

fn heliocentric_ecliptic(elements: &Elements, d: f64) -> (f64, f64, f64) {
    let (n, i, w, a, e, m) = elements.at(d);
    let ecc = eccentric_anomaly(m, e);

    let xv = a * (ecc.cos() - e);
    let yv = a * ((1.0 - e * e).sqrt() * ecc.sin());

    let r = (xv * xv + yv * yv).sqrt();
    let v = yv.atan2(xv); // true anomaly, radians

    let vw = v + w.to_radians();
    let n = n.to_radians();
    let i = i.to_radians();

    let xh = r * (n.cos() * vw.cos() - n.sin() * vw.sin() * i.cos());
    let yh = r * (n.sin() * vw.cos() + n.cos() * vw.sin() * i.cos());
    let zh = r * (vw.sin() * i.sin());

    (xh, yh, zh)
}

fn geocentric_radec(elements: &Elements, when: DateTime<Utc>) -> (Hours, Degrees) {
    let d = days_since_j2000(when);
    let (xp, yp, zp) = heliocentric_ecliptic(elements, d);
    let (xe, ye, ze) = heliocentric_ecliptic(&EARTH, d);

    let xg = xp - xe;
    let yg = yp - ye;
    let zg = zp - ze;

    let lon = modulo(yg.atan2(xg).to_degrees(), 360.0);
    let lat = zg.atan2((xg * xg + yg * yg).sqrt()).to_degrees();

    equatorial_from_ecliptic(lon, lat, obliquity_deg(when))
}

pub fn mercury(when: DateTime<Utc>) -> (Hours, Degrees) {
    geocentric_radec(&MERCURY, when)
}

pub fn venus(when: DateTime<Utc>) -> (Hours, Degrees) {
    geocentric_radec(&VENUS, when)
}

pub fn mars(when: DateTime<Utc>) -> (Hours, Degrees) {
    geocentric_radec(&MARS, when)
}

pub fn jupiter(when: DateTime<Utc>) -> (Hours, Degrees) {
    geocentric_radec(&JUPITER, when)
}

pub fn saturn(when: DateTime<Utc>) -> (Hours, Degrees) {
    geocentric_radec(&SATURN, when)
}
