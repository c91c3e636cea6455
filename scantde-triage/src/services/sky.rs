//! Sky coordinate helpers

/// Right ascension of the north Galactic pole (J2000, degrees)
const NGP_RA_DEG: f64 = 192.859_48;

/// Declination of the north Galactic pole (J2000, degrees)
const NGP_DEC_DEG: f64 = 27.128_25;

/// Galactic latitude in degrees for J2000 equatorial coordinates in degrees
pub fn galactic_latitude(ra_deg: f64, dec_deg: f64) -> f64 {
    let dec = dec_deg.to_radians();
    let ngp_dec = NGP_DEC_DEG.to_radians();
    let delta_ra = (ra_deg - NGP_RA_DEG).to_radians();

    let sin_b = dec.sin() * ngp_dec.sin() + dec.cos() * ngp_dec.cos() * delta_ra.cos();
    sin_b.clamp(-1.0, 1.0).asin().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galactic_pole() {
        assert!((galactic_latitude(NGP_RA_DEG, NGP_DEC_DEG) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_galactic_centre_is_in_plane() {
        // Sgr A*
        assert!(galactic_latitude(266.405, -28.936).abs() < 0.1);
    }

    #[test]
    fn test_south_pole() {
        let b = galactic_latitude(NGP_RA_DEG + 180.0, -NGP_DEC_DEG);
        assert!((b + 90.0).abs() < 1e-4);
    }
}
