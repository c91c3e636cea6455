//! Distance modulus for host absolute magnitudes
//!
//! Flat ΛCDM with Planck 2018 parameters. Radiation is neglected, which moves
//! distances by well under a percent at the redshifts of interest.

/// Hubble constant (km/s/Mpc)
pub const H0: f64 = 67.66;

/// Matter density parameter
pub const OMEGA_M: f64 = 0.309_66;

/// Speed of light (km/s)
const C_KM_S: f64 = 299_792.458;

/// Simpson intervals for the comoving-distance integral (must be even)
const INTEGRATION_STEPS: usize = 512;

fn inverse_hubble_parameter(z: f64) -> f64 {
    let zp1 = 1.0 + z;
    1.0 / (OMEGA_M * zp1 * zp1 * zp1 + (1.0 - OMEGA_M)).sqrt()
}

/// Luminosity distance in Mpc, `None` for a negative or non-finite redshift
pub fn luminosity_distance_mpc(z: f64) -> Option<f64> {
    if !z.is_finite() || z < 0.0 {
        return None;
    }
    let h = z / INTEGRATION_STEPS as f64;
    let mut sum = inverse_hubble_parameter(0.0) + inverse_hubble_parameter(z);
    for i in 1..INTEGRATION_STEPS {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * inverse_hubble_parameter(i as f64 * h);
    }
    let comoving = C_KM_S / H0 * sum * h / 3.0;
    Some((1.0 + z) * comoving)
}

/// Distance modulus `5 (log10 d_pc - 1)`, `None` where the distance is zero or undefined
pub fn distance_modulus(z: f64) -> Option<f64> {
    let d_pc = luminosity_distance_mpc(z)? * 1.0e6;
    (d_pc > 0.0).then(|| 5.0 * (d_pc.log10() - 1.0))
}

/// Absolute magnitude from an apparent magnitude and redshift
pub fn absolute_magnitude(apparent: f64, z: f64) -> Option<f64> {
    distance_modulus(z).map(|dm| apparent - dm)
}
