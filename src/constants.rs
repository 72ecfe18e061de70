// src/constants.rs

/// Astronomical unit (m)
pub const AU: f64 = 1.495978707e11;
/// Newtonian gravitational constant (m^3 kg^-1 s^-2)
pub const G: f64 = 6.67430e-11;

/// Julian year (s)
pub const YEAR_IN_S: f64 = 31557600.0;

pub const M_SUN: f64 = 1.9885e30;
pub const M_EARTH: f64 = 5.97234e24;
pub const ORBIT_R_EARTH: f64 = 149598023e3;
pub const V_EARTH: f64 = 29.78e3;
