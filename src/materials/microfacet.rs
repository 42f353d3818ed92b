// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f, PI};

/// GGX normal distribution, `alpha2 = alpha²`.
pub fn ggx_d(cos_theta_h: Float, alpha2: Float) -> Float {
    if cos_theta_h <= 0.0 {
        return 0.0;
    }
    let tmp = cos_theta_h * cos_theta_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * tmp * tmp)
}

/// Smith masking-shadowing for GGX in the combined form
/// `2 n_i n_o / (n_o sqrt(a² + (1 - a²) n_i²) + n_i sqrt(a² + (1 - a²) n_o²))`.
pub fn smith_g(cos_i: Float, cos_o: Float, alpha2: Float) -> Float {
    if cos_i <= 0.0 || cos_o <= 0.0 {
        return 0.0;
    }
    let nom = 2.0 * cos_i * cos_o;
    let denom1 = cos_o * (alpha2 + (1.0 - alpha2) * cos_i * cos_i).sqrt();
    let denom2 = cos_i * (alpha2 + (1.0 - alpha2) * cos_o * cos_o).sqrt();
    nom / (denom1 + denom2)
}

/// Samples a half vector proportionally to `D(h) cos(theta_h)`.
pub fn sample_ggx(u: &Vector2f, alpha2: Float) -> Vector3f {
    let cos2 = ((1.0 - u.x) / (u.x * (alpha2 - 1.0) + 1.0)).max(0.0).min(1.0);
    let cos_theta = cos2.sqrt();
    let sin_theta = (1.0 - cos2).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Solid-angle pdf of a direction reflected about a GGX-sampled half vector.
pub fn pdf_ggx_reflection(h: &Vector3f, wi: &Vector3f, alpha2: Float) -> Float {
    let cos_h = h.z;
    let wi_dot_h = wi.dot(h).abs();
    if cos_h <= 0.0 || wi_dot_h <= 0.0 {
        return 0.0;
    }
    ggx_d(cos_h, alpha2) * cos_h / (4.0 * wi_dot_h)
}

pub fn reflect(wi: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * wi.dot(m) * m - wi
}

/// Refracts `wi` (pointing away from the surface) through `n`, which must lie
/// on the side of `wi`. `eta` is `eta_incident / eta_transmitted`.
pub fn refract(wi: &Vector3f, n: &Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_i = wi.dot(n).max(-1.0).min(1.0);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(-eta * wi + (eta * cos_i - cos_t) * n)
}

/// Unpolarised dielectric Fresnel reflectance.
pub fn fresnel_dielectric(cos_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let mut cos_i = cos_i.max(-1.0).min(1.0);
    let (eta_i, eta_t) = if cos_i > 0.0 { (eta_i, eta_t) } else { (eta_t, eta_i) };
    cos_i = cos_i.abs();

    let sin_t = eta_i / eta_t * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let r_parl = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}
