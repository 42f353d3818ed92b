// Copyright @yucwang 2026

use crate::core::interaction::{EmitterEval, EmitterInteraction, EmitterSample};
use crate::core::scene::MeshId;
use crate::math::constants::{Float, Vector3f, EPSILON, FLOAT_EPS};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::shapes::triangle_mesh::TriangleMesh;

/// Uniform radiance emitted from the front face of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEmitter {
    mesh: MeshId,
    radiance: RGBSpectrum,
}

// Converts an area density at `position` into a solid-angle density seen
// from `reference`. Zero when the light faces away.
fn solid_angle_pdf(reference: &Vector3f, position: &Vector3f, normal: &Vector3f, pdf_area: Float)
    -> Option<(Vector3f, Float, Float)> {
    let to_light = position - reference;
    let dist2 = to_light.norm_squared();
    if dist2 <= 0.0 {
        return None;
    }
    let dist = dist2.sqrt();
    let direction = to_light / dist;
    let cos_light = -normal.dot(&direction);
    if cos_light <= 0.0 {
        return None;
    }
    Some((direction, dist, pdf_area * dist2 / cos_light))
}

impl MeshEmitter {
    pub fn new(mesh: MeshId, radiance: RGBSpectrum) -> Self {
        Self { mesh, radiance }
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn radiance(&self) -> RGBSpectrum {
        self.radiance
    }

    pub fn sample(&self, mesh: &TriangleMesh, reference: &Vector3f, u: &Vector3f) -> Option<EmitterSample> {
        let ms = mesh.sample(u)?;
        let (direction, dist, pdf) = solid_angle_pdf(reference, &ms.position, &ms.normal, ms.pdf)?;
        if pdf < FLOAT_EPS || !pdf.is_finite() {
            return None;
        }

        let interaction = EmitterInteraction {
            reference: *reference,
            position: ms.position,
            direction,
            normal: ms.normal,
            pdf,
            shadow_ray: Ray3f::new(*reference, direction, Some(EPSILON), Some(dist - EPSILON)),
        };
        Some(EmitterSample { interaction, weight: self.radiance / pdf })
    }

    /// Radiance leaving `interaction.position` towards the reference point,
    /// with the pdf `sample` would have produced for it.
    pub fn eval(&self, mesh: &TriangleMesh, interaction: &EmitterInteraction) -> EmitterEval {
        match solid_angle_pdf(&interaction.reference, &interaction.position, &interaction.normal, mesh.pdf()) {
            Some((_, _, pdf)) => EmitterEval { radiance: self.radiance, pdf },
            None => EmitterEval::zero(),
        }
    }
}
