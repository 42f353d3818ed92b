// Copyright @yucwang 2026

use crate::core::interaction::{EmitterEval, EmitterInteraction, EmitterSample};
use crate::core::scene::Scene;
use crate::emitters::area::MeshEmitter;
use crate::emitters::envmap::EnvironmentEmitter;
use crate::math::constants::Vector3f;

#[derive(Debug, Clone)]
pub enum Emitter {
    Mesh(MeshEmitter),
    Environment(EnvironmentEmitter),
}

impl Emitter {
    pub fn is_environment(&self) -> bool {
        matches!(self, Emitter::Environment(_))
    }

    /// Samples a point on the emitter as seen from `reference`. `None` means
    /// no contribution for this sample.
    pub fn sample(&self, scene: &Scene, reference: &Vector3f, u: &Vector3f) -> Option<EmitterSample> {
        match self {
            Emitter::Mesh(e) => e.sample(scene.mesh(e.mesh()), reference, u),
            Emitter::Environment(e) => e.sample(reference, &u.xy()),
        }
    }

    pub fn eval(&self, scene: &Scene, interaction: &EmitterInteraction) -> EmitterEval {
        match self {
            Emitter::Mesh(e) => e.eval(scene.mesh(e.mesh()), interaction),
            Emitter::Environment(e) => e.eval(interaction),
        }
    }
}
