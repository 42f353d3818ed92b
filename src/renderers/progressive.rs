// Copyright @yucwang 2026

use crate::core::integrator::{Integrator, IntegratorType};
use crate::core::rng::RandomSampler;
use crate::core::scene::Scene;
use crate::core::scene_loader::{load_scene_with_settings, SceneLoadError};
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::{black, is_finite, RGBSpectrum};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

const BLOCK_SIZE: usize = 32;

struct Block {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    pixels: Vec<RGBSpectrum>,
    dropped: usize,
}

/// Progressive driver: every `render_frame` adds one sample per pixel to a
/// running average.
pub struct Renderer {
    scene: Option<Arc<Scene>>,
    integrator: Integrator,
    image: Bitmap,
    samplers: Vec<RandomSampler>,
    iteration: usize,
    generation: u64,
    samples_per_pixel: Option<u32>,
    show_progress: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Integrator::default())
    }
}

impl Renderer {
    pub fn new(integrator: Integrator) -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_threads(integrator, threads)
    }

    /// Worker `i` renders blocks `i, i + threads, ...` with its own random
    /// stream, so a fixed thread count reproduces the same image.
    pub fn with_threads(integrator: Integrator, threads: usize) -> Self {
        let threads = threads.max(1);
        Self {
            scene: None,
            integrator,
            image: Bitmap::new(0, 0),
            samplers: (0..threads).map(|i| RandomSampler::for_worker(i, 0)).collect(),
            iteration: 0,
            generation: 0,
            samples_per_pixel: None,
            show_progress: true,
        }
    }

    pub fn set_show_progress(&mut self, show_progress: bool) {
        self.show_progress = show_progress;
    }

    /// Loads a scene file and swaps it in. On failure the current scene is
    /// kept as it is. An integrator named by the file replaces the active one.
    pub fn open_scene<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SceneLoadError> {
        let loaded = load_scene_with_settings(path)?;
        self.samples_per_pixel = loaded.samples_per_pixel;
        self.install(Arc::new(loaded.scene), loaded.integrator);
        Ok(())
    }

    pub fn set_scene(&mut self, scene: Scene) {
        self.samples_per_pixel = None;
        self.install(Arc::new(scene), None);
    }

    fn install(&mut self, scene: Arc<Scene>, integrator: Option<Integrator>) {
        if let Some(old) = self.scene.take() {
            self.integrator.postprocess(&old);
        }
        if let Some(integrator) = integrator {
            self.integrator = integrator;
        }

        self.generation += 1;
        let generation = self.generation;
        for (i, sampler) in self.samplers.iter_mut().enumerate() {
            *sampler = RandomSampler::for_worker(i, generation);
        }

        let (width, height) = scene.camera().resolution();
        self.image = Bitmap::new(width, height);
        self.iteration = 0;
        self.integrator.preprocess(&scene);
        self.scene = Some(scene);
        log::info!("Scene generation {} ready ({}x{}).", generation, width, height);
    }

    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    /// Sample count requested by the last opened scene file.
    pub fn samples_per_pixel(&self) -> Option<u32> {
        self.samples_per_pixel
    }

    pub fn change_integrator(&mut self, integrator_type: IntegratorType) {
        self.set_integrator(Integrator::from_type(integrator_type));
    }

    pub fn set_integrator(&mut self, integrator: Integrator) {
        if let Some(scene) = self.scene.as_ref() {
            self.integrator.postprocess(scene);
            integrator.preprocess(scene);
        }
        self.integrator = integrator;
        self.image.clear();
        self.iteration = 0;
    }

    pub fn image(&self) -> &Bitmap {
        &self.image
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Renders one sample per pixel and blends it into the running average.
    /// Returns false when there is nothing to render.
    pub fn render_frame(&mut self) -> bool {
        let scene = match self.scene.as_ref() {
            Some(scene) => Arc::clone(scene),
            None => {
                log::warn!("render_frame called without a scene.");
                return false;
            }
        };
        let width = self.image.width();
        let height = self.image.height();
        if width == 0 || height == 0 {
            return false;
        }

        let blocks_x = (width + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let blocks_y = (height + BLOCK_SIZE - 1) / BLOCK_SIZE;
        let total_blocks = blocks_x * blocks_y;

        let progress = if self.show_progress {
            let bar = ProgressBar::new(total_blocks as u64);
            bar.set_style(
                ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let start = Instant::now();
        let blend = 1.0 / (self.iteration + 1) as Float;
        let threads = self.samplers.len();
        let (tx, rx) = mpsc::channel::<Block>();
        let scene_ref: &Scene = &scene;
        let integrator = &self.integrator;
        let samplers = &mut self.samplers;
        let image = &mut self.image;
        let mut dropped = 0usize;

        thread::scope(|scope| {
            for (worker, sampler) in samplers.iter_mut().enumerate() {
                let tx = tx.clone();
                scope.spawn(move || for block_index in (worker..total_blocks).step_by(threads) {
                    let x0 = (block_index % blocks_x) * BLOCK_SIZE;
                    let y0 = (block_index / blocks_x) * BLOCK_SIZE;
                    let x1 = (x0 + BLOCK_SIZE).min(width);
                    let y1 = (y0 + BLOCK_SIZE).min(height);

                    let mut block = Block {
                        x0, y0, x1, y1,
                        pixels: Vec::with_capacity((x1 - x0) * (y1 - y0)),
                        dropped: 0,
                    };
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let value = render_pixel(scene_ref, integrator, x, y, sampler);
                            if is_finite(&value) {
                                block.pixels.push(value);
                            } else {
                                block.dropped += 1;
                                block.pixels.push(black());
                            }
                        }
                    }
                    if tx.send(block).is_err() {
                        break;
                    }
                });
            }

            drop(tx);
            for block in rx.iter() {
                let block_width = block.x1 - block.x0;
                for y in block.y0..block.y1 {
                    for x in block.x0..block.x1 {
                        let value = block.pixels[(x - block.x0) + block_width * (y - block.y0)];
                        let pixel = &mut image[(x, y)];
                        *pixel = *pixel * (1.0 - blend) + value * blend;
                    }
                }
                dropped += block.dropped;
                progress.inc(1);
            }
        });
        progress.finish_and_clear();

        self.iteration += 1;
        if dropped > 0 {
            log::warn!("Frame {}: dropped {} non-finite samples.", self.iteration, dropped);
        }
        log::debug!("Frame {} took {:.3}s.", self.iteration, start.elapsed().as_secs_f32());
        true
    }
}

fn render_pixel(scene: &Scene,
                integrator: &Integrator,
                x: usize,
                y: usize,
                sampler: &mut RandomSampler) -> RGBSpectrum {
    let jitter = sampler.next_2d();
    let pixel = Vector2f::new(x as Float + jitter.x, y as Float + jitter.y);
    let lens = sampler.next_2d();
    let sample = scene.camera().create_ray(&pixel, &lens);
    if sample.weight <= 0.0 {
        return black();
    }
    integrator.evaluate(&sample.ray, scene, sampler) * sample.weight
}
