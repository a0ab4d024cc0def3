//! 2D simplex noise.
//!
//! The beam renderer samples this on the CPU for slow positional drift. The
//! aurora field runs its own GLSL simplex on the GPU
//! (see [`crate::aurora::FRAGMENT_SHADER`]). Values lie roughly in [-1, 1].

use rand::seq::SliceRandom;

use crate::rng;

const F2: f32 = 0.366_025_42; // (sqrt(3) - 1) / 2
const G2: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6

const GRADIENTS: [[f32; 2]; 12] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.707, 0.707],
    [-0.707, 0.707],
    [0.707, -0.707],
    [-0.707, -0.707],
    [0.924, 0.383],
    [-0.383, 0.924],
    [-0.924, -0.383],
    [0.383, -0.924],
];

pub struct Simplex2 {
    perm: [u8; 512],
}

impl Simplex2 {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng::seeded(seed));
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn corner(&self, gi: usize, x: f32, y: f32) -> f32 {
        let t = 0.5 - x * x - y * y;
        if t <= 0.0 {
            return 0.0;
        }
        let [gx, gy] = GRADIENTS[usize::from(self.perm[gi]) % GRADIENTS.len()];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }

    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i32 & 255) as usize;
        let jj = (j as i32 & 255) as usize;
        let g0 = ii + usize::from(self.perm[jj]);
        let g1 = ii + i1 + usize::from(self.perm[jj + j1]);
        let g2 = ii + 1 + usize::from(self.perm[jj + 1]);

        70.0 * (self.corner(g0, x0, y0) + self.corner(g1, x1, y1) + self.corner(g2, x2, y2))
    }

    /// Fractal sum: each octave doubles frequency and halves amplitude.
    /// Normalized back into roughly [-1, 1].
    pub fn fbm(&self, x: f32, y: f32, octaves: u32) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 0.5;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for _ in 0..octaves.max(1) {
            sum += amplitude * self.sample(x * frequency, y * frequency);
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        sum / norm
    }
}
