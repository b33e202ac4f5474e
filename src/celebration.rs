use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

const CONFETTI_SYMBOLS: [char; 6] = ['*', '+', 'o', '.', '~', '^'];
const BANNERS: [&str; 4] = ["NEW BEST!", "RECORD!", "PERSONAL BEST!", "HIGH SCORE!"];

/// One piece of confetti, in terminal cell coordinates
#[derive(Debug, Clone)]
pub struct ConfettiPiece {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
}

impl ConfettiPiece {
    fn launch<R: Rng + ?Sized>(width: f64, rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: rng.gen_range(-6.0..0.0),
            vel_x: rng.gen_range(-2.0..2.0),
            vel_y: rng.gen_range(2.0..6.0),
            symbol: *CONFETTI_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
        }
    }

    fn update(&mut self, dt: f64) {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        // drag sideways, light gravity
        self.vel_x *= 0.98;
        self.vel_y += 3.0 * dt;
    }
}

/// Confetti shower played when a session sets a new personal best
#[derive(Debug)]
pub struct Celebration {
    pub pieces: Vec<ConfettiPiece>,
    pub banner: &'static str,
    pub is_active: bool,
    started_at: Instant,
    duration_secs: f64,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            pieces: Vec::new(),
            banner: BANNERS[0],
            is_active: false,
            started_at: Instant::now(),
            duration_secs: 3.0,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.width = width as f64;
        self.height = height as f64;
        self.started_at = Instant::now();
        self.is_active = true;
        self.banner = BANNERS.choose(&mut rng).copied().unwrap_or(BANNERS[0]);

        let count = (width as usize / 2).clamp(20, 80);
        self.pieces = (0..count)
            .map(|_| ConfettiPiece::launch(self.width, &mut rng))
            .collect();
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.pieces.clear();
    }

    /// Advance one animation frame of `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }
        if self.started_at.elapsed().as_secs_f64() >= self.duration_secs {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.pieces.retain_mut(|piece| {
            piece.update(dt);
            piece.y < height + 1.0 && piece.x > -2.0 && piece.x < width + 2.0
        });
    }

    /// Pieces that currently fall inside the visible area
    pub fn visible(&self) -> impl Iterator<Item = &ConfettiPiece> {
        self.pieces.iter().filter(|p| {
            p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
        })
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let celebration = Celebration::new();
        assert!(!celebration.is_active);
        assert!(celebration.pieces.is_empty());
    }

    #[test]
    fn start_launches_pieces_above_screen() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24);

        assert!(celebration.is_active);
        assert!(!celebration.pieces.is_empty());
        assert!(celebration.pieces.iter().all(|p| p.y <= 0.0));
        assert!(BANNERS.contains(&celebration.banner));
    }

    #[test]
    fn pieces_fall() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24);
        let before: f64 = celebration.pieces.iter().map(|p| p.y).sum();
        let count = celebration.pieces.len() as f64;

        celebration.update(0.1);

        let after: f64 = celebration.pieces.iter().map(|p| p.y).sum();
        assert!(after / celebration.pieces.len() as f64 > before / count);
    }

    #[test]
    fn pieces_leaving_the_screen_are_dropped() {
        let mut celebration = Celebration::new();
        celebration.start(20, 5);
        celebration.pieces.push(ConfettiPiece {
            x: 5.0,
            y: 50.0,
            vel_x: 0.0,
            vel_y: 1.0,
            symbol: '*',
            color_index: 0,
        });

        celebration.update(0.1);
        assert!(celebration.pieces.iter().all(|p| p.y < 6.0));
    }

    #[test]
    fn stop_clears_everything() {
        let mut celebration = Celebration::new();
        celebration.start(40, 10);
        celebration.stop();

        assert!(!celebration.is_active);
        assert_eq!(celebration.visible().count(), 0);
        celebration.update(0.1);
        assert!(celebration.pieces.is_empty());
    }
}
