//! 控制器与两个模拟引擎的组合，按固定步长驱动

use std::rc::Rc;

use reelswap_core::{DualPlayer, PlayerConfig, PlayerError};

use crate::{SimEngine, SimHandle, SimLibrary, SimQuirks};

pub struct SimRig {
    pub player: DualPlayer<SimEngine>,
    pub handles: [SimHandle; 2],
    tick_ms: f64,
    ticks: u64,
}

impl SimRig {
    /// 步长为一帧
    pub fn new(config: PlayerConfig, library: SimLibrary, quirks: SimQuirks) -> Result<Self, PlayerError> {
        let library = Rc::new(library);
        let (first, first_handle) = SimEngine::new(library.clone(), quirks.clone());
        let (second, second_handle) = SimEngine::new(library, quirks);
        let player = DualPlayer::with_engines(config, first, second)?;
        let tick_ms = player.frame_clock().frame_duration_ms();

        Ok(Self {
            player,
            handles: [first_handle, second_handle],
            tick_ms,
            ticks: 0,
        })
    }

    pub fn with_tick_ms(mut self, tick_ms: f64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 先推进两个引擎，再驱动控制器
    pub fn step(&mut self) {
        for handle in &self.handles {
            handle.advance(self.tick_ms);
        }
        self.player.tick();
        self.ticks += 1;
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
    }
}
